//! OpenAI chat-completions provider over `reqwest`.
//!
//! Fault interpretation happens here, once: the HTTP status and the API
//! error `code`/`type` decide which `LlmError` variant is returned.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue, RETRY_AFTER};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConfigError, LlmError};
use crate::llm::provider::{ChatMessage, CompletionRequest, CompletionResponse, LlmProvider};

const PROVIDER: &str = "openai";

/// Error codes the API uses for an exhausted account allowance. OpenAI sends
/// these with status 429, which otherwise means plain throttling.
const QUOTA_CODES: &[&str] = &[
    "insufficient_quota",
    "billing_hard_limit_reached",
    "billing_not_active",
];

/// OpenAI chat-completions client. The bearer token is installed as a
/// default header when the client is built.
#[derive(Debug, Clone)]
pub struct OpenAiProvider {
    client: reqwest::Client,
    model: String,
    endpoint: String,
}

impl OpenAiProvider {
    pub fn new(
        api_key: SecretString,
        model: impl Into<String>,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, ConfigError> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", api_key.expose_secret()))
            .map_err(|e| ConfigError::InvalidValue {
                key: "OPENAI_API_KEY".into(),
                message: format!("not a valid header value: {e}"),
            })?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .user_agent(concat!("email-classifier/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self {
            client,
            model: model.into(),
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let body = ChatCompletionBody {
            model: &self.model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        debug!(status = %status, model = %self.model, "chat completion response received");

        let retry_after = parse_retry_after(response.headers());
        let text = response.text().await.map_err(transport_error)?;

        if !status.is_success() {
            return Err(classify_api_error(status.as_u16(), &text, retry_after));
        }

        parse_completion(&text)
    }
}

// ── Wire types ──────────────────────────────────────────────────────

#[derive(Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Debug, Default, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: String,
    #[serde(rename = "type", default)]
    type_: Option<String>,
    #[serde(default)]
    code: Option<serde_json::Value>,
}

impl ApiErrorDetail {
    fn is_quota(&self) -> bool {
        let code = self.code.as_ref().and_then(|c| c.as_str());
        let is_quota_code = |value: Option<&str>| value.is_some_and(|v| QUOTA_CODES.contains(&v));
        is_quota_code(code)
            || is_quota_code(self.type_.as_deref())
            || self
                .message
                .to_lowercase()
                .contains("exceeded your current quota")
    }
}

// ── Parsing ─────────────────────────────────────────────────────────

fn parse_completion(body: &str) -> Result<CompletionResponse, LlmError> {
    let completion: ChatCompletion = serde_json::from_str(body)?;
    let usage = completion.usage.unwrap_or_default();

    let choice = completion
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::InvalidResponse {
            provider: PROVIDER.to_string(),
            reason: "response contained no choices".to_string(),
        })?;

    Ok(CompletionResponse {
        content: choice.message.content.unwrap_or_default(),
        input_tokens: usage.prompt_tokens,
        output_tokens: usage.completion_tokens,
    })
}

/// Map a non-success API response to the matching `LlmError` variant.
pub(crate) fn classify_api_error(
    status: u16,
    body: &str,
    retry_after: Option<Duration>,
) -> LlmError {
    let detail = serde_json::from_str::<ApiErrorResponse>(body)
        .map(|e| e.error)
        .unwrap_or_else(|_| ApiErrorDetail {
            message: body.chars().take(200).collect(),
            ..Default::default()
        });

    let provider = PROVIDER.to_string();

    if detail.is_quota() {
        return LlmError::QuotaExceeded {
            provider,
            reason: detail.message,
        };
    }

    match status {
        429 => LlmError::RateLimited {
            provider,
            retry_after,
        },
        401 | 403 => LlmError::AuthFailed { provider },
        408 | 500..=599 => LlmError::ServerError {
            provider,
            status,
            reason: detail.message,
        },
        _ => LlmError::Rejected {
            provider,
            status,
            reason: detail.message,
        },
    }
}

fn transport_error(e: reqwest::Error) -> LlmError {
    LlmError::RequestFailed {
        provider: PROVIDER.to_string(),
        reason: e.to_string(),
    }
}

fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::error::FaultKind;

    fn test_provider(base_url: &str) -> OpenAiProvider {
        OpenAiProvider::new(
            SecretString::from("sk-test"),
            "gpt-3.5-turbo",
            base_url,
            Duration::from_secs(5),
        )
        .unwrap()
    }

    fn test_request() -> CompletionRequest {
        CompletionRequest::new(vec![
            ChatMessage::system("Classifique."),
            ChatMessage::user("Preciso do relatório."),
        ])
        .with_temperature(0.3)
        .with_max_tokens(10)
    }

    #[test]
    fn insufficient_quota_on_429_is_fatal() {
        let body = r#"{"error": {"message": "You exceeded your current quota, please check your plan and billing details.", "type": "insufficient_quota", "param": null, "code": "insufficient_quota"}}"#;
        let err = classify_api_error(429, body, None);
        assert_eq!(err.kind(), FaultKind::QuotaExceeded);
        assert!(matches!(err, LlmError::QuotaExceeded { .. }));
    }

    #[test]
    fn quota_detected_from_message_without_code() {
        let body = r#"{"error": {"message": "You exceeded your current quota", "type": "requests", "code": null}}"#;
        assert_eq!(
            classify_api_error(429, body, None).kind(),
            FaultKind::QuotaExceeded
        );
    }

    #[test]
    fn plain_429_is_rate_limited() {
        let body = r#"{"error": {"message": "Rate limit reached for requests", "type": "requests", "code": "rate_limit_exceeded"}}"#;
        let err = classify_api_error(429, body, Some(Duration::from_secs(2)));
        match err {
            LlmError::RateLimited { retry_after, .. } => {
                assert_eq!(retry_after, Some(Duration::from_secs(2)));
            }
            other => panic!("Expected RateLimited, got {:?}", other),
        }
    }

    #[test]
    fn server_errors_are_transient() {
        let err = classify_api_error(503, "upstream unavailable", None);
        assert_eq!(err.kind(), FaultKind::Transient);
        if let LlmError::ServerError { reason, status, .. } = err {
            assert_eq!(status, 503);
            assert_eq!(reason, "upstream unavailable");
        } else {
            panic!("Expected ServerError");
        }
    }

    #[test]
    fn auth_and_bad_request_are_other() {
        let body = r#"{"error": {"message": "Incorrect API key provided", "type": "invalid_request_error", "code": "invalid_api_key"}}"#;
        assert!(matches!(
            classify_api_error(401, body, None),
            LlmError::AuthFailed { .. }
        ));
        assert_eq!(
            classify_api_error(400, "{}", None).kind(),
            FaultKind::Other
        );
    }

    #[test]
    fn integer_error_code_does_not_break_parsing() {
        let body = r#"{"error": {"message": "boom", "type": "server_error", "code": 500}}"#;
        assert_eq!(
            classify_api_error(500, body, None).kind(),
            FaultKind::Transient
        );
    }

    #[test]
    fn parses_completion_body() {
        let body = r#"{
            "id": "chatcmpl-1",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "PRODUTIVO"}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 80, "completion_tokens": 3, "total_tokens": 83}
        }"#;
        let response = parse_completion(body).unwrap();
        assert_eq!(response.content, "PRODUTIVO");
        assert_eq!(response.input_tokens, 80);
        assert_eq!(response.output_tokens, 3);
    }

    #[test]
    fn null_content_becomes_empty() {
        let body = r#"{"choices": [{"message": {"role": "assistant", "content": null}, "finish_reason": "length"}]}"#;
        let response = parse_completion(body).unwrap();
        assert!(response.content.is_empty());
        assert_eq!(response.input_tokens, 0);
    }

    #[test]
    fn empty_choices_is_invalid_response() {
        let err = parse_completion(r#"{"choices": []}"#).unwrap_err();
        assert!(matches!(err, LlmError::InvalidResponse { .. }));
    }

    #[test]
    fn request_body_omits_unset_sampling() {
        let messages = vec![ChatMessage::system("s"), ChatMessage::user("u")];
        let body = ChatCompletionBody {
            model: "gpt-3.5-turbo",
            messages: &messages,
            temperature: Some(0.3),
            max_tokens: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "gpt-3.5-turbo");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "u");
        assert!(json.get("max_tokens").is_none());
        assert!(json["temperature"].is_f64());
    }

    #[test]
    fn provider_builds_endpoint() {
        let provider = OpenAiProvider::new(
            SecretString::from("sk-test"),
            "gpt-3.5-turbo",
            "https://api.openai.com/v1/",
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(provider.endpoint, "https://api.openai.com/v1/chat/completions");
        assert_eq!(provider.model_name(), "gpt-3.5-turbo");
    }

    #[test]
    fn retry_after_seconds_are_parsed() {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static("3"));
        assert_eq!(parse_retry_after(&headers), Some(Duration::from_secs(3)));

        headers.insert(RETRY_AFTER, HeaderValue::from_static(" 20 "));
        assert_eq!(parse_retry_after(&headers), Some(Duration::from_secs(20)));
    }

    #[test]
    fn malformed_or_missing_retry_after_is_ignored() {
        let mut headers = HeaderMap::new();
        assert_eq!(parse_retry_after(&headers), None);

        headers.insert(RETRY_AFTER, HeaderValue::from_static("soon"));
        assert_eq!(parse_retry_after(&headers), None);

        headers.insert(RETRY_AFTER, HeaderValue::from_static("-1"));
        assert_eq!(parse_retry_after(&headers), None);

        // HTTP-date form is not supported.
        headers.insert(
            RETRY_AFTER,
            HeaderValue::from_static("Wed, 21 Oct 2026 07:28:00 GMT"),
        );
        assert_eq!(parse_retry_after(&headers), None);
    }

    #[test]
    fn api_key_with_newline_is_a_config_error() {
        let err = OpenAiProvider::new(
            SecretString::from("sk-bad\nkey"),
            "gpt-3.5-turbo",
            "https://api.openai.com/v1",
            Duration::from_secs(5),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "OPENAI_API_KEY"));
    }

    // ── HTTP tests ──────────────────────────────────────────────────

    #[tokio::test]
    async fn complete_sends_bearer_token_and_parses_reply() {
        let server = MockServer::start().await;

        let response_body = serde_json::json!({
            "id": "chatcmpl-42",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "IMPRODUTIVO"},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 57, "completion_tokens": 4, "total_tokens": 61}
        });

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&response_body))
            .expect(1)
            .mount(&server)
            .await;

        let response = test_provider(&server.uri())
            .complete(test_request())
            .await
            .unwrap();

        assert_eq!(response.content, "IMPRODUTIVO");
        assert_eq!(response.input_tokens, 57);
        assert_eq!(response.output_tokens, 4);
    }

    #[tokio::test]
    async fn complete_maps_insufficient_quota_to_quota_exceeded() {
        let server = MockServer::start().await;

        let error_body = serde_json::json!({
            "error": {
                "message": "You exceeded your current quota, please check your plan and billing details.",
                "type": "insufficient_quota",
                "param": null,
                "code": "insufficient_quota"
            }
        });

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_json(&error_body))
            .mount(&server)
            .await;

        let err = test_provider(&server.uri())
            .complete(test_request())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), FaultKind::QuotaExceeded);
    }

    #[tokio::test]
    async fn complete_reads_retry_after_on_rate_limit() {
        let server = MockServer::start().await;

        let error_body = serde_json::json!({
            "error": {"message": "Rate limit reached", "type": "requests", "code": "rate_limit_exceeded"}
        });

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(429)
                    .insert_header("retry-after", "3")
                    .set_body_json(&error_body),
            )
            .mount(&server)
            .await;

        let err = test_provider(&server.uri())
            .complete(test_request())
            .await
            .unwrap_err();
        match err {
            LlmError::RateLimited { retry_after, .. } => {
                assert_eq!(retry_after, Some(Duration::from_secs(3)));
            }
            other => panic!("Expected RateLimited, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn complete_maps_server_error_to_transient() {
        let server = MockServer::start().await;

        let error_body = serde_json::json!({
            "error": {"message": "The server had an error while processing your request.", "type": "server_error", "code": null}
        });

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_json(&error_body))
            .mount(&server)
            .await;

        let err = test_provider(&server.uri())
            .complete(test_request())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), FaultKind::Transient);
        assert!(err.to_string().contains("server had an error"), "got: {err}");
    }
}
