//! Classification entry point.
//!
//! **Always returns a well-formed result.** Remote faults are absorbed by the
//! retry policy, a quota wall degrades to the local classifier, and anything
//! else becomes an `Error`-category result.
//!
//! Flow:
//! 1. No credential → local classifier, with a configuration warning
//! 2. Remote classifier under the retry policy
//! 3. Quota exceeded → local classifier, remediation message prepended
//! 4. Other failure → `Error` result with the failure message

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::config::ClassifierConfig;
use crate::error::RetryError;
use crate::llm::provider::LlmProvider;
use crate::llm::retry::{Delay, RetryPolicy};
use crate::pipeline::heuristic::HeuristicClassifier;
use crate::pipeline::normalizer::TextNormalizer;
use crate::pipeline::remote::RemoteClassifier;
use crate::pipeline::types::{Category, ClassificationMethod, ClassificationResult};

/// Prefixed to local replies when no API key is configured.
pub const NOT_CONFIGURED_WARNING: &str =
    "⚠️ API da OpenAI não configurada. Usando classificação local.";

/// Separates a remediation message from the local reply.
pub const FALLBACK_SEPARATOR: &str = "\n\n---\n\n";

/// Email classifier with remote-first, local-fallback semantics.
pub struct EmailClassifier {
    remote: Option<RemoteClassifier>,
    local: HeuristicClassifier,
    normalizer: TextNormalizer,
}

impl EmailClassifier {
    /// Create a classifier. `llm = None` means local-only mode.
    pub fn new(llm: Option<Arc<dyn LlmProvider>>, config: &ClassifierConfig) -> Self {
        let retry = RetryPolicy::new(config.max_attempts, config.backoff_unit);
        Self::with_retry(llm, retry)
    }

    pub fn with_retry(llm: Option<Arc<dyn LlmProvider>>, retry: RetryPolicy) -> Self {
        Self {
            remote: llm.map(|llm| RemoteClassifier::new(llm, retry)),
            local: HeuristicClassifier::new(),
            normalizer: TextNormalizer::new(),
        }
    }

    /// Same classifier with a different wait implementation for backoff.
    pub fn with_delay(
        llm: Option<Arc<dyn LlmProvider>>,
        config: &ClassifierConfig,
        delay: Arc<dyn Delay>,
    ) -> Self {
        let retry = RetryPolicy::new(config.max_attempts, config.backoff_unit).with_delay(delay);
        Self::with_retry(llm, retry)
    }

    pub fn is_remote_enabled(&self) -> bool {
        self.remote.is_some()
    }

    /// Classify an email and suggest a reply.
    pub async fn classify_and_respond(&self, text: &str) -> ClassificationResult {
        let preprocessed_preview = self.normalizer.preview(text);

        let (category, response, method) = match &self.remote {
            None => {
                let local = self.local.classify(text);
                (
                    local.category,
                    format!("{NOT_CONFIGURED_WARNING}\n\n{}", local.response),
                    ClassificationMethod::Local,
                )
            }
            Some(remote) => match remote.classify(text).await {
                Ok(classification) => (
                    classification.category,
                    classification.response,
                    ClassificationMethod::Remote,
                ),
                Err(RetryError::QuotaExceeded { message, source }) => {
                    warn!(error = %source, "Quota exceeded, falling back to local classification");
                    let local = self.local.classify(text);
                    (
                        local.category,
                        format!("{message}{FALLBACK_SEPARATOR}{}", local.response),
                        ClassificationMethod::Local,
                    )
                }
                Err(err) => {
                    error!(kind = err.kind().label(), error = %err, "Remote classification failed");
                    (
                        Category::Error,
                        format!("Erro ao processar com a API: {err}"),
                        ClassificationMethod::Error,
                    )
                }
            },
        };

        info!(
            category = category.label(),
            method = method.label(),
            chars = text.chars().count(),
            "Email classified"
        );

        ClassificationResult {
            category,
            response,
            preprocessed_preview,
            method,
        }
    }
}
