//! Remote classifier: two LLM calls, both under the retry policy.
//!
//! 1. Classification (low temperature, tiny output budget)
//! 2. Reply generation for the decided category

use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::{debug, info};

use crate::error::RetryError;
use crate::llm::provider::{ChatMessage, CompletionRequest, LlmProvider};
use crate::llm::retry::RetryPolicy;
use crate::pipeline::types::{Category, Classification};

/// Max tokens for the classification call (one label).
const CLASSIFY_MAX_TOKENS: u32 = 10;

const CLASSIFY_TEMPERATURE: f32 = 0.3;

/// Max tokens for the reply generation call.
const REPLY_MAX_TOKENS: u32 = 200;

const REPLY_TEMPERATURE: f32 = 0.7;

/// Used when the model returns an empty reply.
pub const NO_RESPONSE_PLACEHOLDER: &str = "Resposta não disponível.";

/// System prompt of the classification call.
pub const CLASSIFIER_SYSTEM_PROMPT: &str =
    "Você é um assistente especializado em classificação de emails corporativos.";

/// System prompt of the reply generation call.
pub const REPLY_SYSTEM_PROMPT: &str =
    "Você é um assistente que gera respostas automáticas profissionais para emails corporativos.";

static PRODUCTIVE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bPRODUTIVO\b").expect("valid regex"));

static UNPRODUCTIVE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bIMPRODUTIVO\b").expect("valid regex"));

/// Classifies and answers an email through an `LlmProvider`.
pub struct RemoteClassifier {
    llm: Arc<dyn LlmProvider>,
    retry: RetryPolicy,
}

impl RemoteClassifier {
    pub fn new(llm: Arc<dyn LlmProvider>, retry: RetryPolicy) -> Self {
        Self { llm, retry }
    }

    pub async fn classify(&self, text: &str) -> Result<Classification, RetryError> {
        let category = self.classify_category(text).await?;
        let response = self.generate_reply(text, category).await?;

        info!(
            model = self.llm.model_name(),
            category = category.label(),
            "Remote classification complete"
        );

        Ok(Classification { category, response })
    }

    async fn classify_category(&self, text: &str) -> Result<Category, RetryError> {
        let request = CompletionRequest::new(vec![
            ChatMessage::system(CLASSIFIER_SYSTEM_PROMPT),
            ChatMessage::user(build_classification_prompt(text)),
        ])
        .with_temperature(CLASSIFY_TEMPERATURE)
        .with_max_tokens(CLASSIFY_MAX_TOKENS);

        let response = self
            .retry
            .run("classify", || self.llm.complete(request.clone()))
            .await?;

        let category = parse_category(&response.content);
        debug!(
            raw = %response.content,
            category = category.label(),
            input_tokens = response.input_tokens,
            output_tokens = response.output_tokens,
            "Parsed classification reply"
        );
        Ok(category)
    }

    async fn generate_reply(&self, text: &str, category: Category) -> Result<String, RetryError> {
        let request = CompletionRequest::new(vec![
            ChatMessage::system(REPLY_SYSTEM_PROMPT),
            ChatMessage::user(build_reply_prompt(text, category)),
        ])
        .with_temperature(REPLY_TEMPERATURE)
        .with_max_tokens(REPLY_MAX_TOKENS);

        let response = self
            .retry
            .run("generate_reply", || self.llm.complete(request.clone()))
            .await?;

        debug!(
            input_tokens = response.input_tokens,
            output_tokens = response.output_tokens,
            "Generated reply"
        );

        let reply = response.content.trim();
        if reply.is_empty() {
            Ok(NO_RESPONSE_PLACEHOLDER.to_string())
        } else {
            Ok(reply.to_string())
        }
    }
}

// ── Prompt construction ─────────────────────────────────────────────

fn build_classification_prompt(email: &str) -> String {
    format!(
        "Analise o seguinte email e classifique-o em uma das categorias:\n\n\
         PRODUTIVO: Emails que requerem ação ou resposta específica (solicitações de suporte, \
         atualizações sobre casos, dúvidas técnicas, requisições).\n\
         IMPRODUTIVO: Emails que não necessitam ação imediata (felicitações, agradecimentos, \
         mensagens pessoais).\n\n\
         Email: {email}\n\n\
         Responda APENAS com \"PRODUTIVO\" ou \"IMPRODUTIVO\"."
    )
}

fn build_reply_prompt(email: &str, category: Category) -> String {
    let instruction = match category {
        Category::Unproductive => "Gere uma resposta cordial e breve agradecendo a mensagem.",
        Category::Productive | Category::Error => {
            "Gere uma resposta profissional informando que a solicitação foi recebida e será \
             analisada pela equipe."
        }
    };

    format!(
        "Baseado neste email classificado como {category}, gere uma resposta automática \
         adequada e profissional em português:\n\n\
         Email: {email}\n\n\
         {instruction}"
    )
}

// ── Response parsing ────────────────────────────────────────────────

/// Map the classifier reply to a category. Productive is checked first and
/// is the default for empty or unrecognized replies.
fn parse_category(raw: &str) -> Category {
    if PRODUCTIVE_TOKEN.is_match(raw) {
        Category::Productive
    } else if UNPRODUCTIVE_TOKEN.is_match(raw) {
        Category::Unproductive
    } else {
        Category::Productive
    }
}
