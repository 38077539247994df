//! LLM integration for the email classifier.
//!
//! - `provider`: the `LlmProvider` trait and request/response types
//! - `openai`: the OpenAI chat-completions backend
//! - `retry`: the retry policy every remote call goes through

pub mod openai;
pub mod provider;
pub mod retry;

pub use openai::OpenAiProvider;
pub use provider::*;
pub use retry::{Delay, RetryPolicy, TokioDelay};

use std::sync::Arc;

use crate::config::ClassifierConfig;
use crate::error::ConfigError;

/// Create the remote provider, or `None` when no credential is configured.
pub fn create_provider(
    config: &ClassifierConfig,
) -> Result<Option<Arc<dyn LlmProvider>>, ConfigError> {
    let Some(api_key) = config.api_key.clone() else {
        tracing::warn!("OPENAI_API_KEY not set, using local classification only");
        return Ok(None);
    };

    let provider = OpenAiProvider::new(
        api_key,
        &config.model,
        &config.base_url,
        config.request_timeout,
    )?;
    tracing::info!("Using OpenAI (model: {})", config.model);
    Ok(Some(Arc::new(provider)))
}
