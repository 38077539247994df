//! Configuration types.

use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Upper bound for `CLASSIFIER_MAX_ATTEMPTS`.
pub const MAX_ATTEMPTS_LIMIT: u32 = 10;
/// Upper bound for `CLASSIFIER_BACKOFF_UNIT_MS` (one minute).
pub const MAX_BACKOFF_UNIT_MS: u64 = 60_000;

/// Classifier configuration.
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// OpenAI API key. `None` switches the pipeline to local-only mode.
    pub api_key: Option<SecretString>,
    /// Chat model used for both prompts.
    pub model: String,
    /// Base URL of the chat-completions API.
    pub base_url: String,
    /// Per-call HTTP timeout.
    pub request_timeout: Duration,
    /// Attempts per remote call, including the first one.
    pub max_attempts: u32,
    /// Backoff time unit (rate-limit waits are 1, 2, 4... units).
    pub backoff_unit: Duration,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(30),
            max_attempts: 3,
            backoff_unit: Duration::from_secs(1),
        }
    }
}

impl ClassifierConfig {
    /// Build configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let api_key = lookup("OPENAI_API_KEY")
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .map(SecretString::from);

        let model = lookup("OPENAI_MODEL")
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(defaults.model);

        let base_url = lookup("OPENAI_BASE_URL")
            .map(|u| u.trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or(defaults.base_url);

        let request_timeout = parse_or(&lookup, "OPENAI_TIMEOUT_SECS", 30u64)?;
        let max_attempts = parse_or(&lookup, "CLASSIFIER_MAX_ATTEMPTS", defaults.max_attempts)?;
        if !(1..=MAX_ATTEMPTS_LIMIT).contains(&max_attempts) {
            return Err(ConfigError::InvalidValue {
                key: "CLASSIFIER_MAX_ATTEMPTS".into(),
                message: format!("must be between 1 and {MAX_ATTEMPTS_LIMIT}, got {max_attempts}"),
            });
        }
        let backoff_unit_ms = parse_or(&lookup, "CLASSIFIER_BACKOFF_UNIT_MS", 1000u64)?;
        if backoff_unit_ms > MAX_BACKOFF_UNIT_MS {
            return Err(ConfigError::InvalidValue {
                key: "CLASSIFIER_BACKOFF_UNIT_MS".into(),
                message: format!("must be at most {MAX_BACKOFF_UNIT_MS}, got {backoff_unit_ms}"),
            });
        }

        Ok(Self {
            api_key,
            model,
            base_url,
            request_timeout: Duration::from_secs(request_timeout),
            max_attempts,
            backoff_unit: Duration::from_millis(backoff_unit_ms),
        })
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => {
            raw.trim()
                .parse()
                .map_err(|e: T::Err| ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: format!("{raw:?}: {e}"),
                })
        }
        _ => Ok(default),
    }
}
