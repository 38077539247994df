//! Error types for the email classifier.

use std::time::Duration;

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Input error: {0}")]
    Input(#[from] InputError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// How a remote fault should be treated by the retry policy.
///
/// Decided once, where the raw fault is first observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// Billing/usage allowance exhausted. Never retried.
    QuotaExceeded,
    /// Transient throttling. Retried with exponential backoff.
    RateLimited,
    /// Network failure, timeout or server-side error.
    Transient,
    Other,
}

impl FaultKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::QuotaExceeded => "quota_exceeded",
            Self::RateLimited => "rate_limited",
            Self::Transient => "transient",
            Self::Other => "other",
        }
    }
}

/// LLM provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} quota exceeded: {reason}")]
    QuotaExceeded { provider: String, reason: String },

    #[error("Provider {provider} rate limited, retry after {retry_after:?}")]
    RateLimited {
        provider: String,
        retry_after: Option<Duration>,
    },

    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Provider {provider} server error ({status}): {reason}")]
    ServerError {
        provider: String,
        status: u16,
        reason: String,
    },

    #[error("Provider {provider} rejected request ({status}): {reason}")]
    Rejected {
        provider: String,
        status: u16,
        reason: String,
    },

    #[error("Authentication failed for provider {provider}")]
    AuthFailed { provider: String },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LlmError {
    /// Retry classification for this fault.
    pub fn kind(&self) -> FaultKind {
        match self {
            Self::QuotaExceeded { .. } => FaultKind::QuotaExceeded,
            Self::RateLimited { .. } => FaultKind::RateLimited,
            Self::RequestFailed { .. } | Self::ServerError { .. } => FaultKind::Transient,
            Self::Rejected { .. }
            | Self::AuthFailed { .. }
            | Self::InvalidResponse { .. }
            | Self::Json(_) => FaultKind::Other,
        }
    }
}

/// Outcome of a remote call that the retry policy gave up on.
#[derive(Debug, thiserror::Error)]
pub enum RetryError {
    /// Fatal quota condition. `message` is the user-facing remediation text.
    #[error("{message}")]
    QuotaExceeded {
        message: String,
        #[source]
        source: LlmError,
    },

    #[error("{source}")]
    Exhausted {
        attempts: u32,
        #[source]
        source: LlmError,
    },
}

impl RetryError {
    pub fn kind(&self) -> FaultKind {
        match self {
            Self::QuotaExceeded { .. } => FaultKind::QuotaExceeded,
            Self::Exhausted { source, .. } => source.kind(),
        }
    }

    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, Self::QuotaExceeded { .. })
    }
}

/// Errors raised while acquiring email text, before the pipeline runs.
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("Email text too short: {actual} characters, at least {min} required")]
    TooShort { actual: usize, min: usize },

    #[error("Unsupported file type: {0} (only .txt is supported)")]
    UnsupportedFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
