//! Shared types for the classification pipeline.

use serde::{Deserialize, Serialize};

/// Business category of an email.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    /// Requires a specific action or response.
    #[serde(rename = "PRODUTIVO")]
    Productive,
    /// No action needed (thanks, greetings, personal notes).
    #[serde(rename = "IMPRODUTIVO")]
    Unproductive,
    /// The pipeline could not produce a classification.
    #[serde(rename = "ERRO")]
    Error,
}

impl Category {
    /// Token used in prompts and in the serialized result.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Productive => "PRODUTIVO",
            Self::Unproductive => "IMPRODUTIVO",
            Self::Error => "ERRO",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Which classifier produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassificationMethod {
    Remote,
    Local,
    Error,
}

impl ClassificationMethod {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Remote => "remote",
            Self::Local => "local",
            Self::Error => "error",
        }
    }
}

/// Category plus suggested reply, as produced by either classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub category: Category,
    pub response: String,
}

/// Final pipeline output. `response` is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub category: Category,
    pub response: String,
    /// Normalized form of the first 200 characters of the email.
    pub preprocessed_preview: String,
    pub method: ClassificationMethod,
}
