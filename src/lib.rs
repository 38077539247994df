//! Email classifier: remote-first classification with local fallback.

pub mod config;
pub mod error;
pub mod input;
pub mod llm;
pub mod pipeline;
