//! Resilient email classification pipeline.
//!
//! Every email flows through `EmailClassifier::classify_and_respond()`:
//! 1. `RemoteClassifier`: LLM classification + reply, under `RetryPolicy`
//! 2. `HeuristicClassifier`: keyword fallback when the remote is absent or out of quota
//! 3. `TextNormalizer`: normalized preview attached to every result
//!
//! **No error escapes the pipeline.** Failures become an `Error`-category result.

pub mod heuristic;
pub mod normalizer;
pub mod orchestrator;
pub mod remote;
pub mod types;

pub use heuristic::HeuristicClassifier;
pub use normalizer::{TextNormalizer, ensure_resources_loaded};
pub use orchestrator::EmailClassifier;
pub use remote::RemoteClassifier;
pub use types::{Category, Classification, ClassificationMethod, ClassificationResult};
