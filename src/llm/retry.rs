//! Retry policy for remote LLM calls.
//!
//! Each failure is classified by `LlmError::kind()`:
//! - quota exceeded → fail immediately with a remediation message
//! - rate limited → wait 1, 2, 4... units and retry
//! - anything else → wait 1 unit and retry
//!
//! Once attempts are exhausted the last fault is returned.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::{FaultKind, LlmError, RetryError};

/// Shown to the user when the remote account has no quota left.
pub const QUOTA_EXCEEDED_MESSAGE: &str = "⚠️ Cota da API OpenAI excedida.\n\n\
Para resolver:\n\
1. Verifique seu plano e os detalhes de cobrança em https://platform.openai.com/account/billing\n\
2. Adicione créditos ou atualize seu plano\n\
3. Aguarde a renovação da cota ou configure outra chave de API";

/// Something that can wait between attempts.
#[async_trait]
pub trait Delay: Send + Sync {
    async fn wait(&self, duration: Duration);
}

/// Non-blocking wait on the tokio timer; only the calling task is suspended.
pub struct TokioDelay;

#[async_trait]
impl Delay for TokioDelay {
    async fn wait(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Retry policy wrapping a single remote call.
#[derive(Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    unit: Duration,
    delay: Arc<dyn Delay>,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, unit: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            unit,
            delay: Arc::new(TokioDelay),
        }
    }

    /// Replace the wait implementation (tests record waits instead of sleeping).
    pub fn with_delay(mut self, delay: Arc<dyn Delay>) -> Self {
        self.delay = delay;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Wait before the next attempt, or `None` if the fault must not be retried.
    fn backoff(&self, kind: FaultKind, attempt: u32) -> Option<Duration> {
        match kind {
            FaultKind::QuotaExceeded => None,
            FaultKind::RateLimited => Some(
                2u32.checked_pow(attempt)
                    .and_then(|factor| self.unit.checked_mul(factor))
                    .unwrap_or(Duration::MAX),
            ),
            FaultKind::Transient | FaultKind::Other => Some(self.unit),
        }
    }

    /// Run `op` until it succeeds, hits a quota wall, or runs out of attempts.
    pub async fn run<T, F, Fut>(&self, operation: &str, mut op: F) -> Result<T, RetryError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, LlmError>>,
    {
        let mut attempt = 0;
        loop {
            let err = match op().await {
                Ok(value) => {
                    if attempt > 0 {
                        debug!(operation, attempt = attempt + 1, "Remote call succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(err) => err,
            };

            let kind = err.kind();
            if kind == FaultKind::QuotaExceeded {
                warn!(operation, error = %err, "Quota exceeded, not retrying");
                return Err(RetryError::QuotaExceeded {
                    message: QUOTA_EXCEEDED_MESSAGE.to_string(),
                    source: err,
                });
            }

            if attempt + 1 >= self.max_attempts {
                warn!(
                    operation,
                    attempts = self.max_attempts,
                    kind = kind.label(),
                    error = %err,
                    "Remote call failed, attempts exhausted"
                );
                return Err(RetryError::Exhausted {
                    attempts: self.max_attempts,
                    source: err,
                });
            }

            if let Some(wait) = self.backoff(kind, attempt) {
                warn!(
                    operation,
                    attempt = attempt + 1,
                    max_attempts = self.max_attempts,
                    kind = kind.label(),
                    delay_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX),
                    error = %err,
                    "Remote call failed, will retry"
                );
                self.delay.wait(wait).await;
            }
            attempt += 1;
        }
    }
}

/// Records requested waits without sleeping.
#[cfg(test)]
#[derive(Default)]
pub(crate) struct RecordingDelay {
    waits: std::sync::Mutex<Vec<Duration>>,
}

#[cfg(test)]
impl RecordingDelay {
    pub(crate) fn waits(&self) -> Vec<Duration> {
        self.waits.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl Delay for RecordingDelay {
    async fn wait(&self, duration: Duration) {
        self.waits.lock().unwrap().push(duration);
    }
}
