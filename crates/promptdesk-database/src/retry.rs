//! Bounded exponential backoff for lock contention.
//!
//! Only [`ErrorKind::StoreBusy`] is retried. Each attempt is expected to
//! open, run and finish its own transaction, so a retry never sees the
//! half-done work of the previous attempt.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use promptdesk_core::config::RetryConfig;
use promptdesk_core::error::{AppError, ErrorKind};
use promptdesk_core::result::AppResult;

/// Retry schedule for contended writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Sleep before the second attempt.
    pub base_delay: Duration,
    /// Growth factor between sleeps.
    pub multiplier: u32,
    /// Upper bound on one sleep.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPolicy {
    /// Build a policy from configuration.
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.base_delay_ms),
            multiplier: config.multiplier.max(1),
            max_delay: Duration::from_millis(config.max_delay_ms),
        }
    }

    /// A policy that never retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Sleep that follows failed attempt number `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        let factor = self.multiplier.saturating_pow(exponent);
        self.base_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }

    /// Run `attempt_fn` until it succeeds, fails with a non-contention
    /// error, or the attempt budget is spent.
    ///
    /// On exhaustion the last `STORE_BUSY` error is returned with the
    /// attempt count in its message.
    pub async fn run<T, F, Fut>(&self, operation: &str, mut attempt_fn: F) -> AppResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        let mut attempt = 1;
        loop {
            match attempt_fn().await {
                Ok(value) => return Ok(value),
                Err(err) if err.kind == ErrorKind::StoreBusy => {
                    if attempt >= self.max_attempts {
                        warn!(
                            operation,
                            attempts = attempt,
                            "Store still locked, giving up"
                        );
                        return Err(AppError {
                            kind: ErrorKind::StoreBusy,
                            message: format!(
                                "The store is busy; '{operation}' was not applied after {attempt} attempts"
                            ),
                            source: err.source,
                        });
                    }

                    let delay = self.delay_after(attempt);
                    warn!(
                        operation,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "Store locked, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
