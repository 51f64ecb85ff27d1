//! Bounded retry with exponential backoff around one capability invocation.
//!
//! Transient failures (timeouts, 429/503 overload) are frequent under
//! concurrent load and usually clear within seconds; fatal failures (bad
//! key, unparseable response) never do. The policy retries only the former,
//! doubling the wait each time so several windows backing off at once do not
//! re-overwhelm a recovering endpoint: with a 1 s base and a 3-attempt
//! budget the wait sequence is 1 s → 2 s.
//!
//! The delay schedule is a pure function ([`RetryPolicy::delay_before_retry`])
//! so tests can assert it without sleeping.

use crate::config::TocConfig;
use crate::error::{ExtractionFailure, FailureKind};
use std::future::Future;
use tokio::time::{sleep, Duration};
use tracing::warn;

/// Retry budget and backoff base for one capability invocation.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, first try included. An exhausted invocation has made
    /// exactly this many calls.
    pub max_attempts: u32,
    /// Backoff base in milliseconds; retry n waits `backoff_ms · 2^(n−1)`.
    pub backoff_ms: u64,
}

impl RetryPolicy {
    pub fn from_config(config: &TocConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            backoff_ms: config.retry_backoff_ms,
        }
    }

    /// Delay before retry `n` (1-based; the first try has no delay).
    pub fn delay_before_retry(&self, n: u32) -> Duration {
        Duration::from_millis(self.backoff_ms * 2u64.pow(n.saturating_sub(1)))
    }

    /// Run `call` until it succeeds, fails fatally, or the budget is spent.
    ///
    /// `label` names the invocation in logs ("window 3", "verification").
    pub async fn run<T, F, Fut>(&self, label: &str, mut call: F) -> Result<T, RetryError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ExtractionFailure>>,
    {
        let mut last_error: Option<String> = None;

        for attempt in 1..=self.max_attempts {
            if attempt > 1 {
                let delay = self.delay_before_retry(attempt - 1);
                warn!(
                    "{}: retry {}/{} after {:?}",
                    label,
                    attempt - 1,
                    self.max_attempts - 1,
                    delay
                );
                sleep(delay).await;
            }

            match call().await {
                Ok(value) => return Ok(value),
                Err(failure) if failure.is_transient() => {
                    warn!("{}: attempt {} failed — {}", label, attempt, failure.message());
                    last_error = Some(failure.message().to_string());
                }
                Err(failure) => {
                    warn!("{}: fatal — {}", label, failure.message());
                    return Err(RetryError::Fatal {
                        detail: failure.message().to_string(),
                    });
                }
            }
        }

        Err(RetryError::Exhausted {
            attempts: self.max_attempts,
            last_error: last_error.unwrap_or_else(|| "unknown error".to_string()),
        })
    }
}

/// Terminal failure of a retry-wrapped invocation.
#[derive(Debug, Clone)]
pub enum RetryError {
    /// Transient failures persisted through the whole attempt budget.
    Exhausted { attempts: u32, last_error: String },
    /// A non-retryable failure; at most one attempt was made.
    Fatal { detail: String },
}

impl RetryError {
    pub fn kind(&self) -> FailureKind {
        match self {
            RetryError::Exhausted { .. } => FailureKind::Exhausted,
            RetryError::Fatal { .. } => FailureKind::Fatal,
        }
    }

    pub fn detail(&self) -> &str {
        match self {
            RetryError::Exhausted { last_error, .. } => last_error,
            RetryError::Fatal { detail } => detail,
        }
    }
}
