//! Caller-level retry for whole transfers.
//!
//! The engine itself never retries: a failed relay leaves no committed
//! object, so the safe unit of retry is the whole transfer. This module is
//! that outer policy — exponential backoff over errors the taxonomy marks
//! retryable (transient source reads), nothing else.

use std::future::Future;
use std::time::Duration;

use crate::error::TransferError;

/// Decision returned by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Do not retry this error.
    NoRetry,
    /// Retry after the given delay.
    RetryAfter(Duration),
}

/// Exponential backoff policy with caps.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    /// Base delay for backoff.
    pub base_delay: Duration,
    /// Upper bound on backoff delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Compute the backoff for a given attempt and error.
    ///
    /// `attempt` is 1-based (1 = first attempt). Returns
    /// [`RetryDecision::NoRetry`] for non-retryable errors and once
    /// `max_attempts` is reached.
    pub fn decide(&self, attempt: u32, error: &TransferError) -> RetryDecision {
        if !error.is_retryable() || attempt >= self.max_attempts {
            return RetryDecision::NoRetry;
        }
        // base * 2^(attempt-1), capped.
        let exp = 1u32 << attempt.saturating_sub(1).min(8);
        let delay = self.base_delay.saturating_mul(exp).min(self.max_delay);
        RetryDecision::RetryAfter(delay)
    }
}

/// Runs an async operation until it succeeds or the policy says stop.
/// On a retryable failure, sleeps for the backoff duration then tries the
/// whole operation again from scratch.
pub async fn run_with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    mut op: F,
) -> Result<T, TransferError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, TransferError>>,
{
    let mut attempt = 1u32;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) => match policy.decide(attempt, &e) {
                RetryDecision::NoRetry => return Err(e),
                RetryDecision::RetryAfter(delay) => {
                    tracing::info!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "transfer failed; retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn transient() -> TransferError {
        TransferError::SourceUnavailable("connection reset".into())
    }

    #[test]
    fn no_retry_for_fatal_errors() {
        let p = RetryPolicy::default();
        let fatal = TransferError::DestinationUpload("denied".into());
        assert_eq!(p.decide(1, &fatal), RetryDecision::NoRetry);
    }

    #[test]
    fn exponential_backoff_grows_and_is_capped() {
        let mut p = RetryPolicy::default();
        p.max_attempts = 20;
        let d1 = match p.decide(1, &transient()) {
            RetryDecision::RetryAfter(d) => d,
            _ => panic!("expected retry"),
        };
        let d2 = match p.decide(2, &transient()) {
            RetryDecision::RetryAfter(d) => d,
            _ => panic!("expected retry"),
        };
        assert!(d2 >= d1);

        let d_last = match p.decide(10, &transient()) {
            RetryDecision::RetryAfter(d) => d,
            _ => panic!("expected retry"),
        };
        assert!(d_last <= p.max_delay);
    }

    #[test]
    fn respects_max_attempts() {
        let mut p = RetryPolicy::default();
        p.max_attempts = 3;
        assert!(matches!(
            p.decide(1, &transient()),
            RetryDecision::RetryAfter(_)
        ));
        assert!(matches!(
            p.decide(2, &transient()),
            RetryDecision::RetryAfter(_)
        ));
        assert_eq!(p.decide(3, &transient()), RetryDecision::NoRetry);
    }

    #[tokio::test]
    async fn retries_transient_failures_until_success() {
        let policy = RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(4),
        };
        let calls = AtomicU32::new(0);
        let result = run_with_retry(&policy, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(transient())
                } else {
                    Ok(n)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn fatal_failure_is_not_retried() {
        let policy = RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(4),
        };
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = run_with_retry(&policy, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(TransferError::RangeUnsupported { status: 200 }) }
        })
        .await;
        assert!(matches!(
            result.unwrap_err(),
            TransferError::RangeUnsupported { .. }
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
