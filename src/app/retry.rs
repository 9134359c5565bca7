//! Bounded retry executor for transient chain-call failures.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::domain::error::{ApiError, ChainError};

/// Linear-backoff retry policy. Attempt `i` (1-based) that fails waits
/// `base_delay * i` before the next attempt; the final failure sleeps
/// nothing and exits as [`ApiError::RetryExhausted`].
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Runs `op` up to `max_attempts` times. Every attempt's failure is
    /// logged with its attempt number; only the last failure is carried
    /// into the returned error.
    pub async fn execute<T, F, Fut>(
        &self,
        mut op: F,
        operation: &'static str,
        contract_address: &str,
    ) -> Result<T, ApiError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ChainError>>,
    {
        let mut last = ChainError::Rpc("operation failed".to_string());

        for attempt in 1..=self.max_attempts {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    warn!(
                        operation,
                        contract_address,
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %err,
                        "attempt failed"
                    );
                    metrics::counter!("contract_retry_attempts_total").increment(1);
                    last = err;

                    if attempt < self.max_attempts {
                        tokio::time::sleep(self.base_delay * attempt).await;
                    }
                }
            }
        }

        metrics::counter!("contract_retry_exhausted_total").increment(1);
        Err(ApiError::RetryExhausted {
            operation,
            contract_address: contract_address.to_string(),
            attempts: self.max_attempts,
            cause: last,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::domain::constants::ops;

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_first_try_without_sleeping() {
        let policy = RetryPolicy::default();
        let start = tokio::time::Instant::now();

        let result = policy
            .execute(async || Ok::<_, ChainError>(7u32), ops::SET_PRICES, "0xabc")
            .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_after_transient_failures() {
        let policy = RetryPolicy::default();
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);

        let result = policy
            .execute(
                async || {
                    let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                    if n < 3 {
                        Err(ChainError::Rpc("timeout".to_string()))
                    } else {
                        Ok("0xdeadbeef".to_string())
                    }
                },
                ops::SET_PRICES,
                "0xabc",
            )
            .await;

        assert_eq!(result.unwrap(), "0xdeadbeef");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_carries_last_cause_and_attempt_count() {
        let policy = RetryPolicy::default();
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);

        let result: Result<(), ApiError> = policy
            .execute(
                async || {
                    let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                    Err(ChainError::Rpc(format!("failure {n}")))
                },
                ops::ADD_WHITELIST_ADDRESS,
                "0xabc",
            )
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        match result.unwrap_err() {
            ApiError::RetryExhausted {
                operation,
                contract_address,
                attempts,
                cause,
            } => {
                assert_eq!(operation, ops::ADD_WHITELIST_ADDRESS);
                assert_eq!(contract_address, "0xabc");
                assert_eq!(attempts, 3);
                assert!(matches!(cause, ChainError::Rpc(msg) if msg == "failure 3"));
            }
            other => panic!("expected RetryExhausted, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_grows_linearly() {
        let policy = RetryPolicy::default();
        let start = tokio::time::Instant::now();

        let _: Result<(), ApiError> = policy
            .execute(
                async || Err(ChainError::Rpc("down".to_string())),
                ops::SET_PRICES,
                "0xabc",
            )
            .await;

        // 1s after attempt 1, 2s after attempt 2, nothing after attempt 3.
        assert_eq!(start.elapsed(), Duration::from_secs(3));
    }
}
