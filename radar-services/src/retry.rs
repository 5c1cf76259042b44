//! Retry with exponential backoff and jitter
//!
//! Only errors that [`RadarError::is_retryable`] accepts are retried.
//! Client errors and malformed payloads are returned on the first attempt.

use std::future::Future;
use std::time::Duration;

use radar_core::{RadarError, RadarResult};
use rand::Rng;
use tracing::{debug, warn};

/// Default backoff base; the n-th retry waits `base * 2^(n-1)` plus jitter
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1000);
/// Upper bound of the uniform jitter added to every backoff
pub const DEFAULT_MAX_JITTER: Duration = Duration::from_millis(1000);

/// Final error of a retried call and how many attempts were spent on it
#[derive(Debug, Clone)]
pub struct RetryFailure {
    pub attempts: u32,
    pub error: RadarError,
}

pub type RetryResult<T> = Result<T, RetryFailure>;

#[derive(Debug, Clone)]
pub struct RetryExecutor {
    max_attempts: u32,
    base_delay: Duration,
    max_jitter: Duration,
}

impl RetryExecutor {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay: DEFAULT_BASE_DELAY,
            max_jitter: DEFAULT_MAX_JITTER,
        }
    }

    pub fn with_backoff(mut self, base_delay: Duration, max_jitter: Duration) -> Self {
        self.base_delay = base_delay;
        self.max_jitter = max_jitter;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Backoff before retry number `retry` (1-based), jitter excluded
    pub fn backoff(&self, retry: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(retry.saturating_sub(1)))
    }

    fn jitter(&self) -> Duration {
        let max_ms = self.max_jitter.as_millis() as u64;
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::rng().random_range(0..=max_ms))
    }

    /// Run `op` until it succeeds, fails terminally, or attempts run out
    pub async fn run<T, F, Fut>(&self, name: &str, mut op: F) -> RetryResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = RadarResult<T>>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match op().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(operation = name, attempt, "Succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(error) if !error.is_retryable() => {
                    debug!(operation = name, attempt, %error, "Terminal error, not retrying");
                    return Err(RetryFailure { attempts: attempt, error });
                }
                Err(error) if attempt >= self.max_attempts => {
                    warn!(operation = name, attempt, %error, "Retries exhausted");
                    return Err(RetryFailure { attempts: attempt, error });
                }
                Err(error) => {
                    let delay = self.backoff(attempt) + self.jitter();
                    warn!(
                        operation = name,
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        %error,
                        "Retryable error, backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use tokio::time::Instant;

    fn scripted(
        results: Vec<Result<u32, RadarError>>,
    ) -> (Arc<AtomicU32>, impl FnMut() -> std::future::Ready<Result<u32, RadarError>>) {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let op = move || {
            let i = counter.fetch_add(1, Ordering::SeqCst) as usize;
            std::future::ready(results[i.min(results.len() - 1)].clone())
        };
        (calls, op)
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_transient_errors() {
        let executor = RetryExecutor::new(3).with_backoff(Duration::from_millis(1000), Duration::ZERO);
        let (calls, op) = scripted(vec![
            Err(RadarError::network("connection reset")),
            Err(RadarError::http(503, "unavailable")),
            Ok(7),
        ]);

        let start = Instant::now();
        let result = executor.run("flaky", op).await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // 1s then 2s
        assert_eq!(start.elapsed(), Duration::from_millis(3000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_client_error_is_not_retried() {
        let executor = RetryExecutor::new(5);
        let (calls, op) = scripted(vec![Err(RadarError::http(404, "missing"))]);

        let failure = executor.run("missing", op).await.unwrap_err();
        assert_eq!(failure.attempts, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(failure.error, RadarError::Http { status: 404, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_validation_error_is_not_retried() {
        let executor = RetryExecutor::new(3);
        let (calls, op) = scripted(vec![Err(RadarError::validation("not an array"))]);
        assert!(executor.run("invalid", op).await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_attempts_return_last_error() {
        let executor = RetryExecutor::new(3);
        let (calls, op) = scripted(vec![
            Err(RadarError::timeout("first")),
            Err(RadarError::timeout("second")),
            Err(RadarError::http(429, "slow down")),
        ]);

        let start = Instant::now();
        let failure = executor.run("down", op).await.unwrap_err();
        assert_eq!(failure.attempts, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(matches!(failure.error, RadarError::Http { status: 429, .. }));

        // 1s + 2s of backoff plus at most 1s of jitter each
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(3000), "{:?}", elapsed);
        assert!(elapsed <= Duration::from_millis(5000), "{:?}", elapsed);
    }

    #[test]
    fn test_backoff_doubles() {
        let executor = RetryExecutor::new(4);
        assert_eq!(executor.backoff(1), Duration::from_millis(1000));
        assert_eq!(executor.backoff(2), Duration::from_millis(2000));
        assert_eq!(executor.backoff(3), Duration::from_millis(4000));
        assert_eq!(RetryExecutor::new(0).max_attempts(), 1);
    }
}
