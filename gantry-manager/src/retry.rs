//! Retry executor
//!
//! Runs an async operation until it succeeds, fails with an error the caller
//! classifies as terminal, or runs out of attempts. The last failure is always
//! the one returned.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Same delay before every retry
    Fixed,
    /// `base_delay * 2^attempt`
    Exponential,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts; zero still runs the operation once
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub backoff: Backoff,
}

impl RetryPolicy {
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay: delay,
            backoff: Backoff::Fixed,
        }
    }

    pub fn exponential(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            backoff: Backoff::Exponential,
        }
    }

    /// Delay before retrying after failed attempt `attempt` (0-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed => self.base_delay,
            Backoff::Exponential => self
                .base_delay
                .saturating_mul(2u32.saturating_pow(attempt)),
        }
    }

    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

/// Run `op` under `policy`
///
/// # Arguments
/// * `operation` - Name used in log lines
/// * `is_retryable` - Decides whether a failure is worth another attempt
///
/// # Returns
/// The first success, the first terminal failure, or the failure of the last
/// attempt.
pub async fn retry<T, E, F, Fut, R>(
    policy: &RetryPolicy,
    operation: &str,
    is_retryable: R,
    mut op: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    R: Fn(&E) -> bool,
    E: Display,
{
    let max_attempts = policy.attempts();
    let mut attempt = 0;

    loop {
        match op().await {
            Ok(value) => {
                if attempt > 0 {
                    tracing::info!(operation, attempt = attempt + 1, "Succeeded after retry");
                }
                return Ok(value);
            }
            Err(err) if is_retryable(&err) && attempt + 1 < max_attempts => {
                let delay = policy.delay_for(attempt);
                tracing::warn!(
                    operation,
                    attempt = attempt + 1,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Attempt failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => {
                tracing::error!(
                    operation,
                    attempt = attempt + 1,
                    max_attempts,
                    error = %err,
                    "Giving up"
                );
                return Err(err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug, PartialEq)]
    enum TestError {
        Transient(u32),
        Fatal,
    }

    impl Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{:?}", self)
        }
    }

    fn transient(err: &TestError) -> bool {
        matches!(err, TestError::Transient(_))
    }

    #[test]
    fn test_exponential_delays() {
        let policy = RetryPolicy::exponential(5, Duration::from_millis(250));
        assert_eq!(policy.delay_for(0), Duration::from_millis(250));
        assert_eq!(policy.delay_for(1), Duration::from_millis(500));
        assert_eq!(policy.delay_for(3), Duration::from_millis(2000));

        let fixed = RetryPolicy::fixed(4, Duration::from_millis(300));
        assert_eq!(fixed.delay_for(3), Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_transient_failures() {
        let calls = &AtomicU32::new(0);
        let policy = RetryPolicy::exponential(5, Duration::from_millis(250));
        let started = tokio::time::Instant::now();

        let result = retry(&policy, "flaky", transient, || async move {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n < 2 { Err(TestError::Transient(n)) } else { Ok(n) }
        })
        .await;

        assert_eq!(result, Ok(2));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(started.elapsed() >= Duration::from_millis(750));
        assert!(started.elapsed() < Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_returns_last_failure_when_exhausted() {
        let calls = &AtomicU32::new(0);
        let policy = RetryPolicy::exponential(3, Duration::from_millis(10));

        let result: Result<(), _> = retry(&policy, "always", transient, || async move {
            Err(TestError::Transient(calls.fetch_add(1, Ordering::SeqCst)))
        })
        .await;

        assert_eq!(result, Err(TestError::Transient(2)));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_terminal_failure_is_not_retried() {
        let calls = &AtomicU32::new(0);
        let policy = RetryPolicy::exponential(5, Duration::from_millis(10));

        let result: Result<(), _> = retry(&policy, "fatal", transient, || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(TestError::Fatal)
        })
        .await;

        assert_eq!(result, Err(TestError::Fatal));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_attempts_runs_once() {
        let calls = &AtomicU32::new(0);
        let policy = RetryPolicy::exponential(0, Duration::from_millis(10));

        let result: Result<(), _> = retry(&policy, "once", transient, || async move {
            Err(TestError::Transient(calls.fetch_add(1, Ordering::SeqCst)))
        })
        .await;

        assert_eq!(result, Err(TestError::Transient(0)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
