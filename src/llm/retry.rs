//! Bounded retry with fixed backoff for collaborator calls.
//!
//! Only transient transport failures (connect/timeout, rate limiting) are
//! retried. Application-level errors surface immediately.

use std::future::Future;
use std::time::Duration;

/// Errors that can distinguish transient transport failures.
pub trait Transient {
    fn is_transient(&self) -> bool;
}

impl Transient for crate::error::LlmError {
    fn is_transient(&self) -> bool {
        crate::error::LlmError::is_transient(self)
    }
}

impl Transient for crate::error::SearchError {
    fn is_transient(&self) -> bool {
        crate::error::SearchError::is_transient(self)
    }
}

/// Retry policy: a fixed number of attempts with a fixed pause between them.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, backoff: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            backoff,
        }
    }

    /// Run `op` up to `attempts` times, pausing `backoff` between attempts.
    ///
    /// Returns the first success, the first non-transient error, or the last
    /// transient error once attempts are exhausted.
    pub async fn run<T, E, F, Fut>(&self, what: &str, mut op: F) -> Result<T, E>
    where
        E: Transient + std::fmt::Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.attempts => {
                    tracing::warn!(
                        "{what} failed (attempt {attempt}/{}): {e}; retrying in {:?}",
                        self.attempts,
                        self.backoff
                    );
                    tokio::time::sleep(self.backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::error::LlmError;

    fn transient_err() -> LlmError {
        LlmError::RateLimited {
            provider: "test".to_string(),
            retry_after: None,
        }
    }

    fn permanent_err() -> LlmError {
        LlmError::AuthFailed {
            provider: "test".to_string(),
        }
    }

    #[tokio::test]
    async fn retries_transient_errors_up_to_bound() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(3, Duration::from_millis(1));
        let result: Result<(), LlmError> = policy
            .run("test op", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(transient_err()) }
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn does_not_retry_permanent_errors() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(3, Duration::from_millis(1));
        let result: Result<(), LlmError> = policy
            .run("test op", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(permanent_err()) }
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn succeeds_after_transient_failure() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(3, Duration::from_millis(1));
        let result: Result<u32, LlmError> = policy
            .run("test op", || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        Err(transient_err())
                    } else {
                        Ok(42)
                    }
                }
            })
            .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
