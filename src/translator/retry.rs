//! Bounded retry with linear or exponential backoff.
//!
//! Wraps one provider call per chunk; the caller decides what counts as a
//! retryable operation by what it puts in the closure.

use std::future::Future;
use std::time::Duration;

use crate::error::{VerbiError, VerbiResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backoff {
    /// Delay grows as `delay * attempt`.
    Linear,
    /// Delay grows as `delay * 2^(attempt - 1)`.
    #[default]
    Exponential,
}

impl Backoff {
    fn delay_for(self, base: Duration, attempt: u32) -> Duration {
        match self {
            Backoff::Linear => base * attempt,
            Backoff::Exponential => base * 2u32.saturating_pow(attempt - 1),
        }
    }
}

/// Options for [`with_retry`]. Defaults: 3 attempts, 1 second base delay,
/// exponential backoff, no retry notification.
pub struct RetryOptions {
    pub max_attempts: u32,
    pub delay: Duration,
    pub backoff: Backoff,
    on_retry: Option<Box<dyn FnMut(u32, &VerbiError) + Send>>,
}

impl Default for RetryOptions {
    fn default() -> Self {
        RetryOptions {
            max_attempts: 3,
            delay: Duration::from_secs(1),
            backoff: Backoff::default(),
            on_retry: None,
        }
    }
}

impl RetryOptions {
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Called with the 1-based attempt number and the error, before sleeping.
    pub fn on_retry(mut self, on_retry: impl FnMut(u32, &VerbiError) + Send + 'static) -> Self {
        self.on_retry = Some(Box::new(on_retry));
        self
    }
}

/// Run `operation` up to `max_attempts` times in total.
///
/// A failed attempt that is not the last notifies `on_retry`, sleeps per the
/// backoff policy and tries again. The final attempt's error propagates
/// unchanged.
pub async fn with_retry<T, F, Fut>(mut operation: F, mut options: RetryOptions) -> VerbiResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = VerbiResult<T>>,
{
    let max_attempts = options.max_attempts.max(1);
    let mut attempt = 0;
    loop {
        attempt += 1;
        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) => {
                if attempt >= max_attempts {
                    return Err(error);
                }
                if let Some(on_retry) = options.on_retry.as_mut() {
                    on_retry(attempt, &error);
                }
                tokio::time::sleep(options.backoff.delay_for(options.delay, attempt)).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn failing_until<T: Clone + Send + 'static>(
        succeed_on: u32,
        value: T,
    ) -> (
        Arc<AtomicU32>,
        impl FnMut() -> std::pin::Pin<Box<dyn Future<Output = VerbiResult<T>> + Send>>,
    ) {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let operation = move || {
            let attempt = counter.fetch_add(1, Ordering::SeqCst) + 1;
            let value = value.clone();
            Box::pin(async move {
                if attempt < succeed_on {
                    Err(VerbiError::provider_server("mock", "boom"))
                } else {
                    Ok(value)
                }
            }) as std::pin::Pin<Box<dyn Future<Output = VerbiResult<T>> + Send>>
        };
        (calls, operation)
    }

    fn fast() -> RetryOptions {
        RetryOptions::default().delay(Duration::from_millis(1))
    }

    // ========== Backoff Tests ==========

    #[test]
    fn test_linear_backoff_delays() {
        let base = Duration::from_millis(100);
        assert_eq!(Backoff::Linear.delay_for(base, 1), Duration::from_millis(100));
        assert_eq!(Backoff::Linear.delay_for(base, 2), Duration::from_millis(200));
        assert_eq!(Backoff::Linear.delay_for(base, 3), Duration::from_millis(300));
    }

    #[test]
    fn test_exponential_backoff_delays() {
        let base = Duration::from_millis(100);
        assert_eq!(Backoff::Exponential.delay_for(base, 1), Duration::from_millis(100));
        assert_eq!(Backoff::Exponential.delay_for(base, 2), Duration::from_millis(200));
        assert_eq!(Backoff::Exponential.delay_for(base, 3), Duration::from_millis(400));
    }

    // ========== Retry Tests ==========

    #[tokio::test]
    async fn test_success_on_first_attempt() {
        let (calls, operation) = failing_until(1, "done");
        let result = with_retry(operation, fast()).await.unwrap();
        assert_eq!(result, "done");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fails_twice_then_succeeds() {
        let (calls, operation) = failing_until(3, 42);
        let retries: Arc<Mutex<Vec<u32>>> = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&retries);

        let options = fast().on_retry(move |attempt, error| {
            assert!(error.to_string().contains("boom"));
            seen.lock().unwrap().push(attempt);
        });
        let result = with_retry(operation, options).await.unwrap();

        assert_eq!(result, 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(*retries.lock().unwrap(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_exhausted_attempts_return_original_error() {
        let (calls, operation) = failing_until(10, ());
        let result = with_retry(operation, fast().max_attempts(3)).await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        let message = result.unwrap_err().to_string();
        assert!(message.contains("boom"));
    }

    #[tokio::test]
    async fn test_single_attempt_never_notifies() {
        let (calls, operation) = failing_until(10, ());
        let retries = Arc::new(AtomicU32::new(0));
        let seen = Arc::clone(&retries);

        let options = fast().max_attempts(1).on_retry(move |_, _| {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        let result = with_retry(operation, options).await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(retries.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_zero_max_attempts_still_runs_once() {
        let (calls, operation) = failing_until(1, "ok");
        let result = with_retry(operation, fast().max_attempts(0)).await.unwrap();
        assert_eq!(result, "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
