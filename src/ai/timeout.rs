//! Timeouts and Bounded Retry
//!
//! Every upstream call goes through [`with_timeout`]; calls that may be
//! retried go through [`attempt_with_policy`], which applies a
//! [`RetryPolicy`] identically to model calls and image calls.
//!
//! ## Usage
//!
//! ```ignore
//! use crate::ai::timeout::{RetryPolicy, attempt_with_policy};
//!
//! let image = attempt_with_policy(
//!     &policy,
//!     "image generation",
//!     |err| !provider.is_content_policy_error(err),
//!     || provider.generate_image(&prompt, &size, style),
//! )
//! .await?;
//! ```

use std::future::Future;
use std::time::Duration;

use backon::{ConstantBuilder, Retryable};
use tracing::warn;

use crate::constants::images as image_constants;
use crate::types::{ForgeError, Result};

/// Bounded retry policy: at most `max_retries + 1` attempts, each capped by
/// `timeout`, separated by a fixed `retry_delay`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub timeout: Duration,
    pub max_retries: usize,
    pub retry_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(image_constants::DEFAULT_TIMEOUT_SECS),
            max_retries: image_constants::DEFAULT_MAX_RETRIES,
            retry_delay: Duration::from_millis(image_constants::DEFAULT_RETRY_DELAY_MS),
        }
    }
}

impl RetryPolicy {
    /// Single attempt with a timeout
    pub fn once(timeout: Duration) -> Self {
        Self {
            timeout,
            max_retries: 0,
            retry_delay: Duration::ZERO,
        }
    }

    pub fn max_attempts(&self) -> usize {
        self.max_retries + 1
    }
}

/// Execute an async operation with a timeout
///
/// Returns a timeout error if the operation doesn't complete within the specified duration.
pub async fn with_timeout<T, F>(timeout: Duration, future: F, operation_name: &str) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, future).await {
        Ok(result) => result,
        Err(_) => Err(ForgeError::timeout(operation_name, timeout)),
    }
}

/// Run `op` under `policy`. Each attempt is wrapped in the policy timeout;
/// an error for which `should_retry` returns false ends the loop immediately.
pub async fn attempt_with_policy<T, F, Fut, P>(
    policy: &RetryPolicy,
    operation_name: &str,
    should_retry: P,
    mut op: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
    P: Fn(&ForgeError) -> bool,
{
    let timeout = policy.timeout;
    let attempt = || {
        let fut = op();
        async move { with_timeout(timeout, fut, operation_name).await }
    };

    attempt
        .retry(
            ConstantBuilder::default()
                .with_delay(policy.retry_delay)
                .with_max_times(policy.max_retries),
        )
        .when(|err| should_retry(err))
        .notify(|err, delay| {
            warn!(
                "{} failed, retrying in {:?}: {}",
                operation_name, delay, err
            );
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn policy(max_retries: usize) -> RetryPolicy {
        RetryPolicy {
            timeout: Duration::from_secs(90),
            max_retries,
            retry_delay: Duration::from_secs(2),
        }
    }

    #[tokio::test]
    async fn test_with_timeout_success() {
        let result = with_timeout(
            Duration::from_secs(1),
            async { Ok::<_, ForgeError>(42) },
            "test operation",
        )
        .await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_timeout_expires() {
        let result = with_timeout(
            Duration::from_millis(10),
            async {
                tokio::time::sleep(Duration::from_secs(1)).await;
                Ok::<_, ForgeError>(42)
            },
            "slow operation",
        )
        .await;
        assert!(matches!(result.unwrap_err(), ForgeError::Timeout { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_until_success() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let result = attempt_with_policy(&policy(2), "flaky", |_| true, || {
            let counter = counter.clone();
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(ForgeError::ImageApi("503 overloaded".into()))
                } else {
                    Ok("done")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_attempts_are_bounded() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let result: Result<()> = attempt_with_policy(&policy(1), "always failing", |_| true, || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(ForgeError::ImageApi("503".into()))
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_retryable_stops_immediately() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let result: Result<()> = attempt_with_policy(&policy(5), "policy", |_| false, || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(ForgeError::ImageApi("content_policy_violation".into()))
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_each_attempt_times_out() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let short = RetryPolicy {
            timeout: Duration::from_secs(1),
            max_retries: 1,
            retry_delay: Duration::from_millis(10),
        };

        let result: Result<()> = attempt_with_policy(&short, "hanging", |_| true, || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(())
            }
        })
        .await;

        assert!(matches!(result.unwrap_err(), ForgeError::Timeout { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_once_policy() {
        let policy = RetryPolicy::once(Duration::from_secs(5));
        assert_eq!(policy.max_attempts(), 1);
    }
}
