//! Bounded retry for mutating API calls.
//!
//! The backing control plane serializes mutations per aggregate: a load
//! balancer accepts one in-flight change at a time and answers a concurrent
//! mutation attempt with a conflict error instead of queuing it. The single
//! mutating request of a create/update/delete is therefore wrapped in a
//! bounded retry that absorbs that conflict class; everything else is fatal.
//! Status-poll fetches never go through this path.

use std::future::Future;
use std::time::Duration;

use tokio::time::{Instant, sleep};
use tracing::warn;

/// Budget and pacing for one mutating call.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total time allowed across all attempts, typically the operation
    /// timeout of the surrounding create/update/delete.
    pub timeout: Duration,

    /// Fixed pause between attempts.
    pub interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(600),
            interval: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Default::default()
        }
    }
}

/// Execute `operation`, retrying while `is_retryable` classifies the error
/// as a transient conflict and the time budget holds.
///
/// `is_retryable` is a pure predicate over the caller's error taxonomy; the
/// retry loop knows nothing about the underlying client library. The first
/// non-retryable error, and the last error once the budget is exhausted,
/// propagate unchanged.
pub async fn retry_on_conflict<F, Fut, T, E, P>(
    policy: &RetryPolicy,
    operation_name: &str,
    is_retryable: P,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    E: std::fmt::Display,
{
    let deadline = Instant::now() + policy.timeout;
    let mut attempt = 0u32;

    loop {
        attempt += 1;

        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if is_retryable(&e) && Instant::now() + policy.interval < deadline => {
                warn!(
                    operation = %operation_name,
                    attempt = attempt,
                    error = %e,
                    "Mutation rejected with a retryable conflict, retrying"
                );
                sleep(policy.interval).await;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            timeout: Duration::from_millis(100),
            interval: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn succeeds_first_attempt() {
        let result: Result<i32, String> =
            retry_on_conflict(&fast_policy(), "create", |_| true, || async { Ok(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }

    #[tokio::test]
    async fn absorbs_conflict_burst() {
        let count = Arc::new(AtomicU32::new(0));
        let c = count.clone();

        let result: Result<i32, String> =
            retry_on_conflict(&fast_policy(), "create", |e| e == "conflict", || {
                let c = c.clone();
                async move {
                    if c.fetch_add(1, Ordering::SeqCst) < 3 {
                        Err("conflict".to_string())
                    } else {
                        Ok(7)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(count.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn non_retryable_error_propagates_unchanged() {
        let count = Arc::new(AtomicU32::new(0));
        let c = count.clone();

        let result: Result<i32, String> =
            retry_on_conflict(&fast_policy(), "create", |e| e == "conflict", || {
                let c = c.clone();
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Err("quota exceeded".to_string())
                }
            })
            .await;

        assert_eq!(result.unwrap_err(), "quota exceeded");
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn exhausted_budget_returns_last_error() {
        let policy = RetryPolicy {
            timeout: Duration::from_millis(10),
            interval: Duration::from_millis(3),
        };

        let result: Result<i32, String> =
            retry_on_conflict(&policy, "delete", |_| true, || async {
                Err("conflict".to_string())
            })
            .await;

        assert_eq!(result.unwrap_err(), "conflict");
    }
}
