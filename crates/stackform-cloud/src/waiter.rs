//! Asynchronous status reconciliation.
//!
//! OpenStack-style control planes apply mutations asynchronously: a create,
//! update or delete call returns immediately and the resource (or its parent
//! aggregate) transitions through one or more pending statuses before
//! settling. [`wait_for_status`] turns that into a blocking call: it polls a
//! caller-supplied fetch operation until the resource reaches the target
//! status, stays in a pending status, or fails definitively.
//!
//! # Example
//!
//! ```ignore
//! use stackform_cloud::waiter::{wait_for_status, StatusPoll};
//!
//! let poll = StatusPoll::new("loadbalancer", lb_id, "ACTIVE")
//!     .pending(&["PENDING_CREATE", "PENDING_UPDATE"])
//!     .timeout(timeout);
//! wait_for_status(poll, || async { client.provisioning_status(lb_id).await }).await?;
//! ```

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::time::{Instant, sleep};
use tracing::debug;

/// Failure modes of a status wait.
#[derive(Error, Debug)]
pub enum WaitError<E> {
    /// The resource vanished while waiting for a non-deletion target.
    #[error("{kind} {id} not found while waiting for status {target}")]
    NotFound {
        kind: &'static str,
        id: String,
        target: String,
    },

    /// The resource reached a status that is neither pending nor the target.
    /// Signals a provider-side error state the operator must resolve.
    #[error("{kind} {id} entered unexpected status {status} while waiting for {target}")]
    UnexpectedStatus {
        kind: &'static str,
        id: String,
        target: String,
        status: String,
    },

    /// No terminal classification within the allotted time.
    #[error("timed out waiting for {kind} {id} to become {target} (last status: {})",
            last_status.as_deref().unwrap_or("none observed"))]
    Timeout {
        kind: &'static str,
        id: String,
        target: String,
        last_status: Option<String>,
    },

    /// The fetch itself failed. Transient I/O errors are not retried here;
    /// only the surrounding mutating call carries a retry budget.
    #[error("status fetch failed: {0}")]
    Fetch(E),
}

/// Describes one wait: what to poll for, which statuses mean "still in
/// flight", and how long and how often to poll.
///
/// A descriptor lives for a single [`wait_for_status`] call. The pending set
/// and the target must be disjoint.
#[derive(Debug, Clone)]
pub struct StatusPoll<'a> {
    kind: &'static str,
    id: String,
    target: &'a str,
    pending: &'a [&'a str],
    deletion: bool,
    timeout: Duration,
    delay: Duration,
    min_interval: Duration,
}

impl<'a> StatusPoll<'a> {
    /// Create a descriptor for `kind`/`id` with the given target status.
    ///
    /// Defaults: empty pending set, 10 minute timeout, no initial delay,
    /// 1 second minimum poll interval.
    pub fn new(kind: &'static str, id: impl Into<String>, target: &'a str) -> Self {
        Self {
            kind,
            id: id.into(),
            target,
            pending: &[],
            deletion: false,
            timeout: Duration::from_secs(600),
            delay: Duration::ZERO,
            min_interval: Duration::from_secs(1),
        }
    }

    /// Statuses to keep polling through.
    pub fn pending(mut self, pending: &'a [&'a str]) -> Self {
        self.pending = pending;
        self
    }

    /// Mark the target as the deletion state: a "not found" observation then
    /// counts as success rather than an error.
    pub fn deletion(mut self) -> Self {
        self.deletion = true;
        self
    }

    /// Overall wait budget.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Fixed delay before the first poll. Zero when the prior mutating call
    /// already round-tripped; a few seconds for fresher resources.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Minimum spacing between polls, bounding API call volume.
    pub fn min_interval(mut self, min_interval: Duration) -> Self {
        self.min_interval = min_interval;
        self
    }
}

/// Poll `fetch` until the resource described by `poll` reaches its target
/// status, returning the final observed status.
///
/// `fetch` reports the current status, or `None` when the resource does not
/// exist. Classification per poll:
///
/// - target status: success, returns immediately
/// - pending status: keep polling
/// - not found: success when the target is the deletion state, otherwise
///   [`WaitError::NotFound`]
/// - anything else: [`WaitError::UnexpectedStatus`], no further polls
///
/// The call blocks for at most the timeout plus one poll interval.
pub async fn wait_for_status<F, Fut, E>(
    poll: StatusPoll<'_>,
    mut fetch: F,
) -> Result<String, WaitError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<String>, E>>,
{
    debug_assert!(
        !poll.pending.contains(&poll.target),
        "pending set must not contain the target status"
    );

    debug!("Waiting for {} {} to become {}", poll.kind, poll.id, poll.target);

    let deadline = Instant::now() + poll.timeout;
    if !poll.delay.is_zero() {
        sleep(poll.delay).await;
    }

    let mut last_status: Option<String> = None;
    loop {
        let polled_at = Instant::now();

        match fetch().await.map_err(WaitError::Fetch)? {
            Some(status) if status == poll.target => {
                debug!("{} {} reached {}", poll.kind, poll.id, status);
                return Ok(status);
            }
            Some(status) if poll.pending.contains(&status.as_str()) => {
                debug!("{} {} still {}", poll.kind, poll.id, status);
                last_status = Some(status);
            }
            Some(status) => {
                return Err(WaitError::UnexpectedStatus {
                    kind: poll.kind,
                    id: poll.id,
                    target: poll.target.to_string(),
                    status,
                });
            }
            None if poll.deletion => {
                debug!("{} {} is gone", poll.kind, poll.id);
                return Ok(poll.target.to_string());
            }
            None => {
                return Err(WaitError::NotFound {
                    kind: poll.kind,
                    id: poll.id,
                    target: poll.target.to_string(),
                });
            }
        }

        if Instant::now() >= deadline {
            return Err(WaitError::Timeout {
                kind: poll.kind,
                id: poll.id,
                target: poll.target.to_string(),
                last_status,
            });
        }

        let elapsed = polled_at.elapsed();
        if elapsed < poll.min_interval {
            sleep(poll.min_interval - elapsed).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast(kind: &'static str, id: &str, target: &'static str) -> StatusPoll<'static> {
        StatusPoll::new(kind, id, target)
            .delay(Duration::from_millis(1))
            .min_interval(Duration::from_millis(1))
            .timeout(Duration::from_millis(500))
    }

    fn scripted(
        statuses: Vec<Option<&'static str>>,
    ) -> (Arc<AtomicU32>, impl FnMut() -> std::future::Ready<Result<Option<String>, String>>) {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let fetch = move || {
            let i = c.fetch_add(1, Ordering::SeqCst) as usize;
            let status = statuses[i.min(statuses.len() - 1)].map(str::to_string);
            std::future::ready(Ok(status))
        };
        (calls, fetch)
    }

    #[tokio::test]
    async fn polls_until_first_non_pending_status() {
        let (calls, fetch) = scripted(vec![
            Some("PENDING_CREATE"),
            Some("PENDING_CREATE"),
            Some("PENDING_UPDATE"),
            Some("ACTIVE"),
        ]);

        let poll = fast("loadbalancer", "lb-1", "ACTIVE")
            .pending(&["PENDING_CREATE", "PENDING_UPDATE"]);
        let status = wait_for_status(poll, fetch).await.unwrap();

        assert_eq!(status, "ACTIVE");
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn succeeds_immediately_on_target() {
        let (calls, fetch) = scripted(vec![Some("ACTIVE")]);

        let poll = fast("loadbalancer", "lb-1", "ACTIVE").pending(&["PENDING_CREATE"]);
        wait_for_status(poll, fetch).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unexpected_status_fails_without_further_polls() {
        let (calls, fetch) = scripted(vec![
            Some("PENDING_CREATE"),
            Some("ERROR"),
            Some("ACTIVE"),
        ]);

        let poll = fast("loadbalancer", "lb-1", "ACTIVE").pending(&["PENDING_CREATE"]);
        let err = wait_for_status(poll, fetch).await.unwrap_err();

        match err {
            WaitError::UnexpectedStatus { id, status, .. } => {
                assert_eq!(id, "lb-1");
                assert_eq!(status, "ERROR");
            }
            other => panic!("expected UnexpectedStatus, got {other:?}"),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn missing_resource_completes_deletion_wait() {
        let (calls, fetch) = scripted(vec![None]);

        let poll = fast("listener", "lsnr-1", "DELETED")
            .pending(&["ACTIVE", "PENDING_DELETE"])
            .deletion();
        let status = wait_for_status(poll, fetch).await.unwrap();

        assert_eq!(status, "DELETED");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn missing_resource_fails_non_deletion_wait() {
        let (_, fetch) = scripted(vec![None]);

        let poll = fast("listener", "lsnr-1", "ACTIVE").pending(&["PENDING_CREATE"]);
        let err = wait_for_status(poll, fetch).await.unwrap_err();

        assert!(matches!(err, WaitError::NotFound { .. }));
    }

    #[tokio::test]
    async fn times_out_with_last_observed_status() {
        let (_, fetch) = scripted(vec![Some("PENDING_CREATE")]);

        let poll = StatusPoll::new("loadbalancer", "lb-1", "ACTIVE")
            .pending(&["PENDING_CREATE"])
            .min_interval(Duration::from_millis(5))
            .timeout(Duration::from_millis(30));

        let started = std::time::Instant::now();
        let err = wait_for_status(poll, fetch).await.unwrap_err();
        let elapsed = started.elapsed();

        match err {
            WaitError::Timeout { last_status, .. } => {
                assert_eq!(last_status.as_deref(), Some("PENDING_CREATE"));
            }
            other => panic!("expected Timeout, got {other:?}"),
        }
        // Bounded by timeout plus one poll interval (generous margin for CI).
        assert!(elapsed < Duration::from_millis(300), "blocked for {elapsed:?}");
    }

    #[tokio::test]
    async fn fetch_failure_is_fatal() {
        let mut first = true;
        let fetch = move || {
            let out = if first {
                first = false;
                Err("connection reset".to_string())
            } else {
                Ok(Some("ACTIVE".to_string()))
            };
            std::future::ready(out)
        };

        let poll = fast("loadbalancer", "lb-1", "ACTIVE").pending(&["PENDING_CREATE"]);
        let err = wait_for_status(poll, fetch).await.unwrap_err();
        assert!(matches!(err, WaitError::Fetch(_)));
    }
}
