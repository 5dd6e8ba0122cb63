//! Status waits for load balancers and their sub-resources
//!
//! The control plane processes one mutation at a time per load balancer, so
//! every sub-resource operation brackets its mutating call with waits on the
//! parent's `provisioning_status`. Sub-resources expose no status of their
//! own; their deletion is observed by polling them until they 404.

use std::time::Duration;

use stackform_cloud::{StatusPoll, wait_for_status};

use crate::error::{OpenStackError, Result};
use crate::lb::api::LbApi;

/// Target status of a settled, serving resource
pub const ACTIVE: &str = "ACTIVE";

/// Target status of a removed resource
pub const DELETED: &str = "DELETED";

/// Statuses a load balancer passes through while a mutation is in flight
pub const LB_PENDING: &[&str] = &["PENDING_CREATE", "PENDING_UPDATE"];

/// Statuses a load balancer may hold before its deletion settles. ERROR is
/// deletable, so it counts as pending here.
pub const LB_PENDING_DELETE: &[&str] = &["ERROR", "PENDING_UPDATE", "PENDING_DELETE", "ACTIVE"];

/// Where a sub-resource hangs off the load balancer it is gated by
#[derive(Debug, Clone, Copy)]
pub enum LbParent<'a> {
    /// The resource is itself a load balancer
    LoadBalancer(&'a str),
    /// The resource references a listener (L7 policies)
    Listener(&'a str),
    /// The resource references a pool (members, monitors)
    Pool(&'a str),
}

/// Resolve the load balancer that gates mutations to a resource.
///
/// Listeners carry a direct load-balancer reference. Pools may carry one
/// too; when they don't, the chain goes through their first listener. A
/// resource with neither relation populated cannot be waited on.
pub async fn resolve_load_balancer_id(api: &dyn LbApi, parent: LbParent<'_>) -> Result<String> {
    match parent {
        LbParent::LoadBalancer(id) => Ok(id.to_string()),
        LbParent::Listener(id) => {
            let listener = api.get_listener(id).await?;
            listener
                .loadbalancers
                .first()
                .map(|r| r.id.clone())
                .ok_or_else(|| {
                    OpenStackError::ParentUnresolved(format!(
                        "listener {id} has no load balancer reference"
                    ))
                })
        }
        LbParent::Pool(id) => {
            let pool = api.get_pool(id).await?;
            if let Some(lb) = pool.loadbalancers.first() {
                return Ok(lb.id.clone());
            }
            if let Some(listener_ref) = pool.listeners.first() {
                let listener = api.get_listener(&listener_ref.id).await?;
                if let Some(lb) = listener.loadbalancers.first() {
                    return Ok(lb.id.clone());
                }
            }
            Err(OpenStackError::ParentUnresolved(format!(
                "pool {id} has neither a load balancer nor a listener reference"
            )))
        }
    }
}

/// Block until load balancer `id` reaches `target`.
///
/// No initial delay: the prior mutating call already round-tripped, so the
/// status is worth reading immediately.
pub async fn wait_for_load_balancer(
    api: &dyn LbApi,
    id: &str,
    target: &str,
    pending: &[&str],
    timeout: Duration,
) -> Result<()> {
    let mut poll = StatusPoll::new("loadbalancer", id, target)
        .pending(pending)
        .timeout(timeout);
    if target == DELETED {
        poll = poll.deletion();
    }

    wait_for_status(poll, move || async move {
        match api.get_load_balancer(id).await {
            Ok(lb) => Ok(Some(lb.provisioning_status)),
            Err(OpenStackError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    })
    .await?;
    Ok(())
}

/// Block until the load balancer gating `parent` is ACTIVE, treating the
/// usual in-flight statuses as pending.
pub async fn wait_for_active_via(
    api: &dyn LbApi,
    parent: LbParent<'_>,
    timeout: Duration,
) -> Result<()> {
    wait_for_active_via_with(api, parent, LB_PENDING, timeout).await
}

/// Like [`wait_for_active_via`] but with a caller-chosen pending set. An
/// empty set demands the load balancer already be ACTIVE: any other status
/// fails immediately.
pub async fn wait_for_active_via_with(
    api: &dyn LbApi,
    parent: LbParent<'_>,
    pending: &[&str],
    timeout: Duration,
) -> Result<()> {
    let lb_id = resolve_load_balancer_id(api, parent).await?;
    wait_for_load_balancer(api, &lb_id, ACTIVE, pending, timeout).await
}

/// Fold an existence read into a status observation: sub-resources report
/// ACTIVE while present and vanish with a 404 once deleted.
pub fn presence<T>(result: Result<T>) -> Result<Option<String>> {
    match result {
        Ok(_) => Ok(Some(ACTIVE.to_string())),
        Err(OpenStackError::NotFound { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Poll descriptor for a sub-resource deletion wait: 1 second initial delay
/// and spacing, present (ACTIVE) counts as pending.
pub fn deletion_poll(kind: &'static str, id: &str, timeout: Duration) -> StatusPoll<'static> {
    StatusPoll::new(kind, id, DELETED)
        .pending(&["ACTIVE", "PENDING_DELETE"])
        .deletion()
        .delay(Duration::from_secs(1))
        .min_interval(Duration::from_secs(1))
        .timeout(timeout)
}
