//! Pool member lifecycle
//!
//! Members are scoped to their pool in the API paths; their gating load
//! balancer is resolved through the pool.

use std::time::Duration;

use stackform_cloud::{RetryPolicy, retry_on_conflict, wait_for_status};
use tracing::debug;

use crate::error::{Result, is_retryable};
use crate::lb::api::LbApi;
use crate::lb::status::{LbParent, deletion_poll, presence, wait_for_active_via};
use crate::lb::types::{Member, MemberCreate, MemberUpdate};

/// Desired state of a pool member
#[derive(Debug, Clone)]
pub struct MemberConfig {
    pub name: String,
    pub address: String,
    pub protocol_port: u16,
    pub weight: Option<i32>,
    pub subnet_id: Option<String>,
    pub admin_state_up: bool,
}

/// Add a member to `pool_id` and block until the load balancer settles.
pub async fn create(
    api: &dyn LbApi,
    pool_id: &str,
    config: &MemberConfig,
    timeout: Duration,
) -> Result<Member> {
    let opts = MemberCreate {
        name: config.name.clone(),
        address: config.address.clone(),
        protocol_port: config.protocol_port,
        weight: config.weight,
        subnet_id: config.subnet_id.clone(),
        admin_state_up: config.admin_state_up,
    };

    wait_for_active_via(api, LbParent::Pool(pool_id), timeout).await?;

    debug!("Creating member {} in pool {}", config.name, pool_id);
    let policy = RetryPolicy::with_timeout(timeout);
    let member = retry_on_conflict(&policy, "member create", is_retryable, move || {
        let opts = opts.clone();
        async move { api.create_member(pool_id, &opts).await }
    })
    .await?;

    wait_for_active_via(api, LbParent::Pool(pool_id), timeout).await?;

    Ok(member)
}

pub async fn read(api: &dyn LbApi, pool_id: &str, id: &str) -> Result<Member> {
    api.get_member(pool_id, id).await
}

/// Apply an update and block until the load balancer settles.
pub async fn update(
    api: &dyn LbApi,
    pool_id: &str,
    id: &str,
    opts: &MemberUpdate,
    timeout: Duration,
) -> Result<Member> {
    wait_for_active_via(api, LbParent::Pool(pool_id), timeout).await?;

    debug!("Updating member {} in pool {}", id, pool_id);
    let policy = RetryPolicy::with_timeout(timeout);
    retry_on_conflict(&policy, "member update", is_retryable, move || async move {
        api.update_member(pool_id, id, opts).await
    })
    .await?;

    wait_for_active_via(api, LbParent::Pool(pool_id), timeout).await?;
    api.get_member(pool_id, id).await
}

/// Remove a member: wait for the load balancer, delete, poll until gone,
/// then wait for the load balancer to settle.
pub async fn delete(api: &dyn LbApi, pool_id: &str, id: &str, timeout: Duration) -> Result<()> {
    wait_for_active_via(api, LbParent::Pool(pool_id), timeout).await?;

    debug!("Deleting member {} from pool {}", id, pool_id);
    let policy = RetryPolicy::with_timeout(timeout);
    retry_on_conflict(&policy, "member delete", is_retryable, move || async move {
        api.delete_member(pool_id, id).await
    })
    .await?;

    wait_for_status(deletion_poll("member", id, timeout), move || async move {
        presence(api.get_member(pool_id, id).await)
    })
    .await?;

    wait_for_active_via(api, LbParent::Pool(pool_id), timeout).await
}
