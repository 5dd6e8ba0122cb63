//! Listener lifecycle
//!
//! Every mutation brackets the call with waits on the parent load balancer:
//! the control plane rejects a change while another is still settling, and
//! the conflict retry only absorbs the races the waits cannot see.

use std::time::Duration;

use stackform_cloud::{RetryPolicy, retry_on_conflict, wait_for_status};
use tracing::debug;

use crate::error::{Result, is_retryable};
use crate::lb::api::LbApi;
use crate::lb::status::{
    ACTIVE, LB_PENDING, LbParent, deletion_poll, presence, resolve_load_balancer_id,
    wait_for_active_via, wait_for_load_balancer,
};
use crate::lb::types::{Listener, ListenerCreate, ListenerUpdate};

/// Desired state of a listener
#[derive(Debug, Clone)]
pub struct ListenerConfig {
    pub name: String,
    pub description: Option<String>,
    pub protocol: String,
    pub protocol_port: u16,
    pub loadbalancer_id: String,
    pub connection_limit: Option<i64>,
    pub default_pool_id: Option<String>,
    pub admin_state_up: bool,
}

/// Create a listener on its load balancer and block until the load balancer
/// settles again.
pub async fn create(
    api: &dyn LbApi,
    config: &ListenerConfig,
    timeout: Duration,
) -> Result<Listener> {
    let opts = ListenerCreate {
        name: config.name.clone(),
        description: config.description.clone(),
        protocol: config.protocol.clone(),
        protocol_port: config.protocol_port,
        loadbalancer_id: config.loadbalancer_id.clone(),
        connection_limit: config.connection_limit,
        default_pool_id: config.default_pool_id.clone(),
        admin_state_up: config.admin_state_up,
    };

    wait_for_load_balancer(api, &config.loadbalancer_id, ACTIVE, LB_PENDING, timeout).await?;

    debug!("Creating listener {} on {}", config.name, config.loadbalancer_id);
    let policy = RetryPolicy::with_timeout(timeout);
    let listener = retry_on_conflict(&policy, "listener create", is_retryable, move || {
        let opts = opts.clone();
        async move { api.create_listener(&opts).await }
    })
    .await?;

    wait_for_load_balancer(api, &config.loadbalancer_id, ACTIVE, LB_PENDING, timeout).await?;

    Ok(listener)
}

pub async fn read(api: &dyn LbApi, id: &str) -> Result<Listener> {
    api.get_listener(id).await
}

/// Apply an update and block until the parent load balancer settles.
pub async fn update(
    api: &dyn LbApi,
    id: &str,
    opts: &ListenerUpdate,
    timeout: Duration,
) -> Result<Listener> {
    wait_for_active_via(api, LbParent::Listener(id), timeout).await?;

    debug!("Updating listener {}", id);
    let policy = RetryPolicy::with_timeout(timeout);
    retry_on_conflict(&policy, "listener update", is_retryable, move || async move {
        api.update_listener(id, opts).await
    })
    .await?;

    wait_for_active_via(api, LbParent::Listener(id), timeout).await?;
    api.get_listener(id).await
}

/// Delete a listener: wait for the parent, delete, poll the listener until
/// it is gone, then wait for the parent to settle.
pub async fn delete(api: &dyn LbApi, id: &str, timeout: Duration) -> Result<()> {
    let lb_id = resolve_load_balancer_id(api, LbParent::Listener(id)).await?;
    wait_for_load_balancer(api, &lb_id, ACTIVE, LB_PENDING, timeout).await?;

    debug!("Deleting listener {}", id);
    let policy = RetryPolicy::with_timeout(timeout);
    retry_on_conflict(&policy, "listener delete", is_retryable, move || async move {
        api.delete_listener(id).await
    })
    .await?;

    wait_for_status(deletion_poll("listener", id, timeout), move || async move {
        presence(api.get_listener(id).await)
    })
    .await?;

    wait_for_load_balancer(api, &lb_id, ACTIVE, LB_PENDING, timeout).await
}
