//! Pool lifecycle

use std::time::Duration;

use stackform_cloud::{RetryPolicy, retry_on_conflict, wait_for_status};
use tracing::debug;

use crate::error::{OpenStackError, Result, is_retryable};
use crate::lb::api::LbApi;
use crate::lb::status::{
    ACTIVE, LB_PENDING, LbParent, deletion_poll, presence, resolve_load_balancer_id,
    wait_for_active_via, wait_for_load_balancer,
};
use crate::lb::types::{Pool, PoolCreate, PoolUpdate};

/// Desired state of a pool. Exactly one of `loadbalancer_id` and
/// `listener_id` must be set; it decides which relation the pool is created
/// under.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub name: String,
    pub description: Option<String>,
    pub protocol: String,
    pub lb_algorithm: String,
    pub loadbalancer_id: Option<String>,
    pub listener_id: Option<String>,
    pub admin_state_up: bool,
}

impl PoolConfig {
    /// The parent to wait on before the pool exists.
    fn parent(&self) -> Result<LbParent<'_>> {
        match (self.loadbalancer_id.as_deref(), self.listener_id.as_deref()) {
            (Some(lb), None) => Ok(LbParent::LoadBalancer(lb)),
            (None, Some(listener)) => Ok(LbParent::Listener(listener)),
            (Some(_), Some(_)) => Err(OpenStackError::Validation(
                "pool must set only one of loadbalancer_id and listener_id".to_string(),
            )),
            (None, None) => Err(OpenStackError::Validation(
                "pool requires one of loadbalancer_id or listener_id".to_string(),
            )),
        }
    }
}

/// Create a pool and block until its load balancer settles.
pub async fn create(api: &dyn LbApi, config: &PoolConfig, timeout: Duration) -> Result<Pool> {
    let parent = config.parent()?;

    let opts = PoolCreate {
        name: config.name.clone(),
        description: config.description.clone(),
        protocol: config.protocol.clone(),
        lb_algorithm: config.lb_algorithm.clone(),
        loadbalancer_id: config.loadbalancer_id.clone(),
        listener_id: config.listener_id.clone(),
        admin_state_up: config.admin_state_up,
    };

    wait_for_active_via(api, parent, timeout).await?;

    debug!("Creating pool {}", config.name);
    let policy = RetryPolicy::with_timeout(timeout);
    let pool = retry_on_conflict(&policy, "pool create", is_retryable, move || {
        let opts = opts.clone();
        async move { api.create_pool(&opts).await }
    })
    .await?;

    // The created pool carries its own relations now.
    wait_for_active_via(api, LbParent::Pool(&pool.id), timeout).await?;

    Ok(pool)
}

pub async fn read(api: &dyn LbApi, id: &str) -> Result<Pool> {
    api.get_pool(id).await
}

/// Apply an update and block until the parent load balancer settles.
pub async fn update(
    api: &dyn LbApi,
    id: &str,
    opts: &PoolUpdate,
    timeout: Duration,
) -> Result<Pool> {
    wait_for_active_via(api, LbParent::Pool(id), timeout).await?;

    debug!("Updating pool {}", id);
    let policy = RetryPolicy::with_timeout(timeout);
    retry_on_conflict(&policy, "pool update", is_retryable, move || async move {
        api.update_pool(id, opts).await
    })
    .await?;

    wait_for_active_via(api, LbParent::Pool(id), timeout).await?;
    api.get_pool(id).await
}

/// Delete a pool: wait for its load balancer, delete, poll until gone, then
/// wait for the load balancer to settle.
pub async fn delete(api: &dyn LbApi, id: &str, timeout: Duration) -> Result<()> {
    let lb_id = resolve_load_balancer_id(api, LbParent::Pool(id)).await?;
    wait_for_load_balancer(api, &lb_id, ACTIVE, LB_PENDING, timeout).await?;

    debug!("Deleting pool {}", id);
    let policy = RetryPolicy::with_timeout(timeout);
    retry_on_conflict(&policy, "pool delete", is_retryable, move || async move {
        api.delete_pool(id).await
    })
    .await?;

    wait_for_status(deletion_poll("pool", id, timeout), move || async move {
        presence(api.get_pool(id).await)
    })
    .await?;

    wait_for_load_balancer(api, &lb_id, ACTIVE, LB_PENDING, timeout).await
}
