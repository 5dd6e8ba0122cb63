//! Load balancer lifecycle

use std::time::Duration;

use stackform_cloud::{RetryPolicy, retry_on_conflict};
use tracing::debug;

use crate::error::{Result, is_retryable};
use crate::lb::api::LbApi;
use crate::lb::status::{ACTIVE, DELETED, LB_PENDING, LB_PENDING_DELETE, wait_for_load_balancer};
use crate::lb::types::{LoadBalancer, LoadBalancerCreate, LoadBalancerUpdate};

/// Desired state of a load balancer
#[derive(Debug, Clone)]
pub struct LoadBalancerConfig {
    pub name: String,
    pub description: Option<String>,
    pub vip_subnet_id: String,
    pub vip_address: Option<String>,
    pub admin_state_up: bool,
}

/// Create a load balancer and block until it provisions.
pub async fn create(
    api: &dyn LbApi,
    config: &LoadBalancerConfig,
    timeout: Duration,
) -> Result<LoadBalancer> {
    let opts = LoadBalancerCreate {
        name: config.name.clone(),
        description: config.description.clone(),
        vip_subnet_id: config.vip_subnet_id.clone(),
        vip_address: config.vip_address.clone(),
        admin_state_up: config.admin_state_up,
    };

    debug!("Creating load balancer {}", config.name);
    let lb = api.create_load_balancer(&opts).await?;

    wait_for_load_balancer(api, &lb.id, ACTIVE, LB_PENDING, timeout).await?;

    // Re-read for the settled attributes (VIP address in particular).
    api.get_load_balancer(&lb.id).await
}

pub async fn read(api: &dyn LbApi, id: &str) -> Result<LoadBalancer> {
    api.get_load_balancer(id).await
}

/// Apply an update and block until the load balancer settles again.
pub async fn update(
    api: &dyn LbApi,
    id: &str,
    opts: &LoadBalancerUpdate,
    timeout: Duration,
) -> Result<LoadBalancer> {
    wait_for_load_balancer(api, id, ACTIVE, LB_PENDING, timeout).await?;

    debug!("Updating load balancer {}", id);
    let policy = RetryPolicy::with_timeout(timeout);
    retry_on_conflict(&policy, "loadbalancer update", is_retryable, move || async move {
        api.update_load_balancer(id, opts).await
    })
    .await?;

    wait_for_load_balancer(api, id, ACTIVE, LB_PENDING, timeout).await?;
    api.get_load_balancer(id).await
}

/// Delete a load balancer and block until it is gone. ERROR-state load
/// balancers are deletable, so the wait treats ERROR as pending.
pub async fn delete(api: &dyn LbApi, id: &str, timeout: Duration) -> Result<()> {
    debug!("Deleting load balancer {}", id);
    let policy = RetryPolicy::with_timeout(timeout);
    retry_on_conflict(&policy, "loadbalancer delete", is_retryable, move || async move {
        api.delete_load_balancer(id).await
    })
    .await?;

    wait_for_load_balancer(api, id, DELETED, LB_PENDING_DELETE, timeout).await
}
