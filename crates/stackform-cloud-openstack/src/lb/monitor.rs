//! Health monitor lifecycle

use std::time::Duration;

use stackform_cloud::{RetryPolicy, retry_on_conflict, wait_for_status};
use tracing::debug;

use crate::error::{OpenStackError, Result, is_retryable};
use crate::lb::api::LbApi;
use crate::lb::status::{LbParent, deletion_poll, presence, wait_for_active_via};
use crate::lb::types::{Monitor, MonitorCreate, MonitorUpdate};

/// Desired state of a health monitor
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub name: String,
    pub pool_id: String,
    pub monitor_type: String,
    pub delay: u32,
    pub timeout: u32,
    pub max_retries: u32,
    pub url_path: Option<String>,
    pub expected_codes: Option<String>,
    pub admin_state_up: bool,
}

/// Create a monitor on its pool and block until the load balancer settles.
pub async fn create(
    api: &dyn LbApi,
    config: &MonitorConfig,
    timeout: Duration,
) -> Result<Monitor> {
    let opts = MonitorCreate {
        name: config.name.clone(),
        pool_id: config.pool_id.clone(),
        monitor_type: config.monitor_type.clone(),
        delay: config.delay,
        timeout: config.timeout,
        max_retries: config.max_retries,
        url_path: config.url_path.clone(),
        expected_codes: config.expected_codes.clone(),
        admin_state_up: config.admin_state_up,
    };

    wait_for_active_via(api, LbParent::Pool(&config.pool_id), timeout).await?;

    debug!("Creating monitor {} on pool {}", config.name, config.pool_id);
    let policy = RetryPolicy::with_timeout(timeout);
    let monitor = retry_on_conflict(&policy, "monitor create", is_retryable, move || {
        let opts = opts.clone();
        async move { api.create_monitor(&opts).await }
    })
    .await?;

    wait_for_active_via(api, LbParent::Pool(&config.pool_id), timeout).await?;

    Ok(monitor)
}

pub async fn read(api: &dyn LbApi, id: &str) -> Result<Monitor> {
    api.get_monitor(id).await
}

/// Apply an update and block until the load balancer settles. The gating
/// pool comes from the monitor's own pool references.
pub async fn update(
    api: &dyn LbApi,
    id: &str,
    opts: &MonitorUpdate,
    timeout: Duration,
) -> Result<Monitor> {
    let pool_id = monitor_pool_id(api, id).await?;

    wait_for_active_via(api, LbParent::Pool(&pool_id), timeout).await?;

    debug!("Updating monitor {}", id);
    let policy = RetryPolicy::with_timeout(timeout);
    retry_on_conflict(&policy, "monitor update", is_retryable, move || async move {
        api.update_monitor(id, opts).await
    })
    .await?;

    wait_for_active_via(api, LbParent::Pool(&pool_id), timeout).await?;
    api.get_monitor(id).await
}

/// Remove a monitor: wait, delete, poll until gone, wait again.
pub async fn delete(api: &dyn LbApi, id: &str, timeout: Duration) -> Result<()> {
    let pool_id = monitor_pool_id(api, id).await?;

    wait_for_active_via(api, LbParent::Pool(&pool_id), timeout).await?;

    debug!("Deleting monitor {}", id);
    let policy = RetryPolicy::with_timeout(timeout);
    retry_on_conflict(&policy, "monitor delete", is_retryable, move || async move {
        api.delete_monitor(id).await
    })
    .await?;

    wait_for_status(deletion_poll("monitor", id, timeout), move || async move {
        presence(api.get_monitor(id).await)
    })
    .await?;

    wait_for_active_via(api, LbParent::Pool(&pool_id), timeout).await
}

async fn monitor_pool_id(api: &dyn LbApi, id: &str) -> Result<String> {
    let monitor = api.get_monitor(id).await?;
    monitor
        .pools
        .first()
        .map(|r| r.id.clone())
        .ok_or_else(|| {
            OpenStackError::ParentUnresolved(format!("monitor {id} has no pool reference"))
        })
}
