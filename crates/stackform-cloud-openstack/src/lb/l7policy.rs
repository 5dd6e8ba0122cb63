//! L7 policy lifecycle
//!
//! The policy action constrains which of the two redirect fields may be set.
//! [`check_action`] validates the combination before any network call; a bad
//! combination never reaches the control plane.

use std::time::Duration;

use stackform_cloud::{RetryPolicy, retry_on_conflict, wait_for_status};
use tracing::debug;

use crate::error::{OpenStackError, Result, is_retryable};
use crate::lb::api::LbApi;
use crate::lb::status::{LbParent, deletion_poll, presence, wait_for_active_via, wait_for_active_via_with};
use crate::lb::types::{L7Policy, L7PolicyAction, L7PolicyCreate, L7PolicyUpdate};

/// Desired state of an L7 policy
#[derive(Debug, Clone)]
pub struct L7PolicyConfig {
    pub name: String,
    pub description: Option<String>,
    pub action: L7PolicyAction,
    pub listener_id: String,
    pub position: Option<i32>,
    pub redirect_pool_id: Option<String>,
    pub redirect_url: Option<String>,
    pub admin_state_up: bool,
}

/// Validate the action against its companion fields.
///
/// REJECT takes no redirect target; each redirect action takes exactly its
/// own target and nothing else. Redirect URLs must parse.
pub fn check_action(
    action: L7PolicyAction,
    redirect_pool_id: Option<&str>,
    redirect_url: Option<&str>,
) -> Result<()> {
    match action {
        L7PolicyAction::Reject => {
            if redirect_pool_id.is_some() || redirect_url.is_some() {
                return Err(OpenStackError::Validation(format!(
                    "redirect_pool_id and redirect_url must be empty when action is {action}"
                )));
            }
        }
        L7PolicyAction::RedirectToPool => {
            if redirect_url.is_some() {
                return Err(OpenStackError::Validation(format!(
                    "redirect_url must be empty when action is {action}"
                )));
            }
            if redirect_pool_id.is_none() {
                return Err(OpenStackError::Validation(format!(
                    "redirect_pool_id is required when action is {action}"
                )));
            }
        }
        L7PolicyAction::RedirectToUrl => {
            if redirect_pool_id.is_some() {
                return Err(OpenStackError::Validation(format!(
                    "redirect_pool_id must be empty when action is {action}"
                )));
            }
            match redirect_url {
                None => {
                    return Err(OpenStackError::Validation(format!(
                        "redirect_url is required when action is {action}"
                    )));
                }
                Some(url) => {
                    reqwest::Url::parse(url).map_err(|e| {
                        OpenStackError::Validation(format!("redirect_url is not valid: {e}"))
                    })?;
                }
            }
        }
    }
    Ok(())
}

/// Create an L7 policy on its listener and block until the load balancer
/// settles. When the policy redirects to a pool, that pool's load balancer
/// must already be ACTIVE.
pub async fn create(
    api: &dyn LbApi,
    config: &L7PolicyConfig,
    timeout: Duration,
) -> Result<L7Policy> {
    check_action(
        config.action,
        config.redirect_pool_id.as_deref(),
        config.redirect_url.as_deref(),
    )?;

    let opts = L7PolicyCreate {
        name: config.name.clone(),
        description: config.description.clone(),
        action: config.action,
        listener_id: config.listener_id.clone(),
        position: config.position,
        redirect_pool_id: config.redirect_pool_id.clone(),
        redirect_url: config.redirect_url.clone(),
        admin_state_up: config.admin_state_up,
    };

    // The redirect pool must be settled before it can be referenced; any
    // pending status there is unexpected.
    if let Some(pool_id) = &config.redirect_pool_id {
        wait_for_active_via_with(api, LbParent::Pool(pool_id), &[], timeout).await?;
    }

    wait_for_active_via(api, LbParent::Listener(&config.listener_id), timeout).await?;

    debug!("Creating L7 policy {} on listener {}", config.name, config.listener_id);
    let policy = RetryPolicy::with_timeout(timeout);
    let created = retry_on_conflict(&policy, "l7policy create", is_retryable, move || {
        let opts = opts.clone();
        async move { api.create_l7policy(&opts).await }
    })
    .await?;

    wait_for_active_via(api, LbParent::Listener(&config.listener_id), timeout).await?;

    Ok(created)
}

pub async fn read(api: &dyn LbApi, id: &str) -> Result<L7Policy> {
    api.get_l7policy(id).await
}

/// Apply an update and block until the load balancer settles. The desired
/// action and redirect fields are validated together before any call.
pub async fn update(
    api: &dyn LbApi,
    id: &str,
    config: &L7PolicyConfig,
    timeout: Duration,
) -> Result<L7Policy> {
    check_action(
        config.action,
        config.redirect_pool_id.as_deref(),
        config.redirect_url.as_deref(),
    )?;

    let opts = L7PolicyUpdate {
        name: Some(config.name.clone()),
        description: config.description.clone(),
        action: Some(config.action),
        position: config.position,
        redirect_pool_id: config.redirect_pool_id.clone(),
        redirect_url: config.redirect_url.clone(),
        admin_state_up: Some(config.admin_state_up),
    };

    if let Some(pool_id) = &config.redirect_pool_id {
        wait_for_active_via_with(api, LbParent::Pool(pool_id), &[], timeout).await?;
    }

    wait_for_active_via(api, LbParent::Listener(&config.listener_id), timeout).await?;

    debug!("Updating L7 policy {}", id);
    let policy = RetryPolicy::with_timeout(timeout);
    retry_on_conflict(&policy, "l7policy update", is_retryable, move || {
        let opts = opts.clone();
        async move { api.update_l7policy(id, &opts).await }
    })
    .await?;

    wait_for_active_via(api, LbParent::Listener(&config.listener_id), timeout).await?;
    api.get_l7policy(id).await
}

/// Remove an L7 policy: wait for the listener's load balancer, delete, poll
/// until gone, wait again.
pub async fn delete(api: &dyn LbApi, id: &str, timeout: Duration) -> Result<()> {
    let listener_id = api.get_l7policy(id).await?.listener_id;

    wait_for_active_via(api, LbParent::Listener(&listener_id), timeout).await?;

    debug!("Deleting L7 policy {}", id);
    let policy = RetryPolicy::with_timeout(timeout);
    retry_on_conflict(&policy, "l7policy delete", is_retryable, move || async move {
        api.delete_l7policy(id).await
    })
    .await?;

    wait_for_status(deletion_poll("l7policy", id, timeout), move || async move {
        presence(api.get_l7policy(id).await)
    })
    .await?;

    wait_for_active_via(api, LbParent::Listener(&listener_id), timeout).await
}
