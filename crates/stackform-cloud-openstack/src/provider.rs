//! OpenStack provider implementation
//!
//! Exposes load balancers through the unified plan/apply interface. Each
//! apply step drives the full lifecycle, so a successful apply means the
//! resources have actually settled, not just that the calls were accepted.

use async_trait::async_trait;
use stackform_cloud::{
    Action, ActionType, ApplyResult, AuthStatus, CloudError, CloudProvider, OperationTimeouts,
    Plan, ProviderState, ResourceConfig, ResourceSet, ResourceState, ResourceStatus,
};

use crate::client::ServiceClient;
use crate::config::OpenStackConfig;
use crate::error::OpenStackError;
use crate::lb::api::{HttpLbApi, LbApi};
use crate::lb::loadbalancer::{self, LoadBalancerConfig};
use crate::lb::types::{LoadBalancer, LoadBalancerUpdate};

/// Map a `provisioning_status` onto the coarse status classes.
fn coarse_status(provisioning_status: &str) -> ResourceStatus {
    match provisioning_status {
        "ACTIVE" => ResourceStatus::Active,
        "ERROR" => ResourceStatus::Error,
        "DELETED" => ResourceStatus::Deleted,
        s if s.starts_with("PENDING_") => ResourceStatus::Pending,
        _ => ResourceStatus::Unknown,
    }
}

/// OpenStack provider over the load-balancing service
pub struct OpenStackProvider {
    api: Box<dyn LbApi>,
    region: String,
    timeouts: OperationTimeouts,
}

impl OpenStackProvider {
    pub fn new(config: &OpenStackConfig) -> Self {
        let client = ServiceClient::new(&config.loadbalancer_endpoint, &config.token);
        Self {
            api: Box::new(HttpLbApi::new(client, config.lb_flavor)),
            region: config.region.clone(),
            timeouts: OperationTimeouts::default(),
        }
    }

    /// Substitute the API implementation, used by tests.
    pub fn with_api(api: Box<dyn LbApi>, region: impl Into<String>) -> Self {
        Self {
            api,
            region: region.into(),
            timeouts: OperationTimeouts::default(),
        }
    }

    pub fn with_timeouts(mut self, timeouts: OperationTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    async fn find_by_name(&self, name: &str) -> stackform_cloud::Result<Option<LoadBalancer>> {
        let lbs = self.api.list_load_balancers().await?;
        Ok(lbs.into_iter().find(|lb| lb.name == name))
    }

    fn lb_config(&self, resource: &ResourceConfig) -> stackform_cloud::Result<LoadBalancerConfig> {
        let vip_subnet_id = resource.get_config::<String>("vip_subnet_id").ok_or_else(|| {
            CloudError::InvalidConfig(format!(
                "loadbalancer {} is missing vip_subnet_id",
                resource.name
            ))
        })?;
        Ok(LoadBalancerConfig {
            name: resource.name.clone(),
            description: resource.get_config("description"),
            vip_subnet_id,
            vip_address: resource.get_config("vip_address"),
            admin_state_up: resource.get_config("admin_state_up").unwrap_or(true),
        })
    }

    /// Apply a plan against its desired configuration. Failures are recorded
    /// per action; later actions still run.
    pub async fn apply_with(
        &self,
        plan: &Plan,
        desired: &ResourceSet,
    ) -> stackform_cloud::Result<ApplyResult> {
        let mut result = ApplyResult::new();
        let start = std::time::Instant::now();

        for action in &plan.actions {
            if action.action_type == ActionType::NoOp {
                continue;
            }
            tracing::info!("{}", action.description);
            match self.apply_action(action, desired).await {
                Ok(message) => result.add_success(action.key(), message),
                Err(e) => result.add_failure(action.key(), e.to_string()),
            }
        }

        result.duration_ms = start.elapsed().as_millis() as u64;
        Ok(result)
    }

    /// The desired configuration for an action: the caller-supplied set
    /// takes precedence, then the `config` detail the plan attached.
    fn desired_config(
        &self,
        action: &Action,
        desired: &ResourceSet,
    ) -> stackform_cloud::Result<ResourceConfig> {
        desired
            .get(&action.resource_type, &action.resource_id)
            .cloned()
            .or_else(|| {
                action.details.get("config").map(|config| {
                    ResourceConfig::new(&action.resource_type, &action.resource_id, config.clone())
                })
            })
            .ok_or_else(|| {
                CloudError::InvalidConfig(format!(
                    "no desired configuration for {}",
                    action.resource_id
                ))
            })
    }

    async fn apply_action(&self, action: &Action, desired: &ResourceSet) -> stackform_cloud::Result<String> {
        match action.action_type {
            ActionType::Create => {
                let resource = self.desired_config(action, desired)?;
                let config = self.lb_config(&resource)?;
                let lb =
                    loadbalancer::create(self.api.as_ref(), &config, self.timeouts.create).await?;
                Ok(format!("created load balancer {} (id {})", lb.name, lb.id))
            }
            ActionType::Update => {
                let resource = self.desired_config(action, desired)?;
                let existing = self.find_by_name(&resource.name).await?.ok_or_else(|| {
                    CloudError::ResourceNotFound(resource.name.clone())
                })?;
                let opts = LoadBalancerUpdate {
                    name: None,
                    description: resource.get_config("description"),
                    admin_state_up: resource.get_config("admin_state_up"),
                };
                let lb = loadbalancer::update(
                    self.api.as_ref(),
                    &existing.id,
                    &opts,
                    self.timeouts.update,
                )
                .await?;
                Ok(format!("updated load balancer {} (id {})", lb.name, lb.id))
            }
            ActionType::Delete => {
                let existing = self
                    .find_by_name(&action.resource_id)
                    .await?
                    .ok_or_else(|| CloudError::ResourceNotFound(action.resource_id.clone()))?;
                loadbalancer::delete(self.api.as_ref(), &existing.id, self.timeouts.delete)
                    .await?;
                Ok(format!("deleted load balancer {}", action.resource_id))
            }
            ActionType::NoOp => Ok(String::new()),
        }
    }
}

#[async_trait]
impl CloudProvider for OpenStackProvider {
    fn name(&self) -> &str {
        "openstack"
    }

    fn display_name(&self) -> &str {
        "OpenStack"
    }

    async fn check_auth(&self) -> stackform_cloud::Result<AuthStatus> {
        match self.api.list_load_balancers().await {
            Ok(_) => Ok(AuthStatus::ok(format!("region {}", self.region))),
            Err(OpenStackError::AuthenticationFailed(msg)) => Ok(AuthStatus::failed(msg)),
            Err(e) => Ok(AuthStatus::failed(e.to_string())),
        }
    }

    async fn get_state(&self) -> stackform_cloud::Result<ProviderState> {
        let mut state = ProviderState::new();

        for lb in self.api.list_load_balancers().await? {
            let resource = ResourceState::new(&lb.id, "loadbalancer")
                .with_status(coarse_status(&lb.provisioning_status))
                .with_attribute(
                    "provisioning_status",
                    serde_json::json!(lb.provisioning_status),
                )
                .with_attribute("operating_status", serde_json::json!(lb.operating_status))
                .with_attribute("vip_address", serde_json::json!(lb.vip_address));

            state.add(lb.name.clone(), resource);
        }

        Ok(state)
    }

    async fn plan(&self, desired: &ResourceSet) -> stackform_cloud::Result<Plan> {
        let current = self.get_state().await?;
        let mut actions = Vec::new();

        for resource in desired.iter() {
            if resource.resource_type != "loadbalancer" {
                continue;
            }

            match current.get(&resource.name) {
                None => {
                    // Carry the config so the plan can be applied on its own.
                    actions.push(
                        Action::new(
                            ActionType::Create,
                            "loadbalancer",
                            &resource.name,
                            format!("create load balancer {}", resource.name),
                        )
                        .with_detail("config", resource.config.clone()),
                    );
                }
                Some(_existing) => {
                    actions.push(Action::new(
                        ActionType::NoOp,
                        "loadbalancer",
                        &resource.name,
                        format!("load balancer {} already exists", resource.name),
                    ));
                }
            }
        }

        // Unmanaged resources are reported but never auto-deleted; deletion
        // is always an explicit request.
        for (name, _resource) in current.iter() {
            if desired.get("loadbalancer", name).is_none() {
                tracing::debug!(
                    "Load balancer {} exists but is not in the desired set (will not auto-delete)",
                    name
                );
            }
        }

        Ok(Plan::new(actions))
    }

    async fn apply(&self, plan: &Plan) -> stackform_cloud::Result<ApplyResult> {
        // Plans produced by [`CloudProvider::plan`] carry their configs as
        // action details; apply_with lets a caller override them.
        self.apply_with(plan, &ResourceSet::new()).await
    }

    async fn destroy(&self, resource_id: &str) -> stackform_cloud::Result<()> {
        let lb = self
            .find_by_name(resource_id)
            .await?
            .ok_or_else(|| CloudError::ResourceNotFound(resource_id.to_string()))?;

        loadbalancer::delete(self.api.as_ref(), &lb.id, self.timeouts.delete).await?;
        Ok(())
    }

    async fn destroy_all(&self) -> stackform_cloud::Result<ApplyResult> {
        let mut result = ApplyResult::new();
        let start = std::time::Instant::now();

        for lb in self.api.list_load_balancers().await? {
            let key = format!("delete:loadbalancer:{}", lb.name);
            match loadbalancer::delete(self.api.as_ref(), &lb.id, self.timeouts.delete).await {
                Ok(()) => {
                    result.add_success(key, format!("deleted load balancer {}", lb.name));
                }
                Err(e) => {
                    result.add_failure(key, e.to_string());
                }
            }
        }

        result.duration_ms = start.elapsed().as_millis() as u64;
        Ok(result)
    }
}
