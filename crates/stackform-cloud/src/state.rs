//! Observed state of remote cloud resources
//!
//! Snapshots returned by [`crate::CloudProvider::get_state`]. Providers map
//! their native status strings onto the coarse [`ResourceStatus`] classes the
//! reconciler cares about and keep the raw value in the attributes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Observed state for a single provider
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderState {
    /// Resources indexed by their declared name
    pub resources: HashMap<String, ResourceState>,
}

impl ProviderState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: impl Into<String>, state: ResourceState) {
        self.resources.insert(name.into(), state);
    }

    pub fn get(&self, name: &str) -> Option<&ResourceState> {
        self.resources.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ResourceState)> {
        self.resources.iter()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

/// Observed state of a single resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceState {
    /// Provider-assigned resource ID
    pub id: String,

    /// Resource type
    pub resource_type: String,

    /// Coarse status class
    pub status: ResourceStatus,

    /// Provider-specific attributes (raw status, addresses, etc.)
    pub attributes: HashMap<String, serde_json::Value>,

    /// When this snapshot was taken
    pub observed_at: DateTime<Utc>,
}

impl ResourceState {
    pub fn new(id: impl Into<String>, resource_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            resource_type: resource_type.into(),
            status: ResourceStatus::Unknown,
            attributes: HashMap::new(),
            observed_at: Utc::now(),
        }
    }

    pub fn with_status(mut self, status: ResourceStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    pub fn get_attribute<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.attributes
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}

/// Coarse status classes of a remote resource
///
/// Only three classes matter to reconciliation: pending (an in-flight
/// mutation), the settled target state, and unrecoverable error. `Deleted`
/// and `Unknown` round out what reads can observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceStatus {
    /// A mutation is in flight and has not settled
    Pending,
    /// Resource is settled and serving
    Active,
    /// Resource is in a provider-side error state
    Error,
    /// Resource has been deleted
    Deleted,
    /// Status could not be determined
    Unknown,
}

impl std::fmt::Display for ResourceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceStatus::Pending => write!(f, "pending"),
            ResourceStatus::Active => write!(f, "active"),
            ResourceStatus::Error => write!(f, "error"),
            ResourceStatus::Deleted => write!(f, "deleted"),
            ResourceStatus::Unknown => write!(f, "unknown"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_state_builder() {
        let state = ResourceState::new("8a5e", "loadbalancer")
            .with_status(ResourceStatus::Active)
            .with_attribute("provisioning_status", serde_json::json!("ACTIVE"))
            .with_attribute("vip_address", serde_json::json!("10.0.0.4"));

        assert_eq!(state.status, ResourceStatus::Active);
        assert_eq!(
            state.get_attribute::<String>("vip_address").as_deref(),
            Some("10.0.0.4")
        );
        assert!(state.get_attribute::<String>("missing").is_none());
    }

    #[test]
    fn provider_state_indexes_by_name() {
        let mut state = ProviderState::new();
        state.add("web", ResourceState::new("8a5e", "loadbalancer"));

        assert_eq!(state.len(), 1);
        assert!(state.get("web").is_some());
        assert!(state.get("api").is_none());
    }
}
