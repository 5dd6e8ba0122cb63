//! Action types for cloud resource reconciliation

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A planned change for one cloud resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    /// Type of action to perform
    pub action_type: ActionType,

    /// Resource type (e.g., "loadbalancer", "recordset", "volume")
    pub resource_type: String,

    /// Resource identifier
    pub resource_id: String,

    /// Human-readable description of the change
    pub description: String,

    /// Extra context carried from plan to apply (desired configuration,
    /// provider hints), so a plan can be applied on its own.
    #[serde(default)]
    pub details: HashMap<String, serde_json::Value>,
}

impl Action {
    pub fn new(
        action_type: ActionType,
        resource_type: impl Into<String>,
        resource_id: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            action_type,
            resource_type: resource_type.into(),
            resource_id: resource_id.into(),
            description: description.into(),
            details: HashMap::new(),
        }
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.details.insert(key.into(), value);
        self
    }

    /// Get a detail value as a specific type
    pub fn detail<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.details
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Key identifying the action in results, e.g. "create:loadbalancer:web"
    pub fn key(&self) -> String {
        format!("{}:{}:{}", self.action_type, self.resource_type, self.resource_id)
    }
}

/// Type of action to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// Create a new resource
    Create,
    /// Update an existing resource
    Update,
    /// Delete a resource
    Delete,
    /// No changes needed
    NoOp,
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionType::Create => write!(f, "create"),
            ActionType::Update => write!(f, "update"),
            ActionType::Delete => write!(f, "delete"),
            ActionType::NoOp => write!(f, "no-op"),
        }
    }
}

/// Plan containing all actions to be applied
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    /// Actions in application order
    pub actions: Vec<Action>,
}

impl Plan {
    pub fn new(actions: Vec<Action>) -> Self {
        Self { actions }
    }

    pub fn empty() -> Self {
        Self { actions: Vec::new() }
    }

    pub fn has_changes(&self) -> bool {
        self.actions.iter().any(|a| a.action_type != ActionType::NoOp)
    }

    /// Summary of the plan
    pub fn summary(&self) -> PlanSummary {
        let count =
            |t| self.actions.iter().filter(|a| a.action_type == t).count();
        PlanSummary {
            create: count(ActionType::Create),
            update: count(ActionType::Update),
            delete: count(ActionType::Delete),
            no_change: count(ActionType::NoOp),
        }
    }
}

/// Summary of planned actions
#[derive(Debug, Clone)]
pub struct PlanSummary {
    pub create: usize,
    pub update: usize,
    pub delete: usize,
    pub no_change: usize,
}

impl std::fmt::Display for PlanSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} to create, {} to update, {} to delete, {} unchanged",
            self.create, self.update, self.delete, self.no_change
        )
    }
}

/// Result of applying a plan
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplyResult {
    /// Outcome per attempted action, in application order
    pub outcomes: Vec<ActionOutcome>,

    /// Total execution time in milliseconds
    pub duration_ms: u64,
}

impl ApplyResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(|o| o.error.is_none())
    }

    pub fn add_success(&mut self, action_key: String, message: String) {
        self.outcomes.push(ActionOutcome {
            action_key,
            message,
            error: None,
        });
    }

    pub fn add_failure(&mut self, action_key: String, error: String) {
        self.outcomes.push(ActionOutcome {
            action_key,
            message: String::new(),
            error: Some(error),
        });
    }

    pub fn failures(&self) -> impl Iterator<Item = &ActionOutcome> {
        self.outcomes.iter().filter(|o| o.error.is_some())
    }
}

/// Outcome of a single action
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionOutcome {
    /// Key of the action, see [`Action::key`]
    pub action_key: String,

    /// Success message
    pub message: String,

    /// Error message if the action failed
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_summary_counts_by_type() {
        let plan = Plan::new(vec![
            Action::new(ActionType::Create, "loadbalancer", "web", "create web"),
            Action::new(ActionType::Delete, "loadbalancer", "old", "delete old"),
            Action::new(ActionType::NoOp, "loadbalancer", "api", "unchanged"),
        ]);

        let summary = plan.summary();
        assert_eq!(summary.create, 1);
        assert_eq!(summary.delete, 1);
        assert_eq!(summary.no_change, 1);
        assert!(plan.has_changes());
    }

    #[test]
    fn noop_only_plan_has_no_changes() {
        let plan = Plan::new(vec![Action::new(
            ActionType::NoOp,
            "volume",
            "data",
            "unchanged",
        )]);
        assert!(!plan.has_changes());
    }

    #[test]
    fn details_round_trip_typed_values() {
        let action = Action::new(ActionType::Create, "loadbalancer", "web", "create web")
            .with_detail("config", serde_json::json!({"vip_subnet_id": "subnet-1"}));

        let config: serde_json::Value = action.detail("config").unwrap();
        assert_eq!(config["vip_subnet_id"], "subnet-1");
        assert!(action.detail::<String>("missing").is_none());
    }

    #[test]
    fn apply_result_tracks_failures() {
        let mut result = ApplyResult::new();
        result.add_success("create:loadbalancer:web".into(), "created".into());
        result.add_failure("delete:loadbalancer:old".into(), "conflict".into());

        assert!(!result.is_success());
        assert_eq!(result.failures().count(), 1);
    }
}
