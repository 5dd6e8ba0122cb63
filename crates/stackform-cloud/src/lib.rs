//! stackform Cloud Infrastructure
//!
//! Provider abstraction for stackform: declarative management of cloud
//! resources whose control planes apply mutations asynchronously.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │              declarative framework               │
//! │        (desired state + operation budgets)       │
//! └─────────────────┬────────────────────────────────┘
//!                   │
//! ┌─────────────────▼────────────────────────────────┐
//! │               stackform-cloud                    │
//! │  ┌───────────────────┐  ┌─────────────────────┐  │
//! │  │ trait CloudProvider│ │  status reconciler   │  │
//! │  │   plan / apply     │ │  wait_for_status +   │  │
//! │  │                    │ │  retry_on_conflict   │  │
//! │  └───────────────────┘  └─────────────────────┘  │
//! └─────────────────┬────────────────────────────────┘
//!                   │
//!          ┌────────▼─────────┐
//!          │ openstack        │
//!          │ provider         │
//!          └──────────────────┘
//! ```
//!
//! The reconciler is the load-bearing piece: after every mutating call the
//! provider blocks until the affected resource, or its parent aggregate,
//! leaves its pending statuses. See [`waiter`] and [`retry`].

pub mod action;
pub mod error;
pub mod provider;
pub mod retry;
pub mod state;
pub mod waiter;

// Re-exports
pub use action::{Action, ActionOutcome, ActionType, ApplyResult, Plan, PlanSummary};
pub use error::{CloudError, Result};
pub use provider::{AuthStatus, CloudProvider, OperationTimeouts, ResourceConfig, ResourceSet};
pub use retry::{RetryPolicy, retry_on_conflict};
pub use state::{ProviderState, ResourceState, ResourceStatus};
pub use waiter::{StatusPoll, WaitError, wait_for_status};
