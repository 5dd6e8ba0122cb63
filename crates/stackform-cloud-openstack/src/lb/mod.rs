//! Load balancing (LBaaS v2)
//!
//! The load balancer is the aggregate: the control plane accepts one
//! mutation per load balancer at a time, reports progress through its
//! `provisioning_status`, and answers 409 while busy. Every sub-resource
//! lifecycle here waits the parent to ACTIVE, mutates with conflict retry,
//! and waits again.

pub mod api;
pub mod l7policy;
pub mod listener;
pub mod loadbalancer;
pub mod member;
pub mod monitor;
pub mod pool;
pub mod status;
pub mod types;
