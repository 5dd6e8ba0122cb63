//! OpenStack provider for stackform
//!
//! Drives OpenStack resources whose control planes apply mutations
//! asynchronously: load balancers and their sub-resources (gated by the
//! parent's `provisioning_status`), DNS record sets, and block storage
//! volumes. Every lifecycle call blocks until the resource settles, so a
//! returned `Ok` means the change is actually in effect.
//!
//! Configuration comes from `OS_*` environment variables, see
//! [`OpenStackConfig::from_env`].

pub mod client;
pub mod config;
pub mod dns;
pub mod error;
pub mod lb;
pub mod provider;
pub mod volume;

pub use client::ServiceClient;
pub use config::{LbApiFlavor, OpenStackConfig};
pub use dns::{DnsApi, HttpDnsApi};
pub use error::{OpenStackError, Result, is_retryable};
pub use provider::OpenStackProvider;
pub use volume::{HttpVolumeApi, VolumeApi};
