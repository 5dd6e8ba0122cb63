//! OpenStack provider configuration
//!
//! All settings come from the standard `OS_*` environment variables, the way
//! the deployment tooling already exports them. No config file is read.

use crate::error::{OpenStackError, Result};

/// Which load-balancing backend serves the LBaaS v2 API.
///
/// Deployments run either Octavia or the legacy Neutron-LBaaS extension;
/// the two differ only in path prefix. The choice is an explicit capability
/// passed in at client construction, never read from shared state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LbApiFlavor {
    /// Octavia, the standalone load-balancer service (`/v2/lbaas`)
    #[default]
    Octavia,
    /// Neutron networking with the LBaaS v2 extension (`/v2.0/lbaas`)
    NeutronLbaas,
}

impl LbApiFlavor {
    /// Path prefix for LBaaS v2 resources under the service endpoint.
    pub fn path_prefix(&self) -> &'static str {
        match self {
            LbApiFlavor::Octavia => "/v2/lbaas",
            LbApiFlavor::NeutronLbaas => "/v2.0/lbaas",
        }
    }
}

/// Provider configuration
#[derive(Debug, Clone)]
pub struct OpenStackConfig {
    /// Keystone-issued auth token
    pub token: String,

    /// Region name, informational
    pub region: String,

    /// Endpoint of the load-balancing service (Octavia) or Neutron
    pub loadbalancer_endpoint: String,

    /// Endpoint of the DNS service (Designate)
    pub dns_endpoint: Option<String>,

    /// Endpoint of the block storage service (Cinder)
    pub volume_endpoint: Option<String>,

    /// Which backend serves the LBaaS v2 API
    pub lb_flavor: LbApiFlavor,
}

impl OpenStackConfig {
    /// Create configuration from environment variables.
    ///
    /// Required: `OS_TOKEN`, `OS_REGION_NAME`, `OS_LOADBALANCER_ENDPOINT`.
    /// Optional: `OS_DNS_ENDPOINT`, `OS_VOLUME_ENDPOINT`,
    /// `OS_LB_FLAVOR` (`octavia` | `neutron`, defaults to octavia).
    pub fn from_env() -> Result<Self> {
        let token = require_env("OS_TOKEN")?;
        let region = require_env("OS_REGION_NAME")?;
        let loadbalancer_endpoint = require_env("OS_LOADBALANCER_ENDPOINT")?;

        let lb_flavor = match std::env::var("OS_LB_FLAVOR").ok().as_deref() {
            None | Some("octavia") => LbApiFlavor::Octavia,
            Some("neutron") => LbApiFlavor::NeutronLbaas,
            Some(other) => {
                return Err(OpenStackError::Validation(format!(
                    "OS_LB_FLAVOR must be 'octavia' or 'neutron', got '{other}'"
                )));
            }
        };

        Ok(Self {
            token,
            region,
            loadbalancer_endpoint,
            dns_endpoint: std::env::var("OS_DNS_ENDPOINT").ok(),
            volume_endpoint: std::env::var("OS_VOLUME_ENDPOINT").ok(),
            lb_flavor,
        })
    }
}

fn require_env(name: &str) -> Result<String> {
    std::env::var(name).map_err(|_| OpenStackError::MissingEnvVar(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flavor_selects_path_prefix() {
        assert_eq!(LbApiFlavor::Octavia.path_prefix(), "/v2/lbaas");
        assert_eq!(LbApiFlavor::NeutronLbaas.path_prefix(), "/v2.0/lbaas");
    }
}
