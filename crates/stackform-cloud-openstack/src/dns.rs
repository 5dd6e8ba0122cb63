//! DNS record sets (Designate v2)
//!
//! Record sets live under their zone in the API paths, so their canonical
//! identifier here is the composite `zone_id/recordset_id`. Mutations are
//! asynchronous: the record set reports PENDING until the change has
//! propagated, and the lifecycle blocks until it settles.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use stackform_cloud::{StatusPoll, wait_for_status};
use tracing::debug;

use crate::client::ServiceClient;
use crate::error::{OpenStackError, Result};

/// A DNS record set within a zone
#[derive(Debug, Clone, Deserialize)]
pub struct RecordSet {
    pub id: String,
    pub zone_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: String,
    #[serde(default)]
    pub ttl: Option<u32>,
    #[serde(default)]
    pub records: Vec<String>,
    #[serde(default)]
    pub description: String,
    pub status: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecordSetCreate {
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
    pub records: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RecordSetUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Split a composite `zone_id/recordset_id` identifier.
pub fn parse_recordset_id(id: &str) -> Result<(&str, &str)> {
    match id.split_once('/') {
        Some((zone_id, recordset_id)) if !zone_id.is_empty() && !recordset_id.is_empty() => {
            Ok((zone_id, recordset_id))
        }
        _ => Err(OpenStackError::Validation(format!(
            "record set id must be <zone_id>/<recordset_id>, got {id}"
        ))),
    }
}

/// Read and mutate operations over record sets. Lifecycle code and the
/// status waits call through this; tests substitute scripted
/// implementations.
#[async_trait]
pub trait DnsApi: Send + Sync {
    async fn get_recordset(&self, zone_id: &str, id: &str) -> Result<RecordSet>;
    async fn create_recordset(&self, zone_id: &str, opts: &RecordSetCreate) -> Result<RecordSet>;
    async fn update_recordset(
        &self,
        zone_id: &str,
        id: &str,
        opts: &RecordSetUpdate,
    ) -> Result<RecordSet>;
    async fn delete_recordset(&self, zone_id: &str, id: &str) -> Result<()>;
}

/// HTTP implementation of [`DnsApi`] against the Designate v2 API
#[derive(Debug, Clone)]
pub struct HttpDnsApi {
    client: ServiceClient,
}

impl HttpDnsApi {
    pub fn new(client: ServiceClient) -> Self {
        Self { client }
    }

    fn path(zone_id: &str, recordset_id: Option<&str>) -> String {
        match recordset_id {
            Some(rs) => format!("/v2/zones/{zone_id}/recordsets/{rs}"),
            None => format!("/v2/zones/{zone_id}/recordsets"),
        }
    }
}

#[async_trait]
impl DnsApi for HttpDnsApi {
    async fn get_recordset(&self, zone_id: &str, id: &str) -> Result<RecordSet> {
        self.client
            .get(&Self::path(zone_id, Some(id)), "recordset", id)
            .await
    }

    async fn create_recordset(&self, zone_id: &str, opts: &RecordSetCreate) -> Result<RecordSet> {
        self.client
            .post(&Self::path(zone_id, None), opts, "recordset", &opts.name)
            .await
    }

    async fn update_recordset(
        &self,
        zone_id: &str,
        id: &str,
        opts: &RecordSetUpdate,
    ) -> Result<RecordSet> {
        self.client
            .put(&Self::path(zone_id, Some(id)), opts, "recordset", id)
            .await
    }

    async fn delete_recordset(&self, zone_id: &str, id: &str) -> Result<()> {
        self.client
            .delete(&Self::path(zone_id, Some(id)), "recordset", id)
            .await
    }
}

/// DNS propagation is slow to start and slow to converge; poll lazily.
fn poll<'a>(id: &str, target: &'a str, pending: &'a [&'a str], timeout: Duration) -> StatusPoll<'a> {
    StatusPoll::new("recordset", id, target)
        .pending(pending)
        .delay(Duration::from_secs(5))
        .min_interval(Duration::from_secs(3))
        .timeout(timeout)
}

async fn fetch_status(api: &dyn DnsApi, zone_id: &str, id: &str) -> Result<Option<String>> {
    match api.get_recordset(zone_id, id).await {
        Ok(rs) => Ok(Some(rs.status)),
        Err(OpenStackError::NotFound { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Create a record set and block until it is ACTIVE.
pub async fn create(
    api: &dyn DnsApi,
    zone_id: &str,
    opts: &RecordSetCreate,
    timeout: Duration,
) -> Result<RecordSet> {
    debug!("Creating record set {} in zone {}", opts.name, zone_id);
    let rs = api.create_recordset(zone_id, opts).await?;

    let rs_id = rs.id.as_str();
    wait_for_status(poll(rs_id, "ACTIVE", &["PENDING"], timeout), move || async move {
        fetch_status(api, zone_id, rs_id).await
    })
    .await?;

    api.get_recordset(zone_id, rs_id).await
}

pub async fn read(api: &dyn DnsApi, zone_id: &str, id: &str) -> Result<RecordSet> {
    api.get_recordset(zone_id, id).await
}

/// Apply an update and block until the record set is ACTIVE again.
pub async fn update(
    api: &dyn DnsApi,
    zone_id: &str,
    id: &str,
    opts: &RecordSetUpdate,
    timeout: Duration,
) -> Result<RecordSet> {
    debug!("Updating record set {} in zone {}", id, zone_id);
    api.update_recordset(zone_id, id, opts).await?;

    wait_for_status(poll(id, "ACTIVE", &["PENDING"], timeout), move || async move {
        fetch_status(api, zone_id, id).await
    })
    .await?;

    api.get_recordset(zone_id, id).await
}

/// Delete a record set and block until it is gone. The record set reports
/// ACTIVE then PENDING while the deletion propagates, so both count as
/// pending here.
pub async fn delete(api: &dyn DnsApi, zone_id: &str, id: &str, timeout: Duration) -> Result<()> {
    debug!("Deleting record set {} in zone {}", id, zone_id);
    api.delete_recordset(zone_id, id).await?;

    wait_for_status(
        poll(id, "DELETED", &["ACTIVE", "PENDING"], timeout).deletion(),
        move || async move { fetch_status(api, zone_id, id).await },
    )
    .await?;
    Ok(())
}
