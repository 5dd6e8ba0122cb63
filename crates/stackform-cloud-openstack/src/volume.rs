//! Block storage volumes (Cinder)
//!
//! Volume statuses are lowercase, unlike the load balancing plane. Creation
//! passes through `creating` (and `downloading` when built from an image)
//! before settling at `available`. Deletion detaches the volume first, and a
//! concurrent deleter is tolerated: a volume already `deleting` is left to
//! finish.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use stackform_cloud::{StatusPoll, wait_for_status};
use tracing::debug;

use crate::client::ServiceClient;
use crate::error::{OpenStackError, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct Volume {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub size: u64,
    pub status: String,
    #[serde(default)]
    pub volume_type: Option<String>,
    #[serde(default)]
    pub attachments: Vec<VolumeAttachment>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VolumeAttachment {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub server_id: Option<String>,
    #[serde(default)]
    pub device: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VolumeCreate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability_zone: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct VolumeUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Serialize)]
struct VolumeBody<T> {
    volume: T,
}

#[derive(Deserialize)]
struct VolumeResp {
    volume: Volume,
}

/// Read and mutate operations over volumes. Lifecycle code and the status
/// waits call through this; tests substitute scripted implementations.
#[async_trait]
pub trait VolumeApi: Send + Sync {
    async fn get_volume(&self, id: &str) -> Result<Volume>;
    async fn create_volume(&self, opts: &VolumeCreate) -> Result<Volume>;
    async fn update_volume(&self, id: &str, opts: &VolumeUpdate) -> Result<Volume>;
    async fn delete_volume(&self, id: &str) -> Result<()>;
    async fn detach_volume(&self, id: &str, attachment_id: Option<&str>) -> Result<()>;
}

/// HTTP implementation of [`VolumeApi`] against the Cinder API
#[derive(Debug, Clone)]
pub struct HttpVolumeApi {
    client: ServiceClient,
}

impl HttpVolumeApi {
    pub fn new(client: ServiceClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl VolumeApi for HttpVolumeApi {
    async fn get_volume(&self, id: &str) -> Result<Volume> {
        let resp: VolumeResp = self.client.get(&format!("/volumes/{id}"), "volume", id).await?;
        Ok(resp.volume)
    }

    async fn create_volume(&self, opts: &VolumeCreate) -> Result<Volume> {
        let resp: VolumeResp = self
            .client
            .post("/volumes", &VolumeBody { volume: opts }, "volume", "")
            .await?;
        Ok(resp.volume)
    }

    async fn update_volume(&self, id: &str, opts: &VolumeUpdate) -> Result<Volume> {
        let resp: VolumeResp = self
            .client
            .put(&format!("/volumes/{id}"), &VolumeBody { volume: opts }, "volume", id)
            .await?;
        Ok(resp.volume)
    }

    async fn delete_volume(&self, id: &str) -> Result<()> {
        self.client.delete(&format!("/volumes/{id}"), "volume", id).await
    }

    async fn detach_volume(&self, id: &str, attachment_id: Option<&str>) -> Result<()> {
        let body = json!({ "os-detach": { "attachment_id": attachment_id } });
        self.client
            .post_action(&format!("/volumes/{id}/action"), &body, "volume", id)
            .await
    }
}

/// Volumes take a while to materialize; poll lazily.
fn poll<'a>(id: &str, target: &'a str, pending: &'a [&'a str], timeout: Duration) -> StatusPoll<'a> {
    StatusPoll::new("volume", id, target)
        .pending(pending)
        .delay(Duration::from_secs(10))
        .min_interval(Duration::from_secs(3))
        .timeout(timeout)
}

async fn wait(
    api: &dyn VolumeApi,
    id: &str,
    target: &str,
    pending: &[&str],
    deletion: bool,
    timeout: Duration,
) -> Result<()> {
    let mut poll = poll(id, target, pending, timeout);
    if deletion {
        poll = poll.deletion();
    }
    wait_for_status(poll, move || async move {
        match api.get_volume(id).await {
            Ok(volume) => Ok(Some(volume.status)),
            Err(OpenStackError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    })
    .await?;
    Ok(())
}

/// Create a volume and block until it is `available`.
pub async fn create(api: &dyn VolumeApi, opts: &VolumeCreate, timeout: Duration) -> Result<Volume> {
    debug!("Creating volume of size {} GB", opts.size);
    let created = api.create_volume(opts).await?;

    wait(
        api,
        &created.id,
        "available",
        &["downloading", "creating"],
        false,
        timeout,
    )
    .await?;

    api.get_volume(&created.id).await
}

pub async fn read(api: &dyn VolumeApi, id: &str) -> Result<Volume> {
    api.get_volume(id).await
}

/// Rename or re-describe a volume. Metadata updates apply synchronously,
/// so there is nothing to wait on.
pub async fn update(api: &dyn VolumeApi, id: &str, opts: &VolumeUpdate) -> Result<Volume> {
    debug!("Updating volume {}", id);
    api.update_volume(id, opts).await
}

/// Delete a volume, detaching it first when attached, and block until it
/// is gone.
pub async fn delete(api: &dyn VolumeApi, id: &str, timeout: Duration) -> Result<()> {
    let volume = api.get_volume(id).await?;

    if !volume.attachments.is_empty() {
        debug!("Detaching volume {} from {} server(s)", id, volume.attachments.len());
        for attachment in &volume.attachments {
            api.detach_volume(id, attachment.id.as_deref()).await?;
        }
        wait(
            api,
            id,
            "available",
            &["in-use", "attaching", "detaching"],
            false,
            timeout,
        )
        .await?;
    }

    // Another actor may have started the deletion; don't race it.
    if volume.status != "deleting" {
        debug!("Deleting volume {}", id);
        match api.delete_volume(id).await {
            Ok(()) | Err(OpenStackError::NotFound { .. }) => {}
            Err(e) => return Err(e),
        }
    }

    wait(
        api,
        id,
        "deleted",
        &["deleting", "downloading", "available"],
        true,
        timeout,
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    const TIMEOUT: Duration = Duration::from_secs(600);

    fn volume(id: &str, status: &str, attachments: serde_json::Value) -> Volume {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "name": "data",
            "size": 20,
            "status": status,
            "attachments": attachments,
        }))
        .unwrap()
    }

    /// Scripted [`VolumeApi`]: each read consumes the next snapshot; `None`
    /// means the volume is gone. The first snapshot doubles as the initial
    /// read the delete path does before deciding what to do.
    #[derive(Default)]
    struct FakeVolumeApi {
        reads: Mutex<VecDeque<Option<Volume>>>,
        detach_calls: AtomicU32,
        delete_calls: AtomicU32,
    }

    impl FakeVolumeApi {
        fn scripted(reads: Vec<Option<Volume>>) -> Self {
            Self {
                reads: Mutex::new(reads.into()),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl VolumeApi for FakeVolumeApi {
        async fn get_volume(&self, id: &str) -> Result<Volume> {
            match self.reads.lock().unwrap().pop_front().flatten() {
                Some(volume) => Ok(volume),
                None => Err(OpenStackError::NotFound {
                    kind: "volume",
                    id: id.to_string(),
                }),
            }
        }

        async fn create_volume(&self, _opts: &VolumeCreate) -> Result<Volume> {
            Ok(volume("vol-1", "creating", serde_json::json!([])))
        }

        async fn update_volume(&self, _id: &str, _opts: &VolumeUpdate) -> Result<Volume> {
            unimplemented!()
        }

        async fn delete_volume(&self, _id: &str) -> Result<()> {
            self.delete_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn detach_volume(&self, _id: &str, _attachment_id: Option<&str>) -> Result<()> {
            self.detach_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn unattached(status: &str) -> Option<Volume> {
        Some(volume("vol-1", status, serde_json::json!([])))
    }

    #[tokio::test(start_paused = true)]
    async fn create_waits_until_available() {
        let fake = FakeVolumeApi::scripted(vec![
            unattached("creating"),
            unattached("available"),
            unattached("available"),
        ]);

        let opts = VolumeCreate {
            name: Some("data".to_string()),
            description: None,
            size: 20,
            volume_type: None,
            image_id: None,
            availability_zone: None,
        };
        let vol = create(&fake, &opts, TIMEOUT).await.unwrap();

        assert_eq!(vol.status, "available");
    }

    #[tokio::test(start_paused = true)]
    async fn delete_detaches_attached_volume_first() {
        let attached = Some(volume(
            "vol-1",
            "in-use",
            serde_json::json!([{ "id": "att-1", "server_id": "srv-1" }]),
        ));
        // Initial read, detach wait, deletion wait, then gone.
        let fake = FakeVolumeApi::scripted(vec![
            attached,
            unattached("detaching"),
            unattached("available"),
            unattached("deleting"),
            None,
        ]);

        delete(&fake, "vol-1", TIMEOUT).await.unwrap();

        assert_eq!(fake.detach_calls.load(Ordering::SeqCst), 1);
        assert_eq!(fake.delete_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn delete_leaves_a_volume_already_deleting_alone() {
        // Someone else started the deletion; we only wait it out.
        let fake = FakeVolumeApi::scripted(vec![unattached("deleting"), unattached("deleting"), None]);

        delete(&fake, "vol-1", TIMEOUT).await.unwrap();

        assert_eq!(fake.detach_calls.load(Ordering::SeqCst), 0);
        assert_eq!(fake.delete_calls.load(Ordering::SeqCst), 0);
    }
}
