//! LBaaS v2 API surface
//!
//! [`LbApi`] is the seam between the resource lifecycles and the wire:
//! lifecycle code and the status waits call through it, and tests substitute
//! scripted implementations. [`HttpLbApi`] is the real one, speaking to
//! either Octavia or Neutron-LBaaS depending on the flavor it was
//! constructed with.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::client::ServiceClient;
use crate::config::LbApiFlavor;
use crate::error::Result;
use crate::lb::types::*;

/// Read and mutate operations over load balancers and their sub-resources
#[async_trait]
pub trait LbApi: Send + Sync {
    async fn get_load_balancer(&self, id: &str) -> Result<LoadBalancer>;
    async fn list_load_balancers(&self) -> Result<Vec<LoadBalancer>>;
    async fn create_load_balancer(&self, opts: &LoadBalancerCreate) -> Result<LoadBalancer>;
    async fn update_load_balancer(&self, id: &str, opts: &LoadBalancerUpdate)
    -> Result<LoadBalancer>;
    async fn delete_load_balancer(&self, id: &str) -> Result<()>;

    async fn get_listener(&self, id: &str) -> Result<Listener>;
    async fn create_listener(&self, opts: &ListenerCreate) -> Result<Listener>;
    async fn update_listener(&self, id: &str, opts: &ListenerUpdate) -> Result<Listener>;
    async fn delete_listener(&self, id: &str) -> Result<()>;

    async fn get_pool(&self, id: &str) -> Result<Pool>;
    async fn create_pool(&self, opts: &PoolCreate) -> Result<Pool>;
    async fn update_pool(&self, id: &str, opts: &PoolUpdate) -> Result<Pool>;
    async fn delete_pool(&self, id: &str) -> Result<()>;

    async fn get_member(&self, pool_id: &str, id: &str) -> Result<Member>;
    async fn create_member(&self, pool_id: &str, opts: &MemberCreate) -> Result<Member>;
    async fn update_member(&self, pool_id: &str, id: &str, opts: &MemberUpdate)
    -> Result<Member>;
    async fn delete_member(&self, pool_id: &str, id: &str) -> Result<()>;

    async fn get_monitor(&self, id: &str) -> Result<Monitor>;
    async fn create_monitor(&self, opts: &MonitorCreate) -> Result<Monitor>;
    async fn update_monitor(&self, id: &str, opts: &MonitorUpdate) -> Result<Monitor>;
    async fn delete_monitor(&self, id: &str) -> Result<()>;

    async fn get_l7policy(&self, id: &str) -> Result<L7Policy>;
    async fn create_l7policy(&self, opts: &L7PolicyCreate) -> Result<L7Policy>;
    async fn update_l7policy(&self, id: &str, opts: &L7PolicyUpdate) -> Result<L7Policy>;
    async fn delete_l7policy(&self, id: &str) -> Result<()>;
}

/// HTTP implementation of [`LbApi`]
pub struct HttpLbApi {
    client: ServiceClient,
    flavor: LbApiFlavor,
}

impl HttpLbApi {
    /// The flavor decides the path prefix the backend serves; it is fixed at
    /// construction rather than read from any shared switch.
    pub fn new(client: ServiceClient, flavor: LbApiFlavor) -> Self {
        Self { client, flavor }
    }

    fn path(&self, suffix: &str) -> String {
        format!("{}{}", self.flavor.path_prefix(), suffix)
    }
}

// Request/response envelopes. The API nests every resource under a
// singular or plural key.
#[derive(Serialize)]
struct LbBody<'a, T> {
    loadbalancer: &'a T,
}
#[derive(Deserialize)]
struct LbResp {
    loadbalancer: LoadBalancer,
}
#[derive(Deserialize)]
struct LbsResp {
    loadbalancers: Vec<LoadBalancer>,
}

#[derive(Serialize)]
struct ListenerBody<'a, T> {
    listener: &'a T,
}
#[derive(Deserialize)]
struct ListenerResp {
    listener: Listener,
}

#[derive(Serialize)]
struct PoolBody<'a, T> {
    pool: &'a T,
}
#[derive(Deserialize)]
struct PoolResp {
    pool: Pool,
}

#[derive(Serialize)]
struct MemberBody<'a, T> {
    member: &'a T,
}
#[derive(Deserialize)]
struct MemberResp {
    member: Member,
}

#[derive(Serialize)]
struct MonitorBody<'a, T> {
    healthmonitor: &'a T,
}
#[derive(Deserialize)]
struct MonitorResp {
    healthmonitor: Monitor,
}

#[derive(Serialize)]
struct L7PolicyBody<'a, T> {
    l7policy: &'a T,
}
#[derive(Deserialize)]
struct L7PolicyResp {
    l7policy: L7Policy,
}

#[async_trait]
impl LbApi for HttpLbApi {
    async fn get_load_balancer(&self, id: &str) -> Result<LoadBalancer> {
        let resp: LbResp = self
            .client
            .get(&self.path(&format!("/loadbalancers/{id}")), "loadbalancer", id)
            .await?;
        Ok(resp.loadbalancer)
    }

    async fn list_load_balancers(&self) -> Result<Vec<LoadBalancer>> {
        let resp: LbsResp = self
            .client
            .get(&self.path("/loadbalancers"), "loadbalancer", "")
            .await?;
        Ok(resp.loadbalancers)
    }

    async fn create_load_balancer(&self, opts: &LoadBalancerCreate) -> Result<LoadBalancer> {
        let resp: LbResp = self
            .client
            .post(
                &self.path("/loadbalancers"),
                &LbBody { loadbalancer: opts },
                "loadbalancer",
                &opts.name,
            )
            .await?;
        Ok(resp.loadbalancer)
    }

    async fn update_load_balancer(
        &self,
        id: &str,
        opts: &LoadBalancerUpdate,
    ) -> Result<LoadBalancer> {
        let resp: LbResp = self
            .client
            .put(
                &self.path(&format!("/loadbalancers/{id}")),
                &LbBody { loadbalancer: opts },
                "loadbalancer",
                id,
            )
            .await?;
        Ok(resp.loadbalancer)
    }

    async fn delete_load_balancer(&self, id: &str) -> Result<()> {
        self.client
            .delete(&self.path(&format!("/loadbalancers/{id}")), "loadbalancer", id)
            .await
    }

    async fn get_listener(&self, id: &str) -> Result<Listener> {
        let resp: ListenerResp = self
            .client
            .get(&self.path(&format!("/listeners/{id}")), "listener", id)
            .await?;
        Ok(resp.listener)
    }

    async fn create_listener(&self, opts: &ListenerCreate) -> Result<Listener> {
        let resp: ListenerResp = self
            .client
            .post(
                &self.path("/listeners"),
                &ListenerBody { listener: opts },
                "listener",
                &opts.name,
            )
            .await?;
        Ok(resp.listener)
    }

    async fn update_listener(&self, id: &str, opts: &ListenerUpdate) -> Result<Listener> {
        let resp: ListenerResp = self
            .client
            .put(
                &self.path(&format!("/listeners/{id}")),
                &ListenerBody { listener: opts },
                "listener",
                id,
            )
            .await?;
        Ok(resp.listener)
    }

    async fn delete_listener(&self, id: &str) -> Result<()> {
        self.client
            .delete(&self.path(&format!("/listeners/{id}")), "listener", id)
            .await
    }

    async fn get_pool(&self, id: &str) -> Result<Pool> {
        let resp: PoolResp = self
            .client
            .get(&self.path(&format!("/pools/{id}")), "pool", id)
            .await?;
        Ok(resp.pool)
    }

    async fn create_pool(&self, opts: &PoolCreate) -> Result<Pool> {
        let resp: PoolResp = self
            .client
            .post(&self.path("/pools"), &PoolBody { pool: opts }, "pool", &opts.name)
            .await?;
        Ok(resp.pool)
    }

    async fn update_pool(&self, id: &str, opts: &PoolUpdate) -> Result<Pool> {
        let resp: PoolResp = self
            .client
            .put(
                &self.path(&format!("/pools/{id}")),
                &PoolBody { pool: opts },
                "pool",
                id,
            )
            .await?;
        Ok(resp.pool)
    }

    async fn delete_pool(&self, id: &str) -> Result<()> {
        self.client
            .delete(&self.path(&format!("/pools/{id}")), "pool", id)
            .await
    }

    async fn get_member(&self, pool_id: &str, id: &str) -> Result<Member> {
        let resp: MemberResp = self
            .client
            .get(
                &self.path(&format!("/pools/{pool_id}/members/{id}")),
                "member",
                id,
            )
            .await?;
        Ok(resp.member)
    }

    async fn create_member(&self, pool_id: &str, opts: &MemberCreate) -> Result<Member> {
        let resp: MemberResp = self
            .client
            .post(
                &self.path(&format!("/pools/{pool_id}/members")),
                &MemberBody { member: opts },
                "member",
                &opts.name,
            )
            .await?;
        Ok(resp.member)
    }

    async fn update_member(
        &self,
        pool_id: &str,
        id: &str,
        opts: &MemberUpdate,
    ) -> Result<Member> {
        let resp: MemberResp = self
            .client
            .put(
                &self.path(&format!("/pools/{pool_id}/members/{id}")),
                &MemberBody { member: opts },
                "member",
                id,
            )
            .await?;
        Ok(resp.member)
    }

    async fn delete_member(&self, pool_id: &str, id: &str) -> Result<()> {
        self.client
            .delete(
                &self.path(&format!("/pools/{pool_id}/members/{id}")),
                "member",
                id,
            )
            .await
    }

    async fn get_monitor(&self, id: &str) -> Result<Monitor> {
        let resp: MonitorResp = self
            .client
            .get(&self.path(&format!("/healthmonitors/{id}")), "monitor", id)
            .await?;
        Ok(resp.healthmonitor)
    }

    async fn create_monitor(&self, opts: &MonitorCreate) -> Result<Monitor> {
        let resp: MonitorResp = self
            .client
            .post(
                &self.path("/healthmonitors"),
                &MonitorBody { healthmonitor: opts },
                "monitor",
                &opts.name,
            )
            .await?;
        Ok(resp.healthmonitor)
    }

    async fn update_monitor(&self, id: &str, opts: &MonitorUpdate) -> Result<Monitor> {
        let resp: MonitorResp = self
            .client
            .put(
                &self.path(&format!("/healthmonitors/{id}")),
                &MonitorBody { healthmonitor: opts },
                "monitor",
                id,
            )
            .await?;
        Ok(resp.healthmonitor)
    }

    async fn delete_monitor(&self, id: &str) -> Result<()> {
        self.client
            .delete(&self.path(&format!("/healthmonitors/{id}")), "monitor", id)
            .await
    }

    async fn get_l7policy(&self, id: &str) -> Result<L7Policy> {
        let resp: L7PolicyResp = self
            .client
            .get(&self.path(&format!("/l7policies/{id}")), "l7policy", id)
            .await?;
        Ok(resp.l7policy)
    }

    async fn create_l7policy(&self, opts: &L7PolicyCreate) -> Result<L7Policy> {
        let resp: L7PolicyResp = self
            .client
            .post(
                &self.path("/l7policies"),
                &L7PolicyBody { l7policy: opts },
                "l7policy",
                &opts.name,
            )
            .await?;
        Ok(resp.l7policy)
    }

    async fn update_l7policy(&self, id: &str, opts: &L7PolicyUpdate) -> Result<L7Policy> {
        let resp: L7PolicyResp = self
            .client
            .put(
                &self.path(&format!("/l7policies/{id}")),
                &L7PolicyBody { l7policy: opts },
                "l7policy",
                id,
            )
            .await?;
        Ok(resp.l7policy)
    }

    async fn delete_l7policy(&self, id: &str) -> Result<()> {
        self.client
            .delete(&self.path(&format!("/l7policies/{id}")), "l7policy", id)
            .await
    }
}
