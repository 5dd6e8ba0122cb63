//! Lifecycle tests for load balancer sub-resources against a scripted API.
//!
//! Time is paused, so the poll delays and retry intervals elapse instantly
//! while call ordering and counts stay observable.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use stackform_cloud::{ActionType, CloudProvider, ResourceConfig, ResourceSet};
use stackform_cloud_openstack::OpenStackError;
use stackform_cloud_openstack::lb::api::LbApi;
use stackform_cloud_openstack::lb::status::{LbParent, resolve_load_balancer_id};
use stackform_cloud_openstack::lb::types::*;
use stackform_cloud_openstack::lb::{l7policy, listener};
use stackform_cloud_openstack::provider::OpenStackProvider;

const TIMEOUT: Duration = Duration::from_secs(600);

fn lb(id: &str, name: &str, provisioning_status: &str) -> LoadBalancer {
    serde_json::from_value(serde_json::json!({
        "id": id,
        "name": name,
        "vip_subnet_id": "subnet-1",
        "vip_address": "10.0.0.4",
        "provisioning_status": provisioning_status,
        "operating_status": "ONLINE",
    }))
    .unwrap()
}

fn listener_reply(id: &str, lb_id: &str) -> Listener {
    serde_json::from_value(serde_json::json!({
        "id": id,
        "name": "web",
        "protocol": "HTTP",
        "protocol_port": 80,
        "loadbalancers": [{"id": lb_id}],
    }))
    .unwrap()
}

/// Scripted [`LbApi`]: load balancer reads consume a status script (and
/// report ACTIVE once it runs out), listener creates fail with a set number
/// of conflicts first, listener reads 404 after a set number of calls.
#[derive(Default)]
struct FakeLbApi {
    lb_script: Mutex<VecDeque<&'static str>>,
    existing: Vec<LoadBalancer>,
    pool: Option<Pool>,
    conflicts_before_create: AtomicU32,
    listener_reads_before_gone: AtomicU32,
    get_lb_calls: AtomicU32,
    // Shared so a test can keep watching after the fake moves into a provider.
    create_lb_calls: Arc<AtomicU32>,
    get_listener_calls: AtomicU32,
    create_listener_calls: AtomicU32,
    delete_listener_calls: AtomicU32,
    l7_calls: AtomicU32,
}

impl FakeLbApi {
    fn new() -> Self {
        Self {
            listener_reads_before_gone: AtomicU32::new(u32::MAX),
            ..Default::default()
        }
    }

    fn with_lb_script(statuses: &[&'static str]) -> Self {
        let fake = Self::new();
        *fake.lb_script.lock().unwrap() = statuses.iter().copied().collect();
        fake
    }
}

#[async_trait]
impl LbApi for FakeLbApi {
    async fn get_load_balancer(&self, id: &str) -> Result<LoadBalancer, OpenStackError> {
        self.get_lb_calls.fetch_add(1, Ordering::SeqCst);
        let status = self.lb_script.lock().unwrap().pop_front().unwrap_or("ACTIVE");
        Ok(lb(id, "web", status))
    }

    async fn list_load_balancers(&self) -> Result<Vec<LoadBalancer>, OpenStackError> {
        Ok(self.existing.clone())
    }

    async fn create_load_balancer(
        &self,
        opts: &LoadBalancerCreate,
    ) -> Result<LoadBalancer, OpenStackError> {
        self.create_lb_calls.fetch_add(1, Ordering::SeqCst);
        Ok(lb("lb-new", &opts.name, "PENDING_CREATE"))
    }

    async fn update_load_balancer(
        &self,
        _id: &str,
        _opts: &LoadBalancerUpdate,
    ) -> Result<LoadBalancer, OpenStackError> {
        unimplemented!()
    }

    async fn delete_load_balancer(&self, _id: &str) -> Result<(), OpenStackError> {
        unimplemented!()
    }

    async fn get_listener(&self, id: &str) -> Result<Listener, OpenStackError> {
        self.get_listener_calls.fetch_add(1, Ordering::SeqCst);
        let remaining = self.listener_reads_before_gone.load(Ordering::SeqCst);
        if remaining == 0 {
            return Err(OpenStackError::NotFound {
                kind: "listener",
                id: id.to_string(),
            });
        }
        if remaining != u32::MAX {
            self.listener_reads_before_gone.fetch_sub(1, Ordering::SeqCst);
        }
        Ok(listener_reply(id, "lb-1"))
    }

    async fn create_listener(&self, opts: &ListenerCreate) -> Result<Listener, OpenStackError> {
        self.create_listener_calls.fetch_add(1, Ordering::SeqCst);
        if self.conflicts_before_create.load(Ordering::SeqCst) > 0 {
            self.conflicts_before_create.fetch_sub(1, Ordering::SeqCst);
            return Err(OpenStackError::Conflict(
                "load balancer lb-1 has an immutable state".to_string(),
            ));
        }
        Ok(listener_reply("lsnr-1", &opts.loadbalancer_id))
    }

    async fn update_listener(
        &self,
        _id: &str,
        _opts: &ListenerUpdate,
    ) -> Result<Listener, OpenStackError> {
        unimplemented!()
    }

    async fn delete_listener(&self, _id: &str) -> Result<(), OpenStackError> {
        self.delete_listener_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn get_pool(&self, id: &str) -> Result<Pool, OpenStackError> {
        self.pool.clone().ok_or(OpenStackError::NotFound {
            kind: "pool",
            id: id.to_string(),
        })
    }

    async fn create_pool(&self, _opts: &PoolCreate) -> Result<Pool, OpenStackError> {
        unimplemented!()
    }

    async fn update_pool(&self, _id: &str, _opts: &PoolUpdate) -> Result<Pool, OpenStackError> {
        unimplemented!()
    }

    async fn delete_pool(&self, _id: &str) -> Result<(), OpenStackError> {
        unimplemented!()
    }

    async fn get_member(&self, _pool_id: &str, _id: &str) -> Result<Member, OpenStackError> {
        unimplemented!()
    }

    async fn create_member(
        &self,
        _pool_id: &str,
        _opts: &MemberCreate,
    ) -> Result<Member, OpenStackError> {
        unimplemented!()
    }

    async fn update_member(
        &self,
        _pool_id: &str,
        _id: &str,
        _opts: &MemberUpdate,
    ) -> Result<Member, OpenStackError> {
        unimplemented!()
    }

    async fn delete_member(&self, _pool_id: &str, _id: &str) -> Result<(), OpenStackError> {
        unimplemented!()
    }

    async fn get_monitor(&self, _id: &str) -> Result<Monitor, OpenStackError> {
        unimplemented!()
    }

    async fn create_monitor(&self, _opts: &MonitorCreate) -> Result<Monitor, OpenStackError> {
        unimplemented!()
    }

    async fn update_monitor(
        &self,
        _id: &str,
        _opts: &MonitorUpdate,
    ) -> Result<Monitor, OpenStackError> {
        unimplemented!()
    }

    async fn delete_monitor(&self, _id: &str) -> Result<(), OpenStackError> {
        unimplemented!()
    }

    async fn get_l7policy(&self, _id: &str) -> Result<L7Policy, OpenStackError> {
        self.l7_calls.fetch_add(1, Ordering::SeqCst);
        unimplemented!()
    }

    async fn create_l7policy(&self, _opts: &L7PolicyCreate) -> Result<L7Policy, OpenStackError> {
        self.l7_calls.fetch_add(1, Ordering::SeqCst);
        unimplemented!()
    }

    async fn update_l7policy(
        &self,
        _id: &str,
        _opts: &L7PolicyUpdate,
    ) -> Result<L7Policy, OpenStackError> {
        self.l7_calls.fetch_add(1, Ordering::SeqCst);
        unimplemented!()
    }

    async fn delete_l7policy(&self, _id: &str) -> Result<(), OpenStackError> {
        self.l7_calls.fetch_add(1, Ordering::SeqCst);
        unimplemented!()
    }
}

fn listener_config() -> listener::ListenerConfig {
    listener::ListenerConfig {
        name: "web".to_string(),
        description: None,
        protocol: "HTTP".to_string(),
        protocol_port: 80,
        loadbalancer_id: "lb-1".to_string(),
        connection_limit: None,
        default_pool_id: None,
        admin_state_up: true,
    }
}

#[tokio::test(start_paused = true)]
async fn listener_create_waits_for_parent_around_the_mutation() {
    // The load balancer is still provisioning when the create starts: two
    // pending observations, then ACTIVE, then the post-mutation wait sees
    // ACTIVE straight away.
    let fake = FakeLbApi::with_lb_script(&["PENDING_CREATE", "PENDING_CREATE", "ACTIVE"]);

    let created = listener::create(&fake, &listener_config(), TIMEOUT)
        .await
        .unwrap();

    assert_eq!(created.id, "lsnr-1");
    assert_eq!(fake.create_listener_calls.load(Ordering::SeqCst), 1);
    assert_eq!(fake.get_lb_calls.load(Ordering::SeqCst), 4);
}

#[tokio::test(start_paused = true)]
async fn listener_create_absorbs_conflict_burst() {
    let fake = FakeLbApi::new();
    fake.conflicts_before_create.store(2, Ordering::SeqCst);

    listener::create(&fake, &listener_config(), TIMEOUT)
        .await
        .unwrap();

    assert_eq!(fake.create_listener_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn listener_create_aborts_on_parent_error_status() {
    let fake = FakeLbApi::with_lb_script(&["ERROR"]);

    let err = listener::create(&fake, &listener_config(), TIMEOUT)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        OpenStackError::UnexpectedStatus { status, .. } if status == "ERROR"
    ));
    // The mutation never went out.
    assert_eq!(fake.create_listener_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn listener_delete_polls_until_gone() {
    let fake = FakeLbApi::new();
    // One read resolves the parent, then the deletion poll sees the listener
    // twice before it 404s.
    fake.listener_reads_before_gone.store(3, Ordering::SeqCst);

    listener::delete(&fake, "lsnr-1", TIMEOUT).await.unwrap();

    assert_eq!(fake.delete_listener_calls.load(Ordering::SeqCst), 1);
    assert_eq!(fake.get_listener_calls.load(Ordering::SeqCst), 4);
}

#[tokio::test(start_paused = true)]
async fn l7policy_validation_short_circuits_before_any_call() {
    let fake = FakeLbApi::new();
    let config = l7policy::L7PolicyConfig {
        name: "policy".to_string(),
        description: None,
        action: L7PolicyAction::Reject,
        listener_id: "lsnr-1".to_string(),
        position: None,
        redirect_pool_id: None,
        redirect_url: Some("http://elsewhere.test".to_string()),
        admin_state_up: true,
    };

    let err = l7policy::create(&fake, &config, TIMEOUT).await.unwrap_err();

    assert!(matches!(err, OpenStackError::Validation(_)));
    assert_eq!(fake.get_lb_calls.load(Ordering::SeqCst), 0);
    assert_eq!(fake.get_listener_calls.load(Ordering::SeqCst), 0);
    assert_eq!(fake.l7_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn pool_parent_resolves_through_its_listener() {
    let mut fake = FakeLbApi::new();
    fake.pool = Some(
        serde_json::from_value(serde_json::json!({
            "id": "pool-1",
            "name": "backends",
            "protocol": "HTTP",
            "lb_algorithm": "ROUND_ROBIN",
            "listeners": [{"id": "lsnr-1"}],
        }))
        .unwrap(),
    );

    let lb_id = resolve_load_balancer_id(&fake, LbParent::Pool("pool-1"))
        .await
        .unwrap();
    assert_eq!(lb_id, "lb-1");
}

#[tokio::test]
async fn pool_without_any_parent_reference_is_an_error() {
    let mut fake = FakeLbApi::new();
    fake.pool = Some(
        serde_json::from_value(serde_json::json!({
            "id": "pool-1",
            "name": "backends",
            "protocol": "HTTP",
            "lb_algorithm": "ROUND_ROBIN",
        }))
        .unwrap(),
    );

    let err = resolve_load_balancer_id(&fake, LbParent::Pool("pool-1"))
        .await
        .unwrap_err();
    assert!(matches!(err, OpenStackError::ParentUnresolved(_)));
}

#[tokio::test]
async fn plan_creates_missing_and_keeps_existing() {
    let mut fake = FakeLbApi::new();
    fake.existing = vec![lb("lb-9", "api", "ACTIVE")];
    let provider = OpenStackProvider::with_api(Box::new(fake), "test-region");

    let mut desired = ResourceSet::new();
    desired.add(ResourceConfig::new(
        "loadbalancer",
        "web",
        serde_json::json!({"vip_subnet_id": "subnet-1"}),
    ));
    desired.add(ResourceConfig::new(
        "loadbalancer",
        "api",
        serde_json::json!({"vip_subnet_id": "subnet-1"}),
    ));

    let plan = provider.plan(&desired).await.unwrap();

    let of = |t: ActionType| {
        plan.actions
            .iter()
            .filter(|a| a.action_type == t)
            .map(|a| a.resource_id.clone())
            .collect::<Vec<_>>()
    };
    assert_eq!(of(ActionType::Create), vec!["web".to_string()]);
    assert_eq!(of(ActionType::NoOp), vec!["api".to_string()]);
    assert!(plan.has_changes());
}

#[tokio::test(start_paused = true)]
async fn apply_creates_straight_from_the_plan() {
    let fake = FakeLbApi::new();
    let creates = Arc::clone(&fake.create_lb_calls);
    let provider = OpenStackProvider::with_api(Box::new(fake), "test-region");

    let mut desired = ResourceSet::new();
    desired.add(ResourceConfig::new(
        "loadbalancer",
        "web",
        serde_json::json!({"vip_subnet_id": "subnet-1"}),
    ));

    // The plan carries each action's config, so applying it needs no
    // further input.
    let plan = provider.plan(&desired).await.unwrap();
    let result = provider.apply(&plan).await.unwrap();

    assert!(result.is_success());
    assert_eq!(creates.load(Ordering::SeqCst), 1);
}
