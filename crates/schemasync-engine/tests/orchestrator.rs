//! End-to-end orchestration against the in-memory repository and cluster

use schemasync_core::{
    EventRouter, RepositorySettings, RepositorySnapshot, RepositoryUpdateEvent, ResourceEntry,
    ResourceType,
};
use schemasync_engine::{BranchOutcome, EngineConfig, OrchestratorState, SyncOrchestrator};
use schemasync_kube::MockCluster;
use schemasync_repo::MockRepository;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

type Orchestrator = SyncOrchestrator<MockRepository, MockCluster>;

fn enabled(boxes: &[&str]) -> RepositorySnapshot {
    RepositorySnapshot::new(
        boxes
            .iter()
            .map(|name| ResourceEntry::hashed(ResourceType::Th2Box, *name, json!({"image": name})))
            .collect(),
        Some(RepositorySettings::sync()),
    )
}

fn fast_config() -> EngineConfig {
    EngineConfig {
        poll_interval: Duration::from_millis(20),
        idle_backoff: Duration::from_millis(10),
        ..Default::default()
    }
}

fn orchestrator(
    repo: &Arc<MockRepository>,
    cluster: &Arc<MockCluster>,
    router: &EventRouter,
    config: EngineConfig,
) -> Arc<Orchestrator> {
    Arc::new(
        SyncOrchestrator::new(config, repo.clone(), cluster.clone(), router.clone()).unwrap(),
    )
}

async fn wait_until(what: &str, mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out waiting for {}",
            what
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

struct Running {
    orchestrator: Arc<Orchestrator>,
    shutdown: watch::Sender<bool>,
    handle: tokio::task::JoinHandle<()>,
}

impl Running {
    async fn start(orchestrator: Arc<Orchestrator>) -> Self {
        let (shutdown, rx) = watch::channel(false);
        let handle = {
            let orchestrator = orchestrator.clone();
            tokio::spawn(async move { orchestrator.run(rx).await })
        };
        let mut state = orchestrator.subscribe_state();
        tokio::time::timeout(
            Duration::from_secs(5),
            state.wait_for(|s| *s == OrchestratorState::SteadyState),
        )
        .await
        .expect("steady state within timeout")
        .unwrap();
        Self {
            orchestrator,
            shutdown,
            handle,
        }
    }

    async fn stop(self) {
        self.shutdown.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(5), self.handle)
            .await
            .expect("orchestrator should stop within timeout")
            .unwrap();
        assert_eq!(self.orchestrator.state(), OrchestratorState::Stopped);
    }
}

#[tokio::test]
async fn test_bootstrap_syncs_every_enabled_schema() {
    let repo = Arc::new(
        MockRepository::new()
            .with_schema("master", enabled(&["base"]))
            .with_schema("alpha", enabled(&["a1", "a2"]))
            .with_schema("beta", enabled(&["b1"]))
            .with_schema("off", RepositorySnapshot::new(vec![], None)),
    );
    let cluster = Arc::new(MockCluster::new());
    let orch = orchestrator(&repo, &cluster, &EventRouter::new(), fast_config());

    let outcomes = orch.bootstrap().await;

    assert_eq!(
        outcomes.keys().cloned().collect::<Vec<_>>(),
        vec!["alpha", "beta", "off"]
    );
    assert_eq!(outcomes["off"], BranchOutcome::Disabled);
    assert_eq!(cluster.names("alpha", ResourceType::Th2Box), vec!["a1", "a2"]);
    assert_eq!(cluster.names("beta", ResourceType::Th2Box), vec!["b1"]);
    assert_eq!(repo.snapshot_calls("master"), 0);
    assert!(!cluster.has_namespace("master"));
    assert!(!cluster.has_namespace("off"));
}

#[tokio::test]
async fn test_bootstrap_parallelism_is_bounded() {
    let mut repo = MockRepository::new();
    for i in 0..8 {
        repo = repo.with_schema(&format!("schema-{}", i), enabled(&["codec"]));
    }
    repo.set_delay(Duration::from_millis(50));
    let repo = Arc::new(repo);
    let cluster = Arc::new(MockCluster::new());
    let config = EngineConfig {
        sync_parallelism: 2,
        ..fast_config()
    };
    let orch = orchestrator(&repo, &cluster, &EventRouter::new(), config);

    let outcomes = orch.bootstrap().await;

    assert_eq!(outcomes.len(), 8);
    assert_eq!(repo.max_in_flight(), 2);
}

#[tokio::test]
async fn test_failing_schema_does_not_affect_others() {
    let repo = Arc::new(
        MockRepository::new()
            .with_schema("broken", enabled(&["x"]))
            .with_schema("healthy", enabled(&["y"])),
    );
    repo.fail_schema("broken");
    let cluster = Arc::new(MockCluster::new());
    let orch = orchestrator(&repo, &cluster, &EventRouter::new(), fast_config());

    let outcomes = orch.bootstrap().await;

    assert!(outcomes["broken"].is_failed());
    assert!(matches!(outcomes["healthy"], BranchOutcome::Synced(_)));
    assert_eq!(cluster.names("healthy", ResourceType::Th2Box), vec!["y"]);
}

#[tokio::test]
async fn test_listing_failure_skips_bootstrap_but_keeps_running() {
    let repo = Arc::new(MockRepository::new().with_schema("demo", enabled(&["codec"])));
    repo.fail_listing(true);
    let cluster = Arc::new(MockCluster::new());
    let router = EventRouter::new();
    let orch = orchestrator(&repo, &cluster, &router, fast_config());

    let running = Running::start(orch).await;
    assert_eq!(cluster.object_count("demo"), 0);

    router.publish(RepositoryUpdateEvent::external("demo"));
    wait_until("event-driven sync", || cluster.object_count("demo") == 1).await;

    running.stop().await;
}

#[tokio::test]
async fn test_external_events_trigger_sync() {
    let repo = Arc::new(MockRepository::new().with_schema("demo", enabled(&["codec"])));
    let cluster = Arc::new(MockCluster::new());
    let router = EventRouter::new();
    let orch = orchestrator(&repo, &cluster, &router, fast_config());

    let running = Running::start(orch).await;
    assert_eq!(cluster.names("demo", ResourceType::Th2Box), vec!["codec"]);

    // A new definition lands in the branch
    repo.set_snapshot("demo", enabled(&["codec", "router"]));
    router.publish(RepositoryUpdateEvent::external("demo"));
    wait_until("router created", || {
        cluster.get("demo", ResourceType::Th2Box, "router").is_some()
    })
    .await;

    // And is removed again
    repo.set_snapshot("demo", enabled(&["router"]));
    router.publish(RepositoryUpdateEvent::external("demo"));
    wait_until("codec deleted", || {
        cluster.get("demo", ResourceType::Th2Box, "codec").is_none()
    })
    .await;

    running.stop().await;
}

#[tokio::test]
async fn test_self_generated_events_are_ignored() {
    let repo = Arc::new(MockRepository::new().with_schema("demo", enabled(&["codec"])));
    let cluster = Arc::new(MockCluster::new());
    let router = EventRouter::new();
    let orch = orchestrator(&repo, &cluster, &router, fast_config());

    let running = Running::start(orch).await;
    let after_bootstrap = repo.snapshot_calls("demo");

    router.publish(RepositoryUpdateEvent::self_generated("demo"));
    router.publish(RepositoryUpdateEvent::external("master"));
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(repo.snapshot_calls("demo"), after_bootstrap);
    assert_eq!(repo.snapshot_calls("master"), 0);
    assert!(running.orchestrator.queue().is_empty());

    running.stop().await;
}

#[tokio::test]
async fn test_failed_job_completes_and_does_not_block_others() {
    let repo = Arc::new(
        MockRepository::new()
            .with_schema("broken", enabled(&["x"]))
            .with_schema("healthy", enabled(&["y"])),
    );
    repo.fail_schema("broken");
    let cluster = Arc::new(MockCluster::new());
    let router = EventRouter::new();
    let orch = orchestrator(&repo, &cluster, &router, fast_config());

    let running = Running::start(orch).await;
    let queue = running.orchestrator.queue().clone();
    let broken_runs = repo.snapshot_calls("broken");

    repo.set_snapshot("healthy", enabled(&["y", "z"]));
    router.publish(RepositoryUpdateEvent::external("broken"));
    router.publish(RepositoryUpdateEvent::external("healthy"));

    wait_until("healthy converged", || {
        cluster.names("healthy", ResourceType::Th2Box) == vec!["y", "z"]
    })
    .await;
    wait_until("both jobs completed", || {
        repo.snapshot_calls("broken") > broken_runs
            && queue.status("broken").is_none()
            && queue.status("healthy").is_none()
    })
    .await;
    assert_eq!(cluster.object_count("broken"), 0);

    // The failed schema is still accepted once it recovers
    repo.recover_schema("broken");
    router.publish(RepositoryUpdateEvent::external("broken"));
    wait_until("broken reconciled", || {
        cluster.names("broken", ResourceType::Th2Box) == vec!["x"]
    })
    .await;

    running.stop().await;
}

#[tokio::test]
async fn test_event_bursts_coalesce() {
    let repo = Arc::new(MockRepository::new().with_schema("demo", enabled(&["codec"])));
    let cluster = Arc::new(MockCluster::new());
    let router = EventRouter::new();
    let orch = orchestrator(&repo, &cluster, &router, fast_config());

    let running = Running::start(orch).await;
    let after_bootstrap = repo.snapshot_calls("demo");
    repo.set_delay(Duration::from_millis(100));

    for _ in 0..10 {
        router.publish(RepositoryUpdateEvent::external("demo"));
    }
    wait_until("burst processed", || {
        repo.snapshot_calls("demo") > after_bootstrap
            && running.orchestrator.queue().status("demo").is_none()
    })
    .await;

    let runs = repo.snapshot_calls("demo") - after_bootstrap;
    assert!((1..=2).contains(&runs), "expected at most 2 runs, got {}", runs);

    running.stop().await;
}

#[tokio::test]
async fn test_custom_event_filter() {
    let repo = Arc::new(MockRepository::new().with_schema("demo", enabled(&["codec"])));
    let cluster = Arc::new(MockCluster::new());
    let router = EventRouter::new();
    let orch = Arc::new(
        SyncOrchestrator::new(fast_config(), repo.clone(), cluster.clone(), router.clone())
            .unwrap()
            .with_event_filter(|_| true),
    );

    let running = Running::start(orch).await;
    let after_bootstrap = repo.snapshot_calls("demo");

    router.publish(RepositoryUpdateEvent::self_generated("demo"));
    wait_until("self-generated event accepted", || {
        repo.snapshot_calls("demo") > after_bootstrap
    })
    .await;

    running.stop().await;
}

#[tokio::test]
async fn test_shutdown_during_bootstrap() {
    let repo = MockRepository::new().with_schema("slow", enabled(&["codec"]));
    repo.set_delay(Duration::from_secs(30));
    let repo = Arc::new(repo);
    let cluster = Arc::new(MockCluster::new());
    let orch = orchestrator(&repo, &cluster, &EventRouter::new(), fast_config());

    let (shutdown, rx) = watch::channel(false);
    let handle = {
        let orch = orch.clone();
        tokio::spawn(async move { orch.run(rx).await })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(orch.state(), OrchestratorState::Bootstrapping);
    shutdown.send(true).unwrap();

    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("stop within timeout")
        .unwrap();
    assert_eq!(orch.state(), OrchestratorState::Stopped);
}

#[test]
fn test_invalid_config_rejected() {
    let config = EngineConfig {
        worker_count: 0,
        ..Default::default()
    };
    let result = SyncOrchestrator::new(
        config,
        Arc::new(MockRepository::new()),
        Arc::new(MockCluster::new()),
        EventRouter::new(),
    );
    assert!(result.is_err());
}
