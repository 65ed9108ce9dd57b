//! End-to-end integration tests for the Switchboard router and memory store.
//!
//! These tests exercise the full pipeline from request text to routing
//! result: analysis, capability scoring, health gating, one-hop fallback,
//! and the memory store behind its service and tool adapters.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use switchboard_config::{AppConfig, ServiceKind};
use switchboard_core::error::ServiceError;
use switchboard_core::memory::MemoryCategory;
use switchboard_core::service::{Service, ServiceRequest};
use switchboard_core::tool::ToolCall;
use switchboard_memory::{MemoryService, MemoryStore};
use switchboard_router::{CapabilityRegistry, HealthMonitor, HealthProbe, Router};
use switchboard_tools::default_registry;

// ── Mock Services ────────────────────────────────────────────────────────

/// A downstream stand-in that either answers or fails, counting calls.
struct StubService {
    name: String,
    fail: bool,
    call_count: Mutex<usize>,
}

impl StubService {
    fn ok(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            fail: false,
            call_count: Mutex::new(0),
        })
    }

    fn failing(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            fail: true,
            call_count: Mutex::new(0),
        })
    }

    fn calls(&self) -> usize {
        *self.call_count.lock().unwrap()
    }
}

#[async_trait::async_trait]
impl Service for StubService {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(&self, request: &ServiceRequest) -> Result<serde_json::Value, ServiceError> {
        *self.call_count.lock().unwrap() += 1;
        if self.fail {
            return Err(ServiceError::InvocationFailed {
                service: self.name.clone(),
                message: "connection reset".into(),
            });
        }
        Ok(serde_json::json!({ "handledBy": self.name, "echo": request.text }))
    }
}

/// Health scores by service name; unlisted services are fully healthy.
struct ScriptedProbe(HashMap<String, f32>);

impl ScriptedProbe {
    fn with(scores: &[(&str, f32)]) -> Arc<Self> {
        Arc::new(Self(
            scores.iter().map(|(n, s)| (n.to_string(), *s)).collect(),
        ))
    }
}

#[async_trait::async_trait]
impl HealthProbe for ScriptedProbe {
    async fn probe(&self, service: &str) -> f32 {
        self.0.get(service).copied().unwrap_or(1.0)
    }
}

// ── Harness ──────────────────────────────────────────────────────────────

struct Harness {
    router: Router,
    store: Arc<MemoryStore>,
    stubs: HashMap<String, Arc<StubService>>,
    _tmp: tempfile::TempDir,
}

impl Harness {
    fn stub(&self, name: &str) -> &StubService {
        &self.stubs[name]
    }
}

/// Default service table, the real memory store, and stubs for HTTP services.
fn harness(probe: Arc<ScriptedProbe>, failing: &[&str]) -> Harness {
    let tmp = tempfile::tempdir().unwrap();
    let mut config = AppConfig::default();
    config.memory.data_dir = tmp.path().to_path_buf();

    let store = Arc::new(switchboard_memory::build_from_config(&config.memory));
    let registry = CapabilityRegistry::new(config.descriptors()).unwrap();
    let mut router = Router::new(registry, HealthMonitor::new(probe, config.health.ttl()))
        .with_invoke_timeout(Duration::from_secs(5));

    let mut stubs = HashMap::new();
    for svc in &config.services {
        match svc.kind {
            ServiceKind::Memory => {
                router.register(Arc::new(MemoryService::new(&svc.name, store.clone())));
            }
            ServiceKind::Http => {
                let stub = if failing.contains(&svc.name.as_str()) {
                    StubService::failing(&svc.name)
                } else {
                    StubService::ok(&svc.name)
                };
                router.register(stub.clone());
                stubs.insert(svc.name.clone(), stub);
            }
        }
    }

    Harness {
        router,
        store,
        stubs,
        _tmp: tmp,
    }
}

// ── E2E: Memory Through the Router ──────────────────────────────────────

#[tokio::test]
async fn e2e_store_then_recall_through_router() {
    let h = harness(ScriptedProbe::with(&[]), &[]);

    let stored = h
        .router
        .route("remember that we fixed the login crash with a retry", None)
        .await;
    assert!(stored.success, "{:?}", stored.error);
    assert_eq!(stored.service_used.as_deref(), Some("memory"));
    assert!(!stored.fallback_used);
    let response = stored.response.unwrap();
    assert_eq!(response["action"], "stored");
    assert_eq!(response["category"], "bug_solution");
    let id = response["id"].as_str().unwrap().to_string();

    let recalled = h.router.route("recall the login crash fix", None).await;
    assert!(recalled.success);
    assert_eq!(recalled.selected_service, "memory");
    let results = recalled.response.unwrap()["results"].clone();
    assert_eq!(results[0]["id"], id);
    assert_eq!(results[0]["content"], "we fixed the login crash with a retry");

    assert_eq!(h.stub("code_analysis").calls(), 0);
    assert_eq!(h.stub("research").calls(), 0);
}

#[tokio::test]
async fn e2e_tools_and_router_share_the_store() {
    let h = harness(ScriptedProbe::with(&[]), &[]);
    let tools = default_registry(h.store.clone());

    let stored = tools
        .execute(&ToolCall {
            id: "call_1".into(),
            name: "store_conversation".into(),
            arguments: serde_json::json!({
                "content": "Schema migrations run before every deploy",
                "category": "architecture",
                "tags": ["deploy"]
            }),
        })
        .await
        .unwrap();
    let id = stored.data.unwrap()["id"].as_str().unwrap().to_string();

    let result = h
        .router
        .route("what do we remember about schema migrations", None)
        .await;
    assert!(result.success);
    assert_eq!(result.service_used.as_deref(), Some("memory"));
    assert_eq!(result.response.unwrap()["results"][0]["id"], id);
}

// ── E2E: Fallback ───────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_failing_code_analysis_falls_back_to_memory() {
    let h = harness(ScriptedProbe::with(&[]), &["code_analysis"]);

    let result = h
        .router
        .route("review this code for security bugs", Some("development"))
        .await;

    assert!(result.success);
    assert_eq!(result.selected_service, "code_analysis");
    assert_eq!(result.service_used.as_deref(), Some("memory"));
    assert!(result.fallback_used);
    assert_eq!(result.response.unwrap()["action"], "recalled");
    assert_eq!(h.stub("code_analysis").calls(), 1);
}

#[tokio::test]
async fn e2e_unhealthy_bi_routes_to_research() {
    let h = harness(ScriptedProbe::with(&[("business_intelligence", 0.0)]), &[]);

    let result = h
        .router
        .route("Show me revenue trends", Some("ceo_deep_research"))
        .await;

    assert!(result.success);
    assert_eq!(result.selected_service, "business_intelligence");
    assert_eq!(result.service_used.as_deref(), Some("research"));
    assert!(result.fallback_used);
    assert_eq!(h.stub("business_intelligence").calls(), 0);
    assert_eq!(h.stub("research").calls(), 1);
}

#[tokio::test]
async fn e2e_fallback_is_a_single_hop() {
    let h = harness(
        ScriptedProbe::with(&[("business_intelligence", 0.0)]),
        &["research"],
    );

    let result = h
        .router
        .route("Show me revenue trends", Some("ceo_deep_research"))
        .await;

    assert!(!result.success);
    assert!(result.fallback_used);
    let error = result.error.unwrap();
    assert!(error.contains("business_intelligence"));
    assert!(error.contains("research"));
    // research's own fallback (memory) is never consulted
    assert_eq!(h.stub("research").calls(), 1);
    assert_eq!(h.store.counts().await.unwrap().iter().map(|(_, n)| n).sum::<usize>(), 0);
}

// ── E2E: Ranking ────────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_rank_explains_selection() {
    let h = harness(ScriptedProbe::with(&[]), &[]);

    let ranked = h.router.rank("Show me revenue trends", Some("business")).await;
    let totals: HashMap<&str, f64> = ranked.iter().map(|s| (s.service.as_str(), s.total)).collect();

    assert_eq!(totals["business_intelligence"], 130.0);
    assert_eq!(totals["research"], 100.0);
    assert_eq!(totals["memory"], 90.0);
    // code_analysis does not serve the business context
    assert_eq!(totals["code_analysis"], 40.0);
}

#[tokio::test]
async fn e2e_concurrent_routes_are_independent() {
    let h = Arc::new(harness(ScriptedProbe::with(&[]), &[]));

    let mut handles = Vec::new();
    for i in 0..10 {
        let h = h.clone();
        handles.push(tokio::spawn(async move {
            h.router
                .route(&format!("remember note number {i} about the workflow"), None)
                .await
        }));
    }
    for handle in handles {
        assert!(handle.await.unwrap().success);
    }

    let workflow = h
        .store
        .counts()
        .await
        .unwrap()
        .into_iter()
        .find(|(c, _)| *c == MemoryCategory::Workflow)
        .unwrap();
    assert_eq!(workflow.1, 10);
}

// ── E2E: Configuration ──────────────────────────────────────────────────

#[tokio::test]
async fn e2e_config_file_drives_the_router() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("config.toml");
    std::fs::write(
        &path,
        format!(
            r#"
[routing]
default_service = "notes"
score_floor = 500.0

[memory]
data_dir = '{}'

[[services]]
name = "notes"
capabilities = ["memory"]
tier = "primary"
kind = "memory"

[[services]]
name = "analysis"
capabilities = ["code_analysis"]
tier = "secondary"
endpoint = "http://127.0.0.1:1"
fallback = "notes"
"#,
            tmp.path().join("memory").display()
        ),
    )
    .unwrap();

    let config = AppConfig::load_from(&path).unwrap();
    let store = Arc::new(switchboard_memory::build_from_config(&config.memory));
    let handles: Vec<Arc<dyn Service>> = vec![Arc::new(MemoryService::new("notes", store))];
    let router = switchboard_router::build_from_config(&config, handles).unwrap();

    // Nothing clears the floor, so the configured default serves the request.
    let result = router.route("review this code", None).await;
    assert!(result.success);
    assert_eq!(result.selected_service, "notes");
    assert_eq!(result.service_used.as_deref(), Some("notes"));
}
