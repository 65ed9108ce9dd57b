//! Service router — scores every registered service against an analyzed
//! request, invokes the winner, and on failure walks the fallback chain
//! exactly one hop.
//!
//! Selection is proactive (context, capability, tier, and health scoring);
//! recovery is reactive (one fallback invocation). There is no retry loop:
//! a failed fallback is terminal for the request.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use switchboard_core::error::ServiceError;
use switchboard_core::request::{AnalyzedRequest, DEFAULT_CONTEXT};
use switchboard_core::service::{Service, ServiceDescriptor, ServiceRequest, Tier};
use tracing::{debug, info, warn};

use crate::analyzer::analyze;
use crate::health::HealthMonitor;
use crate::registry::CapabilityRegistry;

pub const CONTEXT_MATCH_POINTS: f64 = 50.0;
pub const CAPABILITY_POINTS: f64 = 20.0;
pub const HEALTH_POINTS: f64 = 10.0;

/// Points awarded for a descriptor's tier.
pub fn tier_points(tier: Tier) -> f64 {
    match tier {
        Tier::Primary => 30.0,
        Tier::Secondary => 20.0,
        Tier::Tertiary => 0.0,
    }
}

/// How one descriptor scored against one request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub service: String,
    pub context: f64,
    pub capability: f64,
    pub tier: f64,
    pub health: f64,
    pub total: f64,
}

/// Score `descriptor` for `request` given its current health score.
///
/// Pure: the same inputs always produce the same breakdown.
pub fn score(
    descriptor: &ServiceDescriptor,
    request: &AnalyzedRequest,
    health_score: f32,
) -> ScoreBreakdown {
    let context = if descriptor.applies_to(&request.context) {
        CONTEXT_MATCH_POINTS
    } else {
        0.0
    };
    let overlap = request
        .required_capabilities
        .iter()
        .filter(|cap| descriptor.has_capability(**cap))
        .count();
    let capability = CAPABILITY_POINTS * overlap as f64;
    let tier = tier_points(descriptor.tier);
    let health = HEALTH_POINTS * f64::from(health_score.clamp(0.0, 1.0));

    ScoreBreakdown {
        service: descriptor.name.clone(),
        context,
        capability,
        tier,
        health,
        total: context + capability + tier + health,
    }
}

/// Why a request could not be served.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RouteError {
    #[error("Service '{service}' failed ({reason}) and has no fallback")]
    NoFallback { service: String, reason: String },

    #[error("Service '{service}' failed ({reason}); fallback '{fallback}' also failed ({fallback_reason})")]
    FallbackFailed {
        service: String,
        reason: String,
        fallback: String,
        fallback_reason: String,
    },
}

impl RouteError {
    /// The originally selected service.
    pub fn service(&self) -> &str {
        match self {
            RouteError::NoFallback { service, .. } | RouteError::FallbackFailed { service, .. } => {
                service
            }
        }
    }
}

/// Outcome of a single `route` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteResult {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<serde_json::Value>,

    /// The service whose payload is returned
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_used: Option<String>,

    /// The service chosen by scoring
    pub selected_service: String,

    pub fallback_used: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RouteResult {
    fn served(selected: &str, used: &str, payload: serde_json::Value, fallback_used: bool) -> Self {
        Self {
            success: true,
            response: Some(payload),
            service_used: Some(used.to_string()),
            selected_service: selected.to_string(),
            fallback_used,
            error: None,
        }
    }

    fn failed(error: RouteError, fallback_used: bool) -> Self {
        Self {
            success: false,
            response: None,
            service_used: None,
            selected_service: error.service().to_string(),
            fallback_used,
            error: Some(error.to_string()),
        }
    }
}

/// Routes free-text requests to registered services.
///
/// Holds no per-request state, so concurrent `route` calls need no locking
/// beyond the health monitor's own cache.
pub struct Router {
    registry: CapabilityRegistry,
    health: HealthMonitor,
    services: HashMap<String, Arc<dyn Service>>,
    default_service: String,
    default_context: String,
    score_floor: f64,
    invoke_timeout: Duration,
}

impl Router {
    pub fn new(registry: CapabilityRegistry, health: HealthMonitor) -> Self {
        Self {
            registry,
            health,
            services: HashMap::new(),
            default_service: "memory".into(),
            default_context: DEFAULT_CONTEXT.into(),
            score_floor: 0.0,
            invoke_timeout: Duration::from_secs(30),
        }
    }

    /// Service selected when nothing scores above the floor.
    pub fn with_default_service(mut self, name: impl Into<String>) -> Self {
        self.default_service = name.into();
        self
    }

    pub fn with_default_context(mut self, context: impl Into<String>) -> Self {
        self.default_context = context.into();
        self
    }

    pub fn with_score_floor(mut self, floor: f64) -> Self {
        self.score_floor = floor;
        self
    }

    pub fn with_invoke_timeout(mut self, timeout: Duration) -> Self {
        self.invoke_timeout = timeout;
        self
    }

    /// Register the live handle for a service. Replaces any previous handle.
    pub fn register(&mut self, service: Arc<dyn Service>) {
        self.services.insert(service.name().to_string(), service);
    }

    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    pub fn health(&self) -> &HealthMonitor {
        &self.health
    }

    /// Score every registered service for `text`, in registry order.
    pub async fn rank(&self, text: &str, context: Option<&str>) -> Vec<ScoreBreakdown> {
        let analyzed = analyze(text, Some(context.unwrap_or(&self.default_context)));
        self.scores(&analyzed).await
    }

    async fn scores(&self, analyzed: &AnalyzedRequest) -> Vec<ScoreBreakdown> {
        let mut scores = Vec::with_capacity(self.registry.len());
        for descriptor in self.registry.all_services() {
            let health = self.health.health_of(&descriptor.name).await;
            scores.push(score(descriptor, analyzed, health.score));
        }
        scores
    }

    /// Pick the strictly highest scorer; the earliest registered wins ties.
    async fn select(&self, analyzed: &AnalyzedRequest) -> String {
        let mut best: Option<ScoreBreakdown> = None;
        for candidate in self.scores(analyzed).await {
            if candidate.total <= self.score_floor {
                continue;
            }
            if best.as_ref().is_none_or(|b| candidate.total > b.total) {
                best = Some(candidate);
            }
        }

        match best {
            Some(winner) => {
                debug!(service = %winner.service, score = winner.total, "Selected service");
                winner.service
            }
            None => {
                debug!(service = %self.default_service, "No service above floor, using default");
                self.default_service.clone()
            }
        }
    }

    async fn invoke(
        &self,
        name: &str,
        request: &ServiceRequest,
        deadline: Duration,
    ) -> Result<serde_json::Value, ServiceError> {
        let service = self
            .services
            .get(name)
            .ok_or_else(|| ServiceError::NotRegistered(name.to_string()))?;

        match tokio::time::timeout(deadline, service.invoke(request)).await {
            Ok(result) => result,
            Err(_) => Err(ServiceError::Timeout {
                service: name.to_string(),
                timeout_ms: deadline.as_millis() as u64,
            }),
        }
    }

    /// Route with the configured invocation deadline.
    pub async fn route(&self, text: &str, context: Option<&str>) -> RouteResult {
        self.route_with_deadline(text, context, self.invoke_timeout).await
    }

    /// Route, bounding each service invocation by `deadline`.
    ///
    /// At most two services are invoked: the selected one and its fallback.
    pub async fn route_with_deadline(
        &self,
        text: &str,
        context: Option<&str>,
        deadline: Duration,
    ) -> RouteResult {
        let analyzed = analyze(text, Some(context.unwrap_or(&self.default_context)));
        let selected = self.select(&analyzed).await;
        let request = ServiceRequest {
            text: text.to_string(),
            analyzed,
        };

        let health = self.health.health_of(&selected).await;
        let reason = if health.healthy {
            match self.invoke(&selected, &request, deadline).await {
                Ok(payload) => {
                    info!(service = %selected, "Request served");
                    return RouteResult::served(&selected, &selected, payload, false);
                }
                Err(e) => {
                    warn!(service = %selected, error = %e, "Service invocation failed");
                    e.to_string()
                }
            }
        } else {
            warn!(service = %selected, score = health.score, "Selected service is unhealthy");
            format!("unhealthy, score {:.2}", health.score)
        };

        let Some(fallback) = self
            .registry
            .lookup(&selected)
            .and_then(|d| d.fallback.clone())
        else {
            return RouteResult::failed(
                RouteError::NoFallback {
                    service: selected,
                    reason,
                },
                false,
            );
        };

        info!(service = %selected, fallback = %fallback, "Invoking fallback");
        match self.invoke(&fallback, &request, deadline).await {
            Ok(payload) => RouteResult::served(&selected, &fallback, payload, true),
            Err(e) => {
                warn!(fallback = %fallback, error = %e, "Fallback invocation failed");
                RouteResult::failed(
                    RouteError::FallbackFailed {
                        service: selected,
                        reason,
                        fallback,
                        fallback_reason: e.to_string(),
                    },
                    true,
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::{HealthProbe, StaticProbe};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use switchboard_core::capability::Capability;

    /// A mock service with a scripted outcome and a call counter.
    struct MockService {
        name: String,
        fail: bool,
        call_count: Mutex<usize>,
    }

    impl MockService {
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

    #[async_trait]
    impl Service for MockService {
        fn name(&self) -> &str {
            &self.name
        }

        async fn invoke(&self, request: &ServiceRequest) -> Result<serde_json::Value, ServiceError> {
            *self.call_count.lock().unwrap() += 1;
            if self.fail {
                Err(ServiceError::InvocationFailed {
                    service: self.name.clone(),
                    message: "boom".into(),
                })
            } else {
                Ok(serde_json::json!({ "from": self.name, "text": request.text }))
            }
        }
    }

    /// A mock service that never answers.
    struct HangingService;

    #[async_trait]
    impl Service for HangingService {
        fn name(&self) -> &str {
            "hanging"
        }

        async fn invoke(&self, _request: &ServiceRequest) -> Result<serde_json::Value, ServiceError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            unreachable!()
        }
    }

    /// Scripted per-service health; unknown services are fully healthy.
    struct ScriptedProbe(HashMap<String, f32>);

    #[async_trait]
    impl HealthProbe for ScriptedProbe {
        async fn probe(&self, service: &str) -> f32 {
            self.0.get(service).copied().unwrap_or(1.0)
        }
    }

    fn memory_svc(name: &str, tier: Tier, fallback: Option<&str>) -> ServiceDescriptor {
        let d = ServiceDescriptor::new(name, vec![Capability::Memory], tier).with_contexts(["all"]);
        match fallback {
            Some(f) => d.with_fallback(f),
            None => d,
        }
    }

    fn router(services: Vec<ServiceDescriptor>, health: &[(&str, f32)]) -> Router {
        let probe = ScriptedProbe(health.iter().map(|(k, v)| (k.to_string(), *v)).collect());
        Router::new(
            CapabilityRegistry::new(services).unwrap(),
            HealthMonitor::new(Arc::new(probe), Duration::from_secs(30)),
        )
    }

    #[test]
    fn score_components() {
        let d = ServiceDescriptor::new(
            "bi",
            vec![Capability::BusinessIntelligence, Capability::Research],
            Tier::Secondary,
        )
        .with_contexts(["business"]);
        let req = analyze("research revenue trends", Some("business"));
        let s = score(&d, &req, 0.5);
        assert_eq!(s.context, 50.0);
        assert_eq!(s.capability, 40.0);
        assert_eq!(s.tier, 20.0);
        assert_eq!(s.health, 5.0);
        assert_eq!(s.total, 115.0);
    }

    #[test]
    fn score_is_deterministic() {
        let d = memory_svc("m", Tier::Primary, None);
        let req = analyze("remember this", None);
        assert_eq!(score(&d, &req, 0.7), score(&d, &req, 0.7));
    }

    #[test]
    fn tertiary_scores_nothing_for_tier() {
        assert_eq!(tier_points(Tier::Tertiary), 0.0);
        assert!(tier_points(Tier::Primary) > tier_points(Tier::Secondary));
    }

    #[tokio::test]
    async fn unhealthy_primary_executes_via_fallback() {
        let mut r = router(
            vec![
                memory_svc("A", Tier::Primary, Some("B")),
                memory_svc("B", Tier::Secondary, None),
            ],
            &[("A", 0.0)],
        );
        let a = MockService::ok("A");
        let b = MockService::ok("B");
        r.register(a.clone());
        r.register(b.clone());

        let result = r.route("remember this", Some("general")).await;
        assert!(result.success);
        assert_eq!(result.selected_service, "A");
        assert_eq!(result.service_used.as_deref(), Some("B"));
        assert!(result.fallback_used);
        assert_eq!(a.calls(), 0);
        assert_eq!(b.calls(), 1);
    }

    #[tokio::test]
    async fn healthy_success_never_uses_fallback() {
        let mut r = router(
            vec![
                memory_svc("A", Tier::Primary, Some("B")),
                memory_svc("B", Tier::Secondary, None),
            ],
            &[],
        );
        let a = MockService::ok("A");
        let b = MockService::ok("B");
        r.register(a.clone());
        r.register(b.clone());

        let result = r.route("remember this", None).await;
        assert!(result.success);
        assert!(!result.fallback_used);
        assert_eq!(result.service_used.as_deref(), Some("A"));
        assert_eq!(result.response.unwrap()["from"], "A");
        assert_eq!(b.calls(), 0);
    }

    #[tokio::test]
    async fn invocation_failure_uses_fallback() {
        let mut r = router(
            vec![
                memory_svc("A", Tier::Primary, Some("B")),
                memory_svc("B", Tier::Secondary, None),
            ],
            &[],
        );
        let a = MockService::failing("A");
        let b = MockService::ok("B");
        r.register(a.clone());
        r.register(b.clone());

        let result = r.route("remember this", None).await;
        assert!(result.success);
        assert!(result.fallback_used);
        assert_eq!(a.calls(), 1);
        assert_eq!(b.calls(), 1);
    }

    #[tokio::test]
    async fn fallback_is_one_hop_only() {
        let mut r = router(
            vec![
                memory_svc("A", Tier::Primary, Some("B")),
                memory_svc("B", Tier::Secondary, Some("C")),
                memory_svc("C", Tier::Tertiary, None),
            ],
            &[],
        );
        let a = MockService::failing("A");
        let b = MockService::failing("B");
        let c = MockService::ok("C");
        r.register(a.clone());
        r.register(b.clone());
        r.register(c.clone());

        let result = r.route("remember this", None).await;
        assert!(!result.success);
        assert!(result.fallback_used);
        assert_eq!(a.calls() + b.calls() + c.calls(), 2);
        assert_eq!(c.calls(), 0);
        let error = result.error.unwrap();
        assert!(error.contains("'A'"));
        assert!(error.contains("'B'"));
    }

    #[tokio::test]
    async fn fallback_is_not_health_checked() {
        let mut r = router(
            vec![
                memory_svc("A", Tier::Primary, Some("B")),
                memory_svc("B", Tier::Secondary, None),
            ],
            &[("A", 0.0), ("B", 0.0)],
        );
        let b = MockService::ok("B");
        r.register(MockService::ok("A"));
        r.register(b.clone());

        let result = r.route("remember this", None).await;
        assert!(result.success);
        assert_eq!(b.calls(), 1);
    }

    #[tokio::test]
    async fn no_fallback_reports_selected_service() {
        let mut r = router(vec![memory_svc("A", Tier::Primary, None)], &[]);
        r.register(MockService::failing("A"));

        let result = r.route("remember this", None).await;
        assert!(!result.success);
        assert!(!result.fallback_used);
        assert_eq!(result.selected_service, "A");
        assert!(result.service_used.is_none());
        assert!(result.error.unwrap().contains("no fallback"));
    }

    #[tokio::test]
    async fn missing_handle_is_an_invocation_failure() {
        let mut r = router(
            vec![
                memory_svc("A", Tier::Primary, Some("B")),
                memory_svc("B", Tier::Secondary, None),
            ],
            &[],
        );
        let b = MockService::ok("B");
        r.register(b.clone());

        let result = r.route("remember this", None).await;
        assert!(result.success);
        assert!(result.fallback_used);
    }

    #[tokio::test]
    async fn ties_go_to_first_registered() {
        let forward = {
            let mut r = router(
                vec![memory_svc("X", Tier::Primary, None), memory_svc("Y", Tier::Primary, None)],
                &[],
            );
            r.register(MockService::ok("X"));
            r.register(MockService::ok("Y"));
            r.route("remember", None).await
        };
        let reversed = {
            let mut r = router(
                vec![memory_svc("Y", Tier::Primary, None), memory_svc("X", Tier::Primary, None)],
                &[],
            );
            r.register(MockService::ok("X"));
            r.register(MockService::ok("Y"));
            r.route("remember", None).await
        };
        assert_eq!(forward.selected_service, "X");
        assert_eq!(reversed.selected_service, "Y");
    }

    #[tokio::test]
    async fn capabilities_and_context_drive_selection() {
        let mut r = router(
            vec![
                memory_svc("memory", Tier::Primary, None),
                ServiceDescriptor::new("bi", vec![Capability::BusinessIntelligence], Tier::Primary)
                    .with_contexts(["business"]),
            ],
            &[],
        );
        r.register(MockService::ok("memory"));
        r.register(MockService::ok("bi"));

        let result = r.route("Show me revenue for Q2", Some("business")).await;
        assert_eq!(result.selected_service, "bi");
    }

    #[tokio::test]
    async fn empty_registry_uses_default_service() {
        let mut r = router(vec![], &[]).with_default_service("memory");
        let memory = MockService::ok("memory");
        r.register(memory.clone());

        let result = r.route("anything at all", None).await;
        assert!(result.success);
        assert_eq!(result.service_used.as_deref(), Some("memory"));
        assert_eq!(memory.calls(), 1);
    }

    #[tokio::test]
    async fn floor_forces_default_service() {
        let mut r = router(
            vec![memory_svc("A", Tier::Primary, None), memory_svc("memory", Tier::Tertiary, None)],
            &[],
        )
        .with_score_floor(1_000.0);
        r.register(MockService::ok("A"));
        r.register(MockService::ok("memory"));

        let result = r.route("remember", None).await;
        assert_eq!(result.selected_service, "memory");
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_exceeded_triggers_fallback() {
        let mut r = router(
            vec![
                memory_svc("hanging", Tier::Primary, Some("B")),
                memory_svc("B", Tier::Secondary, None),
            ],
            &[],
        );
        r.register(Arc::new(HangingService));
        let b = MockService::ok("B");
        r.register(b.clone());

        let result = r
            .route_with_deadline("remember", None, Duration::from_millis(50))
            .await;
        assert!(result.success);
        assert!(result.fallback_used);
        assert_eq!(b.calls(), 1);
    }

    #[tokio::test]
    async fn rank_lists_every_service_in_order() {
        let r = router(
            vec![memory_svc("A", Tier::Primary, None), memory_svc("B", Tier::Tertiary, None)],
            &[],
        );
        let ranked = r.rank("remember", None).await;
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].service, "A");
        assert_eq!(ranked[0].total, 110.0);
        assert_eq!(ranked[1].total, 80.0);
    }

    #[tokio::test]
    async fn independent_routers_do_not_share_health() {
        let a = Router::new(
            CapabilityRegistry::new(vec![memory_svc("A", Tier::Primary, None)]).unwrap(),
            HealthMonitor::new(Arc::new(StaticProbe::new(0.2)), Duration::from_secs(30)),
        );
        let b = Router::new(
            CapabilityRegistry::new(vec![memory_svc("A", Tier::Primary, None)]).unwrap(),
            HealthMonitor::new(Arc::new(StaticProbe::new(0.9)), Duration::from_secs(30)),
        );
        assert!(!a.health().health_of("A").await.healthy);
        assert!(b.health().health_of("A").await.healthy);
    }

    #[test]
    fn result_payload_shape() {
        let result = RouteResult::failed(
            RouteError::NoFallback {
                service: "A".into(),
                reason: "boom".into(),
            },
            false,
        );
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["fallbackUsed"], false);
        assert!(json.get("response").is_none());
        assert!(json["error"].as_str().unwrap().contains("'A'"));
    }
}
