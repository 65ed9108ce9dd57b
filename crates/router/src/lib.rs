//! Capability-aware request routing for Switchboard.
//!
//! A request flows analyzer → router → selected service, with the capability
//! registry and health monitor informing selection and a single fallback
//! hop covering failures.

pub mod analyzer;
pub mod health;
pub mod http;
pub mod registry;
pub mod router;

pub use analyzer::analyze;
pub use health::{HealthMonitor, HealthProbe, HealthStatus, ServiceProbe, StaticProbe};
pub use http::HttpService;
pub use registry::CapabilityRegistry;
pub use router::{RouteError, RouteResult, Router, ScoreBreakdown, score};

use std::sync::Arc;
use switchboard_config::{AppConfig, ProbeKind};
use switchboard_core::error::RegistryError;
use switchboard_core::service::Service;

/// Build a router from configuration.
///
/// `handles` supplies the live services; with the `service` probe they are
/// also asked for their own health.
pub fn build_from_config(
    config: &AppConfig,
    handles: Vec<Arc<dyn Service>>,
) -> Result<Router, RegistryError> {
    let registry = CapabilityRegistry::new(config.descriptors())?;

    let probe: Arc<dyn HealthProbe> = match config.health.probe {
        ProbeKind::Static => Arc::new(StaticProbe::new(config.health.static_score)),
        ProbeKind::Service => {
            let mut probe = ServiceProbe::new(config.routing.invoke_timeout());
            for handle in &handles {
                probe.register(handle.clone());
            }
            Arc::new(probe)
        }
    };

    let mut router = Router::new(registry, HealthMonitor::new(probe, config.health.ttl()))
        .with_default_service(config.routing.default_service.clone())
        .with_default_context(config.routing.default_context.clone())
        .with_score_floor(config.routing.score_floor)
        .with_invoke_timeout(config.routing.invoke_timeout());

    for handle in handles {
        router.register(handle);
    }

    Ok(router)
}
