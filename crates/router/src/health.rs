//! Health monitor — per-service health scores behind a time-boxed cache.
//!
//! A cached record younger than the TTL is returned unchanged; anything older
//! (or missing) triggers a probe through the injected [`HealthProbe`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use switchboard_core::service::Service;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, warn};

/// A service is healthy when its score is strictly above this.
pub const HEALTHY_THRESHOLD: f32 = 0.5;

/// Produces a fresh health score in [0.0, 1.0] for a service.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    async fn probe(&self, service: &str) -> f32;
}

/// Reports the same score for every service.
pub struct StaticProbe {
    score: f32,
}

impl StaticProbe {
    pub fn new(score: f32) -> Self {
        Self {
            score: score.clamp(0.0, 1.0),
        }
    }
}

impl Default for StaticProbe {
    fn default() -> Self {
        Self::new(1.0)
    }
}

#[async_trait]
impl HealthProbe for StaticProbe {
    async fn probe(&self, _service: &str) -> f32 {
        self.score
    }
}

/// Asks each registered [`Service`] for its own health.
///
/// Unknown services, errors, and probes slower than `timeout` score 0.0.
pub struct ServiceProbe {
    services: HashMap<String, Arc<dyn Service>>,
    timeout: Duration,
}

impl ServiceProbe {
    pub fn new(timeout: Duration) -> Self {
        Self {
            services: HashMap::new(),
            timeout,
        }
    }

    pub fn register(&mut self, service: Arc<dyn Service>) {
        self.services.insert(service.name().to_string(), service);
    }
}

#[async_trait]
impl HealthProbe for ServiceProbe {
    async fn probe(&self, service: &str) -> f32 {
        let Some(handle) = self.services.get(service) else {
            warn!(service, "Health probe: no handle registered");
            return 0.0;
        };
        match tokio::time::timeout(self.timeout, handle.health_check()).await {
            Ok(Ok(score)) => score.clamp(0.0, 1.0),
            Ok(Err(e)) => {
                warn!(service, error = %e, "Health probe failed");
                0.0
            }
            Err(_) => {
                warn!(service, timeout_ms = self.timeout.as_millis() as u64, "Health probe timed out");
                0.0
            }
        }
    }
}

/// Cached health of one service.
#[derive(Debug, Clone)]
pub struct HealthRecord {
    pub score: f32,
    pub checked_at: DateTime<Utc>,
    probed_at: Instant,
}

impl HealthRecord {
    pub fn is_healthy(&self) -> bool {
        self.score > HEALTHY_THRESHOLD
    }

    fn status(&self) -> HealthStatus {
        HealthStatus {
            healthy: self.is_healthy(),
            score: self.score,
            checked_at: self.checked_at,
        }
    }
}

/// What `health_of` reports.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HealthStatus {
    pub healthy: bool,
    pub score: f32,
    /// When the score was last refreshed.
    pub checked_at: DateTime<Utc>,
}

/// Owns the per-service health cache; nothing else writes to it.
pub struct HealthMonitor {
    ttl: Duration,
    probe: Arc<dyn HealthProbe>,
    records: RwLock<HashMap<String, HealthRecord>>,
}

impl HealthMonitor {
    pub fn new(probe: Arc<dyn HealthProbe>, ttl: Duration) -> Self {
        Self {
            ttl,
            probe,
            records: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Current health of `service`, probing if the cached record is stale.
    pub async fn health_of(&self, service: &str) -> HealthStatus {
        if let Some(record) = self.records.read().await.get(service) {
            if record.probed_at.elapsed() < self.ttl {
                return record.status();
            }
        }

        let score = self.probe.probe(service).await.clamp(0.0, 1.0);
        let record = HealthRecord {
            score,
            checked_at: Utc::now(),
            probed_at: Instant::now(),
        };
        debug!(service, score, "Health record refreshed");
        let status = record.status();
        self.records.write().await.insert(service.to_string(), record);
        status
    }

    /// Drop the cached record so the next query re-probes.
    pub async fn invalidate(&self, service: &str) {
        self.records.write().await.remove(service);
    }

    /// Copy of every cached record.
    pub async fn snapshot(&self) -> HashMap<String, HealthRecord> {
        self.records.read().await.clone()
    }
}
