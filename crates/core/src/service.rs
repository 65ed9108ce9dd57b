//! Service trait — the abstraction over routable downstream services.
//!
//! A [`ServiceDescriptor`] is the static, configured description of a service
//! (what it can do, where it applies, where to fall back). A [`Service`] is
//! the live handle the router invokes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::capability::Capability;
use crate::error::ServiceError;
use crate::request::AnalyzedRequest;

/// Context tag that makes a descriptor applicable to every context.
pub const ALL_CONTEXTS: &str = "all";

/// Coarse priority ranking among services. `Primary > Secondary > Tertiary`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Primary,
    Secondary,
    Tertiary,
}

impl Tier {
    /// Numeric rank, higher is better.
    pub fn rank(&self) -> u8 {
        match self {
            Tier::Primary => 3,
            Tier::Secondary => 2,
            Tier::Tertiary => 1,
        }
    }
}

impl PartialOrd for Tier {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Tier {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Primary => f.write_str("primary"),
            Tier::Secondary => f.write_str("secondary"),
            Tier::Tertiary => f.write_str("tertiary"),
        }
    }
}

/// Immutable description of a routable service, created at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    /// Unique identifier
    pub name: String,

    /// What this service can do (deduplicated, declaration order preserved)
    pub capabilities: Vec<Capability>,

    /// Priority tier
    pub tier: Tier,

    /// Contexts this service is appropriate for, or `["all"]`
    #[serde(default)]
    pub contexts: Vec<String>,

    /// The single alternate service invoked when this one fails
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<String>,

    /// Opaque address used to invoke the service
    #[serde(default)]
    pub endpoint: String,
}

impl ServiceDescriptor {
    /// Create a descriptor with no contexts, no fallback and no endpoint.
    pub fn new(name: impl Into<String>, capabilities: Vec<Capability>, tier: Tier) -> Self {
        let mut caps: Vec<Capability> = Vec::with_capacity(capabilities.len());
        for cap in capabilities {
            if !caps.contains(&cap) {
                caps.push(cap);
            }
        }
        Self {
            name: name.into(),
            capabilities: caps,
            tier,
            contexts: Vec::new(),
            fallback: None,
            endpoint: String::new(),
        }
    }

    pub fn with_contexts<I, S>(mut self, contexts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.contexts = contexts.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_fallback(mut self, fallback: impl Into<String>) -> Self {
        self.fallback = Some(fallback.into());
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Whether this service applies to `context` (directly or via the wildcard).
    pub fn applies_to(&self, context: &str) -> bool {
        self.contexts
            .iter()
            .any(|c| c == ALL_CONTEXTS || c == context)
    }

    pub fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }
}

/// The payload handed to a service when the router invokes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceRequest {
    /// The caller's free-text request
    pub text: String,

    /// The analyzer's view of the request
    pub analyzed: AnalyzedRequest,
}

/// A live, invocable downstream service.
///
/// Implementations: memory store adapter, HTTP endpoint adapter,
/// and mocks in tests.
#[async_trait]
pub trait Service: Send + Sync {
    /// The service name; must match its descriptor's name.
    fn name(&self) -> &str;

    /// Perform the request and return the service's payload.
    async fn invoke(&self, request: &ServiceRequest) -> Result<serde_json::Value, ServiceError>;

    /// Report current liveness as a score in [0.0, 1.0].
    async fn health_check(&self) -> Result<f32, ServiceError> {
        Ok(1.0)
    }
}
