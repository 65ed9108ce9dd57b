//! Configuration loading, validation, and management for Switchboard.
//!
//! Loads configuration from `~/.switchboard/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use switchboard_core::capability::Capability;
use switchboard_core::service::{ServiceDescriptor, Tier};

/// The root configuration structure.
///
/// Maps directly to `~/.switchboard/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Routing behavior
    #[serde(default)]
    pub routing: RoutingConfig,

    /// Health monitor behavior
    #[serde(default)]
    pub health: HealthConfig,

    /// Memory store configuration
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Registered services, in registration (tie-break) order
    #[serde(default = "default_services")]
    pub services: Vec<ServiceConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Service used when nothing scores above `score_floor`
    #[serde(default = "default_service_name")]
    pub default_service: String,

    /// Context assumed when the caller supplies none
    #[serde(default = "default_context")]
    pub default_context: String,

    /// A descriptor must score strictly above this to be selected
    #[serde(default)]
    pub score_floor: f64,

    /// Deadline for a single service invocation
    #[serde(default = "default_invoke_timeout_ms")]
    pub invoke_timeout_ms: u64,
}

fn default_service_name() -> String {
    "memory".into()
}
fn default_context() -> String {
    "general".into()
}
fn default_invoke_timeout_ms() -> u64 {
    30_000
}

impl RoutingConfig {
    pub fn invoke_timeout(&self) -> Duration {
        Duration::from_millis(self.invoke_timeout_ms)
    }
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            default_service: default_service_name(),
            default_context: default_context(),
            score_floor: 0.0,
            invoke_timeout_ms: default_invoke_timeout_ms(),
        }
    }
}

/// How health scores are obtained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeKind {
    /// Fixed score for every service
    #[default]
    Static,
    /// Ask each registered service for its own health
    Service,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthConfig {
    /// How long a health judgment stays fresh
    #[serde(default = "default_health_ttl_secs")]
    pub ttl_secs: u64,

    #[serde(default)]
    pub probe: ProbeKind,

    /// Score reported by the static probe
    #[serde(default = "default_static_score")]
    pub static_score: f32,
}

fn default_health_ttl_secs() -> u64 {
    30
}
fn default_static_score() -> f32 {
    1.0
}

impl HealthConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_health_ttl_secs(),
            probe: ProbeKind::default(),
            static_score: default_static_score(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Directory holding one `<category>.jsonl` log per category
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// "hash", "openai", or "none"
    #[serde(default = "default_embedding_provider")]
    pub embedding_provider: String,

    #[serde(default = "default_embedding_url")]
    pub embedding_url: String,

    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding_api_key: Option<String>,

    /// Vector length produced by the hash embedder
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,

    /// Deadline for embedder and vector index calls
    #[serde(default = "default_call_timeout_ms")]
    pub call_timeout_ms: u64,

    /// How long recall results stay cached
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Vector matches below this similarity are dropped
    #[serde(default)]
    pub min_similarity: f32,

    /// Recall limit when the caller gives none
    #[serde(default = "default_limit")]
    pub default_limit: usize,
}

fn default_data_dir() -> PathBuf {
    AppConfig::config_dir().join("memory")
}
fn default_embedding_provider() -> String {
    "hash".into()
}
fn default_embedding_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_embedding_model() -> String {
    "text-embedding-3-small".into()
}
fn default_dimensions() -> usize {
    256
}
fn default_call_timeout_ms() -> u64 {
    10_000
}
fn default_cache_ttl_secs() -> u64 {
    60
}
fn default_limit() -> usize {
    5
}

impl MemoryConfig {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            embedding_provider: default_embedding_provider(),
            embedding_url: default_embedding_url(),
            embedding_model: default_embedding_model(),
            embedding_api_key: None,
            dimensions: default_dimensions(),
            call_timeout_ms: default_call_timeout_ms(),
            cache_ttl_secs: default_cache_ttl_secs(),
            min_similarity: 0.0,
            default_limit: default_limit(),
        }
    }
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for MemoryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryConfig")
            .field("data_dir", &self.data_dir)
            .field("embedding_provider", &self.embedding_provider)
            .field("embedding_url", &self.embedding_url)
            .field("embedding_model", &self.embedding_model)
            .field("embedding_api_key", &redact(&self.embedding_api_key))
            .field("dimensions", &self.dimensions)
            .field("call_timeout_ms", &self.call_timeout_ms)
            .field("cache_ttl_secs", &self.cache_ttl_secs)
            .field("min_similarity", &self.min_similarity)
            .field("default_limit", &self.default_limit)
            .finish()
    }
}

/// How the binary invokes a configured service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceKind {
    /// The in-process memory store
    Memory,
    /// A JSON-over-HTTP endpoint
    #[default]
    Http,
}

/// One `[[services]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub name: String,

    pub capabilities: Vec<Capability>,

    pub tier: Tier,

    #[serde(default = "default_contexts")]
    pub contexts: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<String>,

    #[serde(default)]
    pub endpoint: String,

    #[serde(default)]
    pub kind: ServiceKind,
}

fn default_contexts() -> Vec<String> {
    vec!["all".into()]
}

impl ServiceConfig {
    pub fn to_descriptor(&self) -> ServiceDescriptor {
        let mut descriptor =
            ServiceDescriptor::new(self.name.clone(), self.capabilities.clone(), self.tier)
                .with_contexts(self.contexts.iter().cloned())
                .with_endpoint(self.endpoint.clone());
        descriptor.fallback = self.fallback.clone();
        descriptor
    }
}

fn default_services() -> Vec<ServiceConfig> {
    vec![
        ServiceConfig {
            name: "memory".into(),
            capabilities: vec![Capability::Memory],
            tier: Tier::Primary,
            contexts: default_contexts(),
            fallback: None,
            endpoint: "inproc://memory".into(),
            kind: ServiceKind::Memory,
        },
        ServiceConfig {
            name: "code_analysis".into(),
            capabilities: vec![Capability::CodeAnalysis],
            tier: Tier::Primary,
            contexts: vec!["development".into(), "general".into()],
            fallback: Some("memory".into()),
            endpoint: "http://localhost:8101".into(),
            kind: ServiceKind::Http,
        },
        ServiceConfig {
            name: "business_intelligence".into(),
            capabilities: vec![Capability::BusinessIntelligence, Capability::Research],
            tier: Tier::Primary,
            contexts: vec!["business".into(), "ceo_deep_research".into()],
            fallback: Some("research".into()),
            endpoint: "http://localhost:8102".into(),
            kind: ServiceKind::Http,
        },
        ServiceConfig {
            name: "research".into(),
            capabilities: vec![Capability::Research, Capability::TaskManagement],
            tier: Tier::Secondary,
            contexts: default_contexts(),
            fallback: Some("memory".into()),
            endpoint: "http://localhost:8103".into(),
            kind: ServiceKind::Http,
        },
    ]
}

impl AppConfig {
    /// Load configuration from the default path (~/.switchboard/config.toml).
    ///
    /// Environment overrides:
    /// - `SWITCHBOARD_EMBEDDING_API_KEY` (then `OPENAI_API_KEY`)
    /// - `SWITCHBOARD_DATA_DIR`
    /// - `SWITCHBOARD_DEFAULT_SERVICE`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides using `lookup` to read variables.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.memory.embedding_api_key.is_none() {
            self.memory.embedding_api_key = lookup("SWITCHBOARD_EMBEDDING_API_KEY")
                .or_else(|| lookup("OPENAI_API_KEY"));
        }

        if let Some(dir) = lookup("SWITCHBOARD_DATA_DIR") {
            self.memory.data_dir = PathBuf::from(dir);
        }

        if let Some(service) = lookup("SWITCHBOARD_DEFAULT_SERVICE") {
            self.routing.default_service = service;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".switchboard")
    }

    /// Descriptors for every configured service, in registration order.
    pub fn descriptors(&self) -> Vec<ServiceDescriptor> {
        self.services.iter().map(ServiceConfig::to_descriptor).collect()
    }

    /// Validate scalar settings. Fallback graph checks happen when the
    /// capability registry is built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.health.ttl_secs == 0 {
            return Err(ConfigError::ValidationError(
                "health.ttl_secs must be > 0".into(),
            ));
        }

        if !(0.0..=1.0).contains(&self.health.static_score) {
            return Err(ConfigError::ValidationError(
                "health.static_score must be between 0.0 and 1.0".into(),
            ));
        }

        if self.routing.invoke_timeout_ms == 0 || self.memory.call_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "timeouts must be > 0".into(),
            ));
        }

        if self.memory.dimensions == 0 {
            return Err(ConfigError::ValidationError(
                "memory.dimensions must be > 0".into(),
            ));
        }

        if !matches!(self.memory.embedding_provider.as_str(), "hash" | "openai" | "none") {
            return Err(ConfigError::ValidationError(format!(
                "unknown embedding provider '{}'",
                self.memory.embedding_provider
            )));
        }

        if let Some(service) = self.services.iter().find(|s| s.name.trim().is_empty()) {
            return Err(ConfigError::ValidationError(format!(
                "service with endpoint '{}' has an empty name",
                service.endpoint
            )));
        }

        Ok(())
    }

    /// Generate a default config TOML string (for `init`).
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            routing: RoutingConfig::default(),
            health: HealthConfig::default(),
            memory: MemoryConfig::default(),
            services: default_services(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
