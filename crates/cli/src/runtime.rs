//! Wiring: configuration → memory store → service handles → router.

use std::path::Path;
use std::sync::Arc;
use switchboard_config::{AppConfig, ServiceKind};
use switchboard_core::service::Service;
use switchboard_memory::{MemoryService, MemoryStore};
use switchboard_router::{HttpService, Router};
use tracing::{debug, info};

pub struct Runtime {
    pub config: AppConfig,
    pub store: Arc<MemoryStore>,
    pub router: Router,
}

/// Load configuration from `path`, or the default location when `None`.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let config = match path {
        Some(path) => {
            info!(path = %path.display(), "Loading config");
            let mut config = AppConfig::load_from(path)?;
            config.apply_env_overrides(|key| std::env::var(key).ok());
            config.validate()?;
            config
        }
        None => {
            info!(path = %AppConfig::config_dir().join("config.toml").display(), "Loading config");
            AppConfig::load()?
        }
    };
    Ok(config)
}

pub fn load(path: Option<&Path>) -> Result<Runtime, Box<dyn std::error::Error>> {
    let config = load_config(path).map_err(|e| format!("Failed to load config: {e}"))?;
    build(config)
}

pub fn build(config: AppConfig) -> Result<Runtime, Box<dyn std::error::Error>> {
    let store = Arc::new(switchboard_memory::build_from_config(&config.memory));

    let handles: Vec<Arc<dyn Service>> = config
        .services
        .iter()
        .map(|svc| -> Arc<dyn Service> {
            match svc.kind {
                ServiceKind::Memory => Arc::new(
                    MemoryService::new(&svc.name, store.clone())
                        .with_default_limit(config.memory.default_limit),
                ),
                ServiceKind::Http => Arc::new(HttpService::from_descriptor(&svc.to_descriptor())),
            }
        })
        .collect();

    let router = switchboard_router::build_from_config(&config, handles)
        .map_err(|e| format!("Invalid service registry: {e}"))?;
    debug!(
        services = config.services.len(),
        data_dir = %config.memory.data_dir.display(),
        "Runtime ready"
    );

    Ok(Runtime {
        config,
        store,
        router,
    })
}
