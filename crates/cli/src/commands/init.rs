//! `switchboard init` — Write the default configuration file.

use std::path::Path;
use switchboard_config::AppConfig;
use tracing::debug;

use crate::runtime;

pub fn run(config: Option<&Path>, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = match config {
        Some(path) => path.to_path_buf(),
        None => AppConfig::config_dir().join("config.toml"),
    };

    println!("🔀 Switchboard — Setup");
    println!("======================\n");

    if config_path.exists() && !force {
        println!("  Config file exists: {}", config_path.display());
        println!("  Re-run with --force to overwrite it.");
    } else {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&config_path, AppConfig::default_toml())?;
        println!("✅ Wrote default config: {}", config_path.display());
    }

    // The effective data_dir: file contents plus environment overrides.
    let data_dir = runtime::load_config(Some(&config_path))?.memory.data_dir;
    debug!(data_dir = %data_dir.display(), "Resolved memory directory");
    if !data_dir.exists() {
        std::fs::create_dir_all(&data_dir)?;
        println!("✅ Created memory directory: {}", data_dir.display());
    }

    println!("\nNext: `switchboard services` to inspect the registry.");
    Ok(())
}
