//! `switchboard status` — Show memory store and dependency status.

use std::path::Path;
use switchboard_config::AppConfig;

use crate::runtime;

pub async fn run(config: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let rt = runtime::load(config)?;
    let status = rt.store.status().await;
    let mark = |ok: bool| if ok { "✅" } else { "❌" };

    println!("🔀 Switchboard Status");
    println!("=====================");
    println!("  Config dir:   {}", AppConfig::config_dir().display());
    println!("  Data dir:     {}", rt.config.memory.data_dir.display());
    println!("  Embeddings:   {}", rt.config.memory.embedding_provider);
    println!("  Services:     {}", rt.router.registry().len());
    println!("  Default:      {}", rt.config.routing.default_service);
    println!();
    println!("  {} Embedding service", mark(status.embedding_service_connected));
    println!("  {} Vector index", mark(status.vector_index_connected));
    println!("  {} Memory log", mark(status.memory_manager_ready));

    if status.memory_manager_ready {
        println!();
        for (category, count) in rt.store.counts().await? {
            println!("  {:<14} {count} records", category.as_str());
        }
    }

    println!();
    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}
