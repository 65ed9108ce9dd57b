//! `switchboard store` / `switchboard recall` — Memory commands.

use std::path::Path;
use switchboard_core::memory::MemoryCategory;

use crate::runtime;

pub async fn store(
    config: Option<&Path>,
    content: &str,
    category: MemoryCategory,
    tags: Vec<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let rt = runtime::load(config)?;

    let record = rt
        .store
        .store(content, category, tags)
        .await
        .map_err(|e| format!("Failed to store memory: {e}"))?;

    println!("🧠 Stored {}", record.id);
    println!("  Category:  {}", record.category);
    if !record.tags.is_empty() {
        println!("  Tags:      {}", record.tags.join(", "));
    }
    println!(
        "  Vector:    {}",
        if record.embedding.is_some() { "indexed" } else { "log only" }
    );
    Ok(())
}

pub async fn recall(
    config: Option<&Path>,
    query: &str,
    category: Option<MemoryCategory>,
    limit: Option<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    let rt = runtime::load(config)?;
    let limit = limit.unwrap_or(rt.config.memory.default_limit);

    println!("🔍 Recalling memories for: \"{query}\"");
    println!();

    let results = rt
        .store
        .recall(query, category, limit)
        .await
        .map_err(|e| format!("Failed to recall memories: {e}"))?;

    if results.is_empty() {
        println!("   No memories found.");
        if category.is_none() {
            println!("   (Pass --category to fall back to the most recent entries.)");
        }
        return Ok(());
    }

    for (i, hit) in results.iter().enumerate() {
        let content = &hit.record.content;
        let preview: String = content.chars().take(80).collect();
        println!(
            "  {:>2}. [relevance: {:.2}] [{}] {preview}",
            i + 1,
            hit.relevance,
            hit.record.category
        );
        if !hit.record.tags.is_empty() {
            println!("      tags: {}", hit.record.tags.join(", "));
        }
    }
    Ok(())
}
