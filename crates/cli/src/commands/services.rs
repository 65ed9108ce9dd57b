//! `switchboard services` — List registered services and explain routing.

use std::path::Path;
use switchboard_core::service::ServiceDescriptor;
use switchboard_router::HealthStatus;

use crate::runtime;

/// One registry line, ending with when the score was last refreshed.
fn health_line(descriptor: &ServiceDescriptor, health: &HealthStatus) -> String {
    format!(
        "  {} {:<22} {:<9} health={:.2} checked={}",
        if health.healthy { "✅" } else { "⚠️ " },
        descriptor.name,
        descriptor.tier.to_string(),
        health.score,
        health.checked_at.format("%Y-%m-%d %H:%M:%S UTC")
    )
}

pub async fn run(
    config: Option<&Path>,
    explain: Option<&str>,
    context: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let rt = runtime::load(config)?;

    println!("🔀 Registered Services");
    println!("======================");
    for descriptor in rt.router.registry().all_services() {
        let health = rt.router.health().health_of(&descriptor.name).await;
        let capabilities: Vec<&str> = descriptor.capabilities.iter().map(|c| c.as_str()).collect();
        println!("{}", health_line(descriptor, &health));
        println!("      capabilities: {}", capabilities.join(", "));
        println!("      contexts:     {}", descriptor.contexts.join(", "));
        if let Some(fallback) = &descriptor.fallback {
            println!("      fallback:     {fallback}");
        }
    }

    if let Some(text) = explain {
        println!();
        println!("📊 Scores for: \"{text}\"");
        let mut ranked = rt.router.rank(text, context).await;
        ranked.sort_by(|a, b| b.total.total_cmp(&a.total));
        for s in &ranked {
            println!(
                "  {:<22} total={:>6.1}  (context {:.0} + capability {:.0} + tier {:.0} + health {:.1})",
                s.service, s.total, s.context, s.capability, s.tier, s.health
            );
        }
    }

    Ok(())
}
