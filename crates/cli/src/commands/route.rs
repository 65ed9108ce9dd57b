//! `switchboard route` — Route a request to the best-suited service.

use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

use crate::runtime;

pub async fn run(
    config: Option<&Path>,
    text: &str,
    context: Option<&str>,
    timeout_ms: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let rt = runtime::load(config)?;
    debug!(text, context, timeout_ms, "Routing request");

    let result = match timeout_ms {
        Some(ms) => {
            rt.router
                .route_with_deadline(text, context, Duration::from_millis(ms))
                .await
        }
        None => rt.router.route(text, context).await,
    };

    info!(
        selected = %result.selected_service,
        service = result.service_used.as_deref().unwrap_or("none"),
        fallback = result.fallback_used,
        success = result.success,
        "Routing decision"
    );
    println!("{}", serde_json::to_string_pretty(&result)?);

    if !result.success {
        return Err(result
            .error
            .unwrap_or_else(|| "routing failed".to_string())
            .into());
    }
    Ok(())
}
