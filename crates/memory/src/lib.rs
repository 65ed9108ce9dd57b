//! Semantic memory for Switchboard.
//!
//! [`MemoryStore`] combines an embedder, a vector index, and a durable
//! per-category log. [`MemoryService`] exposes it to the router.

pub mod cache;
pub mod embedding;
pub mod log;
pub mod service;
pub mod store;
pub mod vector;

pub use cache::TtlCache;
pub use embedding::{HashEmbedder, NoEmbedder, OpenAiEmbedder};
pub use log::JsonlLog;
pub use service::{MemoryIntent, MemoryService, classify_intent, infer_category};
pub use store::{FALLBACK_RELEVANCE, MemoryStore, OperationalState, SystemStatus};
pub use vector::{InMemoryVectorIndex, cosine_similarity};

use std::sync::Arc;
use switchboard_config::MemoryConfig;
use switchboard_core::memory::EmbeddingService;
use tracing::warn;

/// Pick the embedder named by `embedding_provider`.
pub fn embedder_from_config(config: &MemoryConfig) -> Arc<dyn EmbeddingService> {
    match config.embedding_provider.as_str() {
        "hash" => Arc::new(HashEmbedder::new(config.dimensions)),
        "openai" => match config.embedding_api_key.as_deref() {
            Some(key) if !key.is_empty() => Arc::new(OpenAiEmbedder::new(
                &config.embedding_url,
                &config.embedding_model,
                key,
            )),
            _ => {
                warn!("openai embeddings configured without an API key; vector recall disabled");
                Arc::new(NoEmbedder)
            }
        },
        "none" => Arc::new(NoEmbedder),
        other => {
            warn!(provider = other, "Unknown embedding provider; vector recall disabled");
            Arc::new(NoEmbedder)
        }
    }
}

/// Build a memory store from configuration.
pub fn build_from_config(config: &MemoryConfig) -> MemoryStore {
    let index = InMemoryVectorIndex::new().with_min_score(config.min_similarity);
    MemoryStore::new(
        embedder_from_config(config),
        Arc::new(index),
        Arc::new(JsonlLog::new(&config.data_dir)),
    )
    .with_call_timeout(config.call_timeout())
    .with_cache_ttl(config.cache_ttl())
}
