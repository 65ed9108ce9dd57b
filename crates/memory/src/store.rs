//! Memory store — embeds, indexes, and durably logs memory records, and
//! recalls them vector-first with a recency fallback over the log.
//!
//! Failure policy:
//! - embedding and vector index problems degrade the result, never fail it
//! - a store succeeds exactly when its durable-log append succeeds
//!
//! The log is the source of truth. On first vector use the index is
//! rehydrated from the embeddings persisted alongside each log record.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use switchboard_core::error::MemoryError;
use switchboard_core::memory::{
    DurableLog, EmbeddingService, MemoryCategory, MemoryRecord, RecalledMemory, VectorIndex,
};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::cache::TtlCache;

/// Relevance assigned to every record returned by the log fallback.
pub const FALLBACK_RELEVANCE: f32 = 0.5;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct RecallKey {
    query: String,
    category: Option<MemoryCategory>,
    limit: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationalState {
    Operational,
    Initializing,
}

/// Health/status payload for external monitoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemStatus {
    pub status: OperationalState,
    pub embedding_service_connected: bool,
    pub vector_index_connected: bool,
    pub memory_manager_ready: bool,
    pub timestamp: String,
}

pub struct MemoryStore {
    embedder: Arc<dyn EmbeddingService>,
    index: Arc<dyn VectorIndex>,
    log: Arc<dyn DurableLog>,
    cache: TtlCache<RecallKey, Vec<RecalledMemory>>,
    call_timeout: Duration,
    hydrated: OnceCell<usize>,
}

impl MemoryStore {
    pub fn new(
        embedder: Arc<dyn EmbeddingService>,
        index: Arc<dyn VectorIndex>,
        log: Arc<dyn DurableLog>,
    ) -> Self {
        Self {
            embedder,
            index,
            log,
            cache: TtlCache::new(Duration::from_secs(60)),
            call_timeout: Duration::from_secs(10),
            hydrated: OnceCell::new(),
        }
    }

    /// Deadline for each embedder and vector index call.
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// How long recall results are memoized. Zero disables the cache.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache = TtlCache::new(ttl);
        self
    }

    /// Best-effort embedding: failures and timeouts yield `None`.
    async fn embed(&self, text: &str) -> Option<Vec<f32>> {
        match tokio::time::timeout(self.call_timeout, self.embedder.embed(text)).await {
            Ok(Ok(embedding)) => Some(embedding),
            Ok(Err(e)) => {
                warn!(embedder = %self.embedder.name(), error = %e, "Embedding unavailable, continuing without");
                None
            }
            Err(_) => {
                warn!(embedder = %self.embedder.name(), "Embedding timed out, continuing without");
                None
            }
        }
    }

    async fn upsert(&self, record: &MemoryRecord, embedding: &[f32]) -> bool {
        let upsert = self.index.upsert(&record.id, record.category, embedding);
        match tokio::time::timeout(self.call_timeout, upsert).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                warn!(id = %record.id, error = %e, "Vector upsert failed");
                false
            }
            Err(_) => {
                warn!(id = %record.id, "Vector upsert timed out");
                false
            }
        }
    }

    /// Re-index every logged record that carries an embedding.
    /// Returns how many vectors were upserted.
    pub async fn rehydrate(&self) -> Result<usize, MemoryError> {
        let mut upserted = 0;
        for category in MemoryCategory::ALL {
            for record in self.log.all(category).await? {
                if let Some(embedding) = &record.embedding {
                    if self.upsert(&record, embedding).await {
                        upserted += 1;
                    }
                }
            }
        }
        info!(index = %self.index.name(), upserted, "Vector index rehydrated from log");
        Ok(upserted)
    }

    /// Rehydrate once per store. A failed attempt is retried on next use.
    async fn ensure_hydrated(&self) {
        if let Err(e) = self.hydrated.get_or_try_init(|| self.rehydrate()).await {
            warn!(error = %e, "Vector index rehydration failed");
        }
    }

    /// Persist a new memory. Returns the stored record.
    pub async fn store(
        &self,
        content: &str,
        category: MemoryCategory,
        tags: Vec<String>,
    ) -> Result<MemoryRecord, MemoryError> {
        let mut record = MemoryRecord::new(content, category, tags);
        record.embedding = self.embed(&record.content).await;

        if let Some(embedding) = &record.embedding {
            if self.upsert(&record, embedding).await {
                debug!(id = %record.id, "Vector upserted");
            }
        }

        self.log.append(&record).await?;

        // Cached recalls that could now include this record are stale.
        self.cache
            .retain(|k| k.category.is_some_and(|c| c != category))
            .await;

        info!(id = %record.id, category = %category, embedded = record.embedding.is_some(), "Memory stored");
        Ok(record)
    }

    /// Most relevant records for `query`, best first.
    ///
    /// Vector search first; if it yields nothing and a category is given,
    /// the last `limit` log entries of that category at fixed relevance.
    pub async fn recall(
        &self,
        query: &str,
        category: Option<MemoryCategory>,
        limit: usize,
    ) -> Result<Vec<RecalledMemory>, MemoryError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let key = RecallKey {
            query: query.to_string(),
            category,
            limit,
        };
        // Read before computing: a store landing mid-recall bumps it.
        let generation = self.cache.generation().await;
        if let Some(cached) = self.cache.get(&key).await {
            debug!(query, "Recall served from cache");
            return Ok(cached);
        }

        let mut results = self.vector_recall(query, category, limit).await;

        if results.is_empty() {
            if let Some(category) = category {
                debug!(category = %category, "Vector path empty, falling back to log");
                results = self
                    .log
                    .tail(category, limit)
                    .await?
                    .into_iter()
                    .map(|record| RecalledMemory {
                        record,
                        relevance: FALLBACK_RELEVANCE,
                    })
                    .collect();
            }
        }

        if !self.cache.set_if_current(key, results.clone(), generation).await {
            debug!(query, "Recall result not cached");
        }
        Ok(results)
    }

    async fn vector_recall(
        &self,
        query: &str,
        category: Option<MemoryCategory>,
        limit: usize,
    ) -> Vec<RecalledMemory> {
        let Some(embedding) = self.embed(query).await else {
            return Vec::new();
        };

        if !self.index.is_available().await {
            debug!(index = %self.index.name(), "Vector index unreachable");
            return Vec::new();
        }
        self.ensure_hydrated().await;

        let matches = match tokio::time::timeout(
            self.call_timeout,
            self.index.query(&embedding, category, limit),
        )
        .await
        {
            Ok(Ok(matches)) => matches,
            Ok(Err(e)) => {
                warn!(error = %e, "Vector query failed");
                return Vec::new();
            }
            Err(_) => {
                warn!("Vector query timed out");
                return Vec::new();
            }
        };

        let mut results = Vec::with_capacity(matches.len());
        for m in matches.into_iter().take(limit) {
            match self.log.find(m.category, &m.id).await {
                Ok(Some(record)) => results.push(RecalledMemory {
                    record,
                    relevance: m.score,
                }),
                Ok(None) => debug!(id = %m.id, "Indexed vector has no log entry, skipping"),
                Err(e) => warn!(id = %m.id, error = %e, "Failed to resolve vector match"),
            }
        }
        results
    }

    /// Snapshot of dependency connectivity.
    pub async fn status(&self) -> SystemStatus {
        let embedding_service_connected =
            tokio::time::timeout(self.call_timeout, self.embedder.health_check())
                .await
                .unwrap_or(false);
        let vector_index_connected = self.index.is_available().await;
        if vector_index_connected {
            self.ensure_hydrated().await;
        }
        let memory_manager_ready = self.log.is_ready().await;

        SystemStatus {
            status: if memory_manager_ready {
                OperationalState::Operational
            } else {
                OperationalState::Initializing
            },
            embedding_service_connected,
            vector_index_connected,
            memory_manager_ready,
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    /// Records stored per category, straight from the log.
    pub async fn counts(&self) -> Result<Vec<(MemoryCategory, usize)>, MemoryError> {
        let mut counts = Vec::with_capacity(MemoryCategory::ALL.len());
        for category in MemoryCategory::ALL {
            counts.push((category, self.log.count(category).await?));
        }
        Ok(counts)
    }
}
