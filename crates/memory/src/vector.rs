//! Vector similarity and an in-process vector index.
//!
//! The index stores one embedding per record id, ranks by cosine similarity,
//! and can be switched offline to simulate an unreachable remote index.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use switchboard_core::error::MemoryError;
use switchboard_core::memory::{MemoryCategory, VectorIndex, VectorMatch};
use tokio::sync::RwLock;

/// Compute cosine similarity between two vectors.
///
/// Returns a value in [-1, 1] where 1 = identical, 0 = orthogonal, -1 = opposite.
/// Returns 0.0 if either vector is zero-length or empty.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (x, y) in a.iter().zip(b.iter()) {
        let x = *x as f64;
        let y = *y as f64;
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < 1e-10 {
        return 0.0;
    }

    (dot / denom) as f32
}

struct IndexedVector {
    category: MemoryCategory,
    embedding: Vec<f32>,
}

/// Brute-force cosine index held in memory.
pub struct InMemoryVectorIndex {
    vectors: RwLock<HashMap<String, IndexedVector>>,
    online: AtomicBool,
    min_score: f32,
}

impl InMemoryVectorIndex {
    pub fn new() -> Self {
        Self {
            vectors: RwLock::new(HashMap::new()),
            online: AtomicBool::new(true),
            min_score: 0.0,
        }
    }

    /// Drop matches scoring below `min_score`.
    pub fn with_min_score(mut self, min_score: f32) -> Self {
        self.min_score = min_score;
        self
    }

    /// Mark the index reachable or unreachable.
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    pub async fn len(&self) -> usize {
        self.vectors.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.vectors.read().await.is_empty()
    }

    fn ensure_online(&self) -> Result<(), MemoryError> {
        if self.online.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(MemoryError::IndexUnavailable("in-memory index is offline".into()))
        }
    }
}

impl Default for InMemoryVectorIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn upsert(
        &self,
        id: &str,
        category: MemoryCategory,
        embedding: &[f32],
    ) -> Result<(), MemoryError> {
        self.ensure_online()?;
        self.vectors.write().await.insert(
            id.to_string(),
            IndexedVector {
                category,
                embedding: embedding.to_vec(),
            },
        );
        Ok(())
    }

    async fn query(
        &self,
        embedding: &[f32],
        category: Option<MemoryCategory>,
        top_k: usize,
    ) -> Result<Vec<VectorMatch>, MemoryError> {
        self.ensure_online()?;
        let vectors = self.vectors.read().await;

        let mut matches: Vec<VectorMatch> = vectors
            .iter()
            .filter(|(_, v)| category.is_none_or(|c| c == v.category))
            .map(|(id, v)| VectorMatch {
                id: id.clone(),
                category: v.category,
                score: cosine_similarity(&v.embedding, embedding),
            })
            .filter(|m| m.score >= self.min_score)
            .collect();

        // Ties broken by id so results are stable across HashMap iteration order.
        matches.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        matches.truncate(top_k);
        Ok(matches)
    }

    async fn is_available(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }
}
