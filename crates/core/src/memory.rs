//! Memory domain — records, categories, and the collaborators the memory
//! store is built on.
//!
//! The store keeps two views of the same logical record set:
//! - a **vector index** (semantic similarity over embeddings), and
//! - a **durable log** (append-only, partitioned by category).
//!
//! The log is the authority: a record exists once its log append succeeds.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::MemoryError;

/// The fixed set of memory categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryCategory {
    Architecture,
    BugSolution,
    CodeDecision,
    Workflow,
}

impl MemoryCategory {
    pub const ALL: [MemoryCategory; 4] = [
        MemoryCategory::Architecture,
        MemoryCategory::BugSolution,
        MemoryCategory::CodeDecision,
        MemoryCategory::Workflow,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MemoryCategory::Architecture => "architecture",
            MemoryCategory::BugSolution => "bug_solution",
            MemoryCategory::CodeDecision => "code_decision",
            MemoryCategory::Workflow => "workflow",
        }
    }
}

impl fmt::Display for MemoryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MemoryCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MemoryCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "unknown category '{s}' (expected one of: architecture, bug_solution, code_decision, workflow)"
                )
            })
    }
}

/// The persisted unit of the memory store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryRecord {
    /// `<category>_<uuid>`
    pub id: String,

    pub content: String,

    pub category: MemoryCategory,

    #[serde(default)]
    pub tags: Vec<String>,

    /// Absent when the embedding service was unavailable at store time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,

    pub created_at: DateTime<Utc>,
}

impl MemoryRecord {
    /// Create a record with a fresh collision-resistant id.
    pub fn new(content: impl Into<String>, category: MemoryCategory, tags: Vec<String>) -> Self {
        let mut unique: Vec<String> = Vec::with_capacity(tags.len());
        for tag in tags {
            if !unique.contains(&tag) {
                unique.push(tag);
            }
        }
        Self {
            id: format!("{}_{}", category.as_str(), uuid::Uuid::new_v4().simple()),
            content: content.into(),
            category,
            tags: unique,
            embedding: None,
            created_at: Utc::now(),
        }
    }
}

/// A record returned by recall, with the relevance it was ranked by.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecalledMemory {
    #[serde(flatten)]
    pub record: MemoryRecord,

    pub relevance: f32,
}

/// A single hit from a vector index query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorMatch {
    pub id: String,
    pub category: MemoryCategory,
    pub score: f32,
}

/// Generates fixed-length embeddings for text.
#[async_trait]
pub trait EmbeddingService: Send + Sync {
    /// The embedder name (e.g., "hash", "openai").
    fn name(&self) -> &str;

    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, MemoryError>;

    /// Whether the embedder is currently reachable.
    async fn health_check(&self) -> bool {
        true
    }
}

/// Similarity search over embeddings. Concurrency is the index's own concern.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    fn name(&self) -> &str;

    /// Insert or replace the vector for `id`.
    async fn upsert(
        &self,
        id: &str,
        category: MemoryCategory,
        embedding: &[f32],
    ) -> Result<(), MemoryError>;

    /// Top `top_k` matches by the index's own similarity score, best first.
    async fn query(
        &self,
        embedding: &[f32],
        category: Option<MemoryCategory>,
        top_k: usize,
    ) -> Result<Vec<VectorMatch>, MemoryError>;

    /// Whether the index is currently reachable.
    async fn is_available(&self) -> bool;
}

/// Append-only, category-partitioned record log.
#[async_trait]
pub trait DurableLog: Send + Sync {
    fn name(&self) -> &str;

    /// Append a record to its category. Appends to one category are serialized.
    async fn append(&self, record: &MemoryRecord) -> Result<(), MemoryError>;

    /// The last `limit` records of `category`, in insertion order.
    async fn tail(
        &self,
        category: MemoryCategory,
        limit: usize,
    ) -> Result<Vec<MemoryRecord>, MemoryError>;

    /// Look up a record by id within a category.
    async fn find(
        &self,
        category: MemoryCategory,
        id: &str,
    ) -> Result<Option<MemoryRecord>, MemoryError>;

    /// Number of records in `category`.
    async fn count(&self, category: MemoryCategory) -> Result<usize, MemoryError>;

    /// Every record of `category`, in insertion order.
    async fn all(&self, category: MemoryCategory) -> Result<Vec<MemoryRecord>, MemoryError> {
        self.tail(category, usize::MAX).await
    }

    /// Whether the log can accept writes.
    async fn is_ready(&self) -> bool {
        true
    }
}
