//! Durable log — append-only JSON-lines files, one per category.
//!
//! Storage location: `<data_dir>/<category>.jsonl`, one JSON-encoded
//! `MemoryRecord` per line. Corrupted lines are skipped on read.
//!
//! Appends to a category are serialized by that category's mutex, so file
//! order is append order and the recency fallback can trust it.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use switchboard_core::error::MemoryError;
use switchboard_core::memory::{DurableLog, MemoryCategory, MemoryRecord};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, warn};

pub struct JsonlLog {
    dir: PathBuf,
    locks: [Mutex<()>; MemoryCategory::ALL.len()],
}

impl JsonlLog {
    /// Create a log rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        debug!(dir = %dir.display(), "JSONL memory log opened");
        Self {
            dir,
            locks: std::array::from_fn(|_| Mutex::new(())),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file holding `category`.
    pub fn path_for(&self, category: MemoryCategory) -> PathBuf {
        self.dir.join(format!("{}.jsonl", category.as_str()))
    }

    fn lock(&self, category: MemoryCategory) -> &Mutex<()> {
        &self.locks[category as usize]
    }

    /// Read every record of `category`. Caller must hold the category lock.
    async fn read_all(&self, category: MemoryCategory) -> Result<Vec<MemoryRecord>, MemoryError> {
        let path = self.path_for(category);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(MemoryError::Storage(format!(
                    "Failed to read {}: {e}",
                    path.display()
                )));
            }
        };

        Ok(content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match serde_json::from_str::<MemoryRecord>(line) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(category = %category, error = %e, "Skipping corrupted memory record");
                    None
                }
            })
            .collect())
    }
}

#[async_trait]
impl DurableLog for JsonlLog {
    fn name(&self) -> &str {
        "jsonl"
    }

    async fn append(&self, record: &MemoryRecord) -> Result<(), MemoryError> {
        let mut line = serde_json::to_string(record).map_err(|e| {
            MemoryError::Storage(format!("Failed to serialize memory record: {e}"))
        })?;
        line.push('\n');

        let _guard = self.lock(record.category).lock().await;

        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            MemoryError::Storage(format!("Failed to create memory directory: {e}"))
        })?;

        let path = self.path_for(record.category);
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| MemoryError::Storage(format!("Failed to open {}: {e}", path.display())))?;

        file.write_all(line.as_bytes())
            .await
            .map_err(|e| MemoryError::Storage(format!("Failed to append memory record: {e}")))?;
        file.flush()
            .await
            .map_err(|e| MemoryError::Storage(format!("Failed to flush memory log: {e}")))?;

        debug!(id = %record.id, category = %record.category, "Memory record appended");
        Ok(())
    }

    async fn tail(
        &self,
        category: MemoryCategory,
        limit: usize,
    ) -> Result<Vec<MemoryRecord>, MemoryError> {
        let _guard = self.lock(category).lock().await;
        let mut records = self.read_all(category).await?;
        let skip = records.len().saturating_sub(limit);
        Ok(records.split_off(skip))
    }

    async fn find(
        &self,
        category: MemoryCategory,
        id: &str,
    ) -> Result<Option<MemoryRecord>, MemoryError> {
        let _guard = self.lock(category).lock().await;
        Ok(self
            .read_all(category)
            .await?
            .into_iter()
            .find(|r| r.id == id))
    }

    async fn count(&self, category: MemoryCategory) -> Result<usize, MemoryError> {
        let _guard = self.lock(category).lock().await;
        Ok(self.read_all(category).await?.len())
    }

    async fn all(&self, category: MemoryCategory) -> Result<Vec<MemoryRecord>, MemoryError> {
        let _guard = self.lock(category).lock().await;
        self.read_all(category).await
    }

    async fn is_ready(&self) -> bool {
        tokio::fs::create_dir_all(&self.dir).await.is_ok()
    }
}
