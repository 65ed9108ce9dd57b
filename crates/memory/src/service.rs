//! The memory store exposed as a routable service.

use async_trait::async_trait;
use std::sync::Arc;
use switchboard_core::error::ServiceError;
use switchboard_core::memory::MemoryCategory;
use switchboard_core::service::{Service, ServiceRequest};
use tracing::debug;

use crate::store::MemoryStore;

/// Leading verbs that turn a request into a store.
const STORE_VERBS: [&str; 4] = ["remember", "store", "save", "note"];

/// Checked in order; the first category with a matching keyword wins.
const CATEGORY_RULES: &[(MemoryCategory, &[&str])] = &[
    (
        MemoryCategory::BugSolution,
        &["bug", "fix", "fixed", "error", "crash", "exception", "regression"],
    ),
    (
        MemoryCategory::Architecture,
        &["architecture", "design", "component", "module", "schema", "topology"],
    ),
    (
        MemoryCategory::CodeDecision,
        &["decided", "decision", "chose", "convention", "prefer", "standardize"],
    ),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryIntent {
    Store,
    Recall,
}

/// Store if the text opens with a store verb, otherwise recall.
pub fn classify_intent(text: &str) -> MemoryIntent {
    let first = text
        .split_whitespace()
        .next()
        .map(|w| w.trim_end_matches([':', ',']).to_lowercase())
        .unwrap_or_default();
    if STORE_VERBS.contains(&first.as_str()) {
        MemoryIntent::Store
    } else {
        MemoryIntent::Recall
    }
}

/// Category named by the text's vocabulary, if any.
pub fn infer_category(text: &str) -> Option<MemoryCategory> {
    let words: Vec<String> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect();
    CATEGORY_RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| words.iter().any(|w| w == k)))
        .map(|(category, _)| *category)
}

/// Drop the leading store verb and an optional "that".
fn store_content(text: &str) -> &str {
    let text = text.trim();
    let rest = match text.split_once(char::is_whitespace) {
        Some((_, rest)) => rest.trim_start(),
        None => return text,
    };
    let rest = rest.strip_prefix(':').map(str::trim_start).unwrap_or(rest);
    match rest.split_once(char::is_whitespace) {
        Some((word, tail)) if word.eq_ignore_ascii_case("that") => tail.trim_start(),
        _ => rest,
    }
}

pub struct MemoryService {
    name: String,
    store: Arc<MemoryStore>,
    default_limit: usize,
}

impl MemoryService {
    pub fn new(name: impl Into<String>, store: Arc<MemoryStore>) -> Self {
        Self {
            name: name.into(),
            store,
            default_limit: 5,
        }
    }

    pub fn with_default_limit(mut self, limit: usize) -> Self {
        self.default_limit = limit;
        self
    }

    pub fn store(&self) -> &Arc<MemoryStore> {
        &self.store
    }
}

#[async_trait]
impl Service for MemoryService {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(&self, request: &ServiceRequest) -> Result<serde_json::Value, ServiceError> {
        let failed = |e: switchboard_core::error::MemoryError| ServiceError::InvocationFailed {
            service: self.name.clone(),
            message: e.to_string(),
        };

        match classify_intent(&request.text) {
            MemoryIntent::Store => {
                let content = store_content(&request.text);
                let category = infer_category(content).unwrap_or(MemoryCategory::Workflow);
                let tags = request
                    .analyzed
                    .required_capabilities
                    .iter()
                    .map(|c| c.as_str().to_string())
                    .collect();
                debug!(category = %category, "Memory service storing");
                let record = self.store.store(content, category, tags).await.map_err(failed)?;
                Ok(serde_json::json!({
                    "action": "stored",
                    "id": record.id,
                    "category": record.category,
                }))
            }
            MemoryIntent::Recall => {
                let category = infer_category(&request.text);
                let results = self
                    .store
                    .recall(&request.text, category, self.default_limit)
                    .await
                    .map_err(failed)?;
                Ok(serde_json::json!({
                    "action": "recalled",
                    "results": results,
                }))
            }
        }
    }

    async fn health_check(&self) -> Result<f32, ServiceError> {
        let status = self.store.status().await;
        Ok(match (status.memory_manager_ready, status.vector_index_connected) {
            (true, true) => 1.0,
            (true, false) => 0.6,
            (false, _) => 0.0,
        })
    }
}
