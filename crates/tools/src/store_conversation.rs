//! Store tool — lets a caller persist a piece of conversation as a memory.

use async_trait::async_trait;
use std::sync::Arc;
use switchboard_core::error::ToolError;
use switchboard_core::memory::MemoryCategory;
use switchboard_core::tool::{Tool, ToolResult};
use switchboard_memory::MemoryStore;

pub struct StoreConversationTool {
    store: Arc<MemoryStore>,
}

impl StoreConversationTool {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }
}

/// Parse the `category` argument, rejecting anything outside the fixed set.
pub(crate) fn parse_category(value: &serde_json::Value) -> Result<MemoryCategory, ToolError> {
    value
        .as_str()
        .ok_or_else(|| ToolError::InvalidArguments("'category' must be a string".into()))?
        .parse::<MemoryCategory>()
        .map_err(ToolError::InvalidArguments)
}

pub(crate) fn category_schema() -> serde_json::Value {
    let names: Vec<&str> = MemoryCategory::ALL.iter().map(|c| c.as_str()).collect();
    serde_json::json!({
        "type": "string",
        "enum": names,
        "description": "Memory category"
    })
}

#[async_trait]
impl Tool for StoreConversationTool {
    fn name(&self) -> &str {
        "store_conversation"
    }

    fn description(&self) -> &str {
        "Store a piece of conversation or knowledge in long-term memory under a category. \
         Use this for architecture notes, bug solutions, code decisions, and workflows."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "content": {
                    "type": "string",
                    "description": "The text to remember"
                },
                "category": category_schema(),
                "tags": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Free-form labels for the memory"
                }
            },
            "required": ["content", "category"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let content = arguments["content"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'content' argument".into()))?;
        if content.trim().is_empty() {
            return Err(ToolError::InvalidArguments("'content' must not be empty".into()));
        }

        let category = parse_category(&arguments["category"])?;

        let tags: Vec<String> = arguments
            .get("tags")
            .and_then(|t| serde_json::from_value(t.clone()).ok())
            .unwrap_or_default();

        let record = self
            .store
            .store(content, category, tags)
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: self.name().to_string(),
                reason: e.to_string(),
            })?;

        Ok(ToolResult {
            call_id: String::new(),
            success: true,
            output: format!("Stored memory {} in {category}.", record.id),
            data: Some(serde_json::json!({ "id": record.id, "status": "stored" })),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use switchboard_memory::{HashEmbedder, InMemoryVectorIndex, JsonlLog};

    fn tool(dir: &std::path::Path) -> StoreConversationTool {
        let store = MemoryStore::new(
            Arc::new(HashEmbedder::default()),
            Arc::new(InMemoryVectorIndex::new()),
            Arc::new(JsonlLog::new(dir)),
        );
        StoreConversationTool::new(Arc::new(store))
    }

    #[test]
    fn schema_lists_categories() {
        let tmp = tempfile::tempdir().unwrap();
        let schema = tool(tmp.path()).parameters_schema();
        assert_eq!(schema["required"], serde_json::json!(["content", "category"]));
        assert_eq!(
            schema["properties"]["category"]["enum"],
            serde_json::json!(["architecture", "bug_solution", "code_decision", "workflow"])
        );
    }

    #[tokio::test]
    async fn stores_and_reports_id() {
        let tmp = tempfile::tempdir().unwrap();
        let result = tool(tmp.path())
            .execute(serde_json::json!({
                "content": "Retry the payment webhook on 502",
                "category": "bug_solution",
                "tags": ["payments"]
            }))
            .await
            .unwrap();

        assert!(result.success);
        let data = result.data.unwrap();
        assert_eq!(data["status"], "stored");
        assert!(data["id"].as_str().unwrap().starts_with("bug_solution_"));
    }

    #[tokio::test]
    async fn unwritable_log_is_an_execution_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();
        let err = tool(&blocker.join("memory"))
            .execute(serde_json::json!({ "content": "lost", "category": "workflow" }))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ToolError::ExecutionFailed { tool_name, .. } if tool_name == "store_conversation"
        ));
    }

    #[tokio::test]
    async fn rejects_unknown_category() {
        let tmp = tempfile::tempdir().unwrap();
        let err = tool(tmp.path())
            .execute(serde_json::json!({ "content": "x", "category": "gossip" }))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[tokio::test]
    async fn rejects_missing_content() {
        let tmp = tempfile::tempdir().unwrap();
        let t = tool(tmp.path());
        assert!(t.execute(serde_json::json!({ "category": "workflow" })).await.is_err());
        assert!(t
            .execute(serde_json::json!({ "content": "  ", "category": "workflow" }))
            .await
            .is_err());
    }
}
