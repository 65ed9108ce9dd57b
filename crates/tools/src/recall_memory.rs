//! Recall tool — semantic search over stored memories, with a recency
//! fallback when a category is given.

use async_trait::async_trait;
use std::sync::Arc;
use switchboard_core::error::ToolError;
use switchboard_core::tool::{Tool, ToolResult};
use switchboard_memory::MemoryStore;

use crate::store_conversation::{category_schema, parse_category};

const DEFAULT_LIMIT: u64 = 5;
const MAX_LIMIT: u64 = 50;

pub struct RecallMemoryTool {
    store: Arc<MemoryStore>,
}

impl RecallMemoryTool {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for RecallMemoryTool {
    fn name(&self) -> &str {
        "recall_memory"
    }

    fn description(&self) -> &str {
        "Search long-term memory for records relevant to a query. \
         Optionally restrict to one category."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "What to look for"
                },
                "category": category_schema(),
                "limit": {
                    "type": "integer",
                    "description": "Maximum number of memories to return (default 5)",
                    "default": DEFAULT_LIMIT
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let query = arguments["query"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'query' argument".into()))?;

        let category = match arguments.get("category") {
            None | Some(serde_json::Value::Null) => None,
            Some(value) => Some(parse_category(value)?),
        };

        let limit = arguments["limit"]
            .as_u64()
            .unwrap_or(DEFAULT_LIMIT)
            .min(MAX_LIMIT) as usize;

        let results = self
            .store
            .recall(query, category, limit)
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: self.name().to_string(),
                reason: e.to_string(),
            })?;

        let output = if results.is_empty() {
            format!("No memories found matching '{query}'.")
        } else {
            results
                .iter()
                .map(|r| format!("[{:.2}] {}", r.relevance, r.record.content))
                .collect::<Vec<_>>()
                .join("\n")
        };

        Ok(ToolResult {
            call_id: String::new(),
            success: true,
            output,
            data: Some(serde_json::json!({ "results": results })),
        })
    }
}
