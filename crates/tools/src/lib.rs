//! Callable tools over the Switchboard memory store.
//!
//! Two operations map one-to-one onto the store: `store_conversation`
//! and `recall_memory`. Any other name fails with `ToolError::NotFound`.

pub mod recall_memory;
pub mod store_conversation;

use std::sync::Arc;
use switchboard_core::tool::ToolRegistry;
use switchboard_memory::MemoryStore;

pub use recall_memory::RecallMemoryTool;
pub use store_conversation::StoreConversationTool;

/// Create a registry holding both memory tools.
pub fn default_registry(store: Arc<MemoryStore>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(StoreConversationTool::new(store.clone())));
    registry.register(Box::new(RecallMemoryTool::new(store)));
    registry
}
