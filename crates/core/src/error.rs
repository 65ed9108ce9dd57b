//! Error types for the Switchboard domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all Switchboard operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Service invocation errors ---
    #[error("Service error: {0}")]
    Service(#[from] ServiceError),

    // --- Registry (startup configuration) errors ---
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    // --- Memory errors ---
    #[error("Memory error: {0}")]
    Memory(#[from] MemoryError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// A live call to a downstream service failed.
#[derive(Debug, Clone, Error)]
pub enum ServiceError {
    #[error("Service '{service}' failed: {message}")]
    InvocationFailed { service: String, message: String },

    #[error("Service '{service}' timed out after {timeout_ms}ms")]
    Timeout { service: String, timeout_ms: u64 },

    #[error("No invoker registered for service '{0}'")]
    NotRegistered(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Fatal configuration problems detected while building the capability registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Duplicate service name: {0}")]
    DuplicateService(String),

    #[error("Service name must not be empty")]
    EmptyName,

    #[error("Service '{0}' declares itself as its own fallback")]
    SelfFallback(String),

    #[error("Service '{service}' falls back to unknown service '{fallback}'")]
    UnknownFallback { service: String, fallback: String },

    #[error("Fallback cycle detected: {}", .0.join(" -> "))]
    FallbackCycle(Vec<String>),
}

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Embedding generation failed: {0}")]
    EmbeddingFailed(String),

    #[error("Vector index unavailable: {0}")]
    IndexUnavailable(String),
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    NotFound(String),

    #[error("Tool execution failed: {tool_name} — {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),
}
