//! # Switchboard Core
//!
//! Domain types, traits, and error definitions for the Switchboard
//! capability-aware service router and its semantic memory store.
//! This crate has no runtime dependencies; it defines the domain model
//! that every other crate implements against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator (downstream services, embedders, vector
//! indexes, durable logs, tools) is a trait here. Implementations live in
//! their respective crates, so tests can substitute mocks freely.

pub mod error;
pub mod capability;
pub mod request;
pub mod service;
pub mod memory;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{Error, Result};
pub use capability::Capability;
pub use request::{AnalyzedRequest, MessageType, Urgency};
pub use service::{Service, ServiceDescriptor, ServiceRequest, Tier};
pub use memory::{
    DurableLog, EmbeddingService, MemoryCategory, MemoryRecord, RecalledMemory, VectorIndex,
    VectorMatch,
};
pub use tool::{Tool, ToolCall, ToolDefinition, ToolRegistry, ToolResult};
