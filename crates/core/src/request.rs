//! Analyzed requests — the router's classification of inbound free text.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::capability::Capability;

/// Context used when the caller does not supply one.
pub const DEFAULT_CONTEXT: &str = "general";

/// Context that marks a request as urgent.
pub const URGENT_CONTEXT: &str = "ceo_deep_research";

/// Single classification label for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    RevenueAnalysis,
    CodeReview,
    MemoryRecall,
    GeneralQuery,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::RevenueAnalysis => "revenue_analysis",
            MessageType::CodeReview => "code_review",
            MessageType::MemoryRecall => "memory_recall",
            MessageType::GeneralQuery => "general_query",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    #[default]
    Normal,
    High,
}

/// Ephemeral, per-request analysis result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzedRequest {
    pub context: String,

    /// Matched capabilities in [`Capability::ALL`] order
    pub required_capabilities: Vec<Capability>,

    pub message_type: MessageType,

    pub urgency: Urgency,
}

impl AnalyzedRequest {
    pub fn requires(&self, capability: Capability) -> bool {
        self.required_capabilities.contains(&capability)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_camel_case() {
        let req = AnalyzedRequest {
            context: DEFAULT_CONTEXT.into(),
            required_capabilities: vec![Capability::Memory],
            message_type: MessageType::MemoryRecall,
            urgency: Urgency::Normal,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["requiredCapabilities"][0], "memory");
        assert_eq!(json["messageType"], "memory_recall");
        assert_eq!(json["urgency"], "normal");
    }

    #[test]
    fn message_type_labels() {
        assert_eq!(MessageType::RevenueAnalysis.to_string(), "revenue_analysis");
        assert_eq!(MessageType::GeneralQuery.as_str(), "general_query");
    }
}
