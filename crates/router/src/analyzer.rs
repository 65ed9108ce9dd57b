//! Request analyzer — classifies free text into capabilities, a message type,
//! and an urgency flag.
//!
//! Pure: depends only on its inputs and the static keyword tables.

use switchboard_core::capability::Capability;
use switchboard_core::request::{
    AnalyzedRequest, DEFAULT_CONTEXT, MessageType, URGENT_CONTEXT, Urgency,
};

/// Message-type rules, checked in order; the first match wins.
pub const MESSAGE_TYPE_RULES: &[(MessageType, &[&str])] = &[
    (
        MessageType::RevenueAnalysis,
        &["revenue", "sales", "profit", "earnings", "income"],
    ),
    (
        MessageType::CodeReview,
        &["code", "security", "vulnerability", "bug", "refactor"],
    ),
    (
        MessageType::MemoryRecall,
        &["remember", "recall", "memory", "previous", "history"],
    ),
];

/// Analyze `text` in `context` (blank contexts become `"general"`).
pub fn analyze(text: &str, context: Option<&str>) -> AnalyzedRequest {
    let context = context
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(DEFAULT_CONTEXT)
        .to_string();
    let lowered = text.to_lowercase();

    AnalyzedRequest {
        required_capabilities: extract_capabilities(&lowered),
        message_type: classify(&lowered),
        urgency: if context == URGENT_CONTEXT {
            Urgency::High
        } else {
            Urgency::Normal
        },
        context,
    }
}

/// Capabilities whose keywords occur in `lowered`, in declaration order.
pub fn extract_capabilities(lowered: &str) -> Vec<Capability> {
    Capability::ALL
        .into_iter()
        .filter(|cap| cap.matches(lowered))
        .collect()
}

pub fn classify(lowered: &str) -> MessageType {
    MESSAGE_TYPE_RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lowered.contains(k)))
        .map(|(message_type, _)| *message_type)
        .unwrap_or(MessageType::GeneralQuery)
}
