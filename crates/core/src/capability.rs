//! Capabilities — the closed set of kinds of work a service can perform.
//!
//! Each capability owns a fixed keyword list. The request analyzer matches
//! these keywords (case-insensitive substring) against free text, so the
//! classifier's behavior is fully described by [`Capability::keywords`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A tag describing a kind of work a service can perform.
///
/// Declaration order is significant: analyzed requests list matched
/// capabilities in this order, regardless of where keywords appear in the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Memory,
    CodeAnalysis,
    BusinessIntelligence,
    Research,
    TaskManagement,
}

impl Capability {
    /// Every capability, in declaration order.
    pub const ALL: [Capability; 5] = [
        Capability::Memory,
        Capability::CodeAnalysis,
        Capability::BusinessIntelligence,
        Capability::Research,
        Capability::TaskManagement,
    ];

    /// The wire/config name of this capability.
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Memory => "memory",
            Capability::CodeAnalysis => "code_analysis",
            Capability::BusinessIntelligence => "business_intelligence",
            Capability::Research => "research",
            Capability::TaskManagement => "task_management",
        }
    }

    /// Lowercase keywords that mark a request as needing this capability.
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            Capability::Memory => &[
                "remember", "recall", "memory", "memorize", "store", "save", "previous",
                "history", "forget",
            ],
            Capability::CodeAnalysis => &[
                "code", "bug", "security", "vulnerability", "refactor", "review", "function",
                "compile", "stack trace",
            ],
            Capability::BusinessIntelligence => &[
                "revenue", "sales", "profit", "customer", "kpi", "forecast", "pipeline",
                "churn", "quarter",
            ],
            Capability::Research => &[
                "research", "investigate", "competitor", "market", "trend", "deep dive",
            ],
            Capability::TaskManagement => &[
                "task", "todo", "deadline", "schedule", "milestone", "assign",
            ],
        }
    }

    /// Whether any of this capability's keywords occur in `lowercase_text`.
    pub fn matches(&self, lowercase_text: &str) -> bool {
        self.keywords().iter().any(|k| lowercase_text.contains(k))
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Capability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Capability::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown capability '{s}'"))
    }
}
