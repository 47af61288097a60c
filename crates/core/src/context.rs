//! Task-scoped context bundle injected into prompts.
//!
//! A [`Context`] is built fresh per request and never mutated after it enters
//! the assembler: the optimizer and the guardrail filter both return new
//! derived values, so memory snapshots stay faithful to what was sent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::task::TaskType;

pub mod sections {
    pub const BUSINESS: &str = "business";
    pub const CAMPAIGN: &str = "campaign";
    pub const PERFORMANCE: &str = "performance";
    pub const CONVERSATION: &str = "conversation";
    /// Attached by the retry controller after a validation failure.
    pub const REVISION: &str = "revision";
}

/// Scalar bookkeeping fields stashed alongside the sections. Used for memory
/// scoping; never rendered into prompts.
pub mod fields {
    pub const BUSINESS_ID: &str = "business_id";
    pub const CAMPAIGN_ID: &str = "campaign_id";
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Context {
    pub task_type: TaskType,
    pub created_at: DateTime<Utc>,
    /// Named sections plus task-specific scalar fields. `serde_json::Map`
    /// keeps keys ordered, which the assembler relies on for determinism.
    pub sections: Map<String, Value>,
}

impl Context {
    pub fn new(task_type: TaskType, created_at: DateTime<Utc>) -> Self {
        Self { task_type, created_at, sections: Map::new() }
    }

    pub fn with_section(mut self, name: &str, value: Value) -> Self {
        self.sections.insert(name.to_string(), value);
        self
    }

    pub fn section(&self, name: &str) -> Option<&Value> {
        self.sections.get(name)
    }

    /// Scalar convenience for id fields stashed alongside the sections.
    pub fn scalar_str(&self, name: &str) -> Option<&str> {
        self.sections.get(name).and_then(Value::as_str)
    }
}

/// Read-only business record snapshot supplied by the context accessor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BusinessSnapshot {
    pub name: String,
    pub industry: String,
    pub brand_voice: String,
    pub target_audience: Audience,
    pub campaign_goal: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub past_performance: Option<Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Audience {
    pub description: String,
    #[serde(default)]
    pub interests: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CampaignSnapshot {
    pub name: String,
    pub duration_days: u32,
    pub media_mix: Value,
    pub status: String,
    pub start_date: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSnapshot {
    pub recent_metrics: Value,
    #[serde(default)]
    pub top_content: Vec<Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConversationSnapshot {
    pub last_messages: Vec<ConversationMessage>,
    pub sentiment: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_profile: Option<Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub from: String,
    pub text: String,
}
