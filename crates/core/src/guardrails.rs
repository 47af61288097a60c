//! Safety guardrails for inbound context and outbound model responses.
//!
//! The filter walks the closed JSON value shape set (string, number, boolean,
//! array, object), redacting blocked terms wherever a string appears. Inbound
//! context additionally loses audience-interest entries touching controversial
//! topics; outbound responses are scanned for risky phrases and tagged with an
//! advisory `safety_warning`. Filtering never fails and is idempotent: the
//! redaction marker itself matches no blocked term.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::context::Context;

pub const SAFETY_WARNING_FIELD: &str = "safety_warning";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GuardrailConfig {
    pub blocked_terms: Vec<String>,
    pub controversial_topics: Vec<String>,
    pub risky_phrases: Vec<String>,
    pub redaction_marker: String,
}

impl Default for GuardrailConfig {
    fn default() -> Self {
        Self {
            blocked_terms: [
                "scam",
                "get rich quick",
                "miracle cure",
                "clickbait",
                "pyramid scheme",
            ]
            .map(String::from)
            .to_vec(),
            controversial_topics: ["politics", "religion", "gambling", "firearms"]
                .map(String::from)
                .to_vec(),
            risky_phrases: [
                "guaranteed results",
                "medical advice",
                "legal advice",
                "risk-free",
                "100% success",
            ]
            .map(String::from)
            .to_vec(),
            redaction_marker: "[filtered]".to_string(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct GuardrailFilter {
    config: GuardrailConfig,
}

impl GuardrailFilter {
    pub fn new(config: GuardrailConfig) -> Self {
        Self { config }
    }

    /// Scrub a freshly built context. Returns a new derived context; the
    /// input is never mutated.
    pub fn filter_inbound(&self, context: &Context) -> Context {
        let mut filtered = context.clone();
        filtered.sections = self.scrub_map(&context.sections, true);
        filtered
    }

    /// Scrub an accepted model response and attach an advisory
    /// `safety_warning` when risky phrasing is detected. Advisory only, never
    /// a block: the caller decides whether human review gates publication.
    pub fn filter_outbound(&self, response: &Value) -> Value {
        let mut scrubbed = self.scrub_value(response, false);

        let serialized = scrubbed.to_string().to_lowercase();
        let matched: Vec<&str> = self
            .config
            .risky_phrases
            .iter()
            .map(String::as_str)
            .filter(|phrase| serialized.contains(&phrase.to_lowercase()))
            .collect();

        if !matched.is_empty() {
            if let Value::Object(object) = &mut scrubbed {
                object.insert(
                    SAFETY_WARNING_FIELD.to_string(),
                    Value::String(format!(
                        "requires human review before use: mentions {}",
                        matched.join(", ")
                    )),
                );
            }
        }

        scrubbed
    }

    fn scrub_value(&self, value: &Value, inbound: bool) -> Value {
        match value {
            Value::String(text) => Value::String(self.redact(text)),
            Value::Array(items) => {
                Value::Array(items.iter().map(|item| self.scrub_value(item, inbound)).collect())
            }
            Value::Object(map) => Value::Object(self.scrub_map(map, inbound)),
            other => other.clone(),
        }
    }

    fn scrub_map(&self, map: &Map<String, Value>, inbound: bool) -> Map<String, Value> {
        map.iter()
            .map(|(key, value)| {
                let scrubbed = if inbound && key == "interests" {
                    self.scrub_interests(value)
                } else {
                    self.scrub_value(value, inbound)
                };
                (key.clone(), scrubbed)
            })
            .collect()
    }

    /// Audience interests get the stricter inbound treatment: entries that so
    /// much as mention a controversial topic are dropped, not redacted.
    fn scrub_interests(&self, value: &Value) -> Value {
        match value {
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .filter(|item| match item.as_str() {
                        Some(text) => !self.mentions_controversial_topic(text),
                        None => true,
                    })
                    .map(|item| self.scrub_value(item, true))
                    .collect(),
            ),
            other => self.scrub_value(other, true),
        }
    }

    fn mentions_controversial_topic(&self, text: &str) -> bool {
        let lowered = text.to_lowercase();
        self.config.controversial_topics.iter().any(|topic| lowered.contains(&topic.to_lowercase()))
    }

    fn redact(&self, text: &str) -> String {
        let mut redacted = text.to_string();
        for term in &self.config.blocked_terms {
            redacted = replace_case_insensitive(&redacted, term, &self.config.redaction_marker);
        }
        redacted
    }
}

fn replace_case_insensitive(haystack: &str, needle: &str, replacement: &str) -> String {
    if needle.is_empty() {
        return haystack.to_string();
    }

    // Scans the original string char by char instead of searching a
    // lowercased copy: lowercasing is not byte-length-preserving (e.g.
    // 'İ' lowers to two chars), so offsets found in a lowered copy cannot
    // be applied back to the original.
    let lowered_needle = needle.to_lowercase();
    let mut result = String::with_capacity(haystack.len());
    let mut rest = haystack;

    while let Some(ch) = rest.chars().next() {
        match prefix_match_len(rest, &lowered_needle) {
            Some(matched) => {
                result.push_str(replacement);
                rest = &rest[matched..];
            }
            None => {
                result.push(ch);
                rest = &rest[ch.len_utf8()..];
            }
        }
    }
    result
}

/// Length in bytes of the prefix of `text` whose lowercase form equals
/// `lowered_needle`, or `None` when no whole-character prefix matches.
fn prefix_match_len(text: &str, lowered_needle: &str) -> Option<usize> {
    let mut lowered = String::with_capacity(lowered_needle.len());
    let mut taken = 0;

    for ch in text.chars() {
        for low in ch.to_lowercase() {
            lowered.push(low);
        }
        taken += ch.len_utf8();
        if lowered.len() >= lowered_needle.len() {
            return (lowered == lowered_needle).then_some(taken);
        }
    }
    None
}
