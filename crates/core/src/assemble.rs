//! Deterministic prompt assembly.
//!
//! Section order is a contract: role text, BUSINESS CONTEXT, CAMPAIGN
//! CONTEXT, PERFORMANCE CONTEXT, CONVERSATION CONTEXT, additional scalar
//! fields, task instructions, any retry revision note, closing directive.
//! Identical template + context must yield byte-identical prompt text; the
//! retry controller and tests depend on that.

use serde_json::Value;

use crate::context::{fields, sections, Context};
use crate::templates::PromptTemplate;

const CLOSING_DIRECTIVE: &str =
    "Respond with valid JSON only. Do not include prose, markdown, or explanations.";

/// Known sections in emission order, with the preferred field order inside
/// each. Fields outside the preferred list render after it, in key order.
const SECTION_LAYOUT: &[(&str, &str, &[&str])] = &[
    (
        sections::BUSINESS,
        "BUSINESS CONTEXT",
        &["name", "industry", "brand_voice", "target_audience", "campaign_goal", "past_performance"],
    ),
    (
        sections::CAMPAIGN,
        "CAMPAIGN CONTEXT",
        &["name", "duration_days", "media_mix", "status", "start_date"],
    ),
    (sections::PERFORMANCE, "PERFORMANCE CONTEXT", &["recent_metrics", "top_content"]),
    (
        sections::CONVERSATION,
        "CONVERSATION CONTEXT",
        &["last_messages", "sentiment", "customer_profile"],
    ),
];

#[derive(Clone, Copy, Debug, Default)]
pub struct PromptAssembler;

impl PromptAssembler {
    pub fn new() -> Self {
        Self
    }

    /// Pure function of the template and context; no clock, no randomness.
    pub fn assemble(&self, template: &PromptTemplate, context: &Context) -> String {
        let mut blocks: Vec<String> = vec![template.role.clone()];

        for (section, header, field_order) in SECTION_LAYOUT {
            if let Some(value) = context.section(section) {
                blocks.push(render_section(header, value, field_order));
            }
        }

        let extras = render_extra_fields(context);
        if !extras.is_empty() {
            blocks.push(extras);
        }

        blocks.push(template.instructions.clone());

        if let Some(revision) = context.section(sections::REVISION) {
            blocks.push(render_revision(revision));
        }

        blocks.push(CLOSING_DIRECTIVE.to_string());
        blocks.join("\n\n")
    }
}

fn render_section(header: &str, value: &Value, field_order: &[&str]) -> String {
    let mut lines = vec![header.to_string()];

    match value.as_object() {
        Some(object) => {
            for field in field_order {
                if let Some(field_value) = object.get(*field) {
                    lines.push(format!("- {field}: {}", render_value(field_value)));
                }
            }
            // serde_json::Map iterates in key order, so leftovers are stable.
            for (key, field_value) in object {
                if !field_order.contains(&key.as_str()) {
                    lines.push(format!("- {key}: {}", render_value(field_value)));
                }
            }
        }
        None => lines.push(format!("- {}", render_value(value))),
    }

    lines.join("\n")
}

fn render_extra_fields(context: &Context) -> String {
    // Named sections render above, the revision note renders below, and the
    // bookkeeping ids are memory-scoping metadata the model never sees.
    let known: Vec<&str> = SECTION_LAYOUT
        .iter()
        .map(|(section, _, _)| *section)
        .chain([sections::REVISION, fields::BUSINESS_ID, fields::CAMPAIGN_ID])
        .collect();

    let mut lines = Vec::new();
    for (key, value) in &context.sections {
        if !known.contains(&key.as_str()) {
            lines.push(format!("- {key}: {}", render_value(value)));
        }
    }

    if lines.is_empty() {
        String::new()
    } else {
        format!("ADDITIONAL CONTEXT\n{}", lines.join("\n"))
    }
}

fn render_revision(revision: &Value) -> String {
    let error = revision
        .get("previous_error")
        .and_then(Value::as_str)
        .unwrap_or("previous output failed validation");
    let instruction = revision
        .get("instruction")
        .and_then(Value::as_str)
        .unwrap_or("Fix the issue and resubmit valid structured output only.");
    format!("PREVIOUS ATTEMPT ERROR: {error}\n{instruction}")
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
