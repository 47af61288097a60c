//! Immutable task registry: one prompt template and one output schema per
//! task type, built once at startup and passed explicitly to the components
//! that need it. A single lookup key rules out template/schema mismatches.

use std::collections::HashMap;

use crate::schema::{BusinessRule, FieldKind, FieldSpec, OutputSchema};
use crate::task::TaskType;

#[derive(Clone, Debug, PartialEq)]
pub struct PromptTemplate {
    /// Role/system text, emitted first in every assembled prompt.
    pub role: String,
    /// Task instruction text, emitted verbatim after the context sections.
    pub instructions: String,
}

impl PromptTemplate {
    pub fn new(role: &str, instructions: &str) -> Self {
        Self { role: role.to_string(), instructions: instructions.to_string() }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TaskDefinition {
    pub template: PromptTemplate,
    pub schema: OutputSchema,
}

#[derive(Clone, Debug, Default)]
pub struct TaskRegistry {
    entries: HashMap<TaskType, TaskDefinition>,
}

impl TaskRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn define(mut self, task: TaskType, template: PromptTemplate, schema: OutputSchema) -> Self {
        self.entries.insert(task, TaskDefinition { template, schema });
        self
    }

    pub fn get(&self, task: TaskType) -> Option<&TaskDefinition> {
        self.entries.get(&task)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The built-in registry covering every task type.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();

        registry = registry.define(
            TaskType::CampaignCalendar,
            PromptTemplate::new(
                "You are a senior marketing strategist planning social media campaigns.",
                "Create a 30-day campaign calendar. Return a JSON object with a \
                 `campaign_calendar` array of exactly 30 daily entries (day, platform, \
                 content_type, theme, caption_hook) and a `summary` string.",
            ),
            OutputSchema::new(
                vec![
                    FieldSpec::new("campaign_calendar", FieldKind::Array),
                    FieldSpec::new("summary", FieldKind::String),
                ],
                vec![BusinessRule::ArrayLength {
                    field: "campaign_calendar".to_string(),
                    expected: 30,
                }],
            ),
        );

        registry = registry.define(
            TaskType::KpiGenerator,
            PromptTemplate::new(
                "You are a marketing analyst defining measurable campaign targets.",
                "Propose key performance indicators for the campaign. Return a JSON \
                 object with a `kpis` array (name, target, measurement) and a \
                 `summary` string.",
            ),
            OutputSchema::new(
                vec![
                    FieldSpec::new("kpis", FieldKind::Array),
                    FieldSpec::new("summary", FieldKind::String),
                ],
                vec![],
            ),
        );

        registry = registry.define(
            TaskType::MediaMixOptimizer,
            PromptTemplate::new(
                "You are a media planner allocating budget across channels.",
                "Recommend a media mix for the campaign. Return a JSON object with a \
                 `media_mix` object mapping channel names to budget percentages and a \
                 `rationale` string.",
            ),
            OutputSchema::new(
                vec![
                    FieldSpec::new("media_mix", FieldKind::Object),
                    FieldSpec::new("rationale", FieldKind::String),
                ],
                vec![],
            ),
        );

        registry = registry.define(
            TaskType::TextContent,
            PromptTemplate::new(
                "You are a social media copywriter matching the brand voice exactly.",
                "Write one post for the requested platform. Return a JSON object with \
                 `content` (string), `hashtags` (array of strings), and \
                 `predicted_engagement_score` (number from 0 to 100).",
            ),
            OutputSchema::new(
                vec![
                    FieldSpec::new("content", FieldKind::String),
                    FieldSpec::new("hashtags", FieldKind::Array),
                    FieldSpec::new("predicted_engagement_score", FieldKind::Number),
                ],
                vec![BusinessRule::NumberRange {
                    field: "predicted_engagement_score".to_string(),
                    min: 0.0,
                    max: 100.0,
                }],
            ),
        );

        registry = registry.define(
            TaskType::VisualContent,
            PromptTemplate::new(
                "You are an art director briefing image generation for brand content.",
                "Describe one branded visual. Return a JSON object with `image_prompt` \
                 (string), `caption` (string), and `alt_text` (string).",
            ),
            OutputSchema::new(
                vec![
                    FieldSpec::new("image_prompt", FieldKind::String),
                    FieldSpec::new("caption", FieldKind::String),
                    FieldSpec::new("alt_text", FieldKind::String),
                ],
                vec![],
            ),
        );

        registry = registry.define(
            TaskType::VideoScript,
            PromptTemplate::new(
                "You are a short-form video scriptwriter for social platforms.",
                "Write a short video script. Return a JSON object with `script` \
                 (string), `scenes` (array), and `duration_seconds` (number between \
                 15 and 60).",
            ),
            OutputSchema::new(
                vec![
                    FieldSpec::new("script", FieldKind::String),
                    FieldSpec::new("scenes", FieldKind::Array),
                    FieldSpec::new("duration_seconds", FieldKind::Number),
                ],
                vec![BusinessRule::NumberRange {
                    field: "duration_seconds".to_string(),
                    min: 15.0,
                    max: 60.0,
                }],
            ),
        );

        registry = registry.define(
            TaskType::PerformanceAnalysis,
            PromptTemplate::new(
                "You are a marketing performance analyst reviewing campaign metrics.",
                "Analyze the recent performance data. Return a JSON object with \
                 `insights` (array of strings), `recommendations` (array of strings), \
                 and `overall_engagement_score` (number from 0 to 100).",
            ),
            OutputSchema::new(
                vec![
                    FieldSpec::new("insights", FieldKind::Array),
                    FieldSpec::new("recommendations", FieldKind::Array),
                    FieldSpec::new("overall_engagement_score", FieldKind::Number),
                ],
                vec![BusinessRule::NumberRange {
                    field: "overall_engagement_score".to_string(),
                    min: 0.0,
                    max: 100.0,
                }],
            ),
        );

        registry = registry.define(
            TaskType::CustomerReply,
            PromptTemplate::new(
                "You are a customer support specialist replying on behalf of the brand.",
                "Draft a reply to the customer conversation. Return a JSON object with \
                 `reply` (string), `confidence_score` (number from 0 to 1), and \
                 `escalate` (boolean, true when a human should take over).",
            ),
            OutputSchema::new(
                vec![
                    FieldSpec::new("reply", FieldKind::String),
                    FieldSpec::new("confidence_score", FieldKind::Number),
                    FieldSpec::new("escalate", FieldKind::Boolean),
                ],
                vec![BusinessRule::NumberRange {
                    field: "confidence_score".to_string(),
                    min: 0.0,
                    max: 1.0,
                }],
            ),
        );

        registry
    }
}
