//! Output schemas: required fields, primitive kinds, and the per-task
//! business rules layered on top of them.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    String,
    Number,
    Boolean,
    Array,
    Object,
}

impl FieldKind {
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Array => value.is_array(),
            Self::Object => value.is_object(),
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub fn new(name: &str, kind: FieldKind) -> Self {
        Self { name: name.to_string(), kind }
    }
}

/// Business-rule predicate evaluated after structural checks pass.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "rule")]
pub enum BusinessRule {
    /// The named array field must contain exactly `expected` entries.
    ArrayLength { field: String, expected: usize },
    /// The named numeric field must lie in `[min, max]`, bounds inclusive.
    NumberRange { field: String, min: f64, max: f64 },
}

impl BusinessRule {
    pub fn describe(&self) -> String {
        match self {
            Self::ArrayLength { field, expected } => {
                format!("{field} must contain exactly {expected} entries")
            }
            Self::NumberRange { field, min, max } => {
                format!("{field} must be between {min} and {max}")
            }
        }
    }
}

/// Required output shape for one task type. Looked up through the same
/// registry key as the prompt template, so the two can never be mismatched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OutputSchema {
    pub fields: Vec<FieldSpec>,
    pub rules: Vec<BusinessRule>,
}

impl OutputSchema {
    pub fn new(fields: Vec<FieldSpec>, rules: Vec<BusinessRule>) -> Self {
        Self { fields, rules }
    }
}
