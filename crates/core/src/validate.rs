//! Output validation: parse, structural checks, then business rules.
//!
//! Checks run fail-fast in a fixed order and the first violation wins. On
//! success the parsed value is returned with no coercion beyond the parse.

use serde_json::Value;
use thiserror::Error;

use crate::schema::{BusinessRule, FieldKind, OutputSchema};

#[derive(Clone, Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("malformed structured output")]
    MalformedOutput,
    #[error("missing required field: {field}")]
    MissingField { field: String },
    #[error("field {field} must be a {expected}")]
    WrongKind { field: String, expected: FieldKind },
    #[error("{reason}")]
    RuleViolation { rule: String, reason: String },
}

/// Parse raw model output and validate it against `schema`.
pub fn validate_output(schema: &OutputSchema, raw: &str) -> Result<Value, ValidationError> {
    let value: Value = serde_json::from_str(raw).map_err(|_| ValidationError::MalformedOutput)?;
    validate_value(schema, value)
}

/// Validate an already-structured value against `schema`.
pub fn validate_value(schema: &OutputSchema, value: Value) -> Result<Value, ValidationError> {
    let object = value.as_object().ok_or(ValidationError::MalformedOutput)?;

    for field in &schema.fields {
        if !object.contains_key(&field.name) {
            return Err(ValidationError::MissingField { field: field.name.clone() });
        }
    }

    for field in &schema.fields {
        let present = &object[&field.name];
        if !field.kind.matches(present) {
            return Err(ValidationError::WrongKind {
                field: field.name.clone(),
                expected: field.kind,
            });
        }
    }

    for rule in &schema.rules {
        check_rule(rule, object)?;
    }

    Ok(value)
}

fn check_rule(
    rule: &BusinessRule,
    object: &serde_json::Map<String, Value>,
) -> Result<(), ValidationError> {
    match rule {
        BusinessRule::ArrayLength { field, expected } => {
            let len = object.get(field).and_then(Value::as_array).map(Vec::len);
            match len {
                Some(len) if len == *expected => Ok(()),
                Some(len) => Err(ValidationError::RuleViolation {
                    rule: rule.describe(),
                    reason: format!("{field} must contain exactly {expected} entries, got {len}"),
                }),
                // Rules only apply to fields the schema declared; a missing or
                // non-array field was already rejected structurally.
                None => Ok(()),
            }
        }
        BusinessRule::NumberRange { field, min, max } => {
            let number = object.get(field).and_then(Value::as_f64);
            match number {
                Some(n) if n >= *min && n <= *max => Ok(()),
                Some(n) => Err(ValidationError::RuleViolation {
                    rule: rule.describe(),
                    reason: format!("{field} must be between {min} and {max}, got {n}"),
                }),
                None => Ok(()),
            }
        }
    }
}
