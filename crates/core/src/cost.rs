//! Cost optimization: model-tier routing, context trimming, and token/cost
//! estimation.
//!
//! The token count is `ceil(chars / 4)`. That is a coarse approximation, not
//! a tokenizer, and every number derived from it is an estimate.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::context::{sections, Context};
use crate::task::{ModelTier, TaskType};

/// Price per 1K tokens for one model tier, split by direction.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TierPricing {
    pub input_per_1k: f64,
    pub output_per_1k: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CostConfig {
    /// Share of the token estimate billed at the input rate; the remainder is
    /// billed at the output rate. A fixed heuristic, not a measurement.
    pub input_split: f64,
    /// Conversation history is truncated to this many most-recent messages.
    pub max_history_messages: usize,
    pub cheap: TierPricing,
    pub standard: TierPricing,
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            input_split: 0.8,
            max_history_messages: 3,
            cheap: TierPricing { input_per_1k: 0.0005, output_per_1k: 0.0015 },
            standard: TierPricing { input_per_1k: 0.005, output_per_1k: 0.015 },
        }
    }
}

#[derive(Clone, Debug)]
pub struct CostOptimizer {
    config: CostConfig,
}

impl CostOptimizer {
    pub fn new(config: CostConfig) -> Self {
        Self { config }
    }

    /// Tier routing is driven by the task's static classification, so this
    /// answer and the one used inside [`estimate_cost`](Self::estimate_cost)
    /// always agree.
    pub fn tier_for(&self, task: TaskType) -> ModelTier {
        if task.is_simple() {
            ModelTier::Cheap
        } else {
            ModelTier::Standard
        }
    }

    /// Produce a trimmed derived context: conversation history capped to the
    /// most recent messages, empty containers dropped so they neither inflate
    /// the token estimate nor hand the model vacuous sections.
    pub fn optimize(&self, context: &Context) -> Context {
        let mut optimized = context.clone();
        optimized.sections = context
            .sections
            .iter()
            .filter_map(|(key, value)| {
                let trimmed = if key == sections::CONVERSATION {
                    self.trim_conversation(value)
                } else {
                    value.clone()
                };
                prune_empty(trimmed).map(|kept| (key.clone(), kept))
            })
            .collect();
        optimized
    }

    pub fn estimate_tokens(&self, text: &str) -> u64 {
        // Characters, not bytes: multibyte text must not inflate the
        // estimate.
        (text.chars().count() as u64).div_ceil(4)
    }

    /// Estimated dollar cost of one invocation for `task`, splitting the
    /// token estimate between input and output pricing of the task's tier.
    pub fn estimate_cost(&self, prompt: &str, task: TaskType) -> f64 {
        let tokens = self.estimate_tokens(prompt) as f64;
        let pricing = match self.tier_for(task) {
            ModelTier::Cheap => self.config.cheap,
            ModelTier::Standard => self.config.standard,
        };

        let input_tokens = tokens * self.config.input_split;
        let output_tokens = tokens * (1.0 - self.config.input_split);
        input_tokens / 1000.0 * pricing.input_per_1k
            + output_tokens / 1000.0 * pricing.output_per_1k
    }

    fn trim_conversation(&self, conversation: &Value) -> Value {
        let Some(object) = conversation.as_object() else {
            return conversation.clone();
        };

        let mut trimmed = object.clone();
        if let Some(messages) = trimmed.get("last_messages").and_then(Value::as_array) {
            let keep = self.config.max_history_messages;
            if messages.len() > keep {
                let recent = messages[messages.len() - keep..].to_vec();
                trimmed.insert("last_messages".to_string(), Value::Array(recent));
            }
        }
        Value::Object(trimmed)
    }
}

/// Drop empty arrays, objects, strings, and nulls, recursively. Returns
/// `None` when nothing survives.
fn prune_empty(value: Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::String(text) if text.is_empty() => None,
        Value::Array(items) => {
            let kept: Vec<Value> = items.into_iter().filter_map(prune_empty).collect();
            if kept.is_empty() {
                None
            } else {
                Some(Value::Array(kept))
            }
        }
        Value::Object(map) => {
            let kept: Map<String, Value> = map
                .into_iter()
                .filter_map(|(key, value)| prune_empty(value).map(|kept| (key, kept)))
                .collect();
            if kept.is_empty() {
                None
            } else {
                Some(Value::Object(kept))
            }
        }
        other => Some(other),
    }
}
