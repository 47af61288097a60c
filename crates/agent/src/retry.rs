//! Bounded retry with linear backoff for validation failures.
//!
//! The policy is pure bookkeeping: delay math and context amendment. The
//! pipeline owns the attempt loop, so cancellation stays structural — a
//! caller that drops the `generate` future aborts cleanly between attempts
//! (the backoff sleep and the model call are the only awaits inside the
//! loop), and nothing is recorded for an aborted attempt.

use std::time::Duration;

use serde_json::json;

use promo_core::config::RetryConfig;
use promo_core::context::{sections, Context};
use promo_core::validate::ValidationError;

pub const REVISION_INSTRUCTION: &str =
    "Fix the issue and resubmit valid structured output only.";

#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    max_retries: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: Duration::from_millis(config.base_delay_ms),
        }
    }

    /// Total attempts including the initial one.
    pub fn total_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// Linear backoff: attempt N waits N × base before the next invocation.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }

    /// Amend the context for the next attempt: carry the validation failure
    /// and an explicit resubmission instruction. Returns a new derived
    /// context, replacing any revision note from an earlier attempt.
    pub fn amend_context(&self, context: Context, error: &ValidationError) -> Context {
        let mut amended = context;
        amended.sections.insert(
            sections::REVISION.to_string(),
            json!({
                "previous_error": error.to_string(),
                "instruction": REVISION_INSTRUCTION,
            }),
        );
        amended
    }
}
