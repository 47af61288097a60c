//! The externally callable pipeline: accessor lookups, inbound filtering,
//! cost optimization, assemble → invoke → validate under the retry policy,
//! outbound filtering, then memory and usage recording.
//!
//! Stages run strictly in order within one request; separate requests are
//! independent tasks that only meet at the memory store and usage table.

use std::sync::Arc;

use serde_json::Value;
use uuid::Uuid;

use promo_core::assemble::PromptAssembler;
use promo_core::config::PipelineConfig;
use promo_core::context::Context;
use promo_core::cost::CostOptimizer;
use promo_core::errors::PipelineError;
use promo_core::guardrails::{GuardrailFilter, SAFETY_WARNING_FIELD};
use promo_core::task::{ModelTier, TaskType};
use promo_core::templates::{TaskDefinition, TaskRegistry};
use promo_core::validate::validate_output;
use promo_memory::{MemoryRecord, MemoryStore, UsageRecord, UsageTracker};

use crate::accessors::ContextAccessor;
use crate::builder::{ContextBuilder, GenerationRequest};
use crate::llm::ModelClient;
use crate::retry::RetryPolicy;

#[derive(Clone, Debug, PartialEq)]
pub struct GenerationMetadata {
    pub task_type: TaskType,
    pub model_tier: ModelTier,
    pub estimated_tokens: u64,
    pub estimated_cost: f64,
    pub attempts: u32,
}

/// Successful pipeline result: the filtered, validated structured value plus
/// the exact prompt that produced it.
#[derive(Clone, Debug, PartialEq)]
pub struct GenerationOutput {
    pub result: Value,
    pub assembled_prompt: String,
    pub metadata: GenerationMetadata,
}

pub struct Pipeline<A, M> {
    registry: TaskRegistry,
    assembler: PromptAssembler,
    guardrails: GuardrailFilter,
    optimizer: CostOptimizer,
    retry: RetryPolicy,
    recent_limit: usize,
    accessor: A,
    model: M,
    memory: Arc<MemoryStore>,
    usage: Arc<UsageTracker>,
}

impl<A, M> Pipeline<A, M>
where
    A: ContextAccessor,
    M: ModelClient,
{
    pub fn new(config: PipelineConfig, accessor: A, model: M) -> Self {
        Self::with_registry(TaskRegistry::builtin(), config, accessor, model)
    }

    /// Construct with an explicit registry. Tests and embedders can run
    /// parallel pipelines with distinct registries.
    pub fn with_registry(
        registry: TaskRegistry,
        config: PipelineConfig,
        accessor: A,
        model: M,
    ) -> Self {
        Self {
            registry,
            assembler: PromptAssembler::new(),
            guardrails: GuardrailFilter::new(config.guardrails),
            optimizer: CostOptimizer::new(config.cost),
            retry: RetryPolicy::new(config.retry),
            recent_limit: config.memory.recent_limit,
            accessor,
            model,
            memory: Arc::new(MemoryStore::new(config.memory)),
            usage: Arc::new(UsageTracker::new()),
        }
    }

    pub fn memory(&self) -> &MemoryStore {
        &self.memory
    }

    pub fn usage(&self) -> &UsageTracker {
        &self.usage
    }

    /// Recent short-lived contexts for a task, using the configured window.
    pub async fn recent_contexts(
        &self,
        task_type: TaskType,
        business_id: Option<&str>,
    ) -> Vec<MemoryRecord> {
        self.memory.recent_contexts(task_type, business_id, self.recent_limit).await
    }

    pub async fn usage_snapshot(&self) -> Vec<UsageRecord> {
        self.usage.snapshot().await
    }

    /// Run the full pipeline for one request. Every surfaced error belongs to
    /// the documented taxonomy; callers must treat any error as "no usable
    /// result produced".
    pub async fn generate(
        &self,
        task_type: TaskType,
        request: GenerationRequest,
    ) -> Result<GenerationOutput, PipelineError> {
        let request_id = Uuid::new_v4();
        let definition = self
            .registry
            .get(task_type)
            .ok_or(PipelineError::Configuration(task_type))?;

        tracing::info!(%request_id, task = %task_type, "generation started");

        let built = ContextBuilder::new(&self.accessor).build(task_type, &request).await?;
        let filtered = self.guardrails.filter_inbound(&built);
        let optimized = self.optimizer.optimize(&filtered);
        let tier = self.optimizer.tier_for(task_type);

        let (validated, prompt, attempts) =
            self.attempt_until_valid(request_id, task_type, definition, &optimized, tier).await?;

        let result = self.guardrails.filter_outbound(&validated);
        if result.get(SAFETY_WARNING_FIELD).is_some() {
            tracing::warn!(%request_id, task = %task_type, "response flagged for human review");
        }

        self.memory.record_context(task_type, &optimized).await;
        self.memory.record_response(task_type, &optimized, &result).await;

        let estimated_tokens = self.optimizer.estimate_tokens(&prompt);
        let estimated_cost = self.optimizer.estimate_cost(&prompt, task_type);
        tracing::info!(
            %request_id,
            task = %task_type,
            attempts,
            estimated_tokens,
            estimated_cost,
            "generation complete"
        );

        Ok(GenerationOutput {
            result,
            assembled_prompt: prompt,
            metadata: GenerationMetadata {
                task_type,
                model_tier: tier,
                estimated_tokens,
                estimated_cost,
                attempts,
            },
        })
    }

    /// Assemble → invoke → validate, retrying validation failures with linear
    /// backoff until the budget is spent. Accessor and transport failures are
    /// never retried here. Usage is recorded for every invocation that
    /// completes, valid output or not — the tokens were spent either way.
    async fn attempt_until_valid(
        &self,
        request_id: Uuid,
        task_type: TaskType,
        definition: &TaskDefinition,
        optimized: &Context,
        tier: ModelTier,
    ) -> Result<(Value, String, u32), PipelineError> {
        let mut context = optimized.clone();
        let mut attempt: u32 = 1;

        loop {
            let prompt = self.assembler.assemble(&definition.template, &context);
            tracing::debug!(%request_id, task = %task_type, attempt, tier = %tier, "invoking model");

            let raw = self.model.complete(&prompt, tier).await?;
            self.usage
                .record_invocation(task_type, self.optimizer.estimate_cost(&prompt, task_type))
                .await;

            match validate_output(&definition.schema, &raw) {
                Ok(value) => return Ok((value, prompt, attempt)),
                Err(error) if attempt < self.retry.total_attempts() => {
                    tracing::warn!(
                        %request_id,
                        task = %task_type,
                        attempt,
                        %error,
                        "validation failed, retrying"
                    );
                    tokio::time::sleep(self.retry.backoff_delay(attempt)).await;
                    context = self.retry.amend_context(context, &error);
                    attempt += 1;
                }
                Err(error) => {
                    tracing::error!(
                        %request_id,
                        task = %task_type,
                        attempts = attempt,
                        %error,
                        "retry budget exhausted"
                    );
                    return Err(PipelineError::RetryExhausted {
                        task_type,
                        attempts: attempt,
                        last: error,
                    });
                }
            }
        }
    }
}
