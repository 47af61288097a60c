//! End-to-end pipeline scenarios with stubbed accessors and model clients.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;

use promo_agent::{ContextAccessor, GenerationRequest, ModelClient, Pipeline};
use promo_core::config::PipelineConfig;
use promo_core::context::{
    Audience, BusinessSnapshot, CampaignSnapshot, ConversationMessage, ConversationSnapshot,
    PerformanceSnapshot,
};
use promo_core::errors::{AccessorError, PipelineError, TransportError};
use promo_core::task::{ModelTier, TaskType};
use promo_core::templates::TaskRegistry;
use promo_core::validate::ValidationError;

struct StubAccessor;

#[async_trait]
impl ContextAccessor for StubAccessor {
    async fn business_context(&self, id: &str) -> Result<BusinessSnapshot, AccessorError> {
        if id != "b-1" {
            return Err(AccessorError::UnknownId(id.to_string()));
        }
        Ok(BusinessSnapshot {
            name: "Acme Coffee".to_string(),
            industry: "food & beverage".to_string(),
            brand_voice: "warm, playful".to_string(),
            target_audience: Audience {
                description: "commuters".to_string(),
                interests: vec!["coffee".to_string(), "politics".to_string()],
            },
            campaign_goal: "grow weekday traffic, no get rich quick vibes".to_string(),
            past_performance: None,
        })
    }

    async fn campaign_context(&self, id: &str) -> Result<CampaignSnapshot, AccessorError> {
        if id != "c-1" {
            return Err(AccessorError::UnknownId(id.to_string()));
        }
        Ok(CampaignSnapshot {
            name: "Spring Mornings".to_string(),
            duration_days: 30,
            media_mix: json!({"instagram": 60, "tiktok": 40}),
            status: "active".to_string(),
            start_date: "2026-03-01".to_string(),
        })
    }

    async fn performance_context(
        &self,
        _campaign_id: &str,
    ) -> Result<PerformanceSnapshot, AccessorError> {
        Ok(PerformanceSnapshot { recent_metrics: json!({"impressions": 12000}), top_content: vec![] })
    }

    async fn conversation_context(
        &self,
        _id: &str,
    ) -> Result<ConversationSnapshot, AccessorError> {
        Ok(ConversationSnapshot {
            last_messages: vec![ConversationMessage {
                from: "customer".to_string(),
                text: "is the spring blend back?".to_string(),
            }],
            sentiment: "positive".to_string(),
            customer_profile: None,
        })
    }
}

/// Replays a fixed script of model responses and records every prompt.
struct ScriptedModel {
    script: Mutex<VecDeque<Result<String, TransportError>>>,
    prompts: Mutex<Vec<String>>,
    tiers: Mutex<Vec<ModelTier>>,
}

impl ScriptedModel {
    fn new(script: Vec<Result<String, TransportError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            prompts: Mutex::new(Vec::new()),
            tiers: Mutex::new(Vec::new()),
        }
    }

    fn always(response: &str) -> Self {
        Self::new(vec![Ok(response.to_string()); 8])
    }

    fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    fn prompt(&self, index: usize) -> String {
        self.prompts.lock().unwrap()[index].clone()
    }
}

#[async_trait]
impl ModelClient for &ScriptedModel {
    async fn complete(&self, prompt: &str, tier: ModelTier) -> Result<String, TransportError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.tiers.lock().unwrap().push(tier);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Backend("script exhausted".to_string())))
    }
}

fn fast_config() -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.retry.base_delay_ms = 5;
    config
}

fn valid_reply() -> String {
    json!({"reply": "Yes, the spring blend is back!", "confidence_score": 0.92, "escalate": false})
        .to_string()
}

#[tokio::test]
async fn generate_returns_result_prompt_and_metadata() {
    let model = ScriptedModel::always(&valid_reply());
    let pipeline = Pipeline::new(fast_config(), StubAccessor, &model);

    let request = GenerationRequest::for_business("b-1")
        .with_campaign("c-1")
        .with_conversation("t-1");
    let output = pipeline.generate(TaskType::CustomerReply, request).await.expect("generate");

    assert_eq!(output.result["reply"], "Yes, the spring blend is back!");
    assert_eq!(output.metadata.task_type, TaskType::CustomerReply);
    assert_eq!(output.metadata.model_tier, ModelTier::Cheap);
    assert_eq!(output.metadata.attempts, 1);
    assert!(output.metadata.estimated_tokens > 0);
    assert!(output.metadata.estimated_cost > 0.0);

    // The prompt honors the section contract and reflects inbound filtering.
    assert!(output.assembled_prompt.contains("BUSINESS CONTEXT"));
    assert!(output.assembled_prompt.contains("CONVERSATION CONTEXT"));
    assert!(output.assembled_prompt.contains("[filtered]"));
    assert!(!output.assembled_prompt.contains("get rich quick"));
    assert!(!output.assembled_prompt.contains("politics"));
    // Scoping ids are metadata, not prompt content.
    assert!(!output.assembled_prompt.contains("business_id"));
    assert!(!output.assembled_prompt.contains("campaign_id"));
}

#[tokio::test]
async fn standard_tier_tasks_are_invoked_on_standard_tier() {
    let calendar: Vec<_> = (0..30).map(|d| json!({"day": d + 1, "platform": "instagram"})).collect();
    let payload = json!({"campaign_calendar": calendar, "summary": "thirty days"}).to_string();
    let model = ScriptedModel::always(&payload);
    let pipeline = Pipeline::new(fast_config(), StubAccessor, &model);

    let output = pipeline
        .generate(TaskType::CampaignCalendar, GenerationRequest::for_business("b-1"))
        .await
        .expect("generate");

    assert_eq!(output.metadata.model_tier, ModelTier::Standard);
    assert_eq!(model.tiers.lock().unwrap()[0], ModelTier::Standard);
}

#[tokio::test]
async fn validation_failures_are_retried_and_third_attempt_wins() {
    let model = ScriptedModel::new(vec![
        Ok("not json at all".to_string()),
        Ok(json!({"reply": "hi"}).to_string()),
        Ok(valid_reply()),
    ]);
    let pipeline = Pipeline::new(fast_config(), StubAccessor, &model);

    let request = GenerationRequest::for_business("b-1").with_conversation("t-1");
    let output = pipeline.generate(TaskType::CustomerReply, request).await.expect("generate");

    assert_eq!(output.metadata.attempts, 3);
    assert_eq!(model.call_count(), 3);

    // Retry prompts carry the prior failure and the resubmission instruction.
    let second = model.prompt(1);
    assert!(second.contains("PREVIOUS ATTEMPT ERROR: malformed structured output"));
    assert!(second.contains("resubmit valid structured output only"));
    let third = model.prompt(2);
    assert!(third.contains("PREVIOUS ATTEMPT ERROR: missing required field: confidence_score"));

    // Exactly one accepted record lands in durable memory.
    let responses = pipeline.memory().recent_responses(TaskType::CustomerReply, None, 10).await;
    assert_eq!(responses.len(), 1);

    // Every completed invocation was billed.
    let usage = pipeline.usage_snapshot().await;
    assert_eq!(usage.len(), 1);
    assert_eq!(usage[0].invocations, 3);
}

#[tokio::test]
async fn exhausted_retries_surface_terminal_error_and_record_nothing() {
    let model = ScriptedModel::always("still not json");
    let pipeline = Pipeline::new(fast_config(), StubAccessor, &model);

    let request = GenerationRequest::for_business("b-1").with_conversation("t-1");
    let error = pipeline.generate(TaskType::CustomerReply, request).await.unwrap_err();

    assert_eq!(
        error,
        PipelineError::RetryExhausted {
            task_type: TaskType::CustomerReply,
            attempts: 3,
            last: ValidationError::MalformedOutput,
        }
    );
    assert_eq!(model.call_count(), 3);
    assert_eq!(pipeline.memory().short_term_len().await, 0);
    assert!(pipeline.memory().recent_responses(TaskType::CustomerReply, None, 10).await.is_empty());
}

#[tokio::test]
async fn transport_failures_propagate_without_consuming_retries() {
    let model = ScriptedModel::new(vec![Err(TransportError::Backend("503".to_string()))]);
    let pipeline = Pipeline::new(fast_config(), StubAccessor, &model);

    let request = GenerationRequest::for_business("b-1").with_conversation("t-1");
    let error = pipeline.generate(TaskType::CustomerReply, request).await.unwrap_err();

    assert_eq!(error, PipelineError::Transport(TransportError::Backend("503".to_string())));
    assert_eq!(model.call_count(), 1);
    // A transport failure is not a completed invocation; nothing is billed.
    assert!(pipeline.usage_snapshot().await.is_empty());
}

#[tokio::test]
async fn accessor_failures_propagate_before_any_invocation() {
    let model = ScriptedModel::always(&valid_reply());
    let pipeline = Pipeline::new(fast_config(), StubAccessor, &model);

    let error = pipeline
        .generate(TaskType::CustomerReply, GenerationRequest::for_business("b-404"))
        .await
        .unwrap_err();

    assert_eq!(error, PipelineError::Accessor(AccessorError::UnknownId("b-404".to_string())));
    assert_eq!(model.call_count(), 0);
}

#[tokio::test]
async fn unregistered_task_type_is_a_configuration_error() {
    let model = ScriptedModel::always(&valid_reply());
    let pipeline =
        Pipeline::with_registry(TaskRegistry::empty(), fast_config(), StubAccessor, &model);

    let error = pipeline
        .generate(TaskType::CustomerReply, GenerationRequest::new())
        .await
        .unwrap_err();

    assert_eq!(error, PipelineError::Configuration(TaskType::CustomerReply));
    assert_eq!(model.call_count(), 0);
}

#[tokio::test]
async fn risky_responses_are_flagged_for_human_review() {
    let payload = json!({
        "reply": "Our loyalty program has guaranteed results for regulars.",
        "confidence_score": 0.7,
        "escalate": false
    })
    .to_string();
    let model = ScriptedModel::always(&payload);
    let pipeline = Pipeline::new(fast_config(), StubAccessor, &model);

    let request = GenerationRequest::for_business("b-1").with_conversation("t-1");
    let output = pipeline.generate(TaskType::CustomerReply, request).await.expect("generate");

    let warning = output.result["safety_warning"].as_str().unwrap();
    assert!(warning.contains("human review"));
}

#[tokio::test]
async fn accepted_runs_record_context_and_response() -> anyhow::Result<()> {
    let model = ScriptedModel::always(&valid_reply());
    let pipeline = Pipeline::new(fast_config(), StubAccessor, &model);

    let request = GenerationRequest::for_business("b-1")
        .with_campaign("c-1")
        .with_conversation("t-1");
    pipeline.generate(TaskType::CustomerReply, request).await?;

    let contexts = pipeline.recent_contexts(TaskType::CustomerReply, Some("b-1")).await;
    assert_eq!(contexts.len(), 1);

    let responses =
        pipeline.memory().recent_responses(TaskType::CustomerReply, Some("c-1"), 10).await;
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].response.as_ref().unwrap()["reply"], "Yes, the spring blend is back!");
    Ok(())
}
