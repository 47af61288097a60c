//! Context construction: merges a raw request with accessor-supplied records
//! into one timestamped, task-tagged context.

use chrono::Utc;
use serde_json::{Map, Value};

use promo_core::context::{fields, sections, Context};
use promo_core::errors::{AccessorError, PipelineError};
use promo_core::task::TaskType;

use crate::accessors::ContextAccessor;

/// Raw generation request as received from the caller. Identifiers are
/// resolved through the accessor; `fields` are task-specific scalars merged
/// into the context verbatim (e.g. platform, topic, tone).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GenerationRequest {
    pub business_id: Option<String>,
    pub campaign_id: Option<String>,
    pub conversation_id: Option<String>,
    pub fields: Map<String, Value>,
}

impl GenerationRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_business(id: &str) -> Self {
        Self { business_id: Some(id.to_string()), ..Self::default() }
    }

    pub fn with_campaign(mut self, id: &str) -> Self {
        self.campaign_id = Some(id.to_string());
        self
    }

    pub fn with_conversation(mut self, id: &str) -> Self {
        self.conversation_id = Some(id.to_string());
        self
    }

    pub fn with_field(mut self, name: &str, value: Value) -> Self {
        self.fields.insert(name.to_string(), value);
        self
    }
}

pub struct ContextBuilder<'a, A> {
    accessor: &'a A,
}

impl<'a, A> ContextBuilder<'a, A>
where
    A: ContextAccessor,
{
    pub fn new(accessor: &'a A) -> Self {
        Self { accessor }
    }

    /// Always succeeds when every referenced identifier resolves; any
    /// accessor failure propagates unmodified.
    pub async fn build(
        &self,
        task_type: TaskType,
        request: &GenerationRequest,
    ) -> Result<Context, PipelineError> {
        let mut context = Context::new(task_type, Utc::now());

        if let Some(business_id) = &request.business_id {
            let snapshot = self.accessor.business_context(business_id).await?;
            context = context
                .with_section(sections::BUSINESS, to_section_value(&snapshot)?)
                .with_section(fields::BUSINESS_ID, Value::String(business_id.clone()));
        }

        if let Some(campaign_id) = &request.campaign_id {
            let snapshot = self.accessor.campaign_context(campaign_id).await?;
            context = context
                .with_section(sections::CAMPAIGN, to_section_value(&snapshot)?)
                .with_section(fields::CAMPAIGN_ID, Value::String(campaign_id.clone()));

            let performance = self.accessor.performance_context(campaign_id).await?;
            context = context.with_section(sections::PERFORMANCE, to_section_value(&performance)?);
        }

        if let Some(conversation_id) = &request.conversation_id {
            let snapshot = self.accessor.conversation_context(conversation_id).await?;
            context = context.with_section(sections::CONVERSATION, to_section_value(&snapshot)?);
        }

        for (name, value) in &request.fields {
            context.sections.insert(name.clone(), value.clone());
        }

        Ok(context)
    }
}

fn to_section_value<T: serde::Serialize>(snapshot: &T) -> Result<Value, PipelineError> {
    serde_json::to_value(snapshot)
        .map_err(|error| AccessorError::Source(format!("unserializable snapshot: {error}")).into())
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use serde_json::json;

    use promo_core::context::{
        sections, Audience, BusinessSnapshot, CampaignSnapshot, ConversationSnapshot,
        PerformanceSnapshot,
    };
    use promo_core::errors::{AccessorError, PipelineError};
    use promo_core::task::TaskType;

    use super::{ContextBuilder, GenerationRequest};
    use crate::accessors::ContextAccessor;

    struct FixtureAccessor;

    #[async_trait]
    impl ContextAccessor for FixtureAccessor {
        async fn business_context(&self, id: &str) -> Result<BusinessSnapshot, AccessorError> {
            if id != "b-1" {
                return Err(AccessorError::UnknownId(id.to_string()));
            }
            Ok(BusinessSnapshot {
                name: "Acme Coffee".to_string(),
                industry: "food & beverage".to_string(),
                brand_voice: "warm".to_string(),
                target_audience: Audience {
                    description: "commuters".to_string(),
                    interests: vec!["coffee".to_string()],
                },
                campaign_goal: "weekday traffic".to_string(),
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
            Ok(PerformanceSnapshot {
                recent_metrics: json!({"impressions": 12000}),
                top_content: vec![],
            })
        }

        async fn conversation_context(
            &self,
            _id: &str,
        ) -> Result<ConversationSnapshot, AccessorError> {
            Ok(ConversationSnapshot {
                last_messages: vec![],
                sentiment: "neutral".to_string(),
                customer_profile: None,
            })
        }
    }

    #[tokio::test]
    async fn build_tags_task_and_resolves_sections() {
        let request = GenerationRequest::for_business("b-1")
            .with_campaign("c-1")
            .with_field("platform", json!("instagram"));

        let context = ContextBuilder::new(&FixtureAccessor)
            .build(TaskType::TextContent, &request)
            .await
            .expect("build context");

        assert_eq!(context.task_type, TaskType::TextContent);
        assert_eq!(context.section(sections::BUSINESS).unwrap()["name"], "Acme Coffee");
        assert_eq!(context.section(sections::CAMPAIGN).unwrap()["duration_days"], 30);
        assert_eq!(
            context.section(sections::PERFORMANCE).unwrap()["recent_metrics"]["impressions"],
            12000
        );
        assert_eq!(context.scalar_str("business_id"), Some("b-1"));
        assert_eq!(context.scalar_str("campaign_id"), Some("c-1"));
        assert_eq!(context.scalar_str("platform"), Some("instagram"));
    }

    #[tokio::test]
    async fn unknown_identifier_propagates_unmodified() {
        let request = GenerationRequest::for_business("b-404");
        let error = ContextBuilder::new(&FixtureAccessor)
            .build(TaskType::TextContent, &request)
            .await
            .unwrap_err();

        assert_eq!(
            error,
            PipelineError::Accessor(AccessorError::UnknownId("b-404".to_string()))
        );
    }

    #[tokio::test]
    async fn sections_without_identifiers_are_absent() {
        let request = GenerationRequest::new().with_field("topic", json!("espresso"));
        let context = ContextBuilder::new(&FixtureAccessor)
            .build(TaskType::KpiGenerator, &request)
            .await
            .expect("build context");

        assert!(context.section(sections::BUSINESS).is_none());
        assert!(context.section(sections::CAMPAIGN).is_none());
        assert!(context.section(sections::CONVERSATION).is_none());
        assert_eq!(context.scalar_str("topic"), Some("espresso"));
    }
}
