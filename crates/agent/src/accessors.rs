use async_trait::async_trait;

use promo_core::context::{
    BusinessSnapshot, CampaignSnapshot, ConversationSnapshot, PerformanceSnapshot,
};
use promo_core::errors::AccessorError;

/// Read-only snapshot supplier for business, campaign, performance, and
/// conversation records. Implemented by the surrounding system; the pipeline
/// only depends on the shapes. Lookup failures propagate unmodified — the
/// pipeline never substitutes defaults for a missing record.
#[async_trait]
pub trait ContextAccessor: Send + Sync {
    async fn business_context(&self, id: &str) -> Result<BusinessSnapshot, AccessorError>;
    async fn campaign_context(&self, id: &str) -> Result<CampaignSnapshot, AccessorError>;
    async fn performance_context(
        &self,
        campaign_id: &str,
    ) -> Result<PerformanceSnapshot, AccessorError>;
    async fn conversation_context(&self, id: &str) -> Result<ConversationSnapshot, AccessorError>;
}
