use async_trait::async_trait;

use promo_core::errors::TransportError;
use promo_core::task::ModelTier;

/// Generation backend boundary. Implementations own the network call; the
/// pipeline only sees text in, text out. A failed call must return an error,
/// never silently empty output.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn complete(&self, prompt: &str, tier: ModelTier) -> Result<String, TransportError>;
}
