pub mod accessors;
pub mod builder;
pub mod llm;
pub mod pipeline;
pub mod retry;
pub mod telemetry;

pub use accessors::ContextAccessor;
pub use builder::{ContextBuilder, GenerationRequest};
pub use llm::ModelClient;
pub use pipeline::{GenerationMetadata, GenerationOutput, Pipeline};
pub use retry::RetryPolicy;
pub use telemetry::init_tracing;
