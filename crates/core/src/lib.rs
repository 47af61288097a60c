pub mod assemble;
pub mod config;
pub mod context;
pub mod cost;
pub mod errors;
pub mod guardrails;
pub mod schema;
pub mod task;
pub mod templates;
pub mod validate;

pub use assemble::PromptAssembler;
pub use config::{
    ConfigError, ConfigOverrides, LoadOptions, LogFormat, LoggingConfig, MemoryConfig,
    PipelineConfig, RetryConfig,
};
pub use context::{
    Audience, BusinessSnapshot, CampaignSnapshot, Context, ConversationMessage,
    ConversationSnapshot, PerformanceSnapshot,
};
pub use cost::{CostConfig, CostOptimizer, TierPricing};
pub use errors::{AccessorError, PipelineError, TransportError};
pub use guardrails::{GuardrailConfig, GuardrailFilter, SAFETY_WARNING_FIELD};
pub use schema::{BusinessRule, FieldKind, FieldSpec, OutputSchema};
pub use task::{ModelTier, TaskType};
pub use templates::{PromptTemplate, TaskDefinition, TaskRegistry};
pub use validate::{validate_output, validate_value, ValidationError};
