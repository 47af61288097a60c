//! Pipeline configuration: defaults, optional TOML file patch, environment
//! overrides, programmatic overrides, then validation — in that order.
//!
//! Every tunable the pipeline treats as a heuristic rather than an invariant
//! lives here: retry cap and backoff base, the input/output cost split, tier
//! pricing, memory retention windows, and guardrail term lists.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::cost::CostConfig;
use crate::guardrails::GuardrailConfig;

#[derive(Clone, Debug, PartialEq)]
pub struct PipelineConfig {
    pub retry: RetryConfig,
    pub cost: CostConfig,
    pub guardrails: GuardrailConfig,
    pub memory: MemoryConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryConfig {
    /// Retries after the initial attempt; total attempts = max_retries + 1.
    pub max_retries: u32,
    /// Linear backoff base: attempt N waits N × base before re-invoking.
    pub base_delay_ms: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemoryConfig {
    /// Short-term context records expire this long after insertion.
    pub short_term_ttl_secs: u64,
    /// Durable per-campaign history cap, FIFO-evicted.
    pub campaign_cap: usize,
    /// Default window for `recent_contexts` lookups.
    pub recent_limit: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            retry: RetryConfig { max_retries: 2, base_delay_ms: 1000 },
            cost: CostConfig::default(),
            guardrails: GuardrailConfig::default(),
            memory: MemoryConfig { short_term_ttl_secs: 600, campaign_cap: 50, recent_limit: 5 },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub max_retries: Option<u32>,
    pub base_delay_ms: Option<u64>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    retry: Option<RetryPatch>,
    cost: Option<CostPatch>,
    guardrails: Option<GuardrailPatch>,
    memory: Option<MemoryPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct RetryPatch {
    max_retries: Option<u32>,
    base_delay_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct CostPatch {
    input_split: Option<f64>,
    max_history_messages: Option<usize>,
    cheap_input_per_1k: Option<f64>,
    cheap_output_per_1k: Option<f64>,
    standard_input_per_1k: Option<f64>,
    standard_output_per_1k: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct GuardrailPatch {
    blocked_terms: Option<Vec<String>>,
    controversial_topics: Option<Vec<String>>,
    risky_phrases: Option<Vec<String>>,
    redaction_marker: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct MemoryPatch {
    short_term_ttl_secs: Option<u64>,
    campaign_cap: Option<usize>,
    recent_limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<String>,
}

impl PipelineConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch)?;
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("promo.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) -> Result<(), ConfigError> {
        if let Some(retry) = patch.retry {
            if let Some(max_retries) = retry.max_retries {
                self.retry.max_retries = max_retries;
            }
            if let Some(base_delay_ms) = retry.base_delay_ms {
                self.retry.base_delay_ms = base_delay_ms;
            }
        }

        if let Some(cost) = patch.cost {
            if let Some(input_split) = cost.input_split {
                self.cost.input_split = input_split;
            }
            if let Some(max_history_messages) = cost.max_history_messages {
                self.cost.max_history_messages = max_history_messages;
            }
            if let Some(price) = cost.cheap_input_per_1k {
                self.cost.cheap.input_per_1k = price;
            }
            if let Some(price) = cost.cheap_output_per_1k {
                self.cost.cheap.output_per_1k = price;
            }
            if let Some(price) = cost.standard_input_per_1k {
                self.cost.standard.input_per_1k = price;
            }
            if let Some(price) = cost.standard_output_per_1k {
                self.cost.standard.output_per_1k = price;
            }
        }

        if let Some(guardrails) = patch.guardrails {
            if let Some(blocked_terms) = guardrails.blocked_terms {
                self.guardrails.blocked_terms = blocked_terms;
            }
            if let Some(controversial_topics) = guardrails.controversial_topics {
                self.guardrails.controversial_topics = controversial_topics;
            }
            if let Some(risky_phrases) = guardrails.risky_phrases {
                self.guardrails.risky_phrases = risky_phrases;
            }
            if let Some(redaction_marker) = guardrails.redaction_marker {
                self.guardrails.redaction_marker = redaction_marker;
            }
        }

        if let Some(memory) = patch.memory {
            if let Some(short_term_ttl_secs) = memory.short_term_ttl_secs {
                self.memory.short_term_ttl_secs = short_term_ttl_secs;
            }
            if let Some(campaign_cap) = memory.campaign_cap {
                self.memory.campaign_cap = campaign_cap;
            }
            if let Some(recent_limit) = memory.recent_limit {
                self.memory.recent_limit = recent_limit;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format.parse()?;
            }
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(level) = env::var("PROMO_LOG_LEVEL") {
            if !level.trim().is_empty() {
                self.logging.level = level;
            }
        }

        if let Ok(format) = env::var("PROMO_LOG_FORMAT") {
            if !format.trim().is_empty() {
                self.logging.format = format.parse()?;
            }
        }

        if let Ok(raw) = env::var("PROMO_MAX_RETRIES") {
            self.retry.max_retries = raw.trim().parse().map_err(|_| {
                ConfigError::InvalidEnvOverride { key: "PROMO_MAX_RETRIES".to_string(), value: raw }
            })?;
        }

        if let Ok(raw) = env::var("PROMO_BASE_DELAY_MS") {
            self.retry.base_delay_ms = raw.trim().parse().map_err(|_| {
                ConfigError::InvalidEnvOverride {
                    key: "PROMO_BASE_DELAY_MS".to_string(),
                    value: raw,
                }
            })?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(max_retries) = overrides.max_retries {
            self.retry.max_retries = max_retries;
        }
        if let Some(base_delay_ms) = overrides.base_delay_ms {
            self.retry.base_delay_ms = base_delay_ms;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
        if let Some(format) = overrides.log_format {
            self.logging.format = format;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.cost.input_split > 0.0 && self.cost.input_split < 1.0) {
            return Err(ConfigError::Validation(format!(
                "cost.input_split must be strictly between 0 and 1, got {}",
                self.cost.input_split
            )));
        }
        if self.cost.max_history_messages == 0 {
            return Err(ConfigError::Validation(
                "cost.max_history_messages must be at least 1".to_string(),
            ));
        }
        if self.memory.short_term_ttl_secs == 0 {
            return Err(ConfigError::Validation(
                "memory.short_term_ttl_secs must be at least 1".to_string(),
            ));
        }
        if self.memory.campaign_cap == 0 {
            return Err(ConfigError::Validation(
                "memory.campaign_cap must be at least 1".to_string(),
            ));
        }
        if self.guardrails.redaction_marker.is_empty() {
            return Err(ConfigError::Validation(
                "guardrails.redaction_marker must not be empty".to_string(),
            ));
        }
        // A marker containing a blocked term would defeat redaction
        // idempotence.
        let marker = self.guardrails.redaction_marker.to_lowercase();
        for term in &self.guardrails.blocked_terms {
            if marker.contains(&term.to_lowercase()) {
                return Err(ConfigError::Validation(format!(
                    "guardrails.redaction_marker contains blocked term `{term}`"
                )));
            }
        }
        Ok(())
    }
}

fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return path.exists().then(|| path.to_path_buf());
    }
    let default = PathBuf::from("promo.toml");
    default.exists().then_some(default)
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;
    toml::from_str(&raw)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}
