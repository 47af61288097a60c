use std::fmt;

use serde::{Deserialize, Serialize};

/// Fixed category of a generation request. Selects the prompt template,
/// output schema, and model tier for the whole pipeline run.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskType {
    CampaignCalendar,
    KpiGenerator,
    MediaMixOptimizer,
    TextContent,
    VisualContent,
    VideoScript,
    PerformanceAnalysis,
    CustomerReply,
}

impl TaskType {
    pub const ALL: [TaskType; 8] = [
        TaskType::CampaignCalendar,
        TaskType::KpiGenerator,
        TaskType::MediaMixOptimizer,
        TaskType::TextContent,
        TaskType::VisualContent,
        TaskType::VideoScript,
        TaskType::PerformanceAnalysis,
        TaskType::CustomerReply,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CampaignCalendar => "campaign-calendar",
            Self::KpiGenerator => "kpi-generator",
            Self::MediaMixOptimizer => "media-mix-optimizer",
            Self::TextContent => "text-content",
            Self::VisualContent => "visual-content",
            Self::VideoScript => "video-script",
            Self::PerformanceAnalysis => "performance-analysis",
            Self::CustomerReply => "customer-reply",
        }
    }

    /// Static classification consulted by both tier selection and cost
    /// estimation, so the two call sites can never disagree.
    pub fn is_simple(&self) -> bool {
        matches!(self, Self::TextContent | Self::CustomerReply | Self::KpiGenerator)
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelTier {
    Cheap,
    Standard,
}

impl fmt::Display for ModelTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cheap => f.write_str("cheap"),
            Self::Standard => f.write_str("standard"),
        }
    }
}
