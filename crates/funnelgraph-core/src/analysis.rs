use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Structural metrics derived from one funnel graph.
///
/// Recomputed on every analysis call; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunnelMetrics {
    /// Number of steps in the funnel
    pub node_count: usize,
    /// Edges-per-node ratio; 0.0 for an empty funnel
    pub connection_density: f64,
    /// Heuristic 0-100 score combining type variety, branching, and cycles
    pub flow_complexity: u32,
    /// Heuristic 0-100 score for how much content is configured per step
    pub content_quality: u32,
}

/// Category an optimization suggestion belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionKind {
    Structure,
    Content,
    Flow,
    Performance,
    Conversion,
}

impl fmt::Display for SuggestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SuggestionKind::Structure => "structure",
            SuggestionKind::Content => "content",
            SuggestionKind::Flow => "flow",
            SuggestionKind::Performance => "performance",
            SuggestionKind::Conversion => "conversion",
        };
        write!(f, "{}", s)
    }
}

/// How urgently a suggestion should be acted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionPriority {
    High,
    Medium,
    Low,
}

/// One actionable optimization suggestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Suggestion {
    /// Suggestion category
    #[serde(rename = "type")]
    pub kind: SuggestionKind,
    /// Urgency of acting on this suggestion
    pub priority: SuggestionPriority,
    /// Short headline
    pub title: String,
    /// What was observed in the funnel
    pub description: String,
    /// Concrete change to make
    pub recommendation: String,
    /// Expected effect of the change
    pub impact: String,
    /// How to carry the change out
    pub implementation: String,
    /// Rough time estimate (e.g. "30 minutes")
    pub estimated_time: String,
}

/// Complete analysis result for one funnel: composite score, labels,
/// suggestions, and the metrics they were derived from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunnelAnalysis {
    /// Composite 0-100 structural quality score
    pub score: u32,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub suggestions: Vec<Suggestion>,
    pub key_metrics: FunnelMetrics,
    pub generated_at: DateTime<Utc>,
}
