use serde::{Deserialize, Serialize};

/// Weights for the composite 0-100 funnel score.
///
/// The 40/30/30 split caps each factor's contribution so no single
/// metric dominates. The values are empirically chosen constants carried
/// over from production; they are configuration, not derived quantities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringWeights {
    /// Points granted per funnel step
    #[serde(default = "default_points_per_node")]
    pub points_per_node: f64,

    /// Ceiling on the node-count contribution
    #[serde(default = "default_node_count_cap")]
    pub node_count_cap: f64,

    /// Multiplier applied to connection density
    #[serde(default = "default_density_multiplier")]
    pub density_multiplier: f64,

    /// Ceiling on the density contribution
    #[serde(default = "default_density_cap")]
    pub density_cap: f64,

    /// Multiplier applied to the content-quality metric
    #[serde(default = "default_content_multiplier")]
    pub content_multiplier: f64,

    /// Ceiling on the content-quality contribution
    #[serde(default = "default_content_cap")]
    pub content_cap: f64,
}

fn default_points_per_node() -> f64 {
    10.0
}
fn default_node_count_cap() -> f64 {
    40.0
}
fn default_density_multiplier() -> f64 {
    30.0
}
fn default_density_cap() -> f64 {
    30.0
}
fn default_content_multiplier() -> f64 {
    0.3
}
fn default_content_cap() -> f64 {
    30.0
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            points_per_node: default_points_per_node(),
            node_count_cap: default_node_count_cap(),
            density_multiplier: default_density_multiplier(),
            density_cap: default_density_cap(),
            content_multiplier: default_content_multiplier(),
            content_cap: default_content_cap(),
        }
    }
}

/// Point values for the flow-complexity heuristic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplexityWeights {
    /// Points per distinct step type present
    #[serde(default = "default_type_variety_points")]
    pub type_variety_points: u32,

    /// Points per node that is the source of more than one edge
    #[serde(default = "default_branching_points")]
    pub branching_points: u32,

    /// Flat bonus when the edge set contains a directed cycle
    #[serde(default = "default_cycle_points")]
    pub cycle_points: u32,
}

fn default_type_variety_points() -> u32 {
    10
}
fn default_branching_points() -> u32 {
    15
}
fn default_cycle_points() -> u32 {
    20
}

impl Default for ComplexityWeights {
    fn default() -> Self {
        Self {
            type_variety_points: default_type_variety_points(),
            branching_points: default_branching_points(),
            cycle_points: default_cycle_points(),
        }
    }
}

/// Per-node bonuses for the content-quality heuristic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentWeights {
    /// Bonus for a non-empty messages/history list in the node data
    #[serde(default = "default_message_bonus")]
    pub message_bonus: u32,

    /// Bonus for a description string or configuration object
    #[serde(default = "default_description_bonus")]
    pub description_bonus: u32,

    /// Bonus for a specialized module with an explicit sub-type field
    #[serde(default = "default_module_type_bonus")]
    pub module_type_bonus: u32,
}

fn default_message_bonus() -> u32 {
    15
}
fn default_description_bonus() -> u32 {
    10
}
fn default_module_type_bonus() -> u32 {
    20
}

impl Default for ContentWeights {
    fn default() -> Self {
        Self {
            message_bonus: default_message_bonus(),
            description_bonus: default_description_bonus(),
            module_type_bonus: default_module_type_bonus(),
        }
    }
}

/// Thresholds for strength/weakness labels and the rule-based fallback
/// suggestions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisThresholds {
    /// At or above this many steps the structure counts as a strength
    #[serde(default = "default_strong_node_count")]
    pub strong_node_count: usize,

    /// At or above this density the flow counts as a strength
    #[serde(default = "default_strong_density")]
    pub strong_density: f64,

    /// At or above this content quality the content counts as a strength
    #[serde(default = "default_strong_content")]
    pub strong_content: u32,

    /// Below this many steps the funnel is considered too sparse
    #[serde(default = "default_sparse_node_count")]
    pub sparse_node_count: usize,

    /// Below this density the steps are considered under-connected
    #[serde(default = "default_low_density")]
    pub low_density: f64,

    /// Below this content quality the content counts as a weakness
    #[serde(default = "default_low_content")]
    pub low_content: u32,

    /// Below this content quality the fallback generator emits a
    /// content suggestion
    #[serde(default = "default_fallback_content")]
    pub fallback_content: u32,

    /// Above this flow complexity the flow counts as a weakness
    #[serde(default = "default_high_complexity")]
    pub high_complexity: u32,
}

fn default_strong_node_count() -> usize {
    5
}
fn default_strong_density() -> f64 {
    1.0
}
fn default_strong_content() -> u32 {
    70
}
fn default_sparse_node_count() -> usize {
    3
}
fn default_low_density() -> f64 {
    0.5
}
fn default_low_content() -> u32 {
    40
}
fn default_fallback_content() -> u32 {
    30
}
fn default_high_complexity() -> u32 {
    70
}

impl Default for AnalysisThresholds {
    fn default() -> Self {
        Self {
            strong_node_count: default_strong_node_count(),
            strong_density: default_strong_density(),
            strong_content: default_strong_content(),
            sparse_node_count: default_sparse_node_count(),
            low_density: default_low_density(),
            low_content: default_low_content(),
            fallback_content: default_fallback_content(),
            high_complexity: default_high_complexity(),
        }
    }
}

/// Full scoring configuration for the analyzer and fallback generator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default)]
    pub weights: ScoringWeights,
    #[serde(default)]
    pub complexity: ComplexityWeights,
    #[serde(default)]
    pub content: ContentWeights,
    #[serde(default)]
    pub thresholds: AnalysisThresholds,
}

/// One configured text-generation provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderEntry {
    /// Provider kind: "ollama", "lmstudio", "anthropic", "openai-compatible"
    pub name: String,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Lower priority is tried first
    #[serde(default = "default_priority")]
    pub priority: i32,

    /// Successful dispatches allowed before the provider is excluded
    /// until the next usage reset
    #[serde(default = "default_rate_limit")]
    pub rate_limit: u32,

    /// Model identifier
    /// For Ollama: model name (e.g., "llama3.1:8b")
    /// For LM Studio: model name served by the local endpoint
    /// For Anthropic: model name (e.g., "claude-3-5-sonnet-20241022")
    /// For OpenAI-compatible: custom model name
    #[serde(default)]
    pub model: Option<String>,

    /// API key; falls back to the provider's environment variable
    #[serde(default)]
    pub api_key: Option<String>,

    /// Base URL override for local/custom endpoints
    #[serde(default)]
    pub base_url: Option<String>,

    /// Per-request timeout inside the provider adapter
    #[serde(default = "default_provider_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_enabled() -> bool {
    true
}
fn default_priority() -> i32 {
    100
}
fn default_rate_limit() -> u32 {
    50
}
fn default_provider_timeout_secs() -> u64 {
    120
}

/// Configuration for the suggestion-generation side of the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// Upper bound on a single provider attempt during dispatch
    #[serde(default = "default_dispatch_timeout_secs")]
    pub dispatch_timeout_secs: u64,

    #[serde(default)]
    pub providers: Vec<ProviderEntry>,
}

fn default_dispatch_timeout_secs() -> u64 {
    30
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            dispatch_timeout_secs: default_dispatch_timeout_secs(),
            providers: Vec::new(),
        }
    }
}
