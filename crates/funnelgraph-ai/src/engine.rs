use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::info;

use funnelgraph_analysis::FunnelAnalyzer;
use funnelgraph_core::{FunnelAnalysis, FunnelGraph, ScoringConfig};

use crate::orchestrator::ProviderOrchestrator;
use crate::synthesizer::SuggestionSynthesizer;

/// Facade combining the structural analyzer and the suggestion
/// synthesizer into one call.
///
/// Total like its parts: metrics and score are pure computation, and the
/// synthesizer recovers every generation failure into the rule-based
/// fallback, so `analyze` always returns a complete [`FunnelAnalysis`].
pub struct FunnelInsightEngine {
    analyzer: FunnelAnalyzer,
    synthesizer: SuggestionSynthesizer,
}

impl FunnelInsightEngine {
    pub fn new(orchestrator: Arc<ProviderOrchestrator>) -> Self {
        Self::with_config(ScoringConfig::default(), orchestrator)
    }

    pub fn with_config(config: ScoringConfig, orchestrator: Arc<ProviderOrchestrator>) -> Self {
        let thresholds = config.thresholds.clone();
        Self {
            analyzer: FunnelAnalyzer::with_config(config),
            synthesizer: SuggestionSynthesizer::with_thresholds(orchestrator, thresholds),
        }
    }

    /// Full analysis: metrics, composite score, strength/weakness labels,
    /// and optimization suggestions.
    pub async fn analyze(&self, graph: &FunnelGraph) -> FunnelAnalysis {
        let started = Instant::now();

        let metrics = self.analyzer.analyze(graph);
        let score = self.analyzer.score(&metrics);
        let suggestions = self.synthesizer.generate(graph, &metrics).await;

        info!(
            "Funnel '{}' analyzed in {}ms: score {}, {} suggestions",
            graph.name,
            started.elapsed().as_millis(),
            score,
            suggestions.len()
        );

        FunnelAnalysis {
            score,
            strengths: self.analyzer.strengths(&metrics),
            weaknesses: self.analyzer.weaknesses(&metrics),
            suggestions,
            key_metrics: metrics,
            generated_at: Utc::now(),
        }
    }
}
