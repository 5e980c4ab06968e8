use std::sync::Arc;

use tracing::{info, warn};

use funnelgraph_core::{AnalysisThresholds, FunnelGraph, FunnelMetrics, Suggestion};

use crate::fallback::fallback_suggestions;
use crate::llm_provider::CompletionRequest;
use crate::orchestrator::ProviderOrchestrator;
use crate::suggestion_schemas::{parse_suggestions, suggestion_batch_schema};

const SUGGESTION_MAX_TOKENS: usize = 2048;
const SUGGESTION_TEMPERATURE: f32 = 0.4;

/// Turns analyzer output into optimization suggestions.
///
/// Builds a generation prompt from the funnel and its metrics, dispatches
/// it through the provider chain, and parses the structured response.
/// Total: every failure path (exhausted providers, unparseable output,
/// empty result) recovers into the deterministic rule-based fallback, so
/// callers never observe an error.
pub struct SuggestionSynthesizer {
    orchestrator: Arc<ProviderOrchestrator>,
    thresholds: AnalysisThresholds,
}

impl SuggestionSynthesizer {
    pub fn new(orchestrator: Arc<ProviderOrchestrator>) -> Self {
        Self::with_thresholds(orchestrator, AnalysisThresholds::default())
    }

    pub fn with_thresholds(
        orchestrator: Arc<ProviderOrchestrator>,
        thresholds: AnalysisThresholds,
    ) -> Self {
        Self {
            orchestrator,
            thresholds,
        }
    }

    /// Generate suggestions for one analyzed funnel.
    pub async fn generate(&self, graph: &FunnelGraph, metrics: &FunnelMetrics) -> Vec<Suggestion> {
        let request = self.build_request(graph, metrics);

        match self.orchestrator.dispatch(&request).await {
            Ok(result) => match parse_suggestions(&result.content) {
                Some(suggestions) => {
                    info!(
                        "Generated {} suggestions for '{}' via provider '{}'",
                        suggestions.len(),
                        graph.name,
                        result.provider_name
                    );
                    suggestions
                }
                None => {
                    warn!(
                        "Provider '{}' returned unparseable suggestions for '{}'; \
                         using rule-based fallback",
                        result.provider_name, graph.name
                    );
                    fallback_suggestions(metrics, &self.thresholds)
                }
            },
            Err(e) => {
                warn!(
                    "Suggestion dispatch failed for '{}' ({}); using rule-based fallback",
                    graph.name, e
                );
                fallback_suggestions(metrics, &self.thresholds)
            }
        }
    }

    fn build_request(&self, graph: &FunnelGraph, metrics: &FunnelMetrics) -> CompletionRequest {
        let step_types = graph
            .distinct_step_types()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        let step_types = if step_types.is_empty() {
            "none".to_string()
        } else {
            step_types
        };

        let prompt = format!(
            "Analyze this marketing funnel and suggest optimizations.\n\n\
             FUNNEL: {}\n\
             DESCRIPTION: {}\n\n\
             METRICS:\n\
             - Steps: {}\n\
             - Connection density: {:.2}\n\
             - Flow complexity: {}/100\n\
             - Content quality: {}/100\n\n\
             STEP TYPES PRESENT: {}\n\n\
             Provide 3-5 concrete optimization suggestions, each with a clear \
             priority, expected impact, and implementation steps.",
            graph.name,
            graph.description.as_deref().unwrap_or("Not provided"),
            metrics.node_count,
            metrics.connection_density,
            metrics.flow_complexity,
            metrics.content_quality,
            step_types
        );

        let system_prompt = format!(
            "You are a marketing funnel optimization expert. Respond with a single \
             JSON object matching this schema, and nothing else:\n{}\n\
             Return between 3 and 5 suggestions.",
            suggestion_batch_schema()
        );

        CompletionRequest::new(prompt)
            .with_system_prompt(system_prompt)
            .with_max_tokens(SUGGESTION_MAX_TOKENS)
            .with_temperature(SUGGESTION_TEMPERATURE)
    }
}
