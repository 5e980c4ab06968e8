use std::collections::HashMap;

use serde_json::Value;
use tracing::debug;

use funnelgraph_core::{FunnelGraph, FunnelMetrics, FunnelNode, ScoringConfig};

use crate::cycles::has_cycle;

/// Computes structural metrics, the composite score, and strength/weakness
/// labels for a funnel graph.
///
/// Pure and synchronous: only reads the input graph, never fails, and is
/// safe to share across threads. Malformed node data contributes zero
/// bonus rather than erroring.
#[derive(Debug, Clone, Default)]
pub struct FunnelAnalyzer {
    config: ScoringConfig,
}

impl FunnelAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ScoringConfig) -> Self {
        Self { config }
    }

    /// Compute the four structural metrics for one funnel.
    pub fn analyze(&self, graph: &FunnelGraph) -> FunnelMetrics {
        let node_count = graph.nodes.len();
        let connection_density = if node_count == 0 {
            0.0
        } else {
            graph.edges.len() as f64 / node_count as f64
        };

        let metrics = FunnelMetrics {
            node_count,
            connection_density,
            flow_complexity: self.flow_complexity(graph),
            content_quality: self.content_quality(graph),
        };

        debug!(
            "Analyzed funnel '{}': {} nodes, density {:.2}, complexity {}, content {}",
            graph.name,
            metrics.node_count,
            metrics.connection_density,
            metrics.flow_complexity,
            metrics.content_quality
        );

        metrics
    }

    /// Composite 0-100 score. Each factor's contribution is capped so no
    /// single metric dominates.
    pub fn score(&self, metrics: &FunnelMetrics) -> u32 {
        let w = &self.config.weights;
        let node_points = (metrics.node_count as f64 * w.points_per_node).min(w.node_count_cap);
        let density_points =
            (metrics.connection_density * w.density_multiplier).min(w.density_cap);
        let content_points =
            (metrics.content_quality as f64 * w.content_multiplier).min(w.content_cap);

        (node_points + density_points + content_points)
            .round()
            .clamp(0.0, 100.0) as u32
    }

    /// Threshold-based strength labels. Never empty: callers display
    /// these lists directly, so a neutral placeholder stands in when no
    /// threshold fires.
    pub fn strengths(&self, metrics: &FunnelMetrics) -> Vec<String> {
        let t = &self.config.thresholds;
        let mut labels = Vec::new();

        if metrics.node_count >= t.strong_node_count {
            labels.push(format!(
                "Well-developed structure with {} funnel steps",
                metrics.node_count
            ));
        }
        if metrics.connection_density >= t.strong_density {
            labels.push("Steps are densely connected into a coherent flow".to_string());
        }
        if metrics.content_quality >= t.strong_content {
            labels.push("Module content is thoroughly configured".to_string());
        }

        if labels.is_empty() {
            labels.push("Funnel fundamentals are in place".to_string());
        }
        labels
    }

    /// Threshold-based weakness labels; same non-empty contract as
    /// [`strengths`](Self::strengths).
    pub fn weaknesses(&self, metrics: &FunnelMetrics) -> Vec<String> {
        let t = &self.config.thresholds;
        let mut labels = Vec::new();

        if metrics.node_count < t.sparse_node_count {
            labels.push("Funnel has very few steps".to_string());
        }
        if metrics.connection_density < t.low_density {
            labels.push("Steps are loosely connected; visitors can dead-end".to_string());
        }
        if metrics.content_quality < t.low_content {
            labels.push("Most modules have little or no content configured".to_string());
        }
        if metrics.flow_complexity > t.high_complexity {
            labels.push("Flow is complex enough to confuse visitors".to_string());
        }

        if labels.is_empty() {
            labels.push("No significant weaknesses detected".to_string());
        }
        labels
    }

    fn flow_complexity(&self, graph: &FunnelGraph) -> u32 {
        let c = &self.config.complexity;
        let distinct_types = graph.distinct_step_types().len() as u32;
        let mut score = c.type_variety_points * distinct_types;

        let mut out_degree: HashMap<&str, u32> = HashMap::new();
        for edge in &graph.edges {
            *out_degree.entry(edge.source.as_str()).or_insert(0) += 1;
        }
        let branching = out_degree.values().filter(|&&degree| degree > 1).count() as u32;
        score += c.branching_points * branching;

        if has_cycle(&graph.edges) {
            debug!("Funnel '{}' contains a circular flow", graph.name);
            score += c.cycle_points;
        }

        score.min(100)
    }

    fn content_quality(&self, graph: &FunnelGraph) -> u32 {
        graph
            .nodes
            .iter()
            .map(|node| self.node_content_bonus(node))
            .sum::<u32>()
            .min(100)
    }

    fn node_content_bonus(&self, node: &FunnelNode) -> u32 {
        let c = &self.config.content;
        let mut bonus = 0;

        let has_messages = ["messages", "history"].iter().any(|key| {
            node.data
                .get(*key)
                .and_then(Value::as_array)
                .map(|items| !items.is_empty())
                .unwrap_or(false)
        });
        if has_messages {
            bonus += c.message_bonus;
        }

        let has_description = node
            .data
            .get("description")
            .and_then(Value::as_str)
            .map(|s| !s.is_empty())
            .unwrap_or(false);
        let has_config = node
            .data
            .get("config")
            .map(Value::is_object)
            .unwrap_or(false);
        if has_description || has_config {
            bonus += c.description_bonus;
        }

        let has_module_type = node
            .data
            .get("moduleType")
            .and_then(Value::as_str)
            .map(|s| !s.is_empty())
            .unwrap_or(false);
        if has_module_type {
            bonus += c.module_type_bonus;
        }

        bonus
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use funnelgraph_core::{FunnelEdge, StepType};
    use serde_json::json;

    fn node(id: &str, step_type: StepType) -> FunnelNode {
        FunnelNode::new(id, step_type)
    }

    fn graph(nodes: Vec<FunnelNode>, edges: Vec<FunnelEdge>) -> FunnelGraph {
        FunnelGraph {
            id: "f1".to_string(),
            name: "Test funnel".to_string(),
            description: None,
            nodes,
            edges,
        }
    }

    #[test]
    fn test_empty_graph_is_safe() {
        let analyzer = FunnelAnalyzer::new();
        let metrics = analyzer.analyze(&graph(vec![], vec![]));

        assert_eq!(metrics.node_count, 0);
        assert_eq!(metrics.connection_density, 0.0);
        assert_eq!(metrics.flow_complexity, 0);
        assert_eq!(metrics.content_quality, 0);
        assert_eq!(analyzer.score(&metrics), 0);
    }

    #[test]
    fn test_connection_density_is_edges_per_node() {
        let analyzer = FunnelAnalyzer::new();
        let metrics = analyzer.analyze(&graph(
            vec![
                node("a", StepType::LandingPage),
                node("b", StepType::Checkout),
            ],
            vec![FunnelEdge::new("a", "b")],
        ));
        assert_eq!(metrics.connection_density, 0.5);
    }

    #[test]
    fn test_dangling_edges_are_tolerated() {
        let analyzer = FunnelAnalyzer::new();
        // Both endpoints missing from the node list entirely.
        let metrics = analyzer.analyze(&graph(
            vec![node("a", StepType::LandingPage)],
            vec![FunnelEdge::new("ghost", "phantom")],
        ));
        assert_eq!(metrics.node_count, 1);
        assert_eq!(metrics.connection_density, 1.0);
    }

    #[test]
    fn test_cycle_adds_complexity_bonus() {
        let analyzer = FunnelAnalyzer::new();
        let nodes = vec![
            node("a", StepType::LandingPage),
            node("b", StepType::LandingPage),
            node("c", StepType::LandingPage),
        ];

        let chain = analyzer.analyze(&graph(
            nodes.clone(),
            vec![FunnelEdge::new("a", "b"), FunnelEdge::new("b", "c")],
        ));
        let cycle = analyzer.analyze(&graph(
            nodes,
            vec![
                FunnelEdge::new("a", "b"),
                FunnelEdge::new("b", "c"),
                FunnelEdge::new("c", "a"),
            ],
        ));

        assert_eq!(cycle.flow_complexity - chain.flow_complexity, 20);
    }

    #[test]
    fn test_self_loop_counts_as_cycle() {
        let analyzer = FunnelAnalyzer::new();
        let with_loop = analyzer.analyze(&graph(
            vec![node("a", StepType::LandingPage)],
            vec![FunnelEdge::new("a", "a")],
        ));
        let without = analyzer.analyze(&graph(
            vec![node("a", StepType::LandingPage)],
            vec![],
        ));
        assert_eq!(with_loop.flow_complexity - without.flow_complexity, 20);
    }

    #[test]
    fn test_branching_points_add_fifteen_each() {
        let analyzer = FunnelAnalyzer::new();
        let nodes = vec![
            node("a", StepType::LandingPage),
            node("b", StepType::LandingPage),
            node("c", StepType::LandingPage),
        ];
        let single_path = analyzer.analyze(&graph(
            nodes.clone(),
            vec![FunnelEdge::new("a", "b")],
        ));
        let branching = analyzer.analyze(&graph(
            nodes,
            vec![FunnelEdge::new("a", "b"), FunnelEdge::new("a", "c")],
        ));
        assert_eq!(branching.flow_complexity - single_path.flow_complexity, 15);
    }

    #[test]
    fn test_type_variety_drives_complexity() {
        let analyzer = FunnelAnalyzer::new();
        let metrics = analyzer.analyze(&graph(
            vec![
                node("a", StepType::LandingPage),
                node("b", StepType::EmailSequence),
                node("c", StepType::Checkout),
            ],
            vec![],
        ));
        assert_eq!(metrics.flow_complexity, 30);
    }

    #[test]
    fn test_content_bonuses_accumulate() {
        let analyzer = FunnelAnalyzer::new();
        let mut rich = node("a", StepType::EmailSequence);
        rich.data
            .insert("messages".to_string(), json!([{"subject": "Welcome"}]));
        rich.data
            .insert("description".to_string(), json!("Nurture sequence"));
        rich.data.insert("moduleType".to_string(), json!("drip"));

        let metrics = analyzer.analyze(&graph(vec![rich], vec![]));
        assert_eq!(metrics.content_quality, 45);
    }

    #[test]
    fn test_malformed_data_contributes_nothing() {
        let analyzer = FunnelAnalyzer::new();
        let mut odd = node("a", StepType::LandingPage);
        odd.data.insert("messages".to_string(), json!("not-a-list"));
        odd.data.insert("description".to_string(), json!(42));
        odd.data.insert("config".to_string(), json!([1, 2, 3]));
        odd.data.insert("moduleType".to_string(), json!(""));

        let metrics = analyzer.analyze(&graph(vec![odd], vec![]));
        assert_eq!(metrics.content_quality, 0);
    }

    #[test]
    fn test_score_caps_each_factor() {
        let analyzer = FunnelAnalyzer::new();
        let metrics = FunnelMetrics {
            node_count: 50,
            connection_density: 10.0,
            flow_complexity: 100,
            content_quality: 100,
        };
        // 40 + 30 + 30, every factor saturated.
        assert_eq!(analyzer.score(&metrics), 100);
    }

    #[test]
    fn test_score_monotone_in_node_count_up_to_cap() {
        let analyzer = FunnelAnalyzer::new();
        let mut previous = 0;
        for node_count in 0..=6 {
            let metrics = FunnelMetrics {
                node_count,
                connection_density: 0.4,
                flow_complexity: 10,
                content_quality: 20,
            };
            let score = analyzer.score(&metrics);
            assert!(score >= previous);
            previous = score;
        }
        // Past four nodes the contribution is pinned at the cap.
        let at_cap = |n| {
            analyzer.score(&FunnelMetrics {
                node_count: n,
                connection_density: 0.4,
                flow_complexity: 10,
                content_quality: 20,
            })
        };
        assert_eq!(at_cap(4), at_cap(12));
    }

    #[test]
    fn test_labels_are_never_empty() {
        let analyzer = FunnelAnalyzer::new();
        let middling = FunnelMetrics {
            node_count: 4,
            connection_density: 0.75,
            flow_complexity: 30,
            content_quality: 50,
        };
        assert!(!analyzer.strengths(&middling).is_empty());
        assert!(!analyzer.weaknesses(&middling).is_empty());
    }

    #[test]
    fn test_threshold_labels_fire() {
        let analyzer = FunnelAnalyzer::new();
        let weak = FunnelMetrics {
            node_count: 2,
            connection_density: 0.2,
            flow_complexity: 80,
            content_quality: 10,
        };
        assert_eq!(analyzer.weaknesses(&weak).len(), 4);

        let strong = FunnelMetrics {
            node_count: 8,
            connection_density: 1.2,
            flow_complexity: 40,
            content_quality: 80,
        };
        assert_eq!(analyzer.strengths(&strong).len(), 3);
    }
}
