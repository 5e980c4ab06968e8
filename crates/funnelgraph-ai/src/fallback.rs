use funnelgraph_core::{
    AnalysisThresholds, FunnelMetrics, Suggestion, SuggestionKind, SuggestionPriority,
};

/// Deterministic rule-based suggestions, used whenever no provider
/// output survives parsing.
///
/// Pure function of the metrics: no I/O, at most one suggestion per weak
/// metric, and a single neutral entry when nothing is weak, so callers
/// always receive a non-empty list.
pub fn fallback_suggestions(
    metrics: &FunnelMetrics,
    thresholds: &AnalysisThresholds,
) -> Vec<Suggestion> {
    let mut suggestions = Vec::new();

    if metrics.node_count < thresholds.sparse_node_count {
        suggestions.push(Suggestion {
            kind: SuggestionKind::Structure,
            priority: SuggestionPriority::High,
            title: "Add qualification and nurturing steps".to_string(),
            description: format!(
                "The funnel only has {} step(s), which rarely gives visitors \
                 enough touchpoints before the conversion ask",
                metrics.node_count
            ),
            recommendation: "Add a lead-qualification step after the entry page and a \
                             nurturing sequence before the offer"
                .to_string(),
            impact: "More qualified prospects reach the conversion step".to_string(),
            implementation: "Insert new modules between the entry point and the final \
                             call to action, then connect them in order"
                .to_string(),
            estimated_time: "1-2 hours".to_string(),
        });
    }

    if metrics.connection_density < thresholds.low_density {
        suggestions.push(Suggestion {
            kind: SuggestionKind::Flow,
            priority: SuggestionPriority::Medium,
            title: "Connect your modules".to_string(),
            description: format!(
                "Connection density is {:.2}; many steps have no outgoing \
                 transition, so visitors can dead-end",
                metrics.connection_density
            ),
            recommendation: "Give every step an explicit next action so traffic keeps \
                             moving toward the conversion goal"
                .to_string(),
            impact: "Fewer drop-offs between steps".to_string(),
            implementation: "Draw a transition from each unconnected module to its \
                             logical successor"
                .to_string(),
            estimated_time: "30 minutes".to_string(),
        });
    }

    if metrics.content_quality < thresholds.fallback_content {
        suggestions.push(Suggestion {
            kind: SuggestionKind::Content,
            priority: SuggestionPriority::High,
            title: "Configure module content".to_string(),
            description: format!(
                "Content quality is {}/100; most modules are placeholders \
                 without copy, messages, or configuration",
                metrics.content_quality
            ),
            recommendation: "Fill in the copy, messages, and settings for each module \
                             before driving traffic"
                .to_string(),
            impact: "Visitors see finished pages instead of empty shells".to_string(),
            implementation: "Open each module, add its content, and set its module type".to_string(),
            estimated_time: "2-4 hours".to_string(),
        });
    }

    if suggestions.is_empty() {
        suggestions.push(Suggestion {
            kind: SuggestionKind::Conversion,
            priority: SuggestionPriority::Low,
            title: "No structural issues found".to_string(),
            description: "The funnel passes every structural check the rule-based \
                          reviewer applies"
                .to_string(),
            recommendation: "Run an A/B test on the primary call to action to keep \
                             improving conversion"
                .to_string(),
            impact: "Incremental conversion gains on an already-solid funnel".to_string(),
            implementation: "Duplicate the funnel, vary one element, and split traffic".to_string(),
            estimated_time: "1 hour".to_string(),
        });
    }

    suggestions
}
