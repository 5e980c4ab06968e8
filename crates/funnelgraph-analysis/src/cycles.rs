use std::collections::{HashMap, HashSet};

use funnelgraph_core::FunnelEdge;

/// Returns true when the directed edge set contains a cycle.
///
/// Works over every node id appearing in an edge, so dangling endpoints
/// participate. Self-edges count as a cycle of length 1. Runs in O(V+E)
/// with an explicit DFS stack, so deep chains cannot overflow.
pub fn has_cycle(edges: &[FunnelEdge]) -> bool {
    let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
    for edge in edges {
        adjacency
            .entry(edge.source.as_str())
            .or_default()
            .push(edge.target.as_str());
        adjacency.entry(edge.target.as_str()).or_default();
    }

    let mut visited: HashSet<&str> = HashSet::new();
    let mut on_stack: HashSet<&str> = HashSet::new();

    for &start in adjacency.keys() {
        if visited.contains(start) {
            continue;
        }

        visited.insert(start);
        on_stack.insert(start);
        // Frames hold (node, index of the next outgoing edge to follow).
        let mut stack: Vec<(&str, usize)> = vec![(start, 0)];

        loop {
            let (node, next_index) = match stack.last_mut() {
                Some(frame) => {
                    let current = (frame.0, frame.1);
                    frame.1 += 1;
                    current
                }
                None => break,
            };

            let neighbors = adjacency.get(node).map(|n| n.as_slice()).unwrap_or(&[]);
            if next_index < neighbors.len() {
                let next = neighbors[next_index];
                if on_stack.contains(next) {
                    // Back-edge to a node still being explored.
                    return true;
                }
                if visited.insert(next) {
                    on_stack.insert(next);
                    stack.push((next, 0));
                }
            } else {
                on_stack.remove(node);
                stack.pop();
            }
        }
    }

    false
}
