//! Reduce a builder flow (stage nodes plus directed connections) to the
//! ordered stage sequence stored on a task.
//!
//! Only a single linear chain is accepted: every node has at most one
//! successor and one predecessor, there is no cycle, and all nodes hang off
//! one starting node.

use std::collections::{HashMap, HashSet};

use serde::Deserialize;

use crate::error::WorkpilotError;

use super::cycle;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FlowEdge {
    pub source: String,
    pub target: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Flow {
    #[serde(default)]
    pub nodes: Vec<String>,
    #[serde(default)]
    pub edges: Vec<FlowEdge>,
}

impl Flow {
    /// A flow that chains `nodes` in the given order.
    pub fn chain(nodes: Vec<String>) -> Self {
        let edges = nodes
            .windows(2)
            .map(|pair| FlowEdge { source: pair[0].clone(), target: pair[1].clone() })
            .collect();
        Self { nodes, edges }
    }
}

pub fn linearize(flow: &Flow) -> Result<Vec<String>, WorkpilotError> {
    let mut seen = HashSet::new();
    for node in &flow.nodes {
        if !seen.insert(node.as_str()) {
            return Err(WorkpilotError::validation(format!(
                "Stage '{node}' appears more than once in the flow"
            )));
        }
    }

    let mut next: HashMap<&str, &str> = HashMap::new();
    let mut has_incoming: HashSet<&str> = HashSet::new();
    for edge in &flow.edges {
        for end in [&edge.source, &edge.target] {
            if !seen.contains(end.as_str()) {
                return Err(WorkpilotError::validation(format!(
                    "Connection references unknown stage '{end}'"
                )));
            }
        }
        if next.insert(edge.source.as_str(), edge.target.as_str()).is_some() {
            return Err(WorkpilotError::validation(format!(
                "Stage '{}' connects to more than one next stage",
                edge.source
            )));
        }
        if !has_incoming.insert(edge.target.as_str()) {
            return Err(WorkpilotError::validation(format!(
                "Stage '{}' is reached from more than one stage",
                edge.target
            )));
        }
    }

    let edges: Vec<(String, String)> = flow
        .edges
        .iter()
        .map(|e| (e.source.clone(), e.target.clone()))
        .collect();
    cycle::detect_cycle(&flow.nodes, &edges)?;

    let heads: Vec<&str> = flow
        .nodes
        .iter()
        .map(String::as_str)
        .filter(|n| !has_incoming.contains(n))
        .collect();
    let head = match heads.as_slice() {
        [] => return Ok(Vec::new()),
        [head] => *head,
        _ => {
            return Err(WorkpilotError::validation(format!(
                "Stage flow is not a single chain: {} separate starting stages ({})",
                heads.len(),
                heads.join(", ")
            )))
        }
    };

    let mut sequence = vec![head.to_string()];
    let mut cursor = head;
    while let Some(&following) = next.get(cursor) {
        sequence.push(following.to_string());
        cursor = following;
    }
    Ok(sequence)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(source: &str, target: &str) -> FlowEdge {
        FlowEdge { source: source.into(), target: target.into() }
    }

    fn nodes(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_walks_from_node_without_incoming_edge() {
        let flow = Flow {
            nodes: nodes(&["c", "a", "b"]),
            edges: vec![edge("b", "c"), edge("a", "b")],
        };
        assert_eq!(linearize(&flow).unwrap(), nodes(&["a", "b", "c"]));
    }

    #[test]
    fn test_single_node_without_edges() {
        let flow = Flow { nodes: nodes(&["a"]), edges: vec![] };
        assert_eq!(linearize(&flow).unwrap(), nodes(&["a"]));
    }

    #[test]
    fn test_empty_flow_is_zero_stages() {
        assert!(linearize(&Flow::default()).unwrap().is_empty());
    }

    #[test]
    fn test_chain_helper_round_trips_order() {
        let ordered = nodes(&["x", "y", "z"]);
        assert_eq!(linearize(&Flow::chain(ordered.clone())).unwrap(), ordered);
    }

    #[test]
    fn test_sequence_length_matches_distinct_stages() {
        let ordered = nodes(&["s1", "s2", "s3", "s4", "s5"]);
        let seq = linearize(&Flow::chain(ordered)).unwrap();
        let distinct: HashSet<_> = seq.iter().collect();
        assert_eq!(seq.len(), 5);
        assert_eq!(distinct.len(), 5);
    }

    #[test]
    fn test_disconnected_flow_rejected() {
        let flow = Flow { nodes: nodes(&["a", "b", "c"]), edges: vec![edge("a", "b")] };
        let err = linearize(&flow).unwrap_err();
        assert!(err.message.contains("not a single chain"));
    }

    #[test]
    fn test_branching_rejected() {
        let flow = Flow {
            nodes: nodes(&["a", "b", "c"]),
            edges: vec![edge("a", "b"), edge("a", "c")],
        };
        assert!(linearize(&flow).unwrap_err().message.contains("more than one next"));
    }

    #[test]
    fn test_merge_rejected() {
        let flow = Flow {
            nodes: nodes(&["a", "b", "c"]),
            edges: vec![edge("a", "c"), edge("b", "c")],
        };
        assert!(linearize(&flow).unwrap_err().message.contains("more than one stage"));
    }

    #[test]
    fn test_cycle_rejected() {
        let flow = Flow {
            nodes: nodes(&["a", "b"]),
            edges: vec![edge("a", "b"), edge("b", "a")],
        };
        let err = linearize(&flow).unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::CycleDetected);
    }

    #[test]
    fn test_duplicate_node_rejected() {
        let flow = Flow { nodes: nodes(&["a", "a"]), edges: vec![] };
        assert!(linearize(&flow).unwrap_err().message.contains("more than once"));
    }

    #[test]
    fn test_unknown_edge_endpoint_rejected() {
        let flow = Flow { nodes: nodes(&["a"]), edges: vec![edge("a", "ghost")] };
        assert!(linearize(&flow).unwrap_err().message.contains("unknown stage"));
    }
}
