use std::collections::HashMap;

use crate::error::WorkpilotError;

/// Detect cycles in a directed stage flow using DFS 3-color.
/// edges: Vec<(from, to)> meaning `to` follows `from`.
pub fn detect_cycle(nodes: &[String], edges: &[(String, String)]) -> Result<(), WorkpilotError> {
    let mut adj: HashMap<&str, Vec<&str>> = HashMap::new();
    for node in nodes {
        adj.entry(node.as_str()).or_default();
    }
    for (from, to) in edges {
        adj.entry(from.as_str()).or_default().push(to.as_str());
    }

    // 0=white, 1=gray, 2=black
    let mut color: HashMap<&str, u8> = adj.keys().map(|node| (*node, 0)).collect();

    let mut roots: Vec<&str> = adj.keys().copied().collect();
    roots.sort_unstable();
    for node in roots {
        if color[node] == 0 && has_cycle_dfs(node, &adj, &mut color) {
            return Err(WorkpilotError::cycle_detected());
        }
    }
    Ok(())
}

fn has_cycle_dfs<'a>(
    node: &'a str,
    adj: &HashMap<&'a str, Vec<&'a str>>,
    color: &mut HashMap<&'a str, u8>,
) -> bool {
    color.insert(node, 1);
    if let Some(neighbors) = adj.get(node) {
        for &neighbor in neighbors {
            match color.get(neighbor) {
                Some(1) => return true, // back edge
                Some(0) | None => {
                    if has_cycle_dfs(neighbor, adj, color) {
                        return true;
                    }
                }
                _ => {}
            }
        }
    }
    color.insert(node, 2);
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_cycle() {
        let nodes = vec!["a".into(), "b".into(), "c".into()];
        let edges = vec![("a".into(), "b".into()), ("b".into(), "c".into())];
        assert!(detect_cycle(&nodes, &edges).is_ok());
    }

    #[test]
    fn test_cycle() {
        let nodes = vec!["a".into(), "b".into(), "c".into()];
        let edges = vec![
            ("a".into(), "b".into()),
            ("b".into(), "c".into()),
            ("c".into(), "a".into()),
        ];
        assert!(detect_cycle(&nodes, &edges).is_err());
    }

    #[test]
    fn test_self_cycle() {
        let nodes = vec!["a".into()];
        let edges = vec![("a".into(), "a".into())];
        assert!(detect_cycle(&nodes, &edges).is_err());
    }
}
