// SPDX-License-Identifier: MIT

//! Execution ordering for workflow graphs

use super::types::{Edge, Node, Workflow};
use std::collections::{HashMap, VecDeque};

/// Order nodes for sequential execution using Kahn's algorithm.
///
/// Zero in-degree nodes are seeded in declaration order so the output is
/// deterministic. Nodes never released (cycle members, self-loops) are appended
/// afterwards in declaration order, so the result always contains every node
/// exactly once. Edges naming unknown nodes are ignored.
pub fn topological_order<'a>(nodes: &'a [Node], edges: &[Edge]) -> Vec<&'a Node> {
    let index: HashMap<&str, usize> = nodes
        .iter()
        .enumerate()
        .map(|(i, n)| (n.id.as_str(), i))
        .collect();

    let mut in_degree = vec![0usize; nodes.len()];
    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];

    for edge in edges {
        match (
            index.get(edge.source.as_str()),
            index.get(edge.target.as_str()),
        ) {
            (Some(&from), Some(&to)) => {
                adjacency[from].push(to);
                in_degree[to] += 1;
            }
            _ => log::debug!(
                "Ignoring edge {} -> {} with unknown endpoint",
                edge.source,
                edge.target
            ),
        }
    }

    let mut queue: VecDeque<usize> = (0..nodes.len()).filter(|&i| in_degree[i] == 0).collect();
    let mut placed = vec![false; nodes.len()];
    let mut order = Vec::with_capacity(nodes.len());

    while let Some(current) = queue.pop_front() {
        placed[current] = true;
        order.push(&nodes[current]);
        for &next in &adjacency[current] {
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                queue.push_back(next);
            }
        }
    }

    if order.len() < nodes.len() {
        log::warn!(
            "Graph has a cycle or unreachable nodes; appending {} node(s) in declaration order",
            nodes.len() - order.len()
        );
        order.extend(
            nodes
                .iter()
                .enumerate()
                .filter(|(i, _)| !placed[*i])
                .map(|(_, n)| n),
        );
    }

    order
}

impl Workflow {
    /// Nodes in execution order
    pub fn execution_order(&self) -> Vec<&Node> {
        topological_order(&self.nodes, &self.edges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(order: &[&Node]) -> Vec<String> {
        order.iter().map(|n| n.id.clone()).collect()
    }

    fn nodes(ids: &[&str]) -> Vec<Node> {
        ids.iter().map(|id| Node::end(id)).collect()
    }

    fn assert_respects_edges(order: &[&Node], edges: &[Edge]) {
        let pos = |id: &str| order.iter().position(|n| n.id == id).unwrap();
        for e in edges {
            assert!(
                pos(&e.source) < pos(&e.target),
                "{} should precede {}",
                e.source,
                e.target
            );
        }
    }

    #[test]
    fn test_linear_chain() {
        let ns = nodes(&["c", "b", "a"]);
        let es = vec![Edge::new("a", "b"), Edge::new("b", "c")];
        let order = topological_order(&ns, &es);
        assert_eq!(ids(&order), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_diamond_respects_every_edge() {
        let ns = nodes(&["d", "c", "b", "a"]);
        let es = vec![
            Edge::new("a", "b"),
            Edge::new("a", "c"),
            Edge::new("b", "d"),
            Edge::new("c", "d"),
        ];
        let order = topological_order(&ns, &es);
        assert_eq!(order.len(), 4);
        assert_respects_edges(&order, &es);
    }

    #[test]
    fn test_independent_nodes_keep_declaration_order() {
        let ns = nodes(&["x", "y", "z"]);
        let order = topological_order(&ns, &[]);
        assert_eq!(ids(&order), vec!["x", "y", "z"]);
    }

    #[test]
    fn test_cycle_returns_all_nodes() {
        let ns = nodes(&["a", "b", "c"]);
        let es = vec![Edge::new("a", "b"), Edge::new("b", "c"), Edge::new("c", "a")];
        let order = topological_order(&ns, &es);
        // nothing has in-degree zero: full fallback to declaration order
        assert_eq!(ids(&order), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_partial_cycle_appends_remaining() {
        let ns = nodes(&["c", "b", "start"]);
        let es = vec![
            Edge::new("start", "b"),
            Edge::new("b", "c"),
            Edge::new("c", "b"),
        ];
        let order = topological_order(&ns, &es);
        assert_eq!(ids(&order), vec!["start", "c", "b"]);
    }

    #[test]
    fn test_self_loop_does_not_drop_node() {
        let ns = nodes(&["a", "b"]);
        let es = vec![Edge::new("a", "a"), Edge::new("a", "b")];
        let order = topological_order(&ns, &es);
        assert_eq!(ids(&order), vec!["a", "b"]);
    }

    #[test]
    fn test_unknown_edge_endpoints_ignored() {
        let ns = nodes(&["a", "b"]);
        let es = vec![Edge::new("ghost", "a"), Edge::new("a", "b")];
        let order = topological_order(&ns, &es);
        assert_eq!(ids(&order), vec!["a", "b"]);
    }

    #[test]
    fn test_empty_graph() {
        assert!(topological_order(&[], &[]).is_empty());
    }
}
