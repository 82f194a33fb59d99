/// Petgraph-backed workflow graph for a single run
///
/// Built fresh from the node/connection collections of one workflow and owned
/// exclusively by one engine run. Construction rejects connections that point
/// at unknown nodes; lookups for unknown identifiers are permissive and simply
/// return nothing.

use crate::runtime::error::GraphError;
use crate::workflow::types::{Connection, Node};
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::HashMap;

/// Directed graph of nodes, edges weighted by connection identifier
#[derive(Debug)]
pub struct WorkflowGraph {
    /// The petgraph DiGraph structure
    graph: DiGraph<Node, String>,
    /// Mapping from node ID to graph node index
    node_id_to_index: HashMap<String, NodeIndex>,
}

impl WorkflowGraph {
    /// Build the graph, failing on the first connection with a dangling endpoint
    pub fn build(nodes: &[Node], connections: &[Connection]) -> Result<Self, GraphError> {
        tracing::debug!(
            "Building workflow graph with {} nodes and {} connections",
            nodes.len(),
            connections.len()
        );

        let mut graph = DiGraph::with_capacity(nodes.len(), connections.len());
        let mut node_id_to_index = HashMap::with_capacity(nodes.len());

        for node in nodes {
            let index = graph.add_node(node.clone());
            node_id_to_index.insert(node.id.clone(), index);
        }

        for connection in connections {
            let lookup = |node_id: &String| {
                node_id_to_index
                    .get(node_id)
                    .copied()
                    .ok_or_else(|| GraphError::UnknownNode {
                        connection_id: connection.id.clone(),
                        node_id: node_id.clone(),
                    })
            };
            let from = lookup(&connection.source_node_id)?;
            let to = lookup(&connection.target_node_id)?;
            graph.add_edge(from, to, connection.id.clone());
        }

        Ok(Self {
            graph,
            node_id_to_index,
        })
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        let index = self.node_id_to_index.get(id)?;
        self.graph.node_weight(*index)
    }

    /// Trigger-category nodes in the order they were supplied
    pub fn triggers(&self) -> Vec<&Node> {
        self.graph
            .node_indices()
            .map(|index| &self.graph[index])
            .filter(|node| node.is_trigger())
            .collect()
    }

    /// Direct successors, in connection order
    pub fn successors(&self, id: &str) -> Vec<&str> {
        self.neighbors(id, Direction::Outgoing)
    }

    /// Direct predecessors, in connection order
    pub fn predecessors(&self, id: &str) -> Vec<&str> {
        self.neighbors(id, Direction::Incoming)
    }

    fn neighbors(&self, id: &str, direction: Direction) -> Vec<&str> {
        let Some(&index) = self.node_id_to_index.get(id) else {
            return Vec::new();
        };

        // petgraph walks adjacency lists newest-first; edge indices follow insertion order
        let mut edges: Vec<(EdgeIndex, NodeIndex)> = self
            .graph
            .edges_directed(index, direction)
            .map(|edge| {
                let other = match direction {
                    Direction::Outgoing => edge.target(),
                    Direction::Incoming => edge.source(),
                };
                (edge.id(), other)
            })
            .collect();
        edges.sort_by_key(|(edge, _)| edge.index());

        edges
            .into_iter()
            .map(|(_, other)| self.graph[other].id.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::types::NodeCategory;

    fn node(id: &str, category: NodeCategory) -> Node {
        Node::new(id, category, "noop", id)
    }

    fn diamond() -> WorkflowGraph {
        let nodes = vec![
            node("t", NodeCategory::Trigger),
            node("a", NodeCategory::Data),
            node("b", NodeCategory::Data),
            node("m", NodeCategory::Logic),
        ];
        let connections = vec![
            Connection::new("c1", "t", "a"),
            Connection::new("c2", "t", "b"),
            Connection::new("c3", "a", "m"),
            Connection::new("c4", "b", "m"),
        ];
        WorkflowGraph::build(&nodes, &connections).unwrap()
    }

    #[test]
    fn neighbors_follow_connection_order() {
        let graph = diamond();
        assert_eq!(graph.successors("t"), vec!["a", "b"]);
        assert_eq!(graph.predecessors("m"), vec!["a", "b"]);
        assert!(graph.predecessors("t").is_empty());
        assert_eq!(graph.edge_count(), 4);
    }

    #[test]
    fn unknown_lookups_are_empty() {
        let graph = diamond();
        assert!(graph.successors("missing").is_empty());
        assert!(graph.predecessors("missing").is_empty());
        assert!(graph.node("missing").is_none());
    }

    #[test]
    fn triggers_keep_supply_order() {
        let nodes = vec![
            node("second", NodeCategory::Trigger),
            node("data", NodeCategory::Data),
            node("first", NodeCategory::Trigger),
        ];
        let graph = WorkflowGraph::build(&nodes, &[]).unwrap();
        let ids: Vec<&str> = graph.triggers().iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["second", "first"]);
    }

    #[test]
    fn dangling_connection_is_rejected() {
        let nodes = vec![node("t", NodeCategory::Trigger)];
        let connections = vec![Connection::new("c1", "t", "ghost")];
        let err = WorkflowGraph::build(&nodes, &connections).unwrap_err();
        match err {
            GraphError::UnknownNode { connection_id, node_id } => {
                assert_eq!(connection_id, "c1");
                assert_eq!(node_id, "ghost");
            }
        }
    }
}
