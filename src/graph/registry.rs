//! # Node Identity Registry
//!
//! Single source of truth for "does this identifier exist" in an editable
//! graph. The registry owns the graph nodes, keyed by their stable string
//! identifiers, and hands out the disambiguated identifiers assigned at node
//! creation.

use std::collections::HashMap;

use super::node::{GraphNode, NodeId};

/// Identifier-to-node map for one editable graph.
#[derive(Debug, Clone, Default)]
pub struct NodeRegistry {
    nodes: HashMap<NodeId, GraphNode>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node keyed by its identifier. A duplicate identifier is logged
    /// and ignored; the registry keeps its original mapping. Identifier
    /// assignment via [`NodeRegistry::unique_id`] is the authority that
    /// prevents this during normal authoring.
    pub fn register(&mut self, node: GraphNode) {
        if self.nodes.contains_key(node.id()) {
            tracing::warn!(
                "[dtgc] Ignoring registration of duplicate node id '{}'",
                node.id()
            );
            return;
        }
        self.nodes.insert(node.id().clone(), node);
    }

    /// Removes the mapping for `id`, returning the node if it was present.
    pub fn unregister(&mut self, id: &NodeId) -> Option<GraphNode> {
        self.nodes.remove(id)
    }

    pub fn lookup(&self, id: &NodeId) -> Option<&GraphNode> {
        self.nodes.get(id)
    }

    pub fn lookup_mut(&mut self, id: &NodeId) -> Option<&mut GraphNode> {
        self.nodes.get_mut(id)
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// All live nodes, in no particular order.
    pub fn all(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.values()
    }

    /// Identifiers of all live nodes, in no particular order.
    pub fn ids(&self) -> Vec<NodeId> {
        self.nodes.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    /// Generates a free identifier from a per-kind base name, suffixing a
    /// disambiguator when the base is taken: `Branch`, `Branch_1`, ...
    pub fn unique_id(&self, base: &str) -> NodeId {
        let candidate = NodeId::from(base);
        if !self.contains(&candidate) {
            return candidate;
        }

        let mut n = 1;
        loop {
            let candidate = NodeId::from(format!("{}_{}", base, n));
            if !self.contains(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }
}
