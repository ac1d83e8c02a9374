//! # Editable Dialogue Graph
//!
//! The authoring-time side of the compiler: a mutable graph of typed nodes
//! connected by pins, owned alongside its [`NodeRegistry`]. Structural edits
//! go through the graph's methods, which feed a change-notification hook so
//! the registry stays consistent with the node collection — undo/redo in a
//! host editor re-enters the same path.

mod node;
mod registry;

pub use node::{
    sort_left_to_right, BranchData, EventData, GraphNode, JumpData, NodeData, NodeId, NodeKind,
    OptionLockData, Pin, PinDirection, Position, SpeechData,
};
pub use registry::NodeRegistry;

use std::collections::BTreeSet;

/// Structural edit notification. Everything that mutates the node collection
/// reports here, keeping registry bookkeeping in one place.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphChange {
    NodeAdded(NodeId),
    NodeRemoved(NodeId),
    NodeEdited(NodeId),
}

/// One editable dialogue graph: node registry, designated entry root,
/// speaker roster, and the identity of the asset it is bound to.
#[derive(Debug, Clone, Default)]
pub struct DialogueGraph {
    name: String,
    registry: NodeRegistry,
    root: Option<NodeId>,
    speakers: BTreeSet<String>,
    bound_asset: Option<String>,
}

impl DialogueGraph {
    /// Fresh graph seeded with its entry node at the origin.
    pub fn new(name: impl Into<String>) -> Self {
        let mut graph = Self {
            name: name.into(),
            ..Self::default()
        };
        graph.add_node(NodeData::Entry, Position::default());
        graph
    }

    /// Completely empty graph, used by the reverse pass before nodes are
    /// rebuilt from an asset.
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut NodeRegistry {
        &mut self.registry
    }

    /// The entry node the compile pass starts from.
    pub fn root(&self) -> Option<&NodeId> {
        self.root.as_ref()
    }

    pub(crate) fn set_root(&mut self, id: NodeId) {
        self.root = Some(id);
    }

    /// Name of the asset this graph was last compiled to or rebuilt from.
    pub fn bound_asset(&self) -> Option<&str> {
        self.bound_asset.as_deref()
    }

    pub(crate) fn bind_asset(&mut self, name: &str) {
        self.bound_asset = Some(name.to_string());
    }

    /// Drops every node and the root so the reverse pass can rebuild the
    /// graph from an asset.
    pub(crate) fn reset_nodes(&mut self) {
        self.registry.clear();
        self.root = None;
    }

    // --- speaker roster -------------------------------------------------

    pub fn add_speaker(&mut self, name: impl Into<String>) {
        self.speakers.insert(name.into());
    }

    pub fn has_speaker(&self, name: &str) -> bool {
        self.speakers.contains(name)
    }

    pub fn speakers(&self) -> &BTreeSet<String> {
        &self.speakers
    }

    pub(crate) fn set_speakers(&mut self, speakers: BTreeSet<String>) {
        self.speakers = speakers;
    }

    // --- structural edits -----------------------------------------------

    /// Creates a node of the given payload, assigns it a disambiguated
    /// identifier from its kind's base name, and registers it. An entry
    /// node becomes the graph root; a second entry is refused since the
    /// root must be unique.
    pub fn add_node(&mut self, data: NodeData, position: Position) -> NodeId {
        if data.kind() == NodeKind::Entry {
            if let Some(root) = &self.root {
                tracing::warn!(
                    "[dtgc] Graph '{}' already has entry node '{}', refusing a second",
                    self.name,
                    root
                );
                return root.clone();
            }
        }

        let id = self.registry.unique_id(data.kind().base_id());
        let is_entry = data.kind() == NodeKind::Entry;
        self.registry
            .register(GraphNode::new(id.clone(), data, position));
        if is_entry {
            self.root = Some(id.clone());
        }

        self.on_graph_changed(GraphChange::NodeAdded(id.clone()));
        id
    }

    /// Deletes a node: strips its connections from every neighbor, then
    /// unregisters it through the change hook.
    pub fn remove_node(&mut self, id: &NodeId) {
        let Some(node) = self.registry.lookup(id) else {
            return;
        };

        let mut neighbors = node.child_links();
        neighbors.extend(node.parent_links());
        for neighbor in neighbors {
            if let Some(other) = self.registry.lookup_mut(&neighbor) {
                other.remove_links_to(id);
            }
        }

        self.on_graph_changed(GraphChange::NodeRemoved(id.clone()));
    }

    /// Paste path: deep-copies a node under a fresh identifier. Condition
    /// bindings and sockets are copied, never shared with the original.
    pub fn duplicate_node(&mut self, id: &NodeId) -> Option<NodeId> {
        let source = self.registry.lookup(id)?;
        if source.kind() == NodeKind::Entry {
            tracing::warn!("[dtgc] Entry node '{}' cannot be duplicated", id);
            return None;
        }

        let new_id = self.registry.unique_id(source.kind().base_id());
        let copy = source.duplicate_with_id(new_id.clone());
        self.registry.register(copy);
        self.on_graph_changed(GraphChange::NodeAdded(new_id.clone()));
        Some(new_id)
    }

    /// Connects an output pin of `from` to the input pin of `to`. Invalid
    /// endpoints are logged and ignored.
    pub fn connect(&mut self, from: &NodeId, output_pin: usize, to: &NodeId) -> bool {
        if from == to {
            tracing::warn!("[dtgc] Refusing self-connection on '{}'", from);
            return false;
        }
        if !self.registry.contains(from) || !self.registry.contains(to) {
            tracing::warn!("[dtgc] Cannot connect '{}' -> '{}': missing node", from, to);
            return false;
        }

        let output_ok = {
            let source = self.registry.lookup_mut(from).unwrap();
            match source.output_pin_mut(output_pin) {
                Some(output) => {
                    output.add_link(to.clone());
                    true
                }
                None => false,
            }
        };
        if !output_ok {
            tracing::warn!("[dtgc] Node '{}' has no output pin {}", from, output_pin);
            return false;
        }

        let input_ok = {
            let target = self.registry.lookup_mut(to).unwrap();
            match target.input_pin_mut(0) {
                Some(input) => {
                    input.add_link(from.clone());
                    true
                }
                None => false,
            }
        };
        if !input_ok {
            tracing::warn!("[dtgc] Node '{}' has no input pin", to);
            // Roll back the half-made link.
            if let Some(source) = self.registry.lookup_mut(from) {
                if let Some(output) = source.output_pin_mut(output_pin) {
                    output.remove_link(to);
                }
            }
            return false;
        }
        true
    }

    /// Removes the link between an output pin of `from` and `to`.
    pub fn disconnect(&mut self, from: &NodeId, output_pin: usize, to: &NodeId) {
        if let Some(source) = self.registry.lookup_mut(from) {
            if let Some(output) = source.output_pin_mut(output_pin) {
                output.remove_link(to);
            }
        }
        if let Some(target) = self.registry.lookup_mut(to) {
            if let Some(input) = target.input_pin_mut(0) {
                input.remove_link(from);
            }
        }
    }

    /// Host-facing edit notification, also re-entered by undo/redo. Keeps
    /// the registry consistent and refreshes stale condition bindings the
    /// way the condition widgets do after a property edit.
    pub fn on_graph_changed(&mut self, change: GraphChange) {
        match change {
            GraphChange::NodeAdded(_) => {}
            GraphChange::NodeRemoved(id) => {
                if self.root.as_ref() == Some(&id) {
                    self.root = None;
                }
                self.registry.unregister(&id);
            }
            GraphChange::NodeEdited(id) => {
                if let Some(node) = self.registry.lookup_mut(&id) {
                    let conditions = match node.data_mut() {
                        NodeData::Branch(data) => Some(&mut data.conditions),
                        NodeData::OptionLock(data) => Some(&mut data.conditions),
                        _ => None,
                    };
                    if let Some(conditions) = conditions {
                        for binding in conditions {
                            if binding.needs_rebuild() {
                                binding.rebuild();
                            }
                        }
                    }
                }
            }
        }
    }

    // --- queries used by the compiler ------------------------------------

    /// Children of a node for traversal and runtime-child ordering: pins in
    /// order, and within a pin the fan-out ordered left to right. The first
    /// node connected on a pin stays authoritative when fan-out is one.
    pub fn ordered_children(&self, id: &NodeId) -> Vec<NodeId> {
        let Some(node) = self.registry.lookup(id) else {
            return Vec::new();
        };

        let mut children = Vec::new();
        for pin in node.outputs() {
            let mut pin_children: Vec<NodeId> = pin.links().to_vec();
            if pin_children.len() > 1 {
                sort_left_to_right(&mut pin_children, &self.registry);
            }
            children.extend(pin_children);
        }
        children
    }

    /// First node connected on the given output pin, if any.
    pub fn first_child_on_pin(&self, id: &NodeId, output_pin: usize) -> Option<NodeId> {
        self.registry
            .lookup(id)?
            .outputs()
            .get(output_pin)?
            .links()
            .first()
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_graph_has_entry_root() {
        let graph = DialogueGraph::new("test");
        let root = graph.root().expect("entry root");
        assert_eq!(graph.registry().lookup(root).unwrap().kind(), NodeKind::Entry);
    }

    #[test]
    fn second_entry_is_refused() {
        let mut graph = DialogueGraph::new("test");
        let root = graph.root().unwrap().clone();
        let again = graph.add_node(NodeData::Entry, Position::default());
        assert_eq!(again, root);
        assert_eq!(graph.registry().len(), 1);
    }

    #[test]
    fn remove_node_unregisters_and_strips_links() {
        let mut graph = DialogueGraph::new("test");
        let root = graph.root().unwrap().clone();
        let speech = graph.add_node(NodeData::speech("npc", "hi"), Position::new(100.0, 0.0));
        assert!(graph.connect(&root, 0, &speech));

        graph.remove_node(&speech);
        assert!(!graph.registry().contains(&speech));
        assert!(graph.ordered_children(&root).is_empty());
    }

    #[test]
    fn removing_root_clears_it() {
        let mut graph = DialogueGraph::new("test");
        let root = graph.root().unwrap().clone();
        graph.remove_node(&root);
        assert!(graph.root().is_none());
    }

    #[test]
    fn connect_rejects_bad_endpoints() {
        let mut graph = DialogueGraph::new("test");
        let root = graph.root().unwrap().clone();
        let jump = graph.add_node(NodeData::jump(None), Position::new(50.0, 0.0));

        // Jump has no output pins; entry has no input pin.
        assert!(!graph.connect(&jump, 0, &root));
        assert!(!graph.connect(&root, 0, &root));
        assert!(graph.ordered_children(&jump).is_empty());
    }

    #[test]
    fn pin_fanout_orders_children_left_to_right() {
        let mut graph = DialogueGraph::new("test");
        let root = graph.root().unwrap().clone();
        let right = graph.add_node(NodeData::speech("npc", "b"), Position::new(200.0, 0.0));
        let left = graph.add_node(NodeData::speech("npc", "a"), Position::new(-100.0, 0.0));
        graph.connect(&root, 0, &right);
        graph.connect(&root, 0, &left);

        assert_eq!(graph.ordered_children(&root), vec![left, right]);
    }

    #[test]
    fn duplicate_assigns_fresh_id() {
        let mut graph = DialogueGraph::new("test");
        let speech = graph.add_node(NodeData::speech("npc", "hi"), Position::default());
        let copy = graph.duplicate_node(&speech).unwrap();
        assert_ne!(copy, speech);
        assert!(graph.registry().contains(&copy));
    }
}
