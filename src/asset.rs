//! # Compiled Dialogue Asset
//!
//! The read-mostly product of a compile pass: a flat list of runtime nodes
//! with bidirectional parent/child links, a root reference, and the overall
//! compile status. The execution engine walks this asset at play time; the
//! only runtime behavior owned here is the node-entry contract, because a
//! reroute node's forwarding is compiled data, not engine logic.
//!
//! Persistence round-trips the flat node list and payloads; the id index is
//! derived state and rebuilt on load.

use std::collections::{BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::condition::DialogueCondition;
use crate::error::Result;
use crate::event::DialogueEvent;
use crate::graph::{NodeId, NodeKind, Position};

/// Aggregate result of per-node validation for the last compile pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompileStatus {
    /// No compile pass has produced this asset yet.
    #[default]
    Uncompiled,
    /// Every node passed local validation.
    Compiled,
    /// At least one node failed; the asset is kept as a diagnostic state.
    Failed,
}

/// Kind-specific payload of a compiled node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodePayload {
    Entry,
    Speech {
        speaker: String,
        text: String,
    },
    Branch {
        if_any: bool,
        /// One slot per authored condition binding; an unbound binding
        /// compiles to an empty slot in the `Failed` diagnostic state.
        conditions: Vec<Option<DialogueCondition>>,
        true_target: Option<NodeId>,
        false_target: Option<NodeId>,
    },
    Event {
        events: Vec<DialogueEvent>,
    },
    Jump {
        target: Option<NodeId>,
    },
    OptionLock {
        if_any: bool,
        conditions: Vec<Option<DialogueCondition>>,
        locked_text: String,
        unlocked_text: String,
    },
    Reroute,
}

impl NodePayload {
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Entry => NodeKind::Entry,
            Self::Speech { .. } => NodeKind::Speech,
            Self::Branch { .. } => NodeKind::Branch,
            Self::Event { .. } => NodeKind::Event,
            Self::Jump { .. } => NodeKind::Jump,
            Self::OptionLock { .. } => NodeKind::OptionLock,
            Self::Reroute => NodeKind::Reroute,
        }
    }
}

/// One compiled node. Parent and child lists are the transitive closure of
/// pin connections at compile time; an edge always exists in both
/// directions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeNode {
    id: NodeId,
    position: Position,
    parents: Vec<NodeId>,
    children: Vec<NodeId>,
    payload: NodePayload,
}

impl RuntimeNode {
    pub fn new(id: NodeId, position: Position, payload: NodePayload) -> Self {
        Self {
            id,
            position,
            parents: Vec::new(),
            children: Vec::new(),
            payload,
        }
    }

    pub fn id(&self) -> &NodeId {
        &self.id
    }

    pub fn kind(&self) -> NodeKind {
        self.payload.kind()
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn parents(&self) -> &[NodeId] {
        &self.parents
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn payload(&self) -> &NodePayload {
        &self.payload
    }

    pub fn payload_mut(&mut self) -> &mut NodePayload {
        &mut self.payload
    }

    fn add_parent(&mut self, id: NodeId) {
        if !self.parents.contains(&id) {
            self.parents.push(id);
        }
    }

    fn add_child(&mut self, id: NodeId) {
        if !self.children.contains(&id) {
            self.children.push(id);
        }
    }
}

/// What the execution engine sees after asking a node to enter.
#[derive(Debug, Clone, PartialEq)]
pub enum EnterOutcome {
    /// Dialogue continues at this node.
    Active(NodeId),
    /// The dialogue session ended.
    Ended,
}

/// The compiled dialogue asset. Owns its runtime nodes exclusively; a
/// compile pass replaces the node set wholesale.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dialogue {
    name: String,
    speakers: BTreeSet<String>,
    nodes: Vec<RuntimeNode>,
    root: Option<NodeId>,
    status: CompileStatus,
    /// Derived id lookup, rebuilt after load.
    #[serde(skip)]
    index: HashMap<NodeId, usize>,
}

impl Dialogue {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> CompileStatus {
        self.status
    }

    pub fn set_status(&mut self, status: CompileStatus) {
        self.status = status;
    }

    pub fn root(&self) -> Option<&NodeId> {
        self.root.as_ref()
    }

    pub fn set_root(&mut self, id: NodeId) {
        self.root = Some(id);
    }

    pub fn speakers(&self) -> &BTreeSet<String> {
        &self.speakers
    }

    pub fn set_speakers(&mut self, speakers: BTreeSet<String>) {
        self.speakers = speakers;
    }

    /// Whether a previous compile left data worth rebuilding a graph from.
    pub fn has_existing_data(&self) -> bool {
        !self.nodes.is_empty()
    }

    /// Flat node list in production order.
    pub fn nodes(&self) -> &[RuntimeNode] {
        &self.nodes
    }

    pub fn node(&self, id: &NodeId) -> Option<&RuntimeNode> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn node_mut(&mut self, id: &NodeId) -> Option<&mut RuntimeNode> {
        self.index.get(id).map(|&i| &mut self.nodes[i])
    }

    /// Drops every runtime node and the root reference. Compilation is
    /// never incremental; the produce phase starts from here.
    pub fn clear_nodes(&mut self) {
        self.nodes.clear();
        self.index.clear();
        self.root = None;
    }

    /// Adds a produced node. A duplicate identifier is logged and ignored,
    /// preserving the identifier-uniqueness invariant of the node set.
    pub fn add_node(&mut self, node: RuntimeNode) {
        if self.index.contains_key(node.id()) {
            tracing::warn!(
                "[dtgc] Asset '{}' already contains node id '{}', ignoring",
                self.name,
                node.id()
            );
            return;
        }
        self.index.insert(node.id().clone(), self.nodes.len());
        self.nodes.push(node);
    }

    /// Records a parent/child edge in both directions. Missing endpoints
    /// are logged and skipped.
    pub fn add_edge(&mut self, parent: &NodeId, child: &NodeId) {
        if !self.index.contains_key(parent) || !self.index.contains_key(child) {
            tracing::warn!(
                "[dtgc] Cannot link '{}' -> '{}': node missing from asset",
                parent,
                child
            );
            return;
        }
        if let Some(node) = self.node_mut(parent) {
            node.add_child(child.clone());
        }
        if let Some(node) = self.node_mut(child) {
            node.add_parent(parent.clone());
        }
    }

    /// Node-entry contract consumed by the execution engine. A reroute node
    /// immediately forwards to its single child; a reroute with no child
    /// ends the dialogue with a warning. Chained reroutes are followed
    /// iteratively, and a reroute cycle terminates the session rather than
    /// looping.
    pub fn enter(&self, id: &NodeId) -> EnterOutcome {
        let mut current = id.clone();
        let mut visited: HashSet<NodeId> = HashSet::new();

        loop {
            let Some(node) = self.node(&current) else {
                tracing::warn!("[dtgc] Entered unknown node '{}', ending dialogue", current);
                return EnterOutcome::Ended;
            };

            if node.kind() != NodeKind::Reroute {
                return EnterOutcome::Active(current);
            }

            if !visited.insert(current.clone()) {
                tracing::warn!("[dtgc] Reroute cycle at '{}', ending dialogue", current);
                return EnterOutcome::Ended;
            }

            match node.children().first() {
                Some(child) => current = child.clone(),
                None => {
                    tracing::warn!(
                        "[dtgc] Exiting dialogue: entered reroute node '{}' with no children",
                        current
                    );
                    return EnterOutcome::Ended;
                }
            }
        }
    }

    // --- persistence helpers ---------------------------------------------

    /// Serializes the asset for the host's persisted-asset layer.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Restores an asset, rebuilding the derived id index that is not
    /// persisted directly.
    pub fn from_json(json: &str) -> Result<Self> {
        let mut asset: Self = serde_json::from_str(json)?;
        asset.rebuild_index();
        Ok(asset)
    }

    fn rebuild_index(&mut self) {
        self.index = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (node.id().clone(), i))
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn speech(id: &str) -> RuntimeNode {
        RuntimeNode::new(
            NodeId::from(id),
            Position::default(),
            NodePayload::Speech {
                speaker: "npc".into(),
                text: "hi".into(),
            },
        )
    }

    fn reroute(id: &str) -> RuntimeNode {
        RuntimeNode::new(NodeId::from(id), Position::default(), NodePayload::Reroute)
    }

    #[test]
    fn duplicate_node_ids_are_ignored() {
        let mut asset = Dialogue::new("test");
        asset.add_node(speech("a"));
        asset.add_node(speech("a"));
        assert_eq!(asset.nodes().len(), 1);
    }

    #[test]
    fn edges_are_bidirectional() {
        let mut asset = Dialogue::new("test");
        asset.add_node(speech("a"));
        asset.add_node(speech("b"));
        asset.add_edge(&NodeId::from("a"), &NodeId::from("b"));

        assert_eq!(asset.node(&NodeId::from("a")).unwrap().children(), [NodeId::from("b")]);
        assert_eq!(asset.node(&NodeId::from("b")).unwrap().parents(), [NodeId::from("a")]);
    }

    #[test]
    fn enter_forwards_through_reroute() {
        let mut asset = Dialogue::new("test");
        asset.add_node(reroute("r"));
        asset.add_node(speech("a"));
        asset.add_edge(&NodeId::from("r"), &NodeId::from("a"));

        assert_eq!(
            asset.enter(&NodeId::from("r")),
            EnterOutcome::Active(NodeId::from("a"))
        );
    }

    #[test]
    fn enter_on_childless_reroute_ends_dialogue() {
        let mut asset = Dialogue::new("test");
        asset.add_node(reroute("r"));
        assert_eq!(asset.enter(&NodeId::from("r")), EnterOutcome::Ended);
    }

    #[test]
    fn enter_on_reroute_cycle_terminates() {
        let mut asset = Dialogue::new("test");
        asset.add_node(reroute("r1"));
        asset.add_node(reroute("r2"));
        asset.add_edge(&NodeId::from("r1"), &NodeId::from("r2"));
        asset.add_edge(&NodeId::from("r2"), &NodeId::from("r1"));

        assert_eq!(asset.enter(&NodeId::from("r1")), EnterOutcome::Ended);
    }

    #[test]
    fn json_round_trip_rebuilds_index() {
        let mut asset = Dialogue::new("test");
        asset.add_node(speech("a"));
        asset.add_node(speech("b"));
        asset.add_edge(&NodeId::from("a"), &NodeId::from("b"));
        asset.set_root(NodeId::from("a"));
        asset.set_status(CompileStatus::Compiled);

        let restored = Dialogue::from_json(&asset.to_json().unwrap()).unwrap();
        assert_eq!(restored.status(), CompileStatus::Compiled);
        assert_eq!(restored.root(), Some(&NodeId::from("a")));
        assert!(restored.node(&NodeId::from("b")).is_some());
    }
}
