//! # Editable Graph Nodes
//!
//! One [`GraphNode`] per authored dialogue beat. A node carries its stable
//! identifier, cosmetic placement, last validation result, a fixed set of
//! pins, and the kind-specific authored payload. Pin counts and directions
//! never change after creation; only their connections do.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::asset::{NodePayload, RuntimeNode};
use crate::condition::GraphCondition;
use crate::event::DialogueEvent;
use crate::socket::NodeSocket;

use super::registry::NodeRegistry;

/// Stable, human-legible node identifier, unique within its owning graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(String);

impl NodeId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 2-D placement in the editor canvas. Cosmetic, except that it decides
/// left-to-right child ordering, which in turn decides dialogue-option
/// display order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// The closed set of node kinds the compiler supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    Entry,
    Speech,
    Branch,
    Event,
    Jump,
    OptionLock,
    Reroute,
}

impl NodeKind {
    /// Base name new identifiers of this kind are generated from.
    pub fn base_id(&self) -> &'static str {
        match self {
            Self::Entry => "Entry",
            Self::Speech => "Speech",
            Self::Branch => "Branch",
            Self::Event => "Event",
            Self::Jump => "Jump",
            Self::OptionLock => "OptionLock",
            Self::Reroute => "Reroute",
        }
    }

    /// Fixed (input, output) pin counts.
    fn pin_counts(&self) -> (usize, usize) {
        match self {
            Self::Entry => (0, 1),
            Self::Speech => (1, 1),
            Self::Branch => (1, 2),
            Self::Event => (1, 1),
            Self::Jump => (1, 0),
            Self::OptionLock => (1, 1),
            Self::Reroute => (1, 1),
        }
    }
}

/// Pin direction, fixed at node creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinDirection {
    Input,
    Output,
}

/// One connection point on a node. Links record the node at the far end;
/// connection order on an output pin is authoring order.
#[derive(Debug, Clone, PartialEq)]
pub struct Pin {
    direction: PinDirection,
    links: Vec<NodeId>,
}

impl Pin {
    fn new(direction: PinDirection) -> Self {
        Self {
            direction,
            links: Vec::new(),
        }
    }

    pub fn direction(&self) -> PinDirection {
        self.direction
    }

    pub fn links(&self) -> &[NodeId] {
        &self.links
    }

    pub(crate) fn add_link(&mut self, id: NodeId) {
        if !self.links.contains(&id) {
            self.links.push(id);
        }
    }

    pub(crate) fn remove_link(&mut self, id: &NodeId) {
        self.links.retain(|link| link != id);
    }
}

/// Speech node payload: who says what. Option children hang off the pins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpeechData {
    pub speaker: String,
    pub text: String,
}

/// Branch node payload: ordered conditions plus the match-any flag that
/// decides whether they OR- or AND-combine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BranchData {
    pub if_any: bool,
    pub conditions: Vec<GraphCondition>,
}

/// Event node payload: the events to play, in authored order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventData {
    pub events: Vec<DialogueEvent>,
}

/// Jump node payload: the socket naming where dialogue flow reverts to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JumpData {
    pub target: Option<NodeSocket>,
}

/// Option-lock node payload: conditions gating a child option, plus the
/// display text for the locked and unlocked states.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionLockData {
    pub if_any: bool,
    pub conditions: Vec<GraphCondition>,
    pub locked_text: String,
    pub unlocked_text: String,
}

/// Kind-specific authored payload of a graph node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    Entry,
    Speech(SpeechData),
    Branch(BranchData),
    Event(EventData),
    Jump(JumpData),
    OptionLock(OptionLockData),
    Reroute,
}

impl NodeData {
    pub fn speech(speaker: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Speech(SpeechData {
            speaker: speaker.into(),
            text: text.into(),
        })
    }

    pub fn branch(if_any: bool, conditions: Vec<GraphCondition>) -> Self {
        Self::Branch(BranchData { if_any, conditions })
    }

    pub fn event(events: Vec<DialogueEvent>) -> Self {
        Self::Event(EventData { events })
    }

    pub fn jump(target: Option<NodeId>) -> Self {
        Self::Jump(JumpData {
            target: target.map(NodeSocket::for_graph_node),
        })
    }

    pub fn option_lock(
        if_any: bool,
        conditions: Vec<GraphCondition>,
        locked_text: impl Into<String>,
        unlocked_text: impl Into<String>,
    ) -> Self {
        Self::OptionLock(OptionLockData {
            if_any,
            conditions,
            locked_text: locked_text.into(),
            unlocked_text: unlocked_text.into(),
        })
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Entry => NodeKind::Entry,
            Self::Speech(_) => NodeKind::Speech,
            Self::Branch(_) => NodeKind::Branch,
            Self::Event(_) => NodeKind::Event,
            Self::Jump(_) => NodeKind::Jump,
            Self::OptionLock(_) => NodeKind::OptionLock,
            Self::Reroute => NodeKind::Reroute,
        }
    }
}

/// Editable node: identifier, placement, error flag, pins, authored payload.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphNode {
    id: NodeId,
    position: Position,
    error: bool,
    inputs: Vec<Pin>,
    outputs: Vec<Pin>,
    data: NodeData,
}

impl GraphNode {
    /// Creates a node with its default pins allocated for its kind.
    pub fn new(id: NodeId, data: NodeData, position: Position) -> Self {
        let (num_inputs, num_outputs) = data.kind().pin_counts();
        Self {
            id,
            position,
            error: false,
            inputs: (0..num_inputs).map(|_| Pin::new(PinDirection::Input)).collect(),
            outputs: (0..num_outputs).map(|_| Pin::new(PinDirection::Output)).collect(),
            data,
        }
    }

    pub fn id(&self) -> &NodeId {
        &self.id
    }

    pub fn kind(&self) -> NodeKind {
        self.data.kind()
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn set_position(&mut self, position: Position) {
        self.position = position;
    }

    /// Last local validation result, displayed as an error banner in the
    /// editor.
    pub fn error(&self) -> bool {
        self.error
    }

    pub fn set_error(&mut self, error: bool) {
        self.error = error;
    }

    pub fn data(&self) -> &NodeData {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut NodeData {
        &mut self.data
    }

    pub fn inputs(&self) -> &[Pin] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[Pin] {
        &self.outputs
    }

    pub(crate) fn input_pin_mut(&mut self, index: usize) -> Option<&mut Pin> {
        self.inputs.get_mut(index)
    }

    pub(crate) fn output_pin_mut(&mut self, index: usize) -> Option<&mut Pin> {
        self.outputs.get_mut(index)
    }

    /// All child ids in pin order, connection order within a pin.
    pub fn child_links(&self) -> Vec<NodeId> {
        self.outputs
            .iter()
            .flat_map(|pin| pin.links().iter().cloned())
            .collect()
    }

    /// All parent ids in connection order.
    pub fn parent_links(&self) -> Vec<NodeId> {
        self.inputs
            .iter()
            .flat_map(|pin| pin.links().iter().cloned())
            .collect()
    }

    pub(crate) fn remove_links_to(&mut self, id: &NodeId) {
        for pin in self.inputs.iter_mut().chain(self.outputs.iter_mut()) {
            pin.remove_link(id);
        }
    }

    /// Deep copy for paste: fresh identifier, no pin connections, error flag
    /// cleared. Conditions, events and sockets are value types, so the copy
    /// never aliases the original's bindings.
    pub fn duplicate_with_id(&self, id: NodeId) -> Self {
        let mut copy = Self::new(id, self.data.clone(), self.position);
        copy.set_position(Position::new(self.position.x + 30.0, self.position.y + 30.0));
        copy
    }

    /// Loads authored scalar data from a runtime node during the reverse
    /// pass. Cross-node payload (conditions, events, jump targets) is
    /// rebuilt later, once every editable node exists, in
    /// [`regenerate_connections`](crate::compiler::rebuild_graph).
    pub fn load_from_runtime(&mut self, runtime: &RuntimeNode) {
        self.position = runtime.position();
        match (&mut self.data, runtime.payload()) {
            (NodeData::Speech(data), NodePayload::Speech { speaker, text }) => {
                data.speaker = speaker.clone();
                data.text = text.clone();
            }
            (NodeData::Branch(data), NodePayload::Branch { if_any, .. }) => {
                data.if_any = *if_any;
            }
            (
                NodeData::OptionLock(data),
                NodePayload::OptionLock {
                    if_any,
                    locked_text,
                    unlocked_text,
                    ..
                },
            ) => {
                data.if_any = *if_any;
                data.locked_text = locked_text.clone();
                data.unlocked_text = unlocked_text.clone();
            }
            _ => {}
        }
    }
}

/// Orders nodes by horizontal placement, ties broken by vertical placement.
/// Load-bearing: this decides option display order and branch precedence.
pub fn sort_left_to_right(ids: &mut [NodeId], registry: &NodeRegistry) {
    ids.sort_by(|a, b| {
        let pa = registry.lookup(a).map(GraphNode::position).unwrap_or_default();
        let pb = registry.lookup(b).map(GraphNode::position).unwrap_or_default();
        pa.x.total_cmp(&pb.x).then(pa.y.total_cmp(&pb.y))
    });
}
