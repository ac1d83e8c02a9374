//! # Per-Kind Node Compilers
//!
//! One compiler per node kind, dispatched by matching on the node payload.
//! Each kind owns four steps: `produce` allocates the runtime counterpart
//! with no links wired, `link` performs wiring that needs the entire runtime
//! node set to exist, `finalize` copies conditions and events into the asset
//! with their node sockets resolved, and `validate` checks the kind's local
//! well-formedness rule. The reverse-pass complement `regenerate` turns a
//! runtime node's references back into pin connections and authoring-side
//! bindings.

use crate::asset::{Dialogue, NodePayload, RuntimeNode};
use crate::condition::GraphCondition;
use crate::graph::{
    DialogueGraph, GraphNode, NodeData, NodeId, NodeKind,
};
use crate::socket::NodeSocket;

/// Allocates the runtime counterpart of a graph node and assigns its
/// identity and common fields. No parents, children, or cross-node payload
/// yet; those need other runtime nodes to exist first.
pub(crate) fn produce(node: &GraphNode) -> RuntimeNode {
    let payload = match node.data() {
        NodeData::Entry => NodePayload::Entry,
        NodeData::Speech(data) => NodePayload::Speech {
            speaker: data.speaker.clone(),
            text: data.text.clone(),
        },
        NodeData::Branch(data) => NodePayload::Branch {
            if_any: data.if_any,
            conditions: Vec::new(),
            true_target: None,
            false_target: None,
        },
        NodeData::Event(_) => NodePayload::Event { events: Vec::new() },
        NodeData::Jump(_) => NodePayload::Jump { target: None },
        NodeData::OptionLock(data) => NodePayload::OptionLock {
            if_any: data.if_any,
            conditions: Vec::new(),
            locked_text: data.locked_text.clone(),
            unlocked_text: data.unlocked_text.clone(),
        },
        NodeData::Reroute => NodePayload::Reroute,
    };

    RuntimeNode::new(node.id().clone(), node.position(), payload)
}

/// Kind-specific wiring for one visited node: parent/child edges to its
/// ordered children, a branch's true/false targets, a jump's resolved
/// target. Reads other nodes' produced state only, never their links.
pub(crate) fn link(id: &NodeId, graph: &DialogueGraph, asset: &mut Dialogue) {
    for child in graph.ordered_children(id) {
        asset.add_edge(id, &child);
    }

    let Some(node) = graph.registry().lookup(id) else {
        return;
    };

    match node.data() {
        NodeData::Branch(_) => {
            // First node connected on a pin is authoritative: pin 0 is the
            // true branch, pin 1 the false branch.
            let true_target = graph.first_child_on_pin(id, 0);
            let false_target = graph.first_child_on_pin(id, 1);
            if let Some(NodePayload::Branch {
                true_target: t,
                false_target: f,
                ..
            }) = asset.node_mut(id).map(RuntimeNode::payload_mut)
            {
                *t = true_target;
                *f = false_target;
            }
        }
        NodeData::Jump(data) => {
            let resolved = data
                .target
                .as_ref()
                .and_then(NodeSocket::graph_node)
                .filter(|target| asset.node(target).is_some())
                .cloned();

            if resolved.is_none() {
                tracing::warn!("[dtgc] Compiling jump node '{}' with no target node set", id);
            }

            if let Some(NodePayload::Jump { target }) =
                asset.node_mut(id).map(RuntimeNode::payload_mut)
            {
                *target = resolved;
            }
        }
        _ => {}
    }
}

/// Copies conditions and events into the asset with node-visited sockets
/// resolved to runtime references. Runs after the link phase because a
/// socket's target may not have existed, or could have been the node
/// itself, while linking. Every binding keeps its slot: an unbound binding
/// compiles to an empty one, so the compiled list length always matches the
/// authored binding count even in the `Failed` diagnostic state.
pub(crate) fn finalize(id: &NodeId, graph: &DialogueGraph, asset: &mut Dialogue) {
    let Some(node) = graph.registry().lookup(id) else {
        return;
    };
    let registry = graph.registry();

    match node.data() {
        NodeData::Branch(data) => {
            let compiled: Vec<_> = data
                .conditions
                .iter()
                .map(|binding| binding.finalize(registry))
                .collect();
            if let Some(NodePayload::Branch { conditions, .. }) =
                asset.node_mut(id).map(RuntimeNode::payload_mut)
            {
                *conditions = compiled;
            }
        }
        NodeData::OptionLock(data) => {
            let compiled: Vec<_> = data
                .conditions
                .iter()
                .map(|binding| binding.finalize(registry))
                .collect();
            if let Some(NodePayload::OptionLock { conditions, .. }) =
                asset.node_mut(id).map(RuntimeNode::payload_mut)
            {
                *conditions = compiled;
            }
        }
        NodeData::Event(data) => {
            let compiled: Vec<_> = data
                .events
                .iter()
                .map(|event| event.finalize(registry))
                .collect();
            if let Some(NodePayload::Event { events }) =
                asset.node_mut(id).map(RuntimeNode::payload_mut)
            {
                *events = compiled;
            }
        }
        _ => {}
    }
}

/// Kind-specific local well-formedness check. The caller records the result
/// in the node's error flag for display.
pub(crate) fn validate(node: &GraphNode, graph: &DialogueGraph) -> bool {
    match node.data() {
        NodeData::Entry | NodeData::Reroute => true,
        NodeData::Speech(data) => {
            let ok = graph.has_speaker(&data.speaker);
            if !ok {
                tracing::debug!(
                    "[dtgc] Speech node '{}' names unknown speaker '{}'",
                    node.id(),
                    data.speaker
                );
            }
            ok
        }
        NodeData::Branch(data) => data
            .conditions
            .iter()
            .all(|binding| binding.is_valid(graph.registry())),
        NodeData::OptionLock(data) => data
            .conditions
            .iter()
            .all(|binding| binding.is_valid(graph.registry())),
        NodeData::Event(data) => data
            .events
            .iter()
            .all(|event| event.requirements_met(graph.registry())),
        NodeData::Jump(data) => match data.target.as_ref().and_then(NodeSocket::graph_node) {
            Some(target) => graph.registry().contains(target) && target != node.id(),
            None => false,
        },
    }
}

/// Default authored payload for rebuilding an editable node of this kind.
pub(crate) fn default_data(kind: NodeKind) -> NodeData {
    match kind {
        NodeKind::Entry => NodeData::Entry,
        NodeKind::Speech => NodeData::Speech(Default::default()),
        NodeKind::Branch => NodeData::Branch(Default::default()),
        NodeKind::Event => NodeData::Event(Default::default()),
        NodeKind::Jump => NodeData::Jump(Default::default()),
        NodeKind::OptionLock => NodeData::OptionLock(Default::default()),
        NodeKind::Reroute => NodeData::Reroute,
    }
}

/// Reverse-pass complement of `link`/`finalize` for one node: recreates pin
/// connections from the runtime node's child and target references, and
/// rebuilds condition bindings, events, and sockets as copies owned by the
/// editable graph.
pub(crate) fn regenerate(id: &NodeId, runtime: &RuntimeNode, graph: &mut DialogueGraph) {
    // Pin wiring first. Branch children map onto dedicated pins; every
    // other kind reconnects its children on its single output pin.
    match runtime.payload() {
        NodePayload::Branch {
            true_target,
            false_target,
            ..
        } => {
            if let Some(target) = true_target {
                graph.connect(id, 0, target);
            }
            if let Some(target) = false_target {
                graph.connect(id, 1, target);
            }
        }
        NodePayload::Jump { .. } => {}
        _ => {
            for child in runtime.children() {
                graph.connect(id, 0, child);
            }
        }
    }

    // Authoring-side bindings, duplicated from the asset's copies rather
    // than aliased. Built against the registry before mutating the node so
    // socket resolution can see the whole rebuilt graph.
    match runtime.payload() {
        NodePayload::Branch { conditions, .. } | NodePayload::OptionLock { conditions, .. } => {
            let rebuilt: Vec<GraphCondition> = conditions
                .iter()
                .map(|condition| match condition {
                    Some(condition) => {
                        let mut binding = GraphCondition::new();
                        binding.set_condition(condition.clone(), graph.registry());
                        binding
                    }
                    // Empty slot: the binding was unbound at compile time.
                    None => GraphCondition::new(),
                })
                .collect();

            if let Some(node) = graph.registry_mut().lookup_mut(id) {
                match node.data_mut() {
                    NodeData::Branch(data) => data.conditions = rebuilt,
                    NodeData::OptionLock(data) => data.conditions = rebuilt,
                    _ => {}
                }
            }
        }
        NodePayload::Event { events } => {
            let mut rebuilt = events.clone();
            for event in &mut rebuilt {
                event.regenerate(graph.registry());
            }
            if let Some(node) = graph.registry_mut().lookup_mut(id) {
                if let NodeData::Event(data) = node.data_mut() {
                    data.events = rebuilt;
                }
            }
        }
        NodePayload::Jump { target } => {
            let socket = target.clone().map(|target_id| {
                let mut socket = NodeSocket::for_runtime_node(target_id);
                socket.resolve_against(graph.registry());
                socket
            });
            if let Some(node) = graph.registry_mut().lookup_mut(id) {
                if let NodeData::Jump(data) = node.data_mut() {
                    data.target = socket;
                }
            }
        }
        _ => {}
    }
}
