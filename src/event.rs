//! # Dialogue Events
//!
//! Events an event node plays when entered. The gameplay side of an event is
//! the host's business; the compiler only needs each event's requirement
//! check and, for events that target another node, its socket handling.

use serde::{Deserialize, Serialize};

use crate::graph::{NodeId, NodeRegistry};
use crate::socket::NodeSocket;

/// One event instance carried by an event node, in authored order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DialogueEvent {
    /// Clears the visited flag on another dialogue node.
    ResetNodeVisits { socket: NodeSocket },
    /// Raises a named gameplay signal for the host to react to.
    Notify { name: String },
}

impl DialogueEvent {
    pub fn reset_node_visits(target: NodeId) -> Self {
        Self::ResetNodeVisits {
            socket: NodeSocket::for_graph_node(target),
        }
    }

    pub fn notify(name: impl Into<String>) -> Self {
        Self::Notify { name: name.into() }
    }

    /// Whether the event declares everything it needs to play. A node
    /// target must point at a node that is live in the editable graph, the
    /// same liveness rule node-visited conditions use.
    pub fn requirements_met(&self, registry: &NodeRegistry) -> bool {
        match self {
            Self::ResetNodeVisits { socket } => socket
                .graph_node()
                .is_some_and(|id| registry.contains(id)),
            Self::Notify { name } => !name.is_empty(),
        }
    }

    fn socket_mut(&mut self) -> Option<&mut NodeSocket> {
        match self {
            Self::ResetNodeVisits { socket } => Some(socket),
            Self::Notify { .. } => None,
        }
    }

    /// Copy of the event for the compiled asset, with a node socket resolved
    /// to its runtime node. A missing target is logged and left unresolved.
    pub fn finalize(&self, registry: &NodeRegistry) -> Self {
        let mut compiled = self.clone();
        if let Some(socket) = compiled.socket_mut() {
            match socket.graph_node().cloned() {
                Some(graph_id) if registry.contains(&graph_id) => {
                    socket.set_runtime_node(graph_id);
                }
                _ => {
                    tracing::warn!(
                        "[dtgc] Compiling dialogue event with missing node parameter"
                    );
                }
            }
        }
        compiled
    }

    /// Reverse path: re-resolve a socket read out of a compiled asset
    /// against the editable graph.
    pub fn regenerate(&mut self, registry: &NodeRegistry) {
        if let Some(socket) = self.socket_mut() {
            socket.resolve_against(registry);
        }
    }
}
