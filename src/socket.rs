//! # Node Sockets
//!
//! A [`NodeSocket`] is a weak, serializable reference from one dialogue node
//! to another. It names its target by identifier and keeps up to two live
//! handles for the same logical node: one into the compiled asset and one
//! into the editable graph. Only the identifiers persist; after an asset is
//! loaded a socket carries the compiled-node identifier alone and must be
//! regenerated against a graph's node registry before the editor can use it.

use serde::{Deserialize, Serialize};

use crate::graph::{NodeId, NodeRegistry};

/// Weak cross-reference between a compiled runtime node and its editable
/// counterpart. Accessors never panic; an absent side simply reads as
/// "no target".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeSocket {
    /// Identifier of the target node in the compiled asset.
    runtime_node: Option<NodeId>,
    /// Identifier of the target node in the editable graph. Derived state,
    /// rebuilt by [`NodeSocket::resolve_against`] after load.
    #[serde(skip)]
    graph_node: Option<NodeId>,
}

impl NodeSocket {
    /// Empty socket with no target on either side.
    pub fn new() -> Self {
        Self::default()
    }

    /// Socket pointing at a live editor-graph node, as created when the
    /// author picks a target. The runtime side is filled in at compile time.
    pub fn for_graph_node(id: NodeId) -> Self {
        Self {
            runtime_node: None,
            graph_node: Some(id),
        }
    }

    /// Socket pointing at a compiled runtime node, as created when reading
    /// an asset back into the editor.
    pub fn for_runtime_node(id: NodeId) -> Self {
        Self {
            runtime_node: Some(id),
            graph_node: None,
        }
    }

    pub fn runtime_node(&self) -> Option<&NodeId> {
        self.runtime_node.as_ref()
    }

    pub fn graph_node(&self) -> Option<&NodeId> {
        self.graph_node.as_ref()
    }

    pub fn set_runtime_node(&mut self, id: NodeId) {
        self.runtime_node = Some(id);
    }

    pub fn set_graph_node(&mut self, id: NodeId) {
        self.graph_node = Some(id);
    }

    /// Populates the live graph handle by looking the compiled-node
    /// identifier up in `registry`. No-op when the compiled side is absent.
    /// An identifier that no longer resolves is logged and left dangling;
    /// dependent features treat the socket as having no target.
    pub fn resolve_against(&mut self, registry: &NodeRegistry) {
        let Some(runtime_id) = &self.runtime_node else {
            return;
        };

        if registry.contains(runtime_id) {
            self.graph_node = Some(runtime_id.clone());
        } else {
            tracing::warn!(
                "[dtgc] Node socket target '{}' has no live graph node",
                runtime_id
            );
        }
    }
}
