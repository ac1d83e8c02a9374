//! # Graph Compiler / Linker
//!
//! Main entry points for compiling an editable dialogue graph into its
//! runtime asset, and for rebuilding an editable graph from a previously
//! compiled asset.
//!
//! The forward pass runs in fixed phases:
//!
//! 1. **Precondition** - the graph must have an entry root, or compilation
//!    is refused.
//! 2. **Reset** - runtime nodes from any previous compile are discarded;
//!    compilation is never incremental.
//! 3. **Produce** - every registered node allocates its runtime counterpart
//!    and copies identity and common fields. No cross-node dependencies.
//! 4. **Link** - a depth-first traversal from the root wires parent/child,
//!    true/false, and jump relationships. One visited set is shared across
//!    the whole pass, so jump and reroute cycles are walked exactly once.
//! 5. **Finalize** - conditions and events are copied into the asset with
//!    their node sockets resolved to runtime references.
//! 6. **Validate** - every node runs its local check; the asset is
//!    `Compiled` iff all pass, else `Failed`. A failed compile keeps the
//!    asset in place so the author can inspect errors.

mod kinds;

use std::collections::HashSet;

use crate::asset::{CompileStatus, Dialogue};
use crate::error::{CompileError, Result};
use crate::graph::{DialogueGraph, GraphNode, NodeId};

/// Compile an editable dialogue graph into a runtime asset.
///
/// # Arguments
///
/// * `graph` - The editable graph to compile. Node error flags are updated
///   as a side effect of validation.
/// * `asset` - The asset to compile into. Its previous node set is cleared.
///
/// # Returns
///
/// * `Ok(CompileStatus)` - `Compiled` or `Failed` per the validate phase.
/// * `Err(CompileError::MissingRoot)` - The graph has no entry node.
pub fn compile(graph: &mut DialogueGraph, asset: &mut Dialogue) -> Result<CompileStatus> {
    tracing::info!(
        "[dtgc] Compiling graph '{}' ({} nodes) into asset '{}'",
        graph.name(),
        graph.registry().len(),
        asset.name()
    );

    // Phase 1: precondition.
    let root = graph
        .root()
        .cloned()
        .ok_or_else(|| CompileError::MissingRoot(graph.name().to_string()))?;

    // Phase 2: reset.
    tracing::info!("[dtgc] Phase 2: Clearing previous runtime nodes...");
    asset.clear_nodes();
    asset.set_speakers(graph.speakers().clone());

    // Phase 3: produce. Registry order is irrelevant here; ids are sorted
    // only to keep the flat node list deterministic.
    tracing::info!("[dtgc] Phase 3: Producing runtime nodes...");
    let mut ids = graph.registry().ids();
    ids.sort();
    for id in &ids {
        if let Some(node) = graph.registry().lookup(id) {
            asset.add_node(kinds::produce(node));
        }
    }
    asset.set_root(root.clone());

    // Phase 4: link.
    tracing::info!("[dtgc] Phase 4: Linking runtime tree from '{}'...", root);
    let mut visited: HashSet<NodeId> = HashSet::new();
    link_subtree(&root, graph, asset, &mut visited);
    tracing::debug!(
        "[dtgc] Linked {} of {} nodes reachable from the root",
        visited.len(),
        ids.len()
    );

    // Phase 5: finalize.
    tracing::info!("[dtgc] Phase 5: Finalizing conditions and events...");
    for id in &ids {
        kinds::finalize(id, graph, asset);
    }

    // Phase 6: validate.
    tracing::info!("[dtgc] Phase 6: Validating nodes...");
    let results: Vec<(NodeId, bool)> = ids
        .iter()
        .filter_map(|id| {
            graph
                .registry()
                .lookup(id)
                .map(|node| (id.clone(), kinds::validate(node, graph)))
        })
        .collect();

    let mut status = CompileStatus::Compiled;
    for (id, valid) in results {
        if !valid {
            tracing::warn!("[dtgc] Node '{}' failed validation", id);
            status = CompileStatus::Failed;
        }
        if let Some(node) = graph.registry_mut().lookup_mut(&id) {
            node.set_error(!valid);
        }
    }

    asset.set_status(status);
    graph.bind_asset(asset.name());
    tracing::info!("[dtgc] Compilation finished: {:?}", status);
    Ok(status)
}

/// Depth-first link traversal. The visited set is shared across the whole
/// pass: reroute, jump, and branch topology can legally form cycles, and a
/// diamond-shaped subgraph must not be linked twice.
fn link_subtree(
    id: &NodeId,
    graph: &DialogueGraph,
    asset: &mut Dialogue,
    visited: &mut HashSet<NodeId>,
) {
    if !visited.insert(id.clone()) {
        return;
    }

    kinds::link(id, graph, asset);

    for child in graph.ordered_children(id) {
        link_subtree(&child, graph, asset, visited);
    }
}

/// Rebuild an editable graph from a compiled asset, the reverse of
/// [`compile`]. Used when opening an existing asset for editing.
///
/// Returns `false` when the asset carries no compiled data. A graph that
/// already has nodes and is bound to this asset is left untouched, making
/// the call idempotent for a live editing session.
pub fn rebuild_graph(asset: &Dialogue, graph: &mut DialogueGraph) -> bool {
    if !asset.has_existing_data() {
        tracing::debug!("[dtgc] Asset '{}' has no compiled data to rebuild from", asset.name());
        return false;
    }

    if !graph.registry().is_empty() && graph.bound_asset() == Some(asset.name()) {
        return true;
    }

    tracing::info!(
        "[dtgc] Rebuilding graph '{}' from asset '{}' ({} nodes)",
        graph.name(),
        asset.name(),
        asset.nodes().len()
    );

    // One editable node per runtime node, authored data loaded back.
    graph.reset_nodes();
    graph.set_speakers(asset.speakers().clone());
    for runtime in asset.nodes() {
        let mut node = GraphNode::new(
            runtime.id().clone(),
            kinds::default_data(runtime.kind()),
            runtime.position(),
        );
        node.load_from_runtime(runtime);
        graph.registry_mut().register(node);
    }

    match asset.root() {
        Some(root) if graph.registry().contains(root) => graph.set_root(root.clone()),
        _ => tracing::warn!(
            "[dtgc] Asset '{}' has no resolvable root node",
            asset.name()
        ),
    }

    // Regenerate links once every editable node exists, so cross-node
    // references can resolve through the registry.
    for runtime in asset.nodes() {
        kinds::regenerate(runtime.id(), runtime, graph);
    }

    graph.bind_asset(asset.name());
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{NodeData, Position};

    #[test]
    fn compile_without_root_is_refused() {
        let mut graph = DialogueGraph::new("test");
        let root = graph.root().unwrap().clone();
        graph.remove_node(&root);

        let mut asset = Dialogue::new("test");
        assert!(matches!(
            compile(&mut graph, &mut asset),
            Err(CompileError::MissingRoot(_))
        ));
    }

    #[test]
    fn diamond_subgraph_links_each_node_once() {
        let mut graph = DialogueGraph::new("test");
        graph.add_speaker("npc");
        let root = graph.root().unwrap().clone();
        let top = graph.add_node(NodeData::speech("npc", "top"), Position::new(0.0, 50.0));
        let left = graph.add_node(NodeData::speech("npc", "l"), Position::new(-50.0, 100.0));
        let right = graph.add_node(NodeData::speech("npc", "r"), Position::new(50.0, 100.0));
        let bottom = graph.add_node(NodeData::Reroute, Position::new(0.0, 150.0));

        graph.connect(&root, 0, &top);
        graph.connect(&top, 0, &left);
        graph.connect(&top, 0, &right);
        graph.connect(&left, 0, &bottom);
        graph.connect(&right, 0, &bottom);

        let mut asset = Dialogue::new("test");
        assert_eq!(compile(&mut graph, &mut asset).unwrap(), CompileStatus::Compiled);

        let bottom_node = asset.node(&bottom).unwrap();
        assert_eq!(bottom_node.parents(), [left, right]);
    }

    #[test]
    fn rebuild_of_empty_asset_is_a_no_op() {
        let asset = Dialogue::new("test");
        let mut graph = DialogueGraph::empty("test");
        assert!(!rebuild_graph(&asset, &mut graph));
        assert!(graph.registry().is_empty());
    }

    #[test]
    fn rebuild_is_idempotent_for_a_bound_graph() {
        let mut graph = DialogueGraph::new("test");
        graph.add_speaker("npc");
        let root = graph.root().unwrap().clone();
        let speech = graph.add_node(NodeData::speech("npc", "hi"), Position::new(50.0, 0.0));
        graph.connect(&root, 0, &speech);

        let mut asset = Dialogue::new("test");
        compile(&mut graph, &mut asset).unwrap();

        // Mutate the live session; a second rebuild must not clobber it.
        let extra = graph.add_node(NodeData::speech("npc", "extra"), Position::new(90.0, 0.0));
        assert!(rebuild_graph(&asset, &mut graph));
        assert!(graph.registry().contains(&extra));
    }
}
