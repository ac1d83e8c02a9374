//! # Dialogue Tree Graph Compiler (DTGC)
//!
//! Compiler for transforming editable branching-dialogue node graphs into
//! immutable runtime assets, and back again.
//!
//! The editable side is a [`graph::DialogueGraph`]: typed nodes (entry,
//! speech, branch, event, jump, option lock, reroute) connected by pins and
//! tracked in a [`graph::NodeRegistry`]. Compiling produces a
//! [`asset::Dialogue`]: a flat set of runtime nodes with bidirectional
//! parent/child links that a dialogue-execution engine walks at play time.
//! Opening an existing asset runs the reverse pass, rebuilding an
//! equivalent editable graph including the cross-node references that are
//! persisted only as identifiers.
//!
//! ## Quick Start
//!
//! ```rust
//! use dtgc::{compile, CompileStatus, Dialogue, DialogueGraph, NodeData, Position};
//!
//! let mut graph = DialogueGraph::new("greeting");
//! graph.add_speaker("guard");
//!
//! let root = graph.root().unwrap().clone();
//! let hello = graph.add_node(
//!     NodeData::speech("guard", "Halt! Who goes there?"),
//!     Position::new(100.0, 0.0),
//! );
//! graph.connect(&root, 0, &hello);
//!
//! let mut asset = Dialogue::new("greeting");
//! let status = compile(&mut graph, &mut asset)?;
//! assert_eq!(status, CompileStatus::Compiled);
//! # Ok::<(), dtgc::CompileError>(())
//! ```
//!
//! ## Architecture
//!
//! The forward pass runs in fixed phases:
//!
//! 1. **Precondition** - refuse to compile a graph with no entry root
//! 2. **Produce** - allocate one runtime node per graph node
//! 3. **Link** - cycle-safe depth-first wiring of parent/child/target links
//! 4. **Finalize** - resolve condition and event node sockets
//! 5. **Validate** - per-kind local checks deciding the compile status

pub mod asset;
pub mod compiler;
pub mod condition;
pub mod error;
pub mod event;
pub mod graph;
pub mod socket;

// Re-export the main compilation API
pub use compiler::{compile, rebuild_graph};

// Re-export the core types for convenience
pub use asset::{CompileStatus, Dialogue, EnterOutcome, NodePayload, RuntimeNode};
pub use condition::{
    BoolComparison, DialogueCondition, DialogueQuery, GraphCondition, NumComparison, ValueKind,
};
pub use error::{CompileError, Result};
pub use event::DialogueEvent;
pub use graph::{
    DialogueGraph, GraphChange, GraphNode, NodeData, NodeId, NodeKind, NodeRegistry, Position,
};
pub use socket::NodeSocket;
