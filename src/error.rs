//! # Compiler Errors
//!
//! Error types for the dialogue graph compiler.
//!
//! Only structural preconditions surface as errors. Recoverable problems
//! (stale conditions, dangling jump targets, unresolved sockets) become
//! per-node validation failures plus a warning log, so one broken node
//! never blocks compiling or opening the rest of the graph.

use thiserror::Error;

/// Errors raised by the compile and rebuild passes.
#[derive(Debug, Error)]
pub enum CompileError {
    /// The graph has no designated entry node to compile from.
    #[error("graph '{0}' has no entry node to compile from")]
    MissingRoot(String),

    /// A persisted asset could not be decoded.
    #[error("failed to decode dialogue asset: {0}")]
    AssetDecode(#[from] serde_json::Error),
}

/// Convenience result type used across the crate.
pub type Result<T> = std::result::Result<T, CompileError>;
