//! # Conditions and Queries
//!
//! A query names a value to compare (a boolean flag, a numeric stat, whether
//! a node has been visited); a condition supplies the comparison operator and
//! threshold, strongly typed to the query's value kind. [`GraphCondition`] is
//! the authoring-side binding between the two: when the author swaps a query
//! for one of a different value kind the bound condition is stale and gets
//! rebuilt, mirroring how the condition widgets re-type themselves in the
//! editor.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::graph::NodeRegistry;
use crate::socket::NodeSocket;

/// Value kind a query produces and a condition consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueKind {
    Bool,
    Float,
    Int,
}

/// What is being compared. The concrete gameplay lookups behind these live
/// in the host; the compiler only needs the value kind and, for
/// [`DialogueQuery::NodeVisited`], the node socket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DialogueQuery {
    /// A named boolean gameplay flag.
    Flag { name: String },
    /// A named float stat.
    FloatStat { name: String },
    /// A named integer stat.
    IntStat { name: String },
    /// Whether the player already visited another dialogue node.
    NodeVisited { socket: NodeSocket },
}

impl DialogueQuery {
    pub fn value_kind(&self) -> ValueKind {
        match self {
            Self::Flag { .. } | Self::NodeVisited { .. } => ValueKind::Bool,
            Self::FloatStat { .. } => ValueKind::Float,
            Self::IntStat { .. } => ValueKind::Int,
        }
    }

    pub fn node_visited(target: crate::graph::NodeId) -> Self {
        Self::NodeVisited {
            socket: NodeSocket::for_graph_node(target),
        }
    }

    pub fn socket(&self) -> Option<&NodeSocket> {
        match self {
            Self::NodeVisited { socket } => Some(socket),
            _ => None,
        }
    }

    pub fn socket_mut(&mut self) -> Option<&mut NodeSocket> {
        match self {
            Self::NodeVisited { socket } => Some(socket),
            _ => None,
        }
    }
}

impl fmt::Display for DialogueQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flag { name } => write!(f, "flag '{}'", name),
            Self::FloatStat { name } => write!(f, "stat '{}'", name),
            Self::IntStat { name } => write!(f, "stat '{}'", name),
            Self::NodeVisited { socket } => match socket.graph_node().or(socket.runtime_node()) {
                Some(id) => write!(f, "visited '{}'", id),
                None => write!(f, "visited <unset>"),
            },
        }
    }
}

/// Comparison operators for boolean queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoolComparison {
    #[default]
    EqualTo,
    NotEqualTo,
}

/// Comparison operators for numeric queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NumComparison {
    GreaterThan,
    LessThan,
    #[default]
    EqualTo,
}

/// How a query is evaluated: one variant per value kind, each owning its
/// query so a condition pulled out of a compiled asset is self-contained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DialogueCondition {
    Bool {
        query: DialogueQuery,
        comparison: BoolComparison,
        compare_value: bool,
    },
    Float {
        query: DialogueQuery,
        comparison: NumComparison,
        compare_value: f64,
    },
    Int {
        query: DialogueQuery,
        comparison: NumComparison,
        compare_value: i64,
    },
}

impl DialogueCondition {
    /// Fresh condition of the kind matching `query`'s value kind, with
    /// default comparison settings.
    pub fn for_query(query: DialogueQuery) -> Self {
        match query.value_kind() {
            ValueKind::Bool => Self::Bool {
                query,
                comparison: BoolComparison::default(),
                compare_value: true,
            },
            ValueKind::Float => Self::Float {
                query,
                comparison: NumComparison::default(),
                compare_value: 0.0,
            },
            ValueKind::Int => Self::Int {
                query,
                comparison: NumComparison::default(),
                compare_value: 0,
            },
        }
    }

    pub fn value_kind(&self) -> ValueKind {
        match self {
            Self::Bool { .. } => ValueKind::Bool,
            Self::Float { .. } => ValueKind::Float,
            Self::Int { .. } => ValueKind::Int,
        }
    }

    pub fn query(&self) -> &DialogueQuery {
        match self {
            Self::Bool { query, .. } | Self::Float { query, .. } | Self::Int { query, .. } => query,
        }
    }

    pub fn query_mut(&mut self) -> &mut DialogueQuery {
        match self {
            Self::Bool { query, .. } | Self::Float { query, .. } | Self::Int { query, .. } => query,
        }
    }

    /// Whether the condition is usable: its kind matches its query's value
    /// kind, and a node-visited query points at a node that is live in the
    /// editable graph.
    pub fn is_valid(&self, registry: &NodeRegistry) -> bool {
        if self.query().value_kind() != self.value_kind() {
            return false;
        }

        match self.query().socket() {
            Some(socket) => socket
                .graph_node()
                .is_some_and(|id| registry.contains(id)),
            None => true,
        }
    }
}

impl fmt::Display for DialogueCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool {
                query,
                comparison,
                compare_value,
            } => {
                let op = match comparison {
                    BoolComparison::EqualTo => "is",
                    BoolComparison::NotEqualTo => "is not",
                };
                write!(f, "{} {} {}", query, op, compare_value)
            }
            Self::Float {
                query,
                comparison,
                compare_value,
            } => write!(f, "{} {} {}", query, num_op(*comparison), compare_value),
            Self::Int {
                query,
                comparison,
                compare_value,
            } => write!(f, "{} {} {}", query, num_op(*comparison), compare_value),
        }
    }
}

fn num_op(comparison: NumComparison) -> &'static str {
    match comparison {
        NumComparison::GreaterThan => ">",
        NumComparison::LessThan => "<",
        NumComparison::EqualTo => "==",
    }
}

/// Authoring-side binding between a user-chosen query and its typed
/// condition. Owned by branch and option-lock graph nodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphCondition {
    query: Option<DialogueQuery>,
    condition: Option<DialogueCondition>,
}

impl GraphCondition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binding with the query already chosen and a matching condition built.
    pub fn with_query(query: DialogueQuery) -> Self {
        let mut binding = Self::new();
        binding.set_query(query);
        binding
    }

    pub fn query(&self) -> Option<&DialogueQuery> {
        self.query.as_ref()
    }

    pub fn condition(&self) -> Option<&DialogueCondition> {
        self.condition.as_ref()
    }

    pub fn condition_mut(&mut self) -> Option<&mut DialogueCondition> {
        self.condition.as_mut()
    }

    /// Stores the query and rebuilds the condition if the binding went
    /// stale. A same-kind swap keeps the authored comparison but the
    /// condition adopts the new query, so both sides of the binding always
    /// agree on what is being compared. The host editor calls this from its
    /// edit-notification hook.
    pub fn set_query(&mut self, query: DialogueQuery) {
        self.query = Some(query.clone());
        if self.needs_rebuild() {
            self.rebuild();
        } else if let Some(condition) = &mut self.condition {
            *condition.query_mut() = query;
        }
    }

    /// True when the bound condition's kind no longer matches the query's
    /// value kind, or no condition has been built yet for a present query.
    pub fn needs_rebuild(&self) -> bool {
        let Some(condition) = &self.condition else {
            return self.query.is_some();
        };

        match &self.query {
            Some(query) => query.value_kind() != condition.value_kind(),
            None => false,
        }
    }

    /// Replaces the condition with a fresh one typed to the current query.
    /// No query means no condition.
    pub fn rebuild(&mut self) {
        self.condition = self
            .query
            .clone()
            .map(DialogueCondition::for_query);
    }

    /// Reverse-path entry: adopt a condition pulled from a compiled asset,
    /// recover its query, and re-resolve a node-visited socket against the
    /// editable graph so the binding points at live editor nodes again.
    pub fn set_condition(&mut self, mut condition: DialogueCondition, registry: &NodeRegistry) {
        if let Some(socket) = condition.query_mut().socket_mut() {
            socket.resolve_against(registry);
        }
        self.query = Some(condition.query().clone());
        self.condition = Some(condition);
    }

    /// Produces the condition copy that goes into the compiled asset, with a
    /// node-visited socket resolved to its runtime node. A socket whose
    /// target was never set (or no longer exists) is logged and left
    /// unresolved; validation reports the node as not compilable.
    pub fn finalize(&self, registry: &NodeRegistry) -> Option<DialogueCondition> {
        self.query.as_ref()?;
        let mut compiled = self.condition.clone()?;

        if let Some(socket) = compiled.query_mut().socket_mut() {
            match socket.graph_node().cloned() {
                Some(graph_id) if registry.contains(&graph_id) => {
                    // Graph and asset share identifiers, so the runtime
                    // counterpart carries the same id.
                    socket.set_runtime_node(graph_id);
                }
                _ => {
                    tracing::warn!(
                        "[dtgc] Compiling node-visited query without a target node set"
                    );
                }
            }
        }

        Some(compiled)
    }

    /// Whether the binding is currently compilable.
    pub fn is_valid(&self, registry: &NodeRegistry) -> bool {
        match (&self.query, &self.condition) {
            (Some(_), Some(condition)) => condition.is_valid(registry),
            _ => false,
        }
    }
}
