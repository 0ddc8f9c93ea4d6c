//! Error types for the workflow crate.
//!
//! The taxonomy follows the layers of the crate:
//! - `GraphError`: structural errors that reject a graph mutation outright
//! - `FieldError` / `SaveError`: configuration errors that block a save,
//!   reported per field
//! - `StoreError` / `BackendError`: boundary errors from collaborators
//!
//! Data-unavailable conditions (no upstream run yet, empty record set) are
//! not errors anywhere in this crate; they are represented as empty record
//! sets.

use crate::edge::ConnectionId;
use crate::node::NodeId;
use millwright_core::WorkflowId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Errors from graph operations.
///
/// A failed mutation leaves the graph unchanged; there is no partial state
/// to roll back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// Node with the given ID was not found in the graph.
    NodeNotFound { node_id: NodeId },
    /// Connection with the given ID was not found in the graph.
    ConnectionNotFound { connection_id: ConnectionId },
    /// Source port not found on the source node's kind.
    SourcePortNotFound { node_id: NodeId, port_name: String },
    /// Target port not found on the target node's kind.
    TargetPortNotFound { node_id: NodeId, port_name: String },
    /// The target input port already has an incoming connection.
    DuplicateInputPort { node_id: NodeId, port_name: String },
    /// Adding the connection would create a cycle.
    CycleDetected,
    /// A required input port has no incoming connection.
    RequiredInputMissing { node_id: NodeId, port_name: String },
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NodeNotFound { node_id } => {
                write!(f, "node not found: {node_id}")
            }
            Self::ConnectionNotFound { connection_id } => {
                write!(f, "connection not found: {connection_id}")
            }
            Self::SourcePortNotFound { node_id, port_name } => {
                write!(f, "source port '{port_name}' not found on node {node_id}")
            }
            Self::TargetPortNotFound { node_id, port_name } => {
                write!(f, "target port '{port_name}' not found on node {node_id}")
            }
            Self::DuplicateInputPort { node_id, port_name } => {
                write!(
                    f,
                    "input port '{port_name}' on node {node_id} already has an incoming connection"
                )
            }
            Self::CycleDetected => write!(f, "connection would create a cycle"),
            Self::RequiredInputMissing { node_id, port_name } => {
                write!(
                    f,
                    "required input port '{port_name}' on node {node_id} has no incoming connection"
                )
            }
        }
    }
}

impl std::error::Error for GraphError {}

/// A configuration error on a single editable field.
///
/// Serialized so editor surfaces can highlight exactly what is wrong.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// The config field the error applies to.
    pub field: String,
    /// Human-readable description of what is wrong.
    pub message: String,
}

impl FieldError {
    /// Creates a new field error.
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Errors from the uniform save operation.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveError {
    /// The underlying graph operation failed.
    Graph(GraphError),
    /// The merged configuration candidate failed validation.
    /// Nothing was persisted.
    Invalid(Vec<FieldError>),
}

impl fmt::Display for SaveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Graph(err) => write!(f, "save failed: {err}"),
            Self::Invalid(errors) => {
                write!(f, "configuration invalid ({} field error(s))", errors.len())
            }
        }
    }
}

impl std::error::Error for SaveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Graph(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<GraphError> for SaveError {
    fn from(err: GraphError) -> Self {
        Self::Graph(err)
    }
}

/// Errors from the definition persistence boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Workflow not found in the store.
    NotFound { workflow_id: WorkflowId },
    /// The storage collaborator failed.
    Backend { message: String },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { workflow_id } => {
                write!(f, "workflow not found: {workflow_id}")
            }
            Self::Backend { message } => write!(f, "workflow store failed: {message}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Errors from the execution backend boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The backend could not be reached.
    Unavailable { message: String },
    /// The backend refused to start a run.
    RunRejected {
        workflow_id: WorkflowId,
        message: String,
    },
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable { message } => {
                write!(f, "execution backend unavailable: {message}")
            }
            Self::RunRejected {
                workflow_id,
                message,
            } => {
                write!(f, "run rejected for workflow {workflow_id}: {message}")
            }
        }
    }
}

impl std::error::Error for BackendError {}
