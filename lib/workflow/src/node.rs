//! Workflow node types.
//!
//! Nodes are the processing steps of a workflow. Each node has:
//! - A unique ID within the workflow
//! - A kind from a closed set of type tags
//! - An opaque configuration payload (`params`) whose shape is defined by
//!   the kind and never interpreted by the graph layer
//! - Input and output ports derived from the kind

use crate::port::{InputPort, OutputPort};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use ulid::Ulid;

/// A unique identifier for a node within a workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(Ulid);

impl NodeId {
    /// Creates a new random node ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }

    /// Creates a node ID from a ULID.
    #[must_use]
    pub const fn from_ulid(ulid: Ulid) -> Self {
        Self(ulid)
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node_{}", self.0)
    }
}

/// The kind of a workflow node.
///
/// This is the closed set of type tags the graph layer is written against.
/// Everything kind-specific lives in the node's `params` payload and in the
/// configuration surface registered for the kind; adding a new kind never
/// touches the graph store, the resolver, or the save path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Produces records from an upstream system (sensor feed, ERP export).
    Source,
    /// Combines two record streams under a join strategy.
    Join,
    /// Splits one stream into two named output lanes.
    Split,
    /// Routes records down a true/false branch.
    Condition,
    /// Per-record data manipulation.
    Transform,
    /// Sends a notification on a configured channel.
    Notification,
    /// Human approval gate.
    Approval,
    /// Cron-style scheduled entry point.
    Schedule,
    /// HTTP webhook entry point.
    Webhook,
    /// Terminal node marking final workflow output.
    Output,
}

impl NodeKind {
    /// Default user-facing label for nodes of this kind.
    #[must_use]
    pub fn default_label(&self) -> &'static str {
        match self {
            Self::Source => "Source",
            Self::Join => "Join",
            Self::Split => "Split",
            Self::Condition => "Condition",
            Self::Transform => "Transform",
            Self::Notification => "Notification",
            Self::Approval => "Approval",
            Self::Schedule => "Schedule",
            Self::Webhook => "Webhook",
            Self::Output => "Output",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.default_label())
    }
}

/// A workflow node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier for this node within the workflow.
    pub id: NodeId,
    /// The node's type tag.
    pub kind: NodeKind,
    /// Human-readable label, defaulted from the kind.
    pub label: String,
    /// Opaque configuration payload. The graph layer never interprets
    /// its contents; only the kind's configuration surface does.
    pub params: JsonValue,
    /// Input ports for this node.
    pub inputs: Vec<InputPort>,
    /// Output ports for this node.
    pub outputs: Vec<OutputPort>,
}

impl Node {
    /// Creates a new node of the given kind with an initial payload.
    #[must_use]
    pub fn new(kind: NodeKind, params: JsonValue) -> Self {
        let (inputs, outputs) = Self::default_ports(kind);
        Self {
            id: NodeId::new(),
            kind,
            label: kind.default_label().to_string(),
            params,
            inputs,
            outputs,
        }
    }

    /// Creates a new node with a specific ID.
    #[must_use]
    pub fn with_id(id: NodeId, kind: NodeKind, params: JsonValue) -> Self {
        let (inputs, outputs) = Self::default_ports(kind);
        Self {
            id,
            kind,
            label: kind.default_label().to_string(),
            params,
            inputs,
            outputs,
        }
    }

    /// Sets the label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Returns the input port with the given name, if any.
    #[must_use]
    pub fn input_port(&self, name: &str) -> Option<&InputPort> {
        self.inputs.iter().find(|p| p.name == name)
    }

    /// Returns the output port with the given name, if any.
    #[must_use]
    pub fn output_port(&self, name: &str) -> Option<&OutputPort> {
        self.outputs.iter().find(|p| p.name == name)
    }

    /// Returns the name of the first declared input port, if any.
    #[must_use]
    pub fn default_input(&self) -> Option<&str> {
        self.inputs.first().map(|p| p.name.as_str())
    }

    /// Returns the name of the first declared output port, if any.
    #[must_use]
    pub fn default_output(&self) -> Option<&str> {
        self.outputs.first().map(|p| p.name.as_str())
    }

    /// Returns true if this node declares more than one output port.
    #[must_use]
    pub fn is_multi_output(&self) -> bool {
        self.outputs.len() > 1
    }

    /// Generates the ports implied by a node kind.
    ///
    /// Entry kinds have no inputs; `Output` has no outputs. `Join` names
    /// its inputs `A`/`B`, `Split` its outputs `outputA`/`outputB`, and
    /// `Condition` its branches `true`/`false`.
    fn default_ports(kind: NodeKind) -> (Vec<InputPort>, Vec<OutputPort>) {
        match kind {
            NodeKind::Source | NodeKind::Schedule | NodeKind::Webhook => {
                (vec![], vec![OutputPort::new("output")])
            }
            NodeKind::Join => (
                vec![InputPort::required("A"), InputPort::required("B")],
                vec![OutputPort::new("output")],
            ),
            NodeKind::Split => (
                vec![InputPort::required("input")],
                vec![OutputPort::new("outputA"), OutputPort::new("outputB")],
            ),
            NodeKind::Condition => (
                vec![InputPort::required("input")],
                vec![OutputPort::new("true"), OutputPort::new("false")],
            ),
            NodeKind::Transform | NodeKind::Notification | NodeKind::Approval => (
                vec![InputPort::required("input")],
                vec![OutputPort::new("output")],
            ),
            NodeKind::Output => (vec![InputPort::required("input")], vec![]),
        }
    }
}
