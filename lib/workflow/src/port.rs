//! Port system for workflow nodes.
//!
//! Ports are named connection points on nodes. Most node kinds carry a
//! single default input and output; multi-port kinds (join, split,
//! condition) name theirs explicitly. Connections are validated against
//! port names at edit time.

use serde::{Deserialize, Serialize};

/// An input port on a workflow node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputPort {
    /// The name of this port.
    pub name: String,
    /// Whether this input must have an incoming connection for the
    /// workflow to validate.
    pub required: bool,
}

impl InputPort {
    /// Creates a new required input port.
    #[must_use]
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: true,
        }
    }

    /// Creates a new optional input port.
    #[must_use]
    pub fn optional(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: false,
        }
    }
}

/// An output port on a workflow node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputPort {
    /// The name of this port.
    pub name: String,
}

impl OutputPort {
    /// Creates a new output port.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_port_required() {
        let port = InputPort::required("A");
        assert!(port.required);
        assert_eq!(port.name, "A");
    }

    #[test]
    fn input_port_optional() {
        let port = InputPort::optional("input");
        assert!(!port.required);
        assert_eq!(port.name, "input");
    }

    #[test]
    fn port_serde_roundtrip() {
        let port = OutputPort::new("outputA");
        let json = serde_json::to_string(&port).expect("serialize");
        let parsed: OutputPort = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(port, parsed);
    }
}
