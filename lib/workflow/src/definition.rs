//! Persistent workflow definitions.
//!
//! A definition is the unit of storage: identity, metadata, and the graph.
//! Resolved data never travels with it; the cache is rebuilt from backend
//! runs after a load.

use crate::error::GraphError;
use crate::graph::WorkflowGraph;
use chrono::{DateTime, Utc};
use millwright_core::WorkflowId;
use serde::{Deserialize, Serialize};

/// Descriptive metadata attached to a workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowMetadata {
    /// Human-readable name.
    pub name: String,
    /// Optional longer description.
    pub description: Option<String>,
    /// Monotonic version, bumped on every save.
    pub version: u64,
    /// Whether the workflow is eligible for execution.
    pub enabled: bool,
    /// Free-form tags for filtering in listings.
    pub tags: Vec<String>,
    /// When the workflow was created.
    pub created_at: DateTime<Utc>,
    /// When the workflow was last modified.
    pub updated_at: DateTime<Utc>,
}

impl WorkflowMetadata {
    /// Creates metadata for a new, disabled workflow.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            description: None,
            version: 1,
            enabled: false,
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the tags.
    #[must_use]
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }
}

/// A complete workflow definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    /// Unique identifier.
    pub id: WorkflowId,
    /// Descriptive metadata.
    pub metadata: WorkflowMetadata,
    /// The node/connection graph.
    pub graph: WorkflowGraph,
}

impl Workflow {
    /// Creates an empty workflow with a fresh id.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(WorkflowId::new(), name)
    }

    /// Creates an empty workflow with a caller-supplied id.
    #[must_use]
    pub fn with_id(id: WorkflowId, name: impl Into<String>) -> Self {
        Self {
            id,
            metadata: WorkflowMetadata::new(name),
            graph: WorkflowGraph::new(),
        }
    }

    /// The workflow's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// Whether the workflow is eligible for execution.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.metadata.enabled
    }

    /// Enables execution. Fails if the graph is not runnable.
    ///
    /// # Errors
    ///
    /// Propagates the first structural problem [`WorkflowGraph::validate`]
    /// finds.
    pub fn enable(&mut self) -> Result<(), GraphError> {
        self.graph.validate()?;
        self.metadata.enabled = true;
        self.touch();
        Ok(())
    }

    /// Disables execution.
    pub fn disable(&mut self) {
        self.metadata.enabled = false;
        self.touch();
    }

    /// Checks that the graph is structurally runnable.
    ///
    /// # Errors
    ///
    /// Returns the first structural problem found.
    pub fn validate(&self) -> Result<(), GraphError> {
        self.graph.validate()
    }

    /// Bumps the version and update timestamp after a mutation.
    pub fn touch(&mut self) {
        self.metadata.version += 1;
        self.metadata.updated_at = Utc::now();
    }
}

/// A listing row: metadata without the graph payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowSummary {
    /// Unique identifier.
    pub id: WorkflowId,
    /// Human-readable name.
    pub name: String,
    /// Whether the workflow is eligible for execution.
    pub enabled: bool,
    /// Number of nodes in the graph.
    pub node_count: usize,
    /// When the workflow was last modified.
    pub updated_at: DateTime<Utc>,
}

impl From<&Workflow> for WorkflowSummary {
    fn from(workflow: &Workflow) -> Self {
        Self {
            id: workflow.id,
            name: workflow.metadata.name.clone(),
            enabled: workflow.metadata.enabled,
            node_count: workflow.graph.node_count(),
            updated_at: workflow.metadata.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::Connection;
    use crate::node::{Node, NodeKind};
    use serde_json::json;

    #[test]
    fn new_workflow_starts_disabled_at_version_one() {
        let workflow = Workflow::new("Scrap rate alerting");
        assert_eq!(workflow.name(), "Scrap rate alerting");
        assert!(!workflow.is_enabled());
        assert_eq!(workflow.metadata.version, 1);
        assert_eq!(workflow.graph.node_count(), 0);
    }

    #[test]
    fn enable_requires_a_runnable_graph() {
        let mut workflow = Workflow::new("incomplete");
        let join = workflow
            .graph
            .add_node(Node::new(NodeKind::Join, json!({})));
        let source = workflow
            .graph
            .add_node(Node::new(NodeKind::Source, json!({})));
        workflow
            .graph
            .connect(source, join, Connection::new("output", "A"))
            .unwrap();

        // Join's B input is required but unconnected.
        assert!(workflow.enable().is_err());
        assert!(!workflow.is_enabled());

        let s2 = workflow
            .graph
            .add_node(Node::new(NodeKind::Source, json!({})));
        workflow
            .graph
            .connect(s2, join, Connection::new("output", "B"))
            .unwrap();

        workflow.enable().expect("runnable graph");
        assert!(workflow.is_enabled());
    }

    #[test]
    fn touch_bumps_version_and_timestamp() {
        let mut workflow = Workflow::new("w");
        let before = workflow.metadata.updated_at;
        workflow.touch();
        assert_eq!(workflow.metadata.version, 2);
        assert!(workflow.metadata.updated_at >= before);
    }

    #[test]
    fn definition_serde_roundtrip() {
        let mut workflow = Workflow::new("Work order enrichment");
        workflow.metadata = workflow
            .metadata
            .clone()
            .with_description("joins orders with machine assignments")
            .with_tags(vec!["orders".to_string()]);

        let source = workflow
            .graph
            .add_node(Node::new(NodeKind::Source, json!({"dataset": "orders"})));
        let out = workflow
            .graph
            .add_node(Node::new(NodeKind::Output, json!({})));
        workflow
            .graph
            .connect(source, out, Connection::default_ports())
            .unwrap();

        let json = serde_json::to_string(&workflow).expect("serialize");
        let parsed: Workflow = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed, workflow);
        assert_eq!(parsed.graph.connection_count(), 1);
    }

    #[test]
    fn summary_reflects_definition() {
        let mut workflow = Workflow::new("w");
        workflow
            .graph
            .add_node(Node::new(NodeKind::Source, json!({})));

        let summary = WorkflowSummary::from(&workflow);
        assert_eq!(summary.id, workflow.id);
        assert_eq!(summary.node_count, 1);
        assert!(!summary.enabled);
    }
}
