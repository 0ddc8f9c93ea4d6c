//! Editing session facade.
//!
//! Ties one workflow definition to its transient resolved-data cache and
//! the configuration surface registry. Every mutation goes through here so
//! that cache invalidation always accompanies the graph change that made
//! the cached data stale.

use crate::edge::{Connection, ConnectionId, ConnectionRef};
use crate::error::{GraphError, SaveError};
use crate::definition::Workflow;
use crate::execution::WorkflowRun;
use crate::node::{Node, NodeId, NodeKind};
use crate::preview::{self, PreviewDirection, PreviewPage};
use crate::protocol::{self, EditableField, SurfaceContext, SurfaceRegistry};
use crate::resolver::ResolvedData;
use serde_json::Value as JsonValue;

/// An in-memory editing session over one workflow.
pub struct WorkflowEditor {
    workflow: Workflow,
    data: ResolvedData,
    registry: SurfaceRegistry,
}

impl WorkflowEditor {
    /// Opens an editing session with the default surface registry.
    #[must_use]
    pub fn new(workflow: Workflow) -> Self {
        Self::with_registry(workflow, SurfaceRegistry::with_defaults())
    }

    /// Opens an editing session with a caller-supplied registry.
    #[must_use]
    pub fn with_registry(workflow: Workflow, registry: SurfaceRegistry) -> Self {
        Self {
            workflow,
            data: ResolvedData::new(),
            registry,
        }
    }

    /// The definition being edited.
    #[must_use]
    pub fn workflow(&self) -> &Workflow {
        &self.workflow
    }

    /// The current resolved-data cache.
    #[must_use]
    pub fn resolved_data(&self) -> &ResolvedData {
        &self.data
    }

    /// Adds a node of the given kind with default ports.
    pub fn add_node(&mut self, kind: NodeKind, params: JsonValue) -> NodeId {
        let node_id = self.workflow.graph.add_node(Node::new(kind, params));
        self.workflow.touch();
        node_id
    }

    /// Removes a node, cascading to its connections.
    ///
    /// # Errors
    ///
    /// Returns `NodeNotFound` if the node does not exist.
    pub fn remove_node(&mut self, node_id: NodeId) -> Result<Node, GraphError> {
        // Invalidate while the node is still in the graph, so the
        // downstream walk can find its descendants.
        self.data.invalidate_from(&self.workflow.graph, node_id);
        let node = self
            .workflow
            .graph
            .remove_node(node_id)
            .ok_or(GraphError::NodeNotFound { node_id })?;
        self.workflow.touch();
        Ok(node)
    }

    /// Connects two nodes. Ports default to each node's first declared
    /// output and input.
    ///
    /// # Errors
    ///
    /// Propagates [`WorkflowGraph::connect`] errors; on error nothing
    /// changes, including the cache.
    ///
    /// [`WorkflowGraph::connect`]: crate::graph::WorkflowGraph::connect
    pub fn connect(
        &mut self,
        source_id: NodeId,
        target_id: NodeId,
        source_port: Option<&str>,
        target_port: Option<&str>,
    ) -> Result<ConnectionId, GraphError> {
        let source_port = source_port
            .or_else(|| self.default_output(source_id))
            .unwrap_or("output")
            .to_string();
        let target_port = target_port
            .or_else(|| self.default_input(target_id))
            .unwrap_or("input")
            .to_string();

        let connection_id = self.workflow.graph.connect(
            source_id,
            target_id,
            Connection::new(source_port, target_port),
        )?;
        // The target now sees different upstream data.
        self.data.invalidate_from(&self.workflow.graph, target_id);
        self.workflow.touch();
        Ok(connection_id)
    }

    /// Removes a connection by id.
    ///
    /// # Errors
    ///
    /// Returns `ConnectionNotFound` if no connection has the given id.
    pub fn disconnect(&mut self, connection_id: ConnectionId) -> Result<(), GraphError> {
        let target = self
            .workflow
            .graph
            .connection(connection_id)
            .map(|conn| conn.target_node)
            .ok_or(GraphError::ConnectionNotFound { connection_id })?;

        self.workflow.graph.disconnect(connection_id)?;
        self.data.invalidate_from(&self.workflow.graph, target);
        self.workflow.touch();
        Ok(())
    }

    /// All connections with their endpoints.
    #[must_use]
    pub fn connections(&self) -> Vec<ConnectionRef> {
        self.workflow.graph.connections()
    }

    /// Describes a node's configuration surface, with live suggestions
    /// from the current resolved data.
    ///
    /// # Errors
    ///
    /// Returns `NodeNotFound` if the node does not exist.
    pub fn open_surface(&self, node_id: NodeId) -> Result<Vec<EditableField>, GraphError> {
        let node = self
            .workflow
            .graph
            .get_node(node_id)
            .ok_or(GraphError::NodeNotFound { node_id })?;
        let ctx = SurfaceContext::new(&self.workflow.graph, &self.data);
        Ok(self
            .registry
            .surface(node.kind)
            .map(|surface| surface.fields(node, &ctx))
            .unwrap_or_default())
    }

    /// Saves a configuration delta for a node; see [`protocol::save`].
    ///
    /// # Errors
    ///
    /// Propagates the protocol's graph and validation errors; a blocked
    /// save changes nothing.
    pub fn save(
        &mut self,
        node_id: NodeId,
        delta: &JsonValue,
        label: Option<String>,
    ) -> Result<(), SaveError> {
        protocol::save(&mut self.workflow.graph, &self.registry, node_id, delta, label)?;
        // Reconfiguration changes what this node and everything after it
        // would produce.
        self.data.invalidate_from(&self.workflow.graph, node_id);
        self.workflow.touch();
        Ok(())
    }

    /// One page of the records flowing into or out of a node.
    #[must_use]
    pub fn preview(
        &self,
        node_id: NodeId,
        direction: PreviewDirection,
        page: usize,
        page_size: usize,
    ) -> PreviewPage {
        preview::preview(&self.workflow.graph, &self.data, node_id, direction, page, page_size)
    }

    /// Ingests a backend run's per-node results into the cache.
    pub fn apply_run(&mut self, run: &WorkflowRun) {
        self.data.apply_run(run);
    }

    /// Consumes the session, returning the definition for persistence.
    #[must_use]
    pub fn into_workflow(self) -> Workflow {
        self.workflow
    }

    fn default_output(&self, node_id: NodeId) -> Option<&str> {
        self.workflow.graph.get_node(node_id)?.default_output()
    }

    fn default_input(&self, node_id: NodeId) -> Option<&str> {
        self.workflow.graph.get_node(node_id)?.default_input()
    }
}
