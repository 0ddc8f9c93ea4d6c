//! Workflow graph store.
//!
//! The single source of truth for one workflow's nodes and connections,
//! built on petgraph's directed graph. All mutations are total: they
//! either succeed or fail with a typed [`GraphError`] leaving the graph
//! unchanged. The graph is kept acyclic at edit time so the upstream
//! resolver's backward walk always terminates.

use crate::edge::{Connection, ConnectionId, ConnectionRef};
use crate::error::GraphError;
use crate::node::{Node, NodeId};
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::{HashMap, VecDeque};

/// A workflow graph using petgraph's directed graph.
#[derive(Debug, Clone, Default)]
pub struct WorkflowGraph {
    /// The underlying directed graph.
    graph: DiGraph<Node, Connection>,
    /// Map from NodeId to petgraph's NodeIndex for O(1) lookup.
    node_index_map: HashMap<NodeId, NodeIndex>,
}

impl WorkflowGraph {
    /// Creates a new empty workflow graph.
    #[must_use]
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            node_index_map: HashMap::new(),
        }
    }

    /// Adds a node to the graph.
    ///
    /// Returns the node ID.
    pub fn add_node(&mut self, node: Node) -> NodeId {
        let node_id = node.id;
        tracing::debug!(%node_id, kind = %node.kind, "adding node");
        let index = self.graph.add_node(node);
        self.node_index_map.insert(node_id, index);
        node_id
    }

    /// Removes a node from the graph.
    ///
    /// Cascades: all connections into or out of the node are removed
    /// with it.
    pub fn remove_node(&mut self, node_id: NodeId) -> Option<Node> {
        let index = self.node_index_map.remove(&node_id)?;
        tracing::debug!(%node_id, "removing node");
        let node = self.graph.remove_node(index);
        // petgraph swaps the last node into the removed slot, so the
        // remaining indices cannot be trusted.
        self.rebuild_index_map();
        node
    }

    /// Returns a reference to a node by its ID.
    #[must_use]
    pub fn get_node(&self, node_id: NodeId) -> Option<&Node> {
        let index = self.node_index_map.get(&node_id)?;
        self.graph.node_weight(*index)
    }

    /// Connects a source node's output port to a target node's input port.
    ///
    /// # Errors
    ///
    /// - `NodeNotFound` if either endpoint does not exist
    /// - `SourcePortNotFound` / `TargetPortNotFound` if a port name is not
    ///   valid for the node's kind
    /// - `DuplicateInputPort` if the target input port already has an
    ///   incoming connection
    /// - `CycleDetected` if the connection would close a cycle
    ///
    /// On any error the graph is left exactly as it was.
    pub fn connect(
        &mut self,
        source_id: NodeId,
        target_id: NodeId,
        connection: Connection,
    ) -> Result<ConnectionId, GraphError> {
        let source_index = *self
            .node_index_map
            .get(&source_id)
            .ok_or(GraphError::NodeNotFound { node_id: source_id })?;
        let target_index = *self
            .node_index_map
            .get(&target_id)
            .ok_or(GraphError::NodeNotFound { node_id: target_id })?;

        let source_node = &self.graph[source_index];
        let target_node = &self.graph[target_index];

        if source_node.output_port(&connection.source_port).is_none() {
            return Err(GraphError::SourcePortNotFound {
                node_id: source_id,
                port_name: connection.source_port.clone(),
            });
        }
        if target_node.input_port(&connection.target_port).is_none() {
            return Err(GraphError::TargetPortNotFound {
                node_id: target_id,
                port_name: connection.target_port.clone(),
            });
        }

        // At most one producer per (target, input port) pair, rejected at
        // edit time rather than surfacing as an ambiguous read later.
        let occupied = self
            .graph
            .edges_directed(target_index, Direction::Incoming)
            .any(|edge| edge.weight().target_port == connection.target_port);
        if occupied {
            return Err(GraphError::DuplicateInputPort {
                node_id: target_id,
                port_name: connection.target_port.clone(),
            });
        }

        // A path from target back to source means the new edge closes a
        // cycle. Also covers self-loops.
        if petgraph::algo::has_path_connecting(&self.graph, target_index, source_index, None) {
            return Err(GraphError::CycleDetected);
        }

        let connection_id = connection.id;
        tracing::debug!(
            %connection_id,
            source = %source_id,
            target = %target_id,
            "adding connection"
        );
        self.graph.add_edge(source_index, target_index, connection);
        Ok(connection_id)
    }

    /// Removes a connection by its ID, returning it.
    ///
    /// # Errors
    ///
    /// Returns `ConnectionNotFound` if no connection has the given ID.
    pub fn disconnect(&mut self, connection_id: ConnectionId) -> Result<Connection, GraphError> {
        let edge_index = self
            .graph
            .edge_references()
            .find(|edge| edge.weight().id == connection_id)
            .map(|edge| edge.id())
            .ok_or(GraphError::ConnectionNotFound { connection_id })?;

        tracing::debug!(%connection_id, "removing connection");
        self.graph
            .remove_edge(edge_index)
            .ok_or(GraphError::ConnectionNotFound { connection_id })
    }

    /// Merges a configuration delta into a node's params and optionally
    /// updates its label.
    ///
    /// The merge is shallow at the top level: each key of `delta` replaces
    /// the same-named key in the node's existing params. The graph layer
    /// does not interpret the payload beyond that.
    ///
    /// # Errors
    ///
    /// Returns `NodeNotFound` if the node does not exist.
    pub fn update_node_params(
        &mut self,
        node_id: NodeId,
        delta: &JsonValue,
        label: Option<String>,
    ) -> Result<(), GraphError> {
        let index = *self
            .node_index_map
            .get(&node_id)
            .ok_or(GraphError::NodeNotFound { node_id })?;
        let node = &mut self.graph[index];

        match (node.params.as_object_mut(), delta.as_object()) {
            (Some(params), Some(delta)) => {
                for (key, value) in delta {
                    params.insert(key.clone(), value.clone());
                }
            }
            // A non-object payload has no keys to merge into; take the
            // delta wholesale.
            _ => node.params = delta.clone(),
        }

        if let Some(label) = label {
            node.label = label;
        }
        tracing::debug!(%node_id, "updated node params");
        Ok(())
    }

    /// Returns all nodes in the graph.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.graph.node_weights()
    }

    /// Returns all connections with their node endpoints.
    #[must_use]
    pub fn connections(&self) -> Vec<ConnectionRef> {
        self.graph
            .edge_references()
            .filter_map(|edge| self.to_connection_ref(edge))
            .collect()
    }

    /// Returns a connection reference by its ID.
    #[must_use]
    pub fn connection(&self, connection_id: ConnectionId) -> Option<ConnectionRef> {
        self.graph
            .edge_references()
            .find(|edge| edge.weight().id == connection_id)
            .and_then(|edge| self.to_connection_ref(edge))
    }

    /// Returns the number of nodes in the graph.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns the number of connections in the graph.
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Returns nodes that have no incoming connections (entry points).
    pub fn entry_nodes(&self) -> Vec<&Node> {
        self.graph
            .node_indices()
            .filter(|&idx| {
                self.graph
                    .edges_directed(idx, Direction::Incoming)
                    .count()
                    == 0
            })
            .filter_map(|idx| self.graph.node_weight(idx))
            .collect()
    }

    /// Returns the predecessors (upstream nodes) of a given node with the
    /// connections that reach it.
    pub fn predecessors(&self, node_id: NodeId) -> Vec<(&Node, &Connection)> {
        let Some(&index) = self.node_index_map.get(&node_id) else {
            return Vec::new();
        };
        self.graph
            .edges_directed(index, Direction::Incoming)
            .filter_map(|edge| {
                let source = self.graph.node_weight(edge.source())?;
                Some((source, edge.weight()))
            })
            .collect()
    }

    /// Returns the successors (downstream nodes) of a given node.
    pub fn successors(&self, node_id: NodeId) -> Vec<(&Node, &Connection)> {
        let Some(&index) = self.node_index_map.get(&node_id) else {
            return Vec::new();
        };
        self.graph
            .edges_directed(index, Direction::Outgoing)
            .filter_map(|edge| {
                let target = self.graph.node_weight(edge.target())?;
                Some((target, edge.weight()))
            })
            .collect()
    }

    /// Returns the connection feeding a given input port, with its
    /// producer node.
    #[must_use]
    pub fn incoming(&self, node_id: NodeId, input_port: &str) -> Option<(&Node, &Connection)> {
        self.predecessors(node_id)
            .into_iter()
            .find(|(_, conn)| conn.target_port == input_port)
    }

    /// Returns the node and every node downstream of it, breadth-first.
    ///
    /// Used to invalidate resolved data when the definition changes.
    #[must_use]
    pub fn with_descendants(&self, node_id: NodeId) -> Vec<NodeId> {
        let Some(&start) = self.node_index_map.get(&node_id) else {
            return Vec::new();
        };
        let mut seen = vec![node_id];
        let mut queue = VecDeque::from([start]);
        while let Some(index) = queue.pop_front() {
            for edge in self.graph.edges_directed(index, Direction::Outgoing) {
                let target = edge.target();
                if let Some(node) = self.graph.node_weight(target)
                    && !seen.contains(&node.id)
                {
                    seen.push(node.id);
                    queue.push_back(target);
                }
            }
        }
        seen
    }

    /// Validates the workflow graph.
    ///
    /// Checks that every required input port has an incoming connection
    /// and that the graph is acyclic. `connect` maintains acyclicity, so
    /// the cycle check only fires on graphs built outside this store.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first validation failure.
    pub fn validate(&self) -> Result<(), GraphError> {
        for node in self.nodes() {
            for input in &node.inputs {
                if input.required && self.incoming(node.id, &input.name).is_none() {
                    return Err(GraphError::RequiredInputMissing {
                        node_id: node.id,
                        port_name: input.name.clone(),
                    });
                }
            }
        }

        if petgraph::algo::is_cyclic_directed(&self.graph) {
            return Err(GraphError::CycleDetected);
        }

        Ok(())
    }

    fn to_connection_ref(
        &self,
        edge: petgraph::graph::EdgeReference<'_, Connection>,
    ) -> Option<ConnectionRef> {
        let source = self.graph.node_weight(edge.source())?;
        let target = self.graph.node_weight(edge.target())?;
        let weight = edge.weight();
        Some(ConnectionRef {
            id: weight.id,
            source_node: source.id,
            source_port: weight.source_port.clone(),
            target_node: target.id,
            target_port: weight.target_port.clone(),
        })
    }

    fn rebuild_index_map(&mut self) {
        self.node_index_map.clear();
        for index in self.graph.node_indices() {
            if let Some(node) = self.graph.node_weight(index) {
                self.node_index_map.insert(node.id, index);
            }
        }
    }

    fn from_repr(repr: GraphRepr) -> Self {
        let mut graph = Self::new();
        for node in repr.nodes {
            graph.add_node(node);
        }
        for conn in repr.connections {
            let connection = Connection {
                id: conn.id,
                source_port: conn.source_port,
                target_port: conn.target_port,
            };
            // Loaded connections pass the same checks as live edits, so a
            // payload edited out-of-band cannot smuggle in a cycle, an
            // occupied input port, or an unknown port name. Offenders are
            // dropped rather than failing the whole load.
            if let Err(err) = graph.connect(conn.source_node, conn.target_node, connection) {
                tracing::warn!(connection_id = %conn.id, %err, "dropping invalid connection");
            }
        }
        graph
    }
}

/// Structural equality: same nodes and same connections, independent of
/// petgraph's internal indices or insertion order.
impl PartialEq for WorkflowGraph {
    fn eq(&self, other: &Self) -> bool {
        self.node_count() == other.node_count()
            && self.connection_count() == other.connection_count()
            && self
                .nodes()
                .all(|node| other.get_node(node.id) == Some(node))
            && self
                .connections()
                .iter()
                .all(|conn| other.connection(conn.id).as_ref() == Some(conn))
    }
}

/// The persisted shape of a graph: nodes plus port-qualified connections.
///
/// Index-independent so the round-trip is lossless regardless of petgraph's
/// internal numbering.
#[derive(Serialize, Deserialize)]
struct GraphRepr {
    nodes: Vec<Node>,
    connections: Vec<ConnectionRef>,
}

impl Serialize for WorkflowGraph {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let repr = GraphRepr {
            nodes: self.nodes().cloned().collect(),
            connections: self.connections(),
        };
        repr.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for WorkflowGraph {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let repr = GraphRepr::deserialize(deserializer)?;
        Ok(Self::from_repr(repr))
    }
}
