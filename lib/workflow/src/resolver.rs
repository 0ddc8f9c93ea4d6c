//! Upstream data resolution.
//!
//! The resolver answers "what records arrive at this node's input port"
//! by walking connections backward over the graph. It never computes a
//! transform itself: it surfaces the last data a backend run produced,
//! falling back to passthrough synthesis for producers that have not run,
//! and to an empty set when nothing upstream has ever produced data.
//! "No data yet" is a normal, displayable state, never an error.
//!
//! Resolution is a pure read over the graph and the cache; it can be
//! repeated freely.

use crate::execution::{NodeRunStatus, WorkflowRun};
use crate::graph::WorkflowGraph;
use crate::node::NodeId;
use crate::record::RecordSet;
use std::collections::HashMap;

/// The last backend-produced record sets, one bucket per node output port.
///
/// This cache is transient: it is not part of the persisted workflow
/// definition, and it is invalidated (not recomputed) whenever the
/// definition changes upstream of a node.
#[derive(Debug, Clone, Default)]
pub struct ResolvedData {
    buckets: HashMap<(NodeId, String), RecordSet>,
}

impl ResolvedData {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buckets: HashMap::new(),
        }
    }

    /// Stores the records a node produced on one of its output ports.
    pub fn record_output(&mut self, node_id: NodeId, port: impl Into<String>, records: RecordSet) {
        self.buckets.insert((node_id, port.into()), records);
    }

    /// Returns the cached records for a node's output port, if any.
    ///
    /// The lookup is lane-exact: a multi-output producer only ever
    /// contributes the record set cached against the requested port.
    #[must_use]
    pub fn output(&self, node_id: NodeId, port: &str) -> Option<&RecordSet> {
        self.buckets.get(&(node_id, port.to_string()))
    }

    /// Drops every bucket belonging to a node.
    pub fn invalidate(&mut self, node_id: NodeId) {
        self.buckets.retain(|(id, _), _| *id != node_id);
    }

    /// Drops the buckets of a node and everything downstream of it.
    ///
    /// Called on every graph mutation that changes what the affected
    /// nodes would receive; the data is recomputed lazily on the next
    /// resolve.
    pub fn invalidate_from(&mut self, graph: &WorkflowGraph, node_id: NodeId) {
        for affected in graph.with_descendants(node_id) {
            self.invalidate(affected);
        }
    }

    /// Drops all buckets.
    pub fn clear(&mut self) {
        self.buckets.clear();
    }

    /// Ingests a backend run's per-node results.
    ///
    /// Failed and skipped nodes contribute nothing; their stale buckets
    /// (if any) are dropped so a later resolve does not surface data from
    /// an older run as if it were current.
    pub fn apply_run(&mut self, run: &WorkflowRun) {
        tracing::debug!(run_id = %run.id, nodes = run.node_results.len(), "applying run results");
        for (node_id, result) in &run.node_results {
            match result.status {
                NodeRunStatus::Completed => {
                    for (port, records) in &result.outputs {
                        self.record_output(*node_id, port.clone(), records.clone());
                    }
                }
                NodeRunStatus::Failed | NodeRunStatus::Skipped => {
                    self.invalidate(*node_id);
                }
            }
        }
    }
}

/// Resolves the records arriving at a node's input port.
///
/// `input_port` defaults to the node's first declared input. Walks the
/// incoming connection to the producer and reads its output for the
/// connection's exact output port; see [`resolve_output`] for the
/// fallback behavior when the producer has no cached data.
#[must_use]
pub fn resolve_input(
    graph: &WorkflowGraph,
    data: &ResolvedData,
    node_id: NodeId,
    input_port: Option<&str>,
) -> RecordSet {
    let Some(node) = graph.get_node(node_id) else {
        return RecordSet::new();
    };
    let Some(port) = input_port.or_else(|| node.default_input()) else {
        // Entry nodes have no inputs.
        return RecordSet::new();
    };
    let Some((producer, connection)) = graph.incoming(node_id, port) else {
        return RecordSet::new();
    };
    resolve_output(graph, data, producer.id, Some(&connection.source_port))
}

/// Resolves the records a node last produced on an output port.
///
/// Prefers the cached backend output for that exact port. When no cached
/// data exists (the workflow has not run since the last upstream change),
/// the producer is synthesized as a passthrough of its own first input,
/// recursively; an entry node without data resolves to an empty set.
#[must_use]
pub fn resolve_output(
    graph: &WorkflowGraph,
    data: &ResolvedData,
    node_id: NodeId,
    output_port: Option<&str>,
) -> RecordSet {
    let Some(node) = graph.get_node(node_id) else {
        return RecordSet::new();
    };
    let Some(port) = output_port.or_else(|| node.default_output()) else {
        return RecordSet::new();
    };
    if let Some(records) = data.output(node_id, port) {
        return records.clone();
    }
    // Passthrough synthesis: the graph is a DAG, so this terminates at an
    // entry node.
    resolve_input(graph, data, node_id, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::Connection;
    use crate::execution::NodeRunResult;
    use crate::node::{Node, NodeKind};
    use millwright_core::WorkflowId;
    use serde_json::json;

    fn records(values: Vec<serde_json::Value>) -> RecordSet {
        RecordSet::from_records(values)
    }

    #[test]
    fn no_producer_resolves_to_empty_set() {
        let mut graph = WorkflowGraph::new();
        let out = graph.add_node(Node::new(NodeKind::Output, json!({})));
        let data = ResolvedData::new();

        let resolved = resolve_input(&graph, &data, out, None);
        assert!(resolved.is_empty());
    }

    #[test]
    fn resolves_producer_output_for_default_port() {
        let mut graph = WorkflowGraph::new();
        let source = graph.add_node(Node::new(NodeKind::Source, json!({})));
        let out = graph.add_node(Node::new(NodeKind::Output, json!({})));
        graph.connect(source, out, Connection::default_ports()).unwrap();

        let mut data = ResolvedData::new();
        data.record_output(source, "output", records(vec![json!({"id": 1})]));

        let resolved = resolve_input(&graph, &data, out, None);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved.records()[0], json!({"id": 1}));
    }

    #[test]
    fn multi_output_producer_contributes_exact_lane_only() {
        let mut graph = WorkflowGraph::new();
        let source = graph.add_node(Node::new(NodeKind::Source, json!({})));
        let split = graph.add_node(Node::new(NodeKind::Split, json!({})));
        let out_a = graph.add_node(Node::new(NodeKind::Output, json!({})));
        let out_b = graph.add_node(Node::new(NodeKind::Output, json!({})));

        graph.connect(source, split, Connection::new("output", "input")).unwrap();
        graph.connect(split, out_a, Connection::new("outputA", "input")).unwrap();
        graph.connect(split, out_b, Connection::new("outputB", "input")).unwrap();

        let mut data = ResolvedData::new();
        data.record_output(split, "outputA", records(vec![json!({"lane": "a"})]));
        data.record_output(split, "outputB", records(vec![json!({"lane": "b"})]));

        let a = resolve_input(&graph, &data, out_a, None);
        let b = resolve_input(&graph, &data, out_b, None);
        assert_eq!(a.records()[0]["lane"], "a");
        assert_eq!(b.records()[0]["lane"], "b");
    }

    #[test]
    fn stale_producer_synthesizes_passthrough() {
        // source -> transform -> output; only the source has run.
        let mut graph = WorkflowGraph::new();
        let source = graph.add_node(Node::new(NodeKind::Source, json!({})));
        let transform = graph.add_node(Node::new(NodeKind::Transform, json!({})));
        let out = graph.add_node(Node::new(NodeKind::Output, json!({})));
        graph.connect(source, transform, Connection::default_ports()).unwrap();
        graph.connect(transform, out, Connection::default_ports()).unwrap();

        let mut data = ResolvedData::new();
        data.record_output(source, "output", records(vec![json!({"id": 7})]));

        let resolved = resolve_input(&graph, &data, out, None);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved.records()[0]["id"], 7);
    }

    #[test]
    fn never_executed_workflow_resolves_to_empty() {
        let mut graph = WorkflowGraph::new();
        let source = graph.add_node(Node::new(NodeKind::Source, json!({})));
        let out = graph.add_node(Node::new(NodeKind::Output, json!({})));
        graph.connect(source, out, Connection::default_ports()).unwrap();

        let data = ResolvedData::new();
        let resolved = resolve_input(&graph, &data, out, None);
        assert!(resolved.is_empty());
    }

    #[test]
    fn join_ports_resolve_independently() {
        let mut graph = WorkflowGraph::new();
        let s1 = graph.add_node(Node::new(NodeKind::Source, json!({})));
        let s2 = graph.add_node(Node::new(NodeKind::Source, json!({})));
        let join = graph.add_node(Node::new(NodeKind::Join, json!({})));
        graph.connect(s1, join, Connection::new("output", "A")).unwrap();
        graph.connect(s2, join, Connection::new("output", "B")).unwrap();

        let mut data = ResolvedData::new();
        data.record_output(s1, "output", records(vec![json!({"id": 1, "amount": 10})]));
        data.record_output(s2, "output", records(vec![json!({"id": 1, "region": "n"})]));

        let a = resolve_input(&graph, &data, join, Some("A"));
        let b = resolve_input(&graph, &data, join, Some("B"));
        assert_eq!(a.records()[0]["amount"], 10);
        assert_eq!(b.records()[0]["region"], "n");
    }

    #[test]
    fn invalidate_from_clears_node_and_descendants() {
        let mut graph = WorkflowGraph::new();
        let source = graph.add_node(Node::new(NodeKind::Source, json!({})));
        let transform = graph.add_node(Node::new(NodeKind::Transform, json!({})));
        let out = graph.add_node(Node::new(NodeKind::Output, json!({})));
        graph.connect(source, transform, Connection::default_ports()).unwrap();
        graph.connect(transform, out, Connection::default_ports()).unwrap();

        let mut data = ResolvedData::new();
        data.record_output(source, "output", records(vec![json!({"id": 1})]));
        data.record_output(transform, "output", records(vec![json!({"id": 1, "x": 2})]));

        data.invalidate_from(&graph, transform);

        assert!(data.output(transform, "output").is_none());
        // Upstream data survives.
        assert!(data.output(source, "output").is_some());
        // Resolution falls back to passthrough of the surviving source data.
        let resolved = resolve_input(&graph, &data, out, None);
        assert_eq!(resolved.records()[0]["id"], 1);
    }

    #[test]
    fn apply_run_ingests_completed_and_drops_failed() {
        let mut graph = WorkflowGraph::new();
        let source = graph.add_node(Node::new(NodeKind::Source, json!({})));
        let transform = graph.add_node(Node::new(NodeKind::Transform, json!({})));
        graph.connect(source, transform, Connection::default_ports()).unwrap();

        let mut data = ResolvedData::new();
        data.record_output(transform, "output", records(vec![json!({"old": true})]));

        let mut run = WorkflowRun::new(WorkflowId::new());
        run.record_node_result(
            source,
            NodeRunResult::completed("output", records(vec![json!({"id": 1})])),
        );
        run.record_node_result(transform, NodeRunResult::failed("transform panicked"));

        data.apply_run(&run);

        assert!(data.output(source, "output").is_some());
        // The failed node's stale bucket is gone, not served as current.
        assert!(data.output(transform, "output").is_none());
    }
}
