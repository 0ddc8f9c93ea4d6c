//! Execution boundary types.
//!
//! The core never runs nodes itself; a backend collaborator executes
//! workflows and the core observes results through this interface. Run
//! records carry the per-node record sets that feed the upstream data
//! resolver and the preview service.

use crate::error::BackendError;
use crate::node::NodeId;
use crate::record::RecordSet;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use millwright_core::{WorkflowId, WorkflowRunId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The overall state of a workflow run, as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionState {
    /// Run is queued, waiting for the backend to pick it up.
    Queued,
    /// Run is actively executing.
    Running,
    /// Run completed successfully.
    Completed,
    /// Run failed.
    Failed,
    /// Run was cancelled.
    Cancelled,
}

impl ExecutionState {
    /// Returns true if this is a terminal state.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

/// The outcome of a single node within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeRunStatus {
    /// Node produced its outputs.
    Completed,
    /// Node failed; its error is carried verbatim.
    Failed,
    /// Node was skipped (branch not taken).
    Skipped,
}

/// The result of one node within a run: its status and the record set it
/// produced on each output port.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRunResult {
    /// Outcome of the node.
    pub status: NodeRunStatus,
    /// Produced records, one bucket per output port.
    pub outputs: HashMap<String, RecordSet>,
    /// Error message, if the node failed. Surfaced as-is, never
    /// reinterpreted by the core.
    pub error: Option<String>,
}

impl NodeRunResult {
    /// Creates a completed result with a single default output bucket.
    #[must_use]
    pub fn completed(port: impl Into<String>, records: RecordSet) -> Self {
        Self {
            status: NodeRunStatus::Completed,
            outputs: HashMap::from([(port.into(), records)]),
            error: None,
        }
    }

    /// Creates a failed result.
    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: NodeRunStatus::Failed,
            outputs: HashMap::new(),
            error: Some(error.into()),
        }
    }
}

/// A record of a single workflow run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowRun {
    /// Unique identifier for this run.
    pub id: WorkflowRunId,
    /// The workflow that was executed.
    pub workflow_id: WorkflowId,
    /// Current execution state.
    pub state: ExecutionState,
    /// When the run was queued.
    pub queued_at: DateTime<Utc>,
    /// When the run started executing.
    pub started_at: Option<DateTime<Utc>>,
    /// When the run finished.
    pub finished_at: Option<DateTime<Utc>>,
    /// Error message if the run failed.
    pub error: Option<String>,
    /// Per-node results for this run.
    pub node_results: HashMap<NodeId, NodeRunResult>,
}

impl WorkflowRun {
    /// Creates a new run record in queued state.
    #[must_use]
    pub fn new(workflow_id: WorkflowId) -> Self {
        Self {
            id: WorkflowRunId::new(),
            workflow_id,
            state: ExecutionState::Queued,
            queued_at: Utc::now(),
            started_at: None,
            finished_at: None,
            error: None,
            node_results: HashMap::new(),
        }
    }

    /// Marks the run as started.
    pub fn start(&mut self) {
        self.state = ExecutionState::Running;
        self.started_at = Some(Utc::now());
    }

    /// Marks the run as completed.
    pub fn complete(&mut self) {
        self.state = ExecutionState::Completed;
        self.finished_at = Some(Utc::now());
    }

    /// Marks the run as failed.
    pub fn fail(&mut self, error: impl Into<String>) {
        self.state = ExecutionState::Failed;
        self.finished_at = Some(Utc::now());
        self.error = Some(error.into());
    }

    /// Records the result for a node.
    pub fn record_node_result(&mut self, node_id: NodeId, result: NodeRunResult) {
        self.node_results.insert(node_id, result);
    }

    /// Returns the duration of the run, if it has started.
    #[must_use]
    pub fn duration(&self) -> Option<chrono::Duration> {
        let start = self.started_at?;
        let end = self.finished_at.unwrap_or_else(Utc::now);
        Some(end - start)
    }
}

/// The execution backend collaborator.
///
/// `run` starts a workflow and returns immediately; progress is observed
/// by polling `execution_history`. Timeouts, retries and cancellation are
/// the backend's contract, not this core's.
#[async_trait]
pub trait ExecutionBackend: Send + Sync {
    /// Starts a run of the given workflow.
    async fn run(&self, workflow_id: WorkflowId) -> Result<WorkflowRunId, BackendError>;

    /// Returns the run history for a workflow, ordered by queue time
    /// ascending.
    async fn execution_history(
        &self,
        workflow_id: WorkflowId,
    ) -> Result<Vec<WorkflowRun>, BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn execution_state_terminal() {
        assert!(!ExecutionState::Queued.is_terminal());
        assert!(!ExecutionState::Running.is_terminal());
        assert!(ExecutionState::Completed.is_terminal());
        assert!(ExecutionState::Failed.is_terminal());
        assert!(ExecutionState::Cancelled.is_terminal());
    }

    #[test]
    fn run_lifecycle() {
        let workflow_id = WorkflowId::new();
        let mut run = WorkflowRun::new(workflow_id);
        assert_eq!(run.state, ExecutionState::Queued);

        run.start();
        assert_eq!(run.state, ExecutionState::Running);
        assert!(run.started_at.is_some());

        run.complete();
        assert_eq!(run.state, ExecutionState::Completed);
        assert!(run.finished_at.is_some());
        assert!(run.duration().is_some());
    }

    #[test]
    fn failed_run_carries_error_verbatim() {
        let mut run = WorkflowRun::new(WorkflowId::new());
        run.start();
        run.fail("press-2 sensor feed timed out");
        assert_eq!(run.state, ExecutionState::Failed);
        assert_eq!(run.error.as_deref(), Some("press-2 sensor feed timed out"));
    }

    #[test]
    fn run_serde_roundtrip_with_node_results() {
        let mut run = WorkflowRun::new(WorkflowId::new());
        let node_id = NodeId::new();
        run.record_node_result(
            node_id,
            NodeRunResult::completed(
                "output",
                RecordSet::from_records(vec![json!({"id": 1})]),
            ),
        );

        let json = serde_json::to_string(&run).expect("serialize");
        let parsed: WorkflowRun = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(run, parsed);
        assert_eq!(
            parsed.node_results[&node_id].outputs["output"].len(),
            1
        );
    }
}
