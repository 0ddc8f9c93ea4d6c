//! Workflow graph and node-configuration core for the millwright platform.
//!
//! This crate provides the editing-time core of the workflow builder:
//!
//! - **Graph Store**: Directed acyclic graphs using petgraph with typed
//!   nodes and port-qualified connections
//! - **Node Kinds**: Source, Join, Split, Condition, Transform,
//!   Notification, Approval, Schedule, Webhook, Output
//! - **Upstream Resolution**: Lane-exact resolved-data cache with
//!   passthrough synthesis and downstream invalidation
//! - **Configuration Protocol**: Per-kind editable surfaces behind one
//!   uniform save operation
//! - **Preview**: Paginated, columnar inspection of any node's records
//! - **Boundaries**: Async traits for persistence and the execution
//!   backend

pub mod definition;
pub mod edge;
pub mod editor;
pub mod error;
pub mod execution;
pub mod graph;
pub mod inference;
pub mod join;
pub mod node;
pub mod port;
pub mod preview;
pub mod protocol;
pub mod record;
pub mod resolver;
pub mod storage;

pub use definition::{Workflow, WorkflowMetadata, WorkflowSummary};
pub use edge::{Connection, ConnectionId, ConnectionRef};
pub use editor::WorkflowEditor;
pub use error::{BackendError, FieldError, GraphError, SaveError, StoreError};
pub use execution::{ExecutionBackend, ExecutionState, NodeRunResult, NodeRunStatus, WorkflowRun};
pub use graph::WorkflowGraph;
pub use join::{JoinStrategy, JoinType};
pub use node::{Node, NodeId, NodeKind};
pub use port::{InputPort, OutputPort};
pub use preview::{PreviewDirection, PreviewPage};
pub use protocol::{ConfigSurface, EditableField, FieldKind, SurfaceContext, SurfaceRegistry};
pub use record::RecordSet;
pub use resolver::ResolvedData;
pub use storage::{InMemoryStore, WorkflowStore};
