//! Preview/inspection of resolved node data.
//!
//! A paginated, columnar projection of the records arriving at or leaving
//! any node, independent of its kind. Columns come from the same field
//! inference the configuration surfaces use, so preview and configuration
//! never disagree about what fields exist. Purely a read: nothing here
//! mutates graph state.

use crate::graph::WorkflowGraph;
use crate::inference;
use crate::node::NodeId;
use crate::resolver::{self, ResolvedData};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Which side of the node to inspect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreviewDirection {
    /// Records arriving at the node's default input port.
    Input,
    /// Records the node last produced on its default output port.
    Output,
}

/// One page of a node's resolved records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewPage {
    /// The records on this page.
    pub rows: Vec<JsonValue>,
    /// Column names inferred from the first record of the full set.
    /// Empty for scalar rows, which degrade to a columnless raw view.
    pub columns: Vec<String>,
    /// Total number of records across all pages.
    pub total_count: usize,
}

/// Returns one page of the records flowing into or out of a node.
///
/// `page` is zero-based. A page past the end has empty rows but still
/// reports the columns and total count.
#[must_use]
pub fn preview(
    graph: &WorkflowGraph,
    data: &ResolvedData,
    node_id: NodeId,
    direction: PreviewDirection,
    page: usize,
    page_size: usize,
) -> PreviewPage {
    let records = match direction {
        PreviewDirection::Input => resolver::resolve_input(graph, data, node_id, None),
        PreviewDirection::Output => resolver::resolve_output(graph, data, node_id, None),
    };

    let columns = inference::fields(&records);
    let total_count = records.len();
    let start = page.saturating_mul(page_size).min(total_count);
    let end = start.saturating_add(page_size).min(total_count);
    let rows = records.records()[start..end].to_vec();

    PreviewPage {
        rows,
        columns,
        total_count,
    }
}
