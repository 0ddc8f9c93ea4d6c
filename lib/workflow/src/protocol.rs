//! Node configuration protocol.
//!
//! Every node kind exposes a configuration surface: a description of its
//! editable fields and a validator over a candidate payload. Saving is one
//! uniform operation for all kinds: the delta is merged into the current
//! params and the merged candidate is validated before it reaches the
//! graph store. The graph and persistence layers stay type-agnostic;
//! adding a node kind means registering a new surface here and nothing
//! else.
//!
//! Surfaces may consult upstream resolved data to offer live suggestions
//! (a join's key dropdown, a condition's field list) but always degrade to
//! free-text entry: a workflow can be configured before it has ever run.

use crate::error::{FieldError, GraphError, SaveError};
use crate::graph::WorkflowGraph;
use crate::inference;
use crate::join;
use crate::node::{Node, NodeId, NodeKind};
use crate::resolver::{self, ResolvedData};
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::collections::HashMap;

/// How an editable field is presented.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldKind {
    /// Free text entry.
    Text,
    /// A closed set of choices.
    Select { choices: Vec<String> },
}

/// One editable field of a node's configuration surface.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EditableField {
    /// The key in the node's params payload.
    pub name: String,
    /// User-facing label.
    pub label: String,
    /// Presentation kind.
    pub kind: FieldKind,
    /// Whether a save without this field should be blocked.
    pub required: bool,
    /// Inferred suggestions (e.g. upstream field names). Empty when no
    /// upstream data exists; the field is still freely editable.
    pub suggestions: Vec<String>,
    /// The field's current value, if set.
    pub value: Option<JsonValue>,
}

impl EditableField {
    /// Creates a free-text field.
    #[must_use]
    pub fn text(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            kind: FieldKind::Text,
            required: false,
            suggestions: Vec::new(),
            value: None,
        }
    }

    /// Creates a select field over a closed choice set.
    #[must_use]
    pub fn select(
        name: impl Into<String>,
        label: impl Into<String>,
        choices: &[&str],
    ) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            kind: FieldKind::Select {
                choices: choices.iter().map(ToString::to_string).collect(),
            },
            required: false,
            suggestions: Vec::new(),
            value: None,
        }
    }

    /// Marks the field as required.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Attaches inferred suggestions.
    #[must_use]
    pub fn with_suggestions(mut self, suggestions: Vec<String>) -> Self {
        self.suggestions = suggestions;
        self
    }

    /// Prefills the current value from a params payload.
    #[must_use]
    pub fn with_current(mut self, params: &JsonValue) -> Self {
        self.value = params.get(&self.name).cloned();
        self
    }
}

/// Read-only context handed to surfaces for live suggestions.
pub struct SurfaceContext<'a> {
    graph: &'a WorkflowGraph,
    data: &'a ResolvedData,
}

impl<'a> SurfaceContext<'a> {
    /// Creates a context over the current graph snapshot and cache.
    #[must_use]
    pub fn new(graph: &'a WorkflowGraph, data: &'a ResolvedData) -> Self {
        Self { graph, data }
    }

    /// Field names visible at a node's input port (default port when
    /// `None`). Empty when no upstream data is available.
    #[must_use]
    pub fn input_fields(&self, node_id: NodeId, port: Option<&str>) -> Vec<String> {
        let records = resolver::resolve_input(self.graph, self.data, node_id, port);
        inference::fields(&records)
    }

    /// Field names common to two of a node's input ports, surfaced as
    /// recommended join keys but never auto-selected.
    #[must_use]
    pub fn common_input_fields(&self, node_id: NodeId, port_a: &str, port_b: &str) -> Vec<String> {
        let a = resolver::resolve_input(self.graph, self.data, node_id, Some(port_a));
        let b = resolver::resolve_input(self.graph, self.data, node_id, Some(port_b));
        inference::common_fields(&a, &b)
    }
}

/// A node kind's configuration surface.
pub trait ConfigSurface: Send + Sync {
    /// Describes the editable fields for a node, with live suggestions
    /// from the context where available.
    fn fields(&self, node: &Node, ctx: &SurfaceContext<'_>) -> Vec<EditableField>;

    /// Validates a candidate payload (the node's params with a delta
    /// already merged). Empty means valid.
    fn validate(&self, candidate: &JsonValue) -> Vec<FieldError>;
}

/// Registry mapping node kinds to their configuration surfaces.
pub struct SurfaceRegistry {
    surfaces: HashMap<NodeKind, Box<dyn ConfigSurface>>,
}

impl SurfaceRegistry {
    /// Creates a registry with no surfaces registered.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            surfaces: HashMap::new(),
        }
    }

    /// Creates a registry with the built-in surface for every kind.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(NodeKind::Source, Box::new(SourceSurface));
        registry.register(NodeKind::Join, Box::new(JoinSurface));
        registry.register(NodeKind::Split, Box::new(SplitSurface));
        registry.register(NodeKind::Condition, Box::new(ConditionSurface));
        registry.register(NodeKind::Transform, Box::new(TransformSurface));
        registry.register(NodeKind::Notification, Box::new(NotificationSurface));
        registry.register(NodeKind::Approval, Box::new(ApprovalSurface));
        registry.register(NodeKind::Schedule, Box::new(ScheduleSurface));
        registry.register(NodeKind::Webhook, Box::new(WebhookSurface));
        registry.register(NodeKind::Output, Box::new(OutputSurface));
        registry
    }

    /// Registers (or replaces) the surface for a kind.
    pub fn register(&mut self, kind: NodeKind, surface: Box<dyn ConfigSurface>) {
        self.surfaces.insert(kind, surface);
    }

    /// Returns the surface for a kind, if registered.
    #[must_use]
    pub fn surface(&self, kind: NodeKind) -> Option<&dyn ConfigSurface> {
        self.surfaces.get(&kind).map(Box::as_ref)
    }
}

impl Default for SurfaceRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Saves a configuration delta for a node.
///
/// Merges the delta into the node's current params, validates the merged
/// candidate against the kind's surface, and only then persists through
/// the graph store. A blocked save never partially merges: on error the
/// node's params and label are exactly as before.
///
/// # Errors
///
/// `SaveError::Graph` if the node does not exist; `SaveError::Invalid`
/// with per-field errors if validation fails.
pub fn save(
    graph: &mut WorkflowGraph,
    registry: &SurfaceRegistry,
    node_id: NodeId,
    delta: &JsonValue,
    label: Option<String>,
) -> Result<(), SaveError> {
    let node = graph
        .get_node(node_id)
        .ok_or(GraphError::NodeNotFound { node_id })?;

    if let Some(surface) = registry.surface(node.kind) {
        let candidate = merged_candidate(&node.params, delta);
        let errors = surface.validate(&candidate);
        if !errors.is_empty() {
            tracing::debug!(%node_id, errors = errors.len(), "save blocked by validation");
            return Err(SaveError::Invalid(errors));
        }
    }

    graph.update_node_params(node_id, delta, label)?;
    Ok(())
}

fn merged_candidate(params: &JsonValue, delta: &JsonValue) -> JsonValue {
    match (params.as_object(), delta.as_object()) {
        (Some(params), Some(delta)) => {
            let mut merged = params.clone();
            for (key, value) in delta {
                merged.insert(key.clone(), value.clone());
            }
            JsonValue::Object(merged)
        }
        _ => delta.clone(),
    }
}

fn str_field<'v>(candidate: &'v JsonValue, field: &str) -> Option<&'v str> {
    candidate.get(field).and_then(JsonValue::as_str)
}

fn require_non_empty(candidate: &JsonValue, field: &str, errors: &mut Vec<FieldError>) {
    if str_field(candidate, field).is_none_or(str::is_empty) {
        errors.push(FieldError::new(field, format!("{field} is required")));
    }
}

fn check_choice(candidate: &JsonValue, field: &str, choices: &[&str], errors: &mut Vec<FieldError>) {
    if let Some(value) = str_field(candidate, field)
        && !choices.contains(&value)
    {
        errors.push(FieldError::new(field, format!("unknown value '{value}'")));
    }
}

const JOIN_STRATEGIES: &[&str] = &["concat", "mergeByKey"];
const JOIN_TYPES: &[&str] = &["inner", "outer"];
const CONDITION_OPERATORS: &[&str] = &[
    "equals",
    "notEquals",
    "contains",
    "greaterThan",
    "lessThan",
    "isEmpty",
    "isNotEmpty",
];
const CONDITION_MODES: &[&str] = &["batch", "perRow"];
const NOTIFICATION_CHANNELS: &[&str] = &["email", "sms", "dashboard"];

/// Surface for source nodes: which dataset the node reads.
struct SourceSurface;

impl ConfigSurface for SourceSurface {
    fn fields(&self, node: &Node, _ctx: &SurfaceContext<'_>) -> Vec<EditableField> {
        vec![
            EditableField::text("dataset", "Dataset")
                .required()
                .with_current(&node.params),
        ]
    }

    fn validate(&self, candidate: &JsonValue) -> Vec<FieldError> {
        let mut errors = Vec::new();
        require_non_empty(candidate, "dataset", &mut errors);
        errors
    }
}

/// Surface for join nodes: strategy, type, and key, with the common
/// fields of both inputs as recommended keys.
struct JoinSurface;

impl ConfigSurface for JoinSurface {
    fn fields(&self, node: &Node, ctx: &SurfaceContext<'_>) -> Vec<EditableField> {
        let recommended = ctx.common_input_fields(node.id, "A", "B");
        vec![
            EditableField::select("joinStrategy", "Strategy", JOIN_STRATEGIES)
                .required()
                .with_current(&node.params),
            EditableField::select("joinType", "Join type", JOIN_TYPES)
                .with_current(&node.params),
            EditableField::text("joinKey", "Join key")
                .with_suggestions(recommended)
                .with_current(&node.params),
        ]
    }

    fn validate(&self, candidate: &JsonValue) -> Vec<FieldError> {
        join::validate_params(candidate)
    }
}

/// Surface for split nodes: the optional field the lanes split on.
struct SplitSurface;

impl ConfigSurface for SplitSurface {
    fn fields(&self, node: &Node, ctx: &SurfaceContext<'_>) -> Vec<EditableField> {
        vec![
            EditableField::text("splitField", "Split on field")
                .with_suggestions(ctx.input_fields(node.id, None))
                .with_current(&node.params),
        ]
    }

    fn validate(&self, _candidate: &JsonValue) -> Vec<FieldError> {
        Vec::new()
    }
}

/// Surface for condition nodes: field, operator, comparison value, and
/// whether the check runs once over the batch or per record.
struct ConditionSurface;

impl ConfigSurface for ConditionSurface {
    fn fields(&self, node: &Node, ctx: &SurfaceContext<'_>) -> Vec<EditableField> {
        vec![
            EditableField::text("conditionField", "Field")
                .required()
                .with_suggestions(ctx.input_fields(node.id, None))
                .with_current(&node.params),
            EditableField::select("conditionOperator", "Operator", CONDITION_OPERATORS)
                .required()
                .with_current(&node.params),
            EditableField::text("conditionValue", "Value").with_current(&node.params),
            EditableField::select("processingMode", "Processing mode", CONDITION_MODES)
                .with_current(&node.params),
        ]
    }

    fn validate(&self, candidate: &JsonValue) -> Vec<FieldError> {
        let mut errors = Vec::new();
        require_non_empty(candidate, "conditionField", &mut errors);
        check_choice(candidate, "conditionOperator", CONDITION_OPERATORS, &mut errors);
        check_choice(candidate, "processingMode", CONDITION_MODES, &mut errors);
        errors
    }
}

/// Surface for transform nodes: the field to add or rewrite.
struct TransformSurface;

impl ConfigSurface for TransformSurface {
    fn fields(&self, node: &Node, ctx: &SurfaceContext<'_>) -> Vec<EditableField> {
        vec![
            EditableField::text("fieldName", "Field name")
                .required()
                .with_suggestions(ctx.input_fields(node.id, None))
                .with_current(&node.params),
            EditableField::text("fieldValue", "Field value").with_current(&node.params),
        ]
    }

    fn validate(&self, candidate: &JsonValue) -> Vec<FieldError> {
        let mut errors = Vec::new();
        require_non_empty(candidate, "fieldName", &mut errors);
        errors
    }
}

/// Surface for notification nodes.
struct NotificationSurface;

impl ConfigSurface for NotificationSurface {
    fn fields(&self, node: &Node, _ctx: &SurfaceContext<'_>) -> Vec<EditableField> {
        vec![
            EditableField::select("channel", "Channel", NOTIFICATION_CHANNELS)
                .required()
                .with_current(&node.params),
            EditableField::text("template", "Message template")
                .required()
                .with_current(&node.params),
        ]
    }

    fn validate(&self, candidate: &JsonValue) -> Vec<FieldError> {
        let mut errors = Vec::new();
        require_non_empty(candidate, "channel", &mut errors);
        check_choice(candidate, "channel", NOTIFICATION_CHANNELS, &mut errors);
        require_non_empty(candidate, "template", &mut errors);
        errors
    }
}

/// Surface for human-approval gates.
struct ApprovalSurface;

impl ConfigSurface for ApprovalSurface {
    fn fields(&self, node: &Node, _ctx: &SurfaceContext<'_>) -> Vec<EditableField> {
        vec![
            EditableField::text("approver", "Approver")
                .required()
                .with_current(&node.params),
            EditableField::text("message", "Request message").with_current(&node.params),
        ]
    }

    fn validate(&self, candidate: &JsonValue) -> Vec<FieldError> {
        let mut errors = Vec::new();
        require_non_empty(candidate, "approver", &mut errors);
        errors
    }
}

/// Surface for schedule entry points.
struct ScheduleSurface;

impl ConfigSurface for ScheduleSurface {
    fn fields(&self, node: &Node, _ctx: &SurfaceContext<'_>) -> Vec<EditableField> {
        vec![
            EditableField::text("cron", "Cron expression")
                .required()
                .with_current(&node.params),
        ]
    }

    fn validate(&self, candidate: &JsonValue) -> Vec<FieldError> {
        let mut errors = Vec::new();
        match str_field(candidate, "cron") {
            None | Some("") => {
                errors.push(FieldError::new("cron", "cron is required"));
            }
            Some(cron) if cron.split_whitespace().count() != 5 => {
                errors.push(FieldError::new(
                    "cron",
                    "expected a five-field cron expression",
                ));
            }
            Some(_) => {}
        }
        errors
    }
}

/// Surface for webhook entry points.
struct WebhookSurface;

impl ConfigSurface for WebhookSurface {
    fn fields(&self, node: &Node, _ctx: &SurfaceContext<'_>) -> Vec<EditableField> {
        vec![
            EditableField::text("path", "Webhook path")
                .required()
                .with_current(&node.params),
        ]
    }

    fn validate(&self, candidate: &JsonValue) -> Vec<FieldError> {
        let mut errors = Vec::new();
        match str_field(candidate, "path") {
            None | Some("") => errors.push(FieldError::new("path", "path is required")),
            Some(path) if !path.starts_with('/') => {
                errors.push(FieldError::new("path", "path must start with '/'"));
            }
            Some(_) => {}
        }
        errors
    }
}

/// Surface for output nodes: nothing to configure.
struct OutputSurface;

impl ConfigSurface for OutputSurface {
    fn fields(&self, _node: &Node, _ctx: &SurfaceContext<'_>) -> Vec<EditableField> {
        Vec::new()
    }

    fn validate(&self, _candidate: &JsonValue) -> Vec<FieldError> {
        Vec::new()
    }
}
