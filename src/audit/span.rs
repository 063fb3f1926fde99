// AuditSpan — one recorded fact about a workflow's execution
//
//! Audit is modeled as a span tree per trace rather than a flat event
//! log: each span carries its own causal link (`parent_span_id` +
//! `depth` for the tree shape) and ordering (`sequence_number` for
//! same-millisecond tie-breaking), the way an envelope generalizes a
//! bare history record into something that carries its own causal and
//! ordering metadata.

use crate::models::ids::{SpanId, TaskName, TraceId, UserId, WorkflowId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What kind of fact a span records — the "key events" a trace must be
/// able to project without a query language: workflow lifecycle, task
/// lifecycle, work item lifecycle, and authorization decisions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpanKind {
    WorkflowInitialized,
    WorkflowCompleted,
    WorkflowCanceled,
    TaskEnabled,
    TaskStarted,
    TaskCompleted,
    TaskCanceled,
    TaskFailed,
    WorkItemOffered,
    WorkItemClaimed,
    WorkItemCompleted,
    AuthzDecision,
    CallbackFailed,
}

/// One node in the span tree for a trace. Immutable once
/// appended — the `Store::append_span` contract never updates or
/// deletes a span.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditSpan {
    pub span_id: SpanId,
    pub trace_id: TraceId,
    pub parent_span_id: Option<SpanId>,
    /// Root span has depth 0; each nested call increments it.
    pub depth: u32,
    /// Tie-breaker among spans sharing a trace and a millisecond-equal
    /// `occurred_at`.
    pub sequence_number: u64,
    pub workflow_id: WorkflowId,
    pub task_name: Option<TaskName>,
    pub kind: SpanKind,
    pub actor: Option<UserId>,
    pub occurred_at: DateTime<Utc>,
    pub attributes: Value,
}

impl AuditSpan {
    pub fn is_root(&self) -> bool {
        self.parent_span_id.is_none()
    }
}
