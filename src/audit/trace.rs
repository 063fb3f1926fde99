// AuditTrace, AuditContext and snapshot caching
//
//! An `AuditTrace` groups every span produced by one root-level engine
//! call; nested calls (a composite task's sub-workflow, a
//! scheduler follow-up) share the trace and increase `depth`.
//! `AuditContext` is threaded through a call so every span it emits
//! gets the right `trace_id`/`parent_span_id`/`sequence_number`
//! without every component needing to know about its caller.

use super::span::{AuditSpan, SpanKind};
use crate::models::ids::{SpanId, TaskName, TraceId, UserId, WorkflowId};
use crate::models::instance::WorkflowInstance;
use crate::models::work_item::WorkItem;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Groups the spans emitted by one traced call tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditTrace {
    pub trace_id: TraceId,
    pub root_workflow_id: WorkflowId,
    pub started_at: DateTime<Utc>,
}

/// Threaded through one engine call to assign each emitted span a
/// consistent `trace_id`, the correct `parent_span_id`/`depth`, and a
/// monotonic `sequence_number` shared across the whole trace — the
/// tie-breaker for when two spans land in the same millisecond.
#[derive(Clone)]
pub struct AuditContext {
    trace_id: TraceId,
    parent_span_id: Option<SpanId>,
    depth: u32,
    sequence: Arc<AtomicU64>,
}

impl AuditContext {
    /// Starts a fresh, unrelated trace — only correct when no workflow
    /// instance (and hence no `root_workflow_id`) exists yet to anchor
    /// the trace to. Prefer [`AuditContext::for_trace`] wherever an
    /// instance is available, since `root()` mints a new `TraceId` every
    /// call and so can never be reused across a workflow's operations.
    pub fn root() -> Self {
        AuditContext {
            trace_id: TraceId::new(),
            parent_span_id: None,
            depth: 0,
            sequence: Arc::new(AtomicU64::new(0)),
        }
    }

    /// A context for the given trace — every operation on the same
    /// workflow, and on any of its composite sub-workflows, builds its
    /// context from the same `trace_id` so a trace spans the whole call
    /// tree, not just one transaction's own spans.
    pub fn for_trace(trace_id: TraceId) -> Self {
        AuditContext {
            trace_id,
            parent_span_id: None,
            depth: 0,
            sequence: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn trace_id(&self) -> TraceId {
        self.trace_id
    }

    /// A context for a call nested one level below `span` (e.g. the
    /// sub-workflow a composite task spawns), sharing this trace's
    /// sequence counter.
    pub fn nested_under(&self, span_id: SpanId) -> Self {
        AuditContext {
            trace_id: self.trace_id,
            parent_span_id: Some(span_id),
            depth: self.depth + 1,
            sequence: Arc::clone(&self.sequence),
        }
    }

    /// Builds the next span under this context's current parent/depth,
    /// assigning it the next sequence number in the trace.
    #[allow(clippy::too_many_arguments)]
    pub fn record(
        &self,
        workflow_id: WorkflowId,
        task_name: Option<TaskName>,
        kind: SpanKind,
        actor: Option<UserId>,
        occurred_at: DateTime<Utc>,
        attributes: Value,
    ) -> AuditSpan {
        let sequence_number = self.sequence.fetch_add(1, Ordering::SeqCst);
        AuditSpan {
            span_id: SpanId::new(),
            trace_id: self.trace_id,
            parent_span_id: self.parent_span_id,
            depth: self.depth,
            sequence_number,
            workflow_id,
            task_name,
            kind,
            actor,
            occurred_at,
            attributes,
        }
    }
}

/// A cached reconstruction of a workflow instance's state as of some
/// timestamp — pure performance aid: correctness never
/// depends on a snapshot existing, only on replaying spans since it was
/// taken.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditWorkflowSnapshot {
    pub workflow_id: WorkflowId,
    pub as_of: DateTime<Utc>,
    pub instance: WorkflowInstance,
    pub work_items: Vec<WorkItem>,
    pub taken_at: DateTime<Utc>,
}
