// Audit and observability subsystem
//
//! Every mutating engine operation emits an immutable `AuditSpan` into
//! the trace rooted at that call. This module owns the span/trace
//! shapes, the sequencing rules, and point-in-time reconstruction; it
//! has no write access to `WorkflowInstance` or `WorkItem` beyond what
//! `engine` hands it to record.

pub mod reconstruct;
pub mod span;
pub mod trace;

pub use reconstruct::{get_child_workflow_instances, get_key_events, get_workflow_state_at_time};
pub use span::{AuditSpan, SpanKind};
pub use trace::{AuditContext, AuditTrace, AuditWorkflowSnapshot};
