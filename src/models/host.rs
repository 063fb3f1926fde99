// Host-supplied capabilities
//
//! The engine owns no I/O of its own: persistence, identity, wall-clock
//! time and scheduling are all traits implemented by the embedding
//! application. `Store` is a concrete per-entity CRUD trait rather than
//! a generic key-value trait, since trait objects with generic methods
//! aren't object-safe, and a typed API reads better at every call site.

use super::definition::WorkflowDefinition;
use super::ids::{AggregateId, GroupName, RoleName, TaskName, UserId, WorkItemId, WorkflowId};
use super::instance::WorkflowInstance;
use super::work_item::WorkItem;
use crate::audit::span::AuditSpan;
use crate::audit::trace::{AuditTrace, AuditWorkflowSnapshot};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// The transactional key-value-plus-index store the embedding
/// application implements. One host transaction backs a single call
/// into the engine's public API; everything a single call does against
/// `Store` is expected to commit or roll back atomically.
#[async_trait]
pub trait Store: Send + Sync {
    async fn insert_definition(&self, definition: WorkflowDefinition) -> Result<()>;
    async fn get_definition(&self, name: &str, version: u32) -> Result<Option<WorkflowDefinition>>;
    async fn latest_definition_version(&self, name: &str) -> Result<Option<u32>>;

    async fn insert_instance(&self, instance: WorkflowInstance) -> Result<()>;
    async fn get_instance(&self, id: WorkflowId) -> Result<Option<WorkflowInstance>>;
    async fn patch_instance(&self, instance: WorkflowInstance) -> Result<()>;
    /// Index by aggregate: "which workflow instances govern this business
    /// record".
    async fn query_instances_by_aggregate(
        &self,
        aggregate_id: &AggregateId,
    ) -> Result<Vec<WorkflowInstance>>;
    /// Index by parent: children spawned by a composite task.
    async fn query_child_instances(&self, parent: WorkflowId) -> Result<Vec<WorkflowInstance>>;

    async fn insert_work_item(&self, item: WorkItem) -> Result<()>;
    async fn get_work_item(&self, id: WorkItemId) -> Result<Option<WorkItem>>;
    async fn patch_work_item(&self, item: WorkItem) -> Result<()>;
    /// Index by offered group: audience matching for `ListOfferedWork`.
    async fn query_work_items_offered_to_group(&self, group: &GroupName) -> Result<Vec<WorkItem>>;
    /// Index by claimant: `ListClaimedWork`.
    async fn query_work_items_claimed_by(&self, user: &UserId) -> Result<Vec<WorkItem>>;
    /// Index by task: all open work items for one task across generations.
    async fn query_open_work_items_for_task(
        &self,
        workflow_id: WorkflowId,
        task_name: &TaskName,
    ) -> Result<Vec<WorkItem>>;

    /// Append-only span write; spans are never updated or deleted once
    /// written.
    async fn append_span(&self, span: AuditSpan) -> Result<()>;
    async fn get_spans_for_trace(&self, trace_id: super::ids::TraceId) -> Result<Vec<AuditSpan>>;
    async fn get_spans_for_workflow(&self, workflow_id: WorkflowId) -> Result<Vec<AuditSpan>>;

    /// One record per trace (one per root workflow instance), backing
    /// `ListRecentTraces`/`GetTrace` without replaying every
    /// span just to learn a trace exists.
    async fn insert_trace(&self, trace: AuditTrace) -> Result<()>;
    async fn get_trace(&self, trace_id: super::ids::TraceId) -> Result<Option<AuditTrace>>;
    async fn list_recent_traces(&self, limit: usize) -> Result<Vec<AuditTrace>>;

    /// Snapshot cache — pure performance aid; a host is
    /// free to never call `insert_snapshot` and reconstruction still
    /// works by full replay.
    async fn latest_snapshot_before(
        &self,
        workflow_id: WorkflowId,
        at: DateTime<Utc>,
    ) -> Result<Option<AuditWorkflowSnapshot>>;
    async fn insert_snapshot(&self, snapshot: AuditWorkflowSnapshot) -> Result<()>;
}

/// The acting user for one engine call, resolved by the host's identity
/// layer before the engine is invoked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub user_id: UserId,
    pub groups: Vec<GroupName>,
    pub roles: Vec<RoleName>,
}

pub trait IdentityProvider: Send + Sync {
    fn current_user(&self) -> Result<CurrentUser>;
}

/// Wall-clock time, injected so audit timestamps and scheduling
/// calculations are deterministic under test.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Lets the engine ask the host to invoke it again later — used by
/// composite tasks awaiting a sub-workflow and by any task with a
/// timeout. The engine never spawns
/// its own timers.
#[async_trait]
pub trait Scheduler: Send + Sync {
    async fn schedule_follow_up(
        &self,
        workflow_id: WorkflowId,
        task_name: TaskName,
        at: DateTime<Utc>,
    ) -> Result<()>;
}
