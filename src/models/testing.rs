// In-memory host implementations for tests
//
//! An in-memory `Store` implementation covering the full surface this
//! engine needs, plus a `SystemClock`. `dashmap` gives interior
//! mutability without needing a lock guard per call.

use super::definition::WorkflowDefinition;
use super::host::{Clock, Store};
use super::ids::{AggregateId, GroupName, TaskName, TraceId, UserId, WorkItemId, WorkflowId};
use super::instance::WorkflowInstance;
use super::work_item::WorkItem;
use crate::audit::span::AuditSpan;
use crate::audit::trace::{AuditTrace, AuditWorkflowSnapshot};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

#[derive(Default)]
pub struct MemoryStore {
    definitions: DashMap<(String, u32), WorkflowDefinition>,
    instances: DashMap<WorkflowId, WorkflowInstance>,
    work_items: DashMap<WorkItemId, WorkItem>,
    spans: DashMap<TraceId, Vec<AuditSpan>>,
    traces: DashMap<TraceId, AuditTrace>,
    snapshots: DashMap<WorkflowId, Vec<AuditWorkflowSnapshot>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_definition(&self, definition: WorkflowDefinition) -> Result<()> {
        self.definitions
            .insert((definition.name.clone(), definition.version), definition);
        Ok(())
    }

    async fn get_definition(&self, name: &str, version: u32) -> Result<Option<WorkflowDefinition>> {
        Ok(self
            .definitions
            .get(&(name.to_string(), version))
            .map(|d| d.clone()))
    }

    async fn latest_definition_version(&self, name: &str) -> Result<Option<u32>> {
        Ok(self
            .definitions
            .iter()
            .filter(|entry| entry.key().0 == name)
            .map(|entry| entry.key().1)
            .max())
    }

    async fn insert_instance(&self, instance: WorkflowInstance) -> Result<()> {
        self.instances.insert(instance.id, instance);
        Ok(())
    }

    async fn get_instance(&self, id: WorkflowId) -> Result<Option<WorkflowInstance>> {
        Ok(self.instances.get(&id).map(|i| i.clone()))
    }

    async fn patch_instance(&self, instance: WorkflowInstance) -> Result<()> {
        self.instances.insert(instance.id, instance);
        Ok(())
    }

    async fn query_instances_by_aggregate(
        &self,
        aggregate_id: &AggregateId,
    ) -> Result<Vec<WorkflowInstance>> {
        Ok(self
            .instances
            .iter()
            .filter(|entry| &entry.value().aggregate_id == aggregate_id)
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn query_child_instances(&self, parent: WorkflowId) -> Result<Vec<WorkflowInstance>> {
        Ok(self
            .instances
            .iter()
            .filter(|entry| entry.value().parent_workflow_id == Some(parent))
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn insert_work_item(&self, item: WorkItem) -> Result<()> {
        self.work_items.insert(item.id, item);
        Ok(())
    }

    async fn get_work_item(&self, id: WorkItemId) -> Result<Option<WorkItem>> {
        Ok(self.work_items.get(&id).map(|i| i.clone()))
    }

    async fn patch_work_item(&self, item: WorkItem) -> Result<()> {
        self.work_items.insert(item.id, item);
        Ok(())
    }

    async fn query_work_items_offered_to_group(&self, group: &GroupName) -> Result<Vec<WorkItem>> {
        Ok(self
            .work_items
            .iter()
            .filter(|entry| entry.value().offered_group.as_ref() == Some(group))
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn query_work_items_claimed_by(&self, user: &UserId) -> Result<Vec<WorkItem>> {
        Ok(self
            .work_items
            .iter()
            .filter(|entry| entry.value().claimed_by.as_ref() == Some(user))
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn query_open_work_items_for_task(
        &self,
        workflow_id: WorkflowId,
        task_name: &TaskName,
    ) -> Result<Vec<WorkItem>> {
        Ok(self
            .work_items
            .iter()
            .filter(|entry| {
                let item = entry.value();
                item.task.workflow_id == workflow_id
                    && &item.task.task_name == task_name
                    && item.is_open()
            })
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn append_span(&self, span: AuditSpan) -> Result<()> {
        self.spans.entry(span.trace_id).or_default().push(span);
        Ok(())
    }

    async fn get_spans_for_trace(&self, trace_id: TraceId) -> Result<Vec<AuditSpan>> {
        Ok(self
            .spans
            .get(&trace_id)
            .map(|spans| spans.clone())
            .unwrap_or_default())
    }

    async fn get_spans_for_workflow(&self, workflow_id: WorkflowId) -> Result<Vec<AuditSpan>> {
        Ok(self
            .spans
            .iter()
            .flat_map(|entry| entry.value().clone())
            .filter(|span| span.workflow_id == workflow_id)
            .collect())
    }

    async fn insert_trace(&self, trace: AuditTrace) -> Result<()> {
        self.traces.insert(trace.trace_id, trace);
        Ok(())
    }

    async fn get_trace(&self, trace_id: TraceId) -> Result<Option<AuditTrace>> {
        Ok(self.traces.get(&trace_id).map(|t| t.clone()))
    }

    async fn list_recent_traces(&self, limit: usize) -> Result<Vec<AuditTrace>> {
        let mut traces: Vec<AuditTrace> = self.traces.iter().map(|t| t.value().clone()).collect();
        traces.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        traces.truncate(limit);
        Ok(traces)
    }

    async fn latest_snapshot_before(
        &self,
        workflow_id: WorkflowId,
        at: DateTime<Utc>,
    ) -> Result<Option<AuditWorkflowSnapshot>> {
        Ok(self.snapshots.get(&workflow_id).and_then(|snapshots| {
            snapshots
                .iter()
                .filter(|s| s.as_of <= at)
                .max_by_key(|s| s.as_of)
                .cloned()
        }))
    }

    async fn insert_snapshot(&self, snapshot: AuditWorkflowSnapshot) -> Result<()> {
        self.snapshots
            .entry(snapshot.workflow_id)
            .or_default()
            .push(snapshot);
        Ok(())
    }
}

/// `Clock` backed by the system's real wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
