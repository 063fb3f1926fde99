// Version manager — `(name, version)` resolution and the bound handle facade
//
//! A `WorkflowDefinition` is immutable once registered; running
//! instances stay pinned to the version they were created under even
//! after a newer version is registered. `VersionManager` is the thin
//! registry/resolver in front of `Store`'s definition table;
//! `WorkflowHandle` binds one resolved definition plus its
//! `DomainCallbacks` to an `Engine`, the way a caller would otherwise
//! have to re-pass both on every call.

use super::callbacks::DomainCallbacks;
use super::composite::CompositeRunner;
use super::scheduler::Engine;
use crate::error::{Result, WorkflowError};
use crate::models::definition::{ConditionName, WorkflowDefinition};
use crate::models::host::CurrentUser;
use crate::models::ids::{AggregateId, TaskName, WorkflowId, WorkItemId};
use crate::audit::{AuditSpan, AuditTrace};
use crate::models::ids::TraceId;
use crate::models::instance::{TaskInstanceStatus, WorkflowInstance};
use crate::models::work_item::WorkItem;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

pub struct VersionManager {
    engine: Arc<Engine>,
}

impl VersionManager {
    pub fn new(engine: Arc<Engine>) -> Self {
        VersionManager { engine }
    }

    /// Registers a new, already-validated `WorkflowDefinition`
    /// (`DefinitionBuilder::build` has run). Registering a name/version
    /// pair that already exists is the caller's bug, not something this
    /// layer silently overwrites away — `Store::insert_definition` is
    /// expected to reject a duplicate key the same way every other
    /// `insert_*` does.
    pub async fn register(&self, definition: WorkflowDefinition) -> Result<()> {
        self.engine.store.insert_definition(definition).await
    }

    pub async fn resolve(&self, name: &str, version: u32) -> Result<WorkflowDefinition> {
        self.engine
            .store
            .get_definition(name, version)
            .await?
            .ok_or_else(|| WorkflowError::NotFound(format!("workflow definition '{}@{}'", name, version)))
    }

    pub async fn resolve_latest(&self, name: &str) -> Result<WorkflowDefinition> {
        let version = self
            .engine
            .store
            .latest_definition_version(name)
            .await?
            .ok_or_else(|| WorkflowError::NotFound(format!("workflow definition '{}'", name)))?;
        self.resolve(name, version).await
    }

    /// Binds a resolved definition and its domain callbacks into a
    /// `WorkflowHandle` — the object the embedding application actually
    /// holds onto and calls operations against.
    pub fn handle(&self, definition: WorkflowDefinition, callbacks: DomainCallbacks) -> WorkflowHandle {
        WorkflowHandle {
            engine: self.engine.clone(),
            composite: CompositeRunner::new(self.engine.clone()),
            definition,
            callbacks,
        }
    }

    pub async fn resolve_handle(&self, name: &str, version: u32, callbacks: DomainCallbacks) -> Result<WorkflowHandle> {
        let definition = self.resolve(name, version).await?;
        Ok(self.handle(definition, callbacks))
    }
}

/// One `(name, version)` definition bound to its `DomainCallbacks`,
/// forwarding the scheduler's public operations without requiring the
/// caller to re-supply either on every call.
pub struct WorkflowHandle {
    engine: Arc<Engine>,
    composite: CompositeRunner,
    definition: WorkflowDefinition,
    callbacks: DomainCallbacks,
}

impl WorkflowHandle {
    pub fn definition(&self) -> &WorkflowDefinition {
        &self.definition
    }

    pub async fn initialize_root(&self, aggregate_id: AggregateId) -> Result<WorkflowInstance> {
        self.engine.initialize_root(&self.definition, &self.callbacks, aggregate_id).await
    }

    pub async fn initialize_work_item(
        &self,
        workflow_id: WorkflowId,
        task_name: &TaskName,
        payload: Value,
        actor: &CurrentUser,
    ) -> Result<WorkItem> {
        self.engine
            .initialize_work_item(&self.definition, workflow_id, task_name, payload, actor)
            .await
    }

    pub async fn claim_work_item(&self, user: &CurrentUser, work_item_id: WorkItemId) -> Result<WorkItem> {
        self.engine.claim_work_item(&self.definition, user, work_item_id).await
    }

    pub async fn start_work_item(&self, user: &CurrentUser, work_item_id: WorkItemId) -> Result<WorkItem> {
        self.engine.start_work_item(&self.definition, user, work_item_id).await
    }

    pub async fn complete_work_item(
        &self,
        user: &CurrentUser,
        work_item_id: WorkItemId,
        result: Value,
        chosen_outgoing: &[ConditionName],
    ) -> Result<WorkflowInstance> {
        self.engine
            .complete_work_item(&self.definition, &self.callbacks, user, work_item_id, result, chosen_outgoing)
            .await
    }

    pub async fn cancel_work_item(&self, work_item_id: WorkItemId) -> Result<WorkItem> {
        self.engine.cancel_work_item(work_item_id).await
    }

    /// Cancels the whole workflow — every active task instance, and
    /// recursively every composite sub-workflow still running
    /// underneath it.
    pub async fn cancel_workflow(&self, workflow_id: WorkflowId) -> Result<WorkflowInstance> {
        self.engine.cancel_workflow(workflow_id).await
    }

    pub async fn get_task_states(&self, workflow_id: WorkflowId) -> Result<HashMap<TaskName, TaskInstanceStatus>> {
        self.engine.get_task_states(workflow_id).await
    }

    pub async fn get_trace(&self, trace_id: TraceId) -> Result<Option<AuditTrace>> {
        self.engine.get_trace(trace_id).await
    }

    pub async fn list_recent_traces(&self, limit: usize) -> Result<Vec<AuditTrace>> {
        self.engine.list_recent_traces(limit).await
    }

    pub async fn get_trace_spans(&self, trace_id: TraceId) -> Result<Vec<AuditSpan>> {
        self.engine.get_trace_spans(trace_id).await
    }

    pub async fn get_key_events(&self, workflow_id: WorkflowId) -> Result<Vec<AuditSpan>> {
        self.engine.get_key_events(workflow_id).await
    }

    pub async fn get_child_workflow_instances(&self, parent_workflow_id: WorkflowId) -> Result<Vec<WorkflowInstance>> {
        self.engine.get_child_workflow_instances(parent_workflow_id).await
    }

    pub async fn get_workflow_state_at_time(
        &self,
        workflow_id: WorkflowId,
        at: DateTime<Utc>,
    ) -> Result<Option<WorkflowInstance>> {
        self.engine.get_workflow_state_at_time(workflow_id, at).await
    }

    /// Spawns the sub-workflow for a composite task that's reached
    /// `Enabled`. `sub_callbacks` governs the child
    /// instance, which may belong to a different definition entirely.
    pub async fn start_composite(
        &self,
        workflow_id: WorkflowId,
        task_name: &TaskName,
        sub_callbacks: &DomainCallbacks,
    ) -> Result<WorkflowInstance> {
        let task = self
            .definition
            .task(task_name)
            .ok_or_else(|| WorkflowError::NotFound(format!("task '{}'", task_name)))?;
        let mut instance = self
            .engine
            .store
            .get_instance(workflow_id)
            .await?
            .ok_or_else(|| WorkflowError::NotFound(format!("workflow instance '{}'", workflow_id)))?;
        let child = self.composite.start(&self.definition, &mut instance, task, sub_callbacks).await?;
        self.engine.store.patch_instance(instance).await?;
        Ok(child)
    }

    /// Checks whether a spawned sub-workflow has finished, and if so
    /// fires the parent composite task with its result.
    pub async fn harvest_composite(
        &self,
        workflow_id: WorkflowId,
        task_name: &TaskName,
        chosen_outgoing: &[ConditionName],
    ) -> Result<bool> {
        let task = self
            .definition
            .task(task_name)
            .ok_or_else(|| WorkflowError::NotFound(format!("task '{}'", task_name)))?;
        let mut instance = self
            .engine
            .store
            .get_instance(workflow_id)
            .await?
            .ok_or_else(|| WorkflowError::NotFound(format!("workflow instance '{}'", workflow_id)))?;
        let harvested = self.composite.try_harvest(&self.definition, &mut instance, task, chosen_outgoing).await?;
        if harvested {
            self.engine.store.patch_instance(instance).await?;
        }
        Ok(harvested)
    }
}
