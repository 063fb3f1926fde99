// Domain application callbacks — the engine's other host boundary
//
//! "Initialize/OnStart/OnComplete" are the domain application's own
//! logic, specified only at the boundary the engine calls them through.
//! The engine never executes business logic itself — an automated
//! task's `OnComplete` callback decides its output payload and which
//! outgoing conditions receive tokens, leaving state-transition
//! decisions to the caller rather than baking them into the engine.

use crate::error::Result;
use crate::models::definition::TaskDefinition;
use crate::models::ids::{AggregateId, ConditionName, TaskName, WorkflowId};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

pub struct TaskCallbackContext<'a> {
    pub task: &'a TaskDefinition,
    pub workflow_id: WorkflowId,
    pub aggregate_id: &'a AggregateId,
}

/// What an automated task's completion produces: the payload recorded
/// as the task instance's output, and which outgoing conditions get a
/// token (meaningful for `Xor`/`Or` splits; `And` splits ignore it).
pub struct TaskOutcome {
    pub payload: Value,
    pub chosen_outgoing: Vec<ConditionName>,
}

pub trait TaskCallback: Send + Sync {
    fn on_start(&self, _ctx: &TaskCallbackContext) -> Result<()> {
        Ok(())
    }

    fn on_complete(&self, ctx: &TaskCallbackContext) -> Result<TaskOutcome>;
}

pub trait WorkflowInitializer: Send + Sync {
    /// Called once when a root workflow instance is created; its
    /// return value seeds no engine state directly (the engine tracks
    /// only the marking and task instances) but is recorded on the
    /// initializing audit span for the domain application to read back.
    fn initialize(&self, aggregate_id: &AggregateId) -> Result<Value>;
}

/// Per-definition-version registry of domain callbacks, built once when
/// a version is registered (`engine::version`) and held by the engine
/// handle bound to that version.
#[derive(Default, Clone)]
pub struct DomainCallbacks {
    initializer: Option<Arc<dyn WorkflowInitializer>>,
    task_callbacks: HashMap<TaskName, Arc<dyn TaskCallback>>,
}

impl DomainCallbacks {
    pub fn new() -> Self {
        DomainCallbacks::default()
    }

    pub fn with_initializer(mut self, initializer: Arc<dyn WorkflowInitializer>) -> Self {
        self.initializer = Some(initializer);
        self
    }

    pub fn with_task(mut self, task: TaskName, callback: Arc<dyn TaskCallback>) -> Self {
        self.task_callbacks.insert(task, callback);
        self
    }

    pub fn initialize(&self, aggregate_id: &AggregateId) -> Result<Value> {
        match &self.initializer {
            Some(init) => init.initialize(aggregate_id),
            None => Ok(Value::Null),
        }
    }

    pub fn task(&self, name: &TaskName) -> Option<&Arc<dyn TaskCallback>> {
        self.task_callbacks.get(name)
    }
}
