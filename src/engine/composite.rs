// Composite task runner — sub-workflow instantiation and result propagation
//
//! A composite task's body is itself a workflow instance. Starting one
//! spawns a child `WorkflowInstance` linked by
//! `parent_workflow_id`; completing one fires the parent task exactly
//! the way `complete_work_item` fires a human task, except the trigger
//! is the child instance reaching a terminal status rather than a work
//! item being completed. Kept as its own component rather than folded
//! into `engine::scheduler`'s fixpoint loop because it needs the
//! definition registry (`Store::get_definition`) to resolve
//! `sub_definition`, and because harvesting a finished child is driven
//! by the host's `Scheduler`/poll loop, not by the marking alone.

use super::callbacks::DomainCallbacks;
use super::enablement;
use super::scheduler::Engine;
use crate::error::{Result, WorkflowError};
use crate::models::definition::{ConditionName, TaskDefinition, TaskKind, WorkflowDefinition};
use crate::models::ids::WorkflowId;
use crate::models::instance::{TaskInstanceStatus, WorkflowInstance, WorkflowStatus};
use std::sync::Arc;

/// The marker embedded in a composite `TaskInstance.output` once its
/// sub-workflow has been spawned, so a later `try_harvest` call can
/// find the child without a dedicated index. `pub(crate)` so
/// `Engine::cancel_workflow` can decode it to cascade into children.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub(crate) struct CompositeLink {
    pub(crate) child_workflow_id: WorkflowId,
}

pub struct CompositeRunner {
    engine: Arc<Engine>,
}

impl CompositeRunner {
    pub fn new(engine: Arc<Engine>) -> Self {
        CompositeRunner { engine }
    }

    /// Spawns the sub-workflow for one `Enabled` composite task and
    /// advances its `TaskInstance` to `Started`, recording the child's
    /// id so a later `try_harvest` can find it.
    pub async fn start(
        &self,
        definition: &WorkflowDefinition,
        instance: &mut WorkflowInstance,
        task: &TaskDefinition,
        sub_callbacks: &DomainCallbacks,
    ) -> Result<WorkflowInstance> {
        if !task.is_composite() {
            return Err(WorkflowError::InvalidDefinition(format!(
                "task '{}' is not composite",
                task.name
            )));
        }
        let task_instance = instance.tasks.get(&task.name).ok_or_else(|| WorkflowError::NotEnabled {
            task: task.name.to_string(),
        })?;
        if task_instance.status != TaskInstanceStatus::Enabled {
            return Err(WorkflowError::NotEnabled {
                task: task.name.to_string(),
            });
        }

        let sub_ref = task.sub_definition.as_ref().ok_or_else(|| {
            WorkflowError::InvalidDefinition(format!("composite task '{}' has no sub_definition", task.name))
        })?;
        let sub_definition = self
            .engine
            .store
            .get_definition(&sub_ref.name, sub_ref.version)
            .await?
            .ok_or_else(|| WorkflowError::NotFound(format!("workflow definition '{}'", sub_ref)))?;

        let child = self
            .engine
            .initialize_child(
                &sub_definition,
                sub_callbacks,
                instance.aggregate_id.clone(),
                instance.id,
                instance.root_workflow_id,
            )
            .await?;

        let link = serde_json::to_value(CompositeLink {
            child_workflow_id: child.id,
        })
        .map_err(WorkflowError::Serialization)?;
        if let Some(ti) = instance.tasks.get_mut(&task.name) {
            ti.status = TaskInstanceStatus::Started;
            ti.started_at = Some(self.engine.clock.now());
            ti.output = Some(link);
        }
        let _ = definition;
        Ok(child)
    }

    /// Checks whether the sub-workflow spawned for `task` has reached a
    /// terminal status; if so, fires the parent task with the child's
    /// final task output as payload and propagates the instance back
    /// into `Completed`/left `Started` otherwise.
    pub async fn try_harvest(
        &self,
        definition: &WorkflowDefinition,
        instance: &mut WorkflowInstance,
        task: &TaskDefinition,
        chosen_outgoing: &[ConditionName],
    ) -> Result<bool> {
        if task.kind != TaskKind::Composite {
            return Err(WorkflowError::InvalidDefinition(format!(
                "task '{}' is not composite",
                task.name
            )));
        }
        let link = match instance.tasks.get(&task.name).and_then(|ti| ti.output.clone()) {
            Some(value) => serde_json::from_value::<CompositeLink>(value).map_err(WorkflowError::Serialization)?,
            None => return Ok(false),
        };

        let child = self
            .engine
            .store
            .get_instance(link.child_workflow_id)
            .await?
            .ok_or_else(|| WorkflowError::NotFound(format!("workflow instance '{}'", link.child_workflow_id)))?;
        if child.status != WorkflowStatus::Completed {
            return Ok(false);
        }

        let payload = child
            .tasks
            .values()
            .filter_map(|ti| ti.completed_at.map(|at| (at, ti.output.clone())))
            .max_by_key(|(at, _)| *at)
            .and_then(|(_, output)| output)
            .unwrap_or(serde_json::Value::Null);

        enablement::fire(
            definition,
            instance,
            task,
            chosen_outgoing,
            self.engine.config.or_join_policy,
        )?;
        if let Some(ti) = instance.tasks.get_mut(&task.name) {
            ti.status = TaskInstanceStatus::Completed;
            ti.completed_at = Some(self.engine.clock.now());
            ti.output = Some(payload);
        }
        Ok(true)
    }
}
