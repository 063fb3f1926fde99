// Running workflow instances — the marking itself
//
//! `WorkflowInstance` holds a marking over conditions and a set of
//! `TaskInstance`s, each tracking its own generation.

use super::ids::{ConditionName, TaskName, WorkflowId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkflowStatus {
    Running,
    Completed,
    Canceled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskInstanceStatus {
    /// Not all join conditions are satisfied yet.
    NotEnabled,
    /// Join conditions satisfied; no work item has started it yet.
    Enabled,
    /// A work item for this task instance is in progress.
    Started,
    /// The task produced tokens into its outgoing conditions.
    Completed,
    /// Canceled before completion — a future token into any incoming
    /// condition creates a new generation.
    Canceled,
    Failed,
}

/// The marking: how many tokens currently sit on each condition. We keep
/// a count per condition rather than a boolean, since and-joins can be
/// re-entered concurrently by different task generations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Marking {
    tokens: HashMap<ConditionName, u32>,
}

impl Marking {
    pub fn new() -> Self {
        Marking::default()
    }

    pub fn has_token(&self, condition: &ConditionName) -> bool {
        self.tokens.get(condition).copied().unwrap_or(0) > 0
    }

    pub fn token_count(&self, condition: &ConditionName) -> u32 {
        self.tokens.get(condition).copied().unwrap_or(0)
    }

    pub fn add_token(&mut self, condition: ConditionName) {
        *self.tokens.entry(condition).or_insert(0) += 1;
    }

    /// Removes one token from `condition`. Returns `false` if there was
    /// none to remove (caller's enablement check should prevent this).
    pub fn take_token(&mut self, condition: &ConditionName) -> bool {
        if let Some(count) = self.tokens.get_mut(condition) {
            if *count > 0 {
                *count -= 1;
                return true;
            }
        }
        false
    }

    pub fn marked_conditions(&self) -> impl Iterator<Item = &ConditionName> {
        self.tokens
            .iter()
            .filter(|(_, count)| **count > 0)
            .map(|(name, _)| name)
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.values().all(|count| *count == 0)
    }
}

/// One firing of a task, addressed by `(task_name, generation)`.
/// Re-enablement after `Canceled` bumps `generation` rather than
/// mutating the canceled instance in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskInstance {
    pub workflow_id: WorkflowId,
    pub task_name: TaskName,
    pub generation: u32,
    pub status: TaskInstanceStatus,
    pub enabled_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Payload produced on completion, validated against the task's
    /// registered `PayloadCodec` before tokens are emitted.
    pub output: Option<Value>,
}

impl TaskInstance {
    pub fn new(workflow_id: WorkflowId, task_name: TaskName) -> Self {
        TaskInstance {
            workflow_id,
            task_name,
            generation: 0,
            status: TaskInstanceStatus::NotEnabled,
            enabled_at: None,
            started_at: None,
            completed_at: None,
            output: None,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(
            self.status,
            TaskInstanceStatus::Enabled | TaskInstanceStatus::Started
        )
    }

    /// Advances this instance to a fresh generation after cancellation,
    /// resetting its lifecycle timestamps.
    pub fn reenable(&mut self, at: DateTime<Utc>) {
        self.generation += 1;
        self.status = TaskInstanceStatus::Enabled;
        self.enabled_at = Some(at);
        self.started_at = None;
        self.completed_at = None;
        self.output = None;
    }
}

/// One running (or finished) execution of a `WorkflowDefinition`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowInstance {
    pub id: WorkflowId,
    pub definition_name: String,
    pub definition_version: u32,
    pub aggregate_id: super::ids::AggregateId,
    pub status: WorkflowStatus,
    pub marking: Marking,
    pub tasks: HashMap<TaskName, TaskInstance>,
    /// Set only for sub-workflows spawned by a composite task.
    pub parent_workflow_id: Option<WorkflowId>,
    /// The workflow that anchors this instance's audit trace. Equal to
    /// `id` for a root instance, inherited from the parent for a
    /// composite sub-workflow, so every span in a trace — however deep
    /// the composite nesting — shares one `TraceId`.
    pub root_workflow_id: WorkflowId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkflowInstance {
    pub fn task_instance(&self, name: &TaskName) -> Option<&TaskInstance> {
        self.tasks.get(name)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self.status,
            WorkflowStatus::Completed | WorkflowStatus::Canceled
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marking_add_and_take() {
        let mut m = Marking::new();
        let c: ConditionName = "start".into();
        assert!(!m.has_token(&c));
        m.add_token(c.clone());
        assert!(m.has_token(&c));
        assert!(m.take_token(&c));
        assert!(!m.has_token(&c));
        assert!(!m.take_token(&c));
    }

    #[test]
    fn and_join_tolerates_multiple_tokens() {
        let mut m = Marking::new();
        let c: ConditionName = "shared".into();
        m.add_token(c.clone());
        m.add_token(c.clone());
        assert_eq!(m.token_count(&c), 2);
        assert!(m.take_token(&c));
        assert_eq!(m.token_count(&c), 1);
    }

    #[test]
    fn task_instance_reenable_bumps_generation() {
        let mut t = TaskInstance::new(WorkflowId::new(), "approve".into());
        t.status = TaskInstanceStatus::Canceled;
        let now = Utc::now();
        t.reenable(now);
        assert_eq!(t.generation, 1);
        assert_eq!(t.status, TaskInstanceStatus::Enabled);
    }
}
