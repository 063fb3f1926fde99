// Fluent construction of WorkflowDefinition, with build-time validation
//
//! Definitions are assembled incrementally (conditions and tasks added
//! one at a time) and rejected at `build()` if malformed, so the
//! structural checks live here rather than in a constructor.

use super::definition::{
    ConditionDefinition, ConditionRole, TaskDefinition, TaskKind, WorkflowDefinition,
};
use super::ids::ConditionName;
use crate::error::{Result, WorkflowError};
use std::collections::HashSet;

pub struct DefinitionBuilder {
    name: String,
    version: u32,
    conditions: Vec<ConditionDefinition>,
    tasks: Vec<TaskDefinition>,
    start_condition: Option<ConditionName>,
    end_condition: Option<ConditionName>,
}

impl DefinitionBuilder {
    pub fn new<S: Into<String>>(name: S, version: u32) -> Self {
        DefinitionBuilder {
            name: name.into(),
            version,
            conditions: Vec::new(),
            tasks: Vec::new(),
            start_condition: None,
            end_condition: None,
        }
    }

    pub fn condition(mut self, condition: ConditionDefinition) -> Self {
        if condition.role == ConditionRole::Start {
            self.start_condition = Some(condition.name.clone());
        }
        if condition.role == ConditionRole::End {
            self.end_condition = Some(condition.name.clone());
        }
        self.conditions.push(condition);
        self
    }

    pub fn task(mut self, task: TaskDefinition) -> Self {
        self.tasks.push(task);
        self
    }

    /// Validates the accumulated graph and produces an immutable
    /// `WorkflowDefinition`:
    /// - exactly one start condition, exactly one end condition
    /// - every task name is unique
    /// - every condition a task references (incoming or outgoing) exists
    /// - every condition except start is fed by at least one task, and
    ///   every condition except end feeds at least one task
    /// - composite tasks carry a `sub_definition` reference; non-composite
    ///   tasks don't
    pub fn build(self) -> Result<WorkflowDefinition> {
        let start_condition = self
            .start_condition
            .ok_or_else(|| WorkflowError::InvalidDefinition("no start condition".into()))?;
        let end_condition = self
            .end_condition
            .ok_or_else(|| WorkflowError::InvalidDefinition("no end condition".into()))?;

        let condition_set: HashSet<&ConditionName> =
            self.conditions.iter().map(|c| &c.name).collect();

        let mut task_names = HashSet::new();
        for task in &self.tasks {
            if !task_names.insert(&task.name) {
                return Err(WorkflowError::InvalidDefinition(format!(
                    "duplicate task name '{}'",
                    task.name
                )));
            }

            for incoming in &task.incoming {
                if !condition_set.contains(incoming) {
                    return Err(WorkflowError::InvalidDefinition(format!(
                        "task '{}' references unknown incoming condition '{}'",
                        task.name, incoming
                    )));
                }
            }
            for outgoing in &task.outgoing {
                if !condition_set.contains(outgoing) {
                    return Err(WorkflowError::InvalidDefinition(format!(
                        "task '{}' references unknown outgoing condition '{}'",
                        task.name, outgoing
                    )));
                }
            }

            //: a 0-in task has no join to evaluate, a 0-out
            // task has no split to evaluate — both are malformed rather
            // than "trivially satisfied" (JoinKind/SplitKind have no
            // "none" variant, so an empty side can't be expressed as one).
            if task.incoming.is_empty() {
                return Err(WorkflowError::InvalidDefinition(format!(
                    "task '{}' has a join_kind but no incoming conditions",
                    task.name
                )));
            }
            if task.outgoing.is_empty() {
                return Err(WorkflowError::InvalidDefinition(format!(
                    "task '{}' has a split_kind but no outgoing conditions",
                    task.name
                )));
            }

            match (task.kind, &task.sub_definition) {
                (TaskKind::Composite, None) => {
                    return Err(WorkflowError::InvalidDefinition(format!(
                        "composite task '{}' has no sub_definition",
                        task.name
                    )));
                }
                (TaskKind::Human, Some(_)) | (TaskKind::Automated, Some(_)) => {
                    return Err(WorkflowError::InvalidDefinition(format!(
                        "non-composite task '{}' carries a sub_definition",
                        task.name
                    )));
                }
                _ => {}
            }
        }

        for condition in &self.conditions {
            let fed_by = self.tasks.iter().any(|t| t.outgoing.contains(&condition.name));
            let feeds = self.tasks.iter().any(|t| t.incoming.contains(&condition.name));

            if condition.name != start_condition && !fed_by {
                return Err(WorkflowError::InvalidDefinition(format!(
                    "condition '{}' is never produced by any task",
                    condition.name
                )));
            }
            if condition.name != end_condition && !feeds {
                return Err(WorkflowError::InvalidDefinition(format!(
                    "condition '{}' is never consumed by any task",
                    condition.name
                )));
            }
        }

        Ok(WorkflowDefinition {
            name: self.name,
            version: self.version,
            conditions: self.conditions,
            tasks: self.tasks,
            start_condition,
            end_condition,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::definition::{JoinKind, SplitKind};

    fn linear_definition() -> Result<WorkflowDefinition> {
        DefinitionBuilder::new("greeting", 1)
            .condition(ConditionDefinition::new("start", ConditionRole::Start))
            .condition(ConditionDefinition::new("end", ConditionRole::End))
            .task({
                let mut t = TaskDefinition::new(
                    "greet",
                    TaskKind::Automated,
                    JoinKind::Xor,
                    SplitKind::Xor,
                );
                t.incoming.push("start".into());
                t.outgoing.push("end".into());
                t
            })
            .build()
    }

    #[test]
    fn builds_a_valid_linear_workflow() {
        let def = linear_definition().expect("should build");
        assert_eq!(def.tasks.len(), 1);
        assert_eq!(def.start_condition, ConditionName::from("start"));
    }

    #[test]
    fn rejects_missing_start_condition() {
        let result = DefinitionBuilder::new("broken", 1)
            .condition(ConditionDefinition::new("end", ConditionRole::End))
            .build();
        assert!(matches!(result, Err(WorkflowError::InvalidDefinition(_))));
    }

    #[test]
    fn rejects_dangling_condition_reference() {
        let result = DefinitionBuilder::new("broken", 1)
            .condition(ConditionDefinition::new("start", ConditionRole::Start))
            .condition(ConditionDefinition::new("end", ConditionRole::End))
            .task({
                let mut t = TaskDefinition::new(
                    "greet",
                    TaskKind::Automated,
                    JoinKind::Xor,
                    SplitKind::Xor,
                );
                t.incoming.push("start".into());
                t.outgoing.push("nowhere".into());
                t
            })
            .build();
        assert!(matches!(result, Err(WorkflowError::InvalidDefinition(_))));
    }

    #[test]
    fn rejects_zero_in_task() {
        let result = DefinitionBuilder::new("broken", 1)
            .condition(ConditionDefinition::new("start", ConditionRole::Start))
            .condition(ConditionDefinition::new("end", ConditionRole::End))
            .task({
                let mut t = TaskDefinition::new(
                    "greet",
                    TaskKind::Automated,
                    JoinKind::And,
                    SplitKind::Xor,
                );
                t.outgoing.push("end".into());
                t
            })
            .build();
        assert!(matches!(result, Err(WorkflowError::InvalidDefinition(_))));
    }

    #[test]
    fn rejects_zero_out_task() {
        let result = DefinitionBuilder::new("broken", 1)
            .condition(ConditionDefinition::new("start", ConditionRole::Start))
            .condition(ConditionDefinition::new("end", ConditionRole::End))
            .task({
                let mut t = TaskDefinition::new(
                    "greet",
                    TaskKind::Automated,
                    JoinKind::Xor,
                    SplitKind::And,
                );
                t.incoming.push("start".into());
                t
            })
            .build();
        assert!(matches!(result, Err(WorkflowError::InvalidDefinition(_))));
    }

    #[test]
    fn rejects_composite_without_sub_definition() {
        let result = DefinitionBuilder::new("broken", 1)
            .condition(ConditionDefinition::new("start", ConditionRole::Start))
            .condition(ConditionDefinition::new("end", ConditionRole::End))
            .task({
                let mut t = TaskDefinition::new(
                    "delegate",
                    TaskKind::Composite,
                    JoinKind::Xor,
                    SplitKind::Xor,
                );
                t.incoming.push("start".into());
                t.outgoing.push("end".into());
                t
            })
            .build();
        assert!(matches!(result, Err(WorkflowError::InvalidDefinition(_))));
    }
}
