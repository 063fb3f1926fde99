// Enablement engine — marking-based join/split firing rules
//
//! Answers one question: does this task's marking over its incoming
//! conditions satisfy its `joinKind`. Firing (token consumption/
//! production) lives here too, since it's pure marking arithmetic with
//! no work-item or audit concerns of its own — `engine::scheduler` calls
//! into it and handles everything downstream of a successful fire.

use crate::config::OrJoinPolicy;
use crate::error::{Result, WorkflowError};
use crate::models::definition::{JoinKind, SplitKind, TaskDefinition, WorkflowDefinition};
use crate::models::ids::ConditionName;
use crate::models::instance::{Marking, WorkflowInstance};

/// "Explain, don't just return bool": which join conditions are/aren't
/// marked, not just whether the join as a whole is satisfied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnablementTrace {
    pub satisfied: bool,
    /// True when an OR-join has at least one marked incoming condition
    /// but an upstream task that still feeds one of the unmarked
    /// incoming conditions remains active —: the
    /// transient "pending" state, never an error a caller matches on.
    pub pending_or_join: bool,
    pub satisfied_conditions: Vec<ConditionName>,
    pub missing_conditions: Vec<ConditionName>,
}

impl EnablementTrace {
    fn not_satisfied(missing: Vec<ConditionName>) -> Self {
        EnablementTrace {
            satisfied: false,
            pending_or_join: false,
            satisfied_conditions: Vec::new(),
            missing_conditions: missing,
        }
    }
}

/// Is an upstream task (one that could still deposit a token into
/// `condition`) neither completed nor canceled? If so, an OR-join
/// waiting on `condition` can't yet be declared final.
fn has_active_upstream(
    definition: &WorkflowDefinition,
    instance: &WorkflowInstance,
    condition: &ConditionName,
) -> bool {
    definition.tasks_feeding(condition).into_iter().any(|t| {
        instance
            .task_instance(&t.name)
            .map(|ti| ti.is_active())
            .unwrap_or(true) // not yet instantiated — could still fire
    })
}

/// Evaluates whether `task` is enabled given the instance's current
/// marking.
pub fn evaluate_task(
    definition: &WorkflowDefinition,
    instance: &WorkflowInstance,
    task: &TaskDefinition,
    or_join_policy: OrJoinPolicy,
) -> EnablementTrace {
    let marked: Vec<ConditionName> = task
        .incoming
        .iter()
        .filter(|c| instance.marking.has_token(c))
        .cloned()
        .collect();
    let unmarked: Vec<ConditionName> = task
        .incoming
        .iter()
        .filter(|c| !instance.marking.has_token(c))
        .cloned()
        .collect();

    match task.join_kind {
        JoinKind::Xor => {
            if marked.is_empty() {
                EnablementTrace::not_satisfied(unmarked)
            } else {
                EnablementTrace {
                    satisfied: true,
                    pending_or_join: false,
                    satisfied_conditions: marked,
                    missing_conditions: Vec::new(),
                }
            }
        }
        JoinKind::And => {
            if unmarked.is_empty() {
                EnablementTrace {
                    satisfied: true,
                    pending_or_join: false,
                    satisfied_conditions: marked,
                    missing_conditions: Vec::new(),
                }
            } else {
                EnablementTrace::not_satisfied(unmarked)
            }
        }
        JoinKind::Or => {
            if marked.is_empty() {
                return EnablementTrace::not_satisfied(unmarked);
            }
            let still_pending = match or_join_policy {
                OrJoinPolicy::FireEarly => false,
                OrJoinPolicy::WaitForUpstream => unmarked
                    .iter()
                    .any(|c| has_active_upstream(definition, instance, c)),
            };
            EnablementTrace {
                satisfied: !still_pending,
                pending_or_join: still_pending,
                satisfied_conditions: marked,
                missing_conditions: unmarked,
            }
        }
    }
}

pub fn enabled_tasks<'a>(
    definition: &'a WorkflowDefinition,
    instance: &WorkflowInstance,
    or_join_policy: OrJoinPolicy,
) -> Vec<&'a TaskDefinition> {
    definition
        .tasks
        .iter()
        .filter(|t| evaluate_task(definition, instance, t, or_join_policy).satisfied)
        .collect()
}

/// Consumes the tokens a fired task's join requires. Caller must have
/// already confirmed `evaluate_task(..).satisfied`.
fn consume(marking: &mut Marking, task: &TaskDefinition, trace: &EnablementTrace) {
    match task.join_kind {
        JoinKind::Xor => {
            // exactly one — the first marked condition in declaration order
            if let Some(c) = trace.satisfied_conditions.first() {
                marking.take_token(c);
            }
        }
        JoinKind::And => {
            for c in &task.incoming {
                marking.take_token(c);
            }
        }
        JoinKind::Or => {
            for c in &trace.satisfied_conditions {
                marking.take_token(c);
            }
        }
    }
}

/// Produces tokens for a fired task's split. `chosen` selects outgoing
/// conditions for `Xor`/`Or` splits (ignored, and validated empty, for
/// `And`, which always produces into every outgoing condition).
fn produce(
    marking: &mut Marking,
    task: &TaskDefinition,
    chosen: &[ConditionName],
) -> Result<()> {
    match task.split_kind {
        SplitKind::And => {
            for c in &task.outgoing {
                marking.add_token(c.clone());
            }
        }
        SplitKind::Xor => {
            if chosen.len() != 1 || !task.outgoing.contains(&chosen[0]) {
                return Err(WorkflowError::InvalidDefinition(format!(
                    "xor-split task '{}' requires exactly one valid chosen outgoing condition",
                    task.name
                )));
            }
            marking.add_token(chosen[0].clone());
        }
        SplitKind::Or => {
            if chosen.is_empty() || chosen.iter().any(|c| !task.outgoing.contains(c)) {
                return Err(WorkflowError::InvalidDefinition(format!(
                    "or-split task '{}' requires a non-empty valid subset of outgoing conditions",
                    task.name
                )));
            }
            for c in chosen {
                marking.add_token(c.clone());
            }
        }
    }
    Ok(())
}

/// Fires `task`: consumes its join's tokens and produces its split's
/// tokens into `instance.marking`. Returns `NotEnabled` if the task
/// isn't currently satisfied.
pub fn fire(
    definition: &WorkflowDefinition,
    instance: &mut WorkflowInstance,
    task: &TaskDefinition,
    chosen_outgoing: &[ConditionName],
    or_join_policy: OrJoinPolicy,
) -> Result<()> {
    let trace = evaluate_task(definition, instance, task, or_join_policy);
    if !trace.satisfied {
        return Err(WorkflowError::NotEnabled {
            task: task.name.to_string(),
        });
    }
    consume(&mut instance.marking, task, &trace);
    produce(&mut instance.marking, task, chosen_outgoing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::builder::DefinitionBuilder;
    use crate::models::definition::{ConditionDefinition, ConditionRole, TaskKind};
    use crate::models::ids::AggregateId;
    use std::collections::HashMap;

    fn and_join_definition() -> WorkflowDefinition {
        DefinitionBuilder::new("and-join", 1)
            .condition(ConditionDefinition::new("start", ConditionRole::Start))
            .condition(ConditionDefinition::new("a", ConditionRole::Internal))
            .condition(ConditionDefinition::new("b", ConditionRole::Internal))
            .condition(ConditionDefinition::new("end", ConditionRole::End))
            .task({
                let mut t =
                    TaskDefinition::new("split", TaskKind::Automated, JoinKind::Xor, SplitKind::And);
                t.incoming.push("start".into());
                t.outgoing.push("a".into());
                t.outgoing.push("b".into());
                t
            })
            .task({
                let mut t =
                    TaskDefinition::new("join", TaskKind::Automated, JoinKind::And, SplitKind::Xor);
                t.incoming.push("a".into());
                t.incoming.push("b".into());
                t.outgoing.push("end".into());
                t
            })
            .build()
            .unwrap()
    }

    fn blank_instance(definition: &WorkflowDefinition) -> WorkflowInstance {
        let id = crate::models::ids::WorkflowId::new();
        WorkflowInstance {
            id,
            definition_name: definition.name.clone(),
            definition_version: definition.version,
            aggregate_id: AggregateId::from("agg"),
            status: crate::models::instance::WorkflowStatus::Running,
            marking: Marking::new(),
            tasks: HashMap::new(),
            parent_workflow_id: None,
            root_workflow_id: id,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn and_split_then_and_join_requires_both_tokens() {
        let def = and_join_definition();
        let mut instance = blank_instance(&def);
        instance.marking.add_token("start".into());

        let split = def.task(&"split".into()).unwrap();
        fire(&def, &mut instance, split, &["a".into()], OrJoinPolicy::WaitForUpstream).unwrap();
        assert!(instance.marking.has_token(&"a".into()));
        assert!(instance.marking.has_token(&"b".into()));

        let join = def.task(&"join".into()).unwrap();
        let trace = evaluate_task(&def, &instance, join, OrJoinPolicy::WaitForUpstream);
        assert!(trace.satisfied);
        fire(&def, &mut instance, join, &["end".into()], OrJoinPolicy::WaitForUpstream).unwrap();
        assert!(instance.marking.has_token(&"end".into()));
        assert!(!instance.marking.has_token(&"a".into()));
        assert!(!instance.marking.has_token(&"b".into()));
    }

    #[test]
    fn and_join_not_satisfied_with_one_token() {
        let def = and_join_definition();
        let mut instance = blank_instance(&def);
        instance.marking.add_token("a".into());
        let join = def.task(&"join".into()).unwrap();
        let trace = evaluate_task(&def, &instance, join, OrJoinPolicy::WaitForUpstream);
        assert!(!trace.satisfied);
        assert_eq!(trace.missing_conditions, vec!["b".into()]);
    }

    #[test]
    fn xor_split_rejects_multiple_chosen_outgoing() {
        let def = and_join_definition();
        let mut instance = blank_instance(&def);
        instance.marking.add_token("start".into());
        let split = def.task(&"split".into()).unwrap();
        let err = fire(
            &def,
            &mut instance,
            split,
            &["a".into(), "b".into()],
            OrJoinPolicy::WaitForUpstream,
        );
        assert!(err.is_err());
    }
}
