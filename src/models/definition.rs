// Workflow definitions — immutable Petri-net-with-typed-joins specifications
//
//! # Workflow Definitions
//!
//! A marking-based model: a bipartite graph of `Task`s and `Condition`s
//! (places), where each task carries a `joinKind`/`splitKind` governing
//! how it consumes and produces tokens.
//!
//! A `WorkflowDefinition` is immutable once built by `DefinitionBuilder`
//! (`models::builder`) — build once, validate, never mutate again.

use super::ids::{ConditionName, DefinitionRef, SchemaId, TaskName};
use serde::{Deserialize, Serialize};

/// How a task consumes tokens from its incoming conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinKind {
    /// Any one incoming condition having a token enables the task.
    Xor,
    /// Every incoming condition must hold a token.
    And,
    /// At least one incoming holds a token, and no further token can
    /// still arrive — approximated by upstream-terminal reachability.
    Or,
}

/// How a completed task produces tokens into its outgoing conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SplitKind {
    /// Exactly one outgoing condition, chosen by the completion callback.
    Xor,
    /// One token into every outgoing condition.
    And,
    /// Tokens into a callback-chosen subset of outgoing conditions.
    Or,
}

/// Whether a task fires on its own, waits for a human, or delegates to
/// a sub-workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskKind {
    Human,
    Automated,
    Composite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionRole {
    Start,
    End,
    Internal,
}

/// A predicate referenced by name against a scope module. The actual predicate is supplied by
/// the host's `auth::AuthorizationService`; the definition only carries
/// the scope it requires, keeping `WorkflowDefinition` plain data.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScopeRequirement {
    pub module: String,
    pub capability: String,
}

impl ScopeRequirement {
    pub fn new<M: Into<String>, C: Into<String>>(module: M, capability: C) -> Self {
        ScopeRequirement {
            module: module.into(),
            capability: capability.into(),
        }
    }

    pub fn qualified(&self) -> String {
        format!("{}:{}", self.module, self.capability)
    }
}

/// Offer template attached to a human task: the audience
/// a created work item is shown to, before any particular user claims it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferTemplate {
    pub required_scope: ScopeRequirement,
    /// Pre-assigns the work item to a single user, bypassing audience
    /// matching (still subject to `claimPolicy`).
    pub assigned_user: Option<super::ids::UserId>,
    /// Restricts visibility/offer to members of this group.
    pub group_restriction: Option<super::ids::GroupName>,
    /// Auto-create a work item for this task the moment it becomes
    /// enabled, rather than waiting for an explicit
    /// `InitializeWorkItem` call.
    pub on_enabled: bool,
    ///: `canClaim = requiredScope ∈ EffectiveScopes ∧
    /// claimPolicy(actor, state)`. A second scope, checked in addition to
    /// `required_scope`, that the claiming actor must also hold — lets a
    /// task narrow its claim audience below its visibility audience
    /// (e.g. visible to all `finance:staff`, claimable only by
    /// `finance:senior-approve`).
    pub claim_policy: Option<ScopeRequirement>,
}

impl OfferTemplate {
    pub fn new(required_scope: ScopeRequirement) -> Self {
        OfferTemplate {
            required_scope,
            assigned_user: None,
            group_restriction: None,
            on_enabled: false,
            claim_policy: None,
        }
    }

    pub fn auto_offer(mut self) -> Self {
        self.on_enabled = true;
        self
    }

    pub fn assigned_to(mut self, user: super::ids::UserId) -> Self {
        self.assigned_user = Some(user);
        self
    }

    pub fn with_claim_policy(mut self, policy: ScopeRequirement) -> Self {
        self.claim_policy = Some(policy);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionDefinition {
    pub name: ConditionName,
    pub role: ConditionRole,
}

impl ConditionDefinition {
    pub fn new<N: Into<ConditionName>>(name: N, role: ConditionRole) -> Self {
        ConditionDefinition {
            name: name.into(),
            role,
        }
    }
}

/// One node in the bipartite graph — a transition in the Petri-net sense.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDefinition {
    pub name: TaskName,
    pub kind: TaskKind,
    pub join_kind: JoinKind,
    pub split_kind: SplitKind,
    pub incoming: Vec<ConditionName>,
    pub outgoing: Vec<ConditionName>,
    pub start_policy: Option<ScopeRequirement>,
    pub write_policy: Option<ScopeRequirement>,
    pub offer: Option<OfferTemplate>,
    /// Present only for `kind == Composite`.
    pub sub_definition: Option<DefinitionRef>,
    /// Registered codec (`models::schema::PayloadRegistry`) the engine
    /// validates a task's input/output payload against. `None` skips
    /// validation entirely.
    pub payload_schema: Option<SchemaId>,
}

impl TaskDefinition {
    pub fn new<N: Into<TaskName>>(
        name: N,
        kind: TaskKind,
        join_kind: JoinKind,
        split_kind: SplitKind,
    ) -> Self {
        TaskDefinition {
            name: name.into(),
            kind,
            join_kind,
            split_kind,
            incoming: Vec::new(),
            outgoing: Vec::new(),
            start_policy: None,
            write_policy: None,
            offer: None,
            sub_definition: None,
            payload_schema: None,
        }
    }

    pub fn is_human(&self) -> bool {
        matches!(self.kind, TaskKind::Human)
    }

    pub fn is_automated(&self) -> bool {
        matches!(self.kind, TaskKind::Automated)
    }

    pub fn is_composite(&self) -> bool {
        matches!(self.kind, TaskKind::Composite)
    }

    pub fn with_payload_schema(mut self, schema: SchemaId) -> Self {
        self.payload_schema = Some(schema);
        self
    }
}

/// Immutable after `DefinitionBuilder::build`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    pub name: String,
    pub version: u32,
    pub conditions: Vec<ConditionDefinition>,
    pub tasks: Vec<TaskDefinition>,
    pub start_condition: ConditionName,
    pub end_condition: ConditionName,
}

impl WorkflowDefinition {
    pub fn definition_ref(&self) -> DefinitionRef {
        DefinitionRef::new(self.name.clone(), self.version)
    }

    pub fn task(&self, name: &TaskName) -> Option<&TaskDefinition> {
        self.tasks.iter().find(|t| &t.name == name)
    }

    pub fn condition(&self, name: &ConditionName) -> Option<&ConditionDefinition> {
        self.conditions.iter().find(|c| &c.name == name)
    }

    /// Tasks that consume a token from `condition`.
    pub fn tasks_fed_by<'a>(&'a self, condition: &ConditionName) -> Vec<&'a TaskDefinition> {
        self.tasks
            .iter()
            .filter(|t| t.incoming.contains(condition))
            .collect()
    }

    /// Tasks that can place a token into `condition`.
    pub fn tasks_feeding<'a>(&'a self, condition: &ConditionName) -> Vec<&'a TaskDefinition> {
        self.tasks
            .iter()
            .filter(|t| t.outgoing.contains(condition))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_requirement_qualified_name() {
        let s = ScopeRequirement::new("greeting", "write");
        assert_eq!(s.qualified(), "greeting:write");
    }

    #[test]
    fn task_kind_predicates() {
        let t = TaskDefinition::new("submit", TaskKind::Human, JoinKind::Xor, SplitKind::Xor);
        assert!(t.is_human());
        assert!(!t.is_automated());
        assert!(!t.is_composite());
    }
}
