// Runtime scheduler — the transaction-scoped public operations
//
//! Each public operation here is one host transaction — it loads
//! whatever it needs from `Store`, mutates in memory, then persists and
//! appends audit spans before returning. After any operation that
//! produces a token, the scheduler runs the fixpoint rule: re-evaluate
//! enablement until no further automated task fires and no further task
//! becomes newly enabled, cascading exactly as far as the marking
//! allows and no further.

use super::callbacks::DomainCallbacks;
use super::composite::CompositeLink;
use super::enablement;
use super::lifecycle;
use crate::audit::span::{AuditSpan, SpanKind};
use crate::audit::trace::{AuditContext, AuditTrace};
use crate::auth::service::AuthorizationService;
use crate::config::EngineConfig;
use crate::error::{Result, WorkflowError};
use crate::models::definition::{ConditionName, TaskDefinition, TaskKind, WorkflowDefinition};
use crate::models::host::{Clock, CurrentUser, Store};
use crate::models::ids::{AggregateId, TaskInstanceRef, TaskName, TraceId, WorkItemId, WorkflowId};
use crate::models::instance::{Marking, TaskInstance, TaskInstanceStatus, WorkflowInstance, WorkflowStatus};
use crate::models::schema::PayloadRegistry;
use crate::models::work_item::WorkItem;
use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// The transaction-scoped orchestrator. One `Engine` serves every
/// definition version; `engine::version::WorkflowHandle` binds it to a
/// single `(name, version)` plus that version's `DomainCallbacks`.
pub struct Engine {
    pub store: Arc<dyn Store>,
    pub auth: Arc<AuthorizationService>,
    pub clock: Arc<dyn Clock>,
    pub config: EngineConfig,
    pub payload_registry: Arc<PayloadRegistry>,
}

impl Engine {
    pub fn new(store: Arc<dyn Store>, auth: Arc<AuthorizationService>, clock: Arc<dyn Clock>) -> Self {
        Engine {
            store,
            auth,
            clock,
            config: EngineConfig::default(),
            payload_registry: Arc::new(PayloadRegistry::new()),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_payload_registry(mut self, registry: Arc<PayloadRegistry>) -> Self {
        self.payload_registry = registry;
        self
    }

    /// Builds the `AuditContext` for an operation on `instance`, always
    /// rooted at the workflow's `root_workflow_id` so every span across
    /// the workflow's lifetime — and across a composite task's
    /// sub-workflows — lands in the same trace.
    fn trace_context(&self, instance: &WorkflowInstance) -> AuditContext {
        AuditContext::for_trace(TraceId::from(instance.root_workflow_id.as_uuid()))
    }

    /// Wraps a domain callback invocation: maps any error to
    /// `WorkflowError::CallbackFailed`, and — when
    /// `config.catch_callback_panics` is set — also catches a panic
    /// instead of letting it unwind into the host.
    fn invoke_callback<T>(
        &self,
        task: &TaskDefinition,
        f: impl FnOnce() -> Result<T> + std::panic::UnwindSafe,
    ) -> Result<T> {
        if !self.config.catch_callback_panics {
            return f().map_err(|e| WorkflowError::CallbackFailed {
                task: task.name.to_string(),
                detail: e.to_string(),
            });
        }
        match std::panic::catch_unwind(f) {
            Ok(result) => result.map_err(|e| WorkflowError::CallbackFailed {
                task: task.name.to_string(),
                detail: e.to_string(),
            }),
            Err(_) => {
                tracing::warn!(task = %task.name, "task callback panicked");
                Err(WorkflowError::CallbackFailed {
                    task: task.name.to_string(),
                    detail: "callback panicked".into(),
                })
            }
        }
    }

    /// Runs the fixpoint rule: enable every task whose
    /// join is satisfied, immediately fire automated tasks that have a
    /// registered callback, and repeat until the marking stops
    /// changing. Human and callback-less automated tasks stop the
    /// cascade at `Enabled` — a human actor or a later explicit call
    /// advances them from there. Newly-offered work items are returned
    /// rather than persisted here, so the caller's transaction controls
    /// when they become visible.
    async fn run_fixpoint(
        &self,
        definition: &WorkflowDefinition,
        callbacks: &DomainCallbacks,
        instance: &mut WorkflowInstance,
        ctx: &AuditContext,
        now: DateTime<Utc>,
    ) -> Result<Vec<WorkItem>> {
        let mut offered = Vec::new();
        loop {
            let mut changed = false;

            for task in &definition.tasks {
                let trace = enablement::evaluate_task(definition, instance, task, self.config.or_join_policy);
                if !trace.satisfied {
                    continue;
                }
                let already_progressed = instance
                    .tasks
                    .get(&task.name)
                    .map(|ti| !matches!(ti.status, TaskInstanceStatus::NotEnabled))
                    .unwrap_or(false);
                if already_progressed {
                    continue;
                }

                self.enable_task_instance(instance, task, now);
                changed = true;
                let span = ctx.record(
                    instance.id,
                    Some(task.name.clone()),
                    SpanKind::TaskEnabled,
                    None,
                    now,
                    serde_json::json!({ "instance": &*instance }),
                );
                self.store.append_span(span).await?;

                match task.kind {
                    TaskKind::Automated => {
                        if let Some(callback) = callbacks.task(&task.name) {
                            tracing::debug!(task = %task.name, workflow_id = %instance.id, "firing automated task");
                            self.fire_automated(definition, instance, task, callback.as_ref(), now)?;
                            let span = ctx.record(
                                instance.id,
                                Some(task.name.clone()),
                                SpanKind::TaskCompleted,
                                None,
                                now,
                                serde_json::json!({ "instance": &*instance }),
                            );
                            self.store.append_span(span).await?;
                        }
                    }
                    TaskKind::Human => {
                        if let Some(offer) = &task.offer {
                            if offer.on_enabled {
                                let item = self.build_offer(instance, task, offer, now)?;
                                let span = ctx.record(
                                    instance.id,
                                    Some(task.name.clone()),
                                    SpanKind::WorkItemOffered,
                                    None,
                                    now,
                                    serde_json::json!({ "workItemId": item.id }),
                                );
                                self.store.append_span(span).await?;
                                offered.push(item);
                            }
                        }
                    }
                    TaskKind::Composite => {
                        // Sub-workflow instantiation is driven by
                        // `engine::composite` once this task reaches
                        // `Enabled`; nothing further to do here.
                    }
                }
            }

            if instance.marking.has_token(&definition.end_condition) {
                instance.status = WorkflowStatus::Completed;
            }

            if !changed {
                break;
            }
        }
        Ok(offered)
    }

    fn enable_task_instance(&self, instance: &mut WorkflowInstance, task: &TaskDefinition, now: DateTime<Utc>) {
        let entry = instance
            .tasks
            .entry(task.name.clone())
            .or_insert_with(|| TaskInstance::new(instance.id, task.name.clone()));
        if entry.status == TaskInstanceStatus::Canceled {
            entry.reenable(now);
        } else {
            entry.status = TaskInstanceStatus::Enabled;
            entry.enabled_at = Some(now);
        }
    }

    fn fire_automated(
        &self,
        definition: &WorkflowDefinition,
        instance: &mut WorkflowInstance,
        task: &TaskDefinition,
        callback: &dyn super::callbacks::TaskCallback,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let ctx = super::callbacks::TaskCallbackContext {
            task,
            workflow_id: instance.id,
            aggregate_id: &instance.aggregate_id,
        };
        self.invoke_callback(task, std::panic::AssertUnwindSafe(|| callback.on_start(&ctx)))?;
        let outcome =
            self.invoke_callback(task, std::panic::AssertUnwindSafe(|| callback.on_complete(&ctx)))?;
        enablement::fire(
            definition,
            instance,
            task,
            &outcome.chosen_outgoing,
            self.config.or_join_policy,
        )?;
        if let Some(ti) = instance.tasks.get_mut(&task.name) {
            ti.status = TaskInstanceStatus::Completed;
            ti.completed_at = Some(now);
            ti.output = Some(outcome.payload);
        }
        Ok(())
    }

    fn build_offer(
        &self,
        instance: &WorkflowInstance,
        task: &TaskDefinition,
        offer: &crate::models::definition::OfferTemplate,
        now: DateTime<Utc>,
    ) -> Result<WorkItem> {
        let generation = instance.tasks.get(&task.name).map(|ti| ti.generation).unwrap_or(0);
        let mut item = WorkItem::new(
            WorkItemId::new(),
            TaskInstanceRef {
                workflow_id: instance.id,
                task_name: task.name.clone(),
                generation,
            },
        );
        lifecycle::offer(&mut item, offer.group_restriction.clone(), now)?;
        Ok(item)
    }

    /// `InitializeRoot`: create a new workflow instance,
    /// place a token on the start condition, run `Initialize`, and run
    /// the fixpoint rule.
    pub async fn initialize_root(
        &self,
        definition: &WorkflowDefinition,
        callbacks: &DomainCallbacks,
        aggregate_id: AggregateId,
    ) -> Result<WorkflowInstance> {
        self.initialize_instance(definition, callbacks, aggregate_id, None, None).await
    }

    /// Same as `initialize_root`, but links the new instance to a
    /// parent via `parent_workflow_id` — used by `engine::composite`
    /// when a composite task spawns a sub-workflow. The
    /// child shares the parent's `root_workflow_id`, so its spans land
    /// in the same trace as the root workflow's.
    pub async fn initialize_child(
        &self,
        definition: &WorkflowDefinition,
        callbacks: &DomainCallbacks,
        aggregate_id: AggregateId,
        parent_workflow_id: WorkflowId,
        root_workflow_id: WorkflowId,
    ) -> Result<WorkflowInstance> {
        self.initialize_instance(
            definition,
            callbacks,
            aggregate_id,
            Some(parent_workflow_id),
            Some(root_workflow_id),
        )
        .await
    }

    async fn initialize_instance(
        &self,
        definition: &WorkflowDefinition,
        callbacks: &DomainCallbacks,
        aggregate_id: AggregateId,
        parent_workflow_id: Option<WorkflowId>,
        root_workflow_id: Option<WorkflowId>,
    ) -> Result<WorkflowInstance> {
        let now = self.clock.now();
        let workflow_id = WorkflowId::new();
        let root_workflow_id = root_workflow_id.unwrap_or(workflow_id);
        let ctx = AuditContext::for_trace(TraceId::from(root_workflow_id.as_uuid()));

        let init_payload = callbacks.initialize(&aggregate_id)?;

        let mut instance = WorkflowInstance {
            id: workflow_id,
            definition_name: definition.name.clone(),
            definition_version: definition.version,
            aggregate_id,
            status: WorkflowStatus::Running,
            marking: Marking::new(),
            tasks: HashMap::new(),
            parent_workflow_id,
            root_workflow_id,
            created_at: now,
            updated_at: now,
        };
        instance.marking.add_token(definition.start_condition.clone());

        let offered = self.run_fixpoint(definition, callbacks, &mut instance, &ctx, now).await?;
        for item in offered {
            self.store.insert_work_item(item).await?;
        }

        instance.updated_at = now;
        self.store.insert_instance(instance.clone()).await?;
        if instance.parent_workflow_id.is_none() {
            self.store
                .insert_trace(AuditTrace {
                    trace_id: ctx.trace_id(),
                    root_workflow_id,
                    started_at: now,
                })
                .await?;
        }
        let span = ctx.record(
            instance.id,
            None,
            SpanKind::WorkflowInitialized,
            None,
            now,
            serde_json::json!({ "instance": &instance, "initPayload": init_payload }),
        );
        self.store.append_span(span).await?;
        Ok(instance)
    }

    /// `InitializeWorkItem`: explicitly create the work
    /// item for an already-enabled human task (used when the task's
    /// offer isn't `onEnabled`). `InitializeWorkItem(target, payload,
    /// actor) → workItemId | NotEnabled | AuthzDenied | SchemaMismatch`:
    /// `actor` must satisfy the task's `start_policy` (if any), and
    /// `payload` must satisfy its registered `payload_schema` (if any).
    pub async fn initialize_work_item(
        &self,
        definition: &WorkflowDefinition,
        workflow_id: WorkflowId,
        task_name: &TaskName,
        payload: Value,
        actor: &CurrentUser,
    ) -> Result<WorkItem> {
        let now = self.clock.now();
        let mut instance = self.load_instance(workflow_id).await?;
        let task = definition
            .task(task_name)
            .ok_or_else(|| WorkflowError::NotFound(format!("task '{}'", task_name)))?;

        let task_instance = instance
            .tasks
            .get(task_name)
            .ok_or_else(|| WorkflowError::NotEnabled {
                task: task_name.to_string(),
            })?;
        if !task_instance.is_active() {
            return Err(WorkflowError::NotEnabled {
                task: task_name.to_string(),
            });
        }

        if let Some(start_policy) = &task.start_policy {
            self.auth.authorize(actor, start_policy)?;
        }
        self.payload_registry.validate_task(task, &payload)?;

        let offer = task.offer.as_ref().ok_or_else(|| {
            WorkflowError::InvalidDefinition(format!("task '{}' is not human", task_name))
        })?;
        let item = self.build_offer(&instance, task, offer, now)?;

        self.store.insert_work_item(item.clone()).await?;
        let ctx = self.trace_context(&instance);
        let span = ctx.record(
            workflow_id,
            Some(task_name.clone()),
            SpanKind::WorkItemOffered,
            Some(actor.user_id.clone()),
            now,
            serde_json::json!({ "workItemId": item.id, "payload": payload }),
        );
        self.store.append_span(span).await?;
        instance.updated_at = now;
        self.store.patch_instance(instance).await?;
        Ok(item)
    }

    pub async fn claim_work_item(
        &self,
        definition: &WorkflowDefinition,
        user: &CurrentUser,
        work_item_id: WorkItemId,
    ) -> Result<WorkItem> {
        let now = self.clock.now();
        let mut item = self.load_work_item(work_item_id).await?;
        let task = definition
            .task(&item.task.task_name)
            .ok_or_else(|| WorkflowError::NotFound(format!("task '{}'", item.task.task_name)))?;
        let offer = task.offer.as_ref().ok_or_else(|| {
            WorkflowError::InvalidDefinition(format!("task '{}' is not human", task.name))
        })?;
        self.auth.authorize_claim(user, offer)?;

        lifecycle::claim(&mut item, user.user_id.clone(), now)?;
        self.store.patch_work_item(item.clone()).await?;

        let instance = self.load_instance(item.task.workflow_id).await?;
        let ctx = self.trace_context(&instance);
        let span = ctx.record(
            item.task.workflow_id,
            Some(item.task.task_name.clone()),
            SpanKind::WorkItemClaimed,
            Some(user.user_id.clone()),
            now,
            serde_json::json!({ "workItemId": item.id }),
        );
        self.store.append_span(span).await?;
        Ok(item)
    }

    /// `StartWorkItem`. Normally the claimant starts their
    /// own claimed item; if the item is still unclaimed and the task
    /// defines a `start_policy`,
    /// an actor who satisfies that policy claims-and-starts it in one
    /// transaction.
    pub async fn start_work_item(
        &self,
        definition: &WorkflowDefinition,
        user: &CurrentUser,
        work_item_id: WorkItemId,
    ) -> Result<WorkItem> {
        let now = self.clock.now();
        let mut item = self.load_work_item(work_item_id).await?;
        match item.claimed_by.as_ref() {
            Some(claimant) if claimant == &user.user_id => {}
            Some(_) => {
                return Err(WorkflowError::AuthzDenied {
                    actor: user.user_id.to_string(),
                    required_scope: "claimant-only".into(),
                });
            }
            None => {
                let task = definition
                    .task(&item.task.task_name)
                    .ok_or_else(|| WorkflowError::NotFound(format!("task '{}'", item.task.task_name)))?;
                let start_policy = task.start_policy.as_ref().ok_or_else(|| WorkflowError::AuthzDenied {
                    actor: user.user_id.to_string(),
                    required_scope: "claimant-only".into(),
                })?;
                self.auth.authorize(user, start_policy)?;
                lifecycle::claim(&mut item, user.user_id.clone(), now)?;
                self.store.patch_work_item(item.clone()).await?;
            }
        }
        lifecycle::start(&mut item, now)?;
        self.store.patch_work_item(item.clone()).await?;

        let mut instance = self.load_instance(item.task.workflow_id).await?;
        if let Some(ti) = instance.tasks.get_mut(&item.task.task_name) {
            ti.status = TaskInstanceStatus::Started;
            ti.started_at = Some(now);
        }
        instance.updated_at = now;
        self.store.patch_instance(instance.clone()).await?;

        let ctx = self.trace_context(&instance);
        let span = ctx.record(
            item.task.workflow_id,
            Some(item.task.task_name.clone()),
            SpanKind::TaskStarted,
            Some(user.user_id.clone()),
            now,
            serde_json::json!({ "workItemId": item.id }),
        );
        self.store.append_span(span).await?;
        Ok(item)
    }

    /// `CompleteWorkItem`: completes the claimant's work
    /// item, fires the underlying task (consuming its join's tokens and
    /// producing its split's tokens), then runs the fixpoint rule so
    /// any downstream tasks the new tokens enable progress in the same
    /// transaction.
    pub async fn complete_work_item(
        &self,
        definition: &WorkflowDefinition,
        callbacks: &DomainCallbacks,
        user: &CurrentUser,
        work_item_id: WorkItemId,
        result: Value,
        chosen_outgoing: &[ConditionName],
    ) -> Result<WorkflowInstance> {
        let now = self.clock.now();
        let mut item = self.load_work_item(work_item_id).await?;
        if item.claimed_by.as_ref() != Some(&user.user_id) {
            return Err(WorkflowError::AuthzDenied {
                actor: user.user_id.to_string(),
                required_scope: "claimant-only".into(),
            });
        }
        let task = definition
            .task(&item.task.task_name)
            .ok_or_else(|| WorkflowError::NotFound(format!("task '{}'", item.task.task_name)))?;
        if let Some(write_policy) = &task.write_policy {
            self.auth.authorize(user, write_policy)?;
        }
        self.payload_registry.validate_task(task, &result)?;

        lifecycle::complete(&mut item, result.clone(), now)?;
        self.store.patch_work_item(item.clone()).await?;

        let mut instance = self.load_instance(item.task.workflow_id).await?;
        enablement::fire(definition, &mut instance, task, chosen_outgoing, self.config.or_join_policy)?;
        if let Some(ti) = instance.tasks.get_mut(&task.name) {
            ti.status = TaskInstanceStatus::Completed;
            ti.completed_at = Some(now);
            ti.output = Some(result);
        }

        let ctx = self.trace_context(&instance);
        let span = ctx.record(
            instance.id,
            Some(task.name.clone()),
            SpanKind::WorkItemCompleted,
            Some(user.user_id.clone()),
            now,
            serde_json::json!({ "workItemId": item.id }),
        );
        self.store.append_span(span).await?;

        let offered = self.run_fixpoint(definition, callbacks, &mut instance, &ctx, now).await?;
        for item in offered {
            self.store.insert_work_item(item).await?;
        }

        instance.updated_at = now;
        self.store.patch_instance(instance.clone()).await?;
        let span = ctx.record(
            instance.id,
            Some(task.name.clone()),
            SpanKind::TaskCompleted,
            Some(user.user_id.clone()),
            now,
            serde_json::json!({ "instance": &instance }),
        );
        self.store.append_span(span).await?;
        Ok(instance)
    }

    pub async fn cancel_work_item(&self, work_item_id: WorkItemId) -> Result<WorkItem> {
        let mut item = self.load_work_item(work_item_id).await?;
        lifecycle::cancel(&mut item)?;
        self.store.patch_work_item(item.clone()).await?;

        let mut instance = self.load_instance(item.task.workflow_id).await?;
        if let Some(ti) = instance.tasks.get_mut(&item.task.task_name) {
            ti.status = TaskInstanceStatus::Canceled;
        }
        let now = self.clock.now();
        instance.updated_at = now;
        self.store.patch_instance(instance.clone()).await?;

        let ctx = self.trace_context(&instance);
        let span = ctx.record(
            item.task.workflow_id,
            Some(item.task.task_name.clone()),
            SpanKind::TaskCanceled,
            None,
            now,
            serde_json::json!({ "workItemId": item.id }),
        );
        self.store.append_span(span).await?;
        Ok(item)
    }

    /// `CancelWorkflow`: cancels every active task
    /// instance, marks the instance `Canceled`, and recursively cancels
    /// any composite sub-workflow still running underneath it. Returns
    /// a boxed future since an async fn can't otherwise recurse into
    /// itself.
    pub fn cancel_workflow<'a>(&'a self, workflow_id: WorkflowId) -> BoxFuture<'a, Result<WorkflowInstance>> {
        async move {
            let mut instance = self.load_instance(workflow_id).await?;
            let now = self.clock.now();

            for (task_name, ti) in instance.tasks.iter_mut() {
                if ti.is_active() {
                    ti.status = TaskInstanceStatus::Canceled;
                    let _ = task_name;
                }
            }

            for ti in instance.tasks.values() {
                if let Some(output) = &ti.output {
                    if let Ok(link) = serde_json::from_value::<CompositeLink>(output.clone()) {
                        if let Some(child) = self.store.get_instance(link.child_workflow_id).await? {
                            if !matches!(
                                child.status,
                                WorkflowStatus::Completed | WorkflowStatus::Canceled
                            ) {
                                self.cancel_workflow(link.child_workflow_id).await?;
                            }
                        }
                    }
                }
            }

            instance.status = WorkflowStatus::Canceled;
            instance.updated_at = now;
            self.store.patch_instance(instance.clone()).await?;

            let ctx = self.trace_context(&instance);
            let span = ctx.record(
                instance.id,
                None,
                SpanKind::WorkflowCanceled,
                None,
                now,
                serde_json::json!({ "instance": &instance }),
            );
            self.store.append_span(span).await?;
            Ok(instance)
        }
        .boxed()
    }

    /// `GetTrace`/`ListRecentTraces`: audit-trace metadata
    /// backed directly by `Store`, without replaying spans.
    pub async fn get_trace(&self, trace_id: TraceId) -> Result<Option<AuditTrace>> {
        self.store.get_trace(trace_id).await
    }

    pub async fn list_recent_traces(&self, limit: usize) -> Result<Vec<AuditTrace>> {
        self.store.list_recent_traces(limit).await
    }

    pub async fn get_trace_spans(&self, trace_id: TraceId) -> Result<Vec<AuditSpan>> {
        self.store.get_spans_for_trace(trace_id).await
    }

    /// `GetKeyEvents`: the subset of a workflow's spans
    /// worth surfacing in a human-facing timeline.
    pub async fn get_key_events(&self, workflow_id: WorkflowId) -> Result<Vec<AuditSpan>> {
        crate::audit::reconstruct::get_key_events(self.store.as_ref(), workflow_id).await
    }

    /// `GetChildWorkflowInstances`: every composite
    /// sub-workflow spawned directly under `parent_workflow_id`.
    pub async fn get_child_workflow_instances(&self, parent_workflow_id: WorkflowId) -> Result<Vec<WorkflowInstance>> {
        crate::audit::reconstruct::get_child_workflow_instances(self.store.as_ref(), parent_workflow_id).await
    }

    /// `GetWorkflowStateAtTime`: idempotent point-in-time
    /// reconstruction by pure span replay.
    pub async fn get_workflow_state_at_time(
        &self,
        workflow_id: WorkflowId,
        at: DateTime<Utc>,
    ) -> Result<Option<WorkflowInstance>> {
        crate::audit::reconstruct::get_workflow_state_at_time(self.store.as_ref(), workflow_id, at).await
    }

    pub async fn get_task_states(&self, workflow_id: WorkflowId) -> Result<HashMap<TaskName, TaskInstanceStatus>> {
        let instance = self.load_instance(workflow_id).await?;
        Ok(instance.tasks.iter().map(|(name, ti)| (name.clone(), ti.status)).collect())
    }

    async fn load_instance(&self, workflow_id: WorkflowId) -> Result<WorkflowInstance> {
        self.store
            .get_instance(workflow_id)
            .await?
            .ok_or_else(|| WorkflowError::NotFound(format!("workflow instance '{}'", workflow_id)))
    }

    async fn load_work_item(&self, id: WorkItemId) -> Result<WorkItem> {
        self.store
            .get_work_item(id)
            .await?
            .ok_or_else(|| WorkflowError::NotFound(format!("work item '{}'", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::builder::DefinitionBuilder;
    use crate::models::definition::{
        ConditionDefinition, ConditionRole, JoinKind, OfferTemplate, ScopeRequirement, SplitKind, TaskDefinition,
        TaskKind,
    };
    use crate::models::ids::{RoleName, UserId};
    use crate::models::testing::{MemoryStore, SystemClock};
    use crate::models::work_item::WorkItemStatus;

    fn human_definition() -> WorkflowDefinition {
        DefinitionBuilder::new("greeting", 1)
            .condition(ConditionDefinition::new("start", ConditionRole::Start))
            .condition(ConditionDefinition::new("end", ConditionRole::End))
            .task({
                let mut t = TaskDefinition::new("approve", TaskKind::Human, JoinKind::Xor, SplitKind::Xor);
                t.incoming.push("start".into());
                t.outgoing.push("end".into());
                t.offer = Some(OfferTemplate::new(ScopeRequirement::new("greeting", "approve")).auto_offer());
                t
            })
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn initialize_root_offers_human_task_immediately() {
        let store = Arc::new(MemoryStore::new());
        let mut auth = AuthorizationService::new();
        auth.register_role(
            crate::auth::scope::Role::new("approver")
                .grant(ScopeRequirement::new("greeting", "approve"))
                .grant(ScopeRequirement::new("greeting", "staff")),
        );
        let engine = Engine::new(store.clone(), Arc::new(auth), Arc::new(SystemClock));
        let definition = human_definition();
        let callbacks = DomainCallbacks::new();

        let instance = engine
            .initialize_root(&definition, &callbacks, AggregateId::from("agg-1"))
            .await
            .unwrap();

        let task_states = engine.get_task_states(instance.id).await.unwrap();
        assert_eq!(task_states.get(&TaskName::from("approve")), Some(&TaskInstanceStatus::Enabled));

        let user = CurrentUser {
            user_id: UserId::from("alice"),
            groups: vec![],
            roles: vec![RoleName::from("approver")],
        };
        let items = store
            .query_open_work_items_for_task(instance.id, &TaskName::from("approve"))
            .await
            .unwrap();
        assert_eq!(items.len(), 1);

        let claimed = engine.claim_work_item(&definition, &user, items[0].id).await.unwrap();
        assert_eq!(claimed.status, WorkItemStatus::Claimed);
        engine.start_work_item(&definition, &user, items[0].id).await.unwrap();
        let completed_instance = engine
            .complete_work_item(
                &definition,
                &callbacks,
                &user,
                items[0].id,
                serde_json::json!({"approved": true}),
                &["end".into()],
            )
            .await
            .unwrap();
        assert_eq!(completed_instance.status, WorkflowStatus::Completed);
    }
}
