// Workflow Engine
// A host-embedded Petri-net-style workflow runtime: marking-based
// enablement, scope-authorized human work items, and a span-structured
// audit trail with idempotent point-in-time reconstruction.

//! # Workflow Engine
//!
//! This is the main library crate for the workflow engine. The engine owns
//! no I/O of its own — persistence, identity resolution, wall-clock time,
//! and follow-up scheduling are all supplied by the embedding application
//! through the traits in [`models::host`]. Every public operation is one
//! host transaction: load what's needed, mutate a `WorkflowInstance`'s
//! marking and task instances in memory, then persist and append audit
//! spans before returning.
//!
//! ## Core Components
//!
//! ### Domain Models (`models`)
//! - [`models::Definition`]: a bipartite graph of tasks and conditions,
//!   built once by [`models::DefinitionBuilder`] and never mutated again.
//! - [`models::WorkflowInstance`] / [`models::Marking`]: the running state
//!   of one definition — which conditions hold tokens, and each task's
//!   own lifecycle.
//! - [`models::WorkItem`]: the unit a human actor sees, claims, and acts on.
//! - [`models::host`]: the traits (`Store`, `IdentityProvider`, `Clock`,
//!   `Scheduler`) the embedding application implements.
//!
//! ### Enablement Engine (`engine::enablement`)
//! Pure marking arithmetic: does a task's `joinKind` consider its incoming
//! conditions satisfied, and what does firing it consume/produce.
//!
//! ### Runtime Scheduler (`engine::scheduler`)
//! [`engine::Engine`] is the transaction-scoped orchestrator binding
//! `Store`+`AuthorizationService`+`Clock` together; [`engine::version::WorkflowHandle`]
//! binds it further to one registered `(name, version)` plus its
//! [`engine::DomainCallbacks`].
//!
//! ### Authorization (`auth`)
//! [`auth::AuthorizationService`] resolves a user's effective scopes from
//! their roles and groups and gates work-item offering/claiming and
//! task-level start/write policies against them.
//!
//! ### Audit Subsystem (`audit`)
//! Every mutating operation appends an immutable [`audit::AuditSpan`];
//! [`audit::get_workflow_state_at_time`] reconstructs a workflow instance
//! as of any past timestamp by pure replay, so it's idempotent regardless
//! of whether a snapshot exists.
//!
//! ## Rust Learning Notes:
//!
//! ### Module System
//! Rust organizes code into modules. Each `mod` declaration tells Rust to
//! include code from either a `.rs` file or a directory with a `mod.rs`.
//!
//! ### Public vs Private
//! - `pub mod` makes modules accessible to external crates
//! - `mod` (without pub) makes modules only accessible within this crate
//!
//! ### Re-exports
//! `pub use` statements create shortcuts so users don't need to know the
//! internal module structure. Instead of `use workflow_engine::models::work_item::WorkItem`,
//! users can write `use workflow_engine::WorkItem`.

// Crate-wide error type
pub mod error;

// Engine-wide configuration (OR-join policy, snapshot cadence, callback
// panic handling).
pub mod config;

// Core domain models: definitions, running instances, work items, and the
// host capability traits the embedding application implements.
pub mod models;

// Audit/observability subsystem — span-structured, idempotently
// reconstructible workflow history.
pub mod audit;

// Scope-based authorization for human work-item offering and claiming.
pub mod auth;

// The enablement/scheduling/lifecycle/version/composite engine.
pub mod engine;

// Re-export core domain types for easy access.
// This creates a "flat" API — users can import directly from the crate
// root instead of navigating the module hierarchy.
pub use models::{
    Clock,             // Wall-clock time, injected for deterministic audit timestamps
    ConditionName,     // Place name in the bipartite workflow graph
    CurrentUser,       // The acting user for one engine call
    Definition,        // Defines the workflow's tasks, conditions, and joins/splits
    DefinitionBuilder,  // Validating constructor for Definition
    IdentityProvider,  // Resolves the acting user for one engine call
    Marking,           // Tokens currently held per condition
    Scheduler,         // Lets the engine ask the host to invoke it again later
    Store,             // The host's transactional persistence + query surface
    TaskInstance,       // One firing of a task, addressed by (name, generation)
    TaskInstanceStatus, // A task instance's lifecycle state
    WorkItem,          // The unit a human actor claims and completes
    WorkItemStatus,     // A work item's lifecycle state
    WorkflowId,        // Unique identifier for a running workflow instance
    WorkflowInstance,  // One running (or finished) execution of a Definition
    WorkflowStatus,     // A workflow instance's lifecycle state
};

// Re-export engine types for convenience.
pub use engine::{DomainCallbacks, Engine, TaskCallback, VersionManager, WorkflowHandle};

// Re-export audit types for convenience.
pub use audit::{AuditSpan, AuditTrace, SpanKind};

// Re-export authorization types for convenience.
pub use auth::AuthorizationService;

// Re-export engine configuration types for convenience.
pub use config::{EngineConfig, OrJoinPolicy};

pub use error::{Result, WorkflowError};
