// Crate-wide error type
//
//! One variant per failure mode the engine surfaces to its caller:
//! `thiserror`-derived, with `#[from]` conversions for the two failure
//! domains the engine doesn't own (host storage, JSON (de)serialization).

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkflowError {
    /// A `WorkflowDefinition` failed structural validation at build time
    /// (dangling condition reference, unreachable task, duplicate name).
    #[error("invalid definition: {0}")]
    InvalidDefinition(String),

    /// A work item's submitted payload didn't validate against the
    /// task's registered `PayloadCodec`.
    #[error("schema mismatch for task '{task}': {detail}")]
    SchemaMismatch { task: String, detail: String },

    /// The acting user's effective scopes don't satisfy the policy
    /// guarding the attempted operation.
    #[error("authorization denied: actor '{actor}' lacks '{required_scope}'")]
    AuthzDenied {
        actor: String,
        required_scope: String,
    },

    /// The target entity exists but isn't in a state that permits the
    /// requested transition (e.g. completing a work item that's still
    /// `Created`).
    #[error("wrong state: expected {expected}, found {found}")]
    WrongState { expected: String, found: String },

    /// The referenced task instance has no satisfied join — the
    /// operation that required enablement (e.g. `StartWorkItem`) cannot
    /// proceed.
    #[error("task '{task}' is not enabled")]
    NotEnabled { task: String },

    /// A host-supplied `Initialize`/`OnStart`/`OnComplete` callback
    /// returned an error or panicked (if `EngineConfig::catch_callback_panics`).
    #[error("callback failed for task '{task}': {detail}")]
    CallbackFailed { task: String, detail: String },

    /// Not found — workflow instance, work item, task instance, or
    /// trace/span lookup missed.
    #[error("not found: {0}")]
    NotFound(String),

    /// Host store or identity provider failure, passed through.
    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),

    /// JSON (de)serialization failure, passed through.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Marks an enablement check's outcome when an OR-join is syntactically
/// satisfied but upstream reachability analysis can't yet rule out a
/// still-arriving token. Not a `WorkflowError`
/// variant: it's transient engine state, surfaced on
/// `EnablementTrace`/audit spans rather than returned to callers as a
/// failure they'd match on for control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingOrJoin;

pub type Result<T> = std::result::Result<T, WorkflowError>;
