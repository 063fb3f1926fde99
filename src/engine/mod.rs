// Workflow Engine — execution layer
// This contains the enablement, scheduling, lifecycle, version, and
// composite-task components that power the workflow runtime.

//! # Engine Module
//!
//! This module contains the execution engine that powers the workflow
//! runtime. The engine is the layer between the domain models (in
//! `models/`) and the host application: it owns no I/O of its own, calling
//! out through [`crate::models::host`] for persistence, identity, time, and
//! scheduling, and through [`callbacks`] for domain-specific business logic.
//!
//! ## Engine Components
//!
//! ### Enablement Engine (`enablement` module)
//! - Pure marking arithmetic: is a task's `joinKind` satisfied, and what
//!   does firing it consume/produce
//! - No I/O, no audit concerns — `scheduler` handles everything around it
//!
//! ### Domain Callbacks (`callbacks` module)
//! - The engine's other host boundary: `Initialize`/`OnStart`/`OnComplete`
//! - Per-definition-version registry bundled as `DomainCallbacks`
//!
//! ### Runtime Scheduler (`scheduler` module)
//! - [`Engine`]: the transaction-scoped orchestrator for every public
//!   operation (`InitializeRoot`, `CompleteWorkItem`, ...)
//! - Runs the fixpoint rule: cascades enablement until the marking settles
//!
//! ### Work-Item Lifecycle (`lifecycle` module)
//! - Pure state-machine checks over a `WorkItem`'s offer/claim/start/
//!   complete/cancel transitions
//!
//! ### Version Manager (`version` module)
//! - `(name, version)` → `WorkflowDefinition` resolution
//! - [`WorkflowHandle`]: one resolved definition bound to its callbacks
//!
//! ### Composite Task Runner (`composite` module)
//! - Sub-workflow instantiation and result propagation for composite tasks
//!
//! ## Rust Learning Notes:
//!
//! ### Module Organization Pattern
//! This is a common Rust pattern for organizing large modules:
//! 1. Create a directory with the module name (`engine/`)
//! 2. Add a `mod.rs` file as the module root
//! 3. Declare submodules in `mod.rs`
//! 4. Re-export important types for clean API
//!
//! ### Re-exports for API Design
//! The `pub use` statements create a clean API by:
//! - Flattening the module hierarchy for users
//! - Hiding internal organization details
//! - Making commonly-used types easily accessible

/// Enablement engine: marking-based join/split firing rules
pub mod enablement;

/// Domain application callbacks: the engine's other host boundary
pub mod callbacks;

/// Runtime scheduler: the transaction-scoped public operations
pub mod scheduler;

/// Work-item lifecycle: offer/claim/start/complete/cancel
pub mod lifecycle;

/// Version manager: `(name, version)` definition resolution and the
/// per-version handle facade
pub mod version;

/// Composite task runner: sub-workflow instantiation and result
/// propagation
pub mod composite;

// Re-export main engine types for clean API access.
// Users can import directly from `engine` instead of navigating submodules.

pub use callbacks::{DomainCallbacks, TaskCallback, TaskCallbackContext, TaskOutcome, WorkflowInitializer};
pub use composite::CompositeRunner;
pub use enablement::{enabled_tasks, evaluate_task, fire, EnablementTrace};
pub use lifecycle::{cancel, claim, complete, fail, offer, start};
pub use scheduler::Engine;
pub use version::{VersionManager, WorkflowHandle};
