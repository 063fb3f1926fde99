// Core domain models for the workflow engine
// These are the generic, host-agnostic data structures

//! # Domain Models Module
//!
//! This module contains the core domain models for the workflow engine.
//! These are **generic, host-agnostic** data structures that form the
//! foundation of the runtime: a bipartite graph of tasks and conditions
//! (`definition`), the running marking over that graph (`instance`), the
//! human work-item lifecycle (`work_item`), and the traits the embedding
//! application implements to supply persistence, identity, time, and
//! scheduling (`host`).
//!
//! ## Rust Learning Notes:
//!
//! ### Module Organization
//! This `mod.rs` file serves as the **module root** for the `models`
//! directory. When you have a directory with a `mod.rs` file, Rust treats
//! the directory as a module, and `mod.rs` acts as the entry point.
//!
//! ### Re-exports for Clean APIs
//! The `pub use` statements below create a clean, flat API. Users can
//! import `use workflow_engine::models::WorkItem` instead of
//! `use workflow_engine::models::work_item::WorkItem`.

// Declares the `ids` submodule from `ids.rs`
// Contains the newtype identifiers used throughout the workflow engine
pub mod ids;

// Declares the `definition` submodule from `definition.rs`
// Contains WorkflowDefinition, TaskDefinition, ConditionDefinition and the
// join/split kinds of the marking-based Petri net
pub mod definition;

// Declares the `instance` submodule from `instance.rs`
// Contains WorkflowInstance, TaskInstance and the marking they carry
pub mod instance;

// Declares the `work_item` submodule from `work_item.rs`
// Contains WorkItem and its offer/claim lifecycle
pub mod work_item;

// Declares the `builder` submodule from `builder.rs`
// Contains DefinitionBuilder, the fluent, validating constructor for
// WorkflowDefinition
pub mod builder;

// Declares the `host` submodule from `host.rs`
// Contains the Store/IdentityProvider/Clock/Scheduler traits the host
// application implements
pub mod host;

// Declares the `schema` submodule from `schema.rs`
// Contains the PayloadCodec/PayloadRegistry payload-validation registry
pub mod schema;

// Declares the `testing` submodule from `testing.rs`
// Contains MemoryStore and other in-memory test doubles for `host`
#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Re-export main types for convenience
// This creates shortcuts so users don't need to know the internal structure

/// Re-export identifier newtypes.
pub use ids::{
    AggregateId, ConditionName, DefinitionRef, GroupName, RoleName, SchemaId, SpanId,
    TaskInstanceRef, TaskName, TraceId, UserId, WorkItemId, WorkflowId,
};

/// Re-export the marking-based workflow definition types.
pub use definition::{
    ConditionDefinition, ConditionRole, JoinKind, OfferTemplate, ScopeRequirement, SplitKind,
    TaskDefinition, TaskKind, WorkflowDefinition as Definition,
};

/// Re-export running-instance types.
pub use instance::{Marking, TaskInstance, TaskInstanceStatus, WorkflowInstance, WorkflowStatus};

/// Re-export work-item lifecycle types.
pub use work_item::{WorkItem, WorkItemStatus};

/// Re-export the definition builder.
pub use builder::DefinitionBuilder;

/// Re-export host capability traits.
pub use host::{Clock, CurrentUser, IdentityProvider, Scheduler, Store};

/// Re-export the payload codec registry.
pub use schema::{PayloadCodec, PayloadRegistry, RequiredFieldsCodec};
