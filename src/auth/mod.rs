// Scope-based authorization for human work-item offering and claiming
//
//! A "registry of named things, evaluated against state" shape: roles
//! and groups grant scopes, scopes gate offering and claiming.

pub mod scope;
pub mod service;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use scope::{effective_scopes, Group, Role};
pub use service::AuthorizationService;
