// Authorization service — registry + effective-scope evaluation
//
//! A registry (`roles`/`groups`) plus an `evaluate_*` surface callers
//! use instead of reaching into the registry directly.
//! `effective_scopes_for` is cached per user the way a production
//! authorization layer would, using `dashmap` for the same interior
//! mutability the store layer reaches for.

use super::scope::{effective_scopes, Group, Role};
use crate::error::{Result, WorkflowError};
use crate::models::definition::{OfferTemplate, ScopeRequirement};
use crate::models::host::CurrentUser;
use crate::models::ids::{GroupName, RoleName};
use dashmap::DashMap;
use std::collections::{HashMap, HashSet};

#[derive(Default)]
pub struct AuthorizationService {
    roles: HashMap<RoleName, Role>,
    groups: HashMap<GroupName, Group>,
    /// Cache of resolved effective scopes, keyed by a snapshot of the
    /// user's roles+groups so a role/group edit naturally misses the
    /// cache instead of needing explicit invalidation.
    cache: DashMap<(Vec<RoleName>, Vec<GroupName>), HashSet<ScopeRequirement>>,
}

impl AuthorizationService {
    pub fn new() -> Self {
        AuthorizationService::default()
    }

    pub fn register_role(&mut self, role: Role) {
        self.roles.insert(role.name.clone(), role);
    }

    pub fn register_group(&mut self, group: Group) {
        self.groups.insert(group.name.clone(), group);
    }

    pub fn effective_scopes_for(&self, user: &CurrentUser) -> HashSet<ScopeRequirement> {
        let mut roles = user.roles.clone();
        roles.sort();
        let mut groups = user.groups.clone();
        groups.sort();
        let key = (roles, groups);

        if let Some(cached) = self.cache.get(&key) {
            return cached.clone();
        }

        let scopes = effective_scopes(&user.roles, &user.groups, &self.roles, &self.groups);
        self.cache.insert(key, scopes.clone());
        scopes
    }

    pub fn holds_scope(&self, user: &CurrentUser, required: &ScopeRequirement) -> bool {
        self.effective_scopes_for(user).contains(required)
    }

    /// Gates `StartWorkItem`/any task-level `startPolicy` check.
    pub fn authorize(&self, user: &CurrentUser, required: &ScopeRequirement) -> Result<()> {
        if self.holds_scope(user, required) {
            Ok(())
        } else {
            Err(WorkflowError::AuthzDenied {
                actor: user.user_id.to_string(),
                required_scope: required.qualified(),
            })
        }
    }

    /// Visibility-scope gating for `ListOfferedWork`: is this work item's offer even shown to `user`? In addition
    /// to the offer's own `required_scope`, the engine never reveals a
    /// work item to a caller who doesn't hold that scope's domain
    /// `{domain}:staff` visibility scope.
    pub fn is_visible(&self, user: &CurrentUser, offer: &OfferTemplate) -> bool {
        if let Some(assigned) = &offer.assigned_user {
            if assigned != &user.user_id {
                return false;
            }
        }
        if let Some(group) = &offer.group_restriction {
            if !user.groups.contains(group) {
                return false;
            }
        }
        let staff_scope = ScopeRequirement::new(offer.required_scope.module.clone(), "staff");
        self.holds_scope(user, &staff_scope) && self.holds_scope(user, &offer.required_scope)
    }

    /// Gates `ClaimWorkItem`: visible, not already claimed by someone
    /// else (caller checks the latter on the `WorkItem` itself), and
    /// satisfies the offer's `claimPolicy` if one is set.
    pub fn authorize_claim(&self, user: &CurrentUser, offer: &OfferTemplate) -> Result<()> {
        if !self.is_visible(user, offer) {
            return Err(WorkflowError::AuthzDenied {
                actor: user.user_id.to_string(),
                required_scope: offer.required_scope.qualified(),
            });
        }
        if let Some(policy) = &offer.claim_policy {
            self.authorize(user, policy)?;
        }
        Ok(())
    }
}
