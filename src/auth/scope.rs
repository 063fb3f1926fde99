// Scopes, roles and groups — the authorization model's static data
//
//! Authorization is scope-based: a "module:capability" pair an actor
//! either holds or doesn't. Roles bundle scopes; groups bundle roles
//! (and may grant scopes directly) — a named, composable,
//! registry-driven shape, gating actor identity rather than resource
//! field values.

use crate::models::definition::ScopeRequirement;
use crate::models::ids::{GroupName, RoleName};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    pub name: RoleName,
    pub scopes: Vec<ScopeRequirement>,
}

impl Role {
    pub fn new<N: Into<RoleName>>(name: N) -> Self {
        Role {
            name: name.into(),
            scopes: Vec::new(),
        }
    }

    pub fn grant(mut self, scope: ScopeRequirement) -> Self {
        self.scopes.push(scope);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub name: GroupName,
    pub roles: Vec<RoleName>,
    /// Scopes granted to every member of this group regardless of role.
    pub direct_scopes: Vec<ScopeRequirement>,
}

impl Group {
    pub fn new<N: Into<GroupName>>(name: N) -> Self {
        Group {
            name: name.into(),
            roles: Vec::new(),
            direct_scopes: Vec::new(),
        }
    }

    pub fn with_role(mut self, role: RoleName) -> Self {
        self.roles.push(role);
        self
    }

    pub fn grant(mut self, scope: ScopeRequirement) -> Self {
        self.direct_scopes.push(scope);
        self
    }
}

/// Union of every scope a user holds via direct role assignment or
/// group membership. Monotonic in the roles/groups passed in: adding
/// a role or group to a user can only ever add scopes, never remove
/// one — the property `auth::service` tests exercise.
pub fn effective_scopes(
    user_roles: &[RoleName],
    user_groups: &[GroupName],
    roles: &std::collections::HashMap<RoleName, Role>,
    groups: &std::collections::HashMap<GroupName, Group>,
) -> HashSet<ScopeRequirement> {
    let mut scopes = HashSet::new();

    for role_name in user_roles {
        if let Some(role) = roles.get(role_name) {
            scopes.extend(role.scopes.iter().cloned());
        }
    }

    for group_name in user_groups {
        if let Some(group) = groups.get(group_name) {
            scopes.extend(group.direct_scopes.iter().cloned());
            for role_name in &group.roles {
                if let Some(role) = roles.get(role_name) {
                    scopes.extend(role.scopes.iter().cloned());
                }
            }
        }
    }

    scopes
}
