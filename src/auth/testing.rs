// Fixed-identity test double for `IdentityProvider`
use crate::error::Result;
use crate::models::host::{CurrentUser, IdentityProvider};

/// Always resolves to the same `CurrentUser` — good enough for
/// scenario tests that drive the engine as one fixed actor at a time.
pub struct StaticIdentity(CurrentUser);

impl StaticIdentity {
    pub fn new(user: CurrentUser) -> Self {
        StaticIdentity(user)
    }
}

impl IdentityProvider for StaticIdentity {
    fn current_user(&self) -> Result<CurrentUser> {
        Ok(self.0.clone())
    }
}
