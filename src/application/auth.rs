//! Caller capability context.
//!
//! The HTTP layer resolves each request's bearer token into an
//! [`AuthContext`] before any handler runs. Services and link generation
//! consult `is_granted`; they never look at tokens themselves.

use std::collections::BTreeSet;

use crate::domain::types::Role;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthContext {
    roles: BTreeSet<Role>,
}

impl AuthContext {
    /// A caller with no roles; may read, never mutate.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_roles(roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            roles: roles.into_iter().collect(),
        }
    }

    pub fn admin() -> Self {
        Self::with_roles([Role::Admin])
    }

    pub fn is_granted(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}
