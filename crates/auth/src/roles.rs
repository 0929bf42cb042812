use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Superuser role; the policy layer grants it every permission.
pub const ADMIN: &str = "admin";
pub const MODERATOR: &str = "moderator";
pub const CONTENT_MANAGER: &str = "content_manager";

/// Role identifier carried in tokens and stored on user accounts.
///
/// Roles are opaque strings at this layer; mapping roles to permissions is
/// done by the policy layer that builds a [`crate::Principal`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn admin() -> Self {
        Self::new(ADMIN)
    }

    pub fn is_admin(&self) -> bool {
        self.as_str() == ADMIN
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
