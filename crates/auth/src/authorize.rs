use std::collections::HashSet;

use thiserror::Error;

use vitrina_core::UserId;

use crate::{Permission, Role};

/// A fully resolved caller for authorization decisions.
///
/// Construction of this object is decoupled from storage and transport: the
/// API derives it from verified token claims and a role→permission policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub principal_id: UserId,
    pub roles: Vec<Role>,
    pub permissions: Vec<Permission>,
}

impl Principal {
    pub fn new(principal_id: UserId, roles: Vec<Role>, permissions: Vec<Permission>) -> Self {
        Self {
            principal_id,
            roles,
            permissions,
        }
    }

    /// Whether the principal holds `required` (directly or via the wildcard).
    pub fn has_permission(&self, required: &Permission) -> bool {
        self.permissions
            .iter()
            .any(|p| p.is_wildcard() || p.as_str() == required.as_str())
    }

    /// Whether the principal holds every permission in `required`.
    pub fn has_all(&self, required: &[Permission]) -> bool {
        let held: HashSet<&str> = self.permissions.iter().map(Permission::as_str).collect();
        held.contains("*") || required.iter().all(|p| held.contains(p.as_str()))
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: {0}")]
    Forbidden(String),
}

/// Authorize a principal for a single permission.
///
/// - No IO
/// - No panics
/// - No business logic (pure policy check)
pub fn authorize(principal: &Principal, required: &Permission) -> Result<(), AuthzError> {
    if principal.has_permission(required) {
        Ok(())
    } else {
        Err(AuthzError::Forbidden(format!(
            "missing permission '{}'",
            required.as_str()
        )))
    }
}
