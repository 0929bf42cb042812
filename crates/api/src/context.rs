use vitrina_auth::{Principal, Role};
use vitrina_core::UserId;

use crate::authz;

/// Authenticated identity of a request, taken from its bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    principal_id: UserId,
    email: String,
    roles: Vec<Role>,
}

impl PrincipalContext {
    pub fn new(principal_id: UserId, email: String, roles: Vec<Role>) -> Self {
        Self {
            principal_id,
            email,
            roles,
        }
    }

    pub fn principal_id(&self) -> UserId {
        self.principal_id
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    /// The caller as the authorization layer sees it, with permissions
    /// resolved from roles.
    pub fn principal(&self) -> Principal {
        Principal::new(
            self.principal_id,
            self.roles.clone(),
            authz::permissions_from_roles(&self.roles),
        )
    }
}
