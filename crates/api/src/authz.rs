//! Role → permission policy.
//!
//! Tokens carry roles only; the grants behind them are resolved here, once
//! per request, before any workflow runs.

use vitrina_auth::roles::{CONTENT_MANAGER, MODERATOR};
use vitrina_auth::{Permission, Role};
use vitrina_catalog::capability::{CAN_EDIT_CATEGORY, CAN_EDIT_DESCRIPTION, SET_PUBLISHED};

const MODERATOR_GRANTS: &[Permission] = &[SET_PUBLISHED, CAN_EDIT_CATEGORY, CAN_EDIT_DESCRIPTION];
const CONTENT_MANAGER_GRANTS: &[Permission] = &[SET_PUBLISHED];

/// Union of the grants of every role held. Unknown roles grant nothing.
pub fn permissions_from_roles(roles: &[Role]) -> Vec<Permission> {
    if roles.iter().any(Role::is_admin) {
        return vec![Permission::new("*")];
    }

    let mut permissions = Vec::new();
    for role in roles {
        let grants: &[Permission] = match role.as_str() {
            MODERATOR => MODERATOR_GRANTS,
            CONTENT_MANAGER => CONTENT_MANAGER_GRANTS,
            _ => &[],
        };
        for grant in grants {
            if !permissions.contains(grant) {
                permissions.push(grant.clone());
            }
        }
    }
    permissions
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitrina_auth::roles::ADMIN;

    #[test]
    fn admin_is_wildcard() {
        let perms = permissions_from_roles(&[Role::new(ADMIN), Role::new(MODERATOR)]);
        assert_eq!(perms.len(), 1);
        assert!(perms[0].is_wildcard());
    }

    #[test]
    fn roles_are_merged_without_duplicates() {
        let perms = permissions_from_roles(&[Role::new(CONTENT_MANAGER), Role::new(MODERATOR)]);
        assert_eq!(perms.len(), 3);
        assert!(perms.contains(&SET_PUBLISHED));
    }

    #[test]
    fn unknown_roles_grant_nothing() {
        assert!(permissions_from_roles(&[Role::new("viewer")]).is_empty());
    }
}
