//! Editing rights over a product.
//!
//! A caller's rights are resolved to one of a closed set of tiers. Each tier
//! fixes which product fields its form exposes and whether versions may be
//! deleted; the form layer reads those answers instead of picking a form type
//! at runtime.

use serde::Serialize;

use vitrina_auth::{AuthzError, Permission, Principal, authorize};

use crate::forms::ProductField;
use crate::product::Product;

/// Grants publication changes (and, alone, the content-manager tier).
pub const SET_PUBLISHED: Permission = Permission::from_static("catalog.set_published");
pub const CAN_EDIT_CATEGORY: Permission = Permission::from_static("catalog.can_edit_category");
pub const CAN_EDIT_DESCRIPTION: Permission =
    Permission::from_static("catalog.can_edit_description");

/// Tier of editing rights a caller holds for one product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    FullOwnerEdit,
    ModeratorEdit,
    ContentManagerEdit,
}

const ALL_FIELDS: &[ProductField] = &[
    ProductField::Name,
    ProductField::Description,
    ProductField::Photo,
    ProductField::Category,
    ProductField::Price,
    ProductField::IsPublished,
];

const CONTENT_MANAGER_FIELDS: &[ProductField] = &[ProductField::IsPublished, ProductField::Photo];

impl Capability {
    /// Product fields this tier may change, in display order.
    pub fn editable_fields(self) -> &'static [ProductField] {
        match self {
            Self::FullOwnerEdit | Self::ModeratorEdit => ALL_FIELDS,
            Self::ContentManagerEdit => CONTENT_MANAGER_FIELDS,
        }
    }

    pub fn can_edit(self, field: ProductField) -> bool {
        self.editable_fields().contains(&field)
    }

    pub fn can_delete_versions(self) -> bool {
        match self {
            Self::FullOwnerEdit | Self::ModeratorEdit => true,
            Self::ContentManagerEdit => false,
        }
    }

    pub fn can_delete_product(self) -> bool {
        self.can_delete_versions()
    }
}

/// Resolve the caller's tier for `product`. First match wins:
///
/// 1. owner → [`Capability::FullOwnerEdit`]
/// 2. all three catalog grants → [`Capability::ModeratorEdit`]
/// 3. `set_published` → [`Capability::ContentManagerEdit`]
/// 4. otherwise [`AuthzError::Forbidden`]
pub fn select_editing_capability(
    caller: &Principal,
    product: &Product,
) -> Result<Capability, AuthzError> {
    if product.is_owned_by(caller.principal_id) {
        return Ok(Capability::FullOwnerEdit);
    }

    if caller.has_all(&[SET_PUBLISHED, CAN_EDIT_CATEGORY, CAN_EDIT_DESCRIPTION]) {
        return Ok(Capability::ModeratorEdit);
    }

    authorize(caller, &SET_PUBLISHED)
        .map(|()| Capability::ContentManagerEdit)
        .map_err(|_| AuthzError::Forbidden(format!("no editing rights for product {}", product.id)))
}

/// Tier for a product the caller is creating; the creator becomes its owner.
pub fn creation_capability() -> Capability {
    Capability::FullOwnerEdit
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use vitrina_core::UserId;

    fn caller(perms: &[Permission]) -> Principal {
        Principal::new(UserId::new(), vec![], perms.to_vec())
    }

    fn product_of(owner: UserId) -> Product {
        Product::new(owner, Utc::now())
    }

    #[test]
    fn owner_wins_regardless_of_grants() {
        let mut p = caller(&[SET_PUBLISHED, CAN_EDIT_CATEGORY, CAN_EDIT_DESCRIPTION]);
        let product = product_of(p.principal_id);
        assert_eq!(
            select_editing_capability(&p, &product),
            Ok(Capability::FullOwnerEdit)
        );

        p.permissions.clear();
        assert_eq!(
            select_editing_capability(&p, &product),
            Ok(Capability::FullOwnerEdit)
        );
    }

    #[test]
    fn all_three_grants_make_a_moderator() {
        let p = caller(&[CAN_EDIT_DESCRIPTION, SET_PUBLISHED, CAN_EDIT_CATEGORY]);
        let product = product_of(UserId::new());
        assert_eq!(
            select_editing_capability(&p, &product),
            Ok(Capability::ModeratorEdit)
        );
    }

    #[test]
    fn wildcard_counts_as_every_grant() {
        let p = caller(&[Permission::new("*")]);
        let product = product_of(UserId::new());
        assert_eq!(
            select_editing_capability(&p, &product),
            Ok(Capability::ModeratorEdit)
        );
    }

    #[test]
    fn partial_grants_never_reach_moderator() {
        let product = product_of(UserId::new());

        let only_publish = caller(&[SET_PUBLISHED]);
        assert_eq!(
            select_editing_capability(&only_publish, &product),
            Ok(Capability::ContentManagerEdit)
        );

        let publish_and_category = caller(&[SET_PUBLISHED, CAN_EDIT_CATEGORY]);
        assert_eq!(
            select_editing_capability(&publish_and_category, &product),
            Ok(Capability::ContentManagerEdit)
        );
    }

    #[test]
    fn grants_without_set_published_are_denied() {
        let product = product_of(UserId::new());
        let p = caller(&[CAN_EDIT_CATEGORY, CAN_EDIT_DESCRIPTION]);
        assert!(matches!(
            select_editing_capability(&p, &product),
            Err(AuthzError::Forbidden(_))
        ));
        assert!(select_editing_capability(&caller(&[]), &product).is_err());
    }

    #[test]
    fn orphaned_product_is_not_owned_by_anyone() {
        let p = caller(&[]);
        let mut product = product_of(p.principal_id);
        product.owner = None;
        assert!(select_editing_capability(&p, &product).is_err());
    }

    #[test]
    fn content_manager_edits_a_narrow_field_set() {
        let tier = Capability::ContentManagerEdit;
        assert!(tier.can_edit(ProductField::IsPublished));
        assert!(tier.can_edit(ProductField::Photo));
        assert!(!tier.can_edit(ProductField::Name));
        assert!(!tier.can_edit(ProductField::Price));
        assert!(!tier.can_delete_versions());
        assert!(Capability::ModeratorEdit.can_delete_versions());
    }

    #[test]
    fn resolution_is_stable_across_calls() {
        let p = caller(&[SET_PUBLISHED]);
        let product = product_of(UserId::new());
        assert_eq!(
            select_editing_capability(&p, &product),
            select_editing_capability(&p, &product)
        );
    }
}
