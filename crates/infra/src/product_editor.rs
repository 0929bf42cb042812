//! Product create/edit workflow.
//!
//! Each request resolves the caller's [`Capability`], builds the product form
//! and the version sub-forms for that tier, and then either renders them or
//! validates a submission and commits it:
//!
//! ```text
//! submission
//!   ↓
//! 1. resolve capability (denied → error, no forms built)
//!   ↓
//! 2. clean product form (structure + forbidden words)
//!   ↓
//! 3. clean each version sub-form (blank extra form skipped)
//!   ↓
//! 4. version-set rules over the active sub-forms (always run)
//!   ↓
//! 5. any error → re-render, nothing written
//!    otherwise  → one atomic product + versions write
//! ```
//!
//! The store is an injected handle; the editor holds no state of its own.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, instrument};

use vitrina_auth::{AuthzError, Principal};
use vitrina_catalog::capability::creation_capability;
use vitrina_catalog::{
    Capability, Category, Product, ProductForm, ProductInput, Version, VersionFormSet,
    VersionInput, enforce_version_rules, select_editing_capability,
};
use vitrina_core::{CategoryId, ProductId};

use crate::destination::{Destination, Submission};
use crate::store::{CatalogStore, ProductWrite, StoreError};

#[derive(Debug, Error)]
pub enum EditorError {
    #[error(transparent)]
    Denied(#[from] AuthzError),

    #[error("product not found")]
    NotFound,

    /// The write was rejected or failed; the store is unchanged. The cause
    /// is logged, not returned.
    #[error("the product could not be saved")]
    Commit,

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Submitted product form plus its version sub-forms.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProductSubmission {
    pub product: ProductInput,
    pub versions: Vec<VersionInput>,
}

/// A product form page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductPage {
    pub title: String,
    pub capability: Capability,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<ProductId>,
    /// Choices for the category field.
    pub categories: Vec<Category>,
    pub form: ProductForm,
    pub formset: VersionFormSet,
}

impl ProductPage {
    pub fn is_valid(&self) -> bool {
        self.form.is_valid() && self.formset.is_valid()
    }
}

const CREATE_TITLE: &str = "New product";
const EDIT_TITLE: &str = "Edit product";

pub struct ProductEditor<S: CatalogStore + ?Sized> {
    store: Arc<S>,
}

impl<S: CatalogStore + ?Sized> Clone for ProductEditor<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: CatalogStore + ?Sized> ProductEditor<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Empty creation page. Any authenticated caller may create a product.
    #[instrument(skip(self, caller), fields(caller = %caller.principal_id))]
    pub async fn render_create(&self, caller: &Principal) -> Result<ProductPage, EditorError> {
        let capability = creation_capability();
        Ok(ProductPage {
            title: CREATE_TITLE.to_string(),
            capability,
            product_id: None,
            categories: self.store.list_categories().await?,
            form: ProductForm::unbound(capability, None),
            formset: VersionFormSet::unbound(&[], capability),
        })
    }

    /// Create a product owned by the caller. Success leads home.
    #[instrument(skip(self, caller, submission), fields(caller = %caller.principal_id))]
    pub async fn submit_create(
        &self,
        caller: &Principal,
        submission: ProductSubmission,
        now: DateTime<Utc>,
    ) -> Result<Submission<ProductPage>, EditorError> {
        let draft = Draft {
            title: CREATE_TITLE,
            capability: creation_capability(),
            product: Product::new(caller.principal_id, now),
            existing: Vec::new(),
            is_new: true,
        };
        let outcome = self.process(draft, submission, now).await?;
        Ok(match outcome {
            Processed::Invalid(page) => Submission::Rerender(page),
            Processed::Saved(id) => {
                info!(product_id = %id, "product created");
                Submission::committed(Destination::Home)
            }
        })
    }

    /// Edit page for an existing product, pre-populated for the caller's
    /// tier. Fails before building any form when the caller has no rights.
    #[instrument(skip(self, caller), fields(caller = %caller.principal_id))]
    pub async fn render_edit(
        &self,
        caller: &Principal,
        id: ProductId,
    ) -> Result<ProductPage, EditorError> {
        let product = self.load(id).await?;
        let capability = select_editing_capability(caller, &product)?;
        let versions = self.store.list_versions(id).await?;

        Ok(ProductPage {
            title: EDIT_TITLE.to_string(),
            capability,
            product_id: Some(id),
            categories: self.store.list_categories().await?,
            form: ProductForm::unbound(capability, Some(&product)),
            formset: VersionFormSet::unbound(&versions, capability),
        })
    }

    /// Apply an edit. Success leads to the product's detail page.
    #[instrument(skip(self, caller, submission), fields(caller = %caller.principal_id))]
    pub async fn submit_edit(
        &self,
        caller: &Principal,
        id: ProductId,
        submission: ProductSubmission,
        now: DateTime<Utc>,
    ) -> Result<Submission<ProductPage>, EditorError> {
        let product = self.load(id).await?;
        let capability = select_editing_capability(caller, &product)?;
        let draft = Draft {
            title: EDIT_TITLE,
            capability,
            existing: self.store.list_versions(id).await?,
            product,
            is_new: false,
        };
        let outcome = self.process(draft, submission, now).await?;
        Ok(match outcome {
            Processed::Invalid(page) => Submission::Rerender(page),
            Processed::Saved(id) => {
                info!(product_id = %id, ?capability, "product updated");
                Submission::committed(Destination::ProductDetail(id))
            }
        })
    }

    /// Delete a product and its versions. Owners and moderators only.
    #[instrument(skip(self, caller), fields(caller = %caller.principal_id))]
    pub async fn delete(&self, caller: &Principal, id: ProductId) -> Result<Destination, EditorError> {
        let product = self.load(id).await?;
        let capability = select_editing_capability(caller, &product)?;
        if !capability.can_delete_product() {
            return Err(AuthzError::Forbidden(format!("cannot delete product {id}")).into());
        }

        self.store.delete_product(id).await.map_err(|e| match e {
            StoreError::NotFound => EditorError::NotFound,
            other => other.into(),
        })?;
        info!(product_id = %id, "product deleted");
        Ok(Destination::Home)
    }

    async fn load(&self, id: ProductId) -> Result<Product, EditorError> {
        self.store.get_product(id).await?.ok_or(EditorError::NotFound)
    }

    async fn process(
        &self,
        draft: Draft,
        submission: ProductSubmission,
        now: DateTime<Utc>,
    ) -> Result<Processed, EditorError> {
        let Draft {
            title,
            capability,
            mut product,
            existing,
            is_new,
        } = draft;
        let categories = self.store.list_categories().await?;
        let category_ids: Vec<CategoryId> = categories.iter().map(|c| c.id).collect();

        let mut form = ProductForm::bind(capability, submission.product);
        let changes = form.clean(&category_ids);
        let mut formset = VersionFormSet::bind(&existing, submission.versions, capability);
        enforce_version_rules(&mut form, &mut formset);

        let changes = match changes {
            Some(changes) if form.is_valid() && formset.is_valid() => changes,
            _ => {
                let page = ProductPage {
                    title: title.to_string(),
                    capability,
                    product_id: (!is_new).then_some(product.id),
                    categories,
                    form,
                    formset,
                };
                return Ok(Processed::Invalid(page));
            }
        };

        changes.apply_to(&mut product);
        product.touch(now);
        let product_id = product.id;
        let write = ProductWrite {
            versions: formset.changes(product_id),
            product,
        };

        if let Err(err) = self.store.commit_product(write).await {
            error!(product_id = %product_id, error = %err, "product commit failed");
            return Err(EditorError::Commit);
        }
        Ok(Processed::Saved(product_id))
    }
}

/// What a submission is applied to.
struct Draft {
    title: &'static str,
    capability: Capability,
    product: Product,
    existing: Vec<Version>,
    is_new: bool,
}

enum Processed {
    Invalid(ProductPage),
    Saved(ProductId),
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use vitrina_auth::Permission;
    use vitrina_catalog::capability::{CAN_EDIT_CATEGORY, CAN_EDIT_DESCRIPTION, SET_PUBLISHED};
    use vitrina_catalog::validation::{ACTIVE_VERSION_NAME_REQUIRED, MULTIPLE_ACTIVE_VERSIONS};
    use vitrina_catalog::{ContactsInfo, VersionChanges};
    use vitrina_core::{NumericInput, UserId};

    use crate::store::{InMemoryStore, ProductFilter};

    fn principal(perms: &[Permission]) -> Principal {
        Principal::new(UserId::new(), vec![], perms.to_vec())
    }

    fn product_input(name: &str) -> ProductInput {
        ProductInput {
            name: Some(name.into()),
            description: Some("Описание".into()),
            photo: None,
            category: None,
            price: Some("100.00".into()),
            is_published: Some(true),
        }
    }

    fn new_version(n: i64, name: &str, active: bool) -> VersionInput {
        VersionInput {
            version_number: Some(NumericInput::Integer(n)),
            version_name: Some(name.into()),
            is_active: active,
            ..VersionInput::default()
        }
    }

    fn existing_version(v: &Version) -> VersionInput {
        VersionInput {
            id: Some(v.id),
            version_number: Some(NumericInput::Integer(i64::from(v.version_number))),
            version_name: Some(v.version_name.clone()),
            is_active: v.is_active,
            delete: false,
        }
    }

    async fn seed(store: &InMemoryStore, owner: UserId, versions: &[(u32, &str, bool)]) -> (Product, Vec<Version>) {
        let mut product = Product::new(owner, Utc::now());
        product.name = "Телефон".into();
        product.description = "Хороший".into();
        let saved: Vec<Version> = versions
            .iter()
            .map(|(n, name, active)| Version::new(product.id, *n, *name, *active))
            .collect();
        store
            .commit_product(ProductWrite {
                product: product.clone(),
                versions: VersionChanges {
                    save: saved.clone(),
                    delete: vec![],
                },
            })
            .await
            .unwrap();
        (product, saved)
    }

    fn editor(store: &Arc<InMemoryStore>) -> ProductEditor<InMemoryStore> {
        ProductEditor::new(Arc::clone(store))
    }

    #[tokio::test]
    async fn create_page_offers_one_blank_version_form() {
        let store = Arc::new(InMemoryStore::new());
        let page = editor(&store).render_create(&principal(&[])).await.unwrap();

        assert_eq!(page.capability, Capability::FullOwnerEdit);
        assert_eq!(page.product_id, None);
        assert_eq!(page.formset.forms().len(), VersionFormSet::EXTRA);
        assert!(page.formset.can_delete());
    }

    #[tokio::test]
    async fn create_with_blank_extra_form_saves_product_only() {
        let store = Arc::new(InMemoryStore::new());
        let caller = principal(&[]);
        let submission = ProductSubmission {
            product: product_input("Ноутбук"),
            versions: vec![VersionInput::default()],
        };

        let outcome = editor(&store)
            .submit_create(&caller, submission, Utc::now())
            .await
            .unwrap();
        assert_eq!(outcome.destination(), Some(Destination::Home));

        let products = store.list_products(ProductFilter::default()).await.unwrap();
        assert_eq!(products.len(), 1);
        assert!(products[0].is_owned_by(caller.principal_id));
        assert!(store.list_versions(products[0].id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn two_active_versions_abort_with_one_form_level_error() {
        let store = Arc::new(InMemoryStore::new());
        let owner = principal(&[]);
        let (product, versions) = seed(&store, owner.principal_id, &[(1, "v1", true)]).await;

        let submission = ProductSubmission {
            product: product_input("Телефон"),
            versions: vec![existing_version(&versions[0]), new_version(2, "v2", true)],
        };
        let outcome = editor(&store)
            .submit_edit(&owner, product.id, submission, Utc::now())
            .await
            .unwrap();

        let page = outcome.into_page().expect("re-rendered");
        assert_eq!(page.form.errors().non_field(), [MULTIPLE_ACTIVE_VERSIONS.to_string()]);
        assert_eq!(page.form.errors().len(), 1);
        assert_eq!(store.list_versions(product.id).await.unwrap(), versions);
    }

    #[tokio::test]
    async fn active_version_without_name_gets_field_error() {
        let store = Arc::new(InMemoryStore::new());
        let owner = principal(&[]);
        let (product, _) = seed(&store, owner.principal_id, &[]).await;

        let submission = ProductSubmission {
            product: product_input("Телефон"),
            versions: vec![new_version(1, "   ", true)],
        };
        let page = editor(&store)
            .submit_edit(&owner, product.id, submission, Utc::now())
            .await
            .unwrap()
            .into_page()
            .expect("re-rendered");

        let sub = &page.formset.forms()[0];
        assert_eq!(
            sub.errors().field("version_name"),
            [ACTIVE_VERSION_NAME_REQUIRED.to_string()]
        );
        assert!(page.form.errors().non_field().is_empty());
        assert!(store.list_versions(product.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn invalid_product_form_still_reports_version_rules() {
        let store = Arc::new(InMemoryStore::new());
        let submission = ProductSubmission {
            product: product_input("дешево и сердито"),
            versions: vec![new_version(1, "a", true), new_version(2, "b", true)],
        };
        let page = editor(&store)
            .submit_create(&principal(&[]), submission, Utc::now())
            .await
            .unwrap()
            .into_page()
            .expect("re-rendered");

        assert!(page.form.errors().has_field_error("name"));
        assert_eq!(page.form.errors().non_field().len(), 1);
        assert!(store.list_products(ProductFilter::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn caller_without_rights_is_denied_before_any_form() {
        let store = Arc::new(InMemoryStore::new());
        let (product, _) = seed(&store, UserId::new(), &[]).await;
        let stranger = principal(&[CAN_EDIT_CATEGORY]);

        let render = editor(&store).render_edit(&stranger, product.id).await;
        assert!(matches!(render, Err(EditorError::Denied(_))));

        let submit = editor(&store)
            .submit_edit(&stranger, product.id, ProductSubmission::default(), Utc::now())
            .await;
        assert!(matches!(submit, Err(EditorError::Denied(_))));
    }

    #[tokio::test]
    async fn unknown_product_is_not_found() {
        let store = Arc::new(InMemoryStore::new());
        let result = editor(&store).render_edit(&principal(&[]), ProductId::new()).await;
        assert!(matches!(result, Err(EditorError::NotFound)));
    }

    #[tokio::test]
    async fn create_then_edit_leaves_exactly_one_active_version() {
        let store = Arc::new(InMemoryStore::new());
        let owner = principal(&[]);
        let ed = editor(&store);

        ed.submit_create(
            &owner,
            ProductSubmission {
                product: product_input("Планшет"),
                versions: vec![],
            },
            Utc::now(),
        )
        .await
        .unwrap();
        let product = store.list_products(ProductFilter::default()).await.unwrap().remove(0);

        let outcome = ed
            .submit_edit(
                &owner,
                product.id,
                ProductSubmission {
                    product: product_input("Планшет"),
                    versions: vec![new_version(1, "Первая", true)],
                },
                Utc::now(),
            )
            .await
            .unwrap();
        assert_eq!(outcome.destination(), Some(Destination::ProductDetail(product.id)));

        let versions = store.list_versions(product.id).await.unwrap();
        let active: Vec<_> = versions.iter().filter(|v| v.is_active).collect();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].version_name, "Первая");
    }

    #[tokio::test]
    async fn content_manager_edits_only_publication_and_photo() {
        let store = Arc::new(InMemoryStore::new());
        let (product, versions) = seed(&store, UserId::new(), &[(1, "v1", false)]).await;
        let manager = principal(&[SET_PUBLISHED, CAN_EDIT_CATEGORY]);

        let page = editor(&store).render_edit(&manager, product.id).await.unwrap();
        assert_eq!(page.capability, Capability::ContentManagerEdit);
        assert!(!page.formset.can_delete());

        let mut input = product_input("Новое имя");
        input.photo = Some("photo.jpg".into());
        input.is_published = Some(true);
        let mut marked = existing_version(&versions[0]);
        marked.delete = true;

        editor(&store)
            .submit_edit(
                &manager,
                product.id,
                ProductSubmission {
                    product: input,
                    versions: vec![marked],
                },
                Utc::now(),
            )
            .await
            .unwrap();

        let saved = store.get_product(product.id).await.unwrap().unwrap();
        assert_eq!(saved.name, "Телефон");
        assert_eq!(saved.photo.as_deref(), Some("photo.jpg"));
        assert!(saved.is_published);
        assert_eq!(store.list_versions(product.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn publish_only_edit_keeps_the_stored_photo() {
        let store = Arc::new(InMemoryStore::new());
        let (mut product, _) = seed(&store, UserId::new(), &[]).await;
        product.photo = Some("a.jpg".into());
        store
            .commit_product(ProductWrite {
                product: product.clone(),
                versions: VersionChanges::default(),
            })
            .await
            .unwrap();
        let manager = principal(&[SET_PUBLISHED]);

        let submission: ProductSubmission =
            serde_json::from_value(serde_json::json!({ "product": { "is_published": true } }))
                .unwrap();
        let outcome = editor(&store)
            .submit_edit(&manager, product.id, submission, Utc::now())
            .await
            .unwrap();
        assert_eq!(outcome.destination(), Some(Destination::ProductDetail(product.id)));

        let saved = store.get_product(product.id).await.unwrap().unwrap();
        assert!(saved.is_published);
        assert_eq!(saved.photo.as_deref(), Some("a.jpg"));
    }

    #[tokio::test]
    async fn moderator_may_delete_versions() {
        let store = Arc::new(InMemoryStore::new());
        let (product, versions) = seed(&store, UserId::new(), &[(1, "v1", true)]).await;
        let moderator = principal(&[SET_PUBLISHED, CAN_EDIT_CATEGORY, CAN_EDIT_DESCRIPTION]);

        let mut marked = existing_version(&versions[0]);
        marked.delete = true;
        editor(&store)
            .submit_edit(
                &moderator,
                product.id,
                ProductSubmission {
                    product: product_input("Телефон"),
                    versions: vec![marked],
                },
                Utc::now(),
            )
            .await
            .unwrap();

        assert!(store.list_versions(product.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_requires_owner_or_moderator() {
        let store = Arc::new(InMemoryStore::new());
        let owner = principal(&[]);
        let (product, _) = seed(&store, owner.principal_id, &[(1, "v1", true)]).await;

        let manager = principal(&[SET_PUBLISHED]);
        let denied = editor(&store).delete(&manager, product.id).await;
        assert!(matches!(denied, Err(EditorError::Denied(_))));

        let dest = editor(&store).delete(&owner, product.id).await.unwrap();
        assert_eq!(dest, Destination::Home);
        assert!(store.get_product(product.id).await.unwrap().is_none());
        assert!(store.list_versions(product.id).await.unwrap().is_empty());
    }

    /// Delegates to an in-memory store but rejects every product commit.
    struct FailingCommits(InMemoryStore);

    #[async_trait]
    impl CatalogStore for FailingCommits {
        async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
            self.0.list_categories().await
        }
        async fn get_category(&self, id: CategoryId) -> Result<Option<Category>, StoreError> {
            self.0.get_category(id).await
        }
        async fn save_category(&self, category: Category) -> Result<(), StoreError> {
            self.0.save_category(category).await
        }
        async fn delete_category(&self, id: CategoryId) -> Result<(), StoreError> {
            self.0.delete_category(id).await
        }
        async fn list_products(&self, filter: ProductFilter) -> Result<Vec<Product>, StoreError> {
            self.0.list_products(filter).await
        }
        async fn get_product(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
            self.0.get_product(id).await
        }
        async fn list_versions(&self, product_id: ProductId) -> Result<Vec<Version>, StoreError> {
            self.0.list_versions(product_id).await
        }
        async fn commit_product(&self, _write: ProductWrite) -> Result<(), StoreError> {
            Err(StoreError::Backend("connection reset".into()))
        }
        async fn delete_product(&self, id: ProductId) -> Result<(), StoreError> {
            self.0.delete_product(id).await
        }
        async fn first_contacts(&self) -> Result<Option<ContactsInfo>, StoreError> {
            self.0.first_contacts().await
        }
        async fn save_contacts(&self, contacts: ContactsInfo) -> Result<(), StoreError> {
            self.0.save_contacts(contacts).await
        }
    }

    #[tokio::test]
    async fn store_failure_is_a_commit_error_and_changes_nothing() {
        let inner = InMemoryStore::new();
        let owner = principal(&[]);
        let (product, versions) = seed(&inner, owner.principal_id, &[(1, "v1", true)]).await;
        let store = Arc::new(FailingCommits(inner));
        let ed: ProductEditor<FailingCommits> = ProductEditor::new(Arc::clone(&store));

        let result = ed
            .submit_edit(
                &owner,
                product.id,
                ProductSubmission {
                    product: product_input("Другое имя"),
                    versions: vec![existing_version(&versions[0])],
                },
                Utc::now(),
            )
            .await;

        assert!(matches!(result, Err(EditorError::Commit)));
        assert_eq!(store.get_product(product.id).await.unwrap().unwrap().name, "Телефон");
        assert_eq!(store.list_versions(product.id).await.unwrap(), versions);
    }

    #[test]
    fn submission_accepts_numbers_or_text() {
        let submission: ProductSubmission = serde_json::from_value(serde_json::json!({
            "product": { "name": "x", "price": 10.5 },
            "versions": [{ "version_number": "2", "version_name": "b", "is_active": true }]
        }))
        .unwrap();
        assert_eq!(submission.product.price.map(|p| p.as_text()).as_deref(), Some("10.5"));
        assert_eq!(submission.versions[0].version_number, Some(NumericInput::Text("2".into())));
        assert!(!submission.versions[0].delete);
    }

    #[tokio::test]
    async fn editor_works_behind_a_trait_object() {
        let store: Arc<dyn CatalogStore> = Arc::new(InMemoryStore::new());
        let ed = ProductEditor::new(store);
        assert!(ed.render_create(&principal(&[])).await.is_ok());
    }
}
