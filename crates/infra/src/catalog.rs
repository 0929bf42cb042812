//! Read side of the shop: home page, product detail, categories, contacts.

use std::sync::Arc;

use serde::Serialize;
use tracing::instrument;

use vitrina_catalog::{Category, ContactsInfo, Price, Product, Version};
use vitrina_core::text::{PREVIEW_CHARS, truncate_chars};
use vitrina_core::{CategoryId, ProductId};

use crate::store::{CatalogStore, ProductFilter, StoreError};

/// Home-page card of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductSummary {
    pub id: ProductId,
    pub name: String,
    pub excerpt: String,
    pub photo: Option<String>,
    pub category: Option<CategoryId>,
    pub price: Price,
}

impl From<&Product> for ProductSummary {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            excerpt: truncate_chars(&product.description, PREVIEW_CHARS),
            photo: product.photo.clone(),
            category: product.category,
            price: product.price,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductDetail {
    pub product: Product,
    pub versions: Vec<Version>,
    pub active_version: Option<Version>,
}

pub struct CatalogQueries<S: CatalogStore + ?Sized> {
    store: Arc<S>,
}

impl<S: CatalogStore + ?Sized> Clone for CatalogQueries<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: CatalogStore + ?Sized> CatalogQueries<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Published products, newest first.
    #[instrument(skip(self))]
    pub async fn home(&self, category: Option<CategoryId>) -> Result<Vec<ProductSummary>, StoreError> {
        let filter = ProductFilter {
            category,
            ..ProductFilter::published()
        };
        let products = self.store.list_products(filter).await?;
        Ok(products.iter().map(ProductSummary::from).collect())
    }

    #[instrument(skip(self))]
    pub async fn product_detail(&self, id: ProductId) -> Result<Option<ProductDetail>, StoreError> {
        let Some(product) = self.store.get_product(id).await? else {
            return Ok(None);
        };
        let versions = self.store.list_versions(id).await?;
        let active_version = versions.iter().find(|v| v.is_active).cloned();
        Ok(Some(ProductDetail {
            product,
            versions,
            active_version,
        }))
    }

    pub async fn categories(&self) -> Result<Vec<Category>, StoreError> {
        self.store.list_categories().await
    }

    pub async fn contacts(&self) -> Result<Option<ContactsInfo>, StoreError> {
        self.store.first_contacts().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use vitrina_catalog::VersionChanges;
    use vitrina_core::UserId;

    use crate::store::{InMemoryStore, ProductWrite};

    async fn put(store: &InMemoryStore, name: &str, published: bool, age_mins: i64, versions: Vec<Version>) -> Product {
        let mut product = Product::new(UserId::new(), Utc::now() - Duration::minutes(age_mins));
        product.name = name.into();
        product.description = "д".repeat(150);
        product.is_published = published;
        let versions = versions
            .into_iter()
            .map(|mut v| {
                v.product_id = product.id;
                v
            })
            .collect();
        store
            .commit_product(ProductWrite {
                product: product.clone(),
                versions: VersionChanges {
                    save: versions,
                    delete: vec![],
                },
            })
            .await
            .unwrap();
        product
    }

    #[tokio::test]
    async fn home_lists_published_newest_first_with_excerpts() {
        let store = Arc::new(InMemoryStore::new());
        put(&store, "old", true, 10, vec![]).await;
        put(&store, "new", true, 1, vec![]).await;
        put(&store, "hidden", false, 0, vec![]).await;

        let home = CatalogQueries::new(Arc::clone(&store)).home(None).await.unwrap();
        let names: Vec<_> = home.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["new", "old"]);
        assert!(home[0].excerpt.ends_with("..."));
        assert_eq!(home[0].excerpt.chars().count(), PREVIEW_CHARS + 3);
    }

    #[tokio::test]
    async fn detail_picks_the_active_version() {
        let store = Arc::new(InMemoryStore::new());
        let placeholder = ProductId::new();
        let product = put(
            &store,
            "p",
            true,
            0,
            vec![
                Version::new(placeholder, 1, "first", false),
                Version::new(placeholder, 2, "second", true),
            ],
        )
        .await;

        let detail = CatalogQueries::new(store).product_detail(product.id).await.unwrap().unwrap();
        assert_eq!(detail.versions.len(), 2);
        assert_eq!(detail.active_version.map(|v| v.version_name).as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn contacts_page_shows_the_first_record() {
        let store = Arc::new(InMemoryStore::new());
        store
            .save_contacts(ContactsInfo::new("+7 495 000-00-00", "shop@example.com", "Москва"))
            .await
            .unwrap();
        store
            .save_contacts(ContactsInfo::new("+7 812 000-00-00", "spb@example.com", "Санкт-Петербург"))
            .await
            .unwrap();

        let contacts = CatalogQueries::new(store).contacts().await.unwrap().unwrap();
        assert_eq!(contacts.email, "shop@example.com");
    }

    #[tokio::test]
    async fn missing_contacts_and_products_are_none() {
        let queries = CatalogQueries::new(Arc::new(InMemoryStore::new()));
        assert!(queries.contacts().await.unwrap().is_none());
        assert!(queries.product_detail(ProductId::new()).await.unwrap().is_none());
    }
}
