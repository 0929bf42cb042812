//! Entity store boundary.
//!
//! The stores are injected collaborators: the workflow and the HTTP layer
//! hold an `Arc` to something implementing these traits and never reach for
//! global state. Two implementations ship: [`InMemoryStore`] for tests/dev and
//! [`PostgresStore`].

pub mod in_memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use vitrina_auth::User;
use vitrina_blog::Article;
use vitrina_catalog::{Category, ContactsInfo, Product, Version, VersionChanges};
use vitrina_core::{ArticleId, CategoryId, ProductId, UserId};

pub use in_memory::InMemoryStore;
pub use postgres::PostgresStore;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    /// A uniqueness rule was violated (e.g. email already registered).
    #[error("conflict: {0}")]
    Conflict(String),

    /// The write was rejected as a whole; nothing was changed.
    #[error("invalid write: {0}")]
    InvalidWrite(String),

    /// Connection, query or decoding failure in the backend.
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Filter for product listings. Results are newest first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub published_only: bool,
    pub category: Option<CategoryId>,
}

impl ProductFilter {
    pub fn published() -> Self {
        Self {
            published_only: true,
            category: None,
        }
    }

    pub fn matches(&self, product: &Product) -> bool {
        (!self.published_only || product.is_published)
            && self.category.is_none_or(|c| product.category == Some(c))
    }
}

/// A product together with the version rows to write with it, committed as
/// one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductWrite {
    pub product: Product,
    pub versions: VersionChanges,
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Categories ordered by name.
    async fn list_categories(&self) -> Result<Vec<Category>, StoreError>;
    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>, StoreError>;
    async fn save_category(&self, category: Category) -> Result<(), StoreError>;
    /// Delete a category; its products become uncategorised.
    async fn delete_category(&self, id: CategoryId) -> Result<(), StoreError>;

    async fn list_products(&self, filter: ProductFilter) -> Result<Vec<Product>, StoreError>;
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, StoreError>;
    /// Versions of a product ordered by version number.
    async fn list_versions(&self, product_id: ProductId) -> Result<Vec<Version>, StoreError>;

    /// Upsert the product, upsert and delete its versions: all or nothing.
    ///
    /// Every saved or deleted version must belong to `write.product`;
    /// otherwise the whole write fails with [`StoreError::InvalidWrite`].
    async fn commit_product(&self, write: ProductWrite) -> Result<(), StoreError>;
    /// Delete a product and, with it, its versions.
    async fn delete_product(&self, id: ProductId) -> Result<(), StoreError>;

    async fn first_contacts(&self) -> Result<Option<ContactsInfo>, StoreError>;
    async fn save_contacts(&self, contacts: ContactsInfo) -> Result<(), StoreError>;
}

#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Articles newest first.
    async fn list_articles(&self, published_only: bool) -> Result<Vec<Article>, StoreError>;
    async fn get_article(&self, id: ArticleId) -> Result<Option<Article>, StoreError>;
    async fn save_article(&self, article: Article) -> Result<(), StoreError>;
    async fn delete_article(&self, id: ArticleId) -> Result<(), StoreError>;
    /// Increment the view counter and return the updated article.
    async fn record_view(&self, id: ArticleId) -> Result<Option<Article>, StoreError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_user(&self, id: UserId) -> Result<Option<User>, StoreError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    /// Fails with [`StoreError::Conflict`] when the email is taken.
    async fn insert_user(&self, user: User) -> Result<(), StoreError>;
    /// Fails with [`StoreError::Conflict`] when the new email belongs to
    /// another account.
    async fn update_user(&self, user: User) -> Result<(), StoreError>;
}

/// Everything the application persists.
pub trait EntityStore: CatalogStore + ArticleStore + UserStore {}

impl<T> EntityStore for T where T: CatalogStore + ArticleStore + UserStore {}
