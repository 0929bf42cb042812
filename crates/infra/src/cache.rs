//! Read-through cache for the catalog listings.
//!
//! [`CachedStore`] wraps any [`EntityStore`] and serves the product listings
//! and the category list from a [`CacheBackend`]. Every write that can change
//! one of them drops the affected keys, whether or not the write succeeded.
//! Entries also expire after a fixed TTL, which bounds staleness when several
//! processes share one database.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

use vitrina_auth::User;
use vitrina_blog::Article;
use vitrina_catalog::{Category, ContactsInfo, Product, Version};
use vitrina_core::{ArticleId, CategoryId, ProductId, UserId};

use crate::store::{
    ArticleStore, CatalogStore, EntityStore, ProductFilter, ProductWrite, StoreError, UserStore,
};

const CATEGORIES_KEY: &str = "catalog:categories";
const PRODUCTS_PREFIX: &str = "catalog:products:";

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("cache backend error: {0}")]
    Backend(String),
}

/// Key/value storage with per-entry expiry. Values are JSON text so a
/// networked backend can hold them as plain strings.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;
    async fn delete(&self, key: &str) -> Result<(), CacheError>;
    /// Drop every key starting with `prefix`.
    async fn delete_prefix(&self, prefix: &str) -> Result<(), CacheError>;
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Process-local cache backend.
#[derive(Debug, Default)]
pub struct InMemoryCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> CacheError {
    CacheError::Backend("lock poisoned".to_string())
}

#[async_trait]
impl CacheBackend for InMemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let now = Instant::now();
        {
            let entries = self.entries.read().map_err(poisoned)?;
            match entries.get(key) {
                None => return Ok(None),
                Some(entry) if !entry.is_expired(now) => return Ok(Some(entry.value.clone())),
                Some(_) => {}
            }
        }
        self.entries.write().map_err(poisoned)?.remove(key);
        Ok(None)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        let entry = CacheEntry {
            value,
            expires_at: Instant::now() + ttl,
        };
        self.entries
            .write()
            .map_err(poisoned)?
            .insert(key.to_string(), entry);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.entries.write().map_err(poisoned)?.remove(key);
        Ok(())
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<(), CacheError> {
        self.entries
            .write()
            .map_err(poisoned)?
            .retain(|key, _| !key.starts_with(prefix));
        Ok(())
    }
}

fn products_key(filter: &ProductFilter) -> String {
    let category = filter
        .category
        .map_or_else(|| "all".to_string(), |id| id.to_string());
    format!(
        "{PRODUCTS_PREFIX}published={}:category={category}",
        filter.published_only
    )
}

/// An [`EntityStore`] whose catalog listings are cached.
pub struct CachedStore<S: EntityStore + ?Sized> {
    inner: Arc<S>,
    cache: Arc<dyn CacheBackend>,
    ttl: Duration,
}

impl<S: EntityStore + ?Sized> CachedStore<S> {
    pub fn new(inner: Arc<S>, cache: Arc<dyn CacheBackend>, ttl: Duration) -> Self {
        Self { inner, cache, ttl }
    }

    /// Serve `key` from the cache, or load it and remember it. Cache failures
    /// are logged and fall through to the store.
    async fn read_through<T, F>(&self, key: &str, load: F) -> Result<T, StoreError>
    where
        T: Serialize + DeserializeOwned,
        F: std::future::Future<Output = Result<T, StoreError>>,
    {
        match self.cached(key).await {
            Ok(Some(value)) => {
                debug!(key, "cache hit");
                return Ok(value);
            }
            Ok(None) => {}
            Err(err) => warn!(key, error = %err, "cache read failed"),
        }

        let value = load.await?;
        if let Err(err) = self.remember(key, &value).await {
            warn!(key, error = %err, "cache write failed");
        }
        Ok(value)
    }

    async fn cached<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        match self.cache.get(key).await? {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    async fn remember<T: Serialize>(&self, key: &str, value: &T) -> Result<(), CacheError> {
        let text = serde_json::to_string(value)?;
        self.cache.set(key, text, self.ttl).await
    }

    async fn invalidate_products(&self) {
        if let Err(err) = self.cache.delete_prefix(PRODUCTS_PREFIX).await {
            warn!(error = %err, "product cache invalidation failed");
        }
    }

    async fn invalidate_categories(&self) {
        if let Err(err) = self.cache.delete(CATEGORIES_KEY).await {
            warn!(error = %err, "category cache invalidation failed");
        }
    }
}

#[async_trait]
impl<S: EntityStore + ?Sized> CatalogStore for CachedStore<S> {
    async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        self.read_through(CATEGORIES_KEY, self.inner.list_categories())
            .await
    }

    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>, StoreError> {
        self.inner.get_category(id).await
    }

    async fn save_category(&self, category: Category) -> Result<(), StoreError> {
        let result = self.inner.save_category(category).await;
        self.invalidate_categories().await;
        result
    }

    async fn delete_category(&self, id: CategoryId) -> Result<(), StoreError> {
        let result = self.inner.delete_category(id).await;
        self.invalidate_categories().await;
        self.invalidate_products().await;
        result
    }

    async fn list_products(&self, filter: ProductFilter) -> Result<Vec<Product>, StoreError> {
        self.read_through(&products_key(&filter), self.inner.list_products(filter))
            .await
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        self.inner.get_product(id).await
    }

    async fn list_versions(&self, product_id: ProductId) -> Result<Vec<Version>, StoreError> {
        self.inner.list_versions(product_id).await
    }

    async fn commit_product(&self, write: ProductWrite) -> Result<(), StoreError> {
        let result = self.inner.commit_product(write).await;
        self.invalidate_products().await;
        result
    }

    async fn delete_product(&self, id: ProductId) -> Result<(), StoreError> {
        let result = self.inner.delete_product(id).await;
        self.invalidate_products().await;
        result
    }

    async fn first_contacts(&self) -> Result<Option<ContactsInfo>, StoreError> {
        self.inner.first_contacts().await
    }

    async fn save_contacts(&self, contacts: ContactsInfo) -> Result<(), StoreError> {
        self.inner.save_contacts(contacts).await
    }
}

#[async_trait]
impl<S: EntityStore + ?Sized> ArticleStore for CachedStore<S> {
    async fn list_articles(&self, published_only: bool) -> Result<Vec<Article>, StoreError> {
        self.inner.list_articles(published_only).await
    }

    async fn get_article(&self, id: ArticleId) -> Result<Option<Article>, StoreError> {
        self.inner.get_article(id).await
    }

    async fn save_article(&self, article: Article) -> Result<(), StoreError> {
        self.inner.save_article(article).await
    }

    async fn delete_article(&self, id: ArticleId) -> Result<(), StoreError> {
        self.inner.delete_article(id).await
    }

    async fn record_view(&self, id: ArticleId) -> Result<Option<Article>, StoreError> {
        self.inner.record_view(id).await
    }
}

#[async_trait]
impl<S: EntityStore + ?Sized> UserStore for CachedStore<S> {
    async fn get_user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        self.inner.get_user(id).await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.inner.find_user_by_email(email).await
    }

    async fn insert_user(&self, user: User) -> Result<(), StoreError> {
        self.inner.insert_user(user).await
    }

    async fn update_user(&self, user: User) -> Result<(), StoreError> {
        self.inner.update_user(user).await
    }
}
