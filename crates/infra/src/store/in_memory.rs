use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use vitrina_auth::User;
use vitrina_blog::Article;
use vitrina_catalog::{Category, ContactsInfo, Product, Version};
use vitrina_core::{ArticleId, CategoryId, Entity, ProductId, UserId, VersionId};

use super::{ArticleStore, CatalogStore, ProductFilter, ProductWrite, StoreError, UserStore};

#[derive(Debug, Default)]
struct State {
    categories: HashMap<CategoryId, Category>,
    products: HashMap<ProductId, Product>,
    versions: HashMap<VersionId, Version>,
    contacts: Vec<ContactsInfo>,
    articles: HashMap<ArticleId, Article>,
    users: HashMap<UserId, User>,
}

/// In-memory entity store.
///
/// Intended for tests/dev. Every operation runs under one lock, so a product
/// commit is applied to a copy of the version table and swapped in only once
/// the whole write has been checked.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>, StoreError> {
        self.state
            .read()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>, StoreError> {
        self.state
            .write()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))
    }
}

/// Insert or replace a record in an id-keyed table.
fn upsert<E: Entity>(table: &mut HashMap<E::Id, E>, record: E) {
    table.insert(record.id().clone(), record);
}

/// Same as [`upsert`] for tables whose insertion order matters.
fn upsert_ordered<E: Entity>(rows: &mut Vec<E>, record: E) {
    match rows.iter_mut().find(|r| r.id() == record.id()) {
        Some(existing) => *existing = record,
        None => rows.push(record),
    }
}

fn newest_first_products(products: &mut [Product]) {
    products.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
}

fn newest_first_articles(articles: &mut [Article]) {
    articles.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
}

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        let state = self.read()?;
        let mut categories: Vec<Category> = state.categories.values().cloned().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(categories)
    }

    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>, StoreError> {
        Ok(self.read()?.categories.get(&id).cloned())
    }

    async fn save_category(&self, category: Category) -> Result<(), StoreError> {
        upsert(&mut self.write()?.categories, category);
        Ok(())
    }

    async fn delete_category(&self, id: CategoryId) -> Result<(), StoreError> {
        let mut state = self.write()?;
        if state.categories.remove(&id).is_none() {
            return Err(StoreError::NotFound);
        }
        for product in state.products.values_mut() {
            if product.category == Some(id) {
                product.category = None;
            }
        }
        Ok(())
    }

    async fn list_products(&self, filter: ProductFilter) -> Result<Vec<Product>, StoreError> {
        let state = self.read()?;
        let mut products: Vec<Product> = state
            .products
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        newest_first_products(&mut products);
        Ok(products)
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        Ok(self.read()?.products.get(&id).cloned())
    }

    async fn list_versions(&self, product_id: ProductId) -> Result<Vec<Version>, StoreError> {
        let state = self.read()?;
        let mut versions: Vec<Version> = state
            .versions
            .values()
            .filter(|v| v.product_id == product_id)
            .cloned()
            .collect();
        versions.sort_by(|a, b| a.version_number.cmp(&b.version_number).then(a.id.cmp(&b.id)));
        Ok(versions)
    }

    async fn commit_product(&self, write: ProductWrite) -> Result<(), StoreError> {
        let ProductWrite { product, versions } = write;
        let product_id = product.id;

        let mut state = self.write()?;
        let mut next = state.versions.clone();

        for id in versions.delete {
            match next.get(&id) {
                Some(v) if v.product_id == product_id => {
                    next.remove(&id);
                }
                _ => {
                    return Err(StoreError::InvalidWrite(format!(
                        "version {id} does not belong to product {product_id}"
                    )));
                }
            }
        }

        for version in versions.save {
            if version.product_id != product_id {
                return Err(StoreError::InvalidWrite(format!(
                    "version {} is not addressed to product {product_id}",
                    version.id
                )));
            }
            if let Some(existing) = next.get(&version.id) {
                if existing.product_id != product_id {
                    return Err(StoreError::InvalidWrite(format!(
                        "version {} belongs to another product",
                        version.id
                    )));
                }
            }
            upsert(&mut next, version);
        }

        state.versions = next;
        upsert(&mut state.products, product);
        Ok(())
    }

    async fn delete_product(&self, id: ProductId) -> Result<(), StoreError> {
        let mut state = self.write()?;
        if state.products.remove(&id).is_none() {
            return Err(StoreError::NotFound);
        }
        state.versions.retain(|_, v| v.product_id != id);
        Ok(())
    }

    async fn first_contacts(&self) -> Result<Option<ContactsInfo>, StoreError> {
        Ok(self.read()?.contacts.first().cloned())
    }

    async fn save_contacts(&self, contacts: ContactsInfo) -> Result<(), StoreError> {
        upsert_ordered(&mut self.write()?.contacts, contacts);
        Ok(())
    }
}

#[async_trait]
impl ArticleStore for InMemoryStore {
    async fn list_articles(&self, published_only: bool) -> Result<Vec<Article>, StoreError> {
        let state = self.read()?;
        let mut articles: Vec<Article> = state
            .articles
            .values()
            .filter(|a| !published_only || a.is_published)
            .cloned()
            .collect();
        newest_first_articles(&mut articles);
        Ok(articles)
    }

    async fn get_article(&self, id: ArticleId) -> Result<Option<Article>, StoreError> {
        Ok(self.read()?.articles.get(&id).cloned())
    }

    async fn save_article(&self, article: Article) -> Result<(), StoreError> {
        upsert(&mut self.write()?.articles, article);
        Ok(())
    }

    async fn delete_article(&self, id: ArticleId) -> Result<(), StoreError> {
        match self.write()?.articles.remove(&id) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound),
        }
    }

    async fn record_view(&self, id: ArticleId) -> Result<Option<Article>, StoreError> {
        let mut state = self.write()?;
        Ok(state.articles.get_mut(&id).map(|article| {
            article.views_count += 1;
            article.clone()
        }))
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn get_user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.read()?.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let state = self.read()?;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn insert_user(&self, user: User) -> Result<(), StoreError> {
        let mut state = self.write()?;
        if state.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict(format!("email {} is taken", user.email)));
        }
        upsert(&mut state.users, user);
        Ok(())
    }

    async fn update_user(&self, user: User) -> Result<(), StoreError> {
        let mut state = self.write()?;
        if !state.users.contains_key(&user.id) {
            return Err(StoreError::NotFound);
        }
        if state
            .users
            .values()
            .any(|u| u.id != user.id && u.email == user.email)
        {
            return Err(StoreError::Conflict(format!("email {} is taken", user.email)));
        }
        upsert(&mut state.users, user);
        Ok(())
    }
}
