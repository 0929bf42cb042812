//! Postgres-backed entity store.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError | Scenario |
//! |------------|----------------------|------------|----------|
//! | Database (unique violation) | `23505` | `Conflict` | Email already registered |
//! | Database (foreign key violation) | `23503` | `InvalidWrite` | Unknown category/owner/product |
//! | Database (check constraint violation) | `23514` | `InvalidWrite` | Negative price or version number |
//! | Database (other) | Any other | `Backend` | Other database errors |
//! | PoolClosed / other | N/A | `Backend` | Network errors, connection failures, etc. |
//!
//! ## Atomicity
//!
//! `commit_product` runs in one transaction. Any failure drops the
//! transaction before commit, which rolls it back.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{FromRow, PgPool, Postgres, Row, Transaction};
use tracing::instrument;
use uuid::Uuid;

use vitrina_auth::{Role, User};
use vitrina_blog::Article;
use vitrina_catalog::{Category, ContactsInfo, Price, Product, Version};
use vitrina_core::{ArticleId, CategoryId, ContactsInfoId, ProductId, UserId, VersionId};

use super::{ArticleStore, CatalogStore, ProductFilter, ProductWrite, StoreError, UserStore};

/// Schema the store expects; safe to apply repeatedly.
pub const SCHEMA: &str = include_str!("../../sql/schema.sql");

/// Postgres-backed entity store.
///
/// Uses the SQLx connection pool, which is `Send + Sync` and cheap to clone.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: Arc<PgPool>,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Connect a pool to `database_url`.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create missing tables and indexes.
    #[instrument(skip(self), err)]
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        Ok(())
    }

    async fn upsert_product(
        tx: &mut Transaction<'_, Postgres>,
        product: &Product,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO products
                (id, name, description, photo, category_id, price, owner_id,
                 is_published, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                description = EXCLUDED.description,
                photo = EXCLUDED.photo,
                category_id = EXCLUDED.category_id,
                price = EXCLUDED.price,
                is_published = EXCLUDED.is_published,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.photo)
        .bind(product.category.map(Uuid::from))
        .bind(product.price.amount())
        .bind(product.owner.map(Uuid::from))
        .bind(product.is_published)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("upsert_product", e))?;
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for PostgresStore {
    #[instrument(skip(self), err)]
    async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        let rows = sqlx::query("SELECT id, name, description FROM categories ORDER BY name, id")
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_categories", e))?;
        decode_all::<CategoryRow, _>(&rows)
    }

    #[instrument(skip(self), fields(category_id = %id), err)]
    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>, StoreError> {
        let row = sqlx::query("SELECT id, name, description FROM categories WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_category", e))?;
        decode_optional::<CategoryRow, _>(row)
    }

    #[instrument(skip(self, category), fields(category_id = %category.id), err)]
    async fn save_category(&self, category: Category) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO categories (id, name, description) VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name, description = EXCLUDED.description
            "#,
        )
        .bind(category.id.as_uuid())
        .bind(&category.name)
        .bind(&category.description)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("save_category", e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(category_id = %id), err)]
    async fn delete_category(&self, id: CategoryId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_category", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn list_products(&self, filter: ProductFilter) -> Result<Vec<Product>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, description, photo, category_id, price, owner_id,
                   is_published, created_at, updated_at
            FROM products
            WHERE ($1 = FALSE OR is_published)
              AND ($2::uuid IS NULL OR category_id = $2)
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(filter.published_only)
        .bind(filter.category.map(Uuid::from))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_products", e))?;
        decode_all::<ProductRow, _>(&rows)
    }

    #[instrument(skip(self), fields(product_id = %id), err)]
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, name, description, photo, category_id, price, owner_id,
                   is_published, created_at, updated_at
            FROM products WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_product", e))?;
        decode_optional::<ProductRow, _>(row)
    }

    #[instrument(skip(self), fields(product_id = %product_id), err)]
    async fn list_versions(&self, product_id: ProductId) -> Result<Vec<Version>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, product_id, version_number, version_name, is_active
            FROM versions WHERE product_id = $1
            ORDER BY version_number, id
            "#,
        )
        .bind(product_id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_versions", e))?;
        decode_all::<VersionRow, _>(&rows)
    }

    #[instrument(
        skip(self, write),
        fields(
            product_id = %write.product.id,
            saved = write.versions.save.len(),
            deleted = write.versions.delete.len()
        ),
        err
    )]
    async fn commit_product(&self, write: ProductWrite) -> Result<(), StoreError> {
        let ProductWrite { product, versions } = write;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("commit_product.begin", e))?;

        Self::upsert_product(&mut tx, &product).await?;

        for id in &versions.delete {
            let result = sqlx::query("DELETE FROM versions WHERE id = $1 AND product_id = $2")
                .bind(id.as_uuid())
                .bind(product.id.as_uuid())
                .execute(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("commit_product.delete_version", e))?;
            if result.rows_affected() != 1 {
                return Err(StoreError::InvalidWrite(format!(
                    "version {id} does not belong to product {}",
                    product.id
                )));
            }
        }

        for version in &versions.save {
            if version.product_id != product.id {
                return Err(StoreError::InvalidWrite(format!(
                    "version {} is not addressed to product {}",
                    version.id, product.id
                )));
            }
            let result = sqlx::query(
                r#"
                INSERT INTO versions (id, product_id, version_number, version_name, is_active)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (id) DO UPDATE SET
                    version_number = EXCLUDED.version_number,
                    version_name = EXCLUDED.version_name,
                    is_active = EXCLUDED.is_active
                WHERE versions.product_id = EXCLUDED.product_id
                "#,
            )
            .bind(version.id.as_uuid())
            .bind(product.id.as_uuid())
            .bind(i64::from(version.version_number))
            .bind(&version.version_name)
            .bind(version.is_active)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("commit_product.save_version", e))?;
            if result.rows_affected() != 1 {
                return Err(StoreError::InvalidWrite(format!(
                    "version {} belongs to another product",
                    version.id
                )));
            }
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_product.commit", e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(product_id = %id), err)]
    async fn delete_product(&self, id: ProductId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_product", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn first_contacts(&self) -> Result<Option<ContactsInfo>, StoreError> {
        let row = sqlx::query(
            "SELECT id, phone, email, address FROM contacts ORDER BY created_at, id LIMIT 1",
        )
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("first_contacts", e))?;
        decode_optional::<ContactsRow, _>(row)
    }

    #[instrument(skip(self, contacts), fields(contacts_id = %contacts.id), err)]
    async fn save_contacts(&self, contacts: ContactsInfo) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO contacts (id, phone, email, address) VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE SET
                phone = EXCLUDED.phone, email = EXCLUDED.email, address = EXCLUDED.address
            "#,
        )
        .bind(contacts.id.as_uuid())
        .bind(&contacts.phone)
        .bind(&contacts.email)
        .bind(&contacts.address)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("save_contacts", e))?;
        Ok(())
    }
}

const ARTICLE_COLUMNS: &str =
    "id, title, slug, content, photo, created_at, is_published, views_count";

#[async_trait]
impl ArticleStore for PostgresStore {
    #[instrument(skip(self), err)]
    async fn list_articles(&self, published_only: bool) -> Result<Vec<Article>, StoreError> {
        let sql = format!(
            "SELECT {ARTICLE_COLUMNS} FROM articles WHERE ($1 = FALSE OR is_published) \
             ORDER BY created_at DESC, id DESC"
        );
        let rows = sqlx::query(&sql)
            .bind(published_only)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_articles", e))?;
        decode_all::<ArticleRow, _>(&rows)
    }

    #[instrument(skip(self), fields(article_id = %id), err)]
    async fn get_article(&self, id: ArticleId) -> Result<Option<Article>, StoreError> {
        let sql = format!("SELECT {ARTICLE_COLUMNS} FROM articles WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_article", e))?;
        decode_optional::<ArticleRow, _>(row)
    }

    #[instrument(skip(self, article), fields(article_id = %article.id), err)]
    async fn save_article(&self, article: Article) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO articles
                (id, title, slug, content, photo, created_at, is_published, views_count)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO UPDATE SET
                title = EXCLUDED.title,
                slug = EXCLUDED.slug,
                content = EXCLUDED.content,
                photo = EXCLUDED.photo,
                is_published = EXCLUDED.is_published
            "#,
        )
        .bind(article.id.as_uuid())
        .bind(&article.title)
        .bind(&article.slug)
        .bind(&article.content)
        .bind(&article.photo)
        .bind(article.created_at)
        .bind(article.is_published)
        .bind(i64::try_from(article.views_count).unwrap_or(i64::MAX))
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("save_article", e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(article_id = %id), err)]
    async fn delete_article(&self, id: ArticleId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM articles WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_article", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    #[instrument(skip(self), fields(article_id = %id), err)]
    async fn record_view(&self, id: ArticleId) -> Result<Option<Article>, StoreError> {
        let sql = format!(
            "UPDATE articles SET views_count = views_count + 1 WHERE id = $1 \
             RETURNING {ARTICLE_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("record_view", e))?;
        decode_optional::<ArticleRow, _>(row)
    }
}

const USER_COLUMNS: &str =
    "id, email, password_hash, phone, country, avatar, is_active, roles, created_at";

#[async_trait]
impl UserStore for PostgresStore {
    #[instrument(skip(self), fields(user_id = %id), err)]
    async fn get_user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_user", e))?;
        decode_optional::<UserRow, _>(row)
    }

    #[instrument(skip(self, email), err)]
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let row = sqlx::query(&sql)
            .bind(email)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_user_by_email", e))?;
        decode_optional::<UserRow, _>(row)
    }

    #[instrument(skip(self, user), fields(user_id = %user.id), err)]
    async fn insert_user(&self, user: User) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO users
                (id, email, password_hash, phone, country, avatar, is_active, roles, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.phone)
        .bind(&user.country)
        .bind(&user.avatar)
        .bind(user.is_active)
        .bind(role_names(&user.roles))
        .bind(user.created_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_user", e))?;
        Ok(())
    }

    #[instrument(skip(self, user), fields(user_id = %user.id), err)]
    async fn update_user(&self, user: User) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE users SET
                email = $2, password_hash = $3, phone = $4, country = $5,
                avatar = $6, is_active = $7, roles = $8
            WHERE id = $1
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.phone)
        .bind(&user.country)
        .bind(&user.avatar)
        .bind(user.is_active)
        .bind(role_names(&user.roles))
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_user", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

fn role_names(roles: &[Role]) -> Vec<String> {
    roles.iter().map(|r| r.as_str().to_string()).collect()
}

/// Map SQLx errors to [`StoreError`], keeping the failing operation in the
/// message.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => StoreError::Conflict(msg),
                Some("23503") | Some("23514") => StoreError::InvalidWrite(msg),
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            StoreError::Backend(format!("connection pool closed in {}", operation))
        }
        sqlx::Error::RowNotFound => StoreError::NotFound,
        _ => StoreError::Backend(format!("sqlx error in {}: {}", operation, err)),
    }
}

fn decode_all<R, T>(rows: &[PgRow]) -> Result<Vec<T>, StoreError>
where
    R: for<'r> FromRow<'r, PgRow> + TryInto<T, Error = StoreError>,
{
    rows.iter()
        .map(|row| {
            R::from_row(row)
                .map_err(|e| StoreError::Backend(format!("failed to decode row: {e}")))?
                .try_into()
        })
        .collect()
}

fn decode_optional<R, T>(row: Option<PgRow>) -> Result<Option<T>, StoreError>
where
    R: for<'r> FromRow<'r, PgRow> + TryInto<T, Error = StoreError>,
{
    row.map(|row| decode_all::<R, T>(std::slice::from_ref(&row)))
        .transpose()
        .map(|rows| rows.and_then(|mut v| v.pop()))
}

// SQLx row types

#[derive(Debug)]
struct CategoryRow {
    id: Uuid,
    name: String,
    description: String,
}

impl<'r> FromRow<'r, PgRow> for CategoryRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
        })
    }
}

impl TryFrom<CategoryRow> for Category {
    type Error = StoreError;

    fn try_from(row: CategoryRow) -> Result<Self, Self::Error> {
        Ok(Category {
            id: CategoryId::from_uuid(row.id),
            name: row.name,
            description: row.description,
        })
    }
}

#[derive(Debug)]
struct ProductRow {
    id: Uuid,
    name: String,
    description: String,
    photo: Option<String>,
    category_id: Option<Uuid>,
    price: Decimal,
    owner_id: Option<Uuid>,
    is_published: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for ProductRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            photo: row.try_get("photo")?,
            category_id: row.try_get("category_id")?,
            price: row.try_get("price")?,
            owner_id: row.try_get("owner_id")?,
            is_published: row.try_get("is_published")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl TryFrom<ProductRow> for Product {
    type Error = StoreError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let price = Price::new(row.price)
            .map_err(|e| StoreError::Backend(format!("stored price is invalid: {e}")))?;
        Ok(Product {
            id: ProductId::from_uuid(row.id),
            name: row.name,
            description: row.description,
            photo: row.photo,
            category: row.category_id.map(CategoryId::from_uuid),
            price,
            owner: row.owner_id.map(UserId::from_uuid),
            is_published: row.is_published,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug)]
struct VersionRow {
    id: Uuid,
    product_id: Uuid,
    version_number: i64,
    version_name: String,
    is_active: bool,
}

impl<'r> FromRow<'r, PgRow> for VersionRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            product_id: row.try_get("product_id")?,
            version_number: row.try_get("version_number")?,
            version_name: row.try_get("version_name")?,
            is_active: row.try_get("is_active")?,
        })
    }
}

impl TryFrom<VersionRow> for Version {
    type Error = StoreError;

    fn try_from(row: VersionRow) -> Result<Self, Self::Error> {
        let version_number = u32::try_from(row.version_number).map_err(|_| {
            StoreError::Backend(format!("version number {} out of range", row.version_number))
        })?;
        Ok(Version {
            id: VersionId::from_uuid(row.id),
            product_id: ProductId::from_uuid(row.product_id),
            version_number,
            version_name: row.version_name,
            is_active: row.is_active,
        })
    }
}

#[derive(Debug)]
struct ContactsRow {
    id: Uuid,
    phone: String,
    email: String,
    address: String,
}

impl<'r> FromRow<'r, PgRow> for ContactsRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            phone: row.try_get("phone")?,
            email: row.try_get("email")?,
            address: row.try_get("address")?,
        })
    }
}

impl TryFrom<ContactsRow> for ContactsInfo {
    type Error = StoreError;

    fn try_from(row: ContactsRow) -> Result<Self, Self::Error> {
        Ok(ContactsInfo {
            id: ContactsInfoId::from_uuid(row.id),
            phone: row.phone,
            email: row.email,
            address: row.address,
        })
    }
}

#[derive(Debug)]
struct ArticleRow {
    id: Uuid,
    title: String,
    slug: Option<String>,
    content: String,
    photo: Option<String>,
    created_at: DateTime<Utc>,
    is_published: bool,
    views_count: i64,
}

impl<'r> FromRow<'r, PgRow> for ArticleRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            slug: row.try_get("slug")?,
            content: row.try_get("content")?,
            photo: row.try_get("photo")?,
            created_at: row.try_get("created_at")?,
            is_published: row.try_get("is_published")?,
            views_count: row.try_get("views_count")?,
        })
    }
}

impl TryFrom<ArticleRow> for Article {
    type Error = StoreError;

    fn try_from(row: ArticleRow) -> Result<Self, Self::Error> {
        Ok(Article {
            id: ArticleId::from_uuid(row.id),
            title: row.title,
            slug: row.slug,
            content: row.content,
            photo: row.photo,
            created_at: row.created_at,
            is_published: row.is_published,
            views_count: u64::try_from(row.views_count).unwrap_or_default(),
        })
    }
}

#[derive(Debug)]
struct UserRow {
    id: Uuid,
    email: String,
    password_hash: String,
    phone: Option<String>,
    country: Option<String>,
    avatar: Option<String>,
    is_active: bool,
    roles: Vec<String>,
    created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for UserRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            phone: row.try_get("phone")?,
            country: row.try_get("country")?,
            avatar: row.try_get("avatar")?,
            is_active: row.try_get("is_active")?,
            roles: row.try_get("roles")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: UserId::from_uuid(row.id),
            email: row.email,
            password_hash: row.password_hash,
            phone: row.phone,
            country: row.country,
            avatar: row.avatar,
            is_active: row.is_active,
            roles: row.roles.into_iter().map(Role::new).collect(),
            created_at: row.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_declares_every_table() {
        for table in ["users", "categories", "products", "versions", "contacts", "articles"] {
            assert!(
                SCHEMA.contains(&format!("CREATE TABLE IF NOT EXISTS {table}")),
                "missing table {table}"
            );
        }
    }

    #[test]
    fn row_not_found_maps_to_not_found() {
        assert_eq!(
            map_sqlx_error("get_product", sqlx::Error::RowNotFound),
            StoreError::NotFound
        );
        assert!(matches!(
            map_sqlx_error("connect", sqlx::Error::PoolClosed),
            StoreError::Backend(_)
        ));
    }
}
