use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::info;

use vitrina_auth::Hs256JwtValidator;
use vitrina_core::UserId;
use vitrina_infra::accounts::AccountService;
use vitrina_infra::articles::ArticleService;
use vitrina_infra::catalog::CatalogQueries;
use vitrina_infra::{
    AppConfig, CachedStore, EntityStore, InMemoryCache, InMemoryStore, PostgresStore, ProductEditor,
};

/// Workflows shared by all handlers, each holding the same store.
pub struct AppServices {
    pub products: ProductEditor<dyn EntityStore>,
    pub catalog: CatalogQueries<dyn EntityStore>,
    pub articles: ArticleService<dyn EntityStore>,
    pub accounts: AccountService<dyn EntityStore>,
}

impl AppServices {
    pub fn new(store: Arc<dyn EntityStore>, tokens: Hs256JwtValidator, token_ttl: Duration) -> Self {
        Self {
            products: ProductEditor::new(Arc::clone(&store)),
            catalog: CatalogQueries::new(Arc::clone(&store)),
            articles: ArticleService::new(Arc::clone(&store)),
            accounts: AccountService::new(store, tokens, token_ttl),
        }
    }
}

/// PostgreSQL when a database URL is configured, in-memory otherwise. The
/// catalog listings are cached in front of either when caching is enabled.
pub async fn open_store(config: &AppConfig) -> anyhow::Result<Arc<dyn EntityStore>> {
    let store: Arc<dyn EntityStore> = match &config.database_url {
        Some(url) => {
            let store = PostgresStore::connect(url, config.database_max_connections).await?;
            store.ensure_schema().await?;
            info!("using PostgreSQL store");
            Arc::new(store)
        }
        None => {
            info!("no database_url configured; using in-memory store");
            Arc::new(InMemoryStore::new())
        }
    };

    let Some(ttl) = config.cache_ttl() else {
        return Ok(store);
    };
    info!(ttl_secs = ttl.as_secs(), "catalog listing cache enabled");
    Ok(Arc::new(CachedStore::new(store, Arc::new(InMemoryCache::new()), ttl)))
}

/// Create an administrator in the configured store, or promote the account
/// that already uses `email`.
pub async fn create_superuser(config: &AppConfig, email: &str, password: &str) -> anyhow::Result<UserId> {
    let store = open_store(config).await?;
    let accounts = AccountService::new(
        store,
        Hs256JwtValidator::new(&config.jwt_secret),
        config.jwt_ttl(),
    );
    Ok(accounts.create_superuser(email, password, Utc::now()).await?)
}
