//! Infrastructure layer: entity stores, configuration and the request
//! workflows that tie the domain crates to a store.

pub mod accounts;
pub mod articles;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod destination;
pub mod product_editor;
pub mod store;

pub use cache::{CacheBackend, CachedStore, InMemoryCache};
pub use config::{AppConfig, ConfigError};
pub use destination::{Destination, Submission};
pub use product_editor::{EditorError, ProductEditor, ProductPage, ProductSubmission};
pub use store::{ArticleStore, CatalogStore, EntityStore, InMemoryStore, PostgresStore, StoreError, UserStore};
