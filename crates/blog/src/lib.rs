//! Blog domain: articles with a publication flag and a view counter.

pub mod article;

pub use article::{Article, ArticleChanges, ArticleForm, ArticleInput, ArticlePreview};
