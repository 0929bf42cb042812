//! Blog workflow: listing, reading (with view counting) and editing articles.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, instrument};

use vitrina_blog::{Article, ArticleForm, ArticleInput, ArticlePreview};
use vitrina_core::ArticleId;
use vitrina_core::form::{StyledField, style_fields};

use crate::destination::{Destination, Submission};
use crate::store::{ArticleStore, StoreError};

#[derive(Debug, Error)]
pub enum ArticleError {
    #[error("article not found")]
    NotFound,

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// An article form page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArticlePage {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub article_id: Option<ArticleId>,
    pub fields: Vec<StyledField>,
    pub form: ArticleForm,
}

impl ArticlePage {
    fn new(title: &str, article_id: Option<ArticleId>, form: ArticleForm) -> Self {
        Self {
            title: title.to_string(),
            article_id,
            fields: style_fields(&ArticleForm::FIELDS),
            form,
        }
    }
}

pub struct ArticleService<S: ArticleStore + ?Sized> {
    store: Arc<S>,
}

impl<S: ArticleStore + ?Sized> Clone for ArticleService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: ArticleStore + ?Sized> ArticleService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Published articles, newest first.
    pub async fn list(&self) -> Result<Vec<ArticlePreview>, StoreError> {
        let articles = self.store.list_articles(true).await?;
        Ok(articles.iter().map(Article::preview).collect())
    }

    /// Read an article; every read counts as a view.
    #[instrument(skip(self))]
    pub async fn detail(&self, id: ArticleId) -> Result<Article, ArticleError> {
        self.store.record_view(id).await?.ok_or(ArticleError::NotFound)
    }

    pub fn render_create(&self) -> ArticlePage {
        ArticlePage::new("New article", None, ArticleForm::unbound())
    }

    #[instrument(skip(self, input))]
    pub async fn create(
        &self,
        input: ArticleInput,
        now: DateTime<Utc>,
    ) -> Result<Submission<ArticlePage>, ArticleError> {
        let (form, cleaned) = ArticleForm::clean(input);
        let Some(changes) = cleaned else {
            return Ok(Submission::Rerender(ArticlePage::new("New article", None, form)));
        };

        let article = changes.into_article(now);
        let id = article.id;
        self.store.save_article(article).await?;
        info!(article_id = %id, "article created");
        Ok(Submission::committed(Destination::ArticleList))
    }

    pub async fn render_edit(&self, id: ArticleId) -> Result<ArticlePage, ArticleError> {
        let article = self.load(id).await?;
        Ok(ArticlePage::new("Edit article", Some(id), ArticleForm::for_article(&article)))
    }

    #[instrument(skip(self, input))]
    pub async fn update(
        &self,
        id: ArticleId,
        input: ArticleInput,
    ) -> Result<Submission<ArticlePage>, ArticleError> {
        let mut article = self.load(id).await?;
        let (form, cleaned) = ArticleForm::clean(input);
        let Some(changes) = cleaned else {
            return Ok(Submission::Rerender(ArticlePage::new("Edit article", Some(id), form)));
        };

        changes.apply_to(&mut article);
        self.store.save_article(article).await?;
        info!(article_id = %id, "article updated");
        Ok(Submission::committed(Destination::ArticleDetail(id)))
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: ArticleId) -> Result<Destination, ArticleError> {
        match self.store.delete_article(id).await {
            Ok(()) => {
                info!(article_id = %id, "article deleted");
                Ok(Destination::ArticleList)
            }
            Err(StoreError::NotFound) => Err(ArticleError::NotFound),
            Err(err) => Err(err.into()),
        }
    }

    async fn load(&self, id: ArticleId) -> Result<Article, ArticleError> {
        self.store.get_article(id).await?.ok_or(ArticleError::NotFound)
    }
}
