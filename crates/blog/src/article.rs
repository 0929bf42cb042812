use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vitrina_core::form::{self, FieldKind, FieldSpec, FormErrors};
use vitrina_core::text::{PREVIEW_CHARS, slugify, truncate_chars};
use vitrina_core::{ArticleId, Entity};

pub const TITLE_MAX_CHARS: usize = 150;

/// A blog article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub id: ArticleId,
    pub title: String,
    /// Derived from the title when the article is created; kept on edits.
    pub slug: Option<String>,
    pub content: String,
    pub photo: Option<String>,
    pub created_at: DateTime<Utc>,
    pub is_published: bool,
    pub views_count: u64,
}

impl Article {
    pub fn new(title: impl Into<String>, content: impl Into<String>, now: DateTime<Utc>) -> Self {
        let title = title.into();
        let slug = Some(slugify(&title)).filter(|s| !s.is_empty());
        Self {
            id: ArticleId::new(),
            title,
            slug,
            content: content.into(),
            photo: None,
            created_at: now,
            is_published: true,
            views_count: 0,
        }
    }

    pub fn preview(&self) -> ArticlePreview {
        ArticlePreview {
            id: self.id,
            title: self.title.clone(),
            slug: self.slug.clone(),
            excerpt: truncate_chars(&self.content, PREVIEW_CHARS),
            photo: self.photo.clone(),
            created_at: self.created_at,
            views_count: self.views_count,
        }
    }
}

impl Entity for Article {
    type Id = ArticleId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// List-page view of an article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArticlePreview {
    pub id: ArticleId,
    pub title: String,
    pub slug: Option<String>,
    pub excerpt: String,
    pub photo: Option<String>,
    pub created_at: DateTime<Utc>,
    pub views_count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArticleInput {
    pub title: Option<String>,
    pub content: Option<String>,
    pub photo: Option<String>,
    pub is_published: Option<bool>,
}

/// Cleaned article values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleChanges {
    pub title: String,
    pub content: String,
    pub photo: Option<String>,
    pub is_published: bool,
}

impl ArticleChanges {
    /// A new article built from these values; its slug comes from the title.
    pub fn into_article(self, now: DateTime<Utc>) -> Article {
        let mut article = Article::new(self.title, self.content, now);
        article.photo = self.photo;
        article.is_published = self.is_published;
        article
    }

    pub fn apply_to(self, article: &mut Article) {
        article.title = self.title;
        article.content = self.content;
        article.photo = self.photo;
        article.is_published = self.is_published;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArticleForm {
    pub values: ArticleInput,
    pub errors: FormErrors,
}

impl ArticleForm {
    pub const TITLE: FieldSpec = FieldSpec::new("title", "Title", FieldKind::Text)
        .required()
        .max_length(TITLE_MAX_CHARS);
    pub const CONTENT: FieldSpec = FieldSpec::new("content", "Content", FieldKind::TextArea).required();
    pub const PHOTO: FieldSpec = FieldSpec::new("photo", "Photo", FieldKind::File);
    pub const IS_PUBLISHED: FieldSpec = FieldSpec::new("is_published", "Published", FieldKind::Boolean);

    pub const FIELDS: [FieldSpec; 4] = [Self::TITLE, Self::CONTENT, Self::PHOTO, Self::IS_PUBLISHED];

    pub fn unbound() -> Self {
        Self {
            values: ArticleInput {
                is_published: Some(true),
                ..ArticleInput::default()
            },
            errors: FormErrors::new(),
        }
    }

    pub fn for_article(article: &Article) -> Self {
        Self {
            values: ArticleInput {
                title: Some(article.title.clone()),
                content: Some(article.content.clone()),
                photo: article.photo.clone(),
                is_published: Some(article.is_published),
            },
            errors: FormErrors::new(),
        }
    }

    pub fn clean(input: ArticleInput) -> (Self, Option<ArticleChanges>) {
        let mut errors = FormErrors::new();

        let title = form::clean_text(&mut errors, &Self::TITLE, input.title.as_deref());
        let content = form::clean_text(&mut errors, &Self::CONTENT, input.content.as_deref());
        let photo = form::clean_text(&mut errors, &Self::PHOTO, input.photo.as_deref());

        let cleaned = match (title, content, photo) {
            (Some(title), Some(content), Some(photo)) if errors.is_empty() => Some(ArticleChanges {
                title,
                content,
                photo: form::non_blank(photo),
                is_published: input.is_published.unwrap_or(false),
            }),
            _ => None,
        };

        (
            Self {
                values: input,
                errors,
            },
            cleaned,
        )
    }
}
