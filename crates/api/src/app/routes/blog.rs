use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;

use vitrina_blog::ArticleInput;
use vitrina_core::ArticleId;

use crate::app::dto;
use crate::app::errors;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn public_router() -> Router {
    Router::new()
        .route("/blog", get(list_articles))
        .route("/blog/:id", get(article_detail))
}

pub fn protected_router() -> Router {
    Router::new()
        .route("/blog/new", get(new_article))
        .route("/blog", post(create_article))
        .route("/blog/:id/edit", get(edit_article).post(update_article))
        .route("/blog/:id/delete", post(delete_article))
}

pub async fn list_articles(Extension(services): Extension<Arc<AppServices>>) -> Response {
    match services.articles.list().await {
        Ok(items) => (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn article_detail(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Response {
    let id: ArticleId = match dto::parse_id(&id, "article") {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.articles.detail(id).await {
        Ok(article) => (StatusCode::OK, Json(article)).into_response(),
        Err(e) => errors::article_error_to_response(e),
    }
}

pub async fn new_article(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(_principal): Extension<PrincipalContext>,
) -> Response {
    (StatusCode::OK, Json(services.articles.render_create())).into_response()
}

pub async fn create_article(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<ArticleInput>,
) -> Response {
    tracing::debug!(caller = %principal.principal_id(), "creating article");
    match services.articles.create(body, Utc::now()).await {
        Ok(submission) => errors::submission_response(submission),
        Err(e) => errors::article_error_to_response(e),
    }
}

pub async fn edit_article(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Response {
    let id: ArticleId = match dto::parse_id(&id, "article") {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.articles.render_edit(id).await {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(e) => errors::article_error_to_response(e),
    }
}

pub async fn update_article(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<ArticleInput>,
) -> Response {
    let id: ArticleId = match dto::parse_id(&id, "article") {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.articles.update(id, body).await {
        Ok(submission) => errors::submission_response(submission),
        Err(e) => errors::article_error_to_response(e),
    }
}

pub async fn delete_article(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Response {
    let id: ArticleId = match dto::parse_id(&id, "article") {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.articles.delete(id).await {
        Ok(destination) => errors::redirect(destination),
        Err(e) => errors::article_error_to_response(e),
    }
}
