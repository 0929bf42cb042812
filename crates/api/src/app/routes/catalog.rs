use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;

use vitrina_core::ProductId;
use vitrina_infra::ProductSubmission;

use crate::app::dto::{self, HomeQuery};
use crate::app::errors;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn public_router() -> Router {
    Router::new()
        .route("/", get(home))
        .route("/contacts", get(contacts))
        .route("/categories", get(categories))
        .route("/products/:id", get(product_detail))
}

pub fn protected_router() -> Router {
    Router::new()
        .route("/products/new", get(new_product))
        .route("/products", post(create_product))
        .route("/products/:id/edit", get(edit_product).post(update_product))
        .route("/products/:id/delete", post(delete_product))
}

pub async fn home(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<HomeQuery>,
) -> Response {
    match services.catalog.home(query.category).await {
        Ok(items) => (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn contacts(Extension(services): Extension<Arc<AppServices>>) -> Response {
    match services.catalog.contacts().await {
        Ok(Some(contacts)) => (StatusCode::OK, Json(contacts)).into_response(),
        Ok(None) => errors::not_found("contacts"),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn categories(Extension(services): Extension<Arc<AppServices>>) -> Response {
    match services.catalog.categories().await {
        Ok(items) => (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn product_detail(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Response {
    let id: ProductId = match dto::parse_id(&id, "product") {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.catalog.product_detail(id).await {
        Ok(Some(detail)) => (StatusCode::OK, Json(detail)).into_response(),
        Ok(None) => errors::not_found("product"),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn new_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    match services.products.render_create(&principal.principal()).await {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(e) => errors::editor_error_to_response(e),
    }
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<ProductSubmission>,
) -> Response {
    match services
        .products
        .submit_create(&principal.principal(), body, Utc::now())
        .await
    {
        Ok(submission) => errors::submission_response(submission),
        Err(e) => errors::editor_error_to_response(e),
    }
}

pub async fn edit_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    let id: ProductId = match dto::parse_id(&id, "product") {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.products.render_edit(&principal.principal(), id).await {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(e) => errors::editor_error_to_response(e),
    }
}

pub async fn update_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<ProductSubmission>,
) -> Response {
    let id: ProductId = match dto::parse_id(&id, "product") {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services
        .products
        .submit_edit(&principal.principal(), id, body, Utc::now())
        .await
    {
        Ok(submission) => errors::submission_response(submission),
        Err(e) => errors::editor_error_to_response(e),
    }
}

pub async fn delete_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    let id: ProductId = match dto::parse_id(&id, "product") {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.products.delete(&principal.principal(), id).await {
        Ok(destination) => errors::redirect(destination),
        Err(e) => errors::editor_error_to_response(e),
    }
}
