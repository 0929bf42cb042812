use std::sync::Arc;

use axum::{
    Json, Router,
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;

use vitrina_auth::user::{ProfileInput, RegisterInput};
use vitrina_infra::accounts::LoginInput;

use crate::app::errors;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn public_router() -> Router {
    Router::new()
        .route("/users/register", get(register_page).post(register))
        .route("/users/login", post(login))
}

pub fn protected_router() -> Router {
    Router::new().route("/users/profile", get(profile).post(update_profile))
}

pub async fn register_page(Extension(services): Extension<Arc<AppServices>>) -> Response {
    (StatusCode::OK, Json(services.accounts.render_register())).into_response()
}

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<RegisterInput>,
) -> Response {
    match services.accounts.register(body, Utc::now()).await {
        Ok(submission) => errors::submission_response(submission),
        Err(e) => errors::account_error_to_response(e),
    }
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<LoginInput>,
) -> Response {
    match services.accounts.login(body, Utc::now()).await {
        Ok(token) => (StatusCode::OK, Json(token)).into_response(),
        Err(e) => errors::account_error_to_response(e),
    }
}

pub async fn profile(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    match services.accounts.profile(principal.principal_id()).await {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(e) => errors::account_error_to_response(e),
    }
}

pub async fn update_profile(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<ProfileInput>,
) -> Response {
    match services
        .accounts
        .update_profile(principal.principal_id(), body)
        .await
    {
        Ok(submission) => errors::submission_response(submission),
        Err(e) => errors::account_error_to_response(e),
    }
}
