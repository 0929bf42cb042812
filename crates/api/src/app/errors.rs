use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::json;

use vitrina_infra::accounts::AccountError;
use vitrina_infra::articles::ArticleError;
use vitrina_infra::{Destination, EditorError, StoreError, Submission};

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

pub fn not_found(what: &str) -> Response {
    json_error(StatusCode::NOT_FOUND, "not_found", format!("{what} not found"))
}

pub fn invalid_id(what: &str) -> Response {
    json_error(StatusCode::BAD_REQUEST, "invalid_id", format!("invalid {what} id"))
}

pub fn path_for(destination: Destination) -> String {
    match destination {
        Destination::Home => "/".to_string(),
        Destination::ProductDetail(id) => format!("/products/{id}"),
        Destination::ArticleList => "/blog".to_string(),
        Destination::ArticleDetail(id) => format!("/blog/{id}"),
        Destination::Login => "/users/login".to_string(),
        Destination::Profile => "/users/profile".to_string(),
    }
}

/// `303 See Other` to the destination's page.
pub fn redirect(destination: Destination) -> Response {
    let location = path_for(destination);
    (
        StatusCode::SEE_OTHER,
        [(header::LOCATION, location.clone())],
        axum::Json(json!({ "redirect": location })),
    )
        .into_response()
}

/// Redirect on commit, `422` with the re-rendered page otherwise.
pub fn submission_response<P: Serialize>(submission: Submission<P>) -> Response {
    match submission {
        Submission::Committed { destination } => redirect(destination),
        Submission::Rerender(page) => (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(page)).into_response(),
    }
}

pub fn store_error_to_response(err: StoreError) -> Response {
    match err {
        StoreError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        StoreError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        other => {
            tracing::error!(error = %other, "store failure");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "store_error",
                "the request could not be completed",
            )
        }
    }
}

pub fn editor_error_to_response(err: EditorError) -> Response {
    match err {
        EditorError::Denied(e) => json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string()),
        EditorError::NotFound => not_found("product"),
        EditorError::Commit => json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "commit_failed",
            "the changes could not be saved",
        ),
        EditorError::Store(e) => store_error_to_response(e),
    }
}

pub fn article_error_to_response(err: ArticleError) -> Response {
    match err {
        ArticleError::NotFound => not_found("article"),
        ArticleError::Store(e) => store_error_to_response(e),
    }
}

pub fn account_error_to_response(err: AccountError) -> Response {
    match err {
        AccountError::InvalidCredentials | AccountError::Inactive => {
            json_error(StatusCode::UNAUTHORIZED, "invalid_credentials", err.to_string())
        }
        AccountError::NotFound => not_found("user"),
        AccountError::Rejected(errors) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            axum::Json(json!({ "error": "invalid_input", "errors": errors })),
        )
            .into_response(),
        AccountError::Store(e) => store_error_to_response(e),
        AccountError::Password(_) | AccountError::Token(_) => {
            tracing::error!(error = %err, "account operation failed");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "the request could not be completed",
            )
        }
    }
}
