use axum::{Router, routing::get};

pub mod blog;
pub mod catalog;
pub mod system;
pub mod users;

/// Endpoints anyone may call.
pub fn public_router() -> Router {
    Router::new()
        .merge(catalog::public_router())
        .merge(blog::public_router())
        .merge(users::public_router())
}

/// Endpoints that need a bearer token.
pub fn protected_router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .merge(catalog::protected_router())
        .merge(blog::protected_router())
        .merge(users::protected_router())
}
