//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store selection and the workflows built on it
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request DTOs and response helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use vitrina_infra::EntityStore;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router over `store`.
pub fn build_app(store: Arc<dyn EntityStore>, jwt_secret: &str, token_ttl: chrono::Duration) -> Router {
    let jwt = Arc::new(vitrina_auth::Hs256JwtValidator::new(jwt_secret));
    let auth_state = middleware::AuthState { jwt: jwt.clone() };

    let services = Arc::new(services::AppServices::new(store, (*jwt).clone(), token_ttl));

    // Protected routes: require a valid bearer token.
    let protected = routes::protected_router().layer(axum::middleware::from_fn_with_state(
        auth_state,
        middleware::auth_middleware,
    ));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::public_router())
        .merge(protected)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(Extension(services)),
        )
}
