use serde::Deserialize;

use vitrina_core::CategoryId;

/// Query string of the home page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HomeQuery {
    pub category: Option<CategoryId>,
}

/// Parse a path id, answering `400` when it is not a valid id.
pub fn parse_id<T: std::str::FromStr>(raw: &str, what: &str) -> Result<T, axum::response::Response> {
    raw.parse().map_err(|_| super::errors::invalid_id(what))
}
