//! Where a caller is sent after a successful write.

use serde::Serialize;

use vitrina_core::{ArticleId, ProductId};

/// Redirect target of a committed submission. The HTTP layer turns it into a
/// path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "page", content = "id", rename_all = "snake_case")]
pub enum Destination {
    Home,
    ProductDetail(ProductId),
    ArticleList,
    ArticleDetail(ArticleId),
    Login,
    Profile,
}

/// Result of handling a submitted form.
#[derive(Debug, Clone, PartialEq)]
pub enum Submission<P> {
    /// Validation failed; show the page again with its errors and the
    /// submitted values. Nothing was written.
    Rerender(P),
    /// Everything was written.
    Committed { destination: Destination },
}

impl<P> Submission<P> {
    pub fn committed(destination: Destination) -> Self {
        Self::Committed { destination }
    }

    pub fn destination(&self) -> Option<Destination> {
        match self {
            Self::Rerender(_) => None,
            Self::Committed { destination } => Some(*destination),
        }
    }

    pub fn into_page(self) -> Option<P> {
        match self {
            Self::Rerender(page) => Some(page),
            Self::Committed { .. } => None,
        }
    }
}
