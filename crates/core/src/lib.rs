//! `vitrina-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! identifiers, the domain error type, entity/value-object markers and the
//! form plumbing every editing surface shares.

pub mod entity;
pub mod error;
pub mod form;
pub mod id;
pub mod text;
pub mod value_object;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use form::{FieldKind, FieldSpec, FormErrors, NumericInput, StyledField};
pub use id::{ArticleId, CategoryId, ContactsInfoId, ProductId, UserId, VersionId};
pub use value_object::ValueObject;
