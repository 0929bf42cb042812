//! Catalog domain: categories, products, their versions and the shop's
//! contact details.
//!
//! Everything here is deterministic domain logic (no IO, no HTTP, no
//! storage). The editing workflow that ties these pieces to a store lives in
//! `vitrina-infra`.

pub mod capability;
pub mod category;
pub mod contacts;
pub mod forms;
pub mod product;
pub mod validation;
pub mod version;

pub use capability::{Capability, select_editing_capability};
pub use category::Category;
pub use contacts::ContactsInfo;
pub use forms::{
    CleanedVersion, ProductChanges, ProductField, ProductForm, ProductInput, VersionChanges,
    VersionForm, VersionFormSet, VersionInput, enforce_version_rules,
};
pub use product::{Price, Product};
pub use validation::{ForbiddenWord, contains_forbidden_word, validate_text};
pub use version::Version;
