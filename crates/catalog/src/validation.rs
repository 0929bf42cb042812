//! Content and version-set rules.

use thiserror::Error;

/// Words that may not appear in product names or descriptions.
///
/// Matching is a case-insensitive substring test, so inflected forms and
/// words that merely contain one of these are rejected too.
pub const FORBIDDEN_WORDS: [&str; 9] = [
    "казино",
    "криптовалюта",
    "крипта",
    "биржа",
    "дешево",
    "бесплатно",
    "обман",
    "полиция",
    "радар",
];

pub const MULTIPLE_ACTIVE_VERSIONS: &str = "a product may have at most one active version";
pub const ACTIVE_VERSION_NAME_REQUIRED: &str = "an active version must have a version name";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("contains forbidden word '{word}'")]
pub struct ForbiddenWord {
    pub word: &'static str,
}

/// First forbidden word found in `value`, if any.
pub fn contains_forbidden_word(value: &str) -> Option<&'static str> {
    let lowered = value.to_lowercase();
    FORBIDDEN_WORDS
        .iter()
        .copied()
        .find(|word| lowered.contains(word))
}

/// Accept `value` unchanged unless it contains a forbidden word.
pub fn validate_text(value: &str) -> Result<&str, ForbiddenWord> {
    match contains_forbidden_word(value) {
        Some(word) => Err(ForbiddenWord { word }),
        None => Ok(value),
    }
}

/// An active version as seen by the version-set rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveVersion<'a> {
    /// Position of the version's form in its form set.
    pub index: usize,
    pub version_name: &'a str,
}

/// Violations of the version-set rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionSetViolations {
    /// More than one version is active.
    pub multiple_active: bool,
    /// Form indices of active versions with a blank name.
    pub unnamed_active: Vec<usize>,
}

impl VersionSetViolations {
    pub fn is_empty(&self) -> bool {
        !self.multiple_active && self.unnamed_active.is_empty()
    }
}

/// Check the active versions of one submission.
///
/// Both rules are evaluated independently; one does not mask the other.
pub fn check_active_versions(active: &[ActiveVersion<'_>]) -> VersionSetViolations {
    VersionSetViolations {
        multiple_active: active.len() > 1,
        unnamed_active: active
            .iter()
            .filter(|v| v.version_name.trim().is_empty())
            .map(|v| v.index)
            .collect(),
    }
}
