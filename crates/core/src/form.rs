//! Form plumbing shared by every editing surface.
//!
//! A form here is plain data: a list of field descriptors, the submitted (or
//! initial) values, and the errors collected while cleaning them. Rendering
//! is left to the client; the only presentation concern kept server-side is
//! the CSS class each field kind gets (see [`style_fields`]).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Message attached to a required field submitted blank.
pub const REQUIRED: &str = "this field is required";

/// Errors collected while validating one form.
///
/// Field errors are keyed by field name. Non-field errors belong to the form
/// as a whole (cross-field or cross-form rules).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormErrors {
    non_field: Vec<String>,
    fields: BTreeMap<String, Vec<String>>,
}

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach an error to a named field.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    /// Attach an error to the form itself.
    pub fn add_non_field(&mut self, message: impl Into<String>) {
        self.non_field.push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.non_field.is_empty() && self.fields.is_empty()
    }

    pub fn non_field(&self) -> &[String] {
        &self.non_field
    }

    pub fn field(&self, name: &str) -> &[String] {
        self.fields.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_field_error(&self, name: &str) -> bool {
        !self.field(name).is_empty()
    }

    /// Total number of messages, field and non-field.
    pub fn len(&self) -> usize {
        self.non_field.len() + self.fields.values().map(Vec::len).sum::<usize>()
    }
}

/// `field: message; field: message`, non-field messages first.
impl std::fmt::Display for FormErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let non_field = self.non_field.iter().map(String::clone);
        let fields = self
            .fields
            .iter()
            .flat_map(|(name, messages)| messages.iter().map(move |m| format!("{name}: {m}")));
        let parts: Vec<String> = non_field.chain(fields).collect();
        f.write_str(&parts.join("; "))
    }
}

/// Widget family of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    TextArea,
    Integer,
    Decimal,
    Boolean,
    Email,
    Choice,
    File,
    Password,
}

/// Static description of a form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
}

impl FieldSpec {
    pub const fn new(name: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            label,
            kind,
            required: false,
            max_length: None,
        }
    }

    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub const fn max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }
}

/// A field descriptor together with its presentation class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StyledField {
    #[serde(flatten)]
    pub spec: FieldSpec,
    pub css_class: &'static str,
}

/// CSS class for a widget kind: checkboxes get `form-check-input`, every
/// other widget gets `form-control`.
pub fn css_class(kind: FieldKind) -> &'static str {
    match kind {
        FieldKind::Boolean => "form-check-input",
        _ => "form-control",
    }
}

/// Attach a CSS class to each field descriptor.
pub fn style_fields(specs: &[FieldSpec]) -> Vec<StyledField> {
    specs
        .iter()
        .map(|spec| StyledField {
            spec: *spec,
            css_class: css_class(spec.kind),
        })
        .collect()
}

/// Clean a free-text value: trim, enforce required-ness and max length.
///
/// Returns `None` when an error was recorded. A blank optional field cleans
/// to an empty string.
pub fn clean_text(errors: &mut FormErrors, spec: &FieldSpec, raw: Option<&str>) -> Option<String> {
    let value = raw.map(str::trim).unwrap_or_default();

    if value.is_empty() {
        if spec.required {
            errors.add(spec.name, REQUIRED);
            return None;
        }
        return Some(String::new());
    }

    if let Some(max) = spec.max_length {
        let len = value.chars().count();
        if len > max {
            errors.add(
                spec.name,
                format!("ensure this value has at most {max} characters (it has {len})"),
            );
            return None;
        }
    }

    Some(value.to_string())
}

/// A submitted numeric value, accepted either as a JSON number or as text.
///
/// Kept verbatim so a rejected submission can be echoed back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumericInput {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl NumericInput {
    /// Textual form used for parsing.
    pub fn as_text(&self) -> String {
        match self {
            Self::Integer(v) => v.to_string(),
            Self::Float(v) => v.to_string(),
            Self::Text(v) => v.trim().to_string(),
        }
    }
}

impl From<&str> for NumericInput {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Blank optional text becomes `None`.
pub fn non_blank(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAME: FieldSpec = FieldSpec::new("name", "Name", FieldKind::Text)
        .required()
        .max_length(5);
    const NOTE: FieldSpec = FieldSpec::new("note", "Note", FieldKind::TextArea);
    const FLAG: FieldSpec = FieldSpec::new("flag", "Flag", FieldKind::Boolean);

    #[test]
    fn booleans_get_check_class_everything_else_control() {
        let styled = style_fields(&[NAME, NOTE, FLAG]);
        let classes: Vec<_> = styled.iter().map(|f| f.css_class).collect();
        assert_eq!(classes, vec!["form-control", "form-control", "form-check-input"]);
    }

    #[test]
    fn errors_display_as_one_line() {
        let mut errors = FormErrors::new();
        errors.add("email", "enter a valid email address");
        errors.add_non_field("nothing matches");
        assert_eq!(
            errors.to_string(),
            "nothing matches; email: enter a valid email address"
        );
        assert_eq!(FormErrors::new().to_string(), "");
    }

    #[test]
    fn required_blank_text_is_rejected_on_its_field() {
        let mut errors = FormErrors::new();
        assert_eq!(clean_text(&mut errors, &NAME, Some("   ")), None);
        assert_eq!(errors.field("name"), [REQUIRED.to_string()]);
        assert!(errors.non_field().is_empty());
    }

    #[test]
    fn optional_blank_text_cleans_to_empty() {
        let mut errors = FormErrors::new();
        assert_eq!(clean_text(&mut errors, &NOTE, None), Some(String::new()));
        assert!(errors.is_empty());
    }

    #[test]
    fn max_length_counts_characters_not_bytes() {
        let mut errors = FormErrors::new();
        assert_eq!(clean_text(&mut errors, &NAME, Some("гусь")), Some("гусь".to_string()));
        assert_eq!(clean_text(&mut errors, &NAME, Some("гусенок")), None);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn text_is_trimmed() {
        let mut errors = FormErrors::new();
        assert_eq!(clean_text(&mut errors, &NAME, Some("  ab ")), Some("ab".to_string()));
    }

    #[test]
    fn numeric_input_accepts_numbers_and_text() {
        let n: NumericInput = serde_json::from_str("12").unwrap();
        assert_eq!(n.as_text(), "12");
        let n: NumericInput = serde_json::from_str("\" 7.50 \"").unwrap();
        assert_eq!(n.as_text(), "7.50");
    }

    #[test]
    fn non_field_and_field_errors_are_counted_together() {
        let mut errors = FormErrors::new();
        errors.add_non_field("whole form");
        errors.add("name", "one");
        errors.add("name", "two");
        assert_eq!(errors.len(), 3);
        assert!(errors.has_field_error("name"));
        assert!(!errors.has_field_error("note"));
    }
}
