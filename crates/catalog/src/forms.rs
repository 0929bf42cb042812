//! Product form and its version sub-form set.
//!
//! Forms are built per [`Capability`]: the product form only carries (and only
//! accepts) the fields the tier may edit, and the version form set only honours
//! deletion marks when the tier may delete versions.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use vitrina_core::form::{REQUIRED, clean_text, non_blank, style_fields};
use vitrina_core::{
    CategoryId, DomainError, FieldKind, FieldSpec, FormErrors, NumericInput, ProductId,
    StyledField, VersionId,
};

use crate::capability::Capability;
use crate::product::{NAME_MAX_CHARS, Price, Product};
use crate::validation::{
    ACTIVE_VERSION_NAME_REQUIRED, ActiveVersion, MULTIPLE_ACTIVE_VERSIONS, check_active_versions,
    validate_text,
};
use crate::version::Version;

pub const INVALID_CHOICE: &str =
    "select a valid choice; that choice is not one of the available choices";

/// An editable product field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductField {
    Name,
    Description,
    Photo,
    Category,
    Price,
    IsPublished,
}

impl ProductField {
    pub const fn spec(self) -> FieldSpec {
        match self {
            Self::Name => FieldSpec::new("name", "Name", FieldKind::Text)
                .required()
                .max_length(NAME_MAX_CHARS),
            Self::Description => {
                FieldSpec::new("description", "Description", FieldKind::TextArea).required()
            }
            Self::Photo => FieldSpec::new("photo", "Photo", FieldKind::File),
            Self::Category => FieldSpec::new("category", "Category", FieldKind::Choice),
            Self::Price => FieldSpec::new("price", "Price", FieldKind::Decimal).required(),
            Self::IsPublished => FieldSpec::new("is_published", "Published", FieldKind::Boolean),
        }
    }
}

/// Raw product values as submitted (or as pre-populated for display).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<NumericInput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_published: Option<bool>,
}

impl ProductInput {
    /// Initial values for a product that does not exist yet.
    pub fn initial() -> Self {
        Self {
            price: Some(NumericInput::Text(Price::zero().to_string())),
            is_published: Some(false),
            ..Self::default()
        }
    }

    pub fn from_product(product: &Product) -> Self {
        Self {
            name: Some(product.name.clone()),
            description: Some(product.description.clone()),
            photo: product.photo.clone(),
            category: product.category.map(|id| id.to_string()),
            price: Some(NumericInput::Text(product.price.to_string())),
            is_published: Some(product.is_published),
        }
    }

    /// Drop every value for a field outside `fields`.
    pub fn restricted_to(mut self, fields: &[ProductField]) -> Self {
        let keep = |f: ProductField| fields.contains(&f);
        if !keep(ProductField::Name) {
            self.name = None;
        }
        if !keep(ProductField::Description) {
            self.description = None;
        }
        if !keep(ProductField::Photo) {
            self.photo = None;
        }
        if !keep(ProductField::Category) {
            self.category = None;
        }
        if !keep(ProductField::Price) {
            self.price = None;
        }
        if !keep(ProductField::IsPublished) {
            self.is_published = None;
        }
        self
    }
}

/// Cleaned product values. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub photo: Option<Option<String>>,
    pub category: Option<Option<CategoryId>>,
    pub price: Option<Price>,
    pub is_published: Option<bool>,
}

impl ProductChanges {
    pub fn apply_to(self, product: &mut Product) {
        if let Some(name) = self.name {
            product.name = name;
        }
        if let Some(description) = self.description {
            product.description = description;
        }
        if let Some(photo) = self.photo {
            product.photo = photo;
        }
        if let Some(category) = self.category {
            product.category = category;
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(is_published) = self.is_published {
            product.is_published = is_published;
        }
    }
}

fn validation_message(err: DomainError) -> String {
    match err {
        DomainError::Validation(msg) => msg,
        other => other.to_string(),
    }
}

/// The primary product form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductForm {
    fields: Vec<StyledField>,
    values: ProductInput,
    errors: FormErrors,
    #[serde(skip)]
    editable: &'static [ProductField],
}

impl ProductForm {
    /// Form pre-populated from `product`, or with initial values when creating.
    pub fn unbound(capability: Capability, product: Option<&Product>) -> Self {
        let values = product
            .map(ProductInput::from_product)
            .unwrap_or_else(ProductInput::initial);
        Self::bind(capability, values)
    }

    /// Form bound to submitted values. Values for fields the tier may not edit
    /// are discarded.
    pub fn bind(capability: Capability, input: ProductInput) -> Self {
        let editable = capability.editable_fields();
        let specs: Vec<FieldSpec> = editable.iter().map(|f| f.spec()).collect();
        Self {
            fields: style_fields(&specs),
            values: input.restricted_to(editable),
            errors: FormErrors::new(),
            editable,
        }
    }

    pub fn fields(&self) -> &[StyledField] {
        &self.fields
    }

    pub fn values(&self) -> &ProductInput {
        &self.values
    }

    pub fn errors(&self) -> &FormErrors {
        &self.errors
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_non_field_error(&mut self, message: impl Into<String>) {
        self.errors.add_non_field(message);
    }

    /// Validate the bound values: structure first, then forbidden words on
    /// name and description. `categories` lists the ids a product may
    /// reference.
    ///
    /// Returns the cleaned changes, or `None` when any field error was
    /// recorded.
    pub fn clean(&mut self, categories: &[CategoryId]) -> Option<ProductChanges> {
        let mut changes = ProductChanges::default();
        let errors = &mut self.errors;
        let values = &self.values;

        for field in self.editable.iter().copied() {
            match field {
                ProductField::Name => {
                    changes.name =
                        clean_free_text(errors, field, "product name", values.name.as_deref());
                }
                ProductField::Description => {
                    changes.description = clean_free_text(
                        errors,
                        field,
                        "description",
                        values.description.as_deref(),
                    );
                }
                // An omitted photo keeps the stored one; an empty string clears it.
                ProductField::Photo => {
                    changes.photo = values.photo.as_deref().and_then(|raw| {
                        clean_text(errors, &field.spec(), Some(raw)).map(non_blank)
                    });
                }
                ProductField::Category => {
                    changes.category = clean_category(errors, values.category.as_deref(), categories);
                }
                ProductField::Price => {
                    changes.price = clean_price(errors, values.price.as_ref());
                }
                ProductField::IsPublished => {
                    changes.is_published = Some(values.is_published.unwrap_or(false));
                }
            }
        }

        if errors.is_empty() { Some(changes) } else { None }
    }
}

fn clean_free_text(
    errors: &mut FormErrors,
    field: ProductField,
    label: &str,
    raw: Option<&str>,
) -> Option<String> {
    let spec = field.spec();
    let value = clean_text(errors, &spec, raw)?;
    if let Err(rejected) = validate_text(&value) {
        errors.add(spec.name, format!("{label} {rejected}"));
        return None;
    }
    Some(value)
}

fn clean_category(
    errors: &mut FormErrors,
    raw: Option<&str>,
    categories: &[CategoryId],
) -> Option<Option<CategoryId>> {
    let raw = raw.map(str::trim).unwrap_or_default();
    if raw.is_empty() {
        return Some(None);
    }
    match raw.parse::<CategoryId>() {
        Ok(id) if categories.contains(&id) => Some(Some(id)),
        _ => {
            errors.add(ProductField::Category.spec().name, INVALID_CHOICE);
            None
        }
    }
}

fn clean_price(errors: &mut FormErrors, raw: Option<&NumericInput>) -> Option<Price> {
    let name = ProductField::Price.spec().name;
    let raw = raw.map(NumericInput::as_text).unwrap_or_default();
    if raw.is_empty() {
        errors.add(name, REQUIRED);
        return None;
    }
    match Price::parse(&raw) {
        Ok(price) => Some(price),
        Err(err) => {
            errors.add(name, validation_message(err));
            None
        }
    }
}

/// Raw values of one version sub-form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VersionInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<VersionId>,
    pub version_number: Option<NumericInput>,
    pub version_name: Option<String>,
    pub is_active: bool,
    pub delete: bool,
}

/// A structurally valid version sub-form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanedVersion {
    pub version_number: u32,
    pub version_name: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Outcome {
    /// Blank extra form, or a new form marked for deletion.
    Skip,
    Delete(VersionId),
    Save(CleanedVersion),
}

/// One version sub-form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VersionForm {
    #[serde(skip_serializing_if = "Option::is_none")]
    instance: Option<VersionId>,
    values: VersionInput,
    errors: FormErrors,
    #[serde(skip)]
    outcome: Option<Outcome>,
}

impl VersionForm {
    pub const VERSION_NUMBER: FieldSpec =
        FieldSpec::new("version_number", "Version number", FieldKind::Integer).required();
    pub const VERSION_NAME: FieldSpec =
        FieldSpec::new("version_name", "Version name", FieldKind::Text).max_length(150);
    pub const IS_ACTIVE: FieldSpec = FieldSpec::new("is_active", "Active", FieldKind::Boolean);
    pub const DELETE: FieldSpec = FieldSpec::new("delete", "Delete", FieldKind::Boolean);

    pub fn for_version(version: &Version) -> Self {
        Self::bound(
            Some(version.id),
            VersionInput {
                id: Some(version.id),
                version_number: Some(NumericInput::Integer(i64::from(version.version_number))),
                version_name: Some(version.version_name.clone()),
                is_active: version.is_active,
                delete: false,
            },
        )
    }

    /// The blank form offered for adding a version.
    pub fn extra() -> Self {
        Self::bound(None, VersionInput::default())
    }

    fn bound(instance: Option<VersionId>, values: VersionInput) -> Self {
        Self {
            instance,
            values,
            errors: FormErrors::new(),
            outcome: None,
        }
    }

    pub fn instance(&self) -> Option<VersionId> {
        self.instance
    }

    pub fn values(&self) -> &VersionInput {
        &self.values
    }

    pub fn errors(&self) -> &FormErrors {
        &self.errors
    }

    pub fn add_error(&mut self, field: &str, message: impl Into<String>) {
        self.errors.add(field, message);
    }

    /// Cleaned values of a form that will be saved.
    pub fn cleaned(&self) -> Option<&CleanedVersion> {
        match &self.outcome {
            Some(Outcome::Save(cleaned)) => Some(cleaned),
            _ => None,
        }
    }

    /// A new form nobody filled in. A deletion mark alone does not count as
    /// input.
    pub fn is_blank(&self) -> bool {
        let blank_number = self
            .values
            .version_number
            .as_ref()
            .is_none_or(|n| n.as_text().is_empty());
        let blank_name = self
            .values
            .version_name
            .as_deref()
            .is_none_or(|n| n.trim().is_empty());
        self.instance.is_none()
            && blank_number
            && blank_name
            && !self.values.is_active
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty() && self.outcome.is_some()
    }

    fn full_clean(&mut self, can_delete: bool) {
        if !self.errors.is_empty() {
            return;
        }

        if can_delete && self.values.delete {
            self.outcome = Some(match self.instance {
                Some(id) => Outcome::Delete(id),
                None => Outcome::Skip,
            });
            return;
        }

        if self.is_blank() {
            self.outcome = Some(Outcome::Skip);
            return;
        }

        let number = clean_version_number(&mut self.errors, self.values.version_number.as_ref());
        let name = clean_text(
            &mut self.errors,
            &Self::VERSION_NAME,
            self.values.version_name.as_deref(),
        );

        if let (Some(version_number), Some(version_name)) = (number, name) {
            self.outcome = Some(Outcome::Save(CleanedVersion {
                version_number,
                version_name,
                is_active: self.values.is_active,
            }));
        }
    }
}

fn clean_version_number(errors: &mut FormErrors, raw: Option<&NumericInput>) -> Option<u32> {
    let name = VersionForm::VERSION_NUMBER.name;
    let text = raw.map(NumericInput::as_text).unwrap_or_default();
    if text.is_empty() {
        errors.add(name, REQUIRED);
        return None;
    }

    match text.parse::<i64>() {
        Ok(n) if n < 0 => {
            errors.add(name, "ensure this value is greater than or equal to 0");
            None
        }
        Ok(n) => match u32::try_from(n) {
            Ok(n) => Some(n),
            Err(_) => {
                errors.add(
                    name,
                    format!("ensure this value is less than or equal to {}", u32::MAX),
                );
                None
            }
        },
        Err(_) => {
            errors.add(name, "enter a whole number");
            None
        }
    }
}

/// Version rows to write alongside their product.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionChanges {
    pub save: Vec<Version>,
    pub delete: Vec<VersionId>,
}

/// Version sub-forms of one product.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VersionFormSet {
    fields: Vec<StyledField>,
    can_delete: bool,
    forms: Vec<VersionForm>,
}

impl VersionFormSet {
    /// Number of blank forms offered for new versions.
    pub const EXTRA: usize = 1;

    /// One form per existing version plus the blank extra form(s).
    pub fn unbound(existing: &[Version], capability: Capability) -> Self {
        let forms = existing
            .iter()
            .map(VersionForm::for_version)
            .chain(std::iter::repeat_with(VersionForm::extra).take(Self::EXTRA))
            .collect();
        Self::with_forms(forms, capability)
    }

    /// Bind submitted sub-forms and validate each one structurally.
    ///
    /// A sub-form naming an id that is not one of `existing` (or naming one
    /// twice) gets an error on `id`. Existing versions the submission does
    /// not mention are kept as they are and still take part in the
    /// version-set rules.
    pub fn bind(existing: &[Version], inputs: Vec<VersionInput>, capability: Capability) -> Self {
        let known: HashSet<VersionId> = existing.iter().map(|v| v.id).collect();
        let mut seen = HashSet::new();

        let mut forms: Vec<VersionForm> = inputs
            .into_iter()
            .map(|input| match input.id {
                Some(id) if known.contains(&id) && seen.insert(id) => {
                    VersionForm::bound(Some(id), input)
                }
                Some(_) => {
                    let mut form = VersionForm::bound(None, input);
                    form.add_error("id", INVALID_CHOICE);
                    form
                }
                None => VersionForm::bound(None, input),
            })
            .collect();

        forms.extend(
            existing
                .iter()
                .filter(|v| !seen.contains(&v.id))
                .map(VersionForm::for_version),
        );

        let mut set = Self::with_forms(forms, capability);
        let can_delete = set.can_delete;
        for form in &mut set.forms {
            form.full_clean(can_delete);
        }
        set
    }

    fn with_forms(forms: Vec<VersionForm>, capability: Capability) -> Self {
        let can_delete = capability.can_delete_versions();
        let mut specs = vec![
            VersionForm::VERSION_NUMBER,
            VersionForm::VERSION_NAME,
            VersionForm::IS_ACTIVE,
        ];
        if can_delete {
            specs.push(VersionForm::DELETE);
        }
        Self {
            fields: style_fields(&specs),
            can_delete,
            forms,
        }
    }

    pub fn forms(&self) -> &[VersionForm] {
        &self.forms
    }

    pub fn can_delete(&self) -> bool {
        self.can_delete
    }

    pub fn is_valid(&self) -> bool {
        self.forms.iter().all(VersionForm::is_valid)
    }

    /// Structurally valid sub-forms flagged active, excluding deletions.
    pub fn active_versions(&self) -> Vec<ActiveVersion<'_>> {
        self.forms
            .iter()
            .enumerate()
            .filter_map(|(index, form)| {
                form.cleaned()
                    .filter(|cleaned| cleaned.is_active)
                    .map(|cleaned| ActiveVersion {
                        index,
                        version_name: &cleaned.version_name,
                    })
            })
            .collect()
    }

    /// Rows to write for `product_id`. Only meaningful once the set is valid.
    pub fn changes(&self, product_id: ProductId) -> VersionChanges {
        let mut changes = VersionChanges::default();
        for form in &self.forms {
            match &form.outcome {
                Some(Outcome::Save(cleaned)) => changes.save.push(Version {
                    id: form.instance.unwrap_or_default(),
                    product_id,
                    version_number: cleaned.version_number,
                    version_name: cleaned.version_name.clone(),
                    is_active: cleaned.is_active,
                }),
                Some(Outcome::Delete(id)) => changes.delete.push(*id),
                Some(Outcome::Skip) | None => {}
            }
        }
        changes
    }
}

/// Apply the version-set rules, attaching errors where they belong: the
/// multiple-active rule to the product form as a whole, the blank-name rule
/// to each offending sub-form's `version_name`.
pub fn enforce_version_rules(form: &mut ProductForm, formset: &mut VersionFormSet) {
    let violations = check_active_versions(&formset.active_versions());

    if violations.multiple_active {
        form.add_non_field_error(MULTIPLE_ACTIVE_VERSIONS);
    }
    for index in violations.unnamed_active {
        if let Some(sub) = formset.forms.get_mut(index) {
            sub.add_error(VersionForm::VERSION_NAME.name, ACTIVE_VERSION_NAME_REQUIRED);
        }
    }
}
