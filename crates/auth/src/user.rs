//! User accounts: email-based identity, password hashing and the
//! registration / profile forms.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng};
use argon2::Argon2;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::ValidateEmail;

use vitrina_core::form::{self, FieldKind, FieldSpec, FormErrors};
use vitrina_core::{Entity, UserId};

use crate::Role;

/// Shortest password accepted at registration.
pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Hash(String),
}

/// Hash a plaintext password (argon2id, random salt, PHC string format).
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::Hash(e.to_string()))
}

/// Check a plaintext password against a stored PHC hash.
///
/// A hash that does not parse never matches.
pub fn verify_password(password_hash: &str, password: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// A user account. The email is the login identifier and is unique.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub password_hash: String,
    pub phone: Option<String>,
    pub country: Option<String>,
    pub avatar: Option<String>,
    pub is_active: bool,
    pub roles: Vec<Role>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create an active account; the password is hashed here and never kept.
    pub fn new(email: impl Into<String>, password: &str, now: DateTime<Utc>) -> Result<Self, PasswordError> {
        Ok(Self {
            id: UserId::new(),
            email: normalize_email(&email.into()),
            password_hash: hash_password(password)?,
            phone: None,
            country: None,
            avatar: None,
            is_active: true,
            roles: Vec::new(),
            created_at: now,
        })
    }

    pub fn with_roles(mut self, roles: Vec<Role>) -> Self {
        self.roles = roles;
        self
    }

    pub fn check_password(&self, password: &str) -> bool {
        verify_password(&self.password_hash, password)
    }

    pub fn set_password(&mut self, password: &str) -> Result<(), PasswordError> {
        self.password_hash = hash_password(password)?;
        Ok(())
    }
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Emails compare case-insensitively on the domain part only.
pub fn normalize_email(email: &str) -> String {
    let email = email.trim();
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{local}@{}", domain.to_lowercase()),
        None => email.to_string(),
    }
}

fn clean_email(errors: &mut FormErrors, spec: &FieldSpec, raw: Option<&str>) -> Option<String> {
    let value = form::clean_text(errors, spec, raw)?;
    if value.is_empty() {
        return Some(value);
    }
    if !value.validate_email() {
        errors.add(spec.name, "enter a valid email address");
        return None;
    }
    Some(normalize_email(&value))
}

// ─────────────────────────────────────────────────────────────────────────────
// Registration
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterInput {
    pub email: Option<String>,
    pub password1: Option<String>,
    pub password2: Option<String>,
}

/// Cleaned registration data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub email: String,
    pub password: String,
}

/// Registration form. Password values are never echoed back.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterForm {
    pub email: Option<String>,
    pub errors: FormErrors,
}

impl RegisterForm {
    pub const EMAIL: FieldSpec = FieldSpec::new("email", "Email", FieldKind::Email).required();
    pub const PASSWORD1: FieldSpec = FieldSpec::new("password1", "Password", FieldKind::Password).required();
    pub const PASSWORD2: FieldSpec =
        FieldSpec::new("password2", "Password confirmation", FieldKind::Password).required();

    pub const FIELDS: [FieldSpec; 3] = [Self::EMAIL, Self::PASSWORD1, Self::PASSWORD2];

    pub fn unbound() -> Self {
        Self {
            email: None,
            errors: FormErrors::new(),
        }
    }

    /// Validate everything that does not need the store.
    ///
    /// Email uniqueness is checked by the caller, which attaches its error via
    /// [`RegisterForm::reject_email`].
    pub fn clean(input: &RegisterInput) -> (Self, Option<Registration>) {
        let mut errors = FormErrors::new();

        let email = clean_email(&mut errors, &Self::EMAIL, input.email.as_deref());
        // Passwords are not trimmed.
        let password1 = required_password(&mut errors, &Self::PASSWORD1, input.password1.as_deref());
        let password2 = required_password(&mut errors, &Self::PASSWORD2, input.password2.as_deref());

        if let (Some(p1), Some(p2)) = (password1, password2) {
            if p1 != p2 {
                errors.add(Self::PASSWORD2.name, "the two password fields didn't match");
            } else {
                check_password_strength(&mut errors, p1);
            }
        }

        let form = Self {
            email: input.email.clone(),
            errors,
        };
        let cleaned = match (&email, password1) {
            (Some(email), Some(password)) if form.errors.is_empty() => Some(Registration {
                email: email.clone(),
                password: password.to_string(),
            }),
            _ => None,
        };
        (form, cleaned)
    }

    pub fn reject_email(&mut self, message: impl Into<String>) {
        self.errors.add(Self::EMAIL.name, message);
    }
}

fn required_password<'a>(errors: &mut FormErrors, spec: &FieldSpec, raw: Option<&'a str>) -> Option<&'a str> {
    match raw {
        Some(value) if !value.is_empty() => Some(value),
        _ => {
            errors.add(spec.name, form::REQUIRED);
            None
        }
    }
}

fn check_password_strength(errors: &mut FormErrors, password: &str) {
    let field = RegisterForm::PASSWORD2.name;
    if password.chars().count() < MIN_PASSWORD_LEN {
        errors.add(
            field,
            format!("this password is too short; it must contain at least {MIN_PASSWORD_LEN} characters"),
        );
    }
    if password.chars().all(|c| c.is_ascii_digit()) {
        errors.add(field, "this password is entirely numeric");
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Profile
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileInput {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub country: Option<String>,
    pub avatar: Option<String>,
}

/// Cleaned profile changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileChanges {
    pub email: String,
    pub phone: Option<String>,
    pub country: Option<String>,
    pub avatar: Option<String>,
}

impl ProfileChanges {
    pub fn apply_to(self, user: &mut User) {
        user.email = self.email;
        user.phone = self.phone;
        user.country = self.country;
        user.avatar = self.avatar;
    }
}

/// Profile form; the password is not part of it.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileForm {
    pub values: ProfileInput,
    pub errors: FormErrors,
}

impl ProfileForm {
    pub const EMAIL: FieldSpec = FieldSpec::new("email", "Email", FieldKind::Email).required();
    pub const PHONE: FieldSpec = FieldSpec::new("phone", "Phone", FieldKind::Text).max_length(35);
    pub const COUNTRY: FieldSpec = FieldSpec::new("country", "Country", FieldKind::Text).max_length(100);
    pub const AVATAR: FieldSpec = FieldSpec::new("avatar", "Avatar", FieldKind::File);

    pub const FIELDS: [FieldSpec; 4] = [Self::EMAIL, Self::PHONE, Self::COUNTRY, Self::AVATAR];

    pub fn for_user(user: &User) -> Self {
        Self {
            values: ProfileInput {
                email: Some(user.email.clone()),
                phone: user.phone.clone(),
                country: user.country.clone(),
                avatar: user.avatar.clone(),
            },
            errors: FormErrors::new(),
        }
    }

    pub fn clean(input: ProfileInput) -> (Self, Option<ProfileChanges>) {
        let mut errors = FormErrors::new();

        let email = clean_email(&mut errors, &Self::EMAIL, input.email.as_deref());
        let phone = form::clean_text(&mut errors, &Self::PHONE, input.phone.as_deref());
        let country = form::clean_text(&mut errors, &Self::COUNTRY, input.country.as_deref());
        let avatar = form::clean_text(&mut errors, &Self::AVATAR, input.avatar.as_deref());

        let cleaned = match (email, phone, country, avatar) {
            (Some(email), Some(phone), Some(country), Some(avatar)) if errors.is_empty() => {
                Some(ProfileChanges {
                    email,
                    phone: form::non_blank(phone),
                    country: form::non_blank(country),
                    avatar: form::non_blank(avatar),
                })
            }
            _ => None,
        };

        (
            Self {
                values: input,
                errors,
            },
            cleaned,
        )
    }

    pub fn reject_email(&mut self, message: impl Into<String>) {
        self.errors.add(Self::EMAIL.name, message);
    }
}
