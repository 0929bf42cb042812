//! Account workflow: registration, login (token issue) and the profile page.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument, warn};

use vitrina_auth::user::{
    ProfileForm, ProfileInput, RegisterForm, RegisterInput, normalize_email,
};
use vitrina_auth::{Hs256JwtValidator, JwtClaims, PasswordError, Role, TokenValidationError, User};
use vitrina_core::UserId;
use vitrina_core::form::{FormErrors, StyledField, style_fields};

use crate::destination::{Destination, Submission};
use crate::store::{StoreError, UserStore};

const EMAIL_TAKEN: &str = "a user with this email already exists";

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("this account is inactive")]
    Inactive,

    #[error("user not found")]
    NotFound,

    #[error("rejected: {0}")]
    Rejected(FormErrors),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error("token error: {0}")]
    Token(#[from] TokenValidationError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Bearer token handed out on login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssuedToken {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterPage {
    pub fields: Vec<StyledField>,
    pub form: RegisterForm,
}

impl RegisterPage {
    fn new(form: RegisterForm) -> Self {
        Self {
            fields: style_fields(&RegisterForm::FIELDS),
            form,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfilePage {
    pub fields: Vec<StyledField>,
    pub form: ProfileForm,
}

impl ProfilePage {
    fn new(form: ProfileForm) -> Self {
        Self {
            fields: style_fields(&ProfileForm::FIELDS),
            form,
        }
    }
}

pub struct AccountService<S: UserStore + ?Sized> {
    store: Arc<S>,
    tokens: Hs256JwtValidator,
    token_ttl: Duration,
}

impl<S: UserStore + ?Sized> Clone for AccountService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            tokens: self.tokens.clone(),
            token_ttl: self.token_ttl,
        }
    }
}

impl<S: UserStore + ?Sized> AccountService<S> {
    pub fn new(store: Arc<S>, tokens: Hs256JwtValidator, token_ttl: Duration) -> Self {
        Self {
            store,
            tokens,
            token_ttl,
        }
    }

    pub fn render_register(&self) -> RegisterPage {
        RegisterPage::new(RegisterForm::unbound())
    }

    /// Create an account. Success leads to the login page.
    #[instrument(skip(self, input))]
    pub async fn register(
        &self,
        input: RegisterInput,
        now: DateTime<Utc>,
    ) -> Result<Submission<RegisterPage>, AccountError> {
        let (mut form, cleaned) = RegisterForm::clean(&input);
        let Some(registration) = cleaned else {
            return Ok(Submission::Rerender(RegisterPage::new(form)));
        };

        if self.store.find_user_by_email(&registration.email).await?.is_some() {
            form.reject_email(EMAIL_TAKEN);
            return Ok(Submission::Rerender(RegisterPage::new(form)));
        }

        let user = User::new(registration.email, &registration.password, now)?;
        let id = user.id;
        match self.store.insert_user(user).await {
            Ok(()) => {}
            Err(StoreError::Conflict(_)) => {
                form.reject_email(EMAIL_TAKEN);
                return Ok(Submission::Rerender(RegisterPage::new(form)));
            }
            Err(err) => return Err(err.into()),
        }

        info!(user_id = %id, "user registered");
        Ok(Submission::committed(Destination::Login))
    }

    /// Check credentials and issue a signed bearer token.
    #[instrument(skip(self, input))]
    pub async fn login(&self, input: LoginInput, now: DateTime<Utc>) -> Result<IssuedToken, AccountError> {
        let email = normalize_email(&input.email);
        let Some(user) = self.store.find_user_by_email(&email).await? else {
            return Err(AccountError::InvalidCredentials);
        };
        if !user.check_password(&input.password) {
            warn!(user_id = %user.id, "failed login");
            return Err(AccountError::InvalidCredentials);
        }
        if !user.is_active {
            return Err(AccountError::Inactive);
        }

        let claims = JwtClaims::new(user.id, user.email, user.roles, now, self.token_ttl);
        let access_token = self.tokens.issue(&claims)?;
        info!(user_id = %user.id, "token issued");
        Ok(IssuedToken {
            access_token,
            token_type: "Bearer",
            expires_at: claims.expires_at,
        })
    }

    /// Create an administrator account, or promote the account that already
    /// uses `email`: it gets the admin role, is reactivated and takes the new
    /// password. Input is checked by the registration rules.
    #[instrument(skip(self, password))]
    pub async fn create_superuser(
        &self,
        email: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<UserId, AccountError> {
        let input = RegisterInput {
            email: Some(email.to_string()),
            password1: Some(password.to_string()),
            password2: Some(password.to_string()),
        };
        let (form, cleaned) = RegisterForm::clean(&input);
        let Some(registration) = cleaned else {
            return Err(AccountError::Rejected(form.errors));
        };

        match self.store.find_user_by_email(&registration.email).await? {
            Some(mut user) => {
                user.set_password(&registration.password)?;
                user.is_active = true;
                if !user.roles.iter().any(Role::is_admin) {
                    user.roles.push(Role::admin());
                }
                let id = user.id;
                self.store.update_user(user).await?;
                info!(user_id = %id, "existing user promoted to admin");
                Ok(id)
            }
            None => {
                let user = User::new(registration.email, &registration.password, now)?
                    .with_roles(vec![Role::admin()]);
                let id = user.id;
                self.store.insert_user(user).await?;
                info!(user_id = %id, "superuser created");
                Ok(id)
            }
        }
    }

    pub async fn profile(&self, id: UserId) -> Result<ProfilePage, AccountError> {
        let user = self.load(id).await?;
        Ok(ProfilePage::new(ProfileForm::for_user(&user)))
    }

    /// Update email and contact details. Success leads back to the profile.
    #[instrument(skip(self, input))]
    pub async fn update_profile(
        &self,
        id: UserId,
        input: ProfileInput,
    ) -> Result<Submission<ProfilePage>, AccountError> {
        let mut user = self.load(id).await?;
        let (mut form, cleaned) = ProfileForm::clean(input);
        let Some(changes) = cleaned else {
            return Ok(Submission::Rerender(ProfilePage::new(form)));
        };

        changes.apply_to(&mut user);
        match self.store.update_user(user).await {
            Ok(()) => Ok(Submission::committed(Destination::Profile)),
            Err(StoreError::Conflict(_)) => {
                form.reject_email(EMAIL_TAKEN);
                Ok(Submission::Rerender(ProfilePage::new(form)))
            }
            Err(StoreError::NotFound) => Err(AccountError::NotFound),
            Err(err) => Err(err.into()),
        }
    }

    async fn load(&self, id: UserId) -> Result<User, AccountError> {
        self.store.get_user(id).await?.ok_or(AccountError::NotFound)
    }
}
