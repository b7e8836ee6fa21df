use tracing::{info, warn};

use super::SessionStore;
use crate::error::AuthError;
use crate::utils::{is_valid_email, mask_email};

/// Minimum password length accepted at signup
const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum length for password input.
/// 128 chars accommodates password managers and passphrases.
const MAX_PASSWORD_LENGTH: usize = 128;

/// Maximum length for a display name
const MAX_NAME_LENGTH: usize = 100;

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub remember_me: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SignupForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// Drives the login and signup forms.
///
/// There is no identity provider behind this: a well-formed form opens a
/// session for the submitted email. Passwords are checked for shape only and
/// are never stored.
pub struct Authenticator<'a> {
    store: &'a SessionStore,
}

impl<'a> Authenticator<'a> {
    pub fn new(store: &'a SessionStore) -> Self {
        Self { store }
    }

    pub fn login(&self, form: &LoginForm) -> Result<(), AuthError> {
        let email = validate_email(&form.email)?;
        if form.password.is_empty() {
            return Err(AuthError::validation("password", "Password is required"));
        }
        if form.password.chars().count() > MAX_PASSWORD_LENGTH {
            return Err(AuthError::validation(
                "password",
                format!("Password must be at most {} characters", MAX_PASSWORD_LENGTH),
            ));
        }

        let config = self.store.config();
        let ttl_hours = if form.remember_me {
            config.remember_me_ttl_hours
        } else {
            config.default_ttl_hours
        };

        self.open_session(email, ttl_hours)?;
        info!(email = %mask_email(email), remember_me = form.remember_me, "Login successful");
        Ok(())
    }

    pub fn signup(&self, form: &SignupForm) -> Result<(), AuthError> {
        let name = form.name.trim();
        if name.is_empty() {
            return Err(AuthError::validation("name", "Name is required"));
        }
        if name.chars().count() > MAX_NAME_LENGTH {
            return Err(AuthError::validation(
                "name",
                format!("Name must be at most {} characters", MAX_NAME_LENGTH),
            ));
        }
        let email = validate_email(&form.email)?;

        let length = form.password.chars().count();
        if length < MIN_PASSWORD_LENGTH {
            return Err(AuthError::validation(
                "password",
                format!("Password must be at least {} characters", MIN_PASSWORD_LENGTH),
            ));
        }
        if length > MAX_PASSWORD_LENGTH {
            return Err(AuthError::validation(
                "password",
                format!("Password must be at most {} characters", MAX_PASSWORD_LENGTH),
            ));
        }
        if form.password != form.confirm_password {
            return Err(AuthError::validation("confirm_password", "Passwords do not match"));
        }

        self.open_session(email, self.store.config().default_ttl_hours)?;
        info!(email = %mask_email(email), "Signup successful");
        Ok(())
    }

    /// Sign out. Always succeeds locally.
    pub fn logout(&self) {
        self.store.clear();
        info!("Logged out");
    }

    fn open_session(&self, email: &str, ttl_hours: i64) -> Result<(), AuthError> {
        self.store.set(email, ttl_hours).map_err(|e| {
            warn!(email = %mask_email(email), error = %e, "Failed to open session");
            AuthError::from(e)
        })
    }
}

fn validate_email(raw: &str) -> Result<&str, AuthError> {
    let email = raw.trim();
    if email.is_empty() {
        return Err(AuthError::validation("email", "Email is required"));
    }
    if !is_valid_email(email) {
        return Err(AuthError::validation("email", "Please enter a valid email address."));
    }
    Ok(email)
}
