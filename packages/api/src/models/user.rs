//! # User model and authentication payloads
//!
//! ## [`UserInfo`]
//!
//! The identity the server reports for a bearer token (`GET /api/me`) and
//! returns alongside a fresh token on login. Read-only on the client. The id
//! is accepted as either `_id` or `id`. The helper [`UserInfo::display_name`]
//! returns the user's name or falls back to their email address.
//!
//! ## Request bodies
//!
//! - [`Credentials`]: email and password sent to `POST /api/login`.
//! - [`RegisterProfile`]: name, email and password sent to
//!   `POST /api/register`. The optional confirmation is checked locally by
//!   [`RegisterProfile::validate`] and never sent.
//!
//! ## [`LoginResponse`]
//!
//! `{ "token": "...", "user": { ... } }` as returned by a successful login.

use serde::{Deserialize, Serialize};

/// Minimum accepted password length for new accounts.
pub const MIN_PASSWORD_LEN: usize = 6;

/// User information returned by the server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserInfo {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl UserInfo {
    /// Get display name, falling back to email if name is not set.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.email)
    }
}

/// Login request body.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.email.trim().is_empty() || self.password.is_empty() {
            return Err("Please enter all the required fields!".to_string());
        }
        Ok(())
    }
}

// Keep passwords out of logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Registration request body.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegisterProfile {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(skip)]
    pub confirm_password: Option<String>,
}

impl RegisterProfile {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password: password.into(),
            confirm_password: None,
        }
    }

    pub fn with_confirmation(mut self, confirm: impl Into<String>) -> Self {
        self.confirm_password = Some(confirm.into());
        self
    }

    /// Check the profile before sending it to the server.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() || self.email.trim().is_empty() || self.password.is_empty() {
            return Err("Please enter all the required fields!".to_string());
        }
        if !self.email.contains('@') {
            return Err("Please enter a valid email address!".to_string());
        }
        if self.password.len() < MIN_PASSWORD_LEN {
            return Err(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters long!"
            ));
        }
        if let Some(confirm) = &self.confirm_password {
            if confirm != &self.password {
                return Err("Passwords do not match!".to_string());
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for RegisterProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterProfile")
            .field("name", &self.name)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Successful login payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserInfo,
}
