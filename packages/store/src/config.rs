//! # Client configuration (`contacts.toml`)
//!
//! Defines the TOML configuration file read by frontends at startup
//! (filename: [`ClientConfig::filename`] = `"contacts.toml"`).
//!
//! ## Structure
//!
//! ```toml
//! [server]
//! base_url = "http://localhost:8000"
//!
//! [session]
//! redirect_delay_ms = 500   # pause before leaving the login/register views
//!
//! [export]
//! filename = "contacts.csv"
//! ```
//!
//! ## Types
//!
//! | Struct | Purpose |
//! |--------|---------|
//! | [`ClientConfig`] | Top-level config. Builder helpers, TOML (de)serialisation, file loading and environment overrides. |
//! | [`ServerConfig`] | Base URL of the backend API. |
//! | [`SessionConfig`] | Redirect delay applied after a successful verification on the login/register views. |
//! | [`ExportConfig`] | Default filename for exported contacts. |
//!
//! All structs derive `Default` (with production defaults) so that a missing or
//! empty config file is equivalent to the default configuration.
//!
//! ## Environment
//!
//! [`ClientConfig::apply_env`] loads a `.env` file if present and lets
//! `CONTACTS_API_URL` override `server.base_url`.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Environment variable overriding [`ServerConfig::base_url`].
pub const API_URL_ENV: &str = "CONTACTS_API_URL";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Top-level configuration stored in `contacts.toml`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Milliseconds to wait before redirecting an authenticated user away
    /// from the login or register view.
    #[serde(default = "default_redirect_delay")]
    pub redirect_delay_ms: u64,
}

fn default_redirect_delay() -> u64 {
    500
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            redirect_delay_ms: default_redirect_delay(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_export_filename")]
    pub filename: String,
}

fn default_export_filename() -> String {
    "contacts.csv".to_string()
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            filename: default_export_filename(),
        }
    }
}

impl ClientConfig {
    /// Builder method to set the backend base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.server.base_url = url.into();
        self
    }

    /// Builder method to set the post-verification redirect delay.
    pub fn with_redirect_delay(mut self, delay: Duration) -> Self {
        self.session.redirect_delay_ms = delay.as_millis() as u64;
        self
    }

    pub fn redirect_delay(&self) -> Duration {
        Duration::from_millis(self.session.redirect_delay_ms)
    }

    /// The well-known filename for the config file.
    pub fn filename() -> &'static str {
        "contacts.toml"
    }

    /// Parse from TOML string.
    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Serialize to TOML string.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Read the config at `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(text) => Ok(Self::from_toml(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Write the config to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// Apply overrides from the environment (and a `.env` file, if any).
    pub fn apply_env(mut self) -> Self {
        dotenvy::dotenv().ok();
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                self.server.base_url = url.trim().to_string();
            }
        }
        self
    }
}
