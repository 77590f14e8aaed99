//! Platform locations of the client's persisted state.
//!
//! - token: `<data_dir>/contacts/token`
//! - config: `<config_dir>/contacts/contacts.toml`
//!
//! Both fall back to the working directory when the platform has no such
//! directory.

use std::path::PathBuf;
use std::sync::Arc;

use store::{ClientConfig, FileTokenStore, TokenStore};

const APP_DIR: &str = "contacts";

pub fn token_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("token")
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join(ClientConfig::filename())
}

/// The token store that survives restarts.
pub fn make_token_store() -> Arc<dyn TokenStore> {
    let store = FileTokenStore::open(token_path());
    tracing::debug!(path = %store.path().display(), "token store opened");
    Arc::new(store)
}
