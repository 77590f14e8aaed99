//! # Filesystem-backed token store
//!
//! [`FileTokenStore`] is a [`TokenStore`] that keeps the bearer token in a
//! single file so a client session survives restarts of the frontend until it
//! is explicitly cleared by logout or expiry detection.
//!
//! The token is read from disk once, when the store is opened, and cached;
//! `get` never touches the filesystem. `set` and `clear` update the cache
//! first and then the file, so a failed write leaves the in-process session
//! intact and only costs persistence.
//!
//! ## Platform data directories
//!
//! Use [`dirs::data_dir()`](https://docs.rs/dirs) to obtain a base directory:
//!
//! | Platform | Path |
//! |----------|------|
//! | macOS | `~/Library/Application Support/contacts/token` |
//! | Linux | `~/.local/share/contacts/token` |
//! | Windows | `C:\Users\<user>\AppData\Roaming\contacts\token` |

use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::token::TokenStore;

#[derive(Debug, thiserror::Error)]
pub enum TokenStoreError {
    #[error("token file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Filesystem-backed TokenStore.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    cached: Mutex<Option<String>>,
}

impl FileTokenStore {
    /// Open the store at `path`, loading any token already saved there.
    pub fn open(path: PathBuf) -> Self {
        let cached = match std::fs::read_to_string(&path) {
            Ok(content) => Some(content.trim().to_string()).filter(|t| !t.is_empty()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to read token file");
                None
            }
        };
        Self {
            path,
            cached: Mutex::new(cached),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_file(&self, token: &str) -> Result<(), TokenStoreError> {
        let io_err = |source| TokenStoreError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        std::fs::write(&self.path, token).map_err(io_err)
    }

    fn remove_file(&self) -> Result<(), TokenStoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(TokenStoreError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self) -> Option<String> {
        self.cached.lock().clone()
    }

    fn set(&self, token: &str) {
        {
            let mut cached = self.cached.lock();
            if cached.as_deref() == Some(token) {
                return;
            }
            *cached = Some(token.to_string());
        }
        if let Err(e) = self.write_file(token) {
            tracing::error!("Failed to persist token: {}", e);
        }
    }

    fn clear(&self) {
        self.cached.lock().take();
        if let Err(e) = self.remove_file() {
            tracing::error!("Failed to remove token file: {}", e);
        }
    }
}
