//! Client state controllers shared by every frontend.
//!
//! A frontend builds one [`SessionManager`] over a [`api::Backend`] and a
//! token store, hands a clone of it to a [`DirectoryController`], and then
//! renders whatever the [`Navigator`] and [`Notifications`] say.

mod auth;

pub mod directory;
pub use directory::DirectoryController;

mod error;
pub use error::ReconcileError;

pub mod navigation;
pub use navigation::{Navigator, Route};

pub mod notifications;
pub use notifications::{LogLevel, Notification, Notifications};

mod platform;
pub use platform::{config_path, make_token_store, token_path};

mod reconciler;

pub mod session;
pub use session::{Session, SessionManager, SessionState};
