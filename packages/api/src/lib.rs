//! # API crate: the client side of the contacts server
//!
//! Everything the client core sends to or receives from the server goes
//! through the [`Backend`] trait defined here. The session and directory
//! controllers in `ui` are generic over it, so tests drive them with
//! [`MemoryBackend`] and the CLI drives them with [`HttpBackend`].
//!
//! ## Modules
//!
//! | Module | Feature gate | Purpose |
//! |--------|-------------|---------|
//! | [`backend`] | | The `Backend` trait and its endpoint table |
//! | [`error`] | | `ApiError` kinds (auth, validation, not found, network, parse) |
//! | [`http`] | `http` | `reqwest` implementation with bearer auth and uniform error decoding |
//! | [`memory`] | | In-memory fake server with a call log and an offline switch |
//! | [`models`] | | `UserInfo`, login/register bodies and response envelopes |

pub mod backend;
pub mod error;
#[cfg(feature = "http")]
pub mod http;
pub mod memory;
pub mod models;

pub use backend::Backend;
pub use error::ApiError;
#[cfg(feature = "http")]
pub use http::HttpBackend;
pub use memory::{Call, MemoryBackend};
pub use models::{Credentials, LoginResponse, RegisterProfile, UserInfo, MIN_PASSWORD_LEN};
