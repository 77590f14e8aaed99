//! Data models exchanged with the backend.

mod payload;
mod user;

pub use payload::{ContactEnvelope, ContactListEnvelope, DeletedEnvelope, ErrorEnvelope};
pub use user::{Credentials, LoginResponse, RegisterProfile, UserInfo, MIN_PASSWORD_LEN};
