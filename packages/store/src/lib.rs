pub mod config;
pub mod models;
pub mod snapshot;
pub mod tabular;
pub mod token;

mod file_store;
mod memory;
pub use file_store::{FileTokenStore, TokenStoreError};
pub use memory::MemoryTokenStore;

pub use config::{ClientConfig, ConfigError};
pub use models::{Contact, ContactFields, ContactId, SortDirection, SortKey};
pub use snapshot::{Snapshot, SortState};
pub use tabular::TabularError;
pub use token::TokenStore;
