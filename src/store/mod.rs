//! Credential store adapters — read-only access to the linked bearer token.

pub mod file;
pub mod memory;
pub mod traits;

pub use file::FileCredentialStore;
pub use memory::MemoryCredentialStore;
pub use traits::{CredentialStore, normalize_token};
