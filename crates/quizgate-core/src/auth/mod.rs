//! Authentication module for managing the client session.
//!
//! This module provides:
//! - `Session`: the bearer token and user record, always held together
//! - `CredentialStore`: persisted session state on a `KeyValueStorage` medium
//! - `AuthService`: login, logout and registration exchanges
//!
//! There is no silent renewal. When the server rejects the token the session
//! is cleared and the user logs in again.

pub mod service;
pub mod session;
pub mod storage;
pub mod store;

pub use service::{AuthError, AuthService, RegisterForm};
pub use session::{Session, User};
pub use storage::{FileStorage, KeyValueStorage, KeyringStorage, MemoryStorage, StorageError};
pub use store::CredentialStore;
