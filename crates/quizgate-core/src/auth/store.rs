use std::sync::Arc;

use tracing::{debug, warn};

use super::session::{Session, User};
use super::storage::{KeyValueStorage, MemoryStorage, StorageError};

/// Storage key for the bearer token
pub const TOKEN_KEY: &str = "token";

/// Storage key for the serialized user record
pub const USER_KEY: &str = "user";

/// Reads and writes the persisted session.
///
/// Clone is cheap and every clone shares the same medium, so the HTTP client
/// and the navigation guard always observe the same state.
#[derive(Clone)]
pub struct CredentialStore {
    storage: Arc<dyn KeyValueStorage>,
}

impl CredentialStore {
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self { storage }
    }

    /// Store backed by process memory only
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    /// Persist a session, replacing any previous one.
    pub fn save(&self, session: &Session) -> Result<(), StorageError> {
        let user = serde_json::to_string(&session.user)?;
        self.storage
            .set_many(&[(TOKEN_KEY, session.token.clone()), (USER_KEY, user)])?;
        debug!(user_id = session.user.id, "Session saved");
        Ok(())
    }

    /// Current session, or `None` when logged out.
    ///
    /// Missing keys, a token without a user (or the reverse) and an
    /// unparseable user record all load as `None`.
    pub fn load(&self) -> Option<Session> {
        let values = match self.storage.get_many(&[TOKEN_KEY, USER_KEY]) {
            Ok(values) => values,
            Err(e) => {
                warn!(error = %e, "Failed to read stored session");
                return None;
            }
        };

        let mut values = values.into_iter();
        let token = values.next().flatten().filter(|t| !t.is_empty());
        let user = values.next().flatten();

        match (token, user) {
            (Some(token), Some(user)) => match serde_json::from_str::<User>(&user) {
                Ok(user) => Some(Session { token, user }),
                Err(e) => {
                    warn!(error = %e, "Stored user record is malformed, treating as logged out");
                    None
                }
            },
            (None, None) => None,
            _ => {
                warn!("Stored session is incomplete, treating as logged out");
                None
            }
        }
    }

    /// Remove token and user together. Safe to call when already logged out.
    pub fn clear(&self) -> Result<(), StorageError> {
        self.storage.remove_many(&[TOKEN_KEY, USER_KEY])?;
        debug!("Session cleared");
        Ok(())
    }

    pub fn is_authenticated(&self) -> bool {
        self.load().is_some()
    }

    pub fn is_privileged(&self) -> bool {
        self.load().map(|s| s.is_privileged()).unwrap_or(false)
    }

    /// Bearer token, only when a complete session is stored
    pub fn token(&self) -> Option<String> {
        self.load().map(|s| s.token)
    }
}
