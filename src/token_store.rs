//! Session persistence backends

use crate::error::Result;
use crate::types::Session;
use papaya::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Storage key of the access token
pub const ACCESS_TOKEN_KEY: &str = "token";
/// Storage key of the refresh token
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";

/// Where the client keeps the current session.
///
/// Read before every outgoing request, written on login and refresh, cleared on logout or
/// when the session cannot be recovered.
pub trait SessionStore: Send + Sync + 'static {
    fn load(&self) -> Result<Option<Session>>;

    fn save(&self, session: &Session) -> Result<()>;

    /// Clearing an empty store succeeds
    fn clear(&self) -> Result<()>;
}

/// Thread-safe in-memory token store using Papaya HashMap
///
/// Tokens live under the same keys a browser client uses in local storage, so an access
/// token without a refresh token is a valid state.
#[derive(Clone)]
pub struct TokenStore {
    values: Arc<HashMap<String, String>>,
}

impl TokenStore {
    pub fn new() -> Self {
        Self {
            values: Arc::new(HashMap::new()),
        }
    }

    /// Create a store already holding a session
    pub fn with_session(session: &Session) -> Self {
        let store = Self::new();
        store.put(session);
        store
    }

    /// Get a raw value by storage key
    pub fn get(&self, key: &str) -> Option<String> {
        self.values.pin().get(key).cloned()
    }

    /// Set a raw value by storage key
    pub fn set(&self, key: &str, value: impl Into<String>) {
        self.values.pin().insert(key.to_string(), value.into());
    }

    /// Remove a raw value by storage key
    pub fn remove(&self, key: &str) {
        self.values.pin().remove(key);
    }

    fn put(&self, session: &Session) {
        let values = self.values.pin();
        values.insert(ACCESS_TOKEN_KEY.to_string(), session.access_token.clone());
        match &session.refresh_token {
            Some(token) => {
                values.insert(REFRESH_TOKEN_KEY.to_string(), token.clone());
            }
            None => {
                values.remove(REFRESH_TOKEN_KEY);
            }
        }
    }
}

impl Default for TokenStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore for TokenStore {
    fn load(&self) -> Result<Option<Session>> {
        let values = self.values.pin();
        Ok(values.get(ACCESS_TOKEN_KEY).map(|access| Session {
            access_token: access.clone(),
            refresh_token: values.get(REFRESH_TOKEN_KEY).cloned(),
        }))
    }

    fn save(&self, session: &Session) -> Result<()> {
        self.put(session);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.values.pin().clear();
        Ok(())
    }
}

/// Session persisted as a JSON file so it survives restarts
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<Session>> {
        match std::fs::read(&self.path) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let bytes = serde_json::to_vec_pretty(session)?;
        std::fs::write(&self.path, bytes)?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}
