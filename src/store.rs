//! Session persistence.
//!
//! The token/apikey pair lives in a small key-value store. [`FileStore`]
//! keeps it in a JSON file so the session survives between CLI runs,
//! [`MemoryStore`] keeps it in process for the HTTP bridge and tests.

use crate::error::{PatsearchError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{debug, info, warn};

/// Storage key for the bearer token
pub const TOKEN_KEY: &str = "token";

/// Storage key for the apikey (the client id used at login)
pub const APIKEY_KEY: &str = "apikey";

/// Default session file path: `~/.patsearch_session.json`
fn default_session_path() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|p| p.join(".patsearch_session.json"))
        .ok_or_else(|| PatsearchError::Config("Cannot determine home directory".to_string()))
}

/// Plain string key-value storage, read and written without locking semantics
/// beyond what the implementation needs internally.
pub trait SessionStore: Send + Sync {
    /// Read a value, `None` when absent
    fn get(&self, key: &str) -> Option<String>;
    /// Write a value, replacing any previous one
    fn set(&self, key: &str, value: &str) -> Result<()>;
    /// Delete a value; deleting a missing key is not an error
    fn remove(&self, key: &str) -> Result<()>;
}

/// JSON-file backed store
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Create a new FileStore with default path
    pub fn new() -> Result<Self> {
        Ok(Self {
            path: default_session_path()?,
        })
    }

    /// Create a new FileStore with custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    /// Get the session file path
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Load all entries
    ///
    /// Returns an empty map if the file doesn't exist or is invalid
    fn load(&self) -> BTreeMap<String, String> {
        if !self.path.exists() {
            debug!("Session file not found: {:?}", self.path);
            return BTreeMap::new();
        }

        match std::fs::read_to_string(&self.path) {
            Ok(content) => match serde_json::from_str::<BTreeMap<String, String>>(&content) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!("Failed to parse session file: {}", e);
                    BTreeMap::new()
                }
            },
            Err(e) => {
                warn!("Failed to read session file: {}", e);
                BTreeMap::new()
            }
        }
    }

    fn save(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if entries.is_empty() {
            return self.clear();
        }
        let content = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.path, content)?;
        debug!("Saved {} session entries to {:?}", entries.len(), self.path);
        Ok(())
    }

    /// Delete the session file
    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
            info!("Cleared session at {:?}", self.path);
        }
        Ok(())
    }
}

impl Default for FileStore {
    fn default() -> Self {
        Self::new().unwrap_or_else(|_| Self {
            path: PathBuf::from(".patsearch_session.json"),
        })
    }
}

impl SessionStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.load().remove(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.load();
        entries.insert(key.to_string(), value.to_string());
        self.save(&entries)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.load();
        if entries.remove(key).is_some() {
            self.save(&entries)?;
        }
        Ok(())
    }
}

/// In-process store
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| PatsearchError::Config("session store lock poisoned".to_string()))
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}

/// Credentials attached to every search request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Bearer token returned by `POST /token`
    pub token: String,
    /// Client id, sent as the `apikey` query parameter
    pub apikey: String,
}

impl Session {
    pub fn new(token: impl Into<String>, apikey: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            apikey: apikey.into(),
        }
    }

    /// Read the session; both keys must be present
    pub fn load(store: &dyn SessionStore) -> Option<Session> {
        let token = store.get(TOKEN_KEY)?;
        let apikey = store.get(APIKEY_KEY)?;
        Some(Session { token, apikey })
    }

    /// Like [`Session::load`], but a missing session is an error
    pub fn require(store: &dyn SessionStore) -> Result<Session> {
        Session::load(store).ok_or(PatsearchError::NotLoggedIn)
    }

    /// Persist token and apikey
    pub fn save(&self, store: &dyn SessionStore) -> Result<()> {
        store.set(TOKEN_KEY, &self.token)?;
        store.set(APIKEY_KEY, &self.apikey)
    }

    /// Remove both keys
    pub fn clear(store: &dyn SessionStore) -> Result<()> {
        store.remove(APIKEY_KEY)?;
        store.remove(TOKEN_KEY)
    }
}
