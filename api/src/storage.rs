//! Durable client storage: a small versioned JSON file shared by the session
//! store and the gateway client. Writes are last-write-wins.

use crate::Identity;
use crate::client::{ApiError, ApiResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const STORAGE_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSession {
    pub version: u32,
    #[serde(default)]
    pub identity: Option<Identity>,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub active_tab: Option<String>,
}

impl Default for StoredSession {
    fn default() -> Self {
        Self {
            version: STORAGE_VERSION,
            identity: None,
            is_admin: false,
            token: None,
            active_tab: None,
        }
    }
}

impl StoredSession {
    /// Drop everything tied to the signed-in identity. UI preferences survive.
    pub fn clear_auth(&mut self) {
        self.identity = None;
        self.is_admin = false;
        self.token = None;
    }
}

#[derive(Debug, Clone)]
pub struct SessionStorage {
    path: PathBuf,
}

impl SessionStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Storage at `TOURNEYFUND_SESSION_FILE`, else the user config directory.
    pub fn from_env() -> Self {
        Self::new(default_session_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored session. A missing file is an empty session; a file
    /// written by another format version is an error.
    pub fn load(&self) -> ApiResult<StoredSession> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(StoredSession::default());
            }
            Err(e) => {
                return Err(ApiError::Storage(format!(
                    "read {} failed: {e}",
                    self.path.display()
                )));
            }
        };
        let stored: StoredSession = serde_json::from_str(&content).map_err(|e| {
            ApiError::Storage(format!("parse {} failed: {e}", self.path.display()))
        })?;
        if stored.version != STORAGE_VERSION {
            return Err(ApiError::Storage(format!(
                "unsupported session version {} (expected {STORAGE_VERSION})",
                stored.version
            )));
        }
        Ok(stored)
    }

    pub fn save(&self, session: &StoredSession) -> ApiResult<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .map_err(|e| ApiError::Storage(format!("create dir failed: {e}")))?;
        }
        let payload = serde_json::to_string_pretty(session)
            .map_err(|e| ApiError::Storage(format!("serialize session failed: {e}")))?;
        std::fs::write(&self.path, payload)
            .map_err(|e| ApiError::Storage(format!("write session failed: {e}")))
    }

    /// Load, mutate, save. An unreadable file is replaced by a fresh one.
    pub fn update(&self, f: impl FnOnce(&mut StoredSession)) -> ApiResult<()> {
        let mut session = self.load().unwrap_or_default();
        f(&mut session);
        self.save(&session)
    }

    pub fn token(&self) -> Option<String> {
        self.load()
            .ok()
            .and_then(|s| s.token)
            .filter(|t| !t.trim().is_empty())
    }

    pub fn clear_auth(&self) -> ApiResult<()> {
        self.update(StoredSession::clear_auth)
    }
}

fn default_session_path() -> PathBuf {
    if let Ok(path) = std::env::var("TOURNEYFUND_SESSION_FILE")
        && !path.trim().is_empty()
    {
        return PathBuf::from(path);
    }
    if let Ok(config_dir) = std::env::var("XDG_CONFIG_HOME")
        && !config_dir.trim().is_empty()
    {
        return PathBuf::from(config_dir).join("tourneyfund").join("session.json");
    }
    if let Ok(home) = std::env::var("HOME")
        && !home.trim().is_empty()
    {
        return PathBuf::from(home)
            .join(".config")
            .join("tourneyfund")
            .join("session.json");
    }
    PathBuf::from("tourneyfund-session.json")
}

#[cfg(test)]
pub(crate) fn temp_storage(name: &str) -> SessionStorage {
    let path = std::env::temp_dir().join(format!(
        "tourneyfund-{name}-{}.json",
        std::process::id()
    ));
    let _ = std::fs::remove_file(&path);
    SessionStorage::new(path)
}
