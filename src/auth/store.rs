//! Durable storage for the current access token.
//!
//! The token is an opaque string; exactly one is current at any time, or
//! none. Storage problems are deliberately soft: a store that cannot be read
//! behaves as if no token were saved, and failed writes are logged and
//! dropped rather than surfaced to callers.

use std::path::PathBuf;
use std::sync::Mutex;

use tracing::warn;

/// Token file name in the storage directory
const TOKEN_FILE: &str = "access_token.json";

/// Holder for the current access token.
///
/// `get` returning `None` means "no credential stored" regardless of whether
/// that is because nothing was saved or because storage is unavailable.
pub trait TokenStore: Send + Sync {
    fn get(&self) -> Option<String>;
    fn set(&self, token: &str);
    fn clear(&self);
}

/// File-backed store that survives restarts.
pub struct FileTokenStore {
    path: PathBuf,
}

#[derive(serde::Serialize, serde::Deserialize)]
struct StoredToken {
    access_token: String,
}

impl FileTokenStore {
    pub fn new(storage_dir: PathBuf) -> Self {
        Self {
            path: storage_dir.join(TOKEN_FILE),
        }
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self) -> Option<String> {
        let contents = std::fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str::<StoredToken>(&contents) {
            Ok(stored) => Some(stored.access_token),
            Err(e) => {
                warn!(error = %e, "Failed to parse stored token file");
                None
            }
        }
    }

    fn set(&self, token: &str) {
        let stored = StoredToken {
            access_token: token.to_string(),
        };
        let write = || -> std::io::Result<()> {
            if let Some(parent) = self.path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let contents = serde_json::to_string_pretty(&stored)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
            std::fs::write(&self.path, contents)
        };
        if let Err(e) = write() {
            warn!(error = %e, "Failed to persist access token");
        }
    }

    fn clear(&self) {
        if self.path.exists() {
            if let Err(e) = std::fs::remove_file(&self.path) {
                warn!(error = %e, "Failed to remove stored token");
            }
        }
    }
}

/// In-process store for tests and embedders that manage persistence
/// themselves.
#[derive(Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> Option<String> {
        self.token.lock().ok()?.clone()
    }

    fn set(&self, token: &str) {
        if let Ok(mut guard) = self.token.lock() {
            *guard = Some(token.to_string());
        }
    }

    fn clear(&self) {
        if let Ok(mut guard) = self.token.lock() {
            *guard = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileTokenStore::new(dir.path().to_path_buf());

        assert_eq!(store.get(), None);

        store.set("tok-123");
        assert_eq!(store.get().as_deref(), Some("tok-123"));

        // A second store over the same directory sees the persisted value
        let reopened = FileTokenStore::new(dir.path().to_path_buf());
        assert_eq!(reopened.get().as_deref(), Some("tok-123"));

        store.clear();
        assert_eq!(store.get(), None);
        assert_eq!(reopened.get(), None);
    }

    #[test]
    fn test_file_store_treats_garbage_as_absent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileTokenStore::new(dir.path().to_path_buf());
        std::fs::write(dir.path().join(TOKEN_FILE), "not json").expect("write");
        assert_eq!(store.get(), None);
    }

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryTokenStore::new();
        assert_eq!(store.get(), None);
        store.set("tok");
        assert_eq!(store.get().as_deref(), Some("tok"));
        store.clear();
        assert_eq!(store.get(), None);
    }
}
