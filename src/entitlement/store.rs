//! Entitlement persistence.
//!
//! The gate depends on the `EntitlementStore` port only. `JsonFileStore`
//! keeps the state in `{data_dir}/entitlement.json`; `MemoryStore` is the
//! in-process fake used by tests and dry runs.

use super::EntitlementState;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

const ENTITLEMENT_FILE: &str = "entitlement.json";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid entitlement JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Load/save surface for the entitlement state.
pub trait EntitlementStore: Send + Sync {
    /// Returns `Ok(None)` when nothing has been persisted yet.
    fn load(&self) -> Result<Option<EntitlementState>, StoreError>;
    fn save(&self, state: &EntitlementState) -> Result<(), StoreError>;
}

/// JSON file store.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `{dir}/entitlement.json`.
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(ENTITLEMENT_FILE))
    }
}

impl EntitlementStore for JsonFileStore {
    fn load(&self) -> Result<Option<EntitlementState>, StoreError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        Ok(Some(serde_json::from_str(&raw)?))
    }

    fn save(&self, state: &EntitlementState) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(state)?;
        std::fs::write(&self.path, json).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

/// In-memory store. `set_failing(true)` makes every save fail.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<Option<EntitlementState>>,
    failing: Mutex<bool>,
    saves: Mutex<u32>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        if let Ok(mut guard) = self.failing.lock() {
            *guard = failing;
        }
    }

    /// Last successfully saved state.
    pub fn snapshot(&self) -> Option<EntitlementState> {
        self.state.lock().ok().and_then(|guard| guard.clone())
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> u32 {
        self.saves.lock().map(|guard| *guard).unwrap_or(0)
    }
}

impl EntitlementStore for MemoryStore {
    fn load(&self) -> Result<Option<EntitlementState>, StoreError> {
        self.state
            .lock()
            .map(|guard| guard.clone())
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }

    fn save(&self, state: &EntitlementState) -> Result<(), StoreError> {
        let failing = self
            .failing
            .lock()
            .map(|guard| *guard)
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        if failing {
            return Err(StoreError::Unavailable("memory store set to fail".to_string()));
        }
        let mut guard = self
            .state
            .lock()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        *guard = Some(state.clone());
        if let Ok(mut saves) = self.saves.lock() {
            *saves += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("reply-coach-test-{}-{}", name, std::process::id()))
            .join(ENTITLEMENT_FILE)
    }

    #[test]
    fn load_missing_file_returns_none() {
        let store = JsonFileStore::new(temp_path("missing"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn save_and_load_file() {
        let path = temp_path("save-load");
        let store = JsonFileStore::new(&path);
        let state = EntitlementState {
            is_pro: false,
            daily_usage_count: 2,
            last_usage_date: NaiveDate::from_ymd_opt(2026, 3, 14),
        };

        store.save(&state).unwrap();
        assert_eq!(store.load().unwrap(), Some(state));

        // Cleanup
        if let Some(dir) = path.parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let path = temp_path("corrupt");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{not json").unwrap();

        let store = JsonFileStore::new(&path);
        assert!(matches!(store.load(), Err(StoreError::Json(_))));

        if let Some(dir) = path.parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }

    #[test]
    fn partial_file_fills_defaults() {
        let path = temp_path("partial");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, r#"{"isPro": true}"#).unwrap();

        let loaded = JsonFileStore::new(&path).load().unwrap().unwrap();
        assert!(loaded.is_pro);
        assert_eq!(loaded.daily_usage_count, 0);
        assert_eq!(loaded.last_usage_date, None);

        if let Some(dir) = path.parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }

    #[test]
    fn failing_memory_store_rejects_saves() {
        let store = MemoryStore::new();
        store.set_failing(true);
        assert!(store.save(&EntitlementState::default()).is_err());
        assert_eq!(store.save_count(), 0);

        store.set_failing(false);
        store.save(&EntitlementState::default()).unwrap();
        assert_eq!(store.save_count(), 1);
    }
}
