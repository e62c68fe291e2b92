//! Persisted key/value store for application state that survives restarts.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed store {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Minimal persisted store. Values are JSON so any serde type fits.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<serde_json::Value>;
    fn set(&mut self, key: &str, value: serde_json::Value);
    fn flush(&mut self) -> Result<(), StoreError>;
}

/// Store backed by a single pretty-printed JSON file
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    values: BTreeMap<String, serde_json::Value>,
    dirty: bool,
}

impl JsonFileStore {
    /// Open the store at `path`. A missing file is an empty store; an
    /// unreadable or malformed one is logged and treated as empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match Self::read(&path) {
            Ok(values) => values,
            Err(e) => {
                tracing::warn!("{e}, starting with defaults");
                BTreeMap::new()
            }
        };
        Self {
            path,
            values,
            dirty: false,
        }
    }

    fn read(path: &Path) -> Result<BTreeMap<String, serde_json::Value>, StoreError> {
        if !path.exists() {
            return Ok(BTreeMap::new());
        }
        let json = std::fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&json).map_err(|source| StoreError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<serde_json::Value> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: serde_json::Value) {
        if self.values.get(key) != Some(&value) {
            self.values.insert(key.to_string(), value);
            self.dirty = true;
        }
    }

    fn flush(&mut self) -> Result<(), StoreError> {
        if !self.dirty {
            return Ok(());
        }
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir).map_err(|source| StoreError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(&self.values).map_err(|source| {
            StoreError::Json {
                path: self.path.clone(),
                source,
            }
        })?;
        std::fs::write(&self.path, json).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;
        self.dirty = false;
        tracing::debug!("Wrote {}", self.path.display());
        Ok(())
    }
}

/// In-memory store for tests and for running without a config directory
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: BTreeMap<String, serde_json::Value>,
    pub flushes: usize,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<serde_json::Value> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: serde_json::Value) {
        self.values.insert(key.to_string(), value);
    }

    fn flush(&mut self) -> Result<(), StoreError> {
        self.flushes += 1;
        Ok(())
    }
}

/// Window geometry and shell toggles restored at startup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowState {
    pub width: f32,
    pub height: f32,
    pub sidebar_show: bool,
    pub auto_best: bool,
}

impl Default for WindowState {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 800.0,
            sidebar_show: true,
            auto_best: true,
        }
    }
}

const WINDOW_WIDTH: &str = "window-width";
const WINDOW_HEIGHT: &str = "window-height";
const SIDEBAR_SHOW: &str = "sidebar-show";
const AUTO_BEST: &str = "auto-best";

impl WindowState {
    /// Read from the store; missing or wrongly typed entries keep defaults
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let defaults = Self::default();
        let float = |key: &str, default: f32| {
            store
                .get(key)
                .and_then(|v| v.as_f64())
                .map_or(default, |v| v as f32)
        };
        let flag = |key: &str, default: bool| {
            store.get(key).and_then(|v| v.as_bool()).unwrap_or(default)
        };
        Self {
            width: float(WINDOW_WIDTH, defaults.width),
            height: float(WINDOW_HEIGHT, defaults.height),
            sidebar_show: flag(SIDEBAR_SHOW, defaults.sidebar_show),
            auto_best: flag(AUTO_BEST, defaults.auto_best),
        }
    }

    pub fn store(&self, store: &mut dyn KeyValueStore) {
        store.set(WINDOW_WIDTH, self.width.into());
        store.set(WINDOW_HEIGHT, self.height.into());
        store.set(SIDEBAR_SHOW, self.sidebar_show.into());
        store.set(AUTO_BEST, self.auto_best.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path().join("state.json"));
        assert!(store.get("window-width").is_none());
        assert_eq!(WindowState::load(&store), WindowState::default());
    }

    #[test]
    fn test_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");

        let mut store = JsonFileStore::open(&path);
        let state = WindowState {
            width: 800.0,
            height: 600.0,
            sidebar_show: false,
            auto_best: false,
        };
        state.store(&mut store);
        store.flush().unwrap();

        let reopened = JsonFileStore::open(&path);
        assert_eq!(WindowState::load(&reopened), state);
    }

    #[test]
    fn test_malformed_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{{{").unwrap();
        let store = JsonFileStore::open(&path);
        assert_eq!(WindowState::load(&store), WindowState::default());
    }

    #[test]
    fn test_wrong_types_keep_defaults() {
        let mut store = MemoryStore::default();
        store.set("window-width", serde_json::json!("wide"));
        store.set("sidebar-show", serde_json::json!(false));
        let state = WindowState::load(&store);
        assert_eq!(state.width, WindowState::default().width);
        assert!(!state.sidebar_show);
    }

    #[test]
    fn test_clean_store_skips_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let mut store = JsonFileStore::open(&path);
        store.flush().unwrap();
        assert!(!path.exists());
    }
}
