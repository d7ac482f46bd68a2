// src/core/kv_store.rs
//! Key-value port standing in for client-durable storage

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::warn;

use crate::core::FsOps;

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Volatile store, used by tests and one-shot CLI runs.
#[derive(Default)]
pub struct MemoryKeyValueStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("Key-value store lock poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("Key-value store lock poisoned"))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// One JSON object file holding every key, rewritten on each `set`.
pub struct FileKeyValueStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileKeyValueStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    fn read_map(&self) -> Result<Map<String, Value>> {
        if !self.path.exists() {
            return Ok(Map::new());
        }

        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read storage file: {}", self.path.display()))?;

        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) | Err(_) => {
                warn!(
                    "Storage file {} is not a JSON object, starting empty",
                    self.path.display()
                );
                Ok(Map::new())
            }
        }
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| anyhow::anyhow!("Storage lock poisoned"))?;
        let map = self.read_map()?;
        Ok(map.get(key).and_then(|v| v.as_str()).map(str::to_string))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| anyhow::anyhow!("Storage lock poisoned"))?;
        let mut map = self.read_map()?;
        map.insert(key.to_string(), Value::String(value.to_string()));

        let content =
            serde_json::to_string_pretty(&map).context("Failed to serialize storage file")?;
        FsOps::replace_file_sync(&self.path, &content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryKeyValueStore::new();
        assert_eq!(store.get("missing").unwrap(), None);
        store.set("k", "v1").unwrap();
        store.set("k", "v2").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v2"));
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");

        FileKeyValueStore::new(path.clone()).set("draft", "<p>x</p>").unwrap();
        FileKeyValueStore::new(path.clone()).set("other", "1").unwrap();

        let reopened = FileKeyValueStore::new(path);
        assert_eq!(reopened.get("draft").unwrap().as_deref(), Some("<p>x</p>"));
        assert_eq!(reopened.get("other").unwrap().as_deref(), Some("1"));
    }

    #[test]
    fn test_file_store_tolerates_garbage_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, "not json at all").unwrap();

        let store = FileKeyValueStore::new(path);
        assert_eq!(store.get("draft").unwrap(), None);
        store.set("draft", "ok").unwrap();
        assert_eq!(store.get("draft").unwrap().as_deref(), Some("ok"));
    }
}
