// src/persistence.rs
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::core::KeyValueStore;

/// Storage key of the single saved draft
pub const SNAPSHOT_KEY: &str = "cover_letter_draft";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedSnapshot {
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub template_id: Option<String>,
}

impl SavedSnapshot {
    pub fn new(content: String, template_id: Option<String>) -> Self {
        Self {
            content,
            timestamp: Utc::now(),
            template_id,
        }
    }
}

/// Last-write-wins slot for the editor draft
#[derive(Clone)]
pub struct SnapshotStore {
    store: Arc<dyn KeyValueStore>,
}

impl SnapshotStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn save(&self, snapshot: &SavedSnapshot) -> Result<()> {
        let json = serde_json::to_string(snapshot).context("Failed to serialize snapshot")?;
        self.store
            .set(SNAPSHOT_KEY, &json)
            .context("Failed to write snapshot")?;
        debug!("Saved snapshot ({} bytes)", json.len());
        Ok(())
    }

    /// The saved snapshot; unreadable or malformed data counts as no snapshot
    pub fn load(&self) -> Option<SavedSnapshot> {
        let raw = match self.store.get(SNAPSHOT_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!("Failed to read snapshot: {}", e);
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!("Ignoring malformed snapshot: {}", e);
                None
            }
        }
    }
}
