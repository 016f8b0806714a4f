//! Key/value storage backing the design preference
//!
//! The preference lives in a small storage area scoped to the user and the
//! application instance, not to any patient. [`FileStorage`] keeps it in a
//! JSON object in the platform config dir; [`MemoryStorage`] is shared
//! in-process storage.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info, warn};

use crate::constants::paths::{APP_DIR, PREFERENCES_FILENAME};

/// A string key/value storage area
pub trait PreferenceStorage: Send {
    fn load(&self, key: &str) -> Result<Option<String>>;

    fn save(&mut self, key: &str, value: &str) -> Result<()>;
}

/// JSON object on disk, one entry per key
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

/// Shared in-memory storage; clones see the same entries
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl FileStorage {
    pub fn default_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(APP_DIR);
        path.push(PREFERENCES_FILENAME);
        path
    }

    pub fn new() -> Self {
        Self::at(Self::default_path())
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Entries keep their raw JSON so keys owned by others survive a save
    fn read_entries(&self) -> Result<BTreeMap<String, serde_json::Value>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read preferences from {:?}", self.path))?;
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse preferences JSON from {:?}", self.path))
    }
}

impl Default for FileStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl PreferenceStorage for FileStorage {
    fn load(&self, key: &str) -> Result<Option<String>> {
        match self.read_entries()?.remove(key) {
            Some(serde_json::Value::String(value)) => Ok(Some(value)),
            Some(other) => {
                warn!(key = %key, value = %other, "Stored preference is not a string, ignoring it");
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn save(&mut self, key: &str, value: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create preferences directory {:?}", parent))?;
        }

        // Keep whatever other keys share the storage area
        let mut entries = match self.read_entries() {
            Ok(entries) => entries,
            Err(e) => {
                let backup = self.path.with_extension("json.bak");
                warn!(path = %self.path.display(), backup = %backup.display(), error = ?e,
                    "Existing preferences unreadable, replacing them");
                if let Err(e) = fs::copy(&self.path, &backup) {
                    warn!(error = %e, "Failed to back up unreadable preferences");
                }
                BTreeMap::new()
            }
        };
        entries.insert(key.to_string(), serde_json::Value::String(value.to_string()));

        let json = serde_json::to_string_pretty(&entries).context("Failed to serialize preferences")?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).with_context(|| format!("Failed to write preferences to {:?}", tmp))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to move preferences into place at {:?}", self.path))?;

        info!(path = %self.path.display(), key = %key, value = %value, "Saved preference");
        Ok(())
    }
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStorage for MemoryStorage {
    fn load(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn save(&mut self, key: &str, value: &str) -> Result<()> {
        debug!(key = %key, value = %value, "Saved preference in memory");
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}
