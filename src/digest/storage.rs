use crate::error::DigestError;
use anyhow::{Context, Result, anyhow};
use fs2::FileExt;
use serde_json::{Map, Value};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::sync::broadcast;

pub const KEY_EXTENSION_ENABLED: &str = "extensionEnabled";
pub const KEY_API_KEY: &str = "openaiApiKey";
pub const KEY_SAVED_SUMMARIES: &str = "savedSummaries";

const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// One key's new value after a write; `None` means the key was removed.
#[derive(Debug, Clone, PartialEq)]
pub struct StorageChange {
    pub key: String,
    pub new_value: Option<Value>,
}

/// Synchronized key-value storage shared by every context, persisted as a
/// single JSON object. Writes replace the file through a rename so readers
/// never observe a partial document.
#[derive(Debug)]
pub struct SyncStorage {
    file: PathBuf,
    changes: broadcast::Sender<StorageChange>,
}

impl SyncStorage {
    pub fn open(file: impl Into<PathBuf>) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            file: file.into(),
            changes,
        }
    }

    pub fn path(&self) -> &Path {
        &self.file
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.changes.subscribe()
    }

    pub fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.read_all()?.remove(key))
    }

    pub fn set(&self, key: &str, value: Value) -> Result<()> {
        self.update(key, |_| Ok(Some(value)))?;
        Ok(())
    }

    pub fn remove(&self, key: &str) -> Result<()> {
        self.update(key, |_| Ok(None))?;
        Ok(())
    }

    /// Read-modify-write of a single key under the storage lock.
    pub fn update<F>(&self, key: &str, apply: F) -> Result<Option<Value>>
    where
        F: FnOnce(Option<Value>) -> Result<Option<Value>>,
    {
        let _lock = self.lock()?;
        let mut all = self.read_all()?;
        let next = apply(all.remove(key))?;
        if let Some(value) = &next {
            all.insert(key.to_string(), value.clone());
        }
        self.write_all(&all)?;

        // No subscribers is fine.
        let _ = self.changes.send(StorageChange {
            key: key.to_string(),
            new_value: next.clone(),
        });
        tracing::debug!(key, "storage key updated");
        Ok(next)
    }

    fn lock(&self) -> Result<File> {
        let lock_path = self.file.with_extension("lock");
        if let Some(parent) = lock_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let handle = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .with_context(|| format!("failed to open {}", lock_path.display()))?;
        handle
            .lock_exclusive()
            .with_context(|| format!("failed to lock {}", lock_path.display()))?;
        Ok(handle)
    }

    fn read_all(&self) -> Result<Map<String, Value>> {
        if !self.file.exists() {
            return Ok(Map::new());
        }
        let raw = fs::read_to_string(&self.file)
            .with_context(|| format!("failed to read {}", self.file.display()))?;
        if raw.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(anyhow!(DigestError::StorageCorrupt(format!(
                "{} does not hold a JSON object",
                self.file.display()
            )))),
            Err(err) => Err(anyhow!(DigestError::StorageCorrupt(format!(
                "{}: {err}",
                self.file.display()
            )))),
        }
    }

    fn write_all(&self, all: &Map<String, Value>) -> Result<()> {
        let parent = self
            .file
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;

        let data = serde_json::to_string_pretty(all)?;
        let mut tmp = tempfile::NamedTempFile::new_in(parent)
            .with_context(|| format!("failed to stage write in {}", parent.display()))?;
        tmp.write_all(format!("{data}\n").as_bytes())?;
        tmp.persist(&self.file)
            .with_context(|| format!("failed to write {}", self.file.display()))?;
        Ok(())
    }
}
