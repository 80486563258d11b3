use crate::digest::storage::{KEY_API_KEY, KEY_EXTENSION_ENABLED, SyncStorage};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionState {
    pub enabled: bool,
}

impl Default for ExtensionState {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl ExtensionState {
    /// Anything other than an explicit `false` counts as enabled.
    pub fn from_stored(value: Option<&Value>) -> Self {
        Self {
            enabled: !matches!(value, Some(Value::Bool(false))),
        }
    }
}

/// A key that is blank after trimming counts as absent.
pub fn normalize_api_key(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|key| !key.is_empty())
        .map(ToOwned::to_owned)
}

pub fn read_extension_state(storage: &SyncStorage) -> Result<ExtensionState> {
    let stored = storage.get(KEY_EXTENSION_ENABLED)?;
    Ok(ExtensionState::from_stored(stored.as_ref()))
}

pub fn write_extension_state(storage: &SyncStorage, state: ExtensionState) -> Result<()> {
    storage.set(KEY_EXTENSION_ENABLED, Value::Bool(state.enabled))
}

pub fn read_api_key(storage: &SyncStorage) -> Result<Option<String>> {
    let stored = storage.get(KEY_API_KEY)?;
    Ok(normalize_api_key(stored.as_ref().and_then(Value::as_str)))
}

pub fn write_api_key(storage: &SyncStorage, api_key: Option<&str>) -> Result<Option<String>> {
    let normalized = normalize_api_key(api_key);
    match &normalized {
        Some(key) => storage.set(KEY_API_KEY, Value::String(key.clone()))?,
        None => storage.remove(KEY_API_KEY)?,
    }
    Ok(normalized)
}

/// First-run defaults. Returns true when anything was written.
pub fn seed_defaults(storage: &SyncStorage) -> Result<bool> {
    let mut seeded = false;
    storage.update(KEY_EXTENSION_ENABLED, |current| {
        if current.is_none() {
            seeded = true;
        }
        Ok(Some(current.unwrap_or(Value::Bool(true))))
    })?;
    Ok(seeded)
}
