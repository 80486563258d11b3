use crate::digest::audit::AuditLog;
use crate::digest::credentials::{
    ExtensionState, read_api_key, read_extension_state, write_api_key, write_extension_state,
};
use crate::digest::protocol::{BrokerHandle, PageNotice};
use crate::digest::storage::SyncStorage;
use crate::digest::summaries::{self, SummaryRecord};
use crate::digest::util::mask_secret;
use anyhow::Result;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SurfaceStatus {
    pub enabled: bool,
    /// Masked; the full key never leaves storage through this view.
    pub api_key: Option<String>,
    pub saved_summaries: usize,
}

/// The popup: edits the credential and the enabled flag, and browses the
/// saved summaries.
pub struct ConfigSurface {
    storage: Arc<SyncStorage>,
    broker: BrokerHandle,
    page: mpsc::UnboundedSender<Value>,
    audit: AuditLog,
}

impl ConfigSurface {
    pub fn new(
        storage: Arc<SyncStorage>,
        broker: BrokerHandle,
        page: mpsc::UnboundedSender<Value>,
        audit: AuditLog,
    ) -> Self {
        Self {
            storage,
            broker,
            page,
            audit,
        }
    }

    pub fn status(&self) -> Result<SurfaceStatus> {
        let state = read_extension_state(&self.storage)?;
        let api_key = read_api_key(&self.storage)?.map(|key| mask_secret(&key));
        let saved_summaries = summaries::list(&self.storage)?.len();
        Ok(SurfaceStatus {
            enabled: state.enabled,
            api_key,
            saved_summaries,
        })
    }

    /// Persist the key, then hand it to the broker's cache. A blank key
    /// clears both.
    pub async fn save_api_key(&self, api_key: Option<&str>) -> Result<bool> {
        let stored = write_api_key(&self.storage, api_key)?;
        let ack = self.broker.update_api_key(stored.as_deref()).await?;
        let status = if stored.is_some() { "set" } else { "cleared" };
        self.audit.record("credential", status, "API key updated");
        tracing::info!(configured = stored.is_some(), "API key saved");
        Ok(ack.success)
    }

    pub fn set_enabled(&self, enabled: bool) -> Result<()> {
        write_extension_state(&self.storage, ExtensionState { enabled })?;
        let notice = serde_json::to_value(PageNotice::ToggleExtension { enabled })?;
        if self.page.send(notice).is_err() {
            tracing::debug!("no page is listening for the toggle notice");
        }
        let status = if enabled { "enabled" } else { "disabled" };
        self.audit.record("toggle", status, "extension state changed");
        Ok(())
    }

    pub fn saved_summaries(&self) -> Result<Vec<SummaryRecord>> {
        summaries::list(&self.storage)
    }

    pub fn saved_summary(&self, index: usize) -> Result<SummaryRecord> {
        summaries::get(&self.storage, index)
    }

    pub fn delete_summary(&self, index: usize) -> Result<SummaryRecord> {
        let removed = summaries::delete(&self.storage, index)?;
        self.audit
            .record("store", "deleted", &format!("removed saved summary {index}"));
        Ok(removed)
    }
}
