use crate::digest::paths::DigestPaths;
use crate::digest::util::now_epoch_secs;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    pub at_epoch_secs: u64,
    pub phase: String,
    pub status: String,
    pub message: String,
}

/// Append-only JSONL trail under the logs dir.
#[derive(Debug, Clone)]
pub struct AuditLog {
    logs_dir: PathBuf,
}

impl AuditLog {
    pub fn new(paths: &DigestPaths) -> Self {
        Self {
            logs_dir: paths.logs_dir.clone(),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.logs_dir.join("audit.log")
    }

    pub fn append_event(&self, phase: &str, status: &str, message: &str) -> Result<()> {
        fs::create_dir_all(&self.logs_dir)
            .with_context(|| format!("failed to create {}", self.logs_dir.display()))?;
        let event = AuditEvent {
            at_epoch_secs: now_epoch_secs()?,
            phase: phase.to_string(),
            status: status.to_string(),
            message: message.to_string(),
        };

        let line = format!("{}\n", serde_json::to_string(&event)?);
        let path = self.path();
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        file.write_all(line.as_bytes())?;
        Ok(())
    }

    /// Like `append_event`, but a failed write only logs a warning.
    pub fn record(&self, phase: &str, status: &str, message: &str) {
        if let Err(err) = self.append_event(phase, status, message) {
            tracing::warn!(phase, status, "audit write failed: {err:#}");
        }
    }
}
