pub mod credentials;
pub mod extract;
pub mod install;
pub mod status;
pub mod summaries;
pub mod summarize;
pub mod toggle;

use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Read;
use std::path::Path;

use crate::digest::config::load_config;
use crate::digest::paths::resolve_paths;
use crate::digest::runtime::Extension;

#[derive(Debug, Clone, Serialize)]
pub struct CommandReport {
    pub command: String,
    pub ok: bool,
    pub details: Vec<String>,
    pub issues: Vec<String>,
}

impl CommandReport {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ok: true,
            details: Vec::new(),
            issues: Vec::new(),
        }
    }

    pub fn detail(&mut self, text: impl Into<String>) {
        self.details.push(text.into());
    }

    pub fn issue(&mut self, text: impl Into<String>) {
        self.ok = false;
        self.issues.push(text.into());
    }
}

/// Resolve paths and config from the environment and start the broker.
pub fn start_extension() -> Result<Extension> {
    let paths = resolve_paths()?;
    let config = load_config()?;
    Extension::start(paths, config)
}

/// Page text from a file, or stdin when `path` is `-`.
pub fn read_page_text(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut raw = String::new();
        std::io::stdin()
            .read_to_string(&mut raw)
            .context("failed to read page text from stdin")?;
        return Ok(raw);
    }
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}
