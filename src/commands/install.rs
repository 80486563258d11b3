use anyhow::{Context, Result};
use std::fs;

use crate::commands::{CommandReport, start_extension};
use crate::digest::config::{DigestConfig, resolve_config_path};
use crate::digest::credentials::seed_defaults;

pub fn run() -> Result<CommandReport> {
    let mut report = CommandReport::new("install");
    let ext = start_extension()?;
    let paths = ext.paths();

    for dir in [&paths.digest_home, &paths.export_dir, &paths.logs_dir] {
        fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
        report.detail(format!("dir={}", dir.display()));
    }

    if seed_defaults(ext.storage())? {
        report.detail("seeded extensionEnabled=true");
    } else {
        report.detail("storage already initialised");
    }

    if let Some(config_path) = resolve_config_path() {
        if config_path.exists() {
            report.detail(format!("config_file={} (kept)", config_path.display()));
        } else {
            if let Some(parent) = config_path.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            let template = toml::to_string_pretty(&DigestConfig::default())?;
            fs::write(&config_path, template)
                .with_context(|| format!("failed to write {}", config_path.display()))?;
            report.detail(format!("config_file={} (written)", config_path.display()));
        }
    }

    ext.shutdown();
    Ok(report)
}
