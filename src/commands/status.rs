use anyhow::Result;

use crate::commands::{CommandReport, start_extension};
use crate::digest::config::{env_overrides_set, resolve_config_path};

pub fn run() -> Result<CommandReport> {
    let mut report = CommandReport::new("status");
    let ext = start_extension()?;
    let paths = ext.paths();

    report.detail(format!("digest_home={}", paths.digest_home.display()));
    report.detail(format!("storage_file={}", ext.storage().path().display()));
    report.detail(format!("export_dir={}", paths.export_dir.display()));
    report.detail(format!("logs_dir={}", paths.logs_dir.display()));
    if let Some(config_path) = resolve_config_path() {
        report.detail(format!(
            "config_file={} (present={})",
            config_path.display(),
            config_path.exists()
        ));
    }

    let cfg = ext.config();
    report.detail(format!("api.model={}", cfg.api.model));
    report.detail(format!("api.endpoint={}", cfg.api.chat_completions_url()));
    report.detail(format!(
        "limits.max_saved_summaries={}",
        cfg.limits.max_saved_summaries
    ));

    let status = ext.surface().status()?;
    report.detail(format!("enabled={}", status.enabled));
    report.detail(format!(
        "api_key={}",
        status.api_key.as_deref().unwrap_or("<not set>")
    ));
    report.detail(format!("saved_summaries={}", status.saved_summaries));

    let overrides = env_overrides_set();
    if !overrides.is_empty() {
        report.detail(format!("env_overrides={}", overrides.join(",")));
    }

    if !paths.storage_file.exists() {
        report.issue("storage file missing; run `page-digest install`");
    }

    ext.shutdown();
    Ok(report)
}
