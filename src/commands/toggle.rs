use anyhow::Result;

use crate::commands::{CommandReport, start_extension};
use crate::digest::host::TerminalHost;

pub fn run(enabled: bool) -> Result<CommandReport> {
    let mut report = CommandReport::new(if enabled { "enable" } else { "disable" });

    let mut ext = start_extension()?;
    let export_dir = ext.paths().export_dir.clone();
    let mut page = ext.attach_page(TerminalHost::new(export_dir))?;

    ext.surface().set_enabled(enabled)?;
    page.poll_notifications();

    report.detail(format!("enabled={enabled}"));
    report.detail(format!("page.icon_visible={}", page.icon_visible()));
    if page.icon_visible() != enabled {
        report.issue("page did not follow the toggle");
    }

    ext.shutdown();
    Ok(report)
}
