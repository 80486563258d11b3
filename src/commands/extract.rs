use anyhow::Result;
use std::path::Path;

use crate::commands::{CommandReport, read_page_text, start_extension};
use crate::digest::host::TerminalHost;
use crate::digest::page::PageSnapshot;

pub async fn run(file: &Path, copy: bool) -> Result<CommandReport> {
    let mut report = CommandReport::new("extract");
    let snapshot = PageSnapshot {
        title: String::new(),
        url: String::new(),
        body_text: read_page_text(file)?,
    };

    let mut ext = start_extension()?;
    let export_dir = ext.paths().export_dir.clone();
    let mut page = ext.attach_page(TerminalHost::new(export_dir))?;

    match page.click_icon_for_text(&snapshot) {
        Ok(_) => {
            if copy {
                page.copy()?;
            }
        }
        Err(err) => report.issue(format!("{err:#}")),
    }
    page.close();
    for frame in page.host().transcript() {
        report.detail(frame);
    }

    ext.shutdown();
    Ok(report)
}
