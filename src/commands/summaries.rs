use anyhow::Result;

use crate::commands::{CommandReport, start_extension};
use crate::digest::export::export_contents;

#[derive(Debug, Clone, Copy)]
pub enum SummariesAction {
    List,
    Show(usize),
    Delete(usize),
}

pub fn run(action: SummariesAction) -> Result<CommandReport> {
    let ext = start_extension()?;
    let surface = ext.surface();

    let report = match action {
        SummariesAction::List => {
            let mut report = CommandReport::new("summaries-list");
            let records = surface.saved_summaries()?;
            report.detail(format!("count={}", records.len()));
            for (index, record) in records.iter().enumerate() {
                report.detail(format!("[{index}] {} <{}>", record.title, record.url));
            }
            report
        }
        SummariesAction::Show(index) => {
            let mut report = CommandReport::new("summaries-show");
            match surface.saved_summary(index) {
                Ok(record) => report.detail(export_contents(&record)),
                Err(err) => report.issue(err.to_string()),
            }
            report
        }
        SummariesAction::Delete(index) => {
            let mut report = CommandReport::new("summaries-delete");
            match surface.delete_summary(index) {
                Ok(removed) => {
                    report.detail(format!("deleted [{index}] {}", removed.title));
                    report.detail(format!("remaining={}", surface.saved_summaries()?.len()));
                }
                Err(err) => report.issue(err.to_string()),
            }
            report
        }
    };

    ext.shutdown();
    Ok(report)
}
