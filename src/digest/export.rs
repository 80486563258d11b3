use crate::digest::summaries::SummaryRecord;
use chrono::{Local, TimeZone};

const TITLE_SLUG_CHARS: usize = 30;

/// `summary_<title slug>_<epoch ms>.txt`
pub fn export_filename(title: &str, timestamp_ms: u64) -> String {
    let slug: String = title
        .chars()
        .map(|ch| if ch.is_ascii_alphanumeric() { ch } else { '_' })
        .take(TITLE_SLUG_CHARS)
        .collect();
    format!("summary_{slug}_{timestamp_ms}.txt")
}

fn generated_label(timestamp_ms: u64) -> String {
    i64::try_from(timestamp_ms)
        .ok()
        .and_then(|ms| Local.timestamp_millis_opt(ms).single())
        .map(|at| at.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| timestamp_ms.to_string())
}

pub fn export_contents(record: &SummaryRecord) -> String {
    format!(
        "AI Summary\n==========\n\nGenerated: {}\nSource: {}\n\n{}\n",
        generated_label(record.timestamp),
        record.url,
        record.text
    )
}
