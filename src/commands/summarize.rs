use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::commands::{CommandReport, read_page_text, start_extension};
use crate::digest::host::TerminalHost;
use crate::digest::page::{Overlay, PageSnapshot, PageState, ShareMethod};

#[derive(Debug, Clone, Default)]
pub struct SummarizeOptions {
    pub file: PathBuf,
    pub title: Option<String>,
    pub url: Option<String>,
    pub save: bool,
    pub original: bool,
    pub copy: bool,
    pub share: bool,
    pub copy_original: bool,
}

fn snapshot_for(
    file: &Path,
    title: Option<String>,
    url: Option<String>,
    body_text: String,
) -> PageSnapshot {
    let from_stdin = file == Path::new("-");
    let title = title.unwrap_or_else(|| {
        if from_stdin {
            "stdin".to_string()
        } else {
            file.file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| file.display().to_string())
        }
    });
    let url = url.unwrap_or_else(|| {
        if from_stdin {
            "about:blank".to_string()
        } else {
            format!("file://{}", file.display())
        }
    });
    PageSnapshot {
        title,
        url,
        body_text,
    }
}

pub async fn run(opts: SummarizeOptions) -> Result<CommandReport> {
    let mut report = CommandReport::new("summarize");
    let body_text = read_page_text(&opts.file)?;
    let snapshot = snapshot_for(&opts.file, opts.title, opts.url, body_text);

    let mut ext = start_extension()?;
    let export_dir = ext.paths().export_dir.clone();
    let mut page = ext.attach_page(TerminalHost::new(export_dir))?;

    match page.click_icon(&snapshot).await {
        Ok(PageState::DisplayingSuccess) => {
            if opts.copy {
                page.copy()?;
            }
            if opts.share {
                let method = match page.share()? {
                    ShareMethod::Native => "native",
                    ShareMethod::Clipboard => "clipboard",
                };
                report.detail(format!("share={method}"));
            }
            if opts.save {
                let saved = page.save()?;
                report.detail(format!("saved_summaries={}", saved.stored));
                report.detail(format!("export={}", saved.download.display()));
            }
            if opts.original || opts.copy_original {
                page.view_original()?;
                if opts.copy_original {
                    page.copy_original()?;
                }
                // Backdrop click closes the nested original layer first.
                page.outside_click();
            }
        }
        Ok(_) => {
            if let Some(Overlay::Error { message }) = page.overlay() {
                report.issue(message.clone());
            }
        }
        Err(err) => report.issue(format!("{err:#}")),
    }
    page.close();
    report.detail(format!("page.state={:?}", page.state()));

    let mut frames = page.host().transcript();
    frames.append(&mut report.details);
    report.details = frames;

    ext.shutdown();
    Ok(report)
}
