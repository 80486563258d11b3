use crate::digest::page::Overlay;
use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShareData<'a> {
    pub title: &'a str,
    pub text: &'a str,
    pub url: &'a str,
}

impl ShareData<'_> {
    /// Plain-text form used when no native share sheet is available.
    pub fn to_clipboard_text(&self) -> String {
        format!("{}\n\n{}\n\nSource: {}", self.title, self.text, self.url)
    }
}

/// Everything the page controller needs from the page it lives in.
pub trait PageHost {
    fn show_icon(&mut self);
    fn hide_icon(&mut self);
    fn render(&mut self, overlay: &Overlay);
    fn remove_overlay(&mut self);
    fn write_clipboard(&mut self, text: &str) -> Result<()>;
    /// Returns false when the host has no native share capability.
    fn native_share(&mut self, share: &ShareData<'_>) -> bool;
    fn download(&mut self, filename: &str, contents: &str) -> Result<PathBuf>;
    fn toast(&mut self, message: &str);
}

pub fn render_overlay(overlay: &Overlay) -> String {
    match overlay {
        Overlay::Loading { page, .. } => {
            format!("AI Summary\n==========\n\nGenerating summary for {}...", page.title)
        }
        Overlay::Summary {
            summary,
            page,
            original_open,
        } => {
            let mut out = format!(
                "AI Summary\n==========\n\n{summary}\n\n[Copy] [Share] [Save] [View Original] [Close]"
            );
            if *original_open {
                out.push_str(&format!(
                    "\n\nOriginal Text\n=============\n\n{}\n\n[Copy] [Close]",
                    page.cleaned_text
                ));
            }
            out
        }
        Overlay::Error { message } => format!("Error\n=====\n\n{message}\n\n[Close]"),
        Overlay::Text { text } => {
            format!("Extracted Page Text\n===================\n\n{text}\n\n[Copy Text]")
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    IconShown,
    IconHidden,
    Rendered(String),
    OverlayRemoved,
    Clipboard(String),
    Downloaded(PathBuf),
    Toast(String),
}

/// Host backed by the terminal: frames are recorded for printing and
/// downloads land in the export directory. There is no native share sheet.
#[derive(Debug)]
pub struct TerminalHost {
    export_dir: PathBuf,
    events: Vec<HostEvent>,
}

impl TerminalHost {
    pub fn new(export_dir: impl Into<PathBuf>) -> Self {
        Self {
            export_dir: export_dir.into(),
            events: Vec::new(),
        }
    }

    #[cfg(test)]
    pub fn events(&self) -> &[HostEvent] {
        &self.events
    }

    #[cfg(test)]
    pub fn clipboard(&self) -> Option<&str> {
        self.events.iter().rev().find_map(|event| match event {
            HostEvent::Clipboard(text) => Some(text.as_str()),
            _ => None,
        })
    }

    /// Human-readable lines for everything the page did.
    pub fn transcript(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|event| match event {
                HostEvent::Rendered(frame) => Some(frame.clone()),
                HostEvent::Clipboard(text) => Some(format!("[clipboard] {text}")),
                HostEvent::Downloaded(path) => Some(format!("[download] {}", path.display())),
                HostEvent::Toast(message) => Some(format!("[toast] {message}")),
                HostEvent::IconShown | HostEvent::IconHidden | HostEvent::OverlayRemoved => None,
            })
            .collect()
    }
}

impl PageHost for TerminalHost {
    fn show_icon(&mut self) {
        self.events.push(HostEvent::IconShown);
    }

    fn hide_icon(&mut self) {
        self.events.push(HostEvent::IconHidden);
    }

    fn render(&mut self, overlay: &Overlay) {
        self.events.push(HostEvent::Rendered(render_overlay(overlay)));
    }

    fn remove_overlay(&mut self) {
        self.events.push(HostEvent::OverlayRemoved);
    }

    fn write_clipboard(&mut self, text: &str) -> Result<()> {
        self.events.push(HostEvent::Clipboard(text.to_string()));
        Ok(())
    }

    fn native_share(&mut self, _share: &ShareData<'_>) -> bool {
        false
    }

    fn download(&mut self, filename: &str, contents: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.export_dir)
            .with_context(|| format!("failed to create {}", self.export_dir.display()))?;
        let path = self.export_dir.join(filename);
        fs::write(&path, contents).with_context(|| format!("failed to write {}", path.display()))?;
        self.events.push(HostEvent::Downloaded(path.clone()));
        Ok(path)
    }

    fn toast(&mut self, message: &str) {
        self.events.push(HostEvent::Toast(message.to_string()));
    }
}
