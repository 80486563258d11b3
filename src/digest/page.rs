//! Page-embedded controller: one overlay slot, one floating icon.
//!
//! `Idle -> (extract) -> Requesting -> Displaying(Success | Failure) -> Idle`.
//! Extraction is synchronous and never observable between awaits.

use crate::digest::audit::AuditLog;
use crate::digest::config::DigestConfig;
use crate::digest::credentials::{ExtensionState, read_extension_state};
use crate::digest::export::{export_contents, export_filename};
use crate::digest::extract::extract_page_text;
use crate::digest::host::{PageHost, ShareData};
use crate::digest::protocol::{
    BrokerHandle, BrokerRequest, PageNotice, SummarizationResult, SummarizeReply,
};
use crate::digest::storage::{KEY_EXTENSION_ENABLED, StorageChange, SyncStorage};
use crate::digest::summaries::{self, SummaryRecord};
use crate::digest::util::now_epoch_millis;
use crate::error::{DigestError, GENERIC_FAILURE_MESSAGE};
use anyhow::{Result, bail};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::Instant;

pub const REPLY_TIMEOUT_MESSAGE: &str = "Timed out waiting for a summary.";
pub const SHARE_FALLBACK_TOAST: &str = "Summary copied to clipboard for sharing!";
pub const SAVE_TOAST: &str = "Summary saved and downloaded!";

/// What the page exposes to extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSnapshot {
    pub title: String,
    pub url: String,
    pub body_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageContext {
    pub title: String,
    pub url: String,
    pub cleaned_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Overlay {
    Loading {
        request_id: u64,
        page: PageContext,
    },
    Summary {
        summary: String,
        page: PageContext,
        original_open: bool,
    },
    Error {
        message: String,
    },
    /// Raw extracted text, no broker round-trip.
    Text {
        text: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageState {
    Idle,
    Requesting,
    DisplayingSuccess,
    DisplayingFailure,
    DisplayingText,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareMethod {
    Native,
    Clipboard,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOutcome {
    pub stored: usize,
    pub download: PathBuf,
}

#[derive(Debug, Clone)]
pub struct PageSettings {
    pub page_text_chars: usize,
    pub max_saved_summaries: usize,
    pub reply_timeout: Option<Duration>,
}

impl PageSettings {
    pub fn from_config(cfg: &DigestConfig) -> Self {
        Self {
            page_text_chars: cfg.limits.page_text_chars,
            max_saved_summaries: cfg.limits.max_saved_summaries,
            reply_timeout: cfg.page.reply_timeout(),
        }
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending::<()>().await,
    }
}

pub struct PageController<H> {
    host: H,
    broker: BrokerHandle,
    notices: mpsc::UnboundedReceiver<Value>,
    storage: Arc<SyncStorage>,
    changes: broadcast::Receiver<StorageChange>,
    settings: PageSettings,
    audit: AuditLog,
    icon_visible: bool,
    overlay: Option<Overlay>,
    next_request_id: u64,
}

impl<H: PageHost> PageController<H> {
    pub fn new(
        host: H,
        broker: BrokerHandle,
        notices: mpsc::UnboundedReceiver<Value>,
        storage: Arc<SyncStorage>,
        settings: PageSettings,
        audit: AuditLog,
    ) -> Result<Self> {
        let changes = storage.subscribe();
        let state = read_extension_state(&storage)?;
        let mut controller = Self {
            host,
            broker,
            notices,
            storage,
            changes,
            settings,
            audit,
            icon_visible: false,
            overlay: None,
            next_request_id: 1,
        };
        if state.enabled {
            controller.show_icon();
        }
        Ok(controller)
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn icon_visible(&self) -> bool {
        self.icon_visible
    }

    pub fn overlay(&self) -> Option<&Overlay> {
        self.overlay.as_ref()
    }

    pub fn state(&self) -> PageState {
        match &self.overlay {
            None => PageState::Idle,
            Some(Overlay::Loading { .. }) => PageState::Requesting,
            Some(Overlay::Summary { .. }) => PageState::DisplayingSuccess,
            Some(Overlay::Error { .. }) => PageState::DisplayingFailure,
            Some(Overlay::Text { .. }) => PageState::DisplayingText,
        }
    }

    fn show_icon(&mut self) {
        if !self.icon_visible {
            self.host.show_icon();
            self.icon_visible = true;
        }
    }

    fn hide_icon(&mut self) {
        if self.icon_visible {
            self.host.hide_icon();
            self.icon_visible = false;
        }
    }

    /// Evicts whatever occupied the slot.
    fn set_overlay(&mut self, overlay: Overlay) {
        if self.overlay.take().is_some() {
            self.host.remove_overlay();
        }
        self.host.render(&overlay);
        self.overlay = Some(overlay);
    }

    fn clear_overlay(&mut self) {
        if self.overlay.take().is_some() {
            self.host.remove_overlay();
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        if enabled {
            self.show_icon();
        } else {
            self.clear_overlay();
            self.hide_icon();
        }
    }

    pub fn handle_notice(&mut self, message: Value) {
        match serde_json::from_value::<PageNotice>(message) {
            Ok(PageNotice::ToggleExtension { enabled }) => self.set_enabled(enabled),
            Err(err) => tracing::debug!("ignoring page message: {err}"),
        }
    }

    fn handle_storage_change(&mut self, change: StorageChange) {
        if change.key == KEY_EXTENSION_ENABLED {
            let state = ExtensionState::from_stored(change.new_value.as_ref());
            self.set_enabled(state.enabled);
        }
    }

    fn resync_enabled(&mut self) {
        match read_extension_state(&self.storage) {
            Ok(state) => self.set_enabled(state.enabled),
            Err(err) => tracing::warn!("failed to re-read extension state: {err:#}"),
        }
    }

    /// Apply every notification that has already arrived.
    pub fn poll_notifications(&mut self) {
        while let Ok(message) = self.notices.try_recv() {
            self.handle_notice(message);
        }
        loop {
            match self.changes.try_recv() {
                Ok(change) => self.handle_storage_change(change),
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "storage change feed lagged");
                    self.resync_enabled();
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
    }

    fn ensure_icon(&mut self) -> Result<()> {
        self.poll_notifications();
        if !self.icon_visible {
            bail!("page-digest is disabled on this page; enable it first");
        }
        Ok(())
    }

    /// Icon click in raw-text mode: show the cleaned page text.
    pub fn click_icon_for_text(&mut self, page: &PageSnapshot) -> Result<PageState> {
        self.ensure_icon()?;
        let text = extract_page_text(&page.body_text, self.settings.page_text_chars);
        self.set_overlay(Overlay::Text { text });
        Ok(self.state())
    }

    /// Icon click: extract, show the loading overlay, and wait for the
    /// broker's reply (or a disable notice, or the reply timeout).
    pub async fn click_icon(&mut self, page: &PageSnapshot) -> Result<PageState> {
        self.ensure_icon()?;

        let cleaned = extract_page_text(&page.body_text, self.settings.page_text_chars);
        let request_id = self.next_request_id;
        self.next_request_id += 1;
        self.set_overlay(Overlay::Loading {
            request_id,
            page: PageContext {
                title: page.title.clone(),
                url: page.url.clone(),
                cleaned_text: cleaned.clone(),
            },
        });
        tracing::debug!(request_id, chars = cleaned.chars().count(), "requesting summary");

        let request = BrokerRequest::SummarizeText {
            request_id,
            text: cleaned,
        };
        match self.broker.send(&request) {
            Ok(reply) => self.await_reply(request_id, reply).await,
            Err(err) => self.complete(
                request_id,
                SummarizationResult::Failure {
                    message: err.to_string(),
                },
            ),
        }
        Ok(self.state())
    }

    fn is_awaiting(&self, request_id: u64) -> bool {
        matches!(
            &self.overlay,
            Some(Overlay::Loading { request_id: current, .. }) if *current == request_id
        )
    }

    async fn await_reply(&mut self, request_id: u64, mut reply: oneshot::Receiver<Value>) {
        let deadline = self.settings.reply_timeout.map(|limit| Instant::now() + limit);
        let mut changes_open = true;

        while self.is_awaiting(request_id) {
            tokio::select! {
                received = &mut reply => {
                    match received {
                        Ok(value) => self.deliver_reply(request_id, value),
                        Err(_) => self.complete(
                            request_id,
                            SummarizationResult::Failure {
                                message: DigestError::BrokerUnavailable.to_string(),
                            },
                        ),
                    }
                    return;
                }
                Some(message) = self.notices.recv() => self.handle_notice(message),
                change = self.changes.recv(), if changes_open => match change {
                    Ok(change) => self.handle_storage_change(change),
                    Err(RecvError::Lagged(_)) => self.resync_enabled(),
                    Err(RecvError::Closed) => changes_open = false,
                },
                _ = wait_until(deadline) => {
                    tracing::warn!(request_id, "no reply from broker before the timeout");
                    self.complete(
                        request_id,
                        SummarizationResult::Failure {
                            message: REPLY_TIMEOUT_MESSAGE.to_string(),
                        },
                    );
                    return;
                }
            }
        }
        tracing::debug!(request_id, "loading overlay gone; reply will go unobserved");
    }

    fn deliver_reply(&mut self, request_id: u64, value: Value) {
        match serde_json::from_value::<SummarizeReply>(value) {
            Ok(reply) => self.complete(request_id, reply.into_result()),
            Err(err) => {
                tracing::warn!(request_id, "malformed summarize reply: {err}");
                self.complete(
                    request_id,
                    SummarizationResult::Failure {
                        message: GENERIC_FAILURE_MESSAGE.to_string(),
                    },
                );
            }
        }
    }

    fn complete(&mut self, request_id: u64, result: SummarizationResult) {
        let page = match self.overlay.take() {
            Some(Overlay::Loading {
                request_id: current,
                page,
            }) if current == request_id => page,
            other => {
                self.overlay = other;
                tracing::debug!(request_id, "reply does not match the current overlay");
                return;
            }
        };

        self.host.remove_overlay();
        let next = match result {
            SummarizationResult::Success { summary } => Overlay::Summary {
                summary,
                page,
                original_open: false,
            },
            SummarizationResult::Failure { message } => Overlay::Error { message },
        };
        self.host.render(&next);
        self.overlay = Some(next);
    }

    pub fn close(&mut self) {
        self.clear_overlay();
    }

    /// A click on the backdrop closes the topmost layer.
    pub fn outside_click(&mut self) {
        if matches!(
            &self.overlay,
            Some(Overlay::Summary {
                original_open: true,
                ..
            })
        ) {
            self.close_original();
        } else {
            self.clear_overlay();
        }
    }

    fn displayed_summary(&self) -> Result<(String, PageContext)> {
        match &self.overlay {
            Some(Overlay::Summary { summary, page, .. }) => Ok((summary.clone(), page.clone())),
            _ => bail!("no summary is displayed"),
        }
    }

    pub fn copy(&mut self) -> Result<()> {
        let text = match &self.overlay {
            Some(Overlay::Summary { summary, .. }) => summary.clone(),
            Some(Overlay::Text { text }) => text.clone(),
            _ => bail!("nothing to copy in the current overlay"),
        };
        self.host.write_clipboard(&text)
    }

    pub fn share(&mut self) -> Result<ShareMethod> {
        let (summary, page) = self.displayed_summary()?;
        let share = ShareData {
            title: &page.title,
            text: &summary,
            url: &page.url,
        };
        if self.host.native_share(&share) {
            return Ok(ShareMethod::Native);
        }
        self.host.write_clipboard(&share.to_clipboard_text())?;
        self.host.toast(SHARE_FALLBACK_TOAST);
        Ok(ShareMethod::Clipboard)
    }

    pub fn save(&mut self) -> Result<SaveOutcome> {
        let (summary, page) = self.displayed_summary()?;
        let record = SummaryRecord {
            title: page.title,
            url: page.url,
            text: summary,
            timestamp: now_epoch_millis()?,
        };

        let filename = export_filename(&record.title, record.timestamp);
        let contents = export_contents(&record);
        let stored = summaries::save(&self.storage, record, self.settings.max_saved_summaries)?;
        self.audit
            .record("store", "ok", &format!("saved summary; store holds {stored}"));

        let download = self.host.download(&filename, &contents)?;
        self.host.toast(SAVE_TOAST);
        Ok(SaveOutcome { stored, download })
    }

    fn set_original_open(&mut self, open: bool) -> Result<()> {
        let Some(Overlay::Summary { original_open, .. }) = &mut self.overlay else {
            bail!("no summary is displayed");
        };
        *original_open = open;
        if let Some(overlay) = &self.overlay {
            self.host.render(overlay);
        }
        Ok(())
    }

    pub fn view_original(&mut self) -> Result<()> {
        self.set_original_open(true)
    }

    pub fn close_original(&mut self) {
        if let Err(err) = self.set_original_open(false) {
            tracing::debug!("close original ignored: {err}");
        }
    }

    pub fn copy_original(&mut self) -> Result<()> {
        let text = match &self.overlay {
            Some(Overlay::Summary {
                page,
                original_open: true,
                ..
            }) => page.cleaned_text.clone(),
            _ => bail!("the original text is not open"),
        };
        self.host.write_clipboard(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::broker::Broker;
    use crate::digest::credentials::{ExtensionState, write_extension_state};
    use crate::digest::host::{HostEvent, TerminalHost};
    use crate::digest::openai::Summarizer;
    use crate::digest::paths::DigestPaths;
    use crate::error::SummarizeError;
    use std::fs;
    use tempfile::{TempDir, tempdir};
    use tokio::sync::Notify;

    struct FixedSummarizer {
        outcome: Result<String, SummarizeError>,
        gate: Option<Arc<Notify>>,
    }

    #[async_trait::async_trait]
    impl Summarizer for FixedSummarizer {
        async fn summarize(&self, _api_key: &str, _prompt: &str) -> Result<String, SummarizeError> {
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            self.outcome.clone()
        }
    }

    struct Fixture {
        _tmp: TempDir,
        paths: DigestPaths,
        storage: Arc<SyncStorage>,
        notices: mpsc::UnboundedSender<Value>,
        page: PageController<TerminalHost>,
    }

    fn fixture(summarizer: FixedSummarizer, reply_timeout: Option<Duration>) -> Fixture {
        let tmp = tempdir().expect("tempdir");
        let paths = DigestPaths::under(tmp.path());
        let storage = Arc::new(SyncStorage::open(&paths.storage_file));
        let (broker, inbox) = BrokerHandle::channel();
        tokio::spawn(
            Broker::new(summarizer, Some("sk-test".to_string()), 4000, AuditLog::new(&paths))
                .run(inbox),
        );
        let (notices, notice_rx) = mpsc::unbounded_channel();
        let settings = PageSettings {
            page_text_chars: 5000,
            max_saved_summaries: 50,
            reply_timeout,
        };
        let page = PageController::new(
            TerminalHost::new(&paths.export_dir),
            broker,
            notice_rx,
            Arc::clone(&storage),
            settings,
            AuditLog::new(&paths),
        )
        .expect("page");
        Fixture {
            _tmp: tmp,
            paths,
            storage,
            notices,
            page,
        }
    }

    fn succeeding(summary: &str) -> FixedSummarizer {
        FixedSummarizer {
            outcome: Ok(summary.to_string()),
            gate: None,
        }
    }

    fn snapshot(body: &str) -> PageSnapshot {
        PageSnapshot {
            title: "Rust Book: Ownership".to_string(),
            url: "https://doc.rust-lang.org/book/ch04-00.html".to_string(),
            body_text: body.to_string(),
        }
    }

    fn toggle(enabled: bool) -> Value {
        serde_json::to_value(PageNotice::ToggleExtension { enabled }).expect("notice")
    }

    #[tokio::test]
    async fn icon_click_displays_summary_from_broker() {
        let mut fx = fixture(succeeding("• Ownership moves values"), None);
        assert!(fx.page.icon_visible());

        let state = fx
            .page
            .click_icon(&snapshot("  Ownership   is Rust's\nmost unique feature. "))
            .await
            .expect("click");

        assert_eq!(state, PageState::DisplayingSuccess);
        match fx.page.overlay() {
            Some(Overlay::Summary { summary, page, .. }) => {
                assert_eq!(summary, "• Ownership moves values");
                assert_eq!(page.cleaned_text, "Ownership is Rust's most unique feature.");
            }
            other => panic!("unexpected overlay: {other:?}"),
        }
    }

    #[tokio::test]
    async fn broker_failure_shows_error_overlay() {
        let mut fx = fixture(succeeding("unused"), None);
        let state = fx.page.click_icon(&snapshot("   ")).await.expect("click");

        assert_eq!(state, PageState::DisplayingFailure);
        assert_eq!(
            fx.page.overlay(),
            Some(&Overlay::Error {
                message: "No text provided for summarization.".to_string()
            })
        );
        assert!(fx.page.save().is_err());
        assert!(fx.page.copy().is_err());

        fx.page.close();
        assert_eq!(fx.page.state(), PageState::Idle);
    }

    #[tokio::test]
    async fn upstream_error_message_is_shown_verbatim() {
        let summarizer = FixedSummarizer {
            outcome: Err(SummarizeError::UpstreamHttp {
                status: 429,
                message: "Rate limit reached".to_string(),
            }),
            gate: None,
        };
        let mut fx = fixture(summarizer, None);
        fx.page.click_icon(&snapshot("text")).await.expect("click");
        assert_eq!(
            fx.page.overlay(),
            Some(&Overlay::Error {
                message: "Rate limit reached".to_string()
            })
        );
    }

    #[tokio::test]
    async fn page_text_is_capped_before_the_request() {
        let mut fx = fixture(succeeding("• ok"), None);
        let spaceless = "a".repeat(7000);
        let cut_on_space = format!("{}\n\n{}", "a".repeat(4999), "b".repeat(100));
        for body in [spaceless, cut_on_space] {
            fx.page.click_icon(&snapshot(&body)).await.expect("click");
            match fx.page.overlay() {
                Some(Overlay::Summary { page, .. }) => {
                    assert_eq!(page.cleaned_text.chars().count(), 5000)
                }
                other => panic!("unexpected overlay: {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn save_prepends_record_and_downloads_export() {
        let mut fx = fixture(succeeding("• Borrowing rules"), None);
        fx.page.click_icon(&snapshot("page body")).await.expect("click");

        let outcome = fx.page.save().expect("save");
        assert_eq!(outcome.stored, 1);
        let exported = fs::read_to_string(&outcome.download).expect("export");
        assert!(exported.contains("Source: https://doc.rust-lang.org/book/ch04-00.html"));
        assert!(exported.contains("• Borrowing rules"));
        assert!(outcome.download.starts_with(&fx.paths.export_dir));
        let name = outcome
            .download
            .file_name()
            .and_then(|n| n.to_str())
            .expect("file name");
        assert!(name.starts_with("summary_Rust_Book__Ownership_"));

        let records = summaries::list(&fx.storage).expect("list");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].text, "• Borrowing rules");
        assert_eq!(records[0].title, "Rust Book: Ownership");
        assert!(fx.page.host().events().contains(&HostEvent::Toast(SAVE_TOAST.to_string())));
    }

    #[tokio::test]
    async fn share_falls_back_to_clipboard_without_native_support() {
        let mut fx = fixture(succeeding("• Shared point"), None);
        fx.page.click_icon(&snapshot("body")).await.expect("click");

        assert_eq!(fx.page.share().expect("share"), ShareMethod::Clipboard);
        let clipboard = fx.page.host().clipboard().expect("clipboard").to_string();
        assert!(clipboard.contains("• Shared point"));
        assert!(clipboard.contains("Source: https://doc.rust-lang.org/book/ch04-00.html"));
        assert!(
            fx.page
                .host()
                .events()
                .contains(&HostEvent::Toast(SHARE_FALLBACK_TOAST.to_string()))
        );
    }

    #[tokio::test]
    async fn view_original_opens_nested_layer_closed_by_outside_click() {
        let mut fx = fixture(succeeding("• summary"), None);
        fx.page.click_icon(&snapshot("the full original text")).await.expect("click");

        assert!(fx.page.copy_original().is_err());
        fx.page.view_original().expect("view");
        fx.page.copy_original().expect("copy original");
        assert_eq!(fx.page.host().clipboard(), Some("the full original text"));

        fx.page.outside_click();
        assert!(matches!(
            fx.page.overlay(),
            Some(Overlay::Summary {
                original_open: false,
                ..
            })
        ));

        fx.page.outside_click();
        assert_eq!(fx.page.state(), PageState::Idle);
    }

    #[tokio::test]
    async fn new_icon_click_evicts_previous_overlay() {
        let mut fx = fixture(succeeding("• again"), None);
        fx.page.click_icon(&snapshot("first")).await.expect("click");
        fx.page.click_icon(&snapshot("second")).await.expect("click");

        let removed = fx
            .page
            .host()
            .events()
            .iter()
            .filter(|e| **e == HostEvent::OverlayRemoved)
            .count();
        // loading->summary, summary->loading, loading->summary
        assert_eq!(removed, 3);
        match fx.page.overlay() {
            Some(Overlay::Summary { page, .. }) => assert_eq!(page.cleaned_text, "second"),
            other => panic!("unexpected overlay: {other:?}"),
        }
    }

    #[tokio::test]
    async fn disable_notice_removes_overlay_and_icon_then_enable_restores_icon_only() {
        let mut fx = fixture(succeeding("• summary"), None);
        fx.page.click_icon(&snapshot("body")).await.expect("click");

        fx.notices.send(toggle(false)).expect("send");
        fx.page.poll_notifications();
        assert!(!fx.page.icon_visible());
        assert_eq!(fx.page.state(), PageState::Idle);
        assert!(fx.page.click_icon(&snapshot("body")).await.is_err());

        fx.notices.send(toggle(true)).expect("send");
        fx.page.poll_notifications();
        assert!(fx.page.icon_visible());
        assert_eq!(fx.page.state(), PageState::Idle);
    }

    #[tokio::test]
    async fn storage_change_to_enabled_flag_is_followed() {
        let mut fx = fixture(succeeding("• summary"), None);
        write_extension_state(&fx.storage, ExtensionState { enabled: false }).expect("write");
        fx.page.poll_notifications();
        assert!(!fx.page.icon_visible());
    }

    #[tokio::test]
    async fn disable_while_requesting_leaves_reply_unobserved() {
        let gate = Arc::new(Notify::new());
        let summarizer = FixedSummarizer {
            outcome: Ok("• late".to_string()),
            gate: Some(Arc::clone(&gate)),
        };
        let mut fx = fixture(summarizer, None);
        fx.notices.send(toggle(false)).expect("send");

        // The notice is already queued, but the click drains it first and fails.
        assert!(fx.page.click_icon(&snapshot("body")).await.is_err());

        fx.notices.send(toggle(true)).expect("send");
        let notices = fx.notices.clone();
        let body = snapshot("body");
        let (state, _) = tokio::join!(fx.page.click_icon(&body), async move {
            tokio::task::yield_now().await;
            notices.send(toggle(false)).expect("send");
        });

        assert_eq!(state.expect("click"), PageState::Idle);
        assert!(!fx.page.icon_visible());
        gate.notify_one();
    }

    #[tokio::test]
    async fn silent_broker_times_out() {
        let gate = Arc::new(Notify::new());
        let summarizer = FixedSummarizer {
            outcome: Ok("• never".to_string()),
            gate: Some(Arc::clone(&gate)),
        };
        let mut fx = fixture(summarizer, Some(Duration::from_millis(50)));

        let state = fx.page.click_icon(&snapshot("body")).await.expect("click");
        assert_eq!(state, PageState::DisplayingFailure);
        assert_eq!(
            fx.page.overlay(),
            Some(&Overlay::Error {
                message: REPLY_TIMEOUT_MESSAGE.to_string()
            })
        );
    }

    #[tokio::test]
    async fn raw_text_mode_skips_the_broker() {
        let mut fx = fixture(succeeding("unused"), None);
        let state = fx
            .page
            .click_icon_for_text(&snapshot(" Visible \n text "))
            .expect("click");
        assert_eq!(state, PageState::DisplayingText);
        fx.page.copy().expect("copy");
        assert_eq!(fx.page.host().clipboard(), Some("Visible text"));
    }
}
