use crate::digest::audit::AuditLog;
use crate::digest::broker::Broker;
use crate::digest::config::DigestConfig;
use crate::digest::credentials::read_api_key;
use crate::digest::host::PageHost;
use crate::digest::openai::{ChatCompletionsClient, Summarizer};
use crate::digest::page::{PageController, PageSettings};
use crate::digest::paths::DigestPaths;
use crate::digest::protocol::BrokerHandle;
use crate::digest::storage::SyncStorage;
use crate::digest::surface::ConfigSurface;
use anyhow::{Result, bail};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// The running extension: shared storage, the broker task, and the wiring
/// for one page context and the configuration surface.
///
/// Must be started from inside a tokio runtime.
pub struct Extension {
    paths: DigestPaths,
    config: DigestConfig,
    storage: Arc<SyncStorage>,
    broker: BrokerHandle,
    page_tx: mpsc::UnboundedSender<Value>,
    page_rx: Option<mpsc::UnboundedReceiver<Value>>,
    broker_task: JoinHandle<()>,
}

impl Extension {
    pub fn start(paths: DigestPaths, config: DigestConfig) -> Result<Self> {
        let client = ChatCompletionsClient::new(&config.api)?;
        Self::start_with(paths, config, client)
    }

    pub fn start_with<S>(paths: DigestPaths, config: DigestConfig, summarizer: S) -> Result<Self>
    where
        S: Summarizer + 'static,
    {
        let storage = Arc::new(SyncStorage::open(&paths.storage_file));
        // The broker caches the stored key once at startup; later changes
        // reach it only through updateApiKey.
        let credential = read_api_key(&storage)?;
        let audit = AuditLog::new(&paths);

        let (broker, inbox) = BrokerHandle::channel();
        let broker_task = tokio::spawn(
            Broker::new(summarizer, credential, config.limits.prompt_chars, audit).run(inbox),
        );
        let (page_tx, page_rx) = mpsc::unbounded_channel();
        tracing::debug!(storage = %paths.storage_file.display(), "extension started");

        Ok(Self {
            paths,
            config,
            storage,
            broker,
            page_tx,
            page_rx: Some(page_rx),
            broker_task,
        })
    }

    pub fn paths(&self) -> &DigestPaths {
        &self.paths
    }

    pub fn config(&self) -> &DigestConfig {
        &self.config
    }

    pub fn storage(&self) -> &Arc<SyncStorage> {
        &self.storage
    }

    /// Inject the controller into a page. Only one page is wired per run.
    pub fn attach_page<H: PageHost>(&mut self, host: H) -> Result<PageController<H>> {
        let Some(notices) = self.page_rx.take() else {
            bail!("a page is already attached");
        };
        PageController::new(
            host,
            self.broker.clone(),
            notices,
            Arc::clone(&self.storage),
            PageSettings::from_config(&self.config),
            AuditLog::new(&self.paths),
        )
    }

    pub fn surface(&self) -> ConfigSurface {
        ConfigSurface::new(
            Arc::clone(&self.storage),
            self.broker.clone(),
            self.page_tx.clone(),
            AuditLog::new(&self.paths),
        )
    }

    pub fn shutdown(self) {
        self.broker_task.abort();
    }
}
