//! Download session: the orchestrating view
//!
//! A [`DownloadSession`] owns everything a download screen needs: the url
//! input and its advisory platform guess, the format selection, the last
//! status message, the job store with its poller, and any artifact transfers
//! it started. All of its background work is bound to the session's
//! cancellation token, so nothing outlives it.
//!
//! # Example
//!
//! ```no_run
//! use media_dl::{ClientConfig, DownloadSession, MediaFormat};
//!
//! # async fn example() -> media_dl::Result<()> {
//! let session = DownloadSession::start(ClientConfig::default()).await?;
//!
//! session.set_url("https://youtu.be/dQw4w9WgXcQ").await;
//! session.set_format(MediaFormat::Audio).await;
//! let receipt = session.submit().await?;
//!
//! session
//!     .subscribe()
//!     .wait_for(|s| s.get(&receipt.id).is_some_and(|j| j.status.is_terminal_success()))
//!     .await
//!     .map_err(|_| media_dl::Error::ShuttingDown)?;
//!
//! let started = session.retrieve(&receipt.id).await?;
//! let saved = started.handle.await.map_err(|_| media_dl::Error::ShuttingDown)??;
//! println!("saved to {}", saved.display());
//!
//! session.shutdown().await;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use tokio::sync::{Mutex, RwLock, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::backend::{DownloadApi, HttpApi};
use crate::catalog::fetch_catalog;
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::platform::{self, Platform};
use crate::poller::{JobPoller, PollerHandle};
use crate::retriever::{ArtifactRetriever, RetrievableJob, RetrievalStarted};
use crate::selection::{FormatSelector, Selection};
use crate::store::{JobSnapshot, JobStore};
use crate::submission::SubmissionClient;
use crate::types::{ApiStatus, JobId, MediaFormat, SubmitReceipt};

/// Message shown after a successful submission
pub const SUBMIT_SUCCESS_MESSAGE: &str = "Download started successfully!";

/// Message shown when an artifact retrieval is triggered
pub const RETRIEVAL_STARTED_MESSAGE: &str = "Retrieval started";

/// Input state of the download form
#[derive(Clone, Debug, Default)]
pub struct FormState {
    url: String,
    platform: Platform,
    selector: FormatSelector,
    message: Option<String>,
    submitting: bool,
}

impl FormState {
    /// Current url input
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Advisory platform guess for the url input
    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Current format selection
    pub fn selection(&self) -> &Selection {
        self.selector.selection()
    }

    /// Selector with the available options
    pub fn selector(&self) -> &FormatSelector {
        &self.selector
    }

    /// Last user-facing status message
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Whether a submission was awaiting the backend when this snapshot was taken
    pub fn submitting(&self) -> bool {
        self.submitting
    }
}

/// A running download session
pub struct DownloadSession {
    api: Arc<dyn DownloadApi>,
    store: Arc<JobStore>,
    submitter: SubmissionClient,
    retriever: ArtifactRetriever,
    form: RwLock<FormState>,
    poller: Mutex<Option<PollerHandle>>,
    token: CancellationToken,
}

impl DownloadSession {
    /// Start a session against the HTTP backend named in `config`
    pub async fn start(config: ClientConfig) -> Result<Self> {
        let api = Arc::new(HttpApi::new(&config)?);
        Self::with_api(config, api).await
    }

    /// Start a session against any [`DownloadApi`] implementation
    ///
    /// Fetches the format catalog once and starts polling. A failed catalog
    /// fetch is logged and the session continues with the built-in fallback.
    pub async fn with_api(config: ClientConfig, api: Arc<dyn DownloadApi>) -> Result<Self> {
        config.validate()?;

        let catalog = fetch_catalog(api.as_ref()).await;
        let store = Arc::new(JobStore::new());
        let token = CancellationToken::new();

        let poller = JobPoller::new(api.clone(), store.clone(), config.poll_interval).start(&token);

        info!(
            backend = api.name(),
            api_base_url = %config.api_base_url,
            catalog_loaded = catalog.is_some(),
            "Download session started"
        );

        Ok(Self {
            submitter: SubmissionClient::new(api.clone()),
            retriever: ArtifactRetriever::new(api.clone(), &config),
            form: RwLock::new(FormState {
                selector: FormatSelector::new(catalog),
                ..Default::default()
            }),
            poller: Mutex::new(Some(poller)),
            api,
            store,
            token,
        })
    }

    /// Snapshot of the form state
    pub async fn form(&self) -> FormState {
        let mut form = self.form.read().await.clone();
        form.submitting = self.submitter.is_pending();
        form
    }

    /// Update the url input and return the detected platform
    pub async fn set_url(&self, url: impl Into<String>) -> Platform {
        let mut form = self.form.write().await;
        form.url = url.into();
        form.platform = platform::detect(&form.url);
        form.platform
    }

    /// Switch media kind, resetting quality and extension
    pub async fn set_format(&self, format: MediaFormat) -> Selection {
        self.form.write().await.selector.set_format(format).clone()
    }

    /// Choose a quality for the current media kind
    pub async fn set_quality(&self, quality: &str) -> Result<Selection> {
        Ok(self.form.write().await.selector.set_quality(quality)?.clone())
    }

    /// Choose an extension for the current media kind
    pub async fn set_extension(&self, extension: &str) -> Result<Selection> {
        Ok(self
            .form
            .write()
            .await
            .selector
            .set_extension(extension)?
            .clone())
    }

    /// Show or hide the advanced options panel
    pub async fn set_advanced_visible(&self, visible: bool) {
        self.form.write().await.selector.set_advanced_visible(visible);
    }

    /// Whether a submission is awaiting the backend
    pub fn is_submitting(&self) -> bool {
        self.submitter.is_pending()
    }

    /// Submit the current url and selection
    ///
    /// On success the url input and platform guess are cleared and the job
    /// list is refreshed immediately. On failure the url input is kept and the
    /// form message carries a user-facing description. A blank url or a
    /// pending submission is rejected without touching the form.
    pub async fn submit(&self) -> Result<SubmitReceipt> {
        if self.token.is_cancelled() {
            return Err(Error::ShuttingDown);
        }
        if self.submitter.is_pending() {
            return Err(Error::SubmissionInFlight);
        }

        let (url, selection) = {
            let mut form = self.form.write().await;
            if form.url.trim().is_empty() {
                return Err(Error::EmptyUrl);
            }
            form.message = None;
            (form.url.clone(), form.selector.selection().clone())
        };

        match self.submitter.submit(&url, &selection).await {
            Ok(receipt) => {
                {
                    let mut form = self.form.write().await;
                    form.url.clear();
                    form.platform = Platform::Unknown;
                    form.message = Some(SUBMIT_SUCCESS_MESSAGE.to_string());
                }
                self.refresh().await;
                Ok(receipt)
            }
            Err(Error::SubmissionInFlight) => Err(Error::SubmissionInFlight),
            Err(e) => {
                self.form.write().await.message = Some(e.user_message());
                Err(e)
            }
        }
    }

    /// Request an immediate job list refresh
    pub async fn refresh(&self) {
        if let Some(poller) = self.poller.lock().await.as_ref() {
            debug!("Triggering job list refresh");
            poller.refresh();
        }
    }

    /// Current job snapshot
    pub fn jobs(&self) -> Arc<JobSnapshot> {
        self.store.snapshot()
    }

    /// Receiver notified on every change to the job snapshot
    pub fn subscribe(&self) -> watch::Receiver<Arc<JobSnapshot>> {
        self.store.subscribe()
    }

    /// Start saving the artifact of job `id`
    ///
    /// Fails with [`Error::NotFound`] when the job is not in the current
    /// snapshot and [`Error::NotRetrievable`] when it has not finished.
    pub async fn retrieve(&self, id: &JobId) -> Result<RetrievalStarted> {
        if self.token.is_cancelled() {
            return Err(Error::ShuttingDown);
        }

        let job = RetrievableJob::try_from(self.store.snapshot().require(id)?.clone())?;
        let started = self.retriever.retrieve(&job, &self.token);

        self.form.write().await.message = Some(RETRIEVAL_STARTED_MESSAGE.to_string());
        Ok(started)
    }

    /// Query the backend health endpoint
    pub async fn health(&self) -> Result<ApiStatus> {
        self.api.health().await
    }

    /// Whether the session has not been shut down
    pub fn is_running(&self) -> bool {
        !self.token.is_cancelled()
    }

    /// Stop polling and cancel in-flight retrievals
    ///
    /// Waits for the poll loop to exit. Calling it again is a no-op.
    pub async fn shutdown(&self) {
        self.token.cancel();
        let poller = self.poller.lock().await.take();
        if let Some(poller) = poller {
            poller.stop().await;
            info!("Download session stopped");
        }
    }
}

impl Drop for DownloadSession {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
