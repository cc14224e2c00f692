//! Job poller: periodic, cancellable refresh of the job list
//!
//! The poller fetches `GET /downloads` on a fixed period and hands each result
//! to the [`JobStore`]. Fetches are serialised: the loop awaits each fetch
//! before waiting for the next tick, and ticks missed during a slow fetch are
//! skipped rather than queued. Every fetch also carries a [`PollTicket`], so
//! results of out-of-band fetches ([`JobPoller::poll_once`]) are reconciled by
//! the store as well.
//!
//! Failures are logged and otherwise ignored; the store keeps its previous
//! snapshot until a later tick succeeds.
//!
//! [`PollTicket`]: crate::store::PollTicket

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::backend::DownloadApi;
use crate::error::Result;
use crate::store::{ApplyOutcome, JobStore};

/// Fetches the job list and applies it to a store
#[derive(Clone)]
pub struct JobPoller {
    api: Arc<dyn DownloadApi>,
    store: Arc<JobStore>,
    period: Duration,
}

impl JobPoller {
    /// Create a poller for `store` that refreshes every `period`
    pub fn new(api: Arc<dyn DownloadApi>, store: Arc<JobStore>, period: Duration) -> Self {
        Self { api, store, period }
    }

    /// Run a single fetch-and-apply cycle
    ///
    /// The ticket is drawn before the request is issued, so a result that
    /// arrives after a newer one is reported as [`ApplyOutcome::Stale`].
    pub async fn poll_once(&self) -> Result<ApplyOutcome> {
        let ticket = self.store.ticket();
        let jobs = self.api.list_downloads().await?;
        Ok(self.store.apply(ticket, jobs))
    }

    /// Spawn the polling loop
    ///
    /// The first fetch happens immediately. The loop runs until the returned
    /// handle is stopped or dropped, or `parent` is cancelled.
    pub fn start(self, parent: &CancellationToken) -> PollerHandle {
        let token = parent.child_token();
        let refresh = Arc::new(Notify::new());

        let task = tokio::spawn(self.run(token.clone(), refresh.clone()));

        PollerHandle {
            token,
            refresh,
            task: Some(task),
        }
    }

    async fn run(self, token: CancellationToken, refresh: Arc<Notify>) {
        info!(
            backend = self.api.name(),
            period_ms = self.period.as_millis() as u64,
            "Job poller started"
        );

        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                _ = interval.tick() => {}
                _ = refresh.notified() => {
                    debug!("Refresh requested");
                }
            }

            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                result = self.poll_once() => {
                    if let Err(e) = result {
                        warn!(error = %e, "Poll tick failed, keeping previous job list");
                    }
                }
            }
        }

        info!("Job poller stopped");
    }
}

/// Owner of a running poll loop
///
/// Dropping the handle cancels the loop.
#[derive(Debug)]
pub struct PollerHandle {
    token: CancellationToken,
    refresh: Arc<Notify>,
    task: Option<JoinHandle<()>>,
}

impl PollerHandle {
    /// Request an immediate fetch without waiting for the next tick
    ///
    /// If a fetch is already running, one more follows right after it.
    pub fn refresh(&self) {
        self.refresh.notify_one();
    }

    /// Whether the loop is still running
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Cancel the loop and wait for it to exit
    pub async fn stop(mut self) {
        self.token.cancel();
        if let Some(task) = self.task.take()
            && let Err(e) = task.await
        {
            warn!(error = %e, "Job poller task ended abnormally");
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
