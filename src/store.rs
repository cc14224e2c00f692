//! Job store: the client's snapshot of every job the backend reports
//!
//! The store is replaced wholesale by each successful poll. Readers always see
//! a complete snapshot, either the previous one or the new one, never a mix.
//!
//! Every fetch draws a [`PollTicket`] before it is issued. A result is only
//! applied if its ticket is newer than the last applied one, so a slow fetch
//! that completes after a newer fetch can never roll the store back.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::types::{DownloadJob, JobId};

/// Sequence number drawn before issuing a list fetch
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct PollTicket(u64);

impl PollTicket {
    /// Raw sequence value
    pub fn seq(self) -> u64 {
        self.0
    }
}

/// What [`JobStore::apply`] did with a poll result
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Snapshot replaced and subscribers notified
    Replaced,
    /// Result identical to the current snapshot; nothing changed
    Unchanged,
    /// A newer result was already applied; this one was discarded
    Stale,
}

/// An immutable, ordered view of all known jobs
///
/// Order is the order the backend reported.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct JobSnapshot {
    seq: u64,
    jobs: Vec<DownloadJob>,
}

impl JobSnapshot {
    /// Ticket of the poll that produced this content (0 before the first poll)
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// All jobs in server-reported order
    pub fn jobs(&self) -> &[DownloadJob] {
        &self.jobs
    }

    /// Look a job up by id
    pub fn get(&self, id: &JobId) -> Option<&DownloadJob> {
        self.jobs.iter().find(|job| &job.id == id)
    }

    /// Look a job up by id, failing with [`Error::NotFound`]
    pub fn require(&self, id: &JobId) -> Result<&DownloadJob> {
        self.get(id).ok_or_else(|| Error::NotFound(id.to_string()))
    }

    /// Number of jobs
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Whether the snapshot holds no jobs
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

/// Holder of the current [`JobSnapshot`]
///
/// The poller is the only writer. Any number of readers can take snapshots
/// or subscribe to changes.
#[derive(Debug)]
pub struct JobStore {
    tx: watch::Sender<Arc<JobSnapshot>>,
    /// Last ticket handed out
    issued: AtomicU64,
    /// Newest ticket whose result was accepted (changed or not)
    applied: AtomicU64,
}

impl JobStore {
    /// Create an empty store
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Arc::new(JobSnapshot::default()));
        Self {
            tx,
            issued: AtomicU64::new(0),
            applied: AtomicU64::new(0),
        }
    }

    /// Draw the ticket for a fetch about to be issued
    pub fn ticket(&self) -> PollTicket {
        PollTicket(self.issued.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Replace the snapshot with a poll result
    ///
    /// Results older than the last accepted ticket are discarded. A result
    /// equal to the current content advances the ticket without waking
    /// subscribers. Duplicate ids keep their first occurrence.
    pub fn apply(&self, ticket: PollTicket, jobs: Vec<DownloadJob>) -> ApplyOutcome {
        let jobs = dedupe(jobs);
        let mut outcome = ApplyOutcome::Stale;

        // The closure runs under the channel's write lock, which serialises
        // the ticket check against concurrent applies.
        self.tx.send_if_modified(|current| {
            let newest = self.applied.load(Ordering::SeqCst);
            if ticket.0 <= newest {
                return false;
            }
            self.applied.store(ticket.0, Ordering::SeqCst);

            if current.jobs == jobs {
                outcome = ApplyOutcome::Unchanged;
                return false;
            }

            *current = Arc::new(JobSnapshot {
                seq: ticket.0,
                jobs,
            });
            outcome = ApplyOutcome::Replaced;
            true
        });

        match outcome {
            ApplyOutcome::Stale => debug!(
                seq = ticket.0,
                newest = self.applied.load(Ordering::SeqCst),
                "Discarded stale poll result"
            ),
            _ => debug!(seq = ticket.0, ?outcome, "Applied poll result"),
        }
        outcome
    }

    /// Current snapshot
    pub fn snapshot(&self) -> Arc<JobSnapshot> {
        self.tx.borrow().clone()
    }

    /// Receiver that is notified whenever the snapshot content changes
    pub fn subscribe(&self) -> watch::Receiver<Arc<JobSnapshot>> {
        self.tx.subscribe()
    }
}

impl Default for JobStore {
    fn default() -> Self {
        Self::new()
    }
}

fn dedupe(jobs: Vec<DownloadJob>) -> Vec<DownloadJob> {
    let mut seen = HashSet::with_capacity(jobs.len());
    let total = jobs.len();
    let unique: Vec<DownloadJob> = jobs
        .into_iter()
        .filter(|job| seen.insert(job.id.clone()))
        .collect();

    if unique.len() != total {
        warn!(
            dropped = total - unique.len(),
            "Poll result contained duplicate job ids"
        );
    }
    unique
}
