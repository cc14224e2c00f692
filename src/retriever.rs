//! Artifact retrieval for finished jobs
//!
//! Only jobs in a terminal-success state can be retrieved; [`RetrievableJob`]
//! is the proof of that and the only input [`ArtifactRetriever::retrieve`]
//! accepts. Retrieval is fire-and-forget: the caller gets a
//! [`RetrievalStarted`] acknowledgement right away while a spawned task streams
//! the artifact to disk. The outcome of the transfer never feeds back into the
//! job store.

use futures::StreamExt;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::backend::DownloadApi;
use crate::config::{ClientConfig, FileCollisionAction};
use crate::error::{Error, Result};
use crate::types::{DownloadJob, JobId};
use crate::utils::{create_unique_file, sanitize_filename};

/// Filename stem used when a job has no usable title
pub const GENERIC_STEM: &str = "download";

/// A job whose artifact can be retrieved (status `completed` or `ready`)
#[derive(Clone, Debug, PartialEq)]
pub struct RetrievableJob(DownloadJob);

impl RetrievableJob {
    /// The underlying job
    pub fn job(&self) -> &DownloadJob {
        &self.0
    }

    /// Job id
    pub fn id(&self) -> &JobId {
        &self.0.id
    }

    /// Suggested local filename: sanitised title plus extension
    pub fn suggested_filename(&self) -> String {
        let stem = self
            .0
            .title
            .as_deref()
            .map(sanitize_filename)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| GENERIC_STEM.to_string());
        format!("{}.{}", stem, self.0.effective_extension())
    }
}

impl TryFrom<DownloadJob> for RetrievableJob {
    type Error = Error;

    fn try_from(job: DownloadJob) -> Result<Self> {
        if job.status.is_terminal_success() {
            Ok(Self(job))
        } else {
            Err(Error::NotRetrievable {
                id: job.id,
                status: job.status,
            })
        }
    }
}

impl DownloadJob {
    /// Retrieval view of this job, if its artifact is ready
    pub fn retrievable(&self) -> Option<RetrievableJob> {
        self.status
            .is_terminal_success()
            .then(|| RetrievableJob(self.clone()))
    }
}

/// Acknowledgement returned as soon as a retrieval is triggered
#[derive(Debug)]
pub struct RetrievalStarted {
    /// Job being retrieved
    pub job_id: JobId,
    /// Backend locator of the artifact
    pub locator: String,
    /// Suggested filename (the saved name may differ on collision)
    pub filename: String,
    /// Resolves to the saved path once the transfer ends
    pub handle: JoinHandle<Result<PathBuf>>,
}

/// Saves finished artifacts into the download directory
pub struct ArtifactRetriever {
    api: Arc<dyn DownloadApi>,
    download_dir: PathBuf,
    collision: FileCollisionAction,
}

impl ArtifactRetriever {
    /// Create a retriever using the config's directory and collision policy
    pub fn new(api: Arc<dyn DownloadApi>, config: &ClientConfig) -> Self {
        Self {
            api,
            download_dir: config.download_dir.clone(),
            collision: config.file_collision,
        }
    }

    /// Trigger retrieval of `job`
    ///
    /// The transfer is a child of `parent` and stops when it is cancelled. A
    /// failed or cancelled transfer removes its partial file.
    pub fn retrieve(&self, job: &RetrievableJob, parent: &CancellationToken) -> RetrievalStarted {
        let job_id = job.id().clone();
        let locator = self.api.artifact_url(&job_id);
        let filename = job.suggested_filename();

        info!(job_id = %job_id, %locator, %filename, "Retrieval started");

        let transfer = Transfer {
            api: self.api.clone(),
            job_id: job_id.clone(),
            target: self.download_dir.join(&filename),
            collision: self.collision,
        };
        let token = parent.child_token();
        let handle = tokio::spawn(async move {
            let job_id = transfer.job_id.clone();
            let result = tokio::select! {
                biased;
                _ = token.cancelled() => Err(Error::ShuttingDown),
                result = transfer.run() => result,
            };
            match &result {
                Ok(path) => info!(job_id = %job_id, path = %path.display(), "Retrieval finished"),
                Err(e) => warn!(job_id = %job_id, error = %e, "Retrieval failed"),
            }
            result
        });

        RetrievalStarted {
            job_id,
            locator,
            filename,
            handle,
        }
    }
}

struct Transfer {
    api: Arc<dyn DownloadApi>,
    job_id: JobId,
    target: PathBuf,
    collision: FileCollisionAction,
}

impl Transfer {
    async fn run(self) -> Result<PathBuf> {
        if let Some(dir) = self.target.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }

        let mut body = self.api.open_artifact(&self.job_id).await?;
        let (file, path) = create_unique_file(&self.target, self.collision).await?;

        // Removes the partial file unless the copy completes. Declared before
        // the handle so the handle closes first.
        let partial = PartialFile::new(path);
        let mut file = file;
        while let Some(chunk) = body.next().await {
            file.write_all(&chunk?).await?;
        }
        file.flush().await?;

        Ok(partial.keep())
    }
}

/// Deletes a file on drop unless [`keep`](PartialFile::keep) was called
///
/// Drop also runs when the transfer future is cancelled mid-copy.
struct PartialFile {
    path: Option<PathBuf>,
}

impl PartialFile {
    fn new(path: PathBuf) -> Self {
        Self { path: Some(path) }
    }

    /// Disarm the guard and hand back the finished file's path
    fn keep(mut self) -> PathBuf {
        self.path.take().unwrap_or_default()
    }
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        if let Some(path) = self.path.take()
            && let Err(e) = std::fs::remove_file(&path)
            && e.kind() != std::io::ErrorKind::NotFound
        {
            warn!(path = %path.display(), error = %e, "Failed to remove partial file");
        }
    }
}
