//! The download backend as seen from the client
//!
//! The backend performs extraction and transcoding; the client only consumes
//! its HTTP surface. [`DownloadApi`] is the seam every other component talks
//! through, so sessions can run against [`HttpApi`] or any other
//! implementation (tests use a scripted one).

mod http;

pub use http::HttpApi;

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::catalog::FormatCatalog;
use crate::error::Result;
use crate::types::{ApiStatus, DownloadJob, DownloadRequest, JobId, SubmitReceipt};

/// Body of a finished artifact, streamed in chunks
pub type ArtifactStream = BoxStream<'static, Result<bytes::Bytes>>;

/// Backend operations consumed by the client
///
/// Every method either returns the decoded body of a successful response or
/// an error: [`Error::Network`](crate::Error::Network) when no response was
/// received, [`Error::Http`](crate::Error::Http) for a non-2xx status.
/// Implementations never retry.
#[async_trait]
pub trait DownloadApi: Send + Sync {
    /// `GET /` on the backend host
    async fn health(&self) -> Result<ApiStatus>;

    /// `GET /formats`
    async fn fetch_formats(&self) -> Result<FormatCatalog>;

    /// `GET /downloads`, in server-reported order
    async fn list_downloads(&self) -> Result<Vec<DownloadJob>>;

    /// `GET /downloads/{id}`
    async fn fetch_download(&self, id: &JobId) -> Result<DownloadJob>;

    /// `POST /download`
    async fn create_download(&self, request: &DownloadRequest) -> Result<SubmitReceipt>;

    /// Locator of a job's artifact (`/stream/{id}` or `/file/{id}`)
    fn artifact_url(&self, id: &JobId) -> String;

    /// Open the artifact body for streaming
    async fn open_artifact(&self, id: &JobId) -> Result<ArtifactStream>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}
