//! # media-dl
//!
//! Client-side job orchestration for a remote media download service.
//!
//! The backend does the real work (extraction, transcoding); this crate is the
//! client half. It submits a media URL with a format selection, tracks the
//! resulting job by polling the backend, and saves the artifact once the job
//! has finished.
//!
//! ## Design
//!
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//! - **Owned background work** - The poller and artifact transfers belong to a
//!   [`DownloadSession`] and stop with it
//! - **Snapshot store** - Each poll replaces the job list wholesale; late
//!   responses never roll it back
//! - **Pluggable backend** - Everything talks through the [`DownloadApi`] trait
//!
//! ## Quick Start
//!
//! ```no_run
//! use media_dl::{ClientConfig, DownloadSession, run_until_signal};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig {
//!         api_base_url: "http://localhost:8080/api".to_string(),
//!         ..Default::default()
//!     };
//!
//!     let session = DownloadSession::start(config).await?;
//!
//!     // React to every applied poll
//!     let mut jobs = session.subscribe();
//!     tokio::spawn(async move {
//!         while jobs.changed().await.is_ok() {
//!             for job in jobs.borrow_and_update().jobs() {
//!                 println!("{} {} {}", job.id, job.status, job.display_title());
//!             }
//!         }
//!     });
//!
//!     session.set_url("https://youtu.be/dQw4w9WgXcQ").await;
//!     session.submit().await?;
//!
//!     run_until_signal(session).await;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Backend seam and HTTP client
pub mod backend;
/// Format catalog
pub mod catalog;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Source platform detection
pub mod platform;
/// Periodic job list refresh
pub mod poller;
/// Artifact retrieval
pub mod retriever;
/// Format/quality selection
pub mod selection;
/// Download session orchestration
pub mod session;
/// Job store
pub mod store;
/// Job submission
pub mod submission;
/// Core data types
pub mod types;
/// Utility functions
pub mod utils;

#[cfg(test)]
pub(crate) mod test_helpers;

// Re-export commonly used types
pub use backend::{ArtifactStream, DownloadApi, HttpApi};
pub use catalog::FormatCatalog;
pub use config::{ArtifactRoute, ClientConfig, FileCollisionAction};
pub use error::{Error, Result};
pub use platform::Platform;
pub use retriever::{RetrievableJob, RetrievalStarted};
pub use selection::{FormatSelector, Selection};
pub use session::{DownloadSession, FormState};
pub use store::{JobSnapshot, JobStore};
pub use types::{
    ApiStatus, DownloadJob, DownloadRequest, JobId, JobStatus, MediaFormat, SubmitReceipt,
};

/// Run a session until the process is asked to stop, then shut it down.
///
/// Listens for SIGTERM and SIGINT on Unix and for Ctrl+C elsewhere. A signal
/// that cannot be registered is logged and never fires, so the others still
/// work.
///
/// # Example
///
/// ```no_run
/// use media_dl::{ClientConfig, DownloadSession, run_until_signal};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let session = DownloadSession::start(ClientConfig::default()).await?;
///     run_until_signal(session).await;
///     Ok(())
/// }
/// ```
pub async fn run_until_signal(session: DownloadSession) {
    run_until(&session, shutdown_signal()).await;
}

/// Keep `session` running until `shutdown` resolves, then shut it down.
///
/// Returns once the poll loop has exited and in-flight retrievals are cancelled.
pub async fn run_until<F>(session: &DownloadSession, shutdown: F)
where
    F: Future<Output = ()>,
{
    shutdown.await;
    tracing::info!("Shutdown requested");
    session.shutdown().await;
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Received Ctrl+C"),
            Err(e) => {
                tracing::warn!(error = %e, "Ctrl+C listener unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM");
            }
            Err(e) => {
                tracing::warn!(error = %e, "SIGTERM listener unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
