//! Error types for media-dl
//!
//! Every failure in the client is locally contained. The taxonomy mirrors how
//! failures are reported:
//! - transport errors (request never produced a response)
//! - application errors (non-2xx response, body not parsed)
//! - local precondition and selection errors
//! - local file-save errors during artifact retrieval

use std::path::PathBuf;
use thiserror::Error;

use crate::types::{JobId, JobStatus, MediaFormat};

/// Result type alias for media-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for media-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "poll_interval")
        key: Option<String>,
    },

    /// Transport error: the backend was unreachable or the request failed
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Application error: the backend answered with a non-success status
    #[error("{endpoint} returned HTTP {status}")]
    Http {
        /// HTTP status code returned by the backend
        status: u16,
        /// Endpoint path that was called (e.g., "/download")
        endpoint: String,
    },

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error while saving an artifact
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Submission attempted without a URL
    #[error("url is required")]
    EmptyUrl,

    /// A submission is already pending; the second call was rejected
    #[error("a submission is already in flight")]
    SubmissionInFlight,

    /// Quality or extension outside the catalog subset for the current format
    #[error("{value:?} is not a valid {field} for {format}")]
    InvalidSelection {
        /// Which part of the selection was rejected ("quality" or "extension")
        field: &'static str,
        /// The rejected value
        value: String,
        /// The format the value was checked against
        format: MediaFormat,
    },

    /// Retrieval requested for a job that is not in a terminal-success state
    #[error("job {id} is {status} and has no retrievable artifact")]
    NotRetrievable {
        /// The job id
        id: JobId,
        /// The job's current status
        status: JobStatus,
    },

    /// Job not present in the current snapshot
    #[error("job not found: {0}")]
    NotFound(String),

    /// Save target already exists and the collision policy is Skip
    #[error("file already exists: {}", path.display())]
    FileCollision {
        /// The path that already exists
        path: PathBuf,
    },

    /// The session has been shut down
    #[error("session is shut down")]
    ShuttingDown,
}

impl Error {
    /// Whether this is a transport error (no response was received)
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Network(e) if e.status().is_none())
    }

    /// Generic message suitable for showing to an end user
    ///
    /// Application errors get a fixed message; transport errors carry their
    /// detail. Local errors use their display text.
    pub fn user_message(&self) -> String {
        match self {
            Error::Http { .. } => "Failed to start download".to_string(),
            Error::Network(e) if e.status().is_some() => "Failed to start download".to_string(),
            other => format!("Error: {}", other),
        }
    }
}
