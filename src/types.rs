//! Core types for media-dl
//!
//! Wire shapes consumed from the download backend plus the small value types
//! the rest of the crate is built on. Jobs are owned by the backend; the
//! client only ever holds read-only copies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::platform::Platform;
use crate::utils::format_duration;

/// Opaque job identifier assigned by the backend
///
/// The backend currently emits numeric ids, but nothing in the client relies
/// on that: both JSON numbers and strings are accepted.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JobId(String);

impl JobId {
    /// Create a JobId from its textual form
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the textual form, as used in URL paths
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<u64> for JobId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for JobId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for JobId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        // Numeric ids go back out as numbers so the backend sees what it sent.
        match self.0.parse::<u64>() {
            Ok(n) if n.to_string() == self.0 => serializer.serialize_u64(n),
            _ => serializer.serialize_str(&self.0),
        }
    }
}

impl<'de> Deserialize<'de> for JobId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Number(u64),
            Text(String),
        }

        Ok(match Wire::deserialize(deserializer)? {
            Wire::Number(n) => JobId::from(n),
            Wire::Text(s) => JobId(s),
        })
    }
}

/// Requested media kind
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum MediaFormat {
    /// Video with audio
    #[default]
    Video,
    /// Audio only
    Audio,
}

impl MediaFormat {
    /// Extension used when nothing else has been chosen
    pub fn default_extension(&self) -> &'static str {
        match self {
            MediaFormat::Video => "mp4",
            MediaFormat::Audio => "mp3",
        }
    }

    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaFormat::Video => "video",
            MediaFormat::Audio => "audio",
        }
    }
}

// The backend treats anything that is not "audio" as video.
impl From<String> for MediaFormat {
    fn from(value: String) -> Self {
        if value.eq_ignore_ascii_case("audio") {
            MediaFormat::Audio
        } else {
            MediaFormat::Video
        }
    }
}

impl std::fmt::Display for MediaFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Job status as reported by the backend
///
/// The backend drives every transition; the client never infers or forces
/// one. Unknown status strings are kept verbatim in [`JobStatus::Unrecognized`]
/// so a newer backend does not break the client.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum JobStatus {
    /// No status reported yet
    #[default]
    Queued,
    /// Backend is extracting or preparing the media
    Processing,
    /// Artifact is being streamed
    Streaming,
    /// Finished; artifact retrievable
    Completed,
    /// Prepared; artifact retrievable on demand
    Ready,
    /// Terminal failure
    Failed,
    /// Status text this client does not know
    Unrecognized(String),
}

impl JobStatus {
    /// Lowercase label for display
    pub fn label(&self) -> &str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Streaming => "streaming",
            JobStatus::Completed => "completed",
            JobStatus::Ready => "ready",
            JobStatus::Failed => "failed",
            JobStatus::Unrecognized(raw) => raw,
        }
    }

    /// Whether the artifact can be retrieved (`completed` or `ready`)
    pub fn is_terminal_success(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Ready)
    }

    /// Whether no further transition is expected
    pub fn is_terminal(&self) -> bool {
        self.is_terminal_success() || matches!(self, JobStatus::Failed)
    }
}

impl From<Option<String>> for JobStatus {
    fn from(value: Option<String>) -> Self {
        let Some(raw) = value else {
            return JobStatus::Queued;
        };
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "queued" => JobStatus::Queued,
            "processing" => JobStatus::Processing,
            "streaming" => JobStatus::Streaming,
            "completed" => JobStatus::Completed,
            "ready" => JobStatus::Ready,
            "failed" => JobStatus::Failed,
            _ => JobStatus::Unrecognized(raw),
        }
    }
}

impl From<JobStatus> for String {
    fn from(status: JobStatus) -> Self {
        status.label().to_string()
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Body of `POST /download`
///
/// Built fresh for every submission and never persisted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadRequest {
    /// Source media URL
    pub url: String,
    /// Requested media kind
    pub format: MediaFormat,
    /// Quality label (e.g. "best", "720p", "192k")
    pub quality: String,
    /// Container/extension (e.g. "mp4", "mp3")
    pub extension: String,
}

/// Success body of `POST /download`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitReceipt {
    /// Id of the created job
    pub id: JobId,
    /// Platform the backend detected
    #[serde(default)]
    pub platform: Platform,
    /// Title resolved by the backend, if any
    #[serde(default)]
    pub title: Option<String>,
    /// Informational message from the backend
    #[serde(default)]
    pub message: Option<String>,
}

/// A download job as reported by `GET /downloads`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DownloadJob {
    /// Backend-assigned id
    pub id: JobId,
    /// Source media URL
    pub url: String,
    /// Title, once the backend has resolved it
    #[serde(default, deserialize_with = "empty_as_none")]
    pub title: Option<String>,
    /// Source platform
    #[serde(default)]
    pub platform: Option<Platform>,
    /// Requested media kind
    #[serde(default)]
    pub format: MediaFormat,
    /// Container/extension
    #[serde(default)]
    pub extension: String,
    /// Quality label
    #[serde(default)]
    pub quality: String,
    /// Backend status
    #[serde(default)]
    pub status: JobStatus,
    /// Media duration in seconds
    #[serde(default)]
    pub duration: Option<f64>,
    /// Artifact size in bytes
    #[serde(default)]
    pub file_size: Option<u64>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Completion time, once finished
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Placeholder shown while the backend has not resolved a title
pub const PLACEHOLDER_TITLE: &str = "Processing...";

impl DownloadJob {
    /// Title for display, falling back to a placeholder
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(PLACEHOLDER_TITLE)
    }

    /// Human-readable duration, hidden when absent or zero
    pub fn display_duration(&self) -> Option<String> {
        self.duration
            .filter(|d| d.is_finite() && *d > 0.0)
            .map(|d| format_duration(d.round() as u64))
    }

    /// Extension for the saved artifact, falling back to the format default
    pub fn effective_extension(&self) -> &str {
        if self.extension.trim().is_empty() {
            self.format.default_extension()
        } else {
            self.extension.trim()
        }
    }
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

/// Body of the backend root endpoint
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiStatus {
    /// "ok" when healthy
    pub status: String,
    /// Free-form description
    #[serde(default)]
    pub message: String,
    /// Backend version string
    #[serde(default)]
    pub version: String,
}
