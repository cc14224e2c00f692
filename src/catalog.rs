//! Format catalog: the valid (quality, extension) choices per media kind
//!
//! The catalog is fetched once when a session starts and is immutable
//! afterwards. When the fetch fails the session keeps running without it;
//! submissions with default choices never need it.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::backend::DownloadApi;
use crate::types::MediaFormat;

/// Quality sentinel meaning "let the backend pick the best available"
pub const BEST_QUALITY: &str = "best";

/// Body of `GET /formats`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatCatalog {
    /// Video quality labels (e.g. "720p", "best")
    #[serde(default)]
    pub video_qualities: Vec<String>,
    /// Video containers (e.g. "mp4", "webm")
    #[serde(default)]
    pub video_formats: Vec<String>,
    /// Audio bitrate labels (e.g. "192k", "best")
    #[serde(default)]
    pub audio_qualities: Vec<String>,
    /// Audio containers (e.g. "mp3", "opus")
    #[serde(default)]
    pub audio_formats: Vec<String>,
}

impl FormatCatalog {
    /// Minimal built-in catalog: only the defaults for each media kind
    pub fn fallback() -> Self {
        Self {
            video_qualities: vec![BEST_QUALITY.to_string()],
            video_formats: vec![MediaFormat::Video.default_extension().to_string()],
            audio_qualities: vec![BEST_QUALITY.to_string()],
            audio_formats: vec![MediaFormat::Audio.default_extension().to_string()],
        }
    }

    /// Quality options for a media kind
    pub fn qualities(&self, format: MediaFormat) -> &[String] {
        match format {
            MediaFormat::Video => &self.video_qualities,
            MediaFormat::Audio => &self.audio_qualities,
        }
    }

    /// Extension options for a media kind
    pub fn extensions(&self, format: MediaFormat) -> &[String] {
        match format {
            MediaFormat::Video => &self.video_formats,
            MediaFormat::Audio => &self.audio_formats,
        }
    }
}

/// Fetch the catalog, logging and discarding any failure
///
/// Called once per session. There is no retry: a failed fetch leaves the
/// advanced panel unavailable until the session is recreated.
pub async fn fetch_catalog(api: &dyn DownloadApi) -> Option<FormatCatalog> {
    match api.fetch_formats().await {
        Ok(catalog) => {
            info!(
                video_qualities = catalog.video_qualities.len(),
                audio_qualities = catalog.audio_qualities.len(),
                "Format catalog loaded"
            );
            Some(catalog)
        }
        Err(e) => {
            warn!(error = %e, "Failed to fetch format catalog, advanced options unavailable");
            None
        }
    }
}
