//! Configuration types for media-dl

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

/// Which backend route serves finished artifacts
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactRoute {
    /// `GET {api}/stream/{id}` (default)
    #[default]
    Stream,
    /// `GET {api}/file/{id}`
    File,
}

impl ArtifactRoute {
    /// Path segment for this route
    pub fn segment(&self) -> &'static str {
        match self {
            ArtifactRoute::Stream => "stream",
            ArtifactRoute::File => "file",
        }
    }
}

/// What to do when a retrieved artifact's filename already exists
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileCollisionAction {
    /// Append (1), (2), etc. to the filename (default)
    #[default]
    Rename,
    /// Overwrite the existing file
    Overwrite,
    /// Refuse to save
    Skip,
}

/// Main configuration for a download session
///
/// Every field has a default, so `ClientConfig::default()` talks to a backend
/// on `localhost:8080` and polls every three seconds.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the backend API, including the `/api` prefix
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Period between job list refreshes (default: 3000 ms)
    #[serde(default = "default_poll_interval", with = "duration_ms_serde")]
    pub poll_interval: Duration,

    /// Timeout applied to catalog, list and submission requests (default: 30 s)
    ///
    /// Artifact transfers are not bounded by this timeout.
    #[serde(default = "default_request_timeout", with = "duration_ms_serde")]
    pub request_timeout: Duration,

    /// Directory retrieved artifacts are saved into (default: "./downloads")
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,

    /// Route used to fetch finished artifacts
    #[serde(default)]
    pub artifact_route: ArtifactRoute,

    /// Filename collision handling for saved artifacts
    #[serde(default)]
    pub file_collision: FileCollisionAction,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            poll_interval: default_poll_interval(),
            request_timeout: default_request_timeout(),
            download_dir: default_download_dir(),
            artifact_route: ArtifactRoute::default(),
            file_collision: FileCollisionAction::default(),
        }
    }
}

impl ClientConfig {
    /// Parse a JSON config document; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: ClientConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that serde cannot
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.api_base_url).map_err(|e| Error::Config {
            message: format!("invalid api_base_url {:?}: {}", self.api_base_url, e),
            key: Some("api_base_url".to_string()),
        })?;

        if self.poll_interval.is_zero() {
            return Err(Error::Config {
                message: "poll_interval must be greater than zero".to_string(),
                key: Some("poll_interval".to_string()),
            });
        }

        Ok(())
    }

    /// Join an endpoint path onto the API base URL
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

fn default_api_base_url() -> String {
    "http://localhost:8080/api".to_string()
}

fn default_poll_interval() -> Duration {
    Duration::from_millis(3000)
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("./downloads")
}

// Duration serialization helper (milliseconds)
mod duration_ms_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let ms = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(ms))
    }
}
