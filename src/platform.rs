//! Source platform detection
//!
//! Classification is purely advisory: it feeds the display while the user
//! types and never blocks or alters a submission. The backend performs its
//! own detection and its answer is the one stored on the job.

use serde::{Deserialize, Serialize};

/// Known source platforms
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Platform {
    /// youtube.com / youtu.be
    Youtube,
    /// tiktok.com / vm.tiktok.com
    Tiktok,
    /// Anything else, including empty input
    #[default]
    Unknown,
}

/// Host fragments matched by substring, checked in order
const HOST_FRAGMENTS: &[(&str, Platform)] = &[
    ("vm.tiktok.com", Platform::Tiktok),
    ("vt.tiktok.com", Platform::Tiktok),
    ("tiktok.com", Platform::Tiktok),
    ("youtu.be", Platform::Youtube),
    ("youtube.com", Platform::Youtube),
];

impl Platform {
    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Youtube => "youtube",
            Platform::Tiktok => "tiktok",
            Platform::Unknown => "unknown",
        }
    }
}

impl From<String> for Platform {
    fn from(value: String) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "youtube" => Platform::Youtube,
            "tiktok" => Platform::Tiktok,
            _ => Platform::Unknown,
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a URL string into a known source platform
///
/// Pure and synchronous. Returns [`Platform::Unknown`] for empty or
/// non-matching input.
///
/// # Examples
///
/// ```
/// use media_dl::platform::{detect, Platform};
///
/// assert_eq!(detect("https://youtu.be/abc"), Platform::Youtube);
/// assert_eq!(detect("https://vm.tiktok.com/xyz"), Platform::Tiktok);
/// assert_eq!(detect(""), Platform::Unknown);
/// ```
#[must_use]
pub fn detect(url: &str) -> Platform {
    let url = url.trim();
    if url.is_empty() {
        return Platform::Unknown;
    }

    let lowered = url.to_ascii_lowercase();
    HOST_FRAGMENTS
        .iter()
        .find(|(fragment, _)| lowered.contains(fragment))
        .map(|(_, platform)| *platform)
        .unwrap_or(Platform::Unknown)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_youtube_short_and_long_domains() {
        assert_eq!(detect("https://youtu.be/abc"), Platform::Youtube);
        assert_eq!(
            detect("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
            Platform::Youtube
        );
        assert_eq!(detect("https://m.youtube.com/shorts/abc"), Platform::Youtube);
    }

    #[test]
    fn detects_tiktok_short_and_long_domains() {
        assert_eq!(detect("https://vm.tiktok.com/xyz"), Platform::Tiktok);
        assert_eq!(
            detect("https://www.tiktok.com/@user/video/123"),
            Platform::Tiktok
        );
    }

    #[test]
    fn empty_and_garbage_are_unknown() {
        assert_eq!(detect(""), Platform::Unknown);
        assert_eq!(detect("   "), Platform::Unknown);
        assert_eq!(detect("not a url"), Platform::Unknown);
        assert_eq!(detect("https://vimeo.com/123"), Platform::Unknown);
    }

    #[test]
    fn matching_ignores_case() {
        assert_eq!(detect("HTTPS://YOUTU.BE/ABC"), Platform::Youtube);
    }

    #[test]
    fn wire_values_degrade_to_unknown() {
        let parse = |s: &str| serde_json::from_value::<Platform>(serde_json::json!(s)).unwrap();

        assert_eq!(parse("youtube"), Platform::Youtube);
        assert_eq!(parse("tiktok"), Platform::Tiktok);
        assert_eq!(parse(""), Platform::Unknown);
        assert_eq!(parse("instagram"), Platform::Unknown);
        assert_eq!(
            serde_json::to_value(Platform::Tiktok).unwrap(),
            serde_json::json!("tiktok")
        );
    }
}
