//! Backend response bodies and mock mounting helpers

use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// `/formats` body as served by the reference backend
pub fn catalog_body() -> Value {
    json!({
        "video_qualities": ["144p", "240p", "360p", "480p", "720p", "1080p", "1440p", "2160p", "best"],
        "audio_qualities": ["64k", "128k", "192k", "256k", "320k", "best"],
        "video_formats": ["mp4", "webm", "mkv"],
        "audio_formats": ["mp3", "opus", "m4a"]
    })
}

/// One `/downloads` entry
pub fn job_body(id: u64, status: &str, title: Option<&str>, duration: Option<f64>) -> Value {
    let mut job = json!({
        "id": id,
        "url": "https://youtu.be/x",
        "title": title.unwrap_or(""),
        "platform": "youtube",
        "format": "audio",
        "extension": "mp3",
        "quality": "best",
        "status": status,
        "created_at": "2025-01-02T03:04:05Z"
    });
    if let Some(duration) = duration {
        job["duration"] = json!(duration);
    }
    job
}

/// Serve `body` for `GET {path}`
pub async fn mount_get(server: &MockServer, route: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Serve the catalog and the given job list
pub async fn mount_backend(server: &MockServer, jobs: Value) {
    mount_get(server, "/api/formats", catalog_body()).await;
    mount_get(server, "/api/downloads", jobs).await;
}
