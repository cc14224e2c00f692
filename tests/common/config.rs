//! Session construction against a mock backend

use media_dl::{ClientConfig, DownloadSession};
use std::time::Duration;
use tempfile::TempDir;
use wiremock::MockServer;

/// Poll period used by integration tests
pub const TEST_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Config pointing at `server` and saving into `download_dir`
pub fn test_config(server: &MockServer, download_dir: &TempDir) -> ClientConfig {
    ClientConfig {
        api_base_url: format!("{}/api", server.uri()),
        poll_interval: TEST_POLL_INTERVAL,
        request_timeout: Duration::from_secs(5),
        download_dir: download_dir.path().to_path_buf(),
        ..Default::default()
    }
}

/// Start an HTTP-backed session against `server`
///
/// The returned TempDir must be kept alive for the duration of the test.
pub async fn create_test_session(server: &MockServer) -> (DownloadSession, TempDir) {
    let download_dir = TempDir::new().expect("Failed to create temp dir");
    let session = DownloadSession::start(test_config(server, &download_dir))
        .await
        .expect("Failed to start session");
    (session, download_dir)
}
