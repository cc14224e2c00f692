//! Submission client: turns a selection into one job-creation request
//!
//! A second submission while one is pending is rejected with
//! [`Error::SubmissionInFlight`] instead of creating a duplicate job.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};

use crate::backend::DownloadApi;
use crate::error::{Error, Result};
use crate::selection::Selection;
use crate::types::{DownloadRequest, SubmitReceipt};

/// Single-flight wrapper around `POST /download`
pub struct SubmissionClient {
    api: Arc<dyn DownloadApi>,
    pending: AtomicBool,
}

/// Clears the pending flag when the submission finishes, however it ends
struct PendingGuard<'a>(&'a AtomicBool);

impl<'a> PendingGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl SubmissionClient {
    /// Create a client for `api`
    pub fn new(api: Arc<dyn DownloadApi>) -> Self {
        Self {
            api,
            pending: AtomicBool::new(false),
        }
    }

    /// Whether a submission is currently awaiting the backend
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Submit `url` with `selection`
    ///
    /// Fails with [`Error::EmptyUrl`] for a blank url and with
    /// [`Error::SubmissionInFlight`] while another submission is pending.
    /// Backend failures are returned unchanged; nothing is retried.
    pub async fn submit(&self, url: &str, selection: &Selection) -> Result<SubmitReceipt> {
        let url = url.trim();
        if url.is_empty() {
            return Err(Error::EmptyUrl);
        }

        let _guard = PendingGuard::acquire(&self.pending).ok_or(Error::SubmissionInFlight)?;

        let request = DownloadRequest {
            url: url.to_string(),
            format: selection.format,
            quality: selection.quality.clone(),
            extension: selection.extension.clone(),
        };

        match self.api.create_download(&request).await {
            Ok(receipt) => {
                info!(
                    job_id = %receipt.id,
                    platform = %receipt.platform,
                    format = %request.format,
                    quality = %request.quality,
                    extension = %request.extension,
                    "Download job submitted"
                );
                Ok(receipt)
            }
            Err(e) => {
                warn!(error = %e, url = %request.url, "Download submission failed");
                Err(e)
            }
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{FakeApi, eventually};
    use crate::types::MediaFormat;
    use tokio_test::assert_ok;

    fn client(api: &Arc<FakeApi>) -> Arc<SubmissionClient> {
        Arc::new(SubmissionClient::new(api.clone()))
    }

    #[tokio::test]
    async fn sends_selection_as_request() {
        let api = Arc::new(FakeApi::new());
        let client = client(&api);
        let selection = Selection::defaults_for(MediaFormat::Audio);

        let receipt = assert_ok!(client.submit("https://youtu.be/x", &selection).await);

        assert_eq!(receipt.id.as_str(), "1");
        let requests = api.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0],
            DownloadRequest {
                url: "https://youtu.be/x".into(),
                format: MediaFormat::Audio,
                quality: "best".into(),
                extension: "mp3".into(),
            }
        );
    }

    #[tokio::test]
    async fn blank_url_is_rejected_locally() {
        let api = Arc::new(FakeApi::new());
        let client = client(&api);

        let err = client.submit("   ", &Selection::default()).await.unwrap_err();

        assert!(matches!(err, Error::EmptyUrl));
        assert_eq!(api.create_calls(), 0);
    }

    #[tokio::test]
    async fn second_submit_while_pending_is_rejected() {
        let api = Arc::new(FakeApi::new());
        let client = client(&api);
        let gate = api.gate_next_create();

        let first = tokio::spawn({
            let client = client.clone();
            async move {
                client
                    .submit("https://youtu.be/x", &Selection::default())
                    .await
            }
        });
        eventually(|| api.create_calls() == 1).await;
        assert!(client.is_pending());

        let second = client
            .submit("https://youtu.be/x", &Selection::default())
            .await;
        assert!(matches!(second, Err(Error::SubmissionInFlight)));

        gate.notify_one();
        assert_ok!(first.await.unwrap());
        assert_eq!(api.create_calls(), 1);
        assert_eq!(api.requests().len(), 1);
        assert!(!client.is_pending());
    }

    #[tokio::test]
    async fn failure_releases_guard() {
        let api = Arc::new(FakeApi::new());
        api.fail_create_with(500);
        let client = client(&api);

        let err = client
            .submit("https://youtu.be/x", &Selection::default())
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Failed to start download");
        assert!(!client.is_pending());

        // A retry is possible right away.
        assert!(
            client
                .submit("https://youtu.be/x", &Selection::default())
                .await
                .is_err()
        );
        assert_eq!(api.create_calls(), 2);
    }
}
