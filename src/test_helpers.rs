//! Scripted in-memory backend for orchestration tests
//!
//! [`FakeApi`] behaves like a tiny download service: submissions create
//! processing jobs, the list endpoint returns the current jobs, and artifacts
//! are served from memory. Calls can be held behind a gate so tests control
//! exactly when a response resolves.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{TimeZone, Utc};
use futures::StreamExt;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Notify;

use crate::backend::{ArtifactStream, DownloadApi};
use crate::catalog::FormatCatalog;
use crate::error::{Error, Result};
use crate::platform::{self, Platform};
use crate::types::{
    ApiStatus, DownloadJob, DownloadRequest, JobId, JobStatus, MediaFormat, SubmitReceipt,
};

/// Catalog matching the observed backend's `/formats` response
pub(crate) fn sample_catalog() -> FormatCatalog {
    let strings = |items: &[&str]| items.iter().map(|s| s.to_string()).collect();
    FormatCatalog {
        video_qualities: strings(&[
            "144p", "240p", "360p", "480p", "720p", "1080p", "1440p", "2160p", "best",
        ]),
        video_formats: strings(&["mp4", "webm", "mkv"]),
        audio_qualities: strings(&["64k", "128k", "192k", "256k", "320k", "best"]),
        audio_formats: strings(&["mp3", "opus", "m4a"]),
    }
}

/// Minimal job with a fixed creation time
pub(crate) fn job(id: u64, status: JobStatus) -> DownloadJob {
    DownloadJob {
        id: JobId::from(id),
        url: format!("https://youtu.be/{}", id),
        title: None,
        platform: Some(Platform::Youtube),
        format: MediaFormat::Video,
        extension: "mp4".to_string(),
        quality: "best".to_string(),
        status,
        duration: None,
        file_size: None,
        created_at: Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap(),
        completed_at: None,
    }
}

#[derive(Default)]
struct State {
    jobs: Vec<DownloadJob>,
    next_id: u64,
    formats_fail: bool,
    list_fail: bool,
    create_fail_status: Option<u16>,
    list_gates: VecDeque<Arc<Notify>>,
    create_gates: VecDeque<Arc<Notify>>,
    artifacts: HashMap<JobId, (Vec<Bytes>, bool)>,
    requests: Vec<DownloadRequest>,
}

/// Scripted [`DownloadApi`] implementation
#[derive(Default)]
pub(crate) struct FakeApi {
    state: Mutex<State>,
    format_calls: AtomicUsize,
    list_calls: AtomicUsize,
    create_calls: AtomicUsize,
}

impl FakeApi {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn fail_formats(&self) {
        self.state.lock().unwrap().formats_fail = true;
    }

    pub(crate) fn set_list_failing(&self, failing: bool) {
        self.state.lock().unwrap().list_fail = failing;
    }

    pub(crate) fn fail_create_with(&self, status: u16) {
        self.state.lock().unwrap().create_fail_status = Some(status);
    }

    pub(crate) fn set_jobs(&self, jobs: Vec<DownloadJob>) {
        self.state.lock().unwrap().jobs = jobs;
    }

    /// Hold the next list call until the returned gate is notified.
    /// The response is captured when the call starts.
    pub(crate) fn gate_next_list(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.state.lock().unwrap().list_gates.push_back(gate.clone());
        gate
    }

    /// Hold the next create call until the returned gate is notified
    pub(crate) fn gate_next_create(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.state.lock().unwrap().create_gates.push_back(gate.clone());
        gate
    }

    pub(crate) fn set_artifact(&self, id: &JobId, chunks: &[&[u8]]) {
        let chunks = chunks.iter().map(|c| Bytes::copy_from_slice(c)).collect();
        self.state
            .lock()
            .unwrap()
            .artifacts
            .insert(id.clone(), (chunks, false));
    }

    /// Serve `chunks`, then fail the transfer
    pub(crate) fn set_broken_artifact(&self, id: &JobId, chunks: &[&[u8]]) {
        let chunks = chunks.iter().map(|c| Bytes::copy_from_slice(c)).collect();
        self.state
            .lock()
            .unwrap()
            .artifacts
            .insert(id.clone(), (chunks, true));
    }

    pub(crate) fn format_calls(&self) -> usize {
        self.format_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn requests(&self) -> Vec<DownloadRequest> {
        self.state.lock().unwrap().requests.clone()
    }
}

fn fake_http_error(status: u16, endpoint: &str) -> Error {
    Error::Http {
        status,
        endpoint: endpoint.to_string(),
    }
}

#[async_trait]
impl DownloadApi for FakeApi {
    async fn health(&self) -> Result<ApiStatus> {
        Ok(ApiStatus {
            status: "ok".to_string(),
            message: "fake backend".to_string(),
            version: "test".to_string(),
        })
    }

    async fn fetch_formats(&self) -> Result<FormatCatalog> {
        self.format_calls.fetch_add(1, Ordering::SeqCst);
        if self.state.lock().unwrap().formats_fail {
            return Err(fake_http_error(503, "/formats"));
        }
        Ok(sample_catalog())
    }

    async fn list_downloads(&self) -> Result<Vec<DownloadJob>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let (result, gate) = {
            let mut state = self.state.lock().unwrap();
            let result = if state.list_fail {
                Err(fake_http_error(500, "/downloads"))
            } else {
                Ok(state.jobs.clone())
            };
            (result, state.list_gates.pop_front())
        };
        if let Some(gate) = gate {
            gate.notified().await;
        }
        result
    }

    async fn fetch_download(&self, id: &JobId) -> Result<DownloadJob> {
        self.state
            .lock()
            .unwrap()
            .jobs
            .iter()
            .find(|j| &j.id == id)
            .cloned()
            .ok_or_else(|| fake_http_error(404, "/downloads/{id}"))
    }

    async fn create_download(&self, request: &DownloadRequest) -> Result<SubmitReceipt> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.state.lock().unwrap().create_gates.pop_front();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let mut state = self.state.lock().unwrap();
        state.requests.push(request.clone());
        if let Some(status) = state.create_fail_status {
            return Err(fake_http_error(status, "/download"));
        }

        state.next_id += 1;
        let id = JobId::from(state.next_id);
        let platform = platform::detect(&request.url);
        let mut created = job(state.next_id, JobStatus::Processing);
        created.url = request.url.clone();
        created.platform = Some(platform);
        created.format = request.format;
        created.quality = request.quality.clone();
        created.extension = request.extension.clone();
        state.jobs.insert(0, created);

        Ok(SubmitReceipt {
            id,
            platform,
            title: None,
            message: Some("Download started".to_string()),
        })
    }

    fn artifact_url(&self, id: &JobId) -> String {
        format!("http://fake.invalid/api/stream/{}", id)
    }

    async fn open_artifact(&self, id: &JobId) -> Result<ArtifactStream> {
        let (chunks, broken) = self
            .state
            .lock()
            .unwrap()
            .artifacts
            .get(id)
            .cloned()
            .ok_or_else(|| fake_http_error(404, "/stream/{id}"))?;

        let mut items: Vec<Result<Bytes>> = chunks.into_iter().map(Ok).collect();
        if broken {
            items.push(Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "connection reset",
            ))));
        }
        Ok(futures::stream::iter(items).boxed())
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

/// Wait until `condition` holds, panicking after two seconds
pub(crate) async fn eventually(condition: impl Fn() -> bool) {
    tokio::time::timeout(std::time::Duration::from_secs(2), async {
        while !condition() {
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached within 2s");
}
