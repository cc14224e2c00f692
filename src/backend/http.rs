//! reqwest implementation of [`DownloadApi`]

use async_trait::async_trait;
use futures::StreamExt;
use serde::de::DeserializeOwned;

use super::{ArtifactStream, DownloadApi};
use crate::catalog::FormatCatalog;
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::types::{ApiStatus, DownloadJob, DownloadRequest, JobId, SubmitReceipt};

/// HTTP client for the download backend
#[derive(Clone, Debug)]
pub struct HttpApi {
    client: reqwest::Client,
    config: ClientConfig,
    root_url: String,
}

impl HttpApi {
    /// Build a client from a validated config
    pub fn new(config: &ClientConfig) -> Result<Self> {
        config.validate()?;

        let root_url = url::Url::parse(&config.api_base_url)
            .and_then(|base| base.join("/"))
            .map_err(|e| Error::Config {
                message: format!("cannot derive backend root from api_base_url: {}", e),
                key: Some("api_base_url".to_string()),
            })?;

        let client = reqwest::Client::builder()
            .connect_timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            config: config.clone(),
            root_url: root_url.to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        self.config.endpoint(path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self
            .client
            .get(self.url(path))
            .timeout(self.config.request_timeout)
            .send()
            .await?;
        let response = check_status(response, path)?;
        Ok(response.json::<T>().await?)
    }
}

/// Map a non-2xx response to [`Error::Http`]; the body is not parsed
fn check_status(response: reqwest::Response, endpoint: &str) -> Result<reqwest::Response> {
    let status = response.status();
    if !status.is_success() {
        tracing::debug!(endpoint, status = status.as_u16(), "backend returned error status");
        return Err(Error::Http {
            status: status.as_u16(),
            endpoint: endpoint.to_string(),
        });
    }
    Ok(response)
}

#[async_trait]
impl DownloadApi for HttpApi {
    async fn health(&self) -> Result<ApiStatus> {
        let response = self
            .client
            .get(&self.root_url)
            .timeout(self.config.request_timeout)
            .send()
            .await?;
        let response = check_status(response, "/")?;
        Ok(response.json::<ApiStatus>().await?)
    }

    async fn fetch_formats(&self) -> Result<FormatCatalog> {
        self.get_json("/formats").await
    }

    async fn list_downloads(&self) -> Result<Vec<DownloadJob>> {
        // An empty history is sent as `null`.
        let jobs: Option<Vec<DownloadJob>> = self.get_json("/downloads").await?;
        Ok(jobs.unwrap_or_default())
    }

    async fn fetch_download(&self, id: &JobId) -> Result<DownloadJob> {
        self.get_json(&format!("/downloads/{}", id)).await
    }

    async fn create_download(&self, request: &DownloadRequest) -> Result<SubmitReceipt> {
        let response = self
            .client
            .post(self.url("/download"))
            .json(request)
            .timeout(self.config.request_timeout)
            .send()
            .await?;
        let response = check_status(response, "/download")?;
        Ok(response.json::<SubmitReceipt>().await?)
    }

    fn artifact_url(&self, id: &JobId) -> String {
        self.url(&format!("/{}/{}", self.config.artifact_route.segment(), id))
    }

    async fn open_artifact(&self, id: &JobId) -> Result<ArtifactStream> {
        // No request timeout: transcoded streams can run for a long time.
        let endpoint = format!("/{}/{}", self.config.artifact_route.segment(), id);
        let response = self.client.get(self.url(&endpoint)).send().await?;
        let response = check_status(response, &endpoint)?;

        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map_err(Error::from))
            .boxed())
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
