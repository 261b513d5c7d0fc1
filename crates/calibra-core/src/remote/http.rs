use reqwest::StatusCode;
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use super::types::{
    AnalysisRequest, CancelResponse, ConsistencyFrame, JobRequest, OutlierFrame, ProgressResponse,
    ResultsFetch, SubmitResponse, UploadAnalysis,
};
use crate::config::ClientConfig;

use super::{FrameAnalyzer, ObjectStorage, ProcessingApi, RemoteError};

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RemoteError::Timeout
        } else if err.is_connect() {
            RemoteError::Connection(err.to_string())
        } else if err.is_decode() {
            RemoteError::Parse(err.to_string())
        } else {
            RemoteError::Http(err.to_string())
        }
    }
}

/// REST client for the processing service and its object storage.
#[derive(Debug, Clone)]
pub struct HttpClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpClient {
    pub fn new(base_url: &str) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    /// Client for the service named by `config.base_url`.
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(&config.base_url)
    }

    pub fn with_client(base_url: &str, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for an API route. `route` must start with `/`.
    pub fn url(&self, route: &str) -> String {
        format!("{}{}", self.base_url, route)
    }

    /// URL of a storage object. Leading slashes on the object path are ignored.
    pub fn storage_url(&self, object_path: &str) -> String {
        self.url(&format!("/storage/{}", object_path.trim_start_matches('/')))
    }

    async fn get<T: DeserializeOwned>(&self, route: &str) -> Result<T, RemoteError> {
        let response = self.client.get(self.url(route)).send().await?;
        let response = error_for_status(response).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| RemoteError::Parse(e.to_string()))
    }

    async fn post<T: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        route: &str,
        body: &T,
    ) -> Result<R, RemoteError> {
        let response = self.client.post(self.url(route)).json(body).send().await?;
        let response = error_for_status(response).await?;
        response
            .json::<R>()
            .await
            .map_err(|e| RemoteError::Parse(e.to_string()))
    }
}

async fn error_for_status(response: reqwest::Response) -> Result<reqwest::Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(RemoteError::ServerError {
        status: status.as_u16(),
        message,
    })
}

impl ProcessingApi for HttpClient {
    async fn submit_job(&self, request: &JobRequest) -> Result<SubmitResponse, RemoteError> {
        debug!(kind = %request.kind, inputs = request.input_paths.len(), "POST /jobs");
        self.post("/jobs", request).await
    }

    async fn job_progress(&self, job_id: &str) -> Result<ProgressResponse, RemoteError> {
        self.get(&format!("/jobs/{job_id}/progress")).await
    }

    async fn cancel_job(&self, job_id: &str) -> Result<CancelResponse, RemoteError> {
        self.post(&format!("/jobs/{job_id}/cancel"), &serde_json::json!({}))
            .await
    }

    async fn job_results(&self, job_id: &str) -> Result<ResultsFetch, RemoteError> {
        let response = self
            .client
            .get(self.url(&format!("/jobs/{job_id}/results")))
            .send()
            .await?;
        if response.status() == StatusCode::ACCEPTED {
            return Ok(ResultsFetch::Pending);
        }
        let response = error_for_status(response).await?;
        let payload = response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| RemoteError::Parse(e.to_string()))?;
        Ok(ResultsFetch::Ready(payload))
    }
}

impl ObjectStorage for HttpClient {
    async fn upload(&self, path: &str, bytes: &[u8]) -> Result<String, RemoteError> {
        debug!(path, size = bytes.len(), "PUT storage object");
        let response = self
            .client
            .put(self.storage_url(path))
            .body(bytes.to_vec())
            .send()
            .await?;
        error_for_status(response).await?;
        Ok(path.to_string())
    }

    async fn delete(&self, path: &str) -> Result<(), RemoteError> {
        debug!(path, "DELETE storage object");
        let response = self.client.delete(self.storage_url(path)).send().await?;
        error_for_status(response).await?;
        Ok(())
    }
}

impl FrameAnalyzer for HttpClient {
    async fn analyze_upload(&self, path: &str) -> Result<UploadAnalysis, RemoteError> {
        self.post("/frames/analyze", &serde_json::json!({ "path": path }))
            .await
    }

    async fn detect_outliers(
        &self,
        request: &AnalysisRequest,
    ) -> Result<Vec<OutlierFrame>, RemoteError> {
        self.post("/frames/outliers", request).await
    }

    async fn score_consistency(
        &self,
        request: &AnalysisRequest,
    ) -> Result<Vec<ConsistencyFrame>, RemoteError> {
        self.post("/frames/consistency", request).await
    }
}
