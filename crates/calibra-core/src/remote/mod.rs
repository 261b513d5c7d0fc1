//! Collaborator seams for the remote processing worker and object storage.
//!
//! The core only talks to the outside world through the traits in this module.
//! [`HttpClient`] implements all of them over REST; tests substitute scripted
//! doubles.

mod http;
pub mod types;

pub use http::HttpClient;
pub use types::{
    AnalysisRequest, CancelResponse, ConsistencyFrame, JobRequest, OutlierFrame,
    ProgressResponse, RemoteStatus, ResultsFetch, SubmitResponse, UploadAnalysis,
    UploadValidation,
};

/// Error type for remote collaborator calls.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RemoteError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(String),
    /// Failed to parse response
    #[error("Parse error: {0}")]
    Parse(String),
    /// Connection failed
    #[error("Connection error: {0}")]
    Connection(String),
    /// Request timed out
    #[error("Timeout")]
    Timeout,
    /// Server returned an error status
    #[error("Server error (status {status}): {message}")]
    ServerError { status: u16, message: String },
}

/// Remote worker that runs calibration, superdark and cosmetic-correction jobs.
#[allow(async_fn_in_trait)]
pub trait ProcessingApi {
    async fn submit_job(&self, request: &JobRequest) -> Result<SubmitResponse, RemoteError>;

    async fn job_progress(&self, job_id: &str) -> Result<ProgressResponse, RemoteError>;

    async fn cancel_job(&self, job_id: &str) -> Result<CancelResponse, RemoteError>;

    /// `Pending` corresponds to HTTP 202: the result is not materialized yet.
    async fn job_results(&self, job_id: &str) -> Result<ResultsFetch, RemoteError>;
}

/// Object storage holding raw frames and temporary uploads.
#[allow(async_fn_in_trait)]
pub trait ObjectStorage {
    /// Store `bytes` under `path`; returns the object path as stored.
    async fn upload(&self, path: &str, bytes: &[u8]) -> Result<String, RemoteError>;

    async fn delete(&self, path: &str) -> Result<(), RemoteError>;
}

/// Remote analysis of frame metadata and frame quality.
#[allow(async_fn_in_trait)]
pub trait FrameAnalyzer {
    /// Read instrument metadata from an uploaded object and validate it.
    async fn analyze_upload(&self, path: &str) -> Result<UploadAnalysis, RemoteError>;

    async fn detect_outliers(
        &self,
        request: &AnalysisRequest,
    ) -> Result<Vec<OutlierFrame>, RemoteError>;

    async fn score_consistency(
        &self,
        request: &AnalysisRequest,
    ) -> Result<Vec<ConsistencyFrame>, RemoteError>;
}

impl<T: ProcessingApi> ProcessingApi for &T {
    async fn submit_job(&self, request: &JobRequest) -> Result<SubmitResponse, RemoteError> {
        (**self).submit_job(request).await
    }

    async fn job_progress(&self, job_id: &str) -> Result<ProgressResponse, RemoteError> {
        (**self).job_progress(job_id).await
    }

    async fn cancel_job(&self, job_id: &str) -> Result<CancelResponse, RemoteError> {
        (**self).cancel_job(job_id).await
    }

    async fn job_results(&self, job_id: &str) -> Result<ResultsFetch, RemoteError> {
        (**self).job_results(job_id).await
    }
}

impl<T: ObjectStorage> ObjectStorage for &T {
    async fn upload(&self, path: &str, bytes: &[u8]) -> Result<String, RemoteError> {
        (**self).upload(path, bytes).await
    }

    async fn delete(&self, path: &str) -> Result<(), RemoteError> {
        (**self).delete(path).await
    }
}

impl<T: FrameAnalyzer> FrameAnalyzer for &T {
    async fn analyze_upload(&self, path: &str) -> Result<UploadAnalysis, RemoteError> {
        (**self).analyze_upload(path).await
    }

    async fn detect_outliers(
        &self,
        request: &AnalysisRequest,
    ) -> Result<Vec<OutlierFrame>, RemoteError> {
        (**self).detect_outliers(request).await
    }

    async fn score_consistency(
        &self,
        request: &AnalysisRequest,
    ) -> Result<Vec<ConsistencyFrame>, RemoteError> {
        (**self).score_consistency(request).await
    }
}
