#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use calibra_core::config::JobTimingConfig;
use calibra_core::frame::{Frame, FrameMetadata, FrameType};
use calibra_core::remote::{
    AnalysisRequest, CancelResponse, ConsistencyFrame, FrameAnalyzer, JobRequest, ObjectStorage,
    OutlierFrame, ProcessingApi, ProgressResponse, RemoteError, RemoteStatus, ResultsFetch,
    SubmitResponse, UploadAnalysis, UploadValidation,
};

/// Route `tracing` output to the test harness. Set `RUST_LOG` to see it.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Timing with no waits, so polling and retry loops run instantly.
pub fn instant_timing() -> JobTimingConfig {
    JobTimingConfig {
        poll_interval: Duration::ZERO,
        result_retry_delay: Duration::ZERO,
    }
}

fn unscripted(call: &str) -> RemoteError {
    RemoteError::Connection(format!("unscripted call: {call}"))
}

// ---------------------------------------------------------------------------
// Processing worker
// ---------------------------------------------------------------------------

/// Scripted processing worker. Each call pops the next scripted answer.
#[derive(Default)]
pub struct MockProcessing {
    submits: Mutex<VecDeque<Result<SubmitResponse, RemoteError>>>,
    progress: Mutex<VecDeque<Result<ProgressResponse, RemoteError>>>,
    cancels: Mutex<VecDeque<Result<CancelResponse, RemoteError>>>,
    results: Mutex<VecDeque<Result<ResultsFetch, RemoteError>>>,
    calls: Mutex<Vec<String>>,
    requests: Mutex<Vec<JobRequest>>,
}

impl MockProcessing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accept_submit(&self, job_id: &str) -> &Self {
        self.submits.lock().unwrap().push_back(Ok(SubmitResponse {
            job_id: job_id.to_string(),
        }));
        self
    }

    pub fn reject_submit(&self, error: RemoteError) -> &Self {
        self.submits.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn push_progress(&self, status: RemoteStatus, progress: f64) -> &Self {
        self.progress.lock().unwrap().push_back(Ok(ProgressResponse {
            status,
            progress,
            error: None,
        }));
        self
    }

    pub fn push_failure(&self, message: &str) -> &Self {
        self.progress.lock().unwrap().push_back(Ok(ProgressResponse {
            status: RemoteStatus::Failed,
            progress: 0.0,
            error: Some(message.to_string()),
        }));
        self
    }

    pub fn push_progress_error(&self, error: RemoteError) -> &Self {
        self.progress.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn push_cancel(&self, answer: Result<RemoteStatus, RemoteError>) -> &Self {
        self.cancels
            .lock()
            .unwrap()
            .push_back(answer.map(|status| CancelResponse { status }));
        self
    }

    pub fn push_results(&self, answer: Result<ResultsFetch, RemoteError>) -> &Self {
        self.results.lock().unwrap().push_back(answer);
        self
    }

    /// Calls made so far, e.g. `submit`, `progress:job-1`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count_calls(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    pub fn requests(&self) -> Vec<JobRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

impl ProcessingApi for MockProcessing {
    async fn submit_job(&self, request: &JobRequest) -> Result<SubmitResponse, RemoteError> {
        self.record("submit".to_string());
        self.requests.lock().unwrap().push(request.clone());
        self.submits
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(unscripted("submit")))
    }

    async fn job_progress(&self, job_id: &str) -> Result<ProgressResponse, RemoteError> {
        self.record(format!("progress:{job_id}"));
        self.progress
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(unscripted("progress")))
    }

    async fn cancel_job(&self, job_id: &str) -> Result<CancelResponse, RemoteError> {
        self.record(format!("cancel:{job_id}"));
        self.cancels
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(unscripted("cancel")))
    }

    async fn job_results(&self, job_id: &str) -> Result<ResultsFetch, RemoteError> {
        self.record(format!("results:{job_id}"));
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(unscripted("results")))
    }
}

// ---------------------------------------------------------------------------
// Object storage
// ---------------------------------------------------------------------------

/// In-memory object storage that remembers every upload and delete.
#[derive(Default)]
pub struct MockStorage {
    uploaded: Mutex<Vec<String>>,
    deleted: Mutex<Vec<String>>,
    fail_uploads: AtomicBool,
    fail_deletes: AtomicBool,
}

impl MockStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub fn uploaded(&self) -> Vec<String> {
        self.uploaded.lock().unwrap().clone()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }

    /// Objects uploaded and not deleted.
    pub fn live(&self) -> Vec<String> {
        let deleted = self.deleted();
        self.uploaded()
            .into_iter()
            .filter(|p| !deleted.contains(p))
            .collect()
    }
}

impl ObjectStorage for MockStorage {
    async fn upload(&self, path: &str, _bytes: &[u8]) -> Result<String, RemoteError> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(RemoteError::ServerError {
                status: 503,
                message: "storage unavailable".into(),
            });
        }
        self.uploaded.lock().unwrap().push(path.to_string());
        Ok(path.to_string())
    }

    async fn delete(&self, path: &str) -> Result<(), RemoteError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(RemoteError::Timeout);
        }
        self.deleted.lock().unwrap().push(path.to_string());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Frame analyzer
// ---------------------------------------------------------------------------

/// Scripted metadata and frame-quality analysis.
#[derive(Default)]
pub struct MockAnalyzer {
    analyses: Mutex<VecDeque<Result<UploadAnalysis, RemoteError>>>,
    outliers: Mutex<VecDeque<Result<Vec<OutlierFrame>, RemoteError>>>,
    consistency: Mutex<VecDeque<Result<Vec<ConsistencyFrame>, RemoteError>>>,
    requests: Mutex<Vec<AnalysisRequest>>,
}

impl MockAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_analysis(&self, analysis: Result<UploadAnalysis, RemoteError>) -> &Self {
        self.analyses.lock().unwrap().push_back(analysis);
        self
    }

    pub fn push_outliers(&self, frames: Vec<OutlierFrame>) -> &Self {
        self.outliers.lock().unwrap().push_back(Ok(frames));
        self
    }

    pub fn push_consistency(&self, frames: Vec<ConsistencyFrame>) -> &Self {
        self.consistency.lock().unwrap().push_back(Ok(frames));
        self
    }

    pub fn requests(&self) -> Vec<AnalysisRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl FrameAnalyzer for MockAnalyzer {
    async fn analyze_upload(&self, _path: &str) -> Result<UploadAnalysis, RemoteError> {
        self.analyses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(unscripted("analyze")))
    }

    async fn detect_outliers(
        &self,
        request: &AnalysisRequest,
    ) -> Result<Vec<OutlierFrame>, RemoteError> {
        self.requests.lock().unwrap().push(request.clone());
        self.outliers
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(unscripted("outliers")))
    }

    async fn score_consistency(
        &self,
        request: &AnalysisRequest,
    ) -> Result<Vec<ConsistencyFrame>, RemoteError> {
        self.requests.lock().unwrap().push(request.clone());
        self.consistency
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(unscripted("consistency")))
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Minimal FITS primary header block.
pub fn fits_bytes() -> Vec<u8> {
    let mut header = b"SIMPLE  =                    T".to_vec();
    header.resize(2880, b' ');
    header
}

/// Analysis answer with complete metadata and the given quality score.
pub fn analysis(camera: &str, gain: f64, temperature: f64, quality: f64) -> UploadAnalysis {
    UploadAnalysis {
        metadata: FrameMetadata {
            camera: Some(camera.to_string()),
            binning: Some("1x1".to_string()),
            gain: Some(gain),
            temperature_c: Some(temperature),
            exposure_seconds: Some(300.0),
        },
        validation: UploadValidation {
            has_required_metadata: true,
            missing_fields: Vec::new(),
            warnings: Vec::new(),
            quality_score: Some(quality),
        },
    }
}

pub fn dark(path: &str, camera: &str, gain: f64, temperature: f64) -> Frame {
    Frame::new(path, FrameType::Dark)
        .with_camera(camera)
        .with_binning("1x1")
        .with_gain(gain)
        .with_temperature(temperature)
        .with_exposure(300.0)
}
