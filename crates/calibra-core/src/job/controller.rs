use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::config::JobTimingConfig;
use crate::error::{CalibraError, Result};
use crate::progress::{NoOpReporter, ProgressReporter, WorkflowStage};
use crate::remote::{ProcessingApi, ProgressResponse, RemoteStatus, ResultsFetch};

use super::{CancelToken, Job, JobKind, JobSpec, JobState};

/// What the polling loop should do after a tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PollTick {
    /// Job still queued or running; poll again after the interval.
    Continue,
    /// Job is not active (terminal or never submitted); stop polling.
    Stop(JobState),
}

/// Materialized job results.
#[derive(Clone, Debug, PartialEq)]
pub struct JobResults {
    pub payload: serde_json::Value,
    /// Number of 202 answers received before the payload was ready.
    pub retries: u32,
}

/// State machine driving one remote job from submission to a terminal state.
///
/// Each remote call takes `&mut self`, so poll ticks can never overlap.
pub struct JobController<P: ProcessingApi> {
    api: P,
    timing: JobTimingConfig,
    job: Job,
    reporter: Arc<dyn ProgressReporter>,
    failed_polls: u32,
}

impl<P: ProcessingApi> JobController<P> {
    pub fn new(api: P, kind: JobKind, timing: JobTimingConfig) -> Self {
        Self {
            api,
            timing,
            job: Job::new(kind),
            reporter: Arc::new(NoOpReporter),
            failed_polls: 0,
        }
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn job(&self) -> &Job {
        &self.job
    }

    pub fn state(&self) -> JobState {
        self.job.state
    }

    /// Consecutive poll ticks that failed with a transient error.
    pub fn failed_polls(&self) -> u32 {
        self.failed_polls
    }

    /// Submit the job. On success the job is `Queued` with a server id.
    ///
    /// A failed submit call moves the job straight to `Failed` without an id.
    /// It is not retried.
    pub async fn submit(&mut self, spec: &JobSpec) -> Result<&Job> {
        if self.job.state != JobState::Idle {
            return Err(CalibraError::InvalidTransition {
                state: self.job.state,
                action: "submit",
            });
        }
        let request = spec.to_request()?;
        self.reporter.begin_stage(WorkflowStage::Submitting, None);
        self.job.started_at = Some(Utc::now());

        match self.api.submit_job(&request).await {
            Ok(response) => {
                info!(
                    job_id = %response.job_id,
                    kind = %self.job.kind,
                    inputs = request.input_paths.len(),
                    "Job submitted"
                );
                self.job.id = Some(response.job_id);
                self.job.state = JobState::Queued;
                self.reporter.finish_stage();
                self.reporter
                    .begin_stage(WorkflowStage::Processing, Some(100));
                Ok(&self.job)
            }
            Err(e) => {
                warn!(kind = %self.job.kind, error = %e, "Job submission failed");
                let message = e.to_string();
                self.job.state = JobState::Failed;
                self.job.ended_at = Some(Utc::now());
                self.job.error = Some(message.clone());
                self.reporter.finish_stage();
                Err(CalibraError::SubmitFailed(message))
            }
        }
    }

    /// One polling tick. Transient errors are logged and swallowed.
    ///
    /// Safe to call in any state: inactive jobs return `Stop` without a remote call.
    pub async fn poll(&mut self) -> PollTick {
        if !self.job.state.is_active() {
            return PollTick::Stop(self.job.state);
        }
        let Some(job_id) = self.job.id.clone() else {
            return PollTick::Stop(self.job.state);
        };

        match self.api.job_progress(&job_id).await {
            Ok(response) => {
                self.failed_polls = 0;
                self.apply_progress(&job_id, response)
            }
            Err(e) => {
                self.failed_polls += 1;
                warn!(
                    %job_id,
                    error = %e,
                    failed_polls = self.failed_polls,
                    "Progress poll failed, retrying next tick"
                );
                PollTick::Continue
            }
        }
    }

    fn apply_progress(&mut self, job_id: &str, response: ProgressResponse) -> PollTick {
        // Regressions are ignored: progress never decreases while active.
        let reported = if response.progress.is_finite() {
            response.progress.clamp(0.0, 100.0)
        } else {
            0.0
        };
        if reported < self.job.progress {
            debug!(
                job_id,
                reported,
                current = self.job.progress,
                "Ignoring progress regression"
            );
        } else if reported > self.job.progress {
            self.job.progress = reported;
            self.reporter.advance(reported as usize);
        }

        match response.status {
            RemoteStatus::Queued => PollTick::Continue,
            RemoteStatus::Running => {
                if self.job.state == JobState::Queued {
                    info!(job_id, "Job started running");
                    self.job.state = JobState::Running;
                }
                PollTick::Continue
            }
            RemoteStatus::Success | RemoteStatus::Complete => {
                self.job.progress = 100.0;
                self.reporter.advance(100);
                self.finish(JobState::Success);
                info!(job_id, "Job completed");
                PollTick::Stop(JobState::Success)
            }
            RemoteStatus::Failed => {
                let message = response
                    .error
                    .unwrap_or_else(|| "Worker reported failure".to_string());
                warn!(job_id, error = %message, "Job failed on worker");
                self.job.error = Some(message);
                self.finish(JobState::Failed);
                PollTick::Stop(JobState::Failed)
            }
            RemoteStatus::Cancelled => {
                info!(job_id, "Job cancelled on worker");
                self.finish(JobState::Cancelled);
                PollTick::Stop(JobState::Cancelled)
            }
            RemoteStatus::Unknown => {
                warn!(job_id, "Unrecognized job status, continuing to poll");
                PollTick::Continue
            }
        }
    }

    fn finish(&mut self, state: JobState) {
        self.job.state = state;
        self.job.ended_at = Some(Utc::now());
        self.reporter.finish_stage();
    }

    /// Poll on the configured interval until the job leaves the active states
    /// or `token` is cancelled.
    ///
    /// Returns the state the loop stopped in. A worker-reported failure is
    /// surfaced as [`CalibraError::JobFailed`].
    pub async fn run_to_completion(&mut self, token: &CancelToken) -> Result<JobState> {
        loop {
            if token.is_cancelled() {
                debug!("Polling stopped by cancel token");
                return Ok(self.job.state);
            }
            match self.poll().await {
                PollTick::Stop(JobState::Failed) => {
                    let message = self
                        .job
                        .error
                        .clone()
                        .unwrap_or_else(|| "Worker reported failure".to_string());
                    return Err(CalibraError::JobFailed(message));
                }
                PollTick::Stop(state) => return Ok(state),
                PollTick::Continue => {}
            }
            tokio::select! {
                _ = tokio::time::sleep(self.timing.poll_interval) => {}
                _ = token.cancelled() => {}
            }
        }
    }

    /// Ask the worker to cancel. Only valid while queued or running.
    ///
    /// The job becomes `Cancelled` only after the worker confirms; otherwise
    /// the state is left untouched and the error is returned.
    pub async fn cancel(&mut self) -> Result<&Job> {
        if !self.job.state.is_active() {
            return Err(CalibraError::InvalidTransition {
                state: self.job.state,
                action: "cancel",
            });
        }
        let Some(job_id) = self.job.id.clone() else {
            return Err(CalibraError::InvalidTransition {
                state: self.job.state,
                action: "cancel",
            });
        };

        match self.api.cancel_job(&job_id).await {
            Ok(response) if response.status == RemoteStatus::Cancelled => {
                info!(%job_id, "Job cancelled");
                self.job.id = None;
                self.job.progress = 0.0;
                self.finish(JobState::Cancelled);
                Ok(&self.job)
            }
            Ok(response) => {
                warn!(%job_id, status = ?response.status, "Cancellation not acknowledged");
                Err(CalibraError::CancelFailed(format!(
                    "worker answered with status {:?}",
                    response.status
                )))
            }
            Err(e) => {
                warn!(%job_id, error = %e, "Cancellation request failed");
                Err(CalibraError::CancelFailed(e.to_string()))
            }
        }
    }

    /// Fetch the results of a successful job.
    ///
    /// A 202 answer means the result is not materialized yet; the fetch is
    /// retried after the configured delay until a terminal answer arrives.
    pub async fn fetch_results(&mut self) -> Result<JobResults> {
        if self.job.state != JobState::Success {
            return Err(CalibraError::InvalidTransition {
                state: self.job.state,
                action: "fetch results of",
            });
        }
        let Some(job_id) = self.job.id.clone() else {
            return Err(CalibraError::InvalidTransition {
                state: self.job.state,
                action: "fetch results of",
            });
        };

        self.reporter
            .begin_stage(WorkflowStage::FetchingResults, None);
        let mut retries = 0u32;
        loop {
            match self.api.job_results(&job_id).await {
                Ok(ResultsFetch::Ready(payload)) => {
                    info!(%job_id, retries, "Job results received");
                    self.job.result = Some(payload.clone());
                    self.reporter.finish_stage();
                    return Ok(JobResults { payload, retries });
                }
                Ok(ResultsFetch::Pending) => {
                    retries += 1;
                    debug!(%job_id, retries, "Results not ready yet");
                    self.reporter.advance(retries as usize);
                    tokio::time::sleep(self.timing.result_retry_delay).await;
                }
                Err(e) => {
                    warn!(%job_id, error = %e, "Fetching results failed");
                    self.reporter.finish_stage();
                    return Err(e.into());
                }
            }
        }
    }
}
