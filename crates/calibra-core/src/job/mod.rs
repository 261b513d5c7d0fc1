//! Remote job lifecycle.

mod cancel;
mod controller;
mod spec;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use cancel::CancelToken;
pub use controller::{JobController, JobResults, PollTick};
pub use spec::JobSpec;

/// Kind of long-running remote operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobKind {
    /// Build master calibration frames for a project.
    Calibration,
    /// Build a reusable master dark from frames of possibly several projects.
    Superdark,
    /// Apply cosmetic correction (hot pixels, cosmic rays) to frames.
    CosmeticCorrection,
}

impl std::fmt::Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Calibration => write!(f, "Calibration"),
            Self::Superdark => write!(f, "Superdark"),
            Self::CosmeticCorrection => write!(f, "Cosmetic Correction"),
        }
    }
}

/// Lifecycle state of a job.
///
/// `Idle` is pre-submission only. `Success`, `Failed` and `Cancelled` are final.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    #[default]
    Idle,
    Queued,
    Running,
    Success,
    Failed,
    Cancelled,
}

impl JobState {
    /// Queued or running: polling continues and cancellation is allowed.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Queued | Self::Running)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Failed | Self::Cancelled)
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Queued => write!(f, "Queued"),
            Self::Running => write!(f, "Running"),
            Self::Success => write!(f, "Success"),
            Self::Failed => write!(f, "Failed"),
            Self::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// Snapshot of one remote job.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Server-issued id; absent before submission and after a confirmed cancel.
    pub id: Option<String>,
    pub kind: JobKind,
    pub state: JobState,
    /// Percent complete, 0-100. Never decreases while the job is active.
    pub progress: f64,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    /// Populated only once the job succeeded and results were fetched.
    pub result: Option<serde_json::Value>,
    /// Human-readable message for failed jobs.
    pub error: Option<String>,
}

impl Job {
    pub fn new(kind: JobKind) -> Self {
        Self {
            id: None,
            kind,
            state: JobState::Idle,
            progress: 0.0,
            started_at: None,
            ended_at: None,
            result: None,
            error: None,
        }
    }
}
