//! Wire types exchanged with the processing service. Field names are camelCase on the wire.

use serde::{Deserialize, Serialize};

use crate::frame::{FrameMetadata, FrameType};
use crate::job::JobKind;
use crate::review::{AnalysisKind, Classification, FrameAnalysis};

/// Body of a job submission.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRequest {
    pub input_paths: Vec<String>,
    pub output_location: String,
    pub kind: JobKind,
    pub frame_type: FrameType,
    /// Advanced settings, typically the serialized per-frame-type settings.
    pub settings: serde_json::Value,
    /// Free-form per-kind fields, merged into the top level of the body.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub job_id: String,
}

/// Job status as reported by the worker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteStatus {
    Queued,
    Running,
    Success,
    Complete,
    Failed,
    Cancelled,
    #[serde(other)]
    Unknown,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProgressResponse {
    pub status: RemoteStatus,
    #[serde(default)]
    pub progress: f64,
    /// Worker-provided failure message, if any.
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CancelResponse {
    pub status: RemoteStatus,
}

/// Outcome of a single result fetch.
#[derive(Clone, Debug, PartialEq)]
pub enum ResultsFetch {
    /// HTTP 200 with the result payload.
    Ready(serde_json::Value),
    /// HTTP 202: accepted but not yet materialized.
    Pending,
}

/// Response of the temp-file metadata analysis.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadAnalysis {
    #[serde(default)]
    pub metadata: FrameMetadata,
    #[serde(default)]
    pub validation: UploadValidation,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadValidation {
    #[serde(default)]
    pub has_required_metadata: bool,
    #[serde(default)]
    pub missing_fields: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub quality_score: Option<f64>,
}

/// Request body for outlier detection and consistency analysis.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    pub frame_paths: Vec<String>,
    pub frame_type: FrameType,
    pub threshold: f64,
}

/// Per-frame outlier-detection entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OutlierFrame {
    pub path: String,
    #[serde(default)]
    pub score: f64,
    pub classification: Classification,
    #[serde(default)]
    pub reasons: Vec<String>,
}

/// Per-frame consistency-scoring entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsistencyFrame {
    pub path: String,
    #[serde(alias = "score")]
    pub consistency_score: f64,
    pub classification: Classification,
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl From<OutlierFrame> for FrameAnalysis {
    fn from(f: OutlierFrame) -> Self {
        FrameAnalysis {
            path: f.path,
            kind: AnalysisKind::Outlier,
            score: f.score,
            classification: f.classification,
            notes: f.reasons,
        }
    }
}

impl From<ConsistencyFrame> for FrameAnalysis {
    fn from(f: ConsistencyFrame) -> Self {
        FrameAnalysis {
            path: f.path,
            kind: AnalysisKind::Consistency,
            score: f.consistency_score,
            classification: f.classification,
            notes: f.warnings,
        }
    }
}
