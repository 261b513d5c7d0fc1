use serde::Serialize;

use crate::error::{CalibraError, Result};
use crate::frame::FrameType;
use crate::remote::JobRequest;

use super::JobKind;

/// Everything needed to submit one job.
#[derive(Clone, Debug, PartialEq)]
pub struct JobSpec {
    pub kind: JobKind,
    pub frame_type: FrameType,
    /// Storage paths of the selected frames, in submission order.
    pub input_paths: Vec<String>,
    pub output_location: String,
    pub settings: serde_json::Value,
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl JobSpec {
    pub fn new(
        kind: JobKind,
        frame_type: FrameType,
        input_paths: impl IntoIterator<Item = String>,
        output_location: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            frame_type,
            input_paths: input_paths.into_iter().collect(),
            output_location: output_location.into(),
            settings: serde_json::Value::Object(serde_json::Map::new()),
            extra: serde_json::Map::new(),
        }
    }

    /// Attach advanced settings, serialized to JSON.
    pub fn with_settings<S: Serialize>(mut self, settings: &S) -> Result<Self> {
        self.settings = serde_json::to_value(settings)
            .map_err(|e| CalibraError::Config(format!("unserializable settings: {e}")))?;
        Ok(self)
    }

    /// Add a free-form per-kind field (e.g. `projectIds` for superdarks).
    pub fn with_field(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Build the submission body.
    pub fn to_request(&self) -> Result<JobRequest> {
        if self.input_paths.is_empty() {
            return Err(CalibraError::EmptySelection);
        }
        Ok(JobRequest {
            input_paths: self.input_paths.clone(),
            output_location: self.output_location.clone(),
            kind: self.kind,
            frame_type: self.frame_type,
            settings: self.settings.clone(),
            extra: self.extra.clone(),
        })
    }
}
