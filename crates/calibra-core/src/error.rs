use thiserror::Error;

use crate::frame::FrameType;
use crate::job::JobState;
use crate::remote::RemoteError;

#[derive(Error, Debug)]
pub enum CalibraError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Remote call failed: {0}")]
    Remote(#[from] RemoteError),

    #[error("Job submission failed: {0}")]
    SubmitFailed(String),

    #[error("Job failed: {0}")]
    JobFailed(String),

    #[error("Cancellation was not confirmed: {0}")]
    CancelFailed(String),

    #[error("Cannot {action} a job in state {state}")]
    InvalidTransition {
        state: JobState,
        action: &'static str,
    },

    #[error("Invalid file: {0}")]
    InvalidFile(String),

    #[error("No frames selected")]
    EmptySelection,

    #[error("File {0} is not staged")]
    NotStaged(String),

    #[error("Preset '{name}' not found for {frame_type} frames")]
    PresetNotFound { frame_type: FrameType, name: String },

    #[error("Preset encoding error: {0}")]
    PresetEncode(String),

    #[error("Preset decoding error: {0}")]
    PresetDecode(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, CalibraError>;
