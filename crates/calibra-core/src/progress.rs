/// Workflow stage, used for progress reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkflowStage {
    Uploading,
    Submitting,
    Processing,
    FetchingResults,
    CleaningUp,
}

impl std::fmt::Display for WorkflowStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uploading => write!(f, "Uploading frames"),
            Self::Submitting => write!(f, "Submitting job"),
            Self::Processing => write!(f, "Processing on worker"),
            Self::FetchingResults => write!(f, "Fetching results"),
            Self::CleaningUp => write!(f, "Cleaning up temporary files"),
        }
    }
}

/// Progress reporting for uploads and remote jobs.
///
/// Implementors can use this to drive progress bars, logging, or any other
/// UI feedback. All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    /// A new stage has started. `total_items` is the number of work items in
    /// this stage (file count, or 100 for percentage-driven stages), if known.
    fn begin_stage(&self, _stage: WorkflowStage, _total_items: Option<usize>) {}

    /// Work within the current stage has advanced to `items_done`.
    fn advance(&self, _items_done: usize) {}

    /// The current stage is finished.
    fn finish_stage(&self) {}
}

/// No-op progress reporter, used when callers do not observe progress.
pub struct NoOpReporter;
impl ProgressReporter for NoOpReporter {}
