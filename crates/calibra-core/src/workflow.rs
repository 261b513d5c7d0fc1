//! Glue between the components: selection → job spec → submission → cleanup.

use tracing::info;

use crate::compat::Grouping;
use crate::error::{CalibraError, Result};
use crate::frame::FrameType;
use crate::job::{JobController, JobKind, JobSpec};
use crate::remote::{FrameAnalyzer, ObjectStorage, ProcessingApi};
use crate::review::FrameReviewSession;
use crate::settings::FrameTypeSettings;
use crate::upload::{CleanupReport, UploadLifecycleManager};

/// Start a review session whose default selection is the best compatibility group.
pub fn seed_review(grouping: &Grouping) -> FrameReviewSession {
    FrameReviewSession::seeded(grouping.best_paths())
}

/// Build the job specification for a selection of frames.
///
/// The selection must be non-empty and the cosmetic method selection must
/// hold no conflicting pair.
pub fn assemble_job_spec(
    kind: JobKind,
    frame_type: FrameType,
    selection: impl IntoIterator<Item = String>,
    output_location: impl Into<String>,
    settings: &FrameTypeSettings,
) -> Result<JobSpec> {
    let spec = JobSpec::new(kind, frame_type, selection, output_location);
    if spec.input_paths.is_empty() {
        return Err(CalibraError::EmptySelection);
    }
    if !settings.cosmetic.is_consistent() {
        return Err(CalibraError::Config(
            "conflicting cosmetic correction methods enabled".into(),
        ));
    }
    spec.with_settings(settings)
}

/// Submit `spec` and, once the worker accepted it, remove every temporary upload.
///
/// Temporary uploads are kept when the submission fails so the user can retry.
pub async fn submit_and_cleanup<P, S, A>(
    controller: &mut JobController<P>,
    uploads: &mut UploadLifecycleManager<S, A>,
    spec: &JobSpec,
) -> Result<CleanupReport>
where
    P: ProcessingApi,
    S: ObjectStorage,
    A: FrameAnalyzer,
{
    let job_id = controller.submit(spec).await?.id.clone();
    let report = uploads.cleanup_all().await;
    info!(
        job_id = job_id.as_deref().unwrap_or_default(),
        removed = report.deleted.len(),
        "Submitted job and released temporary uploads"
    );
    Ok(report)
}
