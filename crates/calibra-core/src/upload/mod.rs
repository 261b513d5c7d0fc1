//! Temporary upload lifecycle.
//!
//! Files go through `validating → uploading → analyzing → {complete | warning | error}`
//! one at a time. Every object written to temporary storage ends up either in
//! the staged list or in the deletion log; nothing is left orphaned.

mod validate;

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::compat::{self, validate_compatibility_with, CompatibilityCheck, Grouping};
use crate::config::{ClientConfig, CompatibilityTolerances, QualityThresholds};
use crate::consts::TEMP_UPLOAD_PREFIX;
use crate::error::{CalibraError, Result};
use crate::frame::{Frame, FrameType};
use crate::progress::{NoOpReporter, ProgressReporter, WorkflowStage};
use crate::remote::{FrameAnalyzer, ObjectStorage, UploadValidation};

pub use validate::{check_local, sanitize_file_name, FileFormat};

/// A file picked by the user, not yet uploaded.
#[derive(Clone, Debug)]
pub struct UploadFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

/// Per-file upload pipeline state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UploadState {
    Validating,
    Uploading,
    Analyzing,
    /// Accepted and auto-selected.
    Complete,
    /// Accepted but flagged; only selected manually.
    Warning,
    /// Rejected; nothing remains in storage.
    Error,
}

impl std::fmt::Display for UploadState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validating => write!(f, "Validating"),
            Self::Uploading => write!(f, "Uploading"),
            Self::Analyzing => write!(f, "Analyzing"),
            Self::Complete => write!(f, "Complete"),
            Self::Warning => write!(f, "Warning"),
            Self::Error => write!(f, "Error"),
        }
    }
}

/// Progress record for one file of a batch.
#[derive(Clone, Debug, PartialEq)]
pub struct UploadRecord {
    pub file_name: String,
    pub state: UploadState,
    /// Storage path, once uploaded.
    pub path: Option<String>,
    pub warnings: Vec<String>,
    pub error: Option<String>,
    pub quality_score: Option<f64>,
}

/// A temporary frame kept in storage for possible use.
#[derive(Clone, Debug, PartialEq)]
pub struct StagedFrame {
    pub frame: Frame,
    /// `Complete` or `Warning`.
    pub state: UploadState,
    pub warnings: Vec<String>,
    pub quality_score: Option<f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum DeletionOutcome {
    Deleted,
    Failed(String),
}

/// Log entry for every temporary object this manager removed or tried to remove.
#[derive(Clone, Debug, PartialEq)]
pub struct DeletionRecord {
    pub path: String,
    pub outcome: DeletionOutcome,
}

/// Counters for one processed batch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub complete: usize,
    pub warning: usize,
    pub error: usize,
}

/// Result of [`UploadLifecycleManager::cleanup_all`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CleanupReport {
    pub deleted: Vec<String>,
    pub failed: Vec<(String, String)>,
}

/// Owner and frame type of the temporary uploads.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadScope {
    pub user_id: String,
    pub frame_type: FrameType,
}

/// Decision for one analysed file.
struct Verdict {
    state: UploadState,
    warnings: Vec<String>,
    error: Option<String>,
}

/// Manages temporary uploads for one frame type.
pub struct UploadLifecycleManager<S: ObjectStorage, A: FrameAnalyzer> {
    storage: S,
    analyzer: A,
    scope: UploadScope,
    tolerances: CompatibilityTolerances,
    quality: QualityThresholds,
    reporter: Arc<dyn ProgressReporter>,
    /// Previously accepted frames of this scope; read-only here.
    permanent: Vec<Frame>,
    records: Vec<UploadRecord>,
    staged: Vec<StagedFrame>,
    selection: BTreeSet<String>,
    deleted: Vec<DeletionRecord>,
    cleanup_warnings: Vec<String>,
    sequence: u64,
}

impl<S: ObjectStorage, A: FrameAnalyzer> UploadLifecycleManager<S, A> {
    pub fn new(storage: S, analyzer: A, scope: UploadScope) -> Self {
        Self {
            storage,
            analyzer,
            scope,
            tolerances: CompatibilityTolerances::default(),
            quality: QualityThresholds::default(),
            reporter: Arc::new(NoOpReporter),
            permanent: Vec::new(),
            records: Vec::new(),
            staged: Vec::new(),
            selection: BTreeSet::new(),
            deleted: Vec::new(),
            cleanup_warnings: Vec::new(),
            sequence: 0,
        }
    }

    /// Build a manager whose scope and thresholds come from `config`.
    pub fn from_config(storage: S, analyzer: A, frame_type: FrameType, config: &ClientConfig) -> Self {
        let scope = UploadScope {
            user_id: config.user_id.clone(),
            frame_type,
        };
        Self::new(storage, analyzer, scope)
            .with_tolerances(config.tolerances)
            .with_quality(config.quality)
    }

    pub fn with_tolerances(mut self, tolerances: CompatibilityTolerances) -> Self {
        self.tolerances = tolerances;
        self
    }

    pub fn with_quality(mut self, quality: QualityThresholds) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Frames already accepted in this scope; uploads are checked against them.
    pub fn with_permanent_frames(mut self, frames: Vec<Frame>) -> Self {
        self.permanent = frames;
        self
    }

    pub fn scope(&self) -> &UploadScope {
        &self.scope
    }

    pub fn records(&self) -> &[UploadRecord] {
        &self.records
    }

    pub fn staged(&self) -> &[StagedFrame] {
        &self.staged
    }

    pub fn selection(&self) -> &BTreeSet<String> {
        &self.selection
    }

    pub fn deleted(&self) -> &[DeletionRecord] {
        &self.deleted
    }

    pub fn cleanup_warnings(&self) -> &[String] {
        &self.cleanup_warnings
    }

    /// Selected temporary frames, in staging order.
    pub fn selected_frames(&self) -> Vec<Frame> {
        self.staged
            .iter()
            .filter(|s| self.selection.contains(&s.frame.path))
            .map(|s| s.frame.clone())
            .collect()
    }

    /// Permanent plus staged frames, as seen by the compatibility matcher.
    pub fn candidate_frames(&self) -> Vec<Frame> {
        self.permanent
            .iter()
            .cloned()
            .chain(self.staged.iter().map(|s| s.frame.clone()))
            .collect()
    }

    pub fn grouping(&self) -> Grouping {
        compat::group(&self.candidate_frames())
    }

    fn temp_path(&mut self, file_name: &str) -> String {
        self.sequence += 1;
        format!(
            "{}/{}/{}/{}_{}_{}",
            TEMP_UPLOAD_PREFIX,
            sanitize_file_name(&self.scope.user_id),
            self.scope.frame_type.as_str(),
            Utc::now().timestamp_millis(),
            self.sequence,
            sanitize_file_name(file_name)
        )
    }

    fn set_state(&mut self, index: usize, state: UploadState) {
        if let Some(record) = self.records.get_mut(index) {
            debug!(file = %record.file_name, %state, "Upload state");
            record.state = state;
        }
    }

    fn fail(&mut self, index: usize, reason: String) -> UploadState {
        if let Some(record) = self.records.get_mut(index) {
            warn!(file = %record.file_name, %reason, "Upload rejected");
            record.state = UploadState::Error;
            record.error = Some(reason);
        }
        UploadState::Error
    }

    /// Upload and analyse a batch, strictly one file after another.
    pub async fn upload_batch(&mut self, files: Vec<UploadFile>) -> BatchSummary {
        let total = files.len();
        self.reporter
            .begin_stage(WorkflowStage::Uploading, Some(total));
        let mut summary = BatchSummary::default();
        for (i, file) in files.into_iter().enumerate() {
            match self.process_file(file).await {
                UploadState::Complete => summary.complete += 1,
                UploadState::Warning => summary.warning += 1,
                _ => summary.error += 1,
            }
            self.reporter.advance(i + 1);
        }
        self.reporter.finish_stage();
        info!(
            frame_type = %self.scope.frame_type,
            complete = summary.complete,
            warning = summary.warning,
            error = summary.error,
            "Upload batch processed"
        );
        summary
    }

    /// Run the full pipeline for one file and return its final state.
    pub async fn process_file(&mut self, file: UploadFile) -> UploadState {
        let index = self.records.len();
        self.records.push(UploadRecord {
            file_name: file.name.clone(),
            state: UploadState::Validating,
            path: None,
            warnings: Vec::new(),
            error: None,
            quality_score: None,
        });

        if let Err(e) = check_local(&file.name, &file.bytes) {
            return self.fail(index, e.to_string());
        }

        self.set_state(index, UploadState::Uploading);
        let target = self.temp_path(&file.name);
        let path = match self.storage.upload(&target, &file.bytes).await {
            Ok(path) => path,
            Err(e) => return self.fail(index, format!("Upload failed: {e}")),
        };
        self.records[index].path = Some(path.clone());

        self.set_state(index, UploadState::Analyzing);
        let analysis = match self.analyzer.analyze_upload(&path).await {
            Ok(analysis) => analysis,
            Err(e) => {
                self.discard(&path).await;
                return self.fail(index, format!("Metadata analysis failed: {e}"));
            }
        };

        let mut frame = Frame::new(path.clone(), self.scope.frame_type).temporary();
        frame.refresh_metadata(&analysis.metadata);
        let existing = self.candidate_frames();
        let check = validate_compatibility_with(&frame, &existing, &self.tolerances);
        let quality_score = analysis.validation.quality_score;
        self.records[index].quality_score = quality_score;

        let verdict = self.judge(&frame, &analysis.validation, check);
        self.records[index].warnings = verdict.warnings.clone();

        if verdict.state == UploadState::Error {
            self.discard(&path).await;
            let reason = verdict
                .error
                .unwrap_or_else(|| "Rejected by validation".to_string());
            return self.fail(index, reason);
        }

        if verdict.state == UploadState::Complete {
            self.selection.insert(path.clone());
        }
        info!(
            file = %file.name,
            %path,
            state = %verdict.state,
            warnings = verdict.warnings.len(),
            "Upload staged"
        );
        self.staged.push(StagedFrame {
            frame,
            state: verdict.state,
            warnings: verdict.warnings,
            quality_score,
        });
        self.set_state(index, verdict.state);
        verdict.state
    }

    /// Combine remote validation and the local compatibility check.
    ///
    /// Missing metadata and low quality reject; incompatibility and other
    /// warnings only flag the file.
    fn judge(&self, frame: &Frame, validation: &UploadValidation, check: CompatibilityCheck) -> Verdict {
        let mut missing: Vec<String> = validation.missing_fields.clone();
        for field in frame.missing_required_fields() {
            if !missing.iter().any(|m| m == field) {
                missing.push(field.to_string());
            }
        }
        if !validation.has_required_metadata || !missing.is_empty() {
            let detail = if missing.is_empty() {
                "required metadata not found".to_string()
            } else {
                missing.join(", ")
            };
            return Verdict {
                state: UploadState::Error,
                warnings: check.warnings,
                error: Some(format!("Missing required metadata: {detail}")),
            };
        }

        let mut warnings = validation.warnings.clone();
        if let Some(score) = validation.quality_score {
            if score < self.quality.error_below {
                return Verdict {
                    state: UploadState::Error,
                    warnings,
                    error: Some(format!(
                        "Quality score {score:.0} is below the minimum of {:.0}",
                        self.quality.error_below
                    )),
                };
            }
            if score < self.quality.confident_at {
                warnings.push(format!("Low quality score: {score:.0}"));
            }
        }
        warnings.extend(check.warnings);

        let state = if check.is_compatible && warnings.is_empty() {
            UploadState::Complete
        } else {
            UploadState::Warning
        };
        Verdict {
            state,
            warnings,
            error: None,
        }
    }

    /// Delete a temporary object and log the outcome. Failures never propagate.
    async fn discard(&mut self, path: &str) -> DeletionOutcome {
        let outcome = match self.storage.delete(path).await {
            Ok(()) => {
                debug!(path, "Temporary object deleted");
                DeletionOutcome::Deleted
            }
            Err(e) => {
                warn!(path, error = %e, "Failed to delete temporary object");
                let message = e.to_string();
                self.cleanup_warnings
                    .push(format!("Could not delete {path}: {message}"));
                DeletionOutcome::Failed(message)
            }
        };
        self.deleted.push(DeletionRecord {
            path: path.to_string(),
            outcome: outcome.clone(),
        });
        outcome
    }

    /// Manually select a staged frame, including flagged ones.
    pub fn include(&mut self, path: &str) -> Result<()> {
        if !self.staged.iter().any(|s| s.frame.path == path) {
            return Err(CalibraError::NotStaged(path.to_string()));
        }
        self.selection.insert(path.to_string());
        Ok(())
    }

    pub fn exclude(&mut self, path: &str) -> Result<()> {
        if !self.staged.iter().any(|s| s.frame.path == path) {
            return Err(CalibraError::NotStaged(path.to_string()));
        }
        self.selection.remove(path);
        Ok(())
    }

    /// Delete one staged file and scrub it from every local list.
    pub async fn delete_one(&mut self, path: &str) -> Result<DeletionOutcome> {
        let Some(pos) = self.staged.iter().position(|s| s.frame.path == path) else {
            return Err(CalibraError::NotStaged(path.to_string()));
        };
        self.staged.remove(pos);
        self.selection.remove(path);
        self.records
            .retain(|r| r.path.as_deref() != Some(path));
        Ok(self.discard(path).await)
    }

    /// Remove every staged temporary object and clear local state.
    ///
    /// Runs on modal dismissal and after a successful job submission. A failed
    /// delete is logged and reported but does not stop the remaining deletes.
    pub async fn cleanup_all(&mut self) -> CleanupReport {
        let staged = std::mem::take(&mut self.staged);
        self.reporter
            .begin_stage(WorkflowStage::CleaningUp, Some(staged.len()));
        let mut report = CleanupReport::default();
        for (i, item) in staged.into_iter().enumerate() {
            let path = item.frame.path;
            match self.discard(&path).await {
                DeletionOutcome::Deleted => report.deleted.push(path),
                DeletionOutcome::Failed(message) => report.failed.push((path, message)),
            }
            self.reporter.advance(i + 1);
        }
        self.selection.clear();
        self.records.clear();
        self.reporter.finish_stage();
        info!(
            deleted = report.deleted.len(),
            failed = report.failed.len(),
            "Temporary uploads cleaned up"
        );
        report
    }
}
