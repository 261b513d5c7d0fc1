mod common;

use std::sync::{Arc, Mutex};

use calibra_core::error::CalibraError;
use calibra_core::frame::FrameType;
use calibra_core::progress::{ProgressReporter, WorkflowStage};
use calibra_core::remote::{RemoteError, UploadAnalysis, UploadValidation};
use calibra_core::upload::{
    BatchSummary, DeletionOutcome, UploadFile, UploadLifecycleManager, UploadScope, UploadState,
};

use common::{analysis, dark, fits_bytes, init_tracing, MockAnalyzer, MockStorage};

fn scope() -> UploadScope {
    UploadScope {
        user_id: "user-1".to_string(),
        frame_type: FrameType::Dark,
    }
}

fn fits(name: &str) -> UploadFile {
    UploadFile::new(name, fits_bytes())
}

// ---------------------------------------------------------------------------
// Per-file outcomes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_complete_upload_is_auto_selected() {
    init_tracing();
    let storage = MockStorage::new();
    let analyzer = MockAnalyzer::new();
    analyzer.push_analysis(Ok(analysis("ASI2600MM", 100.0, -10.0, 95.0)));
    let mut uploads = UploadLifecycleManager::new(&storage, &analyzer, scope());

    let state = uploads.process_file(fits("dark 001.fits")).await;
    assert_eq!(state, UploadState::Complete);

    let staged = uploads.staged();
    assert_eq!(staged.len(), 1);
    let path = &staged[0].frame.path;
    assert!(path.starts_with("temp-uploads/user-1/dark/"), "path was {path}");
    assert!(path.ends_with("_dark_001.fits"), "path was {path}");
    assert!(staged[0].frame.is_temporary);
    assert_eq!(staged[0].frame.camera.as_deref(), Some("ASI2600MM"));
    assert!(uploads.selection().contains(path));
    assert_eq!(uploads.records()[0].state, UploadState::Complete);
}

#[tokio::test]
async fn test_local_validation_failure_skips_upload() {
    let storage = MockStorage::new();
    let analyzer = MockAnalyzer::new();
    let mut uploads = UploadLifecycleManager::new(&storage, &analyzer, scope());

    let state = uploads
        .process_file(UploadFile::new("notes.txt", b"hello".to_vec()))
        .await;
    assert_eq!(state, UploadState::Error);
    assert!(storage.uploaded().is_empty());
    assert!(uploads.records()[0].error.is_some());
    assert!(uploads.records()[0].path.is_none());
}

#[tokio::test]
async fn test_upload_failure_is_error() {
    let storage = MockStorage::new();
    storage.fail_uploads(true);
    let analyzer = MockAnalyzer::new();
    let mut uploads = UploadLifecycleManager::new(&storage, &analyzer, scope());

    assert_eq!(uploads.process_file(fits("a.fits")).await, UploadState::Error);
    assert!(storage.deleted().is_empty());
    assert!(uploads.deleted().is_empty());
}

#[tokio::test]
async fn test_low_quality_is_rejected_and_deleted() {
    let storage = MockStorage::new();
    let analyzer = MockAnalyzer::new();
    analyzer.push_analysis(Ok(analysis("ASI2600MM", 100.0, -10.0, 45.0)));
    let mut uploads = UploadLifecycleManager::new(&storage, &analyzer, scope());

    assert_eq!(uploads.process_file(fits("a.fits")).await, UploadState::Error);
    assert!(uploads.staged().is_empty());
    assert!(storage.live().is_empty(), "rejected upload must not stay in storage");
    assert_eq!(uploads.deleted().len(), 1);
    assert_eq!(uploads.deleted()[0].outcome, DeletionOutcome::Deleted);
    assert!(uploads.records()[0]
        .error
        .as_deref()
        .unwrap_or_default()
        .contains("Quality"));
}

#[tokio::test]
async fn test_medium_quality_is_warning_and_not_selected() {
    let storage = MockStorage::new();
    let analyzer = MockAnalyzer::new();
    analyzer.push_analysis(Ok(analysis("ASI2600MM", 100.0, -10.0, 70.0)));
    let mut uploads = UploadLifecycleManager::new(&storage, &analyzer, scope());

    assert_eq!(uploads.process_file(fits("a.fits")).await, UploadState::Warning);
    assert!(uploads.selection().is_empty());

    let path = uploads.staged()[0].frame.path.clone();
    uploads.include(&path).unwrap();
    assert!(uploads.selection().contains(&path));
    assert_eq!(uploads.selected_frames().len(), 1);

    uploads.exclude(&path).unwrap();
    assert!(uploads.selection().is_empty());
}

#[tokio::test]
async fn test_missing_metadata_is_rejected() {
    let storage = MockStorage::new();
    let analyzer = MockAnalyzer::new();
    let mut answer = analysis("ASI2600MM", 100.0, -10.0, 95.0);
    answer.metadata.gain = None;
    answer.validation = UploadValidation {
        has_required_metadata: false,
        missing_fields: vec!["gain".to_string()],
        warnings: Vec::new(),
        quality_score: Some(95.0),
    };
    analyzer.push_analysis(Ok(answer));
    let mut uploads = UploadLifecycleManager::new(&storage, &analyzer, scope());

    assert_eq!(uploads.process_file(fits("a.fits")).await, UploadState::Error);
    let error = uploads.records()[0].error.clone().unwrap_or_default();
    assert!(error.contains("gain"), "error was {error}");
    assert!(storage.live().is_empty());
}

#[tokio::test]
async fn test_analysis_failure_deletes_upload() {
    let storage = MockStorage::new();
    let analyzer = MockAnalyzer::new();
    analyzer.push_analysis(Err(RemoteError::Timeout));
    let mut uploads = UploadLifecycleManager::new(&storage, &analyzer, scope());

    assert_eq!(uploads.process_file(fits("a.fits")).await, UploadState::Error);
    assert_eq!(storage.uploaded().len(), 1);
    assert!(storage.live().is_empty());
}

#[tokio::test]
async fn test_camera_mismatch_with_permanent_frames_is_warning() {
    let storage = MockStorage::new();
    let analyzer = MockAnalyzer::new();
    analyzer.push_analysis(Ok(analysis("ASI294MC", 100.0, -10.0, 95.0)));
    let permanent = vec![
        dark("darks/p1.fits", "ASI2600MM", 100.0, -10.0),
        dark("darks/p2.fits", "ASI2600MM", 100.0, -10.0),
    ];
    let mut uploads =
        UploadLifecycleManager::new(&storage, &analyzer, scope()).with_permanent_frames(permanent);

    assert_eq!(uploads.process_file(fits("a.fits")).await, UploadState::Warning);
    let warnings = &uploads.staged()[0].warnings;
    assert!(
        warnings.iter().any(|w| w.contains("Camera mismatch")),
        "warnings were {warnings:?}"
    );
    assert!(uploads.selection().is_empty());
}

#[tokio::test]
async fn test_temperature_drift_is_warning() {
    let storage = MockStorage::new();
    let analyzer = MockAnalyzer::new();
    analyzer.push_analysis(Ok(analysis("ASI2600MM", 100.0, -7.5, 95.0)));
    let permanent = vec![dark("darks/p1.fits", "ASI2600MM", 100.0, -10.0)];
    let mut uploads =
        UploadLifecycleManager::new(&storage, &analyzer, scope()).with_permanent_frames(permanent);

    assert_eq!(uploads.process_file(fits("a.fits")).await, UploadState::Warning);
}

#[tokio::test]
async fn test_later_uploads_checked_against_staged_frames() {
    let storage = MockStorage::new();
    let analyzer = MockAnalyzer::new();
    analyzer
        .push_analysis(Ok(analysis("ASI2600MM", 100.0, -10.0, 95.0)))
        .push_analysis(Ok(analysis("ASI2600MM", 200.0, -10.0, 95.0)));
    let mut uploads = UploadLifecycleManager::new(&storage, &analyzer, scope());

    let summary = uploads
        .upload_batch(vec![fits("a.fits"), fits("b.fits")])
        .await;
    assert_eq!(
        summary,
        BatchSummary {
            complete: 1,
            warning: 1,
            error: 0
        }
    );
    assert_eq!(uploads.grouping().groups.len(), 2);
}

// ---------------------------------------------------------------------------
// Deletion and cleanup
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_cleanup_removes_every_staged_object() {
    let storage = MockStorage::new();
    let analyzer = MockAnalyzer::new();
    analyzer
        .push_analysis(Ok(analysis("ASI2600MM", 100.0, -10.0, 95.0)))
        .push_analysis(Ok(analysis("ASI2600MM", 100.0, -10.0, 92.0)))
        .push_analysis(Ok(analysis("ASI2600MM", 100.0, -10.0, 70.0)))
        .push_analysis(Ok(analysis("ASI2600MM", 100.0, -10.0, 20.0)));
    let mut uploads = UploadLifecycleManager::new(&storage, &analyzer, scope());

    let summary = uploads
        .upload_batch(vec![
            fits("a.fits"),
            fits("b.fits"),
            fits("c.fits"),
            fits("d.fits"),
            UploadFile::new("e.fits", Vec::new()),
        ])
        .await;
    assert_eq!(summary.complete, 2);
    assert_eq!(summary.warning, 1);
    assert_eq!(summary.error, 2);
    assert_eq!(uploads.selection().len(), 2);

    let report = uploads.cleanup_all().await;
    assert_eq!(report.deleted.len(), 3);
    assert!(report.failed.is_empty());
    assert!(uploads.staged().is_empty());
    assert!(uploads.selection().is_empty());
    assert!(uploads.records().is_empty());
    assert!(storage.live().is_empty(), "orphaned objects: {:?}", storage.live());

    // Every object ever uploaded has a deletion record.
    for path in storage.uploaded() {
        assert!(uploads.deleted().iter().any(|d| d.path == path), "{path} not recorded");
    }
}

#[tokio::test]
async fn test_cleanup_failures_do_not_block() {
    let storage = MockStorage::new();
    let analyzer = MockAnalyzer::new();
    analyzer
        .push_analysis(Ok(analysis("ASI2600MM", 100.0, -10.0, 95.0)))
        .push_analysis(Ok(analysis("ASI2600MM", 100.0, -10.0, 95.0)));
    let mut uploads = UploadLifecycleManager::new(&storage, &analyzer, scope());
    uploads
        .upload_batch(vec![fits("a.fits"), fits("b.fits")])
        .await;

    storage.fail_deletes(true);
    let report = uploads.cleanup_all().await;
    assert!(report.deleted.is_empty());
    assert_eq!(report.failed.len(), 2);
    assert_eq!(uploads.cleanup_warnings().len(), 2);
    assert!(uploads.staged().is_empty());
    assert!(uploads
        .deleted()
        .iter()
        .all(|d| matches!(d.outcome, DeletionOutcome::Failed(_))));
}

#[tokio::test]
async fn test_delete_one_scrubs_local_state() {
    let storage = MockStorage::new();
    let analyzer = MockAnalyzer::new();
    analyzer
        .push_analysis(Ok(analysis("ASI2600MM", 100.0, -10.0, 95.0)))
        .push_analysis(Ok(analysis("ASI2600MM", 100.0, -10.0, 95.0)));
    let mut uploads = UploadLifecycleManager::new(&storage, &analyzer, scope());
    uploads
        .upload_batch(vec![fits("a.fits"), fits("b.fits")])
        .await;

    let path = uploads.staged()[0].frame.path.clone();
    let outcome = uploads.delete_one(&path).await.unwrap();
    assert_eq!(outcome, DeletionOutcome::Deleted);
    assert_eq!(uploads.staged().len(), 1);
    assert!(!uploads.selection().contains(&path));
    assert!(uploads
        .records()
        .iter()
        .all(|r| r.path.as_deref() != Some(path.as_str())));
    assert_eq!(storage.deleted(), vec![path.clone()]);

    assert!(matches!(
        uploads.delete_one(&path).await,
        Err(CalibraError::NotStaged(_))
    ));
}

#[tokio::test]
async fn test_include_unknown_path_is_error() {
    let storage = MockStorage::new();
    let analyzer = MockAnalyzer::new();
    let mut uploads = UploadLifecycleManager::new(&storage, &analyzer, scope());
    assert!(matches!(
        uploads.include("temp-uploads/nope.fits"),
        Err(CalibraError::NotStaged(_))
    ));
}

#[derive(Default)]
struct RecordingReporter {
    events: Mutex<Vec<String>>,
}

impl ProgressReporter for RecordingReporter {
    fn begin_stage(&self, stage: WorkflowStage, total_items: Option<usize>) {
        self.events
            .lock()
            .unwrap()
            .push(format!("begin {stage} {total_items:?}"));
    }

    fn advance(&self, items_done: usize) {
        self.events.lock().unwrap().push(format!("advance {items_done}"));
    }

    fn finish_stage(&self) {
        self.events.lock().unwrap().push("finish".to_string());
    }
}

#[tokio::test]
async fn test_batch_progress_is_reported() {
    let storage = MockStorage::new();
    let analyzer = MockAnalyzer::new();
    analyzer.push_analysis(Ok(analysis("ASI2600MM", 100.0, -10.0, 95.0)));
    let reporter = Arc::new(RecordingReporter::default());
    let mut uploads =
        UploadLifecycleManager::new(&storage, &analyzer, scope()).with_reporter(reporter.clone());

    uploads
        .upload_batch(vec![fits("a.fits"), UploadFile::new("b.txt", b"x".to_vec())])
        .await;

    let events = reporter.events.lock().unwrap().clone();
    assert_eq!(
        events,
        vec![
            "begin Uploading frames Some(2)",
            "advance 1",
            "advance 2",
            "finish"
        ]
    );
}

#[test]
fn test_upload_state_display() {
    assert_eq!(UploadState::Analyzing.to_string(), "Analyzing");
    assert_eq!(UploadState::Warning.to_string(), "Warning");
}

#[test]
fn test_default_analysis_has_no_metadata() {
    let answer = UploadAnalysis::default();
    assert!(!answer.validation.has_required_metadata);
    assert!(answer.metadata.camera.is_none());
}
