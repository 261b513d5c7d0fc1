//! Frame review: server analysis merged with user inclusion overrides.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::Result;
use crate::frame::FrameType;
use crate::remote::{AnalysisRequest, FrameAnalyzer};

/// Server-side classification of a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    // Consistency scoring
    Recommended,
    Questionable,
    Rejected,
    // Outlier detection
    Good,
    Outlier,
}

impl Classification {
    /// Whether the server would include a frame with this classification.
    pub fn included_by_default(self) -> bool {
        matches!(self, Self::Recommended | Self::Good)
    }
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Recommended => write!(f, "Recommended"),
            Self::Questionable => write!(f, "Questionable"),
            Self::Rejected => write!(f, "Rejected"),
            Self::Good => write!(f, "Good"),
            Self::Outlier => write!(f, "Outlier"),
        }
    }
}

/// Which remote analysis produced a result.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnalysisKind {
    Outlier,
    Consistency,
}

/// Per-frame analysis result. Immutable once received.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrameAnalysis {
    pub path: String,
    pub kind: AnalysisKind,
    /// Consistency or quality score; higher sorts first.
    pub score: f64,
    pub classification: Classification,
    /// Warnings (consistency) or reasons (outliers).
    pub notes: Vec<String>,
}

/// One row of the review table.
#[derive(Clone, Debug, PartialEq)]
pub struct ReviewRow<'a> {
    pub analysis: &'a FrameAnalysis,
    pub included: bool,
    pub overridden: bool,
}

/// Holds the latest analysis and the user's explicit inclusion decisions.
#[derive(Clone, Debug, Default)]
pub struct FrameReviewSession {
    /// Default selection before any analysis arrives (usually the best compatibility group).
    seed: Vec<String>,
    results: Vec<FrameAnalysis>,
    overrides: BTreeMap<String, bool>,
}

impl FrameReviewSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a session whose default selection is `paths`.
    pub fn seeded(paths: impl IntoIterator<Item = String>) -> Self {
        Self {
            seed: paths.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Replace the current result set wholesale. Overrides are kept.
    pub fn apply_result(&mut self, results: Vec<FrameAnalysis>) {
        info!(
            frames = results.len(),
            overrides = self.overrides.len(),
            "Applying frame analysis"
        );
        self.results = results;
    }

    /// Clear every override, then apply `results`.
    pub fn rerun_from_scratch(&mut self, results: Vec<FrameAnalysis>) {
        self.reset();
        self.apply_result(results);
    }

    pub fn set_override(&mut self, path: impl Into<String>, include: bool) {
        let path = path.into();
        debug!(%path, include, "Inclusion override");
        self.overrides.insert(path, include);
    }

    /// Drop a single explicit decision so the server classification applies again.
    pub fn clear_override(&mut self, path: &str) -> Option<bool> {
        self.overrides.remove(path)
    }

    /// Clear all overrides. Only called on an explicit user request.
    pub fn reset(&mut self) {
        self.overrides.clear();
    }

    pub fn results(&self) -> &[FrameAnalysis] {
        &self.results
    }

    pub fn overrides(&self) -> &BTreeMap<String, bool> {
        &self.overrides
    }

    pub fn has_results(&self) -> bool {
        !self.results.is_empty()
    }

    /// Final set of frames to use.
    ///
    /// The universe is the analysed frames once results exist, otherwise the
    /// seed. Overrides for paths outside the universe are kept but ignored.
    pub fn effective_selection(&self) -> BTreeSet<String> {
        if self.results.is_empty() {
            return self
                .seed
                .iter()
                .filter(|p| self.overrides.get(*p).copied().unwrap_or(true))
                .cloned()
                .collect();
        }
        self.results
            .iter()
            .filter(|r| self.is_included(r))
            .map(|r| r.path.clone())
            .collect()
    }

    fn is_included(&self, analysis: &FrameAnalysis) -> bool {
        self.overrides
            .get(&analysis.path)
            .copied()
            .unwrap_or_else(|| analysis.classification.included_by_default())
    }

    /// Rows ordered by descending score; equal scores keep arrival order.
    pub fn sorted_rows(&self) -> Vec<ReviewRow<'_>> {
        let mut rows: Vec<ReviewRow<'_>> = self
            .results
            .iter()
            .map(|analysis| ReviewRow {
                analysis,
                included: self.is_included(analysis),
                overridden: self.overrides.contains_key(&analysis.path),
            })
            .collect();
        // sort_by is stable, so ties keep arrival order.
        rows.sort_by(|a, b| b.analysis.score.total_cmp(&a.analysis.score));
        rows
    }

    /// Number of frames per server classification.
    pub fn classification_counts(&self) -> BTreeMap<Classification, usize> {
        let mut counts = BTreeMap::new();
        for r in &self.results {
            *counts.entry(r.classification).or_insert(0) += 1;
        }
        counts
    }
}

/// Run remote outlier detection over `paths`.
pub async fn run_outlier_detection<A: FrameAnalyzer>(
    analyzer: &A,
    frame_type: FrameType,
    paths: Vec<String>,
    sigma_threshold: f64,
) -> Result<Vec<FrameAnalysis>> {
    let request = AnalysisRequest {
        frame_paths: paths,
        frame_type,
        threshold: sigma_threshold,
    };
    let frames = analyzer.detect_outliers(&request).await?;
    Ok(frames.into_iter().map(FrameAnalysis::from).collect())
}

/// Run remote consistency scoring over `paths`.
pub async fn run_consistency_analysis<A: FrameAnalyzer>(
    analyzer: &A,
    frame_type: FrameType,
    paths: Vec<String>,
    min_score: f64,
) -> Result<Vec<FrameAnalysis>> {
    let request = AnalysisRequest {
        frame_paths: paths,
        frame_type,
        threshold: min_score,
    };
    let frames = analyzer.score_consistency(&request).await?;
    Ok(frames.into_iter().map(FrameAnalysis::from).collect())
}
