//! Per-frame-type configuration as immutable records with pure updates.

use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_CONSISTENCY_THRESHOLD, DEFAULT_OUTLIER_SIGMA};
use crate::frame::FrameType;
use crate::methods::{self, CosmeticMethod, MethodSelection};

/// How the worker combines frames into a master.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StackingMethod {
    Mean,
    #[default]
    Median,
    SigmaClip,
    WinsorizedSigmaClip,
    LinearFitClip,
}

impl std::fmt::Display for StackingMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mean => write!(f, "Mean"),
            Self::Median => write!(f, "Median"),
            Self::SigmaClip => write!(f, "Sigma Clip"),
            Self::WinsorizedSigmaClip => write!(f, "Winsorized Sigma Clip"),
            Self::LinearFitClip => write!(f, "Linear Fit Clip"),
        }
    }
}

/// Settings for one frame type's tab.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrameTypeSettings {
    #[serde(default)]
    pub stacking_method: StackingMethod,
    /// Low rejection bound for the clipping methods.
    #[serde(default = "default_sigma")]
    pub sigma_low: f64,
    /// High rejection bound for the clipping methods.
    #[serde(default = "default_sigma")]
    pub sigma_high: f64,
    #[serde(default)]
    pub cosmetic: MethodSelection,
    #[serde(default = "default_outlier_sigma")]
    pub outlier_sigma: f64,
    #[serde(default = "default_consistency_threshold")]
    pub consistency_threshold: f64,
}

fn default_sigma() -> f64 {
    3.0
}
fn default_outlier_sigma() -> f64 {
    DEFAULT_OUTLIER_SIGMA
}
fn default_consistency_threshold() -> f64 {
    DEFAULT_CONSISTENCY_THRESHOLD
}

impl Default for FrameTypeSettings {
    fn default() -> Self {
        Self {
            stacking_method: StackingMethod::default(),
            sigma_low: default_sigma(),
            sigma_high: default_sigma(),
            cosmetic: MethodSelection::default(),
            outlier_sigma: DEFAULT_OUTLIER_SIGMA,
            consistency_threshold: DEFAULT_CONSISTENCY_THRESHOLD,
        }
    }
}

impl FrameTypeSettings {
    pub fn with_stacking(self, stacking_method: StackingMethod) -> Self {
        Self {
            stacking_method,
            ..self
        }
    }

    /// Enable or disable a cosmetic method, resolving conflicts.
    pub fn with_method(self, method: CosmeticMethod, enabled: bool) -> Self {
        let cosmetic = methods::toggle(method, enabled, &self.cosmetic);
        Self { cosmetic, ..self }
    }
}

/// Settings for all frame types. Updates return a new value.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CalibrationSettings {
    #[serde(default)]
    pub bias: FrameTypeSettings,
    #[serde(default)]
    pub dark: FrameTypeSettings,
    #[serde(default)]
    pub flat: FrameTypeSettings,
}

impl CalibrationSettings {
    pub fn get(&self, frame_type: FrameType) -> &FrameTypeSettings {
        match frame_type {
            FrameType::Bias => &self.bias,
            FrameType::Dark => &self.dark,
            FrameType::Flat => &self.flat,
        }
    }

    /// Return a copy with `frame_type`'s settings replaced by `f(current)`.
    /// Other frame types are untouched.
    pub fn update<F>(&self, frame_type: FrameType, f: F) -> Self
    where
        F: FnOnce(FrameTypeSettings) -> FrameTypeSettings,
    {
        let mut next = self.clone();
        let slot = match frame_type {
            FrameType::Bias => &mut next.bias,
            FrameType::Dark => &mut next.dark,
            FrameType::Flat => &mut next.flat,
        };
        *slot = f(slot.clone());
        next
    }

    /// Replace one frame type's settings wholesale, e.g. from a loaded preset.
    pub fn replace(&self, frame_type: FrameType, settings: FrameTypeSettings) -> Self {
        self.update(frame_type, |_| settings)
    }
}
