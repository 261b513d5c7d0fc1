use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::consts::{
    DEFAULT_POLL_INTERVAL, DEFAULT_RESULT_RETRY_DELAY, GAIN_TOLERANCE, QUALITY_CONFIDENT_THRESHOLD,
    QUALITY_ERROR_THRESHOLD, TEMPERATURE_TOLERANCE_C,
};
use crate::error::{CalibraError, Result};

/// Connection and behaviour settings for the orchestration core.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the processing service, e.g. `https://calib.example.org/api`.
    pub base_url: String,
    /// Owner of temporary uploads; becomes part of every temp storage path.
    pub user_id: String,
    #[serde(default)]
    pub jobs: JobTimingConfig,
    #[serde(default)]
    pub tolerances: CompatibilityTolerances,
    #[serde(default)]
    pub quality: QualityThresholds,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            user_id: user_id.into(),
            jobs: JobTimingConfig::default(),
            tolerances: CompatibilityTolerances::default(),
            quality: QualityThresholds::default(),
        }
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s).map_err(|e| CalibraError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| CalibraError::Config(e.to_string()))
    }

    fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(CalibraError::Config("base_url must not be empty".into()));
        }
        if self.user_id.trim().is_empty() {
            return Err(CalibraError::Config("user_id must not be empty".into()));
        }
        if self.quality.error_below > self.quality.confident_at {
            return Err(CalibraError::Config(format!(
                "quality.error_below ({}) exceeds quality.confident_at ({})",
                self.quality.error_below, self.quality.confident_at
            )));
        }
        Ok(())
    }
}

/// Cadence of the job polling loop and the result retry loop.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JobTimingConfig {
    #[serde(with = "humantime_serde", default = "default_poll_interval")]
    pub poll_interval: Duration,
    #[serde(with = "humantime_serde", default = "default_result_retry_delay")]
    pub result_retry_delay: Duration,
}

fn default_poll_interval() -> Duration {
    DEFAULT_POLL_INTERVAL
}
fn default_result_retry_delay() -> Duration {
    DEFAULT_RESULT_RETRY_DELAY
}

impl Default for JobTimingConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            result_retry_delay: DEFAULT_RESULT_RETRY_DELAY,
        }
    }
}

/// Allowed deviation between a candidate frame and the reference frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompatibilityTolerances {
    /// Absolute gain difference (blocking).
    #[serde(default = "default_gain_tolerance")]
    pub gain: f64,
    /// Temperature difference in °C (warning only).
    #[serde(default = "default_temperature_tolerance")]
    pub temperature_c: f64,
}

fn default_gain_tolerance() -> f64 {
    GAIN_TOLERANCE
}
fn default_temperature_tolerance() -> f64 {
    TEMPERATURE_TOLERANCE_C
}

impl Default for CompatibilityTolerances {
    fn default() -> Self {
        Self {
            gain: GAIN_TOLERANCE,
            temperature_c: TEMPERATURE_TOLERANCE_C,
        }
    }
}

/// Quality score bands applied to remote validation of uploads.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct QualityThresholds {
    /// Scores below this reject the file.
    #[serde(default = "default_error_below")]
    pub error_below: f64,
    /// Scores below this (but not rejected) flag the file with a warning.
    #[serde(default = "default_confident_at")]
    pub confident_at: f64,
}

fn default_error_below() -> f64 {
    QUALITY_ERROR_THRESHOLD
}
fn default_confident_at() -> f64 {
    QUALITY_CONFIDENT_THRESHOLD
}

impl Default for QualityThresholds {
    fn default() -> Self {
        Self {
            error_below: QUALITY_ERROR_THRESHOLD,
            confident_at: QUALITY_CONFIDENT_THRESHOLD,
        }
    }
}
