use serde::{Deserialize, Deserializer, Serialize};

use crate::consts::UNKNOWN_TOKEN;

/// Kind of calibration frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameType {
    /// Bias frames - readout noise calibration
    Bias,
    /// Dark frames - thermal noise calibration
    Dark,
    /// Flat frames - vignetting and dust correction
    Flat,
}

impl FrameType {
    pub const ALL: [FrameType; 3] = [FrameType::Bias, FrameType::Dark, FrameType::Flat];

    /// Lowercase name used in storage paths and request bodies.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bias => "bias",
            Self::Dark => "dark",
            Self::Flat => "flat",
        }
    }
}

impl std::fmt::Display for FrameType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bias => write!(f, "Bias"),
            Self::Dark => write!(f, "Dark"),
            Self::Flat => write!(f, "Flat"),
        }
    }
}

/// A single calibration source file with its acquisition metadata.
///
/// Identity is `path`. Optional fields are metadata the instrument did not
/// record (reported as `"unknown"` by the metadata store).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    /// Storage key, unique within a project/frame-type/user scope.
    pub path: String,
    pub frame_type: FrameType,
    #[serde(default, deserialize_with = "lenient_string")]
    pub camera: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub binning: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub gain: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub temperature_c: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub exposure_seconds: Option<f64>,
    #[serde(default)]
    pub is_temporary: bool,
}

impl Frame {
    pub fn new(path: impl Into<String>, frame_type: FrameType) -> Self {
        Self {
            path: path.into(),
            frame_type,
            camera: None,
            binning: None,
            gain: None,
            temperature_c: None,
            exposure_seconds: None,
            is_temporary: false,
        }
    }

    pub fn with_camera(mut self, camera: impl Into<String>) -> Self {
        self.camera = Some(camera.into());
        self
    }

    pub fn with_binning(mut self, binning: impl Into<String>) -> Self {
        self.binning = Some(binning.into());
        self
    }

    pub fn with_gain(mut self, gain: f64) -> Self {
        self.gain = Some(gain);
        self
    }

    pub fn with_temperature(mut self, temperature_c: f64) -> Self {
        self.temperature_c = Some(temperature_c);
        self
    }

    pub fn with_exposure(mut self, seconds: f64) -> Self {
        self.exposure_seconds = Some(seconds);
        self
    }

    pub fn temporary(mut self) -> Self {
        self.is_temporary = true;
        self
    }

    /// Names of the fields required for combination that this frame lacks.
    pub fn missing_required_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.camera.is_none() {
            missing.push("camera");
        }
        if self.binning.is_none() {
            missing.push("binning");
        }
        if self.gain.is_none() {
            missing.push("gain");
        }
        missing
    }

    /// Replace acquisition metadata with a fresh reading. Identity is untouched.
    pub fn refresh_metadata(&mut self, metadata: &FrameMetadata) {
        self.camera = metadata.camera.clone();
        self.binning = metadata.binning.clone();
        self.gain = metadata.gain;
        self.temperature_c = metadata.temperature_c;
        self.exposure_seconds = metadata.exposure_seconds;
    }
}

/// Per-file instrument metadata as reported by the metadata analysis service.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameMetadata {
    #[serde(default, deserialize_with = "lenient_string")]
    pub camera: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub binning: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub gain: Option<f64>,
    #[serde(default, alias = "temperature", deserialize_with = "lenient_number")]
    pub temperature_c: Option<f64>,
    #[serde(default, alias = "exposure", deserialize_with = "lenient_number")]
    pub exposure_seconds: Option<f64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(f64),
    Text(String),
}

/// Accept a number, a numeric string, `"unknown"` or null.
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<NumberOrText>::deserialize(deserializer)?;
    Ok(match value {
        Some(NumberOrText::Number(n)) if n.is_finite() => Some(n),
        Some(NumberOrText::Text(s)) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    })
}

/// Treat empty strings and `"unknown"` as absent.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.and_then(|s| {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(UNKNOWN_TOKEN) {
            None
        } else {
            Some(trimmed.to_string())
        }
    }))
}
