use crate::config::CompatibilityTolerances;
use crate::consts::COMPARISON_EPSILON;
use crate::frame::Frame;

use super::group;

/// Outcome of checking one candidate against an existing frame set.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CompatibilityCheck {
    pub is_compatible: bool,
    pub warnings: Vec<String>,
}

/// Check `candidate` against `existing` with the default tolerances.
pub fn validate_compatibility(candidate: &Frame, existing: &[Frame]) -> CompatibilityCheck {
    validate_compatibility_with(candidate, existing, &CompatibilityTolerances::default())
}

/// Check `candidate` against the first member of the best group of `existing`.
///
/// Camera, binning and gain mismatches block combination. A temperature
/// deviation only produces a warning.
pub fn validate_compatibility_with(
    candidate: &Frame,
    existing: &[Frame],
    tolerances: &CompatibilityTolerances,
) -> CompatibilityCheck {
    let mut warnings = Vec::new();
    let mut is_compatible = true;

    let missing = candidate.missing_required_fields();
    if !missing.is_empty() {
        is_compatible = false;
        warnings.push(format!(
            "Missing required metadata: {}",
            missing.join(", ")
        ));
    }

    let grouping = group(existing);
    let Some(reference) = grouping.best_group().first() else {
        return CompatibilityCheck {
            is_compatible,
            warnings,
        };
    };

    match (&candidate.camera, &reference.camera) {
        (Some(c), Some(r)) if c != r => {
            is_compatible = false;
            warnings.push(format!("Camera mismatch: {c} (expected {r})"));
        }
        (Some(c), None) => {
            is_compatible = false;
            warnings.push(format!("Camera mismatch: {c} (reference camera unknown)"));
        }
        _ => {}
    }

    match (&candidate.binning, &reference.binning) {
        (Some(c), Some(r)) if c != r => {
            is_compatible = false;
            warnings.push(format!("Binning mismatch: {c} (expected {r})"));
        }
        (Some(c), None) => {
            is_compatible = false;
            warnings.push(format!("Binning mismatch: {c} (reference binning unknown)"));
        }
        _ => {}
    }

    match (candidate.gain, reference.gain) {
        (Some(c), Some(r)) if (c - r).abs() > tolerances.gain + COMPARISON_EPSILON => {
            is_compatible = false;
            warnings.push(format!("Gain mismatch: {c} (expected {r})"));
        }
        (Some(c), None) => {
            is_compatible = false;
            warnings.push(format!("Gain mismatch: {c} (reference gain unknown)"));
        }
        _ => {}
    }

    if let (Some(c), Some(r)) = (candidate.temperature_c, reference.temperature_c) {
        let delta = (c - r).abs();
        if delta > tolerances.temperature_c + COMPARISON_EPSILON {
            warnings.push(format!(
                "Temperature differs by {delta:.1}°C: {c:.1}°C (reference {r:.1}°C)"
            ));
        }
    }

    CompatibilityCheck {
        is_compatible,
        warnings,
    }
}
