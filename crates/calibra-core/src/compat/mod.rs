//! Frame compatibility matching.
//!
//! Frames can only be combined into a master when they were taken with the
//! same camera, binning and gain at (nearly) the same sensor temperature.
//! Everything in this module is pure: no I/O, inputs are never mutated.

mod validate;

use std::collections::BTreeMap;

use crate::consts::UNKNOWN_TOKEN;
use crate::frame::Frame;

pub use validate::{validate_compatibility, validate_compatibility_with, CompatibilityCheck};

/// Key identifying a compatibility group: `camera|binning|gain|round(temperature)`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupKey(String);

impl GroupKey {
    pub fn for_frame(frame: &Frame) -> Self {
        let camera = frame.camera.as_deref().unwrap_or(UNKNOWN_TOKEN);
        let binning = frame.binning.as_deref().unwrap_or(UNKNOWN_TOKEN);
        let gain = frame
            .gain
            .map(|g| g.to_string())
            .unwrap_or_else(|| UNKNOWN_TOKEN.to_string());
        // Rounding to an integer avoids a "-0" key for temperatures in (-0.5, 0).
        let temperature = frame
            .temperature_c
            .map(|t| (t.round() as i64).to_string())
            .unwrap_or_else(|| UNKNOWN_TOKEN.to_string());
        Self(format!("{camera}|{binning}|{gain}|{temperature}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for GroupKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of grouping a frame list.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Grouping {
    /// Groups ordered by key. Members keep their input order.
    pub groups: BTreeMap<GroupKey, Vec<Frame>>,
    /// Key of the largest group, if any frames were given.
    pub best_key: Option<GroupKey>,
}

impl Grouping {
    /// Members of the largest group; empty when no frames were grouped.
    pub fn best_group(&self) -> &[Frame] {
        self.best_key
            .as_ref()
            .and_then(|k| self.groups.get(k))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn best_paths(&self) -> Vec<String> {
        self.best_group().iter().map(|f| f.path.clone()).collect()
    }

    /// Frames outside the best group, in key order.
    pub fn excluded(&self) -> Vec<&Frame> {
        self.groups
            .iter()
            .filter(|(k, _)| Some(*k) != self.best_key.as_ref())
            .flat_map(|(_, frames)| frames.iter())
            .collect()
    }
}

/// Group frames by compatibility key and pick the largest group.
///
/// Ties between equally sized groups go to the lexicographically smallest key,
/// so the result never depends on input order beyond member ordering.
pub fn group(frames: &[Frame]) -> Grouping {
    let mut groups: BTreeMap<GroupKey, Vec<Frame>> = BTreeMap::new();
    for frame in frames {
        groups
            .entry(GroupKey::for_frame(frame))
            .or_default()
            .push(frame.clone());
    }

    let mut best_key: Option<&GroupKey> = None;
    let mut best_len = 0;
    for (key, members) in &groups {
        // Strictly greater: the first (smallest) key wins ties.
        if members.len() > best_len {
            best_len = members.len();
            best_key = Some(key);
        }
    }
    let best_key = best_key.cloned();

    Grouping { groups, best_key }
}
