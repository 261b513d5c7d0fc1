//! Mutual exclusivity between cosmetic-correction methods.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Selectable cosmetic-correction (defect detection) method.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CosmeticMethod {
    /// Let the worker pick detection methods automatically.
    AutoDetect,
    HotPixelMap,
    BadColumnRepair,
    LaCosmic,
    LaCosmicEnhanced,
    MultiAlgorithm,
}

impl CosmeticMethod {
    pub const ALL: [CosmeticMethod; 6] = [
        CosmeticMethod::AutoDetect,
        CosmeticMethod::HotPixelMap,
        CosmeticMethod::BadColumnRepair,
        CosmeticMethod::LaCosmic,
        CosmeticMethod::LaCosmicEnhanced,
        CosmeticMethod::MultiAlgorithm,
    ];
}

impl std::fmt::Display for CosmeticMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AutoDetect => write!(f, "Auto Detect"),
            Self::HotPixelMap => write!(f, "Hot Pixel Map"),
            Self::BadColumnRepair => write!(f, "Bad Column Repair"),
            Self::LaCosmic => write!(f, "L.A.Cosmic"),
            Self::LaCosmicEnhanced => write!(f, "L.A.Cosmic (Enhanced)"),
            Self::MultiAlgorithm => write!(f, "Multi-Algorithm"),
        }
    }
}

/// A set of methods that cannot be enabled together.
#[derive(Clone, Copy, Debug)]
pub enum ConflictGroup {
    /// At most one member may be enabled.
    Exclusive(&'static [CosmeticMethod]),
    /// The leader excludes every follower and vice versa; followers may coexist.
    LeaderExcludes {
        leader: CosmeticMethod,
        followers: &'static [CosmeticMethod],
    },
}

const COSMIC_RAY_DETECTORS: &[CosmeticMethod] = &[
    CosmeticMethod::LaCosmic,
    CosmeticMethod::LaCosmicEnhanced,
    CosmeticMethod::MultiAlgorithm,
];

const MANUAL_METHODS: &[CosmeticMethod] = &[
    CosmeticMethod::HotPixelMap,
    CosmeticMethod::BadColumnRepair,
    CosmeticMethod::LaCosmic,
    CosmeticMethod::LaCosmicEnhanced,
    CosmeticMethod::MultiAlgorithm,
];

/// Declarative conflict table.
pub const CONFLICT_GROUPS: &[ConflictGroup] = &[
    ConflictGroup::Exclusive(COSMIC_RAY_DETECTORS),
    ConflictGroup::LeaderExcludes {
        leader: CosmeticMethod::AutoDetect,
        followers: MANUAL_METHODS,
    },
];

impl ConflictGroup {
    fn conflicts_of(&self, method: CosmeticMethod) -> Vec<CosmeticMethod> {
        match *self {
            ConflictGroup::Exclusive(members) => {
                if members.contains(&method) {
                    members.iter().copied().filter(|m| *m != method).collect()
                } else {
                    Vec::new()
                }
            }
            ConflictGroup::LeaderExcludes { leader, followers } => {
                if method == leader {
                    followers.to_vec()
                } else if followers.contains(&method) {
                    vec![leader]
                } else {
                    Vec::new()
                }
            }
        }
    }
}

/// Methods that must be disabled when `method` is enabled, in table order.
pub fn get_conflicts(method: CosmeticMethod) -> Vec<CosmeticMethod> {
    let mut out: Vec<CosmeticMethod> = Vec::new();
    for group in CONFLICT_GROUPS {
        for m in group.conflicts_of(method) {
            if !out.contains(&m) {
                out.push(m);
            }
        }
    }
    out
}

/// Set of enabled cosmetic methods. Serialized as a list of method names.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MethodSelection {
    enabled: BTreeSet<CosmeticMethod>,
}

impl MethodSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self, method: CosmeticMethod) -> bool {
        self.enabled.contains(&method)
    }

    pub fn enabled(&self) -> impl Iterator<Item = CosmeticMethod> + '_ {
        self.enabled.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.enabled.is_empty()
    }

    /// True when no two enabled methods conflict.
    pub fn is_consistent(&self) -> bool {
        self.enabled
            .iter()
            .all(|m| get_conflicts(*m).iter().all(|c| !self.enabled.contains(c)))
    }
}

/// Return the selection after enabling or disabling `method`.
///
/// Enabling disables every conflicting method in the same step, so the
/// returned selection never holds two conflicting methods.
pub fn toggle(method: CosmeticMethod, enabled: bool, current: &MethodSelection) -> MethodSelection {
    let mut next = current.clone();
    if enabled {
        for conflict in get_conflicts(method) {
            next.enabled.remove(&conflict);
        }
        next.enabled.insert(method);
    } else {
        next.enabled.remove(&method);
    }
    next
}
