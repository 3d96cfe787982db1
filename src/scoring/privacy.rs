//! Composite privacy score.
//!
//! The fingerprint uniqueness input is a placeholder: a djb2 hash of the
//! snapshot folded into [0, 1). It is stable for identical snapshots but
//! says nothing about how rare the fingerprint actually is.

use serde::Serialize;

use super::permissions::PermissionSnapshot;
use crate::config::ScoringWeights;

pub const MAX_PRIVACY: i64 = 100;

/// Everything the privacy score is computed from.
#[derive(Debug, Clone, Serialize)]
pub struct PrivacyInputs {
    pub tracker_count: u64,
    pub secure_transport: bool,
    pub permissions: PermissionSnapshot,
    pub uniqueness: f64,
}

/// One contribution to the score, for the breakdown view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrivacyFactor {
    pub name: &'static str,
    pub delta: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrivacyScore {
    pub score: u32,
    pub factors: Vec<PrivacyFactor>,
    pub uniqueness: f64,
}

impl PrivacyScore {
    /// Zeroed score shown in fallback mode
    pub fn zeroed() -> Self {
        Self {
            score: 0,
            factors: Vec::new(),
            uniqueness: 0.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PrivacyScoreEngine {
    weights: ScoringWeights,
}

impl PrivacyScoreEngine {
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    pub fn compute(&self, inputs: &PrivacyInputs) -> PrivacyScore {
        let w = &self.weights;
        let trackers = i64::try_from(inputs.tracker_count).unwrap_or(i64::MAX);

        let factors = vec![
            PrivacyFactor {
                name: "trackers",
                delta: trackers.saturating_mul(i64::from(w.per_tracker)),
            },
            PrivacyFactor {
                name: "transport",
                delta: i64::from(if inputs.secure_transport {
                    w.secure_transport
                } else {
                    w.insecure_transport
                }),
            },
            PrivacyFactor {
                name: "permissions",
                delta: inputs.permissions.granted_count() as i64 * i64::from(w.per_permission),
            },
            PrivacyFactor {
                name: "fingerprint",
                delta: if inputs.uniqueness > w.uniqueness_threshold {
                    i64::from(w.high_uniqueness)
                } else {
                    0
                },
            },
        ];

        let total = factors
            .iter()
            .fold(i64::from(w.privacy_base), |acc, f| acc.saturating_add(f.delta));

        PrivacyScore {
            score: total.clamp(0, MAX_PRIVACY) as u32,
            factors,
            uniqueness: inputs.uniqueness,
        }
    }
}

/// djb2 over UTF-16 code units with 32-bit wrapping, matching what the page
/// computes with `charCodeAt`.
pub fn djb2(input: &str) -> i32 {
    input.encode_utf16().fold(5381i32, |h, unit| {
        h.wrapping_mul(33).wrapping_add(i32::from(unit))
    })
}

/// Fold a canonical fingerprint serialization into [0, 1).
pub fn calculate_uniqueness(serialized: &str) -> f64 {
    f64::from(djb2(serialized).unsigned_abs() % 10_000) / 10_000.0
}
