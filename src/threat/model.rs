//! Static reference data describing each threat category.
//!
//! Nothing in the live detection path reads this table. It only supplies the
//! default severity of hook events, the demo generator's category mix and
//! descriptive text for the UI, so it can be swapped without touching logic.

use rand::Rng;
use serde::Serialize;

use super::{Severity, ThreatCategory};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CategoryProfile {
    pub category: ThreatCategory,
    /// Relative frequency on a typical tracking-heavy page
    pub typical_frequency: f64,
    pub typical_severity: Severity,
    pub indicators: &'static [&'static str],
}

/// "`count` events within `window_ms` means `severity`".
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BehavioralThreshold {
    pub name: &'static str,
    pub count: usize,
    pub window_ms: u64,
    pub severity: Severity,
}

const PROFILES: [CategoryProfile; 9] = [
    CategoryProfile {
        category: ThreatCategory::CanvasFingerprint,
        typical_frequency: 0.30,
        typical_severity: Severity::Medium,
        indicators: &["toDataURL", "getImageData", "toBlob"],
    },
    CategoryProfile {
        category: ThreatCategory::WebglFingerprint,
        typical_frequency: 0.20,
        typical_severity: Severity::Medium,
        indicators: &["getParameter", "WEBGL_debug_renderer_info", "readPixels"],
    },
    CategoryProfile {
        category: ThreatCategory::AudioFingerprint,
        typical_frequency: 0.10,
        typical_severity: Severity::Medium,
        indicators: &["OscillatorNode", "getFloatFrequencyData", "OfflineAudioContext"],
    },
    CategoryProfile {
        category: ThreatCategory::GeolocationAccess,
        typical_frequency: 0.05,
        typical_severity: Severity::High,
        indicators: &["getCurrentPosition", "watchPosition"],
    },
    CategoryProfile {
        category: ThreatCategory::TrackerDetected,
        typical_frequency: 0.40,
        typical_severity: Severity::Low,
        indicators: &["third-party request", "tracking pixel", "beacon"],
    },
    CategoryProfile {
        category: ThreatCategory::WebrtcLeak,
        typical_frequency: 0.05,
        typical_severity: Severity::Critical,
        indicators: &["RTCPeerConnection", "createDataChannel", "icecandidate"],
    },
    CategoryProfile {
        category: ThreatCategory::FontFingerprint,
        typical_frequency: 0.10,
        typical_severity: Severity::Medium,
        indicators: &["measureText", "offsetWidth", "document.fonts"],
    },
    CategoryProfile {
        category: ThreatCategory::BatteryProbe,
        typical_frequency: 0.03,
        typical_severity: Severity::Low,
        indicators: &["getBattery"],
    },
    CategoryProfile {
        category: ThreatCategory::DeviceSensor,
        typical_frequency: 0.02,
        typical_severity: Severity::High,
        indicators: &["devicemotion", "deviceorientation", "Accelerometer"],
    },
];

const THRESHOLDS: [BehavioralThreshold; 3] = [
    BehavioralThreshold {
        name: "rapid_fingerprinting",
        count: 5,
        window_ms: 10_000,
        severity: Severity::High,
    },
    BehavioralThreshold {
        name: "persistent_tracking",
        count: 20,
        window_ms: 300_000,
        severity: Severity::Medium,
    },
    BehavioralThreshold {
        name: "location_polling",
        count: 3,
        window_ms: 60_000,
        severity: Severity::Critical,
    },
];

pub struct PredictionModel;

impl PredictionModel {
    pub fn profiles() -> &'static [CategoryProfile] {
        &PROFILES
    }

    pub fn thresholds() -> &'static [BehavioralThreshold] {
        &THRESHOLDS
    }

    pub fn profile(category: ThreatCategory) -> &'static CategoryProfile {
        // PROFILES is declared in ThreatCategory::ALL order
        let index = ThreatCategory::ALL
            .iter()
            .position(|c| *c == category)
            .unwrap_or(0);
        &PROFILES[index]
    }

    pub fn typical_severity(category: ThreatCategory) -> Severity {
        Self::profile(category).typical_severity
    }

    /// Draw a category with probability proportional to its typical frequency.
    pub fn sample_category<R: Rng + ?Sized>(rng: &mut R) -> ThreatCategory {
        let total: f64 = PROFILES.iter().map(|p| p.typical_frequency).sum();
        let mut pick = rng.gen::<f64>() * total;
        for profile in &PROFILES {
            if pick < profile.typical_frequency {
                return profile.category;
            }
            pick -= profile.typical_frequency;
        }
        PROFILES[PROFILES.len() - 1].category
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_profiles_follow_category_order() {
        for (profile, category) in PROFILES.iter().zip(ThreatCategory::ALL) {
            assert_eq!(profile.category, category);
            assert_eq!(PredictionModel::profile(category).category, category);
        }
    }

    #[test]
    fn test_sampling_favours_frequent_categories() {
        let mut rng = StdRng::seed_from_u64(99);
        let mut trackers = 0;
        let mut sensors = 0;
        for _ in 0..5_000 {
            match PredictionModel::sample_category(&mut rng) {
                ThreatCategory::TrackerDetected => trackers += 1,
                ThreatCategory::DeviceSensor => sensors += 1,
                _ => {}
            }
        }
        assert!(trackers > sensors * 5, "trackers={} sensors={}", trackers, sensors);
    }

    #[test]
    fn test_typical_severity() {
        assert_eq!(
            PredictionModel::typical_severity(ThreatCategory::WebrtcLeak),
            Severity::Critical
        );
        assert_eq!(PredictionModel::thresholds().len(), 3);
    }
}
