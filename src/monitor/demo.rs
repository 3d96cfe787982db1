//! Synthetic activity for showcasing the radar without a hostile page.

use rand::seq::SliceRandom;
use rand::Rng;

use super::recorder::Recorder;
use crate::threat::{PredictionModel, ThreatCategory, ThreatDetail};
use crate::trackers::TRACKER_DOMAINS;

const CANVAS_METHODS: &[&str] = &["toDataURL", "getImageData", "toBlob"];
const AUDIO_APIS: &[&str] = &["getFloatFrequencyData", "getByteFrequencyData", "OfflineAudioContext"];
const SENSORS: &[&str] = &["devicemotion", "deviceorientation", "Accelerometer", "Gyroscope"];
const WEBGL_PARAMETERS: &[u32] = &[0x9245, 0x9246, 0x1F00, 0x1F01, 0x0D33];

/// Build a plausible detail for `category`.
pub fn synthetic_detail<R: Rng + ?Sized>(category: ThreatCategory, rng: &mut R) -> ThreatDetail {
    let pick = |items: &[&str], rng: &mut R| -> String {
        items.choose(rng).copied().unwrap_or("unknown").to_string()
    };
    match category {
        ThreatCategory::CanvasFingerprint => ThreatDetail::CanvasFingerprint {
            method: pick(CANVAS_METHODS, rng),
        },
        ThreatCategory::WebglFingerprint => ThreatDetail::WebglFingerprint {
            parameter: WEBGL_PARAMETERS.choose(rng).copied().unwrap_or(0),
        },
        ThreatCategory::AudioFingerprint => ThreatDetail::AudioFingerprint {
            api: pick(AUDIO_APIS, rng),
        },
        ThreatCategory::GeolocationAccess => ThreatDetail::GeolocationAccess {
            continuous: rng.gen_bool(0.3),
        },
        ThreatCategory::TrackerDetected => ThreatDetail::TrackerDetected {
            host: pick(TRACKER_DOMAINS, rng),
        },
        ThreatCategory::WebrtcLeak => ThreatDetail::WebrtcLeak {
            ice_servers: rng.gen_range(0..4),
        },
        ThreatCategory::FontFingerprint => ThreatDetail::FontFingerprint {
            probes: rng.gen_range(20..300),
        },
        ThreatCategory::BatteryProbe => ThreatDetail::BatteryProbe,
        ThreatCategory::DeviceSensor => ThreatDetail::DeviceSensor {
            sensor: pick(SENSORS, rng),
        },
    }
}

/// One generator step: a frequency-weighted threat and, for tracker
/// categories, the matching blocked request.
pub fn demo_tick(recorder: &Recorder) {
    let detail = {
        let mut rng = recorder.rng().borrow_mut();
        let category = PredictionModel::sample_category(&mut *rng);
        synthetic_detail(category, &mut *rng)
    };

    if let ThreatDetail::TrackerDetected { host } = &detail {
        let url = format!("https://{}/collect", host);
        if let Err(e) = recorder.record_tracker(&url, host, true) {
            log::warn!("Demo tracker dropped: {}", e);
        }
    }
    recorder.report(detail);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::recorder::test_support::recorder;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_synthetic_details_are_valid() {
        let mut rng = StdRng::seed_from_u64(3);
        for category in ThreatCategory::ALL {
            let detail = synthetic_detail(category, &mut rng);
            assert_eq!(detail.category(), category);
            assert!(crate::threat::ThreatEvent::with_position(
                detail,
                crate::threat::Severity::Low,
                0,
                0.0,
                0.5
            )
            .is_ok());
        }
    }

    #[test]
    fn test_demo_tick_records() {
        let recorder = recorder();
        for _ in 0..50 {
            demo_tick(&recorder);
        }
        let store = recorder.store().borrow();
        assert_eq!(store.len(), 50);
        let tracker_threats = store
            .all()
            .filter(|e| e.category() == ThreatCategory::TrackerDetected)
            .count() as u64;
        assert_eq!(store.trackers_blocked(), tracker_threats);
        assert_eq!(store.trackers_detected(), tracker_threats);
    }
}
