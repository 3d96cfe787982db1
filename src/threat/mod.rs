//! Threat events and the analysis pipeline built on top of them.
//!
//! ```text
//! hooks ──record──▶ ThreatStore ──▶ PatternAnalyzer ──▶ Prediction
//!                        │      └──▶ NextThreatPredictor
//!                        └─────────▶ RiskScorer
//! ```

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use std::fmt;

use crate::error::{RadarError, Result};

pub mod model;
pub mod patterns;
pub mod predictor;
pub mod risk;
pub mod store;

pub use model::{BehavioralThreshold, CategoryProfile, PredictionModel};
pub use patterns::{Analysis, Pattern, PatternAnalyzer, PatternKind, Prediction};
pub use predictor::{NextThreatPredictor, ThreatForecast};
pub use risk::RiskScorer;
pub use store::ThreatStore;

/// Radar distance band. Events never sit on the center or the rim.
pub const MIN_DISTANCE: f64 = 0.2;
pub const MAX_DISTANCE: f64 = 0.9;

/// Category of privacy-invasive activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreatCategory {
    CanvasFingerprint,
    WebglFingerprint,
    AudioFingerprint,
    GeolocationAccess,
    TrackerDetected,
    WebrtcLeak,
    FontFingerprint,
    BatteryProbe,
    DeviceSensor,
}

impl ThreatCategory {
    pub const ALL: [ThreatCategory; 9] = [
        ThreatCategory::CanvasFingerprint,
        ThreatCategory::WebglFingerprint,
        ThreatCategory::AudioFingerprint,
        ThreatCategory::GeolocationAccess,
        ThreatCategory::TrackerDetected,
        ThreatCategory::WebrtcLeak,
        ThreatCategory::FontFingerprint,
        ThreatCategory::BatteryProbe,
        ThreatCategory::DeviceSensor,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ThreatCategory::CanvasFingerprint => "canvas_fingerprint",
            ThreatCategory::WebglFingerprint => "webgl_fingerprint",
            ThreatCategory::AudioFingerprint => "audio_fingerprint",
            ThreatCategory::GeolocationAccess => "geolocation_access",
            ThreatCategory::TrackerDetected => "tracker_detected",
            ThreatCategory::WebrtcLeak => "webrtc_leak",
            ThreatCategory::FontFingerprint => "font_fingerprint",
            ThreatCategory::BatteryProbe => "battery_probe",
            ThreatCategory::DeviceSensor => "device_sensor",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.as_str() == name)
    }

    /// Human readable name for prediction messages
    pub fn label(&self) -> &'static str {
        match self {
            ThreatCategory::CanvasFingerprint => "canvas fingerprinting",
            ThreatCategory::WebglFingerprint => "WebGL fingerprinting",
            ThreatCategory::AudioFingerprint => "audio fingerprinting",
            ThreatCategory::GeolocationAccess => "geolocation access",
            ThreatCategory::TrackerDetected => "third-party tracking",
            ThreatCategory::WebrtcLeak => "WebRTC IP discovery",
            ThreatCategory::FontFingerprint => "font enumeration",
            ThreatCategory::BatteryProbe => "battery status probing",
            ThreatCategory::DeviceSensor => "device sensor access",
        }
    }
}

impl fmt::Display for ThreatCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered severity scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "low" => Some(Severity::Low),
            "medium" => Some(Severity::Medium),
            "high" => Some(Severity::High),
            "critical" => Some(Severity::Critical),
            _ => None,
        }
    }

    pub fn is_high_or_critical(&self) -> bool {
        *self >= Severity::High
    }
}

/// Category-specific payload of a threat event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ThreatDetail {
    /// `method` is the intercepted API (`toDataURL`, `getImageData`, ...)
    CanvasFingerprint { method: String },
    /// `parameter` is the GL enum passed to `getParameter` (0 when unknown)
    WebglFingerprint { parameter: u32 },
    AudioFingerprint { api: String },
    GeolocationAccess { continuous: bool },
    TrackerDetected { host: String },
    WebrtcLeak { ice_servers: u32 },
    FontFingerprint { probes: u32 },
    BatteryProbe,
    DeviceSensor { sensor: String },
}

impl ThreatDetail {
    /// Minimal detail for a bare `record(category, severity)` call.
    pub fn bare(category: ThreatCategory) -> Self {
        match category {
            ThreatCategory::CanvasFingerprint => ThreatDetail::CanvasFingerprint {
                method: "unknown".into(),
            },
            ThreatCategory::WebglFingerprint => ThreatDetail::WebglFingerprint { parameter: 0 },
            ThreatCategory::AudioFingerprint => ThreatDetail::AudioFingerprint {
                api: "unknown".into(),
            },
            ThreatCategory::GeolocationAccess => {
                ThreatDetail::GeolocationAccess { continuous: false }
            }
            ThreatCategory::TrackerDetected => ThreatDetail::TrackerDetected {
                host: "unknown".into(),
            },
            ThreatCategory::WebrtcLeak => ThreatDetail::WebrtcLeak { ice_servers: 0 },
            ThreatCategory::FontFingerprint => ThreatDetail::FontFingerprint { probes: 0 },
            ThreatCategory::BatteryProbe => ThreatDetail::BatteryProbe,
            ThreatCategory::DeviceSensor => ThreatDetail::DeviceSensor {
                sensor: "unknown".into(),
            },
        }
    }

    pub fn category(&self) -> ThreatCategory {
        match self {
            ThreatDetail::CanvasFingerprint { .. } => ThreatCategory::CanvasFingerprint,
            ThreatDetail::WebglFingerprint { .. } => ThreatCategory::WebglFingerprint,
            ThreatDetail::AudioFingerprint { .. } => ThreatCategory::AudioFingerprint,
            ThreatDetail::GeolocationAccess { .. } => ThreatCategory::GeolocationAccess,
            ThreatDetail::TrackerDetected { .. } => ThreatCategory::TrackerDetected,
            ThreatDetail::WebrtcLeak { .. } => ThreatCategory::WebrtcLeak,
            ThreatDetail::FontFingerprint { .. } => ThreatCategory::FontFingerprint,
            ThreatDetail::BatteryProbe => ThreatCategory::BatteryProbe,
            ThreatDetail::DeviceSensor { .. } => ThreatCategory::DeviceSensor,
        }
    }

    fn validate(&self) -> Result<()> {
        let (field, value) = match self {
            ThreatDetail::CanvasFingerprint { method } => ("method", method),
            ThreatDetail::AudioFingerprint { api } => ("api", api),
            ThreatDetail::TrackerDetected { host } => ("host", host),
            ThreatDetail::DeviceSensor { sensor } => ("sensor", sensor),
            _ => return Ok(()),
        };
        if value.trim().is_empty() {
            return Err(RadarError::InvalidEvent(format!(
                "{}: empty {}",
                self.category(),
                field
            )));
        }
        if field == "host" && value.chars().any(char::is_whitespace) {
            return Err(RadarError::InvalidEvent(format!("tracker host {:?}", value)));
        }
        Ok(())
    }
}

/// A single detected privacy-invasive action.
///
/// Fields are read-only after construction; the radar position in particular
/// must not change between renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThreatEvent {
    category: ThreatCategory,
    detail: ThreatDetail,
    severity: Severity,
    observed_at: u64,
    angle: f64,
    distance: f64,
}

impl ThreatEvent {
    /// Build an event with a random radar position.
    pub fn new<R: Rng + ?Sized>(
        detail: ThreatDetail,
        severity: Severity,
        observed_at: u64,
        rng: &mut R,
    ) -> Result<Self> {
        let angle = rng.gen::<f64>() * TAU;
        let distance = MIN_DISTANCE + rng.gen::<f64>() * (MAX_DISTANCE - MIN_DISTANCE);
        Self::with_position(detail, severity, observed_at, angle, distance)
    }

    /// Build an event at a fixed radar position.
    pub fn with_position(
        detail: ThreatDetail,
        severity: Severity,
        observed_at: u64,
        angle: f64,
        distance: f64,
    ) -> Result<Self> {
        detail.validate()?;
        if !(0.0..TAU).contains(&angle) {
            return Err(RadarError::InvalidEvent(format!("angle {} outside [0, 2π)", angle)));
        }
        if !(MIN_DISTANCE..MAX_DISTANCE).contains(&distance) {
            return Err(RadarError::InvalidEvent(format!(
                "distance {} outside [{}, {})",
                distance, MIN_DISTANCE, MAX_DISTANCE
            )));
        }
        Ok(Self {
            category: detail.category(),
            detail,
            severity,
            observed_at,
            angle,
            distance,
        })
    }

    pub fn category(&self) -> ThreatCategory {
        self.category
    }

    pub fn detail(&self) -> &ThreatDetail {
        &self.detail
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn observed_at(&self) -> u64 {
        self.observed_at
    }

    pub fn angle(&self) -> f64 {
        self.angle
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }
}

/// A request to a listed tracking host, whether or not it was let through.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackerEvent {
    pub url: String,
    pub host: String,
    pub blocked: bool,
    pub observed_at: u64,
}

impl TrackerEvent {
    pub fn new(
        url: impl Into<String>,
        host: impl Into<String>,
        blocked: bool,
        observed_at: u64,
    ) -> Self {
        Self {
            url: url.into(),
            host: host.into(),
            blocked,
            observed_at,
        }
    }

    pub fn blocked(url: impl Into<String>, host: impl Into<String>, observed_at: u64) -> Self {
        Self::new(url, host, true, observed_at)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Event at a fixed, valid radar position.
    pub fn event(category: ThreatCategory, severity: Severity, at: u64) -> ThreatEvent {
        ThreatEvent::with_position(ThreatDetail::bare(category), severity, at, 1.0, 0.5).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_category_names_round_trip() {
        for category in ThreatCategory::ALL {
            assert_eq!(ThreatCategory::parse(category.as_str()), Some(category));
        }
        assert_eq!(ThreatCategory::parse("telepathy"), None);
    }

    #[test]
    fn test_severity_order() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Medium > Severity::Low);
        assert!(Severity::High.is_high_or_critical());
        assert!(!Severity::Medium.is_high_or_critical());
    }

    #[test]
    fn test_random_position_in_band() {
        let mut rng = StdRng::seed_from_u64(7);
        for i in 0..500 {
            let ev = ThreatEvent::new(
                ThreatDetail::bare(ThreatCategory::CanvasFingerprint),
                Severity::Low,
                i,
                &mut rng,
            )
            .unwrap();
            assert!(ev.distance() >= MIN_DISTANCE && ev.distance() < MAX_DISTANCE);
            assert!(ev.angle() >= 0.0 && ev.angle() < TAU);
        }
    }

    #[test]
    fn test_detail_validation() {
        let empty_host = ThreatDetail::TrackerDetected { host: "  ".into() };
        assert!(ThreatEvent::with_position(empty_host, Severity::Low, 0, 0.0, 0.5).is_err());

        let spaced = ThreatDetail::TrackerDetected {
            host: "bad host.com".into(),
        };
        assert!(ThreatEvent::with_position(spaced, Severity::Low, 0, 0.0, 0.5).is_err());

        let out_of_band = ThreatDetail::BatteryProbe;
        assert!(ThreatEvent::with_position(out_of_band, Severity::Low, 0, 0.0, 0.95).is_err());
    }

    #[test]
    fn test_detail_serializes_with_kind_tag() {
        let ev = ThreatEvent::with_position(
            ThreatDetail::TrackerDetected {
                host: "doubleclick.net".into(),
            },
            Severity::Medium,
            5,
            0.5,
            0.3,
        )
        .unwrap();
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["category"], "tracker_detected");
        assert_eq!(json["detail"]["kind"], "tracker_detected");
        assert_eq!(json["detail"]["host"], "doubleclick.net");
        assert_eq!(json["severity"], "medium");
    }
}
