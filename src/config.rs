//! Monitor configuration.
//!
//! Every tuning constant of the scoring pipeline lives here rather than in the
//! engines. The defaults reproduce the reference behaviour; pages can override
//! any field by passing a partial JS object to `PrivacyMonitor::new`.

use serde::{Deserialize, Serialize};

use crate::error::{RadarError, Result};

/// Severity and privacy weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub critical: i32,
    pub high: i32,
    pub medium: i32,
    pub low: i32,
    /// Privacy score starting point
    pub privacy_base: i32,
    /// Applied once per detected tracker request, blocked or not
    pub per_tracker: i32,
    pub secure_transport: i32,
    pub insecure_transport: i32,
    /// Applied once per granted permission
    pub per_permission: i32,
    pub high_uniqueness: i32,
    /// Uniqueness strictly above this triggers `high_uniqueness`
    pub uniqueness_threshold: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            critical: 10,
            high: 5,
            medium: 2,
            low: 1,
            privacy_base: 100,
            per_tracker: -5,
            secure_transport: 10,
            insecure_transport: -20,
            per_permission: -5,
            high_uniqueness: -20,
            uniqueness_threshold: 0.8,
        }
    }
}

/// How tracker hostnames are compared against the static list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Host equals the listed domain or is a subdomain of it
    Boundary,
    /// Raw `ends_with`; `evilgoogle-analytics.com` matches `google-analytics.com`
    Suffix,
}

impl Default for MatchMode {
    fn default() -> Self {
        MatchMode::Boundary
    }
}

/// Which protections to install at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtectionConfig {
    pub canvas: bool,
    pub webgl: bool,
    pub audio: bool,
    pub geolocation: bool,
    pub webrtc: bool,
    pub network: bool,
}

impl Default for ProtectionConfig {
    fn default() -> Self {
        // Detection hooks always run; only spoofing starts disabled except
        // for tracker blocking.
        Self {
            canvas: false,
            webgl: false,
            audio: false,
            geolocation: false,
            webrtc: false,
            network: true,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RadarConfig {
    pub weights: ScoringWeights,
    /// Threat buffer capacity
    pub threat_capacity: usize,
    /// Tracker buffer capacity
    pub tracker_capacity: usize,
    /// Pattern detection window
    pub pattern_window_ms: u64,
    /// Risk aggregation window
    pub risk_window_ms: u64,
    /// How many of the latest events the predictor looks at
    pub predictor_lookback: usize,
    /// Refresh cadence of the dashboard loop
    pub refresh_interval_ms: u32,
    /// Demo generator cadence
    pub demo_interval_ms: u32,
    /// Upper bound on each permission query
    pub permission_timeout_ms: u32,
    /// Refresh permission grants every N dashboard ticks
    pub permission_refresh_ticks: u32,
    pub match_mode: MatchMode,
    pub protections: ProtectionConfig,
}

impl Default for RadarConfig {
    fn default() -> Self {
        Self {
            weights: ScoringWeights::default(),
            threat_capacity: 100,
            tracker_capacity: 500,
            pattern_window_ms: 60_000,
            risk_window_ms: 300_000,
            predictor_lookback: 10,
            refresh_interval_ms: 1_000,
            demo_interval_ms: 2_000,
            permission_timeout_ms: 2_000,
            permission_refresh_ticks: 10,
            match_mode: MatchMode::default(),
            protections: ProtectionConfig::default(),
        }
    }
}

impl RadarConfig {
    /// Reject values the engines cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.threat_capacity == 0 {
            return Err(RadarError::Config("threat_capacity must be > 0".into()));
        }
        if self.tracker_capacity == 0 {
            return Err(RadarError::Config("tracker_capacity must be > 0".into()));
        }
        if self.predictor_lookback == 0 {
            return Err(RadarError::Config("predictor_lookback must be > 0".into()));
        }
        if self.refresh_interval_ms == 0 || self.demo_interval_ms == 0 {
            return Err(RadarError::Config("intervals must be > 0".into()));
        }
        if !(0.0..=1.0).contains(&self.weights.uniqueness_threshold) {
            return Err(RadarError::Config(format!(
                "uniqueness_threshold {} outside [0, 1]",
                self.weights.uniqueness_threshold
            )));
        }
        Ok(())
    }

    /// Replace every value `validate` would reject with its default, keeping
    /// the rest of the caller's choices.
    pub fn sanitized(mut self) -> Self {
        let defaults = RadarConfig::default();
        if self.threat_capacity == 0 {
            self.threat_capacity = defaults.threat_capacity;
        }
        if self.tracker_capacity == 0 {
            self.tracker_capacity = defaults.tracker_capacity;
        }
        if self.predictor_lookback == 0 {
            self.predictor_lookback = defaults.predictor_lookback;
        }
        if self.refresh_interval_ms == 0 {
            self.refresh_interval_ms = defaults.refresh_interval_ms;
        }
        if self.demo_interval_ms == 0 {
            self.demo_interval_ms = defaults.demo_interval_ms;
        }
        if !(0.0..=1.0).contains(&self.weights.uniqueness_threshold) {
            self.weights.uniqueness_threshold = defaults.weights.uniqueness_threshold;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(RadarConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_override() {
        let cfg: RadarConfig =
            serde_json::from_str(r#"{"threat_capacity": 10, "weights": {"critical": 20}}"#)
                .unwrap();
        assert_eq!(cfg.threat_capacity, 10);
        assert_eq!(cfg.weights.critical, 20);
        assert_eq!(cfg.weights.high, 5);
        assert_eq!(cfg.risk_window_ms, 300_000);
        assert_eq!(cfg.match_mode, MatchMode::Boundary);
    }

    #[test]
    fn test_match_mode_names() {
        let cfg: RadarConfig = serde_json::from_str(r#"{"match_mode": "suffix"}"#).unwrap();
        assert_eq!(cfg.match_mode, MatchMode::Suffix);
    }

    #[test]
    fn test_rejects_zero_capacity() {
        let cfg = RadarConfig {
            threat_capacity: 0,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(RadarError::Config(_))));
    }

    #[test]
    fn test_sanitized_restores_rejected_values_only() {
        let cfg = RadarConfig {
            threat_capacity: 0,
            refresh_interval_ms: 0,
            demo_interval_ms: 500,
            match_mode: MatchMode::Suffix,
            ..Default::default()
        }
        .sanitized();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.threat_capacity, 100);
        assert_eq!(cfg.refresh_interval_ms, 1_000);
        assert_eq!(cfg.demo_interval_ms, 500);
        assert_eq!(cfg.match_mode, MatchMode::Suffix);
    }
}
