//! Scoring engines and the dashboard snapshot they produce.

use rand::Rng;
use serde::Serialize;

use super::recorder::Recorder;
use crate::config::RadarConfig;
use crate::error::Result;
use crate::scoring::{
    PermissionSnapshot, PrivacyInputs, PrivacyScore, PrivacyScoreEngine, QuantumScore,
    QuantumScoreEngine,
};
use crate::threat::{
    NextThreatPredictor, Prediction, RiskScorer, ThreatCategory, ThreatForecast,
};

/// Everything derived from the store on each refresh.
#[derive(Debug, Clone)]
pub struct Engines {
    pub risk: RiskScorer,
    pub predictor: NextThreatPredictor,
    pub privacy: PrivacyScoreEngine,
    pub quantum: QuantumScoreEngine,
}

impl Engines {
    pub fn new<R: Rng + ?Sized>(config: &RadarConfig, rng: &mut R) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            risk: RiskScorer::new(config.risk_window_ms, config.weights.clone()),
            predictor: NextThreatPredictor::new(config.predictor_lookback),
            privacy: PrivacyScoreEngine::new(config.weights.clone()),
            quantum: QuantumScoreEngine::new(rng),
        })
    }

    /// Privacy score alone. Every detected tracker counts, blocked or not.
    pub fn privacy_score(&self, tracker_count: u64, env: &EnvironmentSignals) -> PrivacyScore {
        self.privacy.compute(&PrivacyInputs {
            tracker_count,
            secure_transport: env.secure_transport,
            permissions: env.permissions.clone(),
            uniqueness: env.uniqueness,
        })
    }
}

/// Browser-derived inputs to the privacy score, refreshed out of band.
#[derive(Debug, Clone, Default)]
pub struct EnvironmentSignals {
    pub secure_transport: bool,
    pub permissions: PermissionSnapshot,
    pub uniqueness: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MonitorMode {
    Live,
    Demo,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCount {
    pub category: ThreatCategory,
    pub count: usize,
}

/// One refresh worth of renderer data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub mode: MonitorMode,
    pub risk: u32,
    pub privacy: PrivacyScore,
    pub quantum: QuantumScore,
    pub next_threat: Option<ThreatForecast>,
    pub predictions: Vec<Prediction>,
    pub threat_count: usize,
    /// Tracker requests detected, blocked or not
    pub tracker_count: u64,
    pub trackers_blocked: u64,
    pub category_counts: Vec<CategoryCount>,
    pub generated_at: u64,
}

impl Dashboard {
    pub fn compute(
        engines: &Engines,
        recorder: &Recorder,
        env: &EnvironmentSignals,
        mode: MonitorMode,
    ) -> Self {
        let now = recorder.now_ms();

        let (risk, next_threat, threat_count, tracker_count, trackers_blocked, category_counts) = {
            let store = recorder.store().borrow();
            let category_counts = ThreatCategory::ALL
                .iter()
                .map(|&category| CategoryCount {
                    category,
                    count: store.all().filter(|e| e.category() == category).count(),
                })
                .collect::<Vec<_>>();
            (
                engines.risk.score(&store, now),
                engines.predictor.predict(&store),
                store.len(),
                store.trackers_detected(),
                store.trackers_blocked(),
                category_counts,
            )
        };

        let privacy = engines.privacy_score(tracker_count, env);
        let quantum = engines.quantum.score(&mut *recorder.rng().borrow_mut());

        Self {
            mode,
            risk,
            privacy,
            quantum,
            next_threat,
            predictions: recorder.predictions(),
            threat_count,
            tracker_count,
            trackers_blocked,
            category_counts,
            generated_at: now,
        }
    }

    /// Zeroed scores with live counts. Recording keeps working in fallback.
    pub fn fallback(recorder: &Recorder) -> Self {
        let store = recorder.store().borrow();
        Self {
            mode: MonitorMode::Fallback,
            risk: 0,
            privacy: PrivacyScore::zeroed(),
            quantum: QuantumScore::zeroed(),
            next_threat: None,
            predictions: Vec::new(),
            threat_count: store.len(),
            tracker_count: store.trackers_detected(),
            trackers_blocked: store.trackers_blocked(),
            category_counts: Vec::new(),
            generated_at: recorder.now_ms(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::recorder::test_support::recorder;
    use crate::threat::{Severity, ThreatDetail};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn engines() -> Engines {
        Engines::new(&RadarConfig::default(), &mut StdRng::seed_from_u64(1)).unwrap()
    }

    #[test]
    fn test_invalid_config_fails_engine_init() {
        let config = RadarConfig {
            threat_capacity: 0,
            ..RadarConfig::default()
        };
        assert!(Engines::new(&config, &mut StdRng::seed_from_u64(1)).is_err());
    }

    #[test]
    fn test_empty_dashboard() {
        let recorder = recorder();
        let env = EnvironmentSignals {
            secure_transport: true,
            ..EnvironmentSignals::default()
        };
        let dashboard = Dashboard::compute(&engines(), &recorder, &env, MonitorMode::Live);
        assert_eq!(dashboard.risk, 0);
        assert_eq!(dashboard.privacy.score, 100);
        assert!(dashboard.next_threat.is_none());
        assert_eq!(dashboard.category_counts.len(), 9);
        assert!(dashboard.quantum.score <= 100);
    }

    #[test]
    fn test_dashboard_reflects_store() {
        let recorder = recorder();
        let canvas = || ThreatDetail::CanvasFingerprint {
            method: "getImageData".into(),
        };
        for _ in 0..4 {
            recorder.record(canvas(), Severity::High).unwrap();
        }
        recorder
            .record_tracker("https://doubleclick.net/", "doubleclick.net", true)
            .unwrap();

        let dashboard = Dashboard::compute(
            &engines(),
            &recorder,
            &EnvironmentSignals::default(),
            MonitorMode::Demo,
        );
        assert_eq!(dashboard.risk, 20);
        assert_eq!(dashboard.threat_count, 4);
        assert_eq!(dashboard.tracker_count, 1);
        assert_eq!(dashboard.trackers_blocked, 1);
        assert_eq!(
            dashboard.next_threat.as_ref().map(|f| f.predicted_category),
            Some(ThreatCategory::CanvasFingerprint)
        );
        assert!(!dashboard.predictions.is_empty());
        // 100 - 5 (tracker) - 20 (insecure)
        assert_eq!(dashboard.privacy.score, 75);

        let canvas_count = dashboard
            .category_counts
            .iter()
            .find(|c| c.category == ThreatCategory::CanvasFingerprint)
            .map(|c| c.count);
        assert_eq!(canvas_count, Some(4));
    }

    #[test]
    fn test_unblocked_trackers_cost_as_much_as_blocked() {
        let engines = engines();
        let env = EnvironmentSignals {
            secure_transport: true,
            ..EnvironmentSignals::default()
        };

        let protected = recorder();
        let unprotected = recorder();
        for i in 0..10 {
            let url = format!("https://ad{}.doubleclick.net/", i);
            protected.record_tracker(&url, "doubleclick.net", true).unwrap();
            unprotected.record_tracker(&url, "doubleclick.net", false).unwrap();
        }

        let blocked = Dashboard::compute(&engines, &protected, &env, MonitorMode::Live);
        let leaked = Dashboard::compute(&engines, &unprotected, &env, MonitorMode::Live);
        assert_eq!(blocked.tracker_count, 10);
        assert_eq!(leaked.tracker_count, 10);
        assert_eq!(leaked.trackers_blocked, 0);
        assert!(leaked.privacy.score <= blocked.privacy.score);
        // 100 + 10 (https) - 50 (ten trackers)
        assert_eq!(leaked.privacy.score, 60);
    }

    #[test]
    fn test_fallback_is_zeroed() {
        let recorder = recorder();
        recorder.record(ThreatDetail::BatteryProbe, Severity::Low).unwrap();
        let dashboard = Dashboard::fallback(&recorder);
        assert_eq!(dashboard.mode, MonitorMode::Fallback);
        assert_eq!(dashboard.risk, 0);
        assert_eq!(dashboard.privacy.score, 0);
        assert_eq!(dashboard.quantum.score, 0);
        assert_eq!(dashboard.threat_count, 1);

        let json = serde_json::to_value(&dashboard).unwrap();
        assert_eq!(json["mode"], "fallback");
    }
}
