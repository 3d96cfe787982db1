//! Severity-weighted risk over the trailing five minutes.

use super::{Severity, ThreatEvent, ThreatStore};
use crate::config::ScoringWeights;

/// Default risk window (5 minutes)
pub const DEFAULT_RISK_WINDOW_MS: u64 = 300_000;

pub const MAX_RISK: i64 = 100;

#[derive(Debug, Clone)]
pub struct RiskScorer {
    window_ms: u64,
    weights: ScoringWeights,
}

impl RiskScorer {
    pub fn new(window_ms: u64, weights: ScoringWeights) -> Self {
        Self { window_ms, weights }
    }

    fn weight(&self, severity: Severity) -> i64 {
        i64::from(match severity {
            Severity::Critical => self.weights.critical,
            Severity::High => self.weights.high,
            Severity::Medium => self.weights.medium,
            Severity::Low => self.weights.low,
        })
    }

    /// Score an arbitrary set of events, clamped to [0, 100].
    pub fn score_events<'a, I>(&self, events: I) -> u32
    where
        I: IntoIterator<Item = &'a ThreatEvent>,
    {
        let total: i64 = events.into_iter().map(|e| self.weight(e.severity())).sum();
        total.clamp(0, MAX_RISK) as u32
    }

    /// Risk of the store's window ending at `now`.
    pub fn score(&self, store: &ThreatStore, now: u64) -> u32 {
        self.score_events(store.recent(self.window_ms, now))
    }
}

impl Default for RiskScorer {
    fn default() -> Self {
        Self::new(DEFAULT_RISK_WINDOW_MS, ScoringWeights::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::threat::test_support::event;
    use crate::threat::ThreatCategory;

    #[test]
    fn test_weights_sum() {
        let mut store = ThreatStore::new();
        let c = ThreatCategory::CanvasFingerprint;
        store.record(event(c, Severity::Critical, 0));
        store.record(event(c, Severity::High, 1));
        store.record(event(c, Severity::Medium, 2));
        store.record(event(c, Severity::Low, 3));
        assert_eq!(RiskScorer::default().score(&store, 3), 18);
    }

    #[test]
    fn test_window_excludes_old_events() {
        let mut store = ThreatStore::new();
        let c = ThreatCategory::WebglFingerprint;
        store.record(event(c, Severity::Critical, 0));
        store.record(event(c, Severity::Low, 300_001));
        assert_eq!(RiskScorer::default().score(&store, 300_001), 1);
    }

    #[test]
    fn test_clamped_to_hundred() {
        let mut store = ThreatStore::new();
        for t in 0..100 {
            store.record(event(ThreatCategory::WebrtcLeak, Severity::Critical, t));
        }
        assert_eq!(RiskScorer::default().score(&store, 100), 100);
    }

    #[test]
    fn test_negative_weights_clamp_to_zero() {
        let weights = ScoringWeights {
            low: -50,
            ..Default::default()
        };
        let scorer = RiskScorer::new(DEFAULT_RISK_WINDOW_MS, weights);
        let mut store = ThreatStore::new();
        store.record(event(ThreatCategory::BatteryProbe, Severity::Low, 0));
        assert_eq!(scorer.score(&store, 0), 0);
    }

    #[test]
    fn test_empty_store() {
        assert_eq!(RiskScorer::default().score(&ThreatStore::new(), 1_000), 0);
    }
}
