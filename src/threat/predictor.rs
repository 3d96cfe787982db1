//! Frequency-based forecast of the next threat category.

use serde::Serialize;

use super::{ThreatCategory, ThreatStore};

/// Number of recent events considered by default
pub const DEFAULT_LOOKBACK: usize = 10;

/// Below this many events in total no forecast is made
pub const MIN_HISTORY: usize = 3;

/// The winning category must occur more often than this
pub const MIN_WINNING_COUNT: usize = 2;

pub const MAX_CONFIDENCE: f64 = 0.8;

pub const FORECAST_TIMEFRAME: &str = "within 30 seconds";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThreatForecast {
    pub predicted_category: ThreatCategory,
    pub confidence: f64,
    pub timeframe: &'static str,
    /// Occurrences of the winning category in the lookback
    pub count: usize,
}

#[derive(Debug, Clone)]
pub struct NextThreatPredictor {
    lookback: usize,
}

impl NextThreatPredictor {
    pub fn new(lookback: usize) -> Self {
        Self {
            lookback: lookback.max(1),
        }
    }

    /// Forecast from the latest events, or `None` when the history is too
    /// short or no category dominates.
    pub fn predict(&self, store: &ThreatStore) -> Option<ThreatForecast> {
        if store.len() < MIN_HISTORY {
            return None;
        }

        // Tally in first-seen order so ties resolve deterministically.
        let mut tally: Vec<(ThreatCategory, usize)> = Vec::new();
        for event in store.latest(self.lookback) {
            match tally.iter_mut().find(|(c, _)| *c == event.category()) {
                Some((_, count)) => *count += 1,
                None => tally.push((event.category(), 1)),
            }
        }

        let mut winner: Option<(ThreatCategory, usize)> = None;
        for &(category, count) in &tally {
            if winner.map_or(true, |(_, best)| count > best) {
                winner = Some((category, count));
            }
        }

        let (category, count) = winner?;
        if count <= MIN_WINNING_COUNT {
            return None;
        }

        Some(ThreatForecast {
            predicted_category: category,
            confidence: MAX_CONFIDENCE.min(count as f64 / self.lookback as f64),
            timeframe: FORECAST_TIMEFRAME,
            count,
        })
    }
}

impl Default for NextThreatPredictor {
    fn default() -> Self {
        Self::new(DEFAULT_LOOKBACK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::threat::test_support::event;
    use crate::threat::Severity;

    fn store_of(categories: &[ThreatCategory]) -> ThreatStore {
        let mut store = ThreatStore::new();
        for (i, c) in categories.iter().enumerate() {
            store.record(event(*c, Severity::Low, i as u64));
        }
        store
    }

    #[test]
    fn test_needs_three_events() {
        let store = store_of(&[
            ThreatCategory::CanvasFingerprint,
            ThreatCategory::CanvasFingerprint,
        ]);
        assert!(NextThreatPredictor::default().predict(&store).is_none());
    }

    #[test]
    fn test_dominant_category() {
        use ThreatCategory::*;
        let store = store_of(&[
            CanvasFingerprint,
            CanvasFingerprint,
            CanvasFingerprint,
            GeolocationAccess,
        ]);
        let forecast = NextThreatPredictor::default().predict(&store).unwrap();
        assert_eq!(forecast.predicted_category, CanvasFingerprint);
        assert!((forecast.confidence - 0.3).abs() < 1e-12);
        assert_eq!(forecast.timeframe, "within 30 seconds");
        assert_eq!(forecast.count, 3);
    }

    #[test]
    fn test_two_of_a_kind_is_not_enough() {
        use ThreatCategory::*;
        let store = store_of(&[CanvasFingerprint, CanvasFingerprint, WebglFingerprint]);
        assert!(NextThreatPredictor::default().predict(&store).is_none());
    }

    #[test]
    fn test_first_seen_wins_ties() {
        use ThreatCategory::*;
        let store = store_of(&[
            AudioFingerprint,
            WebglFingerprint,
            WebglFingerprint,
            AudioFingerprint,
            WebglFingerprint,
            AudioFingerprint,
        ]);
        let forecast = NextThreatPredictor::default().predict(&store).unwrap();
        assert_eq!(forecast.predicted_category, AudioFingerprint);
    }

    #[test]
    fn test_only_lookback_counts() {
        use ThreatCategory::*;
        let mut categories = vec![CanvasFingerprint; 5];
        categories.extend(std::iter::repeat(BatteryProbe).take(10));
        let store = store_of(&categories);
        let forecast = NextThreatPredictor::default().predict(&store).unwrap();
        assert_eq!(forecast.predicted_category, BatteryProbe);
        assert_eq!(forecast.count, 10);
        assert_eq!(forecast.confidence, 0.8);
    }
}
