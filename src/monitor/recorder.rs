//! Shared write path into the threat store.
//!
//! Every producer (capability hooks, the demo generator, page scripts via
//! `PrivacyMonitor::record`) holds a clone of the same `Recorder`. Borrows of
//! the store are scoped to a single call and never outlive it.

use rand::rngs::StdRng;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::error::{RadarError, Result};
use crate::runtime::SessionClock;
use crate::threat::{
    Analysis, PatternAnalyzer, Prediction, PredictionModel, Severity, ThreatDetail, ThreatEvent,
    ThreatStore, TrackerEvent,
};

/// How many pattern predictions the dashboard keeps
pub const RECENT_PREDICTIONS: usize = 10;

#[derive(Clone)]
pub struct Recorder {
    store: Rc<RefCell<ThreatStore>>,
    analyzer: PatternAnalyzer,
    predictions: Rc<RefCell<VecDeque<Prediction>>>,
    clock: SessionClock,
    rng: Rc<RefCell<StdRng>>,
}

impl Recorder {
    pub fn new(
        store: Rc<RefCell<ThreatStore>>,
        analyzer: PatternAnalyzer,
        clock: SessionClock,
        rng: Rc<RefCell<StdRng>>,
    ) -> Self {
        Self {
            store,
            analyzer,
            predictions: Rc::new(RefCell::new(VecDeque::with_capacity(RECENT_PREDICTIONS))),
            clock,
            rng,
        }
    }

    pub fn store(&self) -> &Rc<RefCell<ThreatStore>> {
        &self.store
    }

    pub fn rng(&self) -> &Rc<RefCell<StdRng>> {
        &self.rng
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Record an event at the current session time and analyze it.
    pub fn record(&self, detail: ThreatDetail, severity: Severity) -> Result<Analysis> {
        self.record_at(detail, severity, self.clock.now_ms())
    }

    /// Record an event at an explicit timestamp.
    pub fn record_at(
        &self,
        detail: ThreatDetail,
        severity: Severity,
        observed_at: u64,
    ) -> Result<Analysis> {
        let event = {
            let mut rng = self
                .rng
                .try_borrow_mut()
                .map_err(|_| RadarError::Internal("rng already borrowed".into()))?;
            ThreatEvent::new(detail, severity, observed_at, &mut *rng)?
        };

        let analysis = {
            let mut store = self
                .store
                .try_borrow_mut()
                .map_err(|_| RadarError::Internal("threat store already borrowed".into()))?;
            let stored = store.record(event);
            self.analyzer.analyze(&stored, &store, stored.observed_at())
        };

        if !analysis.is_empty() {
            let mut recent = self.predictions.borrow_mut();
            for prediction in &analysis.predictions {
                log::info!(
                    "🔮 {} ({:.0}%): {}",
                    prediction.pattern.as_str(),
                    prediction.confidence * 100.0,
                    prediction.message
                );
                while recent.len() >= RECENT_PREDICTIONS {
                    recent.pop_front();
                }
                recent.push_back(prediction.clone());
            }
        }

        Ok(analysis)
    }

    /// Fire-and-forget recording used by hooks. The severity comes from the
    /// category's typical severity; failures are logged and swallowed.
    pub fn report(&self, detail: ThreatDetail) {
        let severity = PredictionModel::typical_severity(detail.category());
        if let Err(e) = self.record(detail, severity) {
            log::warn!("Dropped threat event: {}", e);
        }
    }

    /// Record a request to a listed tracker host and whether it was blocked.
    pub fn record_tracker(&self, url: &str, host: &str, blocked: bool) -> Result<()> {
        let event = TrackerEvent::new(url, host, blocked, self.clock.now_ms());
        self.store
            .try_borrow_mut()
            .map_err(|_| RadarError::Internal("threat store already borrowed".into()))?
            .record_tracker(event);
        Ok(())
    }

    /// The most recent pattern predictions, oldest first.
    pub fn predictions(&self) -> Vec<Prediction> {
        self.predictions.borrow().iter().cloned().collect()
    }

    pub fn clear(&self) {
        self.store.borrow_mut().clear();
        self.predictions.borrow_mut().clear();
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use rand::SeedableRng;

    pub fn recorder() -> Recorder {
        Recorder::new(
            Rc::new(RefCell::new(ThreatStore::new())),
            PatternAnalyzer::new(60_000),
            SessionClock::start(),
            Rc::new(RefCell::new(StdRng::seed_from_u64(42))),
        )
    }
}
