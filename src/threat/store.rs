//! Append-only threat history.
//!
//! Both buffers evict FIFO once full: what matters is how recently something
//! happened, not how recently it was read. Timestamps are kept non-decreasing
//! so window lookups can binary-search the front of the buffer.

use std::collections::vec_deque;
use std::collections::VecDeque;

use super::{ThreatEvent, TrackerEvent};

/// Default threat buffer capacity
pub const DEFAULT_THREAT_CAPACITY: usize = 100;

/// Default tracker buffer capacity
pub const DEFAULT_TRACKER_CAPACITY: usize = 500;

#[derive(Debug)]
pub struct ThreatStore {
    threats: VecDeque<ThreatEvent>,
    trackers: VecDeque<TrackerEvent>,
    threat_capacity: usize,
    tracker_capacity: usize,
    /// Every tracker request seen this session, including evicted ones
    trackers_detected: u64,
    trackers_blocked: u64,
    threats_recorded: u64,
}

impl ThreatStore {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_THREAT_CAPACITY, DEFAULT_TRACKER_CAPACITY)
    }

    pub fn with_capacity(threat_capacity: usize, tracker_capacity: usize) -> Self {
        let threat_capacity = threat_capacity.max(1);
        let tracker_capacity = tracker_capacity.max(1);
        Self {
            threats: VecDeque::with_capacity(threat_capacity),
            trackers: VecDeque::new(),
            threat_capacity,
            tracker_capacity,
            trackers_detected: 0,
            trackers_blocked: 0,
            threats_recorded: 0,
        }
    }

    /// Append a threat event, evicting the oldest when full.
    ///
    /// Returns the event as stored (its timestamp may have been raised to
    /// keep the buffer ordered).
    pub fn record(&mut self, mut event: ThreatEvent) -> ThreatEvent {
        if let Some(last) = self.threats.back() {
            if event.observed_at < last.observed_at {
                log::debug!(
                    "Clamping out-of-order {} event ({} < {})",
                    event.category,
                    event.observed_at,
                    last.observed_at
                );
                event.observed_at = last.observed_at;
            }
        }

        while self.threats.len() >= self.threat_capacity {
            self.threats.pop_front();
        }
        self.threats.push_back(event.clone());
        self.threats_recorded += 1;

        log::debug!(
            "📡 Recorded {} ({}) at {}ms",
            event.category,
            event.severity.as_str(),
            event.observed_at
        );
        event
    }

    /// Append a tracker request, blocked or not.
    pub fn record_tracker(&mut self, mut event: TrackerEvent) {
        if let Some(last) = self.trackers.back() {
            event.observed_at = event.observed_at.max(last.observed_at);
        }
        while self.trackers.len() >= self.tracker_capacity {
            self.trackers.pop_front();
        }
        if event.blocked {
            log::debug!("🚫 Blocked tracker {}", event.host);
            self.trackers_blocked += 1;
        } else {
            log::debug!("👁️ Tracker {} let through", event.host);
        }
        self.trackers_detected += 1;
        self.trackers.push_back(event);
    }

    /// Events observed within `window_ms` before `now`, oldest first.
    ///
    /// The iterator borrows the store and can be cloned to walk the window
    /// again without another lookup.
    pub fn recent(&self, window_ms: u64, now: u64) -> vec_deque::Iter<'_, ThreatEvent> {
        let cutoff = now.saturating_sub(window_ms);
        let start = self.threats.partition_point(|e| e.observed_at < cutoff);
        self.threats.range(start..)
    }

    /// The whole capped buffer, oldest first.
    pub fn all(&self) -> vec_deque::Iter<'_, ThreatEvent> {
        self.threats.iter()
    }

    /// The last `n` events (or fewer), oldest first.
    pub fn latest(&self, n: usize) -> vec_deque::Iter<'_, ThreatEvent> {
        let start = self.threats.len().saturating_sub(n);
        self.threats.range(start..)
    }

    pub fn trackers(&self) -> vec_deque::Iter<'_, TrackerEvent> {
        self.trackers.iter()
    }

    pub fn trackers_detected(&self) -> u64 {
        self.trackers_detected
    }

    pub fn trackers_blocked(&self) -> u64 {
        self.trackers_blocked
    }

    pub fn threats_recorded(&self) -> u64 {
        self.threats_recorded
    }

    pub fn len(&self) -> usize {
        self.threats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.threats.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.threat_capacity
    }

    /// Drop all history. Used by the UI's session reset.
    pub fn clear(&mut self) {
        self.threats.clear();
        self.trackers.clear();
        self.trackers_detected = 0;
        self.trackers_blocked = 0;
        self.threats_recorded = 0;
        log::info!("🗑️ Threat history cleared");
    }
}

impl Default for ThreatStore {
    fn default() -> Self {
        Self::new()
    }
}
