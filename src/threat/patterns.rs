//! Pattern detection over the trailing window.
//!
//! Three independent checks run against the window ending at `now` every
//! time an event is recorded. Any combination of them may fire for the same
//! trigger, and each detected pattern maps to exactly one prediction.

use serde::Serialize;
use std::collections::HashSet;

use super::{Severity, ThreatCategory, ThreatEvent, ThreatStore};

/// Default detection window (60 seconds)
pub const DEFAULT_PATTERN_WINDOW_MS: u64 = 60_000;

/// Same-category events must exceed this count
pub const RAPID_REPETITION_THRESHOLD: usize = 3;

/// Distinct categories must exceed this count
pub const MULTIPLE_TYPES_THRESHOLD: usize = 5;

/// High/critical events must exceed this count
pub const HIGH_SEVERITY_THRESHOLD: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    RapidRepetition,
    MultipleThreatTypes,
    HighSeverityCluster,
}

impl PatternKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternKind::RapidRepetition => "rapid_repetition",
            PatternKind::MultipleThreatTypes => "multiple_threat_types",
            PatternKind::HighSeverityCluster => "high_severity_cluster",
        }
    }

    /// Confidence of the prediction this pattern produces
    pub fn confidence(&self) -> f64 {
        match self {
            PatternKind::RapidRepetition => 0.80,
            PatternKind::MultipleThreatTypes => 0.90,
            PatternKind::HighSeverityCluster => 0.95,
        }
    }

    pub fn timeframe(&self) -> &'static str {
        match self {
            PatternKind::RapidRepetition => "5-10 minutes",
            PatternKind::MultipleThreatTypes | PatternKind::HighSeverityCluster => "immediate",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            PatternKind::RapidRepetition => Severity::Medium,
            PatternKind::MultipleThreatTypes => Severity::High,
            PatternKind::HighSeverityCluster => Severity::Critical,
        }
    }
}

/// A detected recurring structure in the recent history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pattern {
    pub kind: PatternKind,
    pub severity: Severity,
    pub count: usize,
    /// Only set for `RapidRepetition`
    pub category: Option<ThreatCategory>,
    pub detected_at: u64,
}

/// Forward-looking statement derived from a pattern.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub pattern: PatternKind,
    pub message: String,
    pub confidence: f64,
    pub timeframe: &'static str,
    pub severity: Severity,
    pub issued_at: u64,
}

impl Prediction {
    pub fn from_pattern(pattern: &Pattern) -> Self {
        let message = match (pattern.kind, pattern.category) {
            (PatternKind::RapidRepetition, Some(category)) => format!(
                "Repeated {} detected ({} times in the last minute); further attempts are likely",
                category.label(),
                pattern.count
            ),
            (PatternKind::RapidRepetition, None) => {
                "Repeated tracking activity detected; further attempts are likely".to_string()
            }
            (PatternKind::MultipleThreatTypes, _) => format!(
                "{} different tracking techniques in use; a coordinated fingerprinting attempt is underway",
                pattern.count
            ),
            (PatternKind::HighSeverityCluster, _) => format!(
                "{} high-severity threats in the last minute; enable all protections now",
                pattern.count
            ),
        };

        Self {
            pattern: pattern.kind,
            message,
            confidence: pattern.kind.confidence(),
            timeframe: pattern.kind.timeframe(),
            severity: pattern.severity,
            issued_at: pattern.detected_at,
        }
    }
}

/// Result of analyzing one trigger event.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Analysis {
    pub patterns: Vec<Pattern>,
    pub predictions: Vec<Prediction>,
}

impl Analysis {
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Stateless detector; reads the store, never writes it.
#[derive(Debug, Clone)]
pub struct PatternAnalyzer {
    window_ms: u64,
}

impl PatternAnalyzer {
    pub fn new(window_ms: u64) -> Self {
        Self { window_ms }
    }

    pub fn window_ms(&self) -> u64 {
        self.window_ms
    }

    /// Run all checks for `trigger` against the window ending at `now`.
    pub fn detect(&self, trigger: &ThreatEvent, store: &ThreatStore, now: u64) -> Vec<Pattern> {
        let window = store.recent(self.window_ms, now);
        let mut patterns = Vec::new();

        let same_category = window
            .clone()
            .filter(|e| e.category() == trigger.category())
            .count();
        if same_category > RAPID_REPETITION_THRESHOLD {
            patterns.push(Pattern {
                kind: PatternKind::RapidRepetition,
                severity: PatternKind::RapidRepetition.severity(),
                count: same_category,
                category: Some(trigger.category()),
                detected_at: now,
            });
        }

        let distinct = window
            .clone()
            .map(|e| e.category())
            .collect::<HashSet<_>>()
            .len();
        if distinct > MULTIPLE_TYPES_THRESHOLD {
            patterns.push(Pattern {
                kind: PatternKind::MultipleThreatTypes,
                severity: PatternKind::MultipleThreatTypes.severity(),
                count: distinct,
                category: None,
                detected_at: now,
            });
        }

        let severe = window.filter(|e| e.severity().is_high_or_critical()).count();
        if severe > HIGH_SEVERITY_THRESHOLD {
            patterns.push(Pattern {
                kind: PatternKind::HighSeverityCluster,
                severity: PatternKind::HighSeverityCluster.severity(),
                count: severe,
                category: None,
                detected_at: now,
            });
        }

        patterns
    }

    /// Detect patterns and derive their predictions.
    pub fn analyze(&self, trigger: &ThreatEvent, store: &ThreatStore, now: u64) -> Analysis {
        let patterns = self.detect(trigger, store, now);
        let predictions = patterns.iter().map(Prediction::from_pattern).collect();
        if !patterns.is_empty() {
            log::info!(
                "🔮 {} pattern(s) after {}: {:?}",
                patterns.len(),
                trigger.category(),
                patterns.iter().map(|p| p.kind.as_str()).collect::<Vec<_>>()
            );
        }
        Analysis {
            patterns,
            predictions,
        }
    }
}

impl Default for PatternAnalyzer {
    fn default() -> Self {
        Self::new(DEFAULT_PATTERN_WINDOW_MS)
    }
}
