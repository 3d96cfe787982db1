//! # Privacy Radar
//!
//! In-browser privacy telemetry compiled to WebAssembly.
//!
//! Hooks the browser APIs fingerprinting and tracking scripts rely on,
//! keeps a rolling threat history, and derives risk, privacy and
//! (decorative) quantum scores for a JavaScript radar display.
//!
//! ## Architecture
//!
//! ```text
//! browser APIs ─▶ hooks (Proxy traps) ─▶ Recorder ─▶ ThreatStore
//!                                           │            │
//!                                    PatternAnalyzer     ├─▶ RiskScorer
//!                                           │            ├─▶ NextThreatPredictor
//!                                      Predictions       └─▶ PrivacyScoreEngine
//!                                                               │
//!                          refresh loop (1 s) ─▶ Dashboard ─▶ JS callback
//! ```
//!
//! Nothing leaves the page: there is no server, and the only persisted value
//! is the theme preference.

use wasm_bindgen::prelude::*;

pub mod browser;
pub mod config;
mod error;
pub mod hooks;
pub mod monitor;
pub mod runtime;
pub mod scoring;
pub mod storage;
pub mod threat;
pub mod trackers;


pub use config::{MatchMode, ProtectionConfig, RadarConfig, ScoringWeights};
pub use error::{ErrorCode, ErrorInfo, RadarError, Result};
pub use hooks::{Capability, CapabilityStatus, HookRegistry, ProtectionSwitch};
pub use monitor::{Dashboard, MonitorMode, PrivacyMonitor, Recorder, Session};
pub use scoring::{
    PermissionName, PermissionProbe, PermissionSnapshot, PermissionState, PrivacyScore,
    PrivacyScoreEngine, QuantumScore, QuantumScoreEngine,
};
pub use storage::{ThemePreference, ThemeStore};
pub use threat::{
    NextThreatPredictor, PatternAnalyzer, PatternKind, Prediction, PredictionModel, RiskScorer,
    Severity, ThreatCategory, ThreatDetail, ThreatEvent, ThreatStore, TrackerEvent,
};
pub use trackers::{TrackerMatcher, TRACKER_DOMAINS};

/// Initialize logging.
///
/// Runs automatically when the module loads; a second logger registration
/// is ignored.
#[wasm_bindgen(start)]
pub fn init() {
    if console_log::init_with_level(log::Level::Info).is_err() {
        log::debug!("Logger already initialized");
    }
    log::info!("Privacy radar initialized");
}

/// Whether `url` points at a listed tracker host (boundary matching).
#[wasm_bindgen]
pub fn is_tracker_url(url: &str) -> bool {
    TrackerMatcher::default().match_url(url).is_some()
}

/// Crate version, for the page footer.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
