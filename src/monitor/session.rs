//! Per-session state shared between the exported monitor and its loops.

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::engines::{Dashboard, Engines, EnvironmentSignals, MonitorMode};
use super::recorder::Recorder;
use crate::config::RadarConfig;
use crate::error::{RadarError, Result};
use crate::runtime::{wallclock_ms, SessionClock};
use crate::scoring::{collect_permissions, PermissionProbe, PrivacyScore, QuantumScore};
use crate::threat::{PatternAnalyzer, ThreatStore};

/// Cheap to clone; every clone sees the same session.
#[derive(Clone)]
pub struct Session {
    config: Rc<RadarConfig>,
    recorder: Recorder,
    /// `None` means fallback mode
    engines: Option<Rc<Engines>>,
    env: Rc<RefCell<EnvironmentSignals>>,
    demo_running: Rc<Cell<bool>>,
}

impl Session {
    /// Build a session from a config and the outcome of seeding the RNG.
    /// Any failure leaves the session in fallback mode; recording still works.
    /// A rejected config still runs the buffers and loops, on defaults for
    /// the rejected values.
    pub fn new(config: RadarConfig, seeded: Result<StdRng>) -> Self {
        let (mut rng, entropy_error) = match seeded {
            Ok(rng) => (rng, None),
            Err(e) => (StdRng::seed_from_u64(wallclock_ms()), Some(e)),
        };

        let config_error = config.validate().err();
        let config = config.sanitized();

        let engines = match entropy_error.or(config_error) {
            Some(e) => Err(e),
            None => Engines::new(&config, &mut rng),
        };
        let engines = match engines {
            Ok(engines) => Some(Rc::new(engines)),
            Err(e) => {
                log::warn!("⚠️ Scoring disabled, entering fallback mode: {}", e);
                None
            }
        };

        let store = ThreatStore::with_capacity(config.threat_capacity, config.tracker_capacity);
        let recorder = Recorder::new(
            Rc::new(RefCell::new(store)),
            PatternAnalyzer::new(config.pattern_window_ms),
            SessionClock::start(),
            Rc::new(RefCell::new(rng)),
        );

        Self {
            config: Rc::new(config),
            recorder,
            engines,
            env: Rc::new(RefCell::new(EnvironmentSignals::default())),
            demo_running: Rc::new(Cell::new(false)),
        }
    }

    pub fn config(&self) -> &RadarConfig {
        &self.config
    }

    pub fn recorder(&self) -> &Recorder {
        &self.recorder
    }

    pub fn is_fallback(&self) -> bool {
        self.engines.is_none()
    }

    pub fn set_demo_running(&self, running: bool) {
        self.demo_running.set(running);
    }

    pub fn mode(&self) -> MonitorMode {
        if self.engines.is_none() {
            MonitorMode::Fallback
        } else if self.demo_running.get() {
            MonitorMode::Demo
        } else {
            MonitorMode::Live
        }
    }

    pub fn dashboard(&self) -> Dashboard {
        match &self.engines {
            Some(engines) => {
                let env = self.env.borrow().clone();
                Dashboard::compute(engines, &self.recorder, &env, self.mode())
            }
            None => Dashboard::fallback(&self.recorder),
        }
    }

    pub fn privacy_score(&self) -> PrivacyScore {
        match &self.engines {
            Some(engines) => {
                let detected = self.recorder.store().borrow().trackers_detected();
                engines.privacy_score(detected, &self.env.borrow())
            }
            None => PrivacyScore::zeroed(),
        }
    }

    pub fn quantum_score(&self) -> QuantumScore {
        match &self.engines {
            Some(engines) => engines.quantum.score(&mut *self.recorder.rng().borrow_mut()),
            None => QuantumScore::zeroed(),
        }
    }

    pub fn generate_key(&self, bits: usize) -> Result<String> {
        let engines = self
            .engines
            .as_ref()
            .ok_or_else(|| RadarError::Config("key generation unavailable in fallback mode".into()))?;
        Ok(engines
            .quantum
            .generate_key(bits, &mut *self.recorder.rng().borrow_mut()))
    }

    /// Replace the browser-derived signals. No borrow is held across the
    /// permission queries.
    pub async fn refresh_environment(
        &self,
        probe: &dyn PermissionProbe,
        secure_transport: bool,
        uniqueness: f64,
    ) {
        let permissions = collect_permissions(probe).await;
        let mut env = self.env.borrow_mut();
        env.permissions = permissions;
        env.secure_transport = secure_transport;
        env.uniqueness = uniqueness;
    }

    pub fn environment(&self) -> EnvironmentSignals {
        self.env.borrow().clone()
    }
}
