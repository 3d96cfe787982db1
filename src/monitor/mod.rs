//! The JavaScript-facing privacy monitor.
//!
//! ```javascript
//! import init, { PrivacyMonitor } from './pkg/privacy_radar.js';
//! await init();
//! const monitor = new PrivacyMonitor({ protections: { canvas: true } });
//! monitor.install_hooks();
//! monitor.start((dashboard) => radar.render(dashboard));
//! ```

use rand::rngs::{OsRng, StdRng};
use rand::{Rng, SeedableRng};
use serde::Serialize;
use wasm_bindgen::prelude::*;

pub mod demo;
pub mod engines;
pub mod recorder;
pub mod session;

pub use engines::{CategoryCount, Dashboard, Engines, EnvironmentSignals, MonitorMode};
pub use recorder::Recorder;
pub use session::Session;

use crate::browser::{self, BrowserPermissions, FingerprintSnapshot};
use crate::config::RadarConfig;
use crate::error::RadarError;
use crate::hooks::{HookRegistry, NoiseSource};
use crate::runtime::RecurringTask;
use crate::storage::{ThemePreference, ThemeStore};
use crate::threat::{Severity, ThreatCategory, ThreatDetail};
use crate::trackers::TrackerMatcher;

fn to_js<T: Serialize + ?Sized>(value: &T) -> JsValue {
    serde_wasm_bindgen::to_value(value).unwrap_or(JsValue::NULL)
}

/// Re-read permissions, transport and fingerprint into the session.
async fn refresh_environment(session: Session) {
    let probe = BrowserPermissions::new(session.config().permission_timeout_ms);
    let uniqueness = FingerprintSnapshot::collect().uniqueness().unwrap_or_else(|e| {
        log::warn!("⚠️ Fingerprint snapshot failed: {}", e);
        0.0
    });
    session
        .refresh_environment(&probe, browser::is_secure_transport(), uniqueness)
        .await;
    log::debug!("🔄 Environment refreshed");
}

#[wasm_bindgen]
pub struct PrivacyMonitor {
    session: Session,
    hooks: HookRegistry,
    matcher: TrackerMatcher,
    theme: ThemeStore,
    refresh: Option<RecurringTask>,
    demo: Option<RecurringTask>,
}

#[wasm_bindgen]
impl PrivacyMonitor {
    /// Create a monitor. `options` is a partial `RadarConfig`; anything
    /// unreadable falls back to defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(options: JsValue) -> PrivacyMonitor {
        let config: RadarConfig = if options.is_undefined() || options.is_null() {
            RadarConfig::default()
        } else {
            serde_wasm_bindgen::from_value(options).unwrap_or_else(|e| {
                log::warn!("⚠️ Invalid monitor options, using defaults: {}", e);
                RadarConfig::default()
            })
        };

        let seeded = StdRng::from_rng(OsRng).map_err(|e| RadarError::EntropyError(e.to_string()));
        let session = Session::new(config, seeded);

        let noise = NoiseSource::new(session.recorder().rng().borrow_mut().gen());
        let hooks = HookRegistry::browser(session.config(), noise);
        let matcher = TrackerMatcher::new(session.config().match_mode);

        log::info!(
            "📡 Privacy monitor created ({})",
            if session.is_fallback() { "fallback" } else { "live" }
        );

        Self {
            session,
            hooks,
            matcher,
            theme: ThemeStore::new(),
            refresh: None,
            demo: None,
        }
    }

    /// Hook every supported capability. Returns the installed names.
    pub fn install_hooks(&mut self) -> JsValue {
        let installed = self.hooks.install_all(self.session.recorder());
        to_js(&installed)
    }

    /// Restore every original browser API.
    pub fn uninstall_hooks(&mut self) {
        self.hooks.uninstall_all();
    }

    pub fn enable_protection(&self, name: &str) -> std::result::Result<(), JsValue> {
        Ok(self.hooks.enable(name)?)
    }

    pub fn disable_protection(&self, name: &str) -> std::result::Result<(), JsValue> {
        Ok(self.hooks.disable(name)?)
    }

    pub fn protection_status(&self) -> JsValue {
        to_js(&self.hooks.status())
    }

    /// Record an event from page script. Returns the resulting analysis.
    pub fn record(&self, category: &str, severity: &str) -> std::result::Result<JsValue, JsValue> {
        let category = ThreatCategory::parse(category)
            .ok_or_else(|| RadarError::InvalidEvent(format!("unknown category {:?}", category)))?;
        let severity = Severity::parse(severity)
            .ok_or_else(|| RadarError::InvalidEvent(format!("unknown severity {:?}", severity)))?;
        let analysis = self
            .session
            .recorder()
            .record(ThreatDetail::bare(category), severity)?;
        Ok(to_js(&analysis))
    }

    /// Host of `url` if it belongs to a listed tracker.
    pub fn check_url(&self, url: &str) -> Option<String> {
        self.matcher.match_url(url)
    }

    pub fn get_all(&self) -> JsValue {
        let store = self.session.recorder().store().borrow();
        to_js(&store.all().collect::<Vec<_>>())
    }

    pub fn get_recent(&self, window_ms: f64) -> JsValue {
        let recorder = self.session.recorder();
        let now = recorder.now_ms();
        let store = recorder.store().borrow();
        to_js(&store.recent(window_ms.max(0.0) as u64, now).collect::<Vec<_>>())
    }

    pub fn get_trackers(&self) -> JsValue {
        let store = self.session.recorder().store().borrow();
        to_js(&store.trackers().collect::<Vec<_>>())
    }

    pub fn privacy_score(&self) -> JsValue {
        to_js(&self.session.privacy_score())
    }

    pub fn quantum_score(&self) -> JsValue {
        to_js(&self.session.quantum_score())
    }

    pub fn dashboard(&self) -> JsValue {
        to_js(&self.session.dashboard())
    }

    /// Push a dashboard to `on_update` every refresh interval. Restarting
    /// replaces the previous loop.
    pub fn start(&mut self, on_update: js_sys::Function) {
        self.stop();

        let session = self.session.clone();
        let every = session.config().permission_refresh_ticks.max(1);
        let mut ticks: u32 = 0;

        wasm_bindgen_futures::spawn_local(refresh_environment(session.clone()));

        let task = RecurringTask::spawn("refresh", session.config().refresh_interval_ms, move || {
            let dashboard = session.dashboard();
            if let Err(e) = on_update.call1(&JsValue::NULL, &to_js(&dashboard)) {
                log::warn!("⚠️ Dashboard callback threw: {:?}", e);
            }

            ticks = ticks.wrapping_add(1);
            if ticks % every == 0 {
                wasm_bindgen_futures::spawn_local(refresh_environment(session.clone()));
            }
        });
        self.refresh = Some(task);
    }

    pub fn stop(&mut self) {
        if let Some(task) = self.refresh.take() {
            task.cancel();
        }
    }

    pub fn is_running(&self) -> bool {
        self.refresh.as_ref().map(|t| t.is_running()).unwrap_or(false)
    }

    pub fn start_demo(&mut self) {
        self.stop_demo();
        let recorder = self.session.recorder().clone();
        let task = RecurringTask::spawn("demo", self.session.config().demo_interval_ms, move || {
            demo::demo_tick(&recorder)
        });
        self.session.set_demo_running(true);
        self.demo = Some(task);
    }

    pub fn stop_demo(&mut self) {
        if let Some(task) = self.demo.take() {
            task.cancel();
        }
        self.session.set_demo_running(false);
    }

    pub fn is_demo_running(&self) -> bool {
        self.demo.is_some()
    }

    /// Re-query permissions and the fingerprint now. Resolves when done.
    pub fn refresh_environment(&self) -> js_sys::Promise {
        let session = self.session.clone();
        wasm_bindgen_futures::future_to_promise(async move {
            refresh_environment(session).await;
            Ok(JsValue::UNDEFINED)
        })
    }

    /// Session reset: drop all threat and tracker history.
    pub fn clear(&self) {
        self.session.recorder().clear();
    }

    pub fn is_fallback(&self) -> bool {
        self.session.is_fallback()
    }

    pub fn theme(&self) -> String {
        self.theme.load().as_str().to_string()
    }

    pub fn set_theme(&self, theme: &str) -> std::result::Result<(), JsValue> {
        let theme = ThemePreference::parse(theme)
            .ok_or_else(|| RadarError::Config(format!("unknown theme {:?}", theme)))?;
        Ok(self.theme.save(theme)?)
    }

    /// Decorative hex "key" measured from the quantum register.
    pub fn generate_key(&self, bits: usize) -> std::result::Result<String, JsValue> {
        Ok(self.session.generate_key(bits)?)
    }
}

impl PrivacyMonitor {
    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }
}

impl Drop for PrivacyMonitor {
    fn drop(&mut self) {
        // Trap closures die with the registry; originals must be back first
        self.hooks.uninstall_all();
    }
}

