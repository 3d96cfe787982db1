//! Detection hooks and toggleable countermeasures.
//!
//! Each capability wraps one family of browser APIs in a Proxy. The trap
//! always reports to the `Recorder`; whether it also spoofs or blocks is
//! decided per call by the capability's `ProtectionSwitch`, so toggling a
//! protection never re-patches anything.
//!
//! ```text
//! page script ──▶ Proxy trap ──report──▶ Recorder ──▶ ThreatStore
//!                     │
//!                     └─ protected? ── spoof / block
//!                        otherwise  ── call original
//! ```
//!
//! `uninstall_all()` puts every original function back.

use serde::Serialize;
use std::cell::Cell;
use std::rc::Rc;

use crate::config::{ProtectionConfig, RadarConfig};
use crate::error::{RadarError, Result};
use crate::monitor::Recorder;
use crate::trackers::TrackerMatcher;

pub mod audio;
pub mod canvas;
pub mod geolocation;
pub mod network;
pub mod prng;
pub mod proxy_helpers;
pub mod webgl;
pub mod webrtc;

pub use prng::NoiseSource;
pub use proxy_helpers::PatchGuard;

/// Shared on/off flag read by a capability's traps.
#[derive(Debug, Clone, Default)]
pub struct ProtectionSwitch {
    enabled: Rc<Cell<bool>>,
}

impl ProtectionSwitch {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled: Rc::new(Cell::new(enabled)),
        }
    }

    pub fn set(&self, enabled: bool) {
        self.enabled.set(enabled);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.get()
    }
}

/// One interceptable family of browser APIs.
pub trait Capability {
    fn name(&self) -> &'static str;

    /// Whether the APIs exist in this browser.
    fn is_supported(&self) -> bool;

    /// Patch the APIs. Must be a no-op when already installed.
    fn install(&mut self, recorder: &Recorder) -> Result<()>;

    /// Restore the original APIs.
    fn uninstall(&mut self);

    fn is_installed(&self) -> bool;

    fn protection(&self) -> &ProtectionSwitch;
}

/// Shared install/uninstall bookkeeping for capabilities.
#[derive(Debug, Default)]
pub struct Patches {
    guards: Vec<PatchGuard>,
}

impl Patches {
    pub fn push(&mut self, guard: PatchGuard) {
        self.guards.push(guard);
    }

    pub fn is_empty(&self) -> bool {
        self.guards.is_empty()
    }

    pub fn restore_all(&mut self, capability: &str) {
        // Reverse order so stacked patches on the same property unwind cleanly
        while let Some(guard) = self.guards.pop() {
            let prop = guard.prop();
            if let Err(e) = guard.restore() {
                log::warn!("⚠️ Failed to restore {}.{}: {:?}", capability, prop, e);
            }
        }
    }
}

/// Map a JS-side patch failure to a crate error.
pub(crate) fn intercept_failed(api: &str, err: wasm_bindgen::JsValue) -> RadarError {
    RadarError::InterceptFailed {
        api: api.to_string(),
        reason: err.as_string().unwrap_or_else(|| format!("{:?}", err)),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapabilityStatus {
    pub name: &'static str,
    pub supported: bool,
    pub installed: bool,
    pub protected: bool,
}

/// Owns every capability and routes enable/disable by name.
pub struct HookRegistry {
    capabilities: Vec<Box<dyn Capability>>,
}

impl HookRegistry {
    pub fn new(capabilities: Vec<Box<dyn Capability>>) -> Self {
        Self { capabilities }
    }

    /// The six browser capabilities with their initial protection state.
    pub fn browser(config: &RadarConfig, noise: NoiseSource) -> Self {
        let ProtectionConfig {
            canvas,
            webgl,
            audio,
            geolocation,
            webrtc,
            network,
        } = config.protections;

        Self::new(vec![
            Box::new(canvas::CanvasCapability::new(noise, canvas)),
            Box::new(webgl::WebglCapability::new(webgl)),
            Box::new(audio::AudioCapability::new(noise, audio)),
            Box::new(geolocation::GeolocationCapability::new(geolocation)),
            Box::new(webrtc::WebrtcCapability::new(webrtc)),
            Box::new(network::NetworkCapability::new(
                TrackerMatcher::new(config.match_mode),
                network,
            )),
        ])
    }

    /// Install every supported capability. Returns the names installed.
    /// A failing capability is logged and skipped.
    pub fn install_all(&mut self, recorder: &Recorder) -> Vec<&'static str> {
        let mut installed = Vec::new();
        for capability in self.capabilities.iter_mut() {
            if !capability.is_supported() {
                log::info!("⏭️ {} not available in this browser", capability.name());
                continue;
            }
            match capability.install(recorder) {
                Ok(()) => installed.push(capability.name()),
                Err(e) => log::warn!("⚠️ Could not hook {}: {}", capability.name(), e),
            }
        }
        log::info!("🪝 Installed hooks: {:?}", installed);
        installed
    }

    pub fn uninstall_all(&mut self) {
        for capability in self.capabilities.iter_mut() {
            if capability.is_installed() {
                capability.uninstall();
            }
        }
    }

    fn find(&self, name: &str) -> Result<&dyn Capability> {
        self.capabilities
            .iter()
            .find(|c| c.name() == name)
            .map(|c| c.as_ref())
            .ok_or_else(|| RadarError::UnknownCapability(name.to_string()))
    }

    pub fn enable(&self, name: &str) -> Result<()> {
        self.find(name)?.protection().set(true);
        log::info!("🛡️ Protection enabled: {}", name);
        Ok(())
    }

    pub fn disable(&self, name: &str) -> Result<()> {
        self.find(name)?.protection().set(false);
        log::info!("Protection disabled: {}", name);
        Ok(())
    }

    pub fn is_protected(&self, name: &str) -> Result<bool> {
        Ok(self.find(name)?.protection().is_enabled())
    }

    pub fn status(&self) -> Vec<CapabilityStatus> {
        self.capabilities
            .iter()
            .map(|c| CapabilityStatus {
                name: c.name(),
                supported: c.is_supported(),
                installed: c.is_installed(),
                protected: c.protection().is_enabled(),
            })
            .collect()
    }
}
