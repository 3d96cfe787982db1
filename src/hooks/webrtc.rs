//! WebRTC peer connections.
//!
//! ICE candidate gathering exposes local and public addresses, so creating a
//! peer connection is itself the signal. When protected the constructor
//! throws `NotAllowedError`.

use js_sys::{Array, Reflect};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use super::proxy_helpers::{self, trap};
use super::{intercept_failed, Capability, Patches, ProtectionSwitch};
use crate::error::{RadarError, Result};
use crate::monitor::Recorder;
use crate::threat::ThreatDetail;

const CONSTRUCTORS: [&str; 2] = ["RTCPeerConnection", "webkitRTCPeerConnection"];

/// Number of entries in `config.iceServers`, 0 when absent.
fn ice_server_count(config: &JsValue) -> u32 {
    if !config.is_object() {
        return 0;
    }
    Reflect::get(config, &JsValue::from_str("iceServers"))
        .ok()
        .and_then(|servers| servers.dyn_into::<Array>().ok())
        .map(|servers| servers.length())
        .unwrap_or(0)
}

pub struct WebrtcCapability {
    protection: ProtectionSwitch,
    patches: Patches,
}

impl WebrtcCapability {
    pub fn new(protected: bool) -> Self {
        Self {
            protection: ProtectionSwitch::new(protected),
            patches: Patches::default(),
        }
    }

    fn install_constructor(&mut self, name: &'static str, recorder: &Recorder) -> Result<()> {
        let rec = recorder.clone();
        let protection = self.protection.clone();
        let construct = trap(move |target, args, new_target| {
            let ice_servers = ice_server_count(&proxy_helpers::arg(&args, 0));
            rec.report(ThreatDetail::WebrtcLeak { ice_servers });
            if protection.is_enabled() {
                return Err(proxy_helpers::dom_exception(
                    "RTCPeerConnection is blocked by privacy protection",
                    "NotAllowedError",
                ));
            }
            proxy_helpers::construct_original(&target, &args, &new_target)
        });
        let guard = proxy_helpers::proxy_constructor(name, construct)
            .map_err(|e| intercept_failed(name, e))?;
        self.patches.push(guard);
        Ok(())
    }
}

impl Capability for WebrtcCapability {
    fn name(&self) -> &'static str {
        "webrtc"
    }

    fn is_supported(&self) -> bool {
        CONSTRUCTORS
            .iter()
            .any(|name| proxy_helpers::get_prototype(name).is_some())
    }

    fn install(&mut self, recorder: &Recorder) -> Result<()> {
        if self.is_installed() {
            return Ok(());
        }
        for name in CONSTRUCTORS {
            if proxy_helpers::get_prototype(name).is_none() {
                continue;
            }
            if let Err(e) = self.install_constructor(name, recorder) {
                self.patches.restore_all("webrtc");
                return Err(e);
            }
        }
        if self.patches.is_empty() {
            return Err(RadarError::Unsupported("webrtc".into()));
        }
        Ok(())
    }

    fn uninstall(&mut self) {
        self.patches.restore_all("webrtc");
    }

    fn is_installed(&self) -> bool {
        !self.patches.is_empty()
    }

    fn protection(&self) -> &ProtectionSwitch {
        &self.protection
    }
}
