//! Requests to listed tracker hosts via `fetch`, `XMLHttpRequest` and
//! `navigator.sendBeacon`.
//!
//! Every match is reported as a `tracker_detected` threat and enters the
//! tracker buffer, flagged `blocked` only when network protection is on.

use js_sys::{Promise, Reflect};
use wasm_bindgen::prelude::*;

use super::proxy_helpers::{self, trap};
use super::{intercept_failed, Capability, Patches, ProtectionSwitch};
use crate::error::{RadarError, Result};
use crate::monitor::Recorder;
use crate::threat::ThreatDetail;
use crate::trackers::TrackerMatcher;

/// Best-effort request URL: a string, or anything with a `url` property
/// (`Request`) or a useful `toString` (`URL`).
fn request_url(input: &JsValue) -> Option<String> {
    if let Some(url) = input.as_string() {
        return Some(url);
    }
    if input.is_object() {
        if let Some(url) = Reflect::get(input, &JsValue::from_str("url"))
            .ok()
            .and_then(|u| u.as_string())
        {
            return Some(url);
        }
        if let Some(href) = Reflect::get(input, &JsValue::from_str("href"))
            .ok()
            .and_then(|u| u.as_string())
        {
            return Some(href);
        }
    }
    None
}

/// Decides and records the fate of one outgoing request.
#[derive(Clone)]
struct Gate {
    matcher: TrackerMatcher,
    protection: ProtectionSwitch,
    recorder: Recorder,
}

impl Gate {
    /// Returns true when the request must be blocked.
    fn should_block(&self, input: &JsValue) -> bool {
        let Some(url) = request_url(input) else {
            return false;
        };
        let Some(host) = self.matcher.match_url(&url) else {
            return false;
        };

        let blocked = self.protection.is_enabled();
        if let Err(e) = self.recorder.record_tracker(&url, &host, blocked) {
            log::warn!("Tracker event dropped: {}", e);
        }
        self.recorder.report(ThreatDetail::TrackerDetected { host });
        blocked
    }
}

pub struct NetworkCapability {
    matcher: TrackerMatcher,
    protection: ProtectionSwitch,
    patches: Patches,
}

impl NetworkCapability {
    pub fn new(matcher: TrackerMatcher, protected: bool) -> Self {
        Self {
            matcher,
            protection: ProtectionSwitch::new(protected),
            patches: Patches::default(),
        }
    }

    fn gate(&self, recorder: &Recorder) -> Gate {
        Gate {
            matcher: self.matcher.clone(),
            protection: self.protection.clone(),
            recorder: recorder.clone(),
        }
    }

    fn install_patches(&mut self, recorder: &Recorder) -> Result<()> {
        let global = js_sys::global();

        if proxy_helpers::has_function(&global, "fetch") {
            let gate = self.gate(recorder);
            let fetch = trap(move |target, this_arg, args| {
                if gate.should_block(&proxy_helpers::arg(&args, 0)) {
                    let error: JsValue = js_sys::TypeError::new("Failed to fetch").into();
                    return Ok(Promise::reject(&error).into());
                }
                proxy_helpers::call_function(&target, &this_arg, &args)
            });
            let guard = proxy_helpers::proxy_method(&global, "fetch", fetch)
                .map_err(|e| intercept_failed("fetch", e))?;
            self.patches.push(guard);
        }

        if let Some(xhr) = proxy_helpers::get_prototype("XMLHttpRequest") {
            let gate = self.gate(recorder);
            let open = trap(move |target, this_arg, args| {
                if gate.should_block(&proxy_helpers::arg(&args, 1)) {
                    return Err(proxy_helpers::dom_exception(
                        "Request to tracker blocked by privacy protection",
                        "NetworkError",
                    ));
                }
                proxy_helpers::call_function(&target, &this_arg, &args)
            });
            let guard = proxy_helpers::proxy_method(&xhr, "open", open)
                .map_err(|e| intercept_failed("XMLHttpRequest.open", e))?;
            self.patches.push(guard);
        }

        if let Some(navigator) = proxy_helpers::get_prototype("Navigator") {
            if proxy_helpers::has_function(&navigator, "sendBeacon") {
                let gate = self.gate(recorder);
                let beacon = trap(move |target, this_arg, args| {
                    if gate.should_block(&proxy_helpers::arg(&args, 0)) {
                        // sendBeacon reports refusal with `false`, not an exception
                        return Ok(JsValue::FALSE);
                    }
                    proxy_helpers::call_function(&target, &this_arg, &args)
                });
                let guard = proxy_helpers::proxy_method(&navigator, "sendBeacon", beacon)
                    .map_err(|e| intercept_failed("sendBeacon", e))?;
                self.patches.push(guard);
            }
        }

        if self.patches.is_empty() {
            return Err(RadarError::Unsupported("network".into()));
        }
        Ok(())
    }
}

impl Capability for NetworkCapability {
    fn name(&self) -> &'static str {
        "network"
    }

    fn is_supported(&self) -> bool {
        proxy_helpers::has_function(&js_sys::global(), "fetch")
            || proxy_helpers::get_prototype("XMLHttpRequest").is_some()
    }

    fn install(&mut self, recorder: &Recorder) -> Result<()> {
        if self.is_installed() {
            return Ok(());
        }
        let result = self.install_patches(recorder);
        if result.is_err() {
            self.patches.restore_all("network");
        }
        result
    }

    fn uninstall(&mut self) {
        self.patches.restore_all("network");
    }

    fn is_installed(&self) -> bool {
        !self.patches.is_empty()
    }

    fn protection(&self) -> &ProtectionSwitch {
        &self.protection
    }
}
