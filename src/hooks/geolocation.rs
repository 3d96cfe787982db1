//! Geolocation access.
//!
//! When protected, requests fail the same way a user denial does: the error
//! callback receives a `PERMISSION_DENIED` position error.

use js_sys::{Function, Object, Reflect};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use super::proxy_helpers::{self, trap};
use super::{intercept_failed, Capability, Patches, ProtectionSwitch};
use crate::error::{RadarError, Result};
use crate::monitor::Recorder;
use crate::threat::ThreatDetail;

const PERMISSION_DENIED: f64 = 1.0;

fn permission_denied_error() -> std::result::Result<JsValue, JsValue> {
    let error = Object::new();
    Reflect::set(&error, &"code".into(), &JsValue::from_f64(PERMISSION_DENIED))?;
    Reflect::set(&error, &"message".into(), &"User denied Geolocation".into())?;
    Reflect::set(&error, &"PERMISSION_DENIED".into(), &JsValue::from_f64(PERMISSION_DENIED))?;
    Ok(error.into())
}

/// Invoke the page's error callback, if it passed one.
fn deny(args: &JsValue) -> std::result::Result<(), JsValue> {
    if let Ok(on_error) = proxy_helpers::arg(args, 1).dyn_into::<Function>() {
        on_error.call1(&JsValue::UNDEFINED, &permission_denied_error()?)?;
    }
    Ok(())
}

pub struct GeolocationCapability {
    protection: ProtectionSwitch,
    patches: Patches,
}

impl GeolocationCapability {
    pub fn new(protected: bool) -> Self {
        Self {
            protection: ProtectionSwitch::new(protected),
            patches: Patches::default(),
        }
    }

    fn install_method(
        &mut self,
        proto: &JsValue,
        method: &'static str,
        continuous: bool,
        recorder: &Recorder,
    ) -> Result<()> {
        let rec = recorder.clone();
        let protection = self.protection.clone();
        let apply = trap(move |target, this_arg, args| {
            rec.report(ThreatDetail::GeolocationAccess { continuous });
            if protection.is_enabled() {
                deny(&args)?;
                // watchPosition must still hand back a watch id
                return Ok(if continuous {
                    JsValue::from_f64(0.0)
                } else {
                    JsValue::UNDEFINED
                });
            }
            proxy_helpers::call_function(&target, &this_arg, &args)
        });
        let guard = proxy_helpers::proxy_method(proto, method, apply)
            .map_err(|e| intercept_failed(method, e))?;
        self.patches.push(guard);
        Ok(())
    }

    fn install_patches(&mut self, recorder: &Recorder) -> Result<()> {
        let proto = proxy_helpers::get_prototype("Geolocation")
            .ok_or_else(|| RadarError::Unsupported("geolocation".into()))?;
        self.install_method(&proto, "getCurrentPosition", false, recorder)?;
        self.install_method(&proto, "watchPosition", true, recorder)?;
        Ok(())
    }
}

impl Capability for GeolocationCapability {
    fn name(&self) -> &'static str {
        "geolocation"
    }

    fn is_supported(&self) -> bool {
        proxy_helpers::get_prototype("Geolocation").is_some()
    }

    fn install(&mut self, recorder: &Recorder) -> Result<()> {
        if self.is_installed() {
            return Ok(());
        }
        let result = self.install_patches(recorder);
        if result.is_err() {
            self.patches.restore_all("geolocation");
        }
        result
    }

    fn uninstall(&mut self) {
        self.patches.restore_all("geolocation");
    }

    fn is_installed(&self) -> bool {
        !self.patches.is_empty()
    }

    fn protection(&self) -> &ProtectionSwitch {
        &self.protection
    }
}
