//! Audio fingerprinting detection.
//!
//! Audio fingerprints render a known signal through an `OfflineAudioContext`
//! and read the analyser output. Both ends are hooked.

use js_sys::{Float32Array, Uint8Array};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use super::proxy_helpers::{self, trap};
use super::{intercept_failed, Capability, NoiseSource, Patches, ProtectionSwitch};
use crate::error::{RadarError, Result};
use crate::monitor::Recorder;
use crate::threat::ThreatDetail;

pub struct AudioCapability {
    noise: NoiseSource,
    protection: ProtectionSwitch,
    patches: Patches,
}

impl AudioCapability {
    pub fn new(noise: NoiseSource, protected: bool) -> Self {
        Self {
            noise,
            protection: ProtectionSwitch::new(protected),
            patches: Patches::default(),
        }
    }

    fn install_patches(&mut self, recorder: &Recorder) -> Result<()> {
        let analyser = proxy_helpers::get_prototype("AnalyserNode")
            .ok_or_else(|| RadarError::Unsupported("AnalyserNode".into()))?;

        let rec = recorder.clone();
        let protection = self.protection.clone();
        let noise = self.noise;
        let float_trap = trap(move |target, this_arg, args| {
            rec.report(ThreatDetail::AudioFingerprint {
                api: "getFloatFrequencyData".into(),
            });
            proxy_helpers::call_function(&target, &this_arg, &args)?;
            if protection.is_enabled() {
                if let Ok(bins) = proxy_helpers::arg(&args, 0).dyn_into::<Float32Array>() {
                    let mut buffer = vec![0f32; bins.length() as usize];
                    bins.copy_to(&mut buffer);
                    noise.jitter_floats(&mut buffer);
                    bins.copy_from(&buffer);
                }
            }
            Ok(JsValue::UNDEFINED)
        });
        let guard = proxy_helpers::proxy_method(&analyser, "getFloatFrequencyData", float_trap)
            .map_err(|e| intercept_failed("getFloatFrequencyData", e))?;
        self.patches.push(guard);

        let rec = recorder.clone();
        let protection = self.protection.clone();
        let byte_trap = trap(move |target, this_arg, args| {
            rec.report(ThreatDetail::AudioFingerprint {
                api: "getByteFrequencyData".into(),
            });
            proxy_helpers::call_function(&target, &this_arg, &args)?;
            if protection.is_enabled() {
                if let Ok(bins) = proxy_helpers::arg(&args, 0).dyn_into::<Uint8Array>() {
                    let mut buffer = vec![0u8; bins.length() as usize];
                    bins.copy_to(&mut buffer);
                    noise.jitter_bytes(&mut buffer);
                    bins.copy_from(&buffer);
                }
            }
            Ok(JsValue::UNDEFINED)
        });
        let guard = proxy_helpers::proxy_method(&analyser, "getByteFrequencyData", byte_trap)
            .map_err(|e| intercept_failed("getByteFrequencyData", e))?;
        self.patches.push(guard);

        if proxy_helpers::get_prototype("OfflineAudioContext").is_some() {
            let rec = recorder.clone();
            let construct = trap(move |target, args, new_target| {
                rec.report(ThreatDetail::AudioFingerprint {
                    api: "OfflineAudioContext".into(),
                });
                proxy_helpers::construct_original(&target, &args, &new_target)
            });
            let guard = proxy_helpers::proxy_constructor("OfflineAudioContext", construct)
                .map_err(|e| intercept_failed("OfflineAudioContext", e))?;
            self.patches.push(guard);
        }
        Ok(())
    }
}

impl Capability for AudioCapability {
    fn name(&self) -> &'static str {
        "audio"
    }

    fn is_supported(&self) -> bool {
        proxy_helpers::get_prototype("AnalyserNode").is_some()
    }

    fn install(&mut self, recorder: &Recorder) -> Result<()> {
        if self.is_installed() {
            return Ok(());
        }
        let result = self.install_patches(recorder);
        if result.is_err() {
            self.patches.restore_all("audio");
        }
        result
    }

    fn uninstall(&mut self) {
        self.patches.restore_all("audio");
    }

    fn is_installed(&self) -> bool {
        !self.patches.is_empty()
    }

    fn protection(&self) -> &ProtectionSwitch {
        &self.protection
    }
}
