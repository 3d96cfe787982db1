//! Canvas readback detection.
//!
//! `getImageData`, `toDataURL` and `toBlob` are the only ways to read pixels
//! back out of a 2D canvas. When protected, readbacks carry session-stable
//! per-pixel noise.

use js_sys::{Array, Function, Reflect, Uint8ClampedArray};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use super::proxy_helpers::{self, trap};
use super::{intercept_failed, Capability, NoiseSource, Patches, ProtectionSwitch};
use crate::error::{RadarError, Result};
use crate::monitor::Recorder;
use crate::threat::ThreatDetail;

pub struct CanvasCapability {
    noise: NoiseSource,
    protection: ProtectionSwitch,
    patches: Patches,
}

impl CanvasCapability {
    pub fn new(noise: NoiseSource, protected: bool) -> Self {
        Self {
            noise,
            protection: ProtectionSwitch::new(protected),
            patches: Patches::default(),
        }
    }
}

fn perturb_image_data(image_data: &JsValue, noise: NoiseSource) -> std::result::Result<(), JsValue> {
    let data: Uint8ClampedArray = Reflect::get(image_data, &JsValue::from_str("data"))?.unchecked_into();
    let mut buffer = vec![0u8; data.length() as usize];
    data.copy_to(&mut buffer);
    noise.perturb_pixels(&mut buffer);
    data.copy_from(&buffer);
    Ok(())
}

/// Perturb a canvas in place before it is serialized. Uses the unpatched
/// `getImageData` so the readback is not reported twice.
fn perturb_canvas(
    canvas: &JsValue,
    get_image_data: &JsValue,
    noise: NoiseSource,
) -> std::result::Result<(), JsValue> {
    let get_context: Function = Reflect::get(canvas, &JsValue::from_str("getContext"))?.unchecked_into();
    let ctx = Reflect::apply(&get_context, canvas, &Array::of1(&JsValue::from_str("2d")))?;
    if ctx.is_null() || ctx.is_undefined() {
        // WebGL-backed canvas; nothing to perturb through the 2D API
        return Ok(());
    }

    let width = Reflect::get(canvas, &JsValue::from_str("width"))?.as_f64().unwrap_or(0.0);
    let height = Reflect::get(canvas, &JsValue::from_str("height"))?.as_f64().unwrap_or(0.0);
    if width <= 0.0 || height <= 0.0 {
        return Ok(());
    }

    let region = Array::of4(
        &JsValue::from_f64(0.0),
        &JsValue::from_f64(0.0),
        &JsValue::from_f64(width),
        &JsValue::from_f64(height),
    );
    let image_data = proxy_helpers::call_function(get_image_data, &ctx, &region)?;
    perturb_image_data(&image_data, noise)?;

    let put_image_data: Function = Reflect::get(&ctx, &JsValue::from_str("putImageData"))?.unchecked_into();
    Reflect::apply(
        &put_image_data,
        &ctx,
        &Array::of3(&image_data, &JsValue::from_f64(0.0), &JsValue::from_f64(0.0)),
    )?;
    Ok(())
}

impl CanvasCapability {
    fn install_patches(&mut self, recorder: &Recorder) -> Result<()> {
        let (Some(canvas_proto), Some(ctx2d)) = (
            proxy_helpers::get_prototype("HTMLCanvasElement"),
            proxy_helpers::get_prototype("CanvasRenderingContext2D"),
        ) else {
            return Err(RadarError::Unsupported("canvas".into()));
        };

        // Captured before patching so serializer traps can read pixels silently
        let original_get_image_data = Reflect::get(&ctx2d, &JsValue::from_str("getImageData"))
            .map_err(|e| intercept_failed("getImageData", e))?;

        self.install_get_image_data(&ctx2d, recorder)?;
        self.install_serializer(
            &canvas_proto,
            "toDataURL",
            original_get_image_data.clone(),
            recorder,
        )?;
        if proxy_helpers::has_function(&canvas_proto, "toBlob") {
            self.install_serializer(&canvas_proto, "toBlob", original_get_image_data, recorder)?;
        }
        Ok(())
    }

    fn install_get_image_data(&mut self, ctx2d: &JsValue, recorder: &Recorder) -> Result<()> {
        let recorder = recorder.clone();
        let protection = self.protection.clone();
        let noise = self.noise;

        let apply = trap(move |target, this_arg, args| {
            recorder.report(ThreatDetail::CanvasFingerprint {
                method: "getImageData".into(),
            });
            let result = proxy_helpers::call_function(&target, &this_arg, &args)?;
            if protection.is_enabled() {
                perturb_image_data(&result, noise)?;
            }
            Ok(result)
        });
        let guard = proxy_helpers::proxy_method(ctx2d, "getImageData", apply)
            .map_err(|e| intercept_failed("getImageData", e))?;
        self.patches.push(guard);
        Ok(())
    }

    fn install_serializer(
        &mut self,
        canvas_proto: &JsValue,
        method: &'static str,
        get_image_data: JsValue,
        recorder: &Recorder,
    ) -> Result<()> {
        let recorder = recorder.clone();
        let protection = self.protection.clone();
        let noise = self.noise;

        let apply = trap(move |target, this_arg, args| {
            recorder.report(ThreatDetail::CanvasFingerprint {
                method: method.into(),
            });
            if protection.is_enabled() {
                if let Err(e) = perturb_canvas(&this_arg, &get_image_data, noise) {
                    log::debug!("Canvas perturbation skipped: {:?}", e);
                }
            }
            proxy_helpers::call_function(&target, &this_arg, &args)
        });
        let guard = proxy_helpers::proxy_method(canvas_proto, method, apply)
            .map_err(|e| intercept_failed(method, e))?;
        self.patches.push(guard);
        Ok(())
    }
}

impl Capability for CanvasCapability {
    fn name(&self) -> &'static str {
        "canvas"
    }

    fn is_supported(&self) -> bool {
        proxy_helpers::get_prototype("HTMLCanvasElement").is_some()
            && proxy_helpers::get_prototype("CanvasRenderingContext2D").is_some()
    }

    fn install(&mut self, recorder: &Recorder) -> Result<()> {
        if self.is_installed() {
            return Ok(());
        }
        let result = self.install_patches(recorder);
        if result.is_err() {
            self.patches.restore_all("canvas");
        }
        result
    }

    fn uninstall(&mut self) {
        self.patches.restore_all("canvas");
    }

    fn is_installed(&self) -> bool {
        !self.patches.is_empty()
    }

    fn protection(&self) -> &ProtectionSwitch {
        &self.protection
    }
}
