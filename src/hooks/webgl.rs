//! WebGL vendor/renderer probing.
//!
//! Only the identifying `getParameter` queries are reported; ordinary render
//! state reads would drown the radar.

use js_sys::Reflect;
use wasm_bindgen::prelude::*;

use super::proxy_helpers::{self, trap};
use super::{intercept_failed, Capability, Patches, ProtectionSwitch};
use crate::error::{RadarError, Result};
use crate::monitor::Recorder;
use crate::threat::ThreatDetail;

pub const GL_VENDOR: u32 = 0x1F00;
pub const GL_RENDERER: u32 = 0x1F01;
pub const UNMASKED_VENDOR_WEBGL: u32 = 0x9245;
pub const UNMASKED_RENDERER_WEBGL: u32 = 0x9246;

pub const SPOOFED_VENDOR: &str = "WebKit";
pub const SPOOFED_RENDERER: &str = "WebKit WebGL";

const DEBUG_RENDERER_INFO: &str = "WEBGL_debug_renderer_info";

const CONTEXTS: [&str; 2] = ["WebGLRenderingContext", "WebGL2RenderingContext"];

/// Whether a `getParameter` enum identifies the GPU.
pub fn is_identifying(parameter: u32) -> bool {
    matches!(
        parameter,
        GL_VENDOR | GL_RENDERER | UNMASKED_VENDOR_WEBGL | UNMASKED_RENDERER_WEBGL
    )
}

/// Replacement value for an identifying parameter.
pub fn spoofed_value(parameter: u32) -> Option<&'static str> {
    match parameter {
        GL_VENDOR | UNMASKED_VENDOR_WEBGL => Some(SPOOFED_VENDOR),
        GL_RENDERER | UNMASKED_RENDERER_WEBGL => Some(SPOOFED_RENDERER),
        _ => None,
    }
}

pub struct WebglCapability {
    protection: ProtectionSwitch,
    patches: Patches,
}

impl WebglCapability {
    pub fn new(protected: bool) -> Self {
        Self {
            protection: ProtectionSwitch::new(protected),
            patches: Patches::default(),
        }
    }

    fn install_context(&mut self, proto: &JsValue, recorder: &Recorder) -> Result<()> {
        let rec = recorder.clone();
        let protection = self.protection.clone();
        let get_parameter = trap(move |target, this_arg, args| {
            let parameter = proxy_helpers::arg(&args, 0).as_f64().unwrap_or(0.0) as u32;
            if is_identifying(parameter) {
                rec.report(ThreatDetail::WebglFingerprint { parameter });
                if protection.is_enabled() {
                    if let Some(value) = spoofed_value(parameter) {
                        return Ok(JsValue::from_str(value));
                    }
                }
            }
            proxy_helpers::call_function(&target, &this_arg, &args)
        });
        let guard = proxy_helpers::proxy_method(proto, "getParameter", get_parameter)
            .map_err(|e| intercept_failed("getParameter", e))?;
        self.patches.push(guard);

        let rec = recorder.clone();
        let protection = self.protection.clone();
        let get_extension = trap(move |target, this_arg, args| {
            let name = proxy_helpers::arg(&args, 0).as_string();
            if name.as_deref() == Some(DEBUG_RENDERER_INFO) {
                rec.report(ThreatDetail::WebglFingerprint { parameter: 0 });
                if protection.is_enabled() {
                    return Ok(JsValue::NULL);
                }
            }
            proxy_helpers::call_function(&target, &this_arg, &args)
        });
        let guard = proxy_helpers::proxy_method(proto, "getExtension", get_extension)
            .map_err(|e| intercept_failed("getExtension", e))?;
        self.patches.push(guard);
        Ok(())
    }
}

impl Capability for WebglCapability {
    fn name(&self) -> &'static str {
        "webgl"
    }

    fn is_supported(&self) -> bool {
        CONTEXTS
            .iter()
            .any(|name| proxy_helpers::get_prototype(name).is_some())
    }

    fn install(&mut self, recorder: &Recorder) -> Result<()> {
        if self.is_installed() {
            return Ok(());
        }
        for name in CONTEXTS {
            let Some(proto) = proxy_helpers::get_prototype(name) else {
                continue;
            };
            // WebGL2RenderingContext does not inherit from the WebGL1 prototype
            if Reflect::has(&proto, &JsValue::from_str("getParameter")).unwrap_or(false) {
                if let Err(e) = self.install_context(&proto, recorder) {
                    self.patches.restore_all("webgl");
                    return Err(e);
                }
            }
        }
        if self.patches.is_empty() {
            return Err(RadarError::Unsupported("webgl".into()));
        }
        Ok(())
    }

    fn uninstall(&mut self) {
        self.patches.restore_all("webgl");
    }

    fn is_installed(&self) -> bool {
        !self.patches.is_empty()
    }

    fn protection(&self) -> &ProtectionSwitch {
        &self.protection
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifying_parameters() {
        assert!(is_identifying(UNMASKED_RENDERER_WEBGL));
        assert!(is_identifying(GL_VENDOR));
        // MAX_TEXTURE_SIZE
        assert!(!is_identifying(0x0D33));
    }

    #[test]
    fn test_spoofed_values() {
        assert_eq!(spoofed_value(UNMASKED_VENDOR_WEBGL), Some(SPOOFED_VENDOR));
        assert_eq!(spoofed_value(GL_RENDERER), Some(SPOOFED_RENDERER));
        assert_eq!(spoofed_value(0x0D33), None);
    }
}
