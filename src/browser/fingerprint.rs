//! Passive fingerprint snapshot used for the uniqueness placeholder.

use js_sys::{Array, Reflect};
use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::error::Result;
use crate::scoring::calculate_uniqueness;

/// Fields read from `navigator`, `screen` and `Intl`. Field order is the
/// canonical serialization order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FingerprintSnapshot {
    pub user_agent: String,
    pub language: String,
    pub languages: Vec<String>,
    pub platform: String,
    pub hardware_concurrency: u32,
    pub device_memory: Option<f64>,
    pub max_touch_points: u32,
    pub cookie_enabled: bool,
    pub do_not_track: Option<String>,
    pub screen_width: u32,
    pub screen_height: u32,
    pub color_depth: u32,
    pub pixel_ratio: f64,
    pub timezone: String,
    pub timezone_offset: i32,
}

fn get(target: &JsValue, prop: &str) -> JsValue {
    Reflect::get(target, &JsValue::from_str(prop)).unwrap_or(JsValue::UNDEFINED)
}

fn get_string(target: &JsValue, prop: &str) -> String {
    get(target, prop).as_string().unwrap_or_default()
}

fn get_u32(target: &JsValue, prop: &str) -> u32 {
    get(target, prop).as_f64().unwrap_or(0.0) as u32
}

fn resolved_timezone() -> String {
    let formatter = js_sys::Intl::DateTimeFormat::new(&Array::new(), &js_sys::Object::new());
    get(&formatter.resolved_options(), "timeZone")
        .as_string()
        .unwrap_or_default()
}

impl FingerprintSnapshot {
    /// Read the current browser. Missing APIs leave their defaults.
    pub fn collect() -> Self {
        let global = js_sys::global();
        let navigator = get(&global, "navigator");
        let screen = get(&global, "screen");

        let languages = get(&navigator, "languages");
        let languages = if Array::is_array(&languages) {
            Array::from(&languages)
                .iter()
                .filter_map(|l| l.as_string())
                .collect()
        } else {
            Vec::new()
        };

        Self {
            user_agent: get_string(&navigator, "userAgent"),
            language: get_string(&navigator, "language"),
            languages,
            platform: get_string(&navigator, "platform"),
            hardware_concurrency: get_u32(&navigator, "hardwareConcurrency"),
            device_memory: get(&navigator, "deviceMemory").as_f64(),
            max_touch_points: get_u32(&navigator, "maxTouchPoints"),
            cookie_enabled: get(&navigator, "cookieEnabled").as_bool().unwrap_or(false),
            do_not_track: get(&navigator, "doNotTrack").as_string(),
            screen_width: get_u32(&screen, "width"),
            screen_height: get_u32(&screen, "height"),
            color_depth: get_u32(&screen, "colorDepth"),
            pixel_ratio: get(&global, "devicePixelRatio").as_f64().unwrap_or(1.0),
            timezone: resolved_timezone(),
            timezone_offset: js_sys::Date::new_0().get_timezone_offset() as i32,
        }
    }

    /// Canonical JSON form; identical snapshots always serialize identically.
    pub fn canonical(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn uniqueness(&self) -> Result<f64> {
        Ok(calculate_uniqueness(&self.canonical()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> FingerprintSnapshot {
        FingerprintSnapshot {
            user_agent: "Mozilla/5.0 (X11; Linux x86_64)".into(),
            language: "en-US".into(),
            languages: vec!["en-US".into(), "en".into()],
            platform: "Linux x86_64".into(),
            hardware_concurrency: 8,
            device_memory: Some(8.0),
            max_touch_points: 0,
            cookie_enabled: true,
            do_not_track: None,
            screen_width: 1920,
            screen_height: 1080,
            color_depth: 24,
            pixel_ratio: 1.0,
            timezone: "Europe/Berlin".into(),
            timezone_offset: -60,
        }
    }

    #[test]
    fn test_canonical_is_stable() {
        let a = snapshot();
        let b = snapshot();
        assert_eq!(a.canonical().unwrap(), b.canonical().unwrap());
        assert_eq!(a.uniqueness().unwrap(), b.uniqueness().unwrap());
        assert!(a.canonical().unwrap().starts_with("{\"userAgent\":"));
    }

    #[test]
    fn test_uniqueness_in_range_and_sensitive() {
        let a = snapshot();
        let mut b = snapshot();
        b.screen_width = 2560;
        let ua = a.uniqueness().unwrap();
        let ub = b.uniqueness().unwrap();
        assert!((0.0..1.0).contains(&ua));
        assert!((0.0..1.0).contains(&ub));
        assert_ne!(a.canonical().unwrap(), b.canonical().unwrap());
    }
}
