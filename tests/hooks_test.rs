//! Capability hook WASM integration tests
//!
//! Run with: wasm-pack test --headless --chrome
//! (or --firefox)
//!
//! Every test uninstalls what it installs; the hooks patch real globals.

#![cfg(target_arch = "wasm32")]

use js_sys::{Array, Function, Reflect};
use rand::rngs::StdRng;
use rand::SeedableRng;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use wasm_bindgen_test::*;

use privacy_radar::hooks::{HookRegistry, NoiseSource};
use privacy_radar::{RadarConfig, Session, ThreatCategory};

wasm_bindgen_test_configure!(run_in_browser);

fn session() -> Session {
    Session::new(RadarConfig::default(), Ok(StdRng::seed_from_u64(11)))
}

fn registry(session: &Session) -> HookRegistry {
    HookRegistry::browser(session.config(), NoiseSource::new(11))
}

fn count(session: &Session, category: ThreatCategory) -> usize {
    session
        .recorder()
        .store()
        .borrow()
        .all()
        .filter(|e| e.category() == category)
        .count()
}

fn call(target: &JsValue, method: &str, args: &Array) -> Result<JsValue, JsValue> {
    let f: Function = Reflect::get(target, &JsValue::from_str(method))?.unchecked_into();
    Reflect::apply(&f, target, args)
}

fn painted_canvas() -> JsValue {
    let document = Reflect::get(&js_sys::global(), &"document".into()).unwrap();
    let canvas = call(&document, "createElement", &Array::of1(&"canvas".into())).unwrap();
    Reflect::set(&canvas, &"width".into(), &JsValue::from_f64(64.0)).unwrap();
    Reflect::set(&canvas, &"height".into(), &JsValue::from_f64(64.0)).unwrap();
    let ctx = call(&canvas, "getContext", &Array::of1(&"2d".into())).unwrap();
    Reflect::set(&ctx, &"fillStyle".into(), &"#336699".into()).unwrap();
    call(
        &ctx,
        "fillRect",
        &Array::of4(&0.into(), &0.into(), &64.into(), &64.into()),
    )
    .unwrap();
    canvas
}

// ===== Canvas =====

#[wasm_bindgen_test]
fn canvas_readback_is_reported() {
    let session = session();
    let mut hooks = registry(&session);
    hooks.install_all(session.recorder());

    let canvas = painted_canvas();
    let url = call(&canvas, "toDataURL", &Array::new()).unwrap();
    assert!(url.as_string().unwrap().starts_with("data:image/png"));
    assert_eq!(count(&session, ThreatCategory::CanvasFingerprint), 1);

    hooks.uninstall_all();
    call(&canvas, "toDataURL", &Array::new()).unwrap();
    assert_eq!(
        count(&session, ThreatCategory::CanvasFingerprint),
        1,
        "restored toDataURL must not report"
    );
}

#[wasm_bindgen_test]
fn canvas_protection_perturbs_pixels() {
    let session = session();
    let mut hooks = registry(&session);
    hooks.install_all(session.recorder());

    let canvas = painted_canvas();
    let ctx = call(&canvas, "getContext", &Array::of1(&"2d".into())).unwrap();
    let region = Array::of4(&0.into(), &0.into(), &64.into(), &64.into());

    let read = |ctx: &JsValue| -> Vec<u8> {
        let image = call(ctx, "getImageData", &region).unwrap();
        let data: js_sys::Uint8ClampedArray =
            Reflect::get(&image, &"data".into()).unwrap().unchecked_into();
        data.to_vec()
    };

    let clean = read(&ctx);
    hooks.enable("canvas").unwrap();
    let noisy = read(&ctx);
    hooks.uninstall_all();

    assert_ne!(clean, noisy);
    assert!(clean.iter().zip(&noisy).all(|(a, b)| a.abs_diff(*b) <= 1));
    assert_eq!(count(&session, ThreatCategory::CanvasFingerprint), 2);
}

// ===== WebRTC =====

#[wasm_bindgen_test]
fn webrtc_blocked_when_protected() {
    let ctor = Reflect::get(&js_sys::global(), &"RTCPeerConnection".into()).unwrap();
    if ctor.is_undefined() {
        return;
    }

    let session = session();
    let mut hooks = registry(&session);
    hooks.install_all(session.recorder());
    hooks.enable("webrtc").unwrap();

    let ctor: Function = Reflect::get(&js_sys::global(), &"RTCPeerConnection".into())
        .unwrap()
        .unchecked_into();
    let result = Reflect::construct(&ctor, &Array::new());
    hooks.uninstall_all();

    assert!(result.is_err(), "RTCPeerConnection should throw");
    assert_eq!(count(&session, ThreatCategory::WebrtcLeak), 1);
}

// ===== Network =====

#[wasm_bindgen_test]
async fn tracker_fetch_is_blocked() {
    let session = session();
    let mut hooks = registry(&session);
    hooks.install_all(session.recorder());

    let fetch: Function = Reflect::get(&js_sys::global(), &"fetch".into())
        .unwrap()
        .unchecked_into();
    let promise: js_sys::Promise = Reflect::apply(
        &fetch,
        &JsValue::UNDEFINED,
        &Array::of1(&"https://www.google-analytics.com/collect?v=1".into()),
    )
    .unwrap()
    .unchecked_into();
    let outcome = JsFuture::from(promise).await;
    hooks.uninstall_all();

    assert!(outcome.is_err(), "tracker fetch should reject");
    let store = session.recorder().store().borrow();
    assert_eq!(store.trackers_blocked(), 1);
    assert_eq!(store.trackers_detected(), 1);
    let tracker = store.trackers().next().unwrap();
    assert_eq!(tracker.host, "www.google-analytics.com");
    assert!(tracker.blocked);
}

#[wasm_bindgen_test]
fn unprotected_network_reports_without_blocking() {
    let session = session();
    let mut hooks = registry(&session);
    hooks.install_all(session.recorder());
    hooks.disable("network").unwrap();

    let xhr_ctor: Function = Reflect::get(&js_sys::global(), &"XMLHttpRequest".into())
        .unwrap()
        .unchecked_into();
    let xhr = Reflect::construct(&xhr_ctor, &Array::new()).unwrap();
    let opened = call(
        &xhr,
        "open",
        &Array::of2(&"GET".into(), &"https://doubleclick.net/pixel".into()),
    );
    hooks.uninstall_all();

    assert!(opened.is_ok());
    assert_eq!(count(&session, ThreatCategory::TrackerDetected), 1);
    let store = session.recorder().store().borrow();
    assert_eq!(store.trackers_blocked(), 0);
    assert_eq!(store.trackers_detected(), 1);
    let tracker = store.trackers().next().unwrap();
    assert_eq!(tracker.host, "doubleclick.net");
    assert!(!tracker.blocked);
}

// ===== Registry =====

#[wasm_bindgen_test]
fn status_lists_every_capability() {
    let session = session();
    let hooks = registry(&session);
    let names: Vec<&str> = hooks.status().iter().map(|s| s.name).collect();
    assert_eq!(
        names,
        vec!["canvas", "webgl", "audio", "geolocation", "webrtc", "network"]
    );
    assert!(hooks.status().iter().all(|s| !s.installed));
    assert!(hooks.is_protected("network").unwrap());
}
