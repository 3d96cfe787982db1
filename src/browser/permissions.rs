//! `navigator.permissions` probe.
//!
//! Each query races a timer: a browser that never settles the promise (some
//! embedded webviews) must not stall the refresh loop.

use async_trait::async_trait;
use futures::FutureExt;
use js_sys::{Object, Promise, Reflect};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

use crate::error::{RadarError, Result};
use crate::scoring::{PermissionName, PermissionProbe, PermissionState};

#[derive(Debug, Clone)]
pub struct BrowserPermissions {
    timeout_ms: u32,
}

impl BrowserPermissions {
    pub fn new(timeout_ms: u32) -> Self {
        Self { timeout_ms }
    }

    /// The `navigator.permissions` object, if the API exists.
    fn permissions() -> Option<JsValue> {
        let navigator = Reflect::get(&js_sys::global(), &JsValue::from_str("navigator")).ok()?;
        let permissions = Reflect::get(&navigator, &JsValue::from_str("permissions")).ok()?;
        if permissions.is_object() {
            Some(permissions)
        } else {
            None
        }
    }

    fn start_query(permissions: &JsValue, name: PermissionName) -> Result<Promise> {
        let query_failed = |reason: String| RadarError::QueryFailed {
            name: name.as_str().to_string(),
            reason,
        };

        let query: js_sys::Function = Reflect::get(permissions, &JsValue::from_str("query"))
            .ok()
            .and_then(|q| q.dyn_into().ok())
            .ok_or_else(|| RadarError::Unsupported("permissions.query".into()))?;

        let descriptor = Object::new();
        Reflect::set(&descriptor, &JsValue::from_str("name"), &JsValue::from_str(name.as_str()))
            .map_err(|e| query_failed(format!("{:?}", e)))?;

        // Unknown permission names throw synchronously in some browsers
        query
            .call1(permissions, &descriptor)
            .map_err(|e| query_failed(format!("{:?}", e)))?
            .dyn_into::<Promise>()
            .map_err(|_| query_failed("query did not return a promise".into()))
    }
}

#[async_trait(?Send)]
impl PermissionProbe for BrowserPermissions {
    async fn query(&self, name: PermissionName) -> Result<PermissionState> {
        let Some(permissions) = Self::permissions() else {
            return Ok(PermissionState::Unsupported);
        };
        let promise = match Self::start_query(&permissions, name) {
            Err(RadarError::Unsupported(_)) => return Ok(PermissionState::Unsupported),
            other => other?,
        };

        let mut status = JsFuture::from(promise).fuse();
        let mut timeout = gloo_timers::future::TimeoutFuture::new(self.timeout_ms).fuse();

        let status = futures::select_biased! {
            result = status => result.map_err(|e| RadarError::QueryFailed {
                name: name.as_str().to_string(),
                reason: format!("{:?}", e),
            })?,
            _ = timeout => {
                return Err(RadarError::QueryTimeout(name.as_str().to_string()));
            }
        };

        let state = Reflect::get(&status, &JsValue::from_str("state"))
            .ok()
            .and_then(|s| s.as_string())
            .unwrap_or_default();
        Ok(PermissionState::parse(&state))
    }
}
