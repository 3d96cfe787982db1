//! Read-only views of the hosting browser.

pub mod fingerprint;
pub mod permissions;

pub use fingerprint::FingerprintSnapshot;
pub use permissions::BrowserPermissions;

/// Whether the page was served over `https:`.
pub fn is_secure_transport() -> bool {
    web_sys::window()
        .and_then(|w| w.location().protocol().ok())
        .map(|protocol| protocol == "https:")
        .unwrap_or(false)
}
