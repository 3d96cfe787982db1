//! Permission grant snapshot.
//!
//! Each permission is queried on its own. A failed or unsupported query only
//! affects that permission, which is then counted as not granted.

use async_trait::async_trait;
use serde::Serialize;

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionName {
    Camera,
    Microphone,
    Geolocation,
    Notifications,
}

impl PermissionName {
    pub const ALL: [PermissionName; 4] = [
        PermissionName::Camera,
        PermissionName::Microphone,
        PermissionName::Geolocation,
        PermissionName::Notifications,
    ];

    /// Name accepted by `navigator.permissions.query`
    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionName::Camera => "camera",
            PermissionName::Microphone => "microphone",
            PermissionName::Geolocation => "geolocation",
            PermissionName::Notifications => "notifications",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionState {
    Granted,
    Denied,
    Prompt,
    /// The browser cannot answer for this permission
    Unsupported,
}

impl PermissionState {
    pub fn parse(state: &str) -> Self {
        match state {
            "granted" => PermissionState::Granted,
            "denied" => PermissionState::Denied,
            "prompt" => PermissionState::Prompt,
            _ => PermissionState::Unsupported,
        }
    }
}

/// Source of permission states. The browser implementation lives in
/// `browser::permissions`; tests supply their own.
#[async_trait(?Send)]
pub trait PermissionProbe {
    async fn query(&self, name: PermissionName) -> Result<PermissionState>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PermissionSnapshot {
    states: Vec<(PermissionName, PermissionState)>,
}

impl PermissionSnapshot {
    /// Snapshot used before the first query completes
    pub fn unknown() -> Self {
        Self {
            states: PermissionName::ALL
                .iter()
                .map(|n| (*n, PermissionState::Unsupported))
                .collect(),
        }
    }

    pub fn from_states(states: Vec<(PermissionName, PermissionState)>) -> Self {
        Self { states }
    }

    pub fn state(&self, name: PermissionName) -> PermissionState {
        self.states
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, s)| *s)
            .unwrap_or(PermissionState::Unsupported)
    }

    pub fn is_granted(&self, name: PermissionName) -> bool {
        self.state(name) == PermissionState::Granted
    }

    pub fn granted_count(&self) -> usize {
        self.states
            .iter()
            .filter(|(_, s)| *s == PermissionState::Granted)
            .count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(PermissionName, PermissionState)> {
        self.states.iter()
    }
}

impl Default for PermissionSnapshot {
    fn default() -> Self {
        Self::unknown()
    }
}

/// Query every tracked permission, tolerating individual failures.
pub async fn collect_permissions(probe: &dyn PermissionProbe) -> PermissionSnapshot {
    let mut states = Vec::with_capacity(PermissionName::ALL.len());
    for name in PermissionName::ALL {
        let state = match probe.query(name).await {
            Ok(state) => state,
            Err(e) => {
                log::warn!("⚠️ Permission query for {} failed: {}", name.as_str(), e);
                PermissionState::Unsupported
            }
        };
        states.push((name, state));
    }

    let snapshot = PermissionSnapshot::from_states(states);
    log::debug!("Permission snapshot: {} granted", snapshot.granted_count());
    snapshot
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RadarError;
    use futures::executor::block_on;

    struct FakeProbe;

    #[async_trait(?Send)]
    impl PermissionProbe for FakeProbe {
        async fn query(&self, name: PermissionName) -> Result<PermissionState> {
            match name {
                PermissionName::Camera => Ok(PermissionState::Granted),
                PermissionName::Microphone => Err(RadarError::QueryFailed {
                    name: name.as_str().into(),
                    reason: "TypeError".into(),
                }),
                PermissionName::Geolocation => Ok(PermissionState::Granted),
                PermissionName::Notifications => Err(RadarError::QueryTimeout(name.as_str().into())),
            }
        }
    }

    #[test]
    fn test_failures_do_not_abort_batch() {
        let snapshot = block_on(collect_permissions(&FakeProbe));
        assert_eq!(snapshot.iter().count(), 4);
        assert!(snapshot.is_granted(PermissionName::Camera));
        assert!(snapshot.is_granted(PermissionName::Geolocation));
        assert!(!snapshot.is_granted(PermissionName::Microphone));
        assert_eq!(
            snapshot.state(PermissionName::Notifications),
            PermissionState::Unsupported
        );
        assert_eq!(snapshot.granted_count(), 2);
    }

    #[test]
    fn test_state_parsing() {
        assert_eq!(PermissionState::parse("granted"), PermissionState::Granted);
        assert_eq!(PermissionState::parse("prompt"), PermissionState::Prompt);
        assert_eq!(PermissionState::parse("weird"), PermissionState::Unsupported);
    }

    #[test]
    fn test_unknown_snapshot_grants_nothing() {
        assert_eq!(PermissionSnapshot::unknown().granted_count(), 0);
    }
}
