//! Theme preference persisted in localStorage.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{RadarError, Result};

pub const THEME_STORAGE_KEY: &str = "privacy-radar-theme";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemePreference {
    #[default]
    Auto,
    Light,
    Dark,
}

impl ThemePreference {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThemePreference::Auto => "auto",
            ThemePreference::Light => "light",
            ThemePreference::Dark => "dark",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "auto" => Some(ThemePreference::Auto),
            "light" => Some(ThemePreference::Light),
            "dark" => Some(ThemePreference::Dark),
            _ => None,
        }
    }

    /// Parse a stored value, treating anything unknown as `Auto`.
    pub fn from_stored(value: Option<&str>) -> Self {
        match value {
            Some(v) => Self::parse(v).unwrap_or_else(|| {
                log::warn!("⚠️ Ignoring unknown theme {:?}", v);
                ThemePreference::Auto
            }),
            None => ThemePreference::Auto,
        }
    }
}

impl fmt::Display for ThemePreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// localStorage-backed theme persistence.
#[derive(Debug, Clone)]
pub struct ThemeStore {
    storage_key: String,
}

impl ThemeStore {
    pub fn new() -> Self {
        Self {
            storage_key: THEME_STORAGE_KEY.to_string(),
        }
    }

    fn storage() -> Result<web_sys::Storage> {
        let window = web_sys::window().ok_or_else(|| RadarError::Storage("No window".into()))?;
        window
            .local_storage()
            .map_err(|_| RadarError::Storage("localStorage not available".into()))?
            .ok_or_else(|| RadarError::Storage("localStorage is null".into()))
    }

    /// Load the saved theme. Never fails: unreadable storage means `Auto`.
    pub fn load(&self) -> ThemePreference {
        let stored = match Self::storage().map(|s| s.get_item(&self.storage_key)) {
            Ok(Ok(value)) => value,
            Ok(Err(e)) => {
                log::warn!("⚠️ Failed to read theme: {:?}", e);
                None
            }
            Err(e) => {
                log::warn!("⚠️ {}", e);
                None
            }
        };
        ThemePreference::from_stored(stored.as_deref())
    }

    pub fn save(&self, theme: ThemePreference) -> Result<()> {
        Self::storage()?
            .set_item(&self.storage_key, theme.as_str())
            .map_err(|_| RadarError::Storage("Failed to save theme".into()))?;
        log::info!("💾 Saved theme: {}", theme);
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        Self::storage()?
            .remove_item(&self.storage_key)
            .map_err(|_| RadarError::Storage("Failed to clear theme".into()))?;
        Ok(())
    }
}

impl Default for ThemeStore {
    fn default() -> Self {
        Self::new()
    }
}
