// Storage module for the one preference that outlives a session
//
// Threat history is deliberately in-memory only; the theme choice is the
// sole value written to localStorage.

mod theme;

pub use theme::{ThemePreference, ThemeStore, THEME_STORAGE_KEY};
