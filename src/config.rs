//! Runtime configuration.
//!
//! ## Environment variables
//!
//! - `MACHINE_VIEW_TITLE`: title line of the document (default: `Machine View`)
//! - `MACHINE_VIEW_FALLBACK_HEADING`: heading for untitled slices (default: `Untitled section`)
//! - `MACHINE_VIEW_TOGGLE_KEY`: single ASCII letter that toggles the overlay (default: `m`)
//! - `MACHINE_VIEW_COPIED_MS`: how long the "copied" indicator stays on (default: 2000)
//! - `MACHINE_VIEW_PREFERENCES_PATH`: JSON file for the persisted mode (default: in-memory)
//! - `MACHINE_VIEW_CONTENT_PATH`: site content manifest to mount at startup (default: none)
//!
//! Invalid values are logged and replaced by their defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::store::{FilePreferenceStore, InMemoryPreferenceStore, PreferenceStore};

/// Default toggle key.
pub const DEFAULT_TOGGLE_KEY: char = 'm';

/// Default "copied" indicator duration in milliseconds.
pub const DEFAULT_COPIED_MS: u64 = 2000;

/// Configuration for the machine view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineViewConfig {
    /// Title line of the serialized document.
    pub document_title: String,
    /// Heading used for slices without a title.
    pub fallback_heading: String,
    /// Letter key that toggles the overlay.
    pub toggle_key: char,
    /// How long the copy confirmation stays visible, in milliseconds.
    pub copied_indicator_ms: u64,
    /// Where to persist the mode; in-memory when `None`.
    pub preferences_path: Option<PathBuf>,
    /// Site content manifest mounted at startup.
    pub content_path: Option<PathBuf>,
}

impl Default for MachineViewConfig {
    fn default() -> Self {
        Self {
            document_title: "Machine View".to_string(),
            fallback_heading: "Untitled section".to_string(),
            toggle_key: DEFAULT_TOGGLE_KEY,
            copied_indicator_ms: DEFAULT_COPIED_MS,
            preferences_path: None,
            content_path: None,
        }
    }
}

impl MachineViewConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(title) = lookup("MACHINE_VIEW_TITLE").filter(|s| !s.trim().is_empty()) {
            config.document_title = title;
        }

        if let Some(heading) = lookup("MACHINE_VIEW_FALLBACK_HEADING").filter(|s| !s.trim().is_empty()) {
            config.fallback_heading = heading;
        }

        if let Some(raw) = lookup("MACHINE_VIEW_TOGGLE_KEY") {
            match parse_toggle_key(&raw) {
                Some(key) => config.toggle_key = key,
                None => tracing::warn!(
                    value = %raw,
                    "MACHINE_VIEW_TOGGLE_KEY must be a single ASCII letter, using default"
                ),
            }
        }

        if let Some(raw) = lookup("MACHINE_VIEW_COPIED_MS") {
            match raw.trim().parse::<u64>() {
                Ok(ms) => config.copied_indicator_ms = ms,
                Err(e) => tracing::warn!(
                    value = %raw,
                    error = %e,
                    "MACHINE_VIEW_COPIED_MS is not a number, using default"
                ),
            }
        }

        config.preferences_path = lookup("MACHINE_VIEW_PREFERENCES_PATH")
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);
        config.content_path = lookup("MACHINE_VIEW_CONTENT_PATH")
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);

        config
    }

    /// The copied-indicator duration.
    pub fn copied_indicator(&self) -> Duration {
        Duration::from_millis(self.copied_indicator_ms)
    }

    /// Build the preference store this config selects.
    pub fn preference_store(&self) -> Arc<dyn PreferenceStore> {
        match &self.preferences_path {
            Some(path) => Arc::new(FilePreferenceStore::new(path.clone())),
            None => Arc::new(InMemoryPreferenceStore::new()),
        }
    }
}

fn parse_toggle_key(raw: &str) -> Option<char> {
    let mut chars = raw.trim().chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_alphabetic() => Some(c.to_ascii_lowercase()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = MachineViewConfig::from_lookup(lookup(&[]));
        assert_eq!(config, MachineViewConfig::default());
        assert_eq!(config.copied_indicator(), Duration::from_millis(2000));
    }

    #[test]
    fn test_reads_values() {
        let config = MachineViewConfig::from_lookup(lookup(&[
            ("MACHINE_VIEW_TITLE", "Site for agents"),
            ("MACHINE_VIEW_TOGGLE_KEY", "K"),
            ("MACHINE_VIEW_COPIED_MS", "500"),
            ("MACHINE_VIEW_PREFERENCES_PATH", "/tmp/prefs.json"),
        ]));
        assert_eq!(config.document_title, "Site for agents");
        assert_eq!(config.toggle_key, 'k');
        assert_eq!(config.copied_indicator_ms, 500);
        assert_eq!(config.preferences_path, Some(PathBuf::from("/tmp/prefs.json")));
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = MachineViewConfig::from_lookup(lookup(&[
            ("MACHINE_VIEW_TOGGLE_KEY", "ctrl+m"),
            ("MACHINE_VIEW_COPIED_MS", "soon"),
            ("MACHINE_VIEW_TITLE", "   "),
        ]));
        assert_eq!(config.toggle_key, DEFAULT_TOGGLE_KEY);
        assert_eq!(config.copied_indicator_ms, DEFAULT_COPIED_MS);
        assert_eq!(config.document_title, "Machine View");
    }

    #[test]
    fn test_deserializes_partial_json() {
        let config: MachineViewConfig = serde_json::from_str(r#"{"toggle_key":"x"}"#).unwrap();
        assert_eq!(config.toggle_key, 'x');
        assert_eq!(config.fallback_heading, "Untitled section");
    }
}
