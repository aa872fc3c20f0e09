//! Layered configuration for the coordination layer.
//!
//! Three layers, in priority order:
//!
//! 1. **Compiled defaults**: [`CoordSettings::default()`]
//! 2. **JSON file**: deep-merged over defaults
//! 3. **Environment variables**: `HIVE_*` overrides (highest priority)
//!
//! There is no ambient singleton: the loaded value is constructed once and
//! passed to whatever owns it.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Settings load failures.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// File could not be read.
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),

    /// File contents were not valid JSON for the settings shape.
    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Inbox polling and rendering knobs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InboxSettings {
    /// Per-query row cap when polling.
    pub poll_limit: u32,
    /// Byte budget for rendered injection content.
    pub content_clip: usize,
    /// Byte budget for rendered link source content.
    pub link_clip: usize,
}

impl Default for InboxSettings {
    fn default() -> Self {
        Self {
            poll_limit: 10,
            content_clip: 1000,
            link_clip: 500,
        }
    }
}

/// Rate limiting knobs for network-facing calls.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RateSettings {
    /// Requests allowed per window.
    pub limit: u32,
    /// Window length in milliseconds.
    pub window_ms: u64,
}

impl Default for RateSettings {
    fn default() -> Self {
        Self {
            limit: 60,
            window_ms: 60_000,
        }
    }
}

/// Relevance ranking knobs for knowledge recall.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RelevanceSettings {
    /// Minimum match fraction to keep a candidate.
    pub threshold: f64,
    /// Maximum results returned.
    pub top_n: usize,
    /// Knowledge rows scanned per recall.
    pub scan_limit: u32,
}

impl Default for RelevanceSettings {
    fn default() -> Self {
        Self {
            threshold: 0.25,
            top_n: 3,
            scan_limit: 50,
        }
    }
}

/// Root settings object.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CoordSettings {
    /// Inbox knobs.
    pub inbox: InboxSettings,
    /// Rate limiting knobs.
    pub rate: RateSettings,
    /// Relevance knobs.
    pub relevance: RelevanceSettings,
}

/// Recursively merge `overlay` into `base`. Objects merge key-wise;
/// everything else is replaced by the overlay value.
pub fn deep_merge(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        let _ = base_map.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (base_slot, _) => *base_slot = overlay.clone(),
    }
}

/// Load settings from a JSON file, deep-merged over defaults, with env
/// overrides applied last.
pub fn load_settings_from_path(path: &Path) -> Result<CoordSettings, SettingsError> {
    let mut base = serde_json::to_value(CoordSettings::default())?;
    let raw = std::fs::read_to_string(path)?;
    let overlay: Value = serde_json::from_str(&raw)?;
    deep_merge(&mut base, &overlay);
    let mut settings: CoordSettings = serde_json::from_value(base)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Defaults plus env overrides, for deployments with no settings file.
#[must_use]
pub fn load_settings() -> CoordSettings {
    let mut settings = CoordSettings::default();
    apply_env_overrides(&mut settings);
    settings
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(var = name, value = %raw, "ignoring unparseable env override");
            None
        }
    }
}

fn apply_env_overrides(settings: &mut CoordSettings) {
    if let Some(v) = env_parse("HIVE_INBOX_POLL_LIMIT") {
        settings.inbox.poll_limit = v;
    }
    if let Some(v) = env_parse("HIVE_RATE_LIMIT") {
        settings.rate.limit = v;
    }
    if let Some(v) = env_parse("HIVE_RATE_WINDOW_MS") {
        settings.rate.window_ms = v;
    }
    if let Some(v) = env_parse("HIVE_RELEVANCE_THRESHOLD") {
        settings.relevance.threshold = v;
    }
    if let Some(v) = env_parse("HIVE_RELEVANCE_TOP_N") {
        settings.relevance.top_n = v;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
