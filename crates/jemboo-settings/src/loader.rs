//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`JembooSettings::default()`]
//! 2. If the settings file exists, deep-merge its values over defaults
//! 3. Apply `JEMBOO_*` environment overrides (highest priority)
//! 4. Validate the result
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use jemboo_core::LogFormat;
use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::{Result, SettingsError};
use crate::types::{JembooSettings, LogLevel};

/// Resolve the default settings file path (`~/.jemboo/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".jemboo").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<JembooSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// A missing file yields defaults. Invalid JSON or a value that fails
/// validation is an error.
pub fn load_settings_from_path(path: &Path) -> Result<JembooSettings> {
    let mut settings = read_settings_file(path)?;
    apply_env_overrides(&mut settings);
    validate(&settings)?;
    Ok(settings)
}

/// Defaults deep-merged with the file at `path`, without env overrides.
pub fn read_settings_file(path: &Path) -> Result<JembooSettings> {
    let defaults = serde_json::to_value(JembooSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    Ok(serde_json::from_value(merged)?)
}

/// Recursive deep merge of two JSON values.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Reject settings the gateway cannot run with.
pub fn validate(settings: &JembooSettings) -> Result<()> {
    if settings.session.default_page_size == 0 {
        return Err(SettingsError::InvalidValue(
            "session.defaultPageSize must be at least 1".into(),
        ));
    }
    if settings.server.outbound_buffer == 0 {
        return Err(SettingsError::InvalidValue(
            "server.outboundBuffer must be at least 1".into(),
        ));
    }
    for (name, url) in [
        ("backends.contextUrl", &settings.backends.context_url),
        ("backends.detectUrl", &settings.backends.detect_url),
        ("backends.suggestUrl", &settings.backends.suggest_url),
    ] {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(SettingsError::InvalidValue(format!(
                "{name} must be an http(s) URL, got {url:?}"
            )));
        }
    }
    Ok(())
}

/// Apply `JEMBOO_*` environment overrides to loaded settings.
///
/// Invalid values are ignored with a warning (falling back to file/default).
pub fn apply_env_overrides(settings: &mut JembooSettings) {
    apply_overrides(settings, |name| std::env::var(name).ok());
}

/// Apply overrides from an arbitrary variable source.
pub fn apply_overrides<F>(settings: &mut JembooSettings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let env = EnvReader { lookup };

    // ── Server ──────────────────────────────────────────────────────
    if let Some(v) = env.string("JEMBOO_HOST") {
        settings.server.host = v;
    }
    if let Some(v) = env.u16("JEMBOO_PORT", 1, 65535) {
        settings.server.port = v;
    }

    // ── Backends ────────────────────────────────────────────────────
    if let Some(v) = env.string("JEMBOO_CONTEXT_URL") {
        settings.backends.context_url = v;
    }
    if let Some(v) = env.string("JEMBOO_DETECT_URL") {
        settings.backends.detect_url = v;
    }
    if let Some(v) = env.string("JEMBOO_SUGGEST_URL") {
        settings.backends.suggest_url = v;
    }
    if let Some(v) = env.u64("JEMBOO_BACKEND_TIMEOUT_MS", 100, 600_000) {
        settings.backends.timeout_ms = v;
    }

    // ── Session ─────────────────────────────────────────────────────
    if let Some(v) = env.u32("JEMBOO_PAGE_SIZE", 1, 500) {
        settings.session.default_page_size = v;
    }
    if let Some(v) = env.string("JEMBOO_DEFAULT_LOCALE") {
        settings.session.default_locale = v;
    }

    // ── Catalog ─────────────────────────────────────────────────────
    if let Some(v) = env.string("JEMBOO_CATALOG_PATH") {
        settings.catalog.path = Some(v);
    }

    // ── Logging ─────────────────────────────────────────────────────
    if let Some(v) = env.parsed("JEMBOO_LOG_LEVEL", parse_log_level) {
        settings.logging.level = v;
    }
    if let Some(v) = env.parsed("JEMBOO_LOG_FORMAT", LogFormat::parse) {
        settings.logging.format = v;
    }
}

// ── Pure parsing functions (testable without env vars) ──────────────────────

/// Parse a string as a `u16` within a range.
pub fn parse_u16_range(val: &str, min: u16, max: u16) -> Option<u16> {
    let n: u16 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a string as a `u32` within a range.
pub fn parse_u32_range(val: &str, min: u32, max: u32) -> Option<u32> {
    let n: u32 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a string as a `u64` within a range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a log level name (case-insensitive).
pub fn parse_log_level(val: &str) -> Option<LogLevel> {
    serde_json::from_value(Value::String(val.trim().to_lowercase())).ok()
}

// ── Variable readers ────────────────────────────────────────────────────────

struct EnvReader<F> {
    lookup: F,
}

impl<F: Fn(&str) -> Option<String>> EnvReader<F> {
    fn string(&self, name: &str) -> Option<String> {
        (self.lookup)(name).filter(|v| !v.is_empty())
    }

    fn parsed<T>(&self, name: &str, parse: impl Fn(&str) -> Option<T>) -> Option<T> {
        let val = (self.lookup)(name)?;
        let result = parse(&val);
        if result.is_none() {
            warn!(key = name, value = %val, "invalid env var, ignoring");
        }
        result
    }

    fn u16(&self, name: &str, min: u16, max: u16) -> Option<u16> {
        self.parsed(name, |v| parse_u16_range(v, min, max))
    }

    fn u32(&self, name: &str, min: u32, max: u32) -> Option<u32> {
        self.parsed(name, |v| parse_u32_range(v, min, max))
    }

    fn u64(&self, name: &str, min: u64, max: u64) -> Option<u64> {
        self.parsed(name, |v| parse_u64_range(v, min, max))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
