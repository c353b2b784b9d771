//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`LoreSettings::default()`]
//! 2. If the settings file exists, deep-merge its values over defaults
//! 3. Apply environment variable overrides (highest priority)
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)
//!
//! The context-directory variables keep their historical names
//! (`CONTEXT_CONFIG_DIR`, `AUTO_LOAD_CONTEXTS`); service-specific knobs use
//! the `LORE_` prefix.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::Result;
use crate::types::LoreSettings;

/// Resolve the path to the settings file.
///
/// `LORE_SETTINGS_PATH` overrides the default `./lore.settings.json`.
pub fn settings_path() -> PathBuf {
    std::env::var("LORE_SETTINGS_PATH")
        .map_or_else(|_| PathBuf::from("./lore.settings.json"), PathBuf::from)
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<LoreSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// If the file does not exist, returns defaults. If the file contains
/// invalid JSON, returns an error.
pub fn load_settings_from_path(path: &Path) -> Result<LoreSettings> {
    let defaults = serde_json::to_value(LoreSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: LoreSettings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Recursive deep merge of two JSON values.
///
/// - Objects are merged recursively (source overrides target per-key)
/// - Arrays and primitives are replaced entirely by source
/// - Null values in source are skipped (preserving target)
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

/// Apply environment variable overrides to loaded settings.
///
/// Each env var has strict parsing rules:
/// - Integers must be valid and within the specified range
/// - Booleans accept: `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`
/// - Invalid values are ignored with a warning (fall back to file/default)
pub fn apply_env_overrides(settings: &mut LoreSettings) {
    // ── Context discovery ───────────────────────────────────────────
    if let Some(v) = read_env_string("CONTEXT_CONFIG_DIR") {
        settings.contexts.dir = v;
    }
    if let Some(v) = read_env_bool("AUTO_LOAD_CONTEXTS") {
        settings.contexts.auto_load = v;
    }

    // ── Memory backend ──────────────────────────────────────────────
    if let Some(v) = read_env_string("LORE_MEMORY_BACKEND") {
        if let Ok(kind) = serde_json::from_value(Value::String(v.to_lowercase())) {
            settings.memory.backend = kind;
        } else {
            tracing::warn!(value = %v, "invalid LORE_MEMORY_BACKEND, ignoring");
        }
    }
    if let Some(v) = read_env_string("LORE_MEMORY_DB") {
        settings.memory.db_path = v;
    }

    // ── Session initialization ──────────────────────────────────────
    if let Some(v) = read_env_u64("LORE_ACTION_TIMEOUT_MS", 50, 600_000) {
        settings.session.action_timeout_ms = v;
    }

    // ── Learning heuristics ─────────────────────────────────────────
    if let Some(v) = read_env_u64("LORE_UPDATE_SATURATION", 1, 1_000_000) {
        settings.learning.update_saturation = v;
    }
    if let Some(v) = read_env_u64("LORE_ADDITION_SATURATION", 1, 1_000_000) {
        settings.learning.addition_saturation = v;
    }
}

// ── Pure parsing functions (testable without env vars) ──────────────────────

/// Parse a string as a boolean.
///
/// Accepts (case-insensitive): `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a string as a `u64` within a range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

// ── Env var readers (thin wrappers) ─────────────────────────────────────────

fn read_env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn read_env_bool(name: &str) -> Option<bool> {
    let val = std::env::var(name).ok()?;
    let result = parse_bool(&val);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid boolean env var, ignoring");
    }
    result
}

fn read_env_u64(name: &str, min: u64, max: u64) -> Option<u64> {
    let val = std::env::var(name).ok()?;
    let result = parse_u64_range(&val, min, max);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid u64 env var, ignoring");
    }
    result
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
