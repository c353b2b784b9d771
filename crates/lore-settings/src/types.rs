//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase")]` for the settings-file
//! JSON format, and `#[serde(default)]` so partial files work — missing
//! fields get their production default during deserialization. Note that
//! context documents themselves use a different, externally defined format;
//! these types only describe the service's own configuration.

use serde::{Deserialize, Serialize};

/// Root settings for the lore context service.
///
/// Loaded from `./lore.settings.json` with defaults applied for missing
/// fields; environment variables override specific values on top.
///
/// # JSON Format
///
/// ```json
/// {
///   "version": "0.1.0",
///   "contexts": { "dir": "./contexts", "autoLoad": true },
///   "memory": { "backend": "sqlite", "dbPath": "./lore-memory.db" }
/// }
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoreSettings {
    /// Settings schema version.
    pub version: String,
    /// Context-document discovery and storage.
    pub contexts: ContextsSettings,
    /// Memory backend selection.
    pub memory: MemorySettings,
    /// Session-initialization behavior.
    pub session: SessionSettings,
    /// Effectiveness-scoring heuristics.
    pub learning: LearningSettings,
}

impl Default for LoreSettings {
    fn default() -> Self {
        Self {
            version: "0.1.0".to_string(),
            contexts: ContextsSettings::default(),
            memory: MemorySettings::default(),
            session: SessionSettings::default(),
            learning: LearningSettings::default(),
        }
    }
}

/// Where context documents live and whether they load at startup.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContextsSettings {
    /// Directory scanned for `*_context.json` files.
    pub dir: String,
    /// When false, startup discovery is skipped and the store starts empty
    /// (a valid state, not an error).
    pub auto_load: bool,
}

impl Default for ContextsSettings {
    fn default() -> Self {
        Self {
            dir: "./contexts".to_string(),
            auto_load: true,
        }
    }
}

/// Memory backend selection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MemorySettings {
    /// Which capability implementation to construct.
    pub backend: MemoryBackendKind,
    /// Database file for the sqlite backend.
    pub db_path: String,
}

impl Default for MemorySettings {
    fn default() -> Self {
        Self {
            backend: MemoryBackendKind::Simulated,
            db_path: "./lore-memory.db".to_string(),
        }
    }
}

/// The two memory backend implementations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryBackendKind {
    /// In-process store, no persistence. The default for development.
    Simulated,
    /// File-backed `SQLite` store.
    Sqlite,
}

/// Session-initialization behavior.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionSettings {
    /// Upper bound per startup action; a timeout is recorded as that
    /// action's error rather than failing the run.
    pub action_timeout_ms: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            action_timeout_ms: 1500,
        }
    }
}

/// Effectiveness-scoring heuristics.
///
/// The saturation points are heuristic constants, not validated product
/// requirements, which is why they live in configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LearningSettings {
    /// `update_count` at which the activity component reaches its maximum.
    pub update_saturation: u64,
    /// `pattern_additions` at which the evolution component reaches its
    /// maximum.
    pub addition_saturation: u64,
    /// Scores below this are flagged for review.
    pub low_score_threshold: f64,
    /// Scores at or above this are considered high-usage.
    pub high_score_threshold: f64,
}

impl Default for LearningSettings {
    fn default() -> Self {
        Self {
            update_saturation: 10,
            addition_saturation: 5,
            low_score_threshold: 0.3,
            high_score_threshold: 0.7,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
