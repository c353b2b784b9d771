//! Result payloads for the memory capability interface.
//!
//! Every method returns a payload with an explicit `success` flag instead of
//! an error type: backend failures are data to be logged and absorbed, not
//! errors to propagate.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outcome of a `store` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryStoreResult {
    /// Whether the entry was persisted.
    pub success: bool,
    /// Identifier of the stored entry when `success`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Failure description when `!success`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MemoryStoreResult {
    /// Successful store with the new entry's id.
    #[must_use]
    pub fn stored(id: impl Into<String>) -> Self {
        Self {
            success: true,
            id: Some(id.into()),
            error: None,
        }
    }

    /// Failed store with a reason.
    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            id: None,
            error: Some(error.into()),
        }
    }
}

/// One entry returned from a recall or tag search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryHit {
    /// Stored content.
    pub content: String,
    /// Match strength in `[0, 1]`; tag searches report `1.0`.
    pub relevance: f64,
    /// Tags the entry carries.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// RFC 3339 storage timestamp.
    pub timestamp: String,
}

/// Outcome of a `recall` or `search_by_tag` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryQueryResult {
    /// Whether the query executed.
    pub success: bool,
    /// Matching entries, best first. Empty is a valid success.
    #[serde(default)]
    pub results: Vec<MemoryHit>,
    /// Failure description when `!success`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MemoryQueryResult {
    /// Successful query with its hits.
    #[must_use]
    pub fn hits(results: Vec<MemoryHit>) -> Self {
        Self {
            success: true,
            results,
            error: None,
        }
    }

    /// Failed query with a reason.
    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            results: Vec::new(),
            error: Some(error.into()),
        }
    }
}

/// Outcome of a `stats` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryStats {
    /// Whether the backend answered.
    pub success: bool,
    /// Total stored entries.
    #[serde(default)]
    pub total: u64,
    /// Count of distinct tags in use.
    #[serde(default)]
    pub tags: u64,
    /// Implementation name (`"simulated"`, `"sqlite"`).
    pub backend_name: String,
    /// Health string, `"operational"` when healthy.
    pub status: String,
    /// Failure description when `!success`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MemoryStats {
    /// Healthy backend snapshot.
    #[must_use]
    pub fn operational(backend_name: impl Into<String>, total: u64, tags: u64) -> Self {
        Self {
            success: true,
            total,
            tags,
            backend_name: backend_name.into(),
            status: "operational".to_string(),
            error: None,
        }
    }

    /// Backend that could not answer.
    #[must_use]
    pub fn failed(backend_name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            total: 0,
            tags: 0,
            backend_name: backend_name.into(),
            status: "unavailable".to_string(),
            error: Some(error.into()),
        }
    }
}

/// A stored entry, as kept by the shipped backends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryEntry {
    /// Unique id (UUID v7, so ids sort by creation time).
    pub id: String,
    /// Stored content.
    pub content: String,
    /// Tags for later retrieval.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Caller-supplied metadata, passed through verbatim.
    #[serde(default)]
    pub metadata: Value,
    /// RFC 3339 storage timestamp.
    pub created_at: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
