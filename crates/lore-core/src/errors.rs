//! Error taxonomy shared across the lore crates.
//!
//! Validation and collision failures are returned as typed values at the
//! mutation boundary and never retried; I/O failures surface immediately
//! with enough context (the offending path) for a human to recover; backend
//! unavailability is absorbed by the session and learning layers and must
//! never fail an overall operation.

use std::path::PathBuf;

use thiserror::Error;

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, ContextError>;

/// Errors produced by the context service.
#[derive(Debug, Error)]
pub enum ContextError {
    /// No context document with the given name is loaded.
    #[error("context not found: {name}")]
    NotFound {
        /// The name that was looked up.
        name: String,
    },

    /// A candidate context name failed validation.
    #[error("invalid context name `{name}`: {}", violations.join("; "))]
    NameInvalid {
        /// The rejected candidate.
        name: String,
        /// Every violation found, not just the first.
        violations: Vec<String>,
    },

    /// A candidate document body failed validation.
    #[error("invalid context document: {}", violations.join("; "))]
    DocumentInvalid {
        /// Every violation found, not just the first.
        violations: Vec<String>,
    },

    /// A create collided with a live document.
    #[error("context already exists: {name}")]
    AlreadyExists {
        /// The colliding name.
        name: String,
    },

    /// A pattern append collided with an existing rule name.
    #[error("rule `{rule}` already exists in section `{section}`")]
    DuplicateRule {
        /// Section the append targeted.
        section: String,
        /// The colliding rule name.
        rule: String,
    },

    /// Durable-storage failure, carrying the path involved.
    #[error("I/O failure on {}: {source}", path.display())]
    Io {
        /// File or directory the operation touched.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The memory backend capability is down. Always non-fatal to callers.
    #[error("memory backend `{backend}` unavailable: {message}")]
    BackendUnavailable {
        /// Backend implementation name.
        backend: String,
        /// Human-readable cause.
        message: String,
    },

    /// A stored pattern failed to compile as a regular expression.
    #[error("pattern for rule `{rule}` failed to compile: {message}")]
    PatternCompile {
        /// Rule whose pattern is broken.
        rule: String,
        /// Compiler diagnostic.
        message: String,
    },

    /// Document (de)serialization failure.
    #[error("serialization failure: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl ContextError {
    /// Build a [`ContextError::NotFound`].
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }

    /// Build a [`ContextError::Io`] from a path and source error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
