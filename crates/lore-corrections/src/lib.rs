//! # lore-corrections
//!
//! The auto-correction engine: applies a context document's
//! `auto_corrections` rules to free text.
//!
//! Patterns are data — stored as plain strings in the document, compiled
//! lazily, and cached per context name. The cache entry is dropped whenever
//! that document is mutated (or the store is reloaded), so hand edits are
//! picked up on the next apply.

#![deny(unsafe_code)]

pub mod engine;

pub use engine::{CorrectionEngine, CorrectionOutcome};
