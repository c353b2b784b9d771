//! # lore-core
//!
//! Foundation types for the lore context service.
//!
//! This crate provides the shared vocabulary that all other lore crates depend on:
//!
//! - **Document model**: [`ContextDocument`] and its sections (corrections,
//!   triggers, session initialization, metadata with usage counters)
//! - **Mutation payloads**: [`SectionUpdate`], [`PatternSection`], [`Optimization`]
//! - **Errors**: [`ContextError`] taxonomy via `thiserror`
//! - **Constants**: reserved names, file-naming convention, directory defaults

#![deny(unsafe_code)]

pub mod constants;
pub mod errors;
pub mod types;

pub use errors::{ContextError, Result};
pub use types::{
    ContextDocument, ContextMetadata, CorrectionRule, Optimization, PatternSection, Priority,
    SectionUpdate, SessionInitialization, StartupAction, StartupActions, TriggerRule, UsageStats,
};
