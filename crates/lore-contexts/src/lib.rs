//! # lore-contexts
//!
//! Context-document persistence and mutation.
//!
//! - `discovery` scans a directory for `*_context.json` files.
//! - `store` owns the in-memory name → document mapping.
//! - `validate` gates every mutation with name and body checks.
//! - `backup` snapshots a document before anything touches it.
//! - `manager` orchestrates the whole mutation pipeline:
//!   validate → snapshot → write → reload → record usage.

#![deny(unsafe_code)]

pub mod backup;
pub mod discovery;
pub mod manager;
pub mod store;
pub mod validate;

pub use backup::BackupManager;
pub use discovery::{LoadedContext, ScanError, ScanOutcome};
pub use manager::{ContextManager, MutationOutcome};
pub use store::{ContextStore, LoadReport};
