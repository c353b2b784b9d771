//! # lore-memory
//!
//! Capability interface to the persistent-memory backend, plus the two
//! shipped implementations.
//!
//! The rest of the workspace only ever depends on the [`MemoryService`]
//! trait; which implementation backs it is a construction-time choice:
//!
//! - [`SimulatedMemory`] — in-process, no persistence, for development and
//!   tests
//! - [`SqliteMemory`] — file-backed `SQLite` store
//!
//! All four capability methods are **best-effort**: a failing backend yields
//! a result with `success: false` that callers log and treat as "no data" —
//! memory problems must never fail an overall operation.

#![deny(unsafe_code)]

pub mod service;
pub mod simulated;
pub mod sqlite;
pub mod types;

pub use service::MemoryService;
pub use simulated::SimulatedMemory;
pub use sqlite::SqliteMemory;
pub use types::{MemoryHit, MemoryQueryResult, MemoryStats, MemoryStoreResult};
