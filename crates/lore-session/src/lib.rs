//! Session initialization.
//!
//! Context documents may declare startup actions (`recall_memory`,
//! `search_by_tag`). At the start of a session the initializer walks every
//! loaded document once, runs the declared actions against the memory
//! backend, and produces a [`SessionStatus`] report. Individual action
//! failures and timeouts are recorded, never fatal.

#![deny(unsafe_code)]

pub mod initializer;
pub mod status;

pub use initializer::SessionInitializer;
pub use status::{ExecutedAction, SessionLearning, SessionState, SessionStatus};
