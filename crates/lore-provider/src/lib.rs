//! # lore-provider
//!
//! The operation surface of the lore context service.
//!
//! [`ContextProvider`] wires every component together from loaded settings:
//! the context store and its discovery pass, the correction engine, the
//! mutation pipeline, the session initializer, the learning engine, and the
//! selected memory backend. It is constructed explicitly and shared by
//! reference; there is no global instance. All operations return typed
//! payloads, leaving transport concerns to the caller.

#![deny(unsafe_code)]

pub mod provider;

pub use provider::ContextProvider;
