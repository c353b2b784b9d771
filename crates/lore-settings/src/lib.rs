//! # lore-settings
//!
//! Configuration management with layered sources for the lore context service.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults** — [`LoreSettings::default()`]
//! 2. **Settings file** — `./lore.settings.json` (deep-merged over defaults)
//! 3. **Environment variables** — highest priority
//!
//! There is no global settings instance: the loaded value is constructed once
//! at process start and injected into whatever owns the operation surface.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::{
    ContextsSettings, LearningSettings, LoreSettings, MemoryBackendKind, MemorySettings,
    SessionSettings,
};

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
