//! Package-level constants shared across the lore crates.

/// Current version of the lore workspace (sourced from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Filename suffix that marks a file as a context document.
///
/// A file `git_context.json` holds the context named `git`.
pub const CONTEXT_FILE_SUFFIX: &str = "_context.json";

/// Names that can never be used for a context document.
pub const RESERVED_CONTEXT_NAMES: &[&str] = &["system", "admin", "config", "server"];

/// Maximum length of a context name in characters.
pub const MAX_CONTEXT_NAME_LEN: usize = 64;

/// Subdirectory of the context directory where pre-mutation backups land.
pub const BACKUP_DIR_NAME: &str = "backups";

/// Prefix for backup filenames: `backup_<name>_<timestamp>`.
pub const BACKUP_FILE_PREFIX: &str = "backup_";

/// Version stamped into documents created at runtime without one.
pub const INITIAL_CONTEXT_VERSION: &str = "1.0.0";
