//! Filesystem context scanner.
//!
//! Discovers context documents by scanning a directory for files matching
//! `*_context.json`. The context name is the filename stem with the suffix
//! removed (`dokuwiki_context.json` → `dokuwiki`).

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use lore_core::constants::CONTEXT_FILE_SUFFIX;
use lore_core::types::ContextDocument;

/// A file the scan could not load, with the reason it was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanError {
    /// The offending file.
    pub path: PathBuf,
    /// Why it was skipped.
    pub message: String,
}

/// A parsed document together with where it came from.
#[derive(Debug, Clone)]
pub struct LoadedContext {
    /// Name derived from the filename stem.
    pub name: String,
    /// Source file.
    pub path: PathBuf,
    /// The parsed body.
    pub document: ContextDocument,
}

/// Outcome of one directory scan.
///
/// A file that fails to load never aborts the pass; it lands in `skipped`
/// and the remaining files are still tried.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    /// Successfully parsed documents, sorted by name.
    pub contexts: Vec<LoadedContext>,
    /// Files skipped, with reasons.
    pub skipped: Vec<ScanError>,
}

/// Derive a context name from a candidate file name.
///
/// Only `<name>_context.json` participates; returns `None` otherwise.
#[must_use]
pub fn context_name(file_name: &str) -> Option<&str> {
    let stem = file_name.strip_suffix(CONTEXT_FILE_SUFFIX)?;
    (!stem.is_empty()).then_some(stem)
}

/// The file path backing a context named `name` inside `dir`.
#[must_use]
pub fn context_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{name}{CONTEXT_FILE_SUFFIX}"))
}

/// Scan `dir` for context documents.
///
/// A missing directory scans as empty (not an error). JSON files that do
/// not follow the naming convention, or that fail to read or parse, are
/// reported in `skipped`; subdirectories and non-JSON files are ignored
/// outright.
#[must_use]
pub fn scan_directory(dir: &Path) -> ScanOutcome {
    let mut outcome = ScanOutcome::default();

    if !dir.is_dir() {
        debug!(dir = %dir.display(), "Context directory does not exist, nothing to scan");
        return outcome;
    }

    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "Failed to read context directory");
            return outcome;
        }
    };

    for entry in entries {
        let Ok(entry) = entry else {
            continue;
        };
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !file_name.ends_with(".json") {
            continue;
        }
        let Some(name) = context_name(file_name) else {
            outcome.skipped.push(ScanError {
                path,
                message: format!("file name does not match `*{CONTEXT_FILE_SUFFIX}`"),
            });
            continue;
        };

        match load_context(&path, name) {
            Ok(loaded) => {
                debug!(context = %loaded.name, "Loaded context document");
                outcome.contexts.push(loaded);
            }
            Err(error) => {
                warn!(path = %error.path.display(), message = %error.message, "Skipping context file");
                outcome.skipped.push(error);
            }
        }
    }

    outcome.contexts.sort_by(|a, b| a.name.cmp(&b.name));
    outcome
}

fn load_context(path: &Path, name: &str) -> Result<LoadedContext, ScanError> {
    let content = std::fs::read_to_string(path).map_err(|e| ScanError {
        path: path.to_path_buf(),
        message: format!("failed to read: {e}"),
    })?;
    let document: ContextDocument = serde_json::from_str(&content).map_err(|e| ScanError {
        path: path.to_path_buf(),
        message: format!("failed to parse: {e}"),
    })?;
    Ok(LoadedContext {
        name: name.to_string(),
        path: path.to_path_buf(),
        document,
    })
}
