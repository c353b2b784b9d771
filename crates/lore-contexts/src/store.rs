//! In-memory context store.
//!
//! Owns the authoritative `name → ContextDocument` mapping and its
//! file-per-document representation on disk. Interior mutability lets the
//! mutation pipeline reload single documents while readers hold shared
//! references to the store.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use tracing::{debug, info};

use lore_core::errors::{ContextError, Result};
use lore_core::types::ContextDocument;

use crate::discovery::{self, ScanError};

/// Outcome of one discovery pass over the context directory.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    /// How many documents were loaded into the store.
    pub loaded: usize,
    /// Files skipped, with reasons. Skips never abort the pass.
    pub skipped: Vec<ScanError>,
}

impl LoadReport {
    /// How many files were skipped.
    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }
}

/// Registry of loaded context documents, keyed by name.
pub struct ContextStore {
    dir: PathBuf,
    auto_load: bool,
    contexts: RwLock<HashMap<String, ContextDocument>>,
}

impl ContextStore {
    /// Store over `dir`. Nothing is read until [`ContextStore::load_all`].
    pub fn new(dir: impl Into<PathBuf>, auto_load: bool) -> Self {
        Self {
            dir: dir.into(),
            auto_load,
            contexts: RwLock::new(HashMap::new()),
        }
    }

    /// The directory documents live in.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The file backing a context named `name`.
    #[must_use]
    pub fn path_for(&self, name: &str) -> PathBuf {
        discovery::context_path(&self.dir, name)
    }

    /// Scan the directory and replace the store contents with the result.
    ///
    /// When auto-loading is disabled the store empties and the report shows
    /// zero loads; an empty store is a valid state, not an error.
    pub fn load_all(&self) -> LoadReport {
        if !self.auto_load {
            info!("Context auto-loading disabled, store left empty");
            self.contexts.write().clear();
            return LoadReport::default();
        }

        let outcome = discovery::scan_directory(&self.dir);
        let report = LoadReport {
            loaded: outcome.contexts.len(),
            skipped: outcome.skipped,
        };

        let mut map = HashMap::new();
        for loaded in outcome.contexts {
            let _ = map.insert(loaded.name, loaded.document);
        }
        *self.contexts.write() = map;

        info!(
            loaded = report.loaded,
            skipped = report.skipped_count(),
            dir = %self.dir.display(),
            "Context discovery complete"
        );
        report
    }

    /// The document for `name`, or `NotFound`.
    pub fn get(&self, name: &str) -> Result<ContextDocument> {
        self.contexts
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| ContextError::not_found(name))
    }

    /// Resolve a possibly-qualified tool name to a loaded document.
    ///
    /// `dokuwiki:core_savePage` resolves through its category prefix
    /// `dokuwiki` when no document is named for the full string.
    pub fn resolve(&self, tool_name: &str) -> Result<(String, ContextDocument)> {
        let contexts = self.contexts.read();
        if let Some(doc) = contexts.get(tool_name) {
            return Ok((tool_name.to_string(), doc.clone()));
        }
        if let Some((category, _)) = tool_name.split_once(':') {
            if let Some(doc) = contexts.get(category) {
                debug!(tool = %tool_name, context = %category, "Resolved tool name by category");
                return Ok((category.to_string(), doc.clone()));
            }
        }
        Err(ContextError::not_found(tool_name))
    }

    /// Whether a context named `name` is loaded.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.contexts.read().contains_key(name)
    }

    /// Loaded context names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.contexts.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of loaded contexts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.contexts.read().len()
    }

    /// Whether the store holds no contexts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contexts.read().is_empty()
    }

    /// Insert a document directly, bypassing the filesystem.
    pub fn insert(&self, name: impl Into<String>, document: ContextDocument) {
        let _ = self.contexts.write().insert(name.into(), document);
    }

    /// Re-read one context from disk into the store.
    ///
    /// The mutation pipeline calls this after a successful write so that
    /// readers observe exactly what the file holds.
    pub fn reload(&self, name: &str) -> Result<ContextDocument> {
        let path = self.path_for(name);
        let content = std::fs::read_to_string(&path).map_err(|e| ContextError::io(&path, e))?;
        let document: ContextDocument = serde_json::from_str(&content)?;
        let _ = self
            .contexts
            .write()
            .insert(name.to_string(), document.clone());
        debug!(context = %name, "Context reloaded from disk");
        Ok(document)
    }
}

impl std::fmt::Debug for ContextStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextStore")
            .field("dir", &self.dir)
            .field("auto_load", &self.auto_load)
            .field("loaded", &self.len())
            .finish_non_exhaustive()
    }
}
