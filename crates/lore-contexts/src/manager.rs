//! The mutation pipeline.
//!
//! [`ContextManager`] is the sole entry point for changing a context
//! document. Every operation runs the same pipeline and stops at the first
//! failing step:
//!
//! `validate name → validate body → snapshot → write → reload → done`
//!
//! Usage counters are stamped into the candidate document before the write,
//! so the persisted file always carries them and the post-write reload is
//! the single point where the in-memory store changes. Validation failures
//! therefore leave both the file and the store byte-identical to their
//! pre-call state.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

use lore_core::constants::INITIAL_CONTEXT_VERSION;
use lore_core::errors::{ContextError, Result};
use lore_core::types::{ContextDocument, Optimization, PatternSection, SectionUpdate};
use lore_corrections::CorrectionEngine;
use lore_memory::MemoryService;

use crate::backup::BackupManager;
use crate::store::ContextStore;
use crate::validate::{validate_document, validate_name};

/// Success payload of a mutating operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MutationOutcome {
    /// The mutated context.
    pub context: String,
    /// Which operation ran: `create`, `update`, `add_pattern`, or
    /// `auto_optimize`.
    pub operation: String,
    /// What the operation touched, one entry per applied change.
    pub changes: Vec<String>,
    /// Pre-image written before the mutation; `None` on first-time creation.
    pub backup: Option<PathBuf>,
}

/// Orchestrates all context mutations.
///
/// Holds the store, the backup manager, and the correction engine whose
/// compiled-rule cache must be dropped whenever a document changes. A memory
/// backend, when attached, receives a one-line synopsis of every successful
/// mutation — strictly best-effort, a failing backend never fails the
/// operation.
pub struct ContextManager {
    store: Arc<ContextStore>,
    backups: BackupManager,
    corrections: Arc<CorrectionEngine>,
    memory: Option<Arc<dyn MemoryService>>,
}

impl ContextManager {
    /// Manager over `store`, invalidating `corrections` on every mutation.
    #[must_use]
    pub fn new(store: Arc<ContextStore>, corrections: Arc<CorrectionEngine>) -> Self {
        let backups = BackupManager::new(store.dir());
        Self {
            store,
            backups,
            corrections,
            memory: None,
        }
    }

    /// Attach a memory backend for mutation synopses.
    #[must_use]
    pub fn with_memory(mut self, memory: Arc<dyn MemoryService>) -> Self {
        self.memory = Some(memory);
        self
    }

    /// Where snapshots land.
    #[must_use]
    pub fn backup_dir(&self) -> &Path {
        self.backups.backup_dir()
    }

    /// Create a new context document.
    ///
    /// `body.description` is required; the remaining sections seed the new
    /// document. Fails with `NameInvalid`, `DocumentInvalid`, or
    /// `AlreadyExists` (checked against both the store and the directory, so
    /// a file present but unloaded is never silently overwritten).
    pub async fn create(
        &self,
        name: &str,
        category: &str,
        body: &SectionUpdate,
    ) -> Result<MutationOutcome> {
        let violations = validate_name(name);
        if !violations.is_empty() {
            return Err(ContextError::NameInvalid {
                name: name.to_string(),
                violations,
            });
        }
        if self.store.contains(name) || self.store.path_for(name).exists() {
            return Err(ContextError::AlreadyExists {
                name: name.to_string(),
            });
        }

        let mut doc = ContextDocument::new(category, "");
        let _ = apply_sections(&mut doc, body);
        doc.metadata.version = Some(INITIAL_CONTEXT_VERSION.to_string());
        doc.metadata.usage.record_creation();
        doc.metadata.record_activity();

        let changes = vec![format!("created with category `{category}`")];
        let outcome = self.commit(name, &doc, "create", changes)?;
        info!(context = %name, category = %category, "Context created");
        self.record_synopsis(&outcome).await;
        Ok(outcome)
    }

    /// Replace sections of an existing document.
    ///
    /// Each populated field of `sections` replaces that section wholesale;
    /// untouched sections survive as stored. Fails with `NotFound` for an
    /// unknown name and `DocumentInvalid` when `sections` is empty or the
    /// merged result does not validate — in either case file and store are
    /// left untouched.
    pub async fn update(&self, name: &str, sections: &SectionUpdate) -> Result<MutationOutcome> {
        let mut doc = self.store.get(name)?;

        if sections.is_empty() {
            return Err(ContextError::DocumentInvalid {
                violations: vec!["at least one section is required".to_string()],
            });
        }

        let replaced = apply_sections(&mut doc, sections);
        doc.metadata.usage.record_update();
        doc.metadata.record_activity();

        let changes = replaced
            .iter()
            .map(|section| format!("replaced {section}"))
            .collect();
        let outcome = self.commit(name, &doc, "update", changes)?;
        info!(context = %name, sections = replaced.len(), "Context updated");
        self.record_synopsis(&outcome).await;
        Ok(outcome)
    }

    /// Append rule entries to a rule-keyed section.
    ///
    /// Existing entries are never disturbed: any collision with a stored
    /// rule name rejects the whole call with `DuplicateRule` before anything
    /// is written.
    pub async fn add_pattern(
        &self,
        name: &str,
        section: PatternSection,
        entries: &Map<String, Value>,
    ) -> Result<MutationOutcome> {
        let mut doc = self.store.get(name)?;

        if entries.is_empty() {
            return Err(ContextError::DocumentInvalid {
                violations: vec!["at least one rule entry is required".to_string()],
            });
        }
        for rule in entries.keys() {
            if doc.section(section).contains_key(rule) {
                return Err(ContextError::DuplicateRule {
                    section: section.as_str().to_string(),
                    rule: rule.clone(),
                });
            }
        }

        let target = doc.section_mut(section);
        for (rule, value) in entries {
            let _ = target.insert(rule.clone(), value.clone());
        }
        doc.metadata.usage.record_pattern_addition();
        doc.metadata.record_activity();

        let changes = entries
            .keys()
            .map(|rule| format!("added `{rule}` to {section}"))
            .collect();
        let outcome = self.commit(name, &doc, "add_pattern", changes)?;
        info!(context = %name, section = %section, added = entries.len(), "Patterns added");
        self.record_synopsis(&outcome).await;
        Ok(outcome)
    }

    /// Apply a typed optimization through the same pipeline.
    ///
    /// Stamps `metadata.last_optimization` and bumps `optimization_count`
    /// on success.
    pub async fn auto_optimize(
        &self,
        name: &str,
        optimization: &Optimization,
    ) -> Result<MutationOutcome> {
        let mut doc = self.store.get(name)?;

        let changes = match optimization {
            Optimization::PatternImprovement { section, entries } => {
                let target = doc.section_mut(*section);
                for (rule, value) in entries {
                    let _ = target.insert(rule.clone(), value.clone());
                }
                vec![format!("{} entries in {section}", entries.len())]
            }
            Optimization::PreferenceTuning { preferences } => {
                for (key, value) in preferences {
                    let _ = doc.preferences.insert(key.clone(), value.clone());
                }
                vec![format!("{} preference values", preferences.len())]
            }
            Optimization::RuleRefinement { rules } => {
                for (key, value) in rules {
                    let _ = doc.syntax_rules.insert(key.clone(), value.clone());
                }
                vec![format!("{} syntax rules", rules.len())]
            }
        };
        doc.metadata.record_optimization();
        doc.metadata.record_activity();

        let changes = changes
            .into_iter()
            .map(|summary| format!("{}: {summary}", optimization.kind()))
            .collect();
        let outcome = self.commit(name, &doc, "auto_optimize", changes)?;
        info!(context = %name, kind = optimization.kind(), "Optimization applied");
        self.record_synopsis(&outcome).await;
        Ok(outcome)
    }

    /// The shared tail of every mutation: validate → snapshot → write →
    /// reload → invalidate caches.
    fn commit(
        &self,
        name: &str,
        doc: &ContextDocument,
        operation: &str,
        changes: Vec<String>,
    ) -> Result<MutationOutcome> {
        let violations = validate_document(doc);
        if !violations.is_empty() {
            return Err(ContextError::DocumentInvalid { violations });
        }

        let path = self.store.path_for(name);
        let backup = self.backups.snapshot(name, &path)?;

        if let Err(e) = write_document(&path, doc) {
            // The original file is intact (the write never touches it
            // directly), but report the pre-image so a human can diff.
            if let Some(backup) = &backup {
                error!(
                    context = %name,
                    backup = %backup.display(),
                    error = %e,
                    "Write failed after snapshot; pre-image preserved"
                );
            }
            return Err(e);
        }

        let _ = self.store.reload(name)?;
        self.corrections.invalidate(name);

        Ok(MutationOutcome {
            context: name.to_string(),
            operation: operation.to_string(),
            changes,
            backup,
        })
    }

    /// Best-effort one-line record of a successful mutation.
    async fn record_synopsis(&self, outcome: &MutationOutcome) {
        let Some(memory) = &self.memory else {
            return;
        };
        let content = format!(
            "Context `{}` {}: {}",
            outcome.context,
            outcome.operation,
            outcome.changes.join(", ")
        );
        let tags = vec![
            "context-management".to_string(),
            outcome.operation.clone(),
            outcome.context.clone(),
        ];
        let result = memory.store(&content, &tags, Value::Null).await;
        if result.success {
            debug!(context = %outcome.context, "Mutation synopsis stored");
        } else {
            warn!(
                context = %outcome.context,
                error = result.error.as_deref().unwrap_or("unknown"),
                "Mutation synopsis not stored"
            );
        }
    }
}

impl std::fmt::Debug for ContextManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextManager")
            .field("store", &self.store)
            .field("memory_attached", &self.memory.is_some())
            .finish_non_exhaustive()
    }
}

/// Shallow per-section replace. Returns the names of the sections touched.
fn apply_sections(doc: &mut ContextDocument, sections: &SectionUpdate) -> Vec<String> {
    let mut replaced = Vec::new();
    if let Some(description) = &sections.description {
        doc.description = description.clone();
        replaced.push("description".to_string());
    }
    if let Some(auto_convert) = sections.auto_convert {
        doc.auto_convert = auto_convert;
        replaced.push("auto_convert".to_string());
    }
    if let Some(rules) = &sections.syntax_rules {
        doc.syntax_rules = rules.clone();
        replaced.push("syntax_rules".to_string());
    }
    if let Some(preferences) = &sections.preferences {
        doc.preferences = preferences.clone();
        replaced.push("preferences".to_string());
    }
    if let Some(corrections) = &sections.auto_corrections {
        doc.auto_corrections = corrections.clone();
        replaced.push("auto_corrections".to_string());
    }
    if let Some(triggers) = &sections.auto_store_triggers {
        doc.auto_store_triggers = triggers.clone();
        replaced.push("auto_store_triggers".to_string());
    }
    if let Some(triggers) = &sections.auto_retrieve_triggers {
        doc.auto_retrieve_triggers = triggers.clone();
        replaced.push("auto_retrieve_triggers".to_string());
    }
    if let Some(init) = &sections.session_initialization {
        doc.session_initialization = Some(init.clone());
        replaced.push("session_initialization".to_string());
    }
    replaced
}

/// Serialize and persist a document without ever exposing a partial file.
///
/// The payload lands in a sibling temp file first and replaces the target
/// via rename, so a failure at any point leaves the original untouched.
fn write_document(path: &Path, doc: &ContextDocument) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ContextError::io(parent, e))?;
    }
    let json = serde_json::to_string_pretty(doc)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, &json).map_err(|e| ContextError::io(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(ContextError::io(path, e));
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
