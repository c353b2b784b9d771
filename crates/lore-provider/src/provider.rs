//! The dependency-injected operation surface.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};
use tracing::{debug, info};

use lore_contexts::{ContextManager, ContextStore, LoadReport, MutationOutcome};
use lore_core::errors::Result;
use lore_core::types::{ContextDocument, Optimization, PatternSection, SectionUpdate};
use lore_corrections::{CorrectionEngine, CorrectionOutcome};
use lore_learning::{
    EffectivenessReport, LearningEngine, OptimizationSuggestion, ProactiveSuggestion,
};
use lore_memory::{MemoryService, MemoryStats, SimulatedMemory, SqliteMemory};
use lore_session::{SessionInitializer, SessionLearning, SessionState, SessionStatus};
use lore_settings::{LoreSettings, MemoryBackendKind};

/// The assembled context service.
///
/// Construction selects the memory backend from settings and wires every
/// component around it; the instance is then shared by reference (clone the
/// surrounding `Arc` if needed) and exposes one method per operation.
/// Discovery does not run automatically — call [`discover_and_load`] once
/// after construction.
///
/// [`discover_and_load`]: ContextProvider::discover_and_load
pub struct ContextProvider {
    settings: LoreSettings,
    store: Arc<ContextStore>,
    corrections: Arc<CorrectionEngine>,
    manager: ContextManager,
    memory: Arc<dyn MemoryService>,
    learning: Arc<LearningEngine>,
    initializer: SessionInitializer,
}

impl ContextProvider {
    /// Build the full service from loaded settings.
    ///
    /// Fails only when the configured sqlite backend cannot be opened; the
    /// simulated backend always constructs.
    pub fn new(settings: LoreSettings) -> Result<Self> {
        let memory: Arc<dyn MemoryService> = match settings.memory.backend {
            MemoryBackendKind::Simulated => Arc::new(SimulatedMemory::new()),
            MemoryBackendKind::Sqlite => Arc::new(SqliteMemory::open(&settings.memory.db_path)?),
        };

        let store = Arc::new(ContextStore::new(
            &settings.contexts.dir,
            settings.contexts.auto_load,
        ));
        let corrections = Arc::new(CorrectionEngine::new());
        let manager = ContextManager::new(Arc::clone(&store), Arc::clone(&corrections))
            .with_memory(Arc::clone(&memory));
        let learning = Arc::new(LearningEngine::new(
            Arc::clone(&memory),
            settings.learning.clone(),
        ));
        let initializer = SessionInitializer::new(
            Arc::clone(&memory),
            Duration::from_millis(settings.session.action_timeout_ms),
        )
        .with_learning(Arc::clone(&learning) as Arc<dyn SessionLearning>);

        info!(
            backend = memory.name(),
            dir = %settings.contexts.dir,
            auto_load = settings.contexts.auto_load,
            "Context provider constructed"
        );

        Ok(Self {
            settings,
            store,
            corrections,
            manager,
            memory,
            learning,
            initializer,
        })
    }

    /// The settings this provider was built from.
    #[must_use]
    pub fn settings(&self) -> &LoreSettings {
        &self.settings
    }

    // ─── Store operations ────────────────────────────────────────────────

    /// Scan the configured directory and (re)load every discoverable
    /// document, dropping all cached compiled rules.
    pub fn discover_and_load(&self) -> LoadReport {
        let report = self.store.load_all();
        self.corrections.invalidate_all();
        info!(
            loaded = report.loaded,
            skipped = report.skipped_count(),
            "Context discovery complete"
        );
        report
    }

    /// Look up the context for a tool.
    ///
    /// Accepts either a context name (`git`) or a qualified tool name
    /// (`dokuwiki:core_savePage`, resolved by its category prefix). Returns
    /// the resolved context name together with the document.
    pub fn get_context(&self, tool_name: &str) -> Result<(String, ContextDocument)> {
        self.store.resolve(tool_name)
    }

    /// Sorted names of every loaded context.
    #[must_use]
    pub fn list_contexts(&self) -> Vec<String> {
        self.store.names()
    }

    // ─── Pattern engine ──────────────────────────────────────────────────

    /// Run a tool's auto-corrections over `text`.
    ///
    /// A tool with no context, or one with `auto_convert` disabled, passes
    /// the text through untouched; this is never an error.
    #[must_use]
    pub fn apply_corrections(&self, tool_name: &str, text: &str) -> CorrectionOutcome {
        match self.store.resolve(tool_name) {
            Ok((name, doc)) => self.corrections.apply(&name, &doc, text),
            Err(_) => {
                debug!(tool = %tool_name, "No context for tool, text passed through");
                CorrectionOutcome::unchanged(text)
            }
        }
    }

    // ─── Mutations ───────────────────────────────────────────────────────

    /// Create a new context document.
    pub async fn create_context(
        &self,
        name: &str,
        category: &str,
        body: &SectionUpdate,
    ) -> Result<MutationOutcome> {
        self.manager.create(name, category, body).await
    }

    /// Replace sections of an existing document.
    pub async fn update_context(
        &self,
        name: &str,
        sections: &SectionUpdate,
    ) -> Result<MutationOutcome> {
        self.manager.update(name, sections).await
    }

    /// Append rule entries to one of a document's rule-keyed sections.
    pub async fn add_pattern(
        &self,
        name: &str,
        section: PatternSection,
        entries: &Map<String, Value>,
    ) -> Result<MutationOutcome> {
        self.manager.add_pattern(name, section, entries).await
    }

    /// Apply a typed optimization to a document.
    pub async fn auto_optimize(
        &self,
        name: &str,
        optimization: &Optimization,
    ) -> Result<MutationOutcome> {
        self.manager.auto_optimize(name, optimization).await
    }

    // ─── Session ─────────────────────────────────────────────────────────

    /// Run the startup actions declared by every loaded context and publish
    /// the resulting status.
    pub async fn run_session_init(&self) -> SessionStatus {
        let contexts = self.contexts_snapshot();
        self.initializer.run(&contexts).await
    }

    /// The most recently published session status.
    #[must_use]
    pub fn get_session_status(&self) -> SessionStatus {
        self.initializer.status()
    }

    /// Lifecycle state of the session initializer.
    #[must_use]
    pub fn session_state(&self) -> SessionState {
        self.initializer.state()
    }

    // ─── Learning ────────────────────────────────────────────────────────

    /// Effectiveness analysis for one context; `NotFound` if unknown.
    pub fn analyze_effectiveness(&self, name: &str) -> Result<EffectivenessReport> {
        let doc = self.store.get(name)?;
        Ok(self.learning.analyze(name, &doc.metadata.usage))
    }

    /// Store-wide optimization suggestions over the loaded set.
    #[must_use]
    pub fn suggest_optimizations(&self) -> Vec<OptimizationSuggestion> {
        self.learning
            .suggest_global_optimizations(&self.contexts_snapshot())
    }

    /// Suggestions derived from which context names are loaded.
    #[must_use]
    pub fn proactive_suggestions(&self, loaded_names: &[String]) -> Vec<ProactiveSuggestion> {
        self.learning.proactive_suggestions(loaded_names)
    }

    // ─── Memory ──────────────────────────────────────────────────────────

    /// Health and size of the memory backend.
    pub async fn memory_stats(&self) -> MemoryStats {
        self.memory.stats().await
    }

    fn contexts_snapshot(&self) -> Vec<(String, ContextDocument)> {
        self.store
            .names()
            .into_iter()
            .filter_map(|name| self.store.get(&name).ok().map(|doc| (name, doc)))
            .collect()
    }
}

impl std::fmt::Debug for ContextProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextProvider")
            .field("backend", &self.memory.name())
            .field("contexts", &self.store.len())
            .field("session", &self.initializer.state())
            .finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
