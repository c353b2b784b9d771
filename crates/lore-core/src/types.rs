//! Context-document model.
//!
//! A context document is the JSON record governing one tool category:
//! syntax rules, preferences, auto-correction patterns, memory triggers,
//! startup actions, and usage metadata. Field names here are the literal
//! on-disk JSON keys — documents are hand-editable, so opaque sections stay
//! as raw JSON maps and only the structured sections get typed views.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Current UTC time as an RFC 3339 string, the format used for every
/// timestamp field a document carries.
#[must_use]
pub fn utc_timestamp() -> String {
    Utc::now().to_rfc3339()
}

// ─────────────────────────────────────────────────────────────────────────────
// Document
// ─────────────────────────────────────────────────────────────────────────────

/// A tool-behavior context document.
///
/// The document's name is not stored in the body; it derives from the
/// filename stem (`git_context.json` → `git`) and lives beside the body in
/// the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextDocument {
    /// Tool family this document governs (free text, e.g. `"git"`).
    pub tool_category: String,
    /// Human-readable description.
    pub description: String,
    /// Gates whether auto-correction rules apply automatically.
    #[serde(default)]
    pub auto_convert: bool,
    /// Arbitrary nested syntax rules, passed through verbatim to consumers.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub syntax_rules: Map<String, Value>,
    /// Arbitrary nested preferences, passed through verbatim to consumers.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub preferences: Map<String, Value>,
    /// Rule-name → pattern/replacement pairs; order is significant, later
    /// rules see the output of earlier ones.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub auto_corrections: Map<String, Value>,
    /// Trigger-name → phrase patterns that should store memory.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub auto_store_triggers: Map<String, Value>,
    /// Trigger-name → phrase patterns that should retrieve memory.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub auto_retrieve_triggers: Map<String, Value>,
    /// Startup actions executed once per session.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_initialization: Option<SessionInitialization>,
    /// Version, priority, and usage counters.
    #[serde(default)]
    pub metadata: ContextMetadata,
}

impl ContextDocument {
    /// Minimal document with the two required fields set.
    #[must_use]
    pub fn new(tool_category: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            tool_category: tool_category.into(),
            description: description.into(),
            auto_convert: false,
            syntax_rules: Map::new(),
            preferences: Map::new(),
            auto_corrections: Map::new(),
            auto_store_triggers: Map::new(),
            auto_retrieve_triggers: Map::new(),
            session_initialization: None,
            metadata: ContextMetadata::default(),
        }
    }

    /// Borrow the rule-keyed section addressed by `section`.
    #[must_use]
    pub fn section(&self, section: PatternSection) -> &Map<String, Value> {
        match section {
            PatternSection::AutoCorrections => &self.auto_corrections,
            PatternSection::AutoStoreTriggers => &self.auto_store_triggers,
            PatternSection::AutoRetrieveTriggers => &self.auto_retrieve_triggers,
        }
    }

    /// Mutably borrow the rule-keyed section addressed by `section`.
    pub fn section_mut(&mut self, section: PatternSection) -> &mut Map<String, Value> {
        match section {
            PatternSection::AutoCorrections => &mut self.auto_corrections,
            PatternSection::AutoStoreTriggers => &mut self.auto_store_triggers,
            PatternSection::AutoRetrieveTriggers => &mut self.auto_retrieve_triggers,
        }
    }
}

/// A single auto-correction rule: regex pattern and replacement with `$n`
/// backreference support. Typed view over one `auto_corrections` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectionRule {
    /// Regular-expression pattern, stored as a plain string.
    pub pattern: String,
    /// Replacement text; `$1`, `$2`, … refer to capture groups.
    pub replacement: String,
}

/// A single memory trigger: phrases that should fire a memory action.
/// Typed view over one `auto_store_triggers` / `auto_retrieve_triggers` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerRule {
    /// Phrases that fire the trigger.
    pub patterns: Vec<String>,
    /// Memory action to take (e.g. `"store_memory"`); advisory to the caller.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    /// Tags attached to the resulting memory entry.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Session initialization
// ─────────────────────────────────────────────────────────────────────────────

/// Startup-action declaration carried by a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionInitialization {
    /// When false the whole section is skipped by the initializer.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// The declared action lists.
    #[serde(default)]
    pub actions: StartupActions,
}

/// Action lists grouped by lifecycle moment. Only `on_startup` exists today.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StartupActions {
    /// Actions executed in order, once per session.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub on_startup: Vec<StartupAction>,
}

/// A single declarative startup action.
///
/// Closed set: the JSON shape is `{"action": "<name>", "parameters": {…}}`
/// and unknown action names are rejected at deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "parameters", rename_all = "snake_case")]
pub enum StartupAction {
    /// Recall memories matching a free-text query.
    RecallMemory(RecallParams),
    /// Search memories carrying the given tags.
    SearchByTag(SearchByTagParams),
}

impl StartupAction {
    /// The action's wire name, as written in documents and status records.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::RecallMemory(_) => "recall_memory",
            Self::SearchByTag(_) => "search_by_tag",
        }
    }

    /// The action's parameter block as a JSON value, for status echoing.
    #[must_use]
    pub fn parameters(&self) -> Value {
        let params = match self {
            Self::RecallMemory(p) => serde_json::to_value(p),
            Self::SearchByTag(p) => serde_json::to_value(p),
        };
        params.unwrap_or(Value::Null)
    }
}

/// Parameters for [`StartupAction::RecallMemory`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecallParams {
    /// Free-text query.
    pub query: String,
    /// Maximum results to retrieve.
    #[serde(default = "default_n_results")]
    pub n_results: usize,
}

/// Parameters for [`StartupAction::SearchByTag`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchByTagParams {
    /// Tags an entry must carry to match.
    pub tags: Vec<String>,
    /// Maximum results to retrieve.
    #[serde(default = "default_tag_limit")]
    pub limit: usize,
}

fn default_enabled() -> bool {
    true
}

fn default_n_results() -> usize {
    5
}

fn default_tag_limit() -> usize {
    10
}

// ─────────────────────────────────────────────────────────────────────────────
// Metadata
// ─────────────────────────────────────────────────────────────────────────────

/// Document metadata: version, targeting, priority, and usage counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextMetadata {
    /// Three-component semantic version of the document, when tracked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// RFC 3339 timestamp of the last write.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    /// Tool-name patterns this document applies to (e.g. `"git:*"`).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub applies_to_tools: Vec<String>,
    /// Relative importance when multiple contexts match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    /// Interaction counters maintained by the mutation pipeline.
    #[serde(default)]
    pub usage: UsageStats,
    /// RFC 3339 timestamp of the last applied optimization.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_optimization: Option<String>,
    /// How many optimizations have been applied.
    #[serde(default)]
    pub optimization_count: u64,
}

impl ContextMetadata {
    /// Stamp `last_updated` and the usage activity timestamp with now.
    pub fn record_activity(&mut self) {
        let now = utc_timestamp();
        self.last_updated = Some(now.clone());
        self.usage.last_activity = Some(now);
    }

    /// Stamp an applied optimization: bumps the counter, records the
    /// timestamp, and counts the interaction.
    pub fn record_optimization(&mut self) {
        self.optimization_count += 1;
        self.last_optimization = Some(utc_timestamp());
        self.usage.total_interactions += 1;
    }
}

/// Usage counters kept per document. All monotonically non-decreasing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageStats {
    /// Every successful mutating interaction.
    #[serde(default)]
    pub total_interactions: u64,
    /// Successful `create` operations (1 for documents created at runtime).
    #[serde(default)]
    pub creation_count: u64,
    /// Successful `update` operations.
    #[serde(default)]
    pub update_count: u64,
    /// Successful `add_pattern` operations.
    #[serde(default)]
    pub pattern_additions: u64,
    /// RFC 3339 timestamp of the most recent counted interaction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_activity: Option<String>,
}

impl UsageStats {
    /// Count a successful create.
    pub fn record_creation(&mut self) {
        self.creation_count += 1;
        self.total_interactions += 1;
    }

    /// Count a successful update.
    pub fn record_update(&mut self) {
        self.update_count += 1;
        self.total_interactions += 1;
    }

    /// Count a successful pattern append.
    pub fn record_pattern_addition(&mut self) {
        self.pattern_additions += 1;
        self.total_interactions += 1;
    }
}

/// Relative importance of a context when multiple apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Background/reference material.
    Low,
    /// Normal.
    Medium,
    /// Applied ahead of others.
    High,
}

// ─────────────────────────────────────────────────────────────────────────────
// Mutation payloads
// ─────────────────────────────────────────────────────────────────────────────

/// The rule-keyed sections a pattern append can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternSection {
    /// Regex find/replace rules.
    AutoCorrections,
    /// Memory store triggers.
    AutoStoreTriggers,
    /// Memory retrieve triggers.
    AutoRetrieveTriggers,
}

impl PatternSection {
    /// The section's JSON key.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AutoCorrections => "auto_corrections",
            Self::AutoStoreTriggers => "auto_store_triggers",
            Self::AutoRetrieveTriggers => "auto_retrieve_triggers",
        }
    }
}

impl std::fmt::Display for PatternSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Partial-update payload: each populated field replaces that section of the
/// target document wholesale (shallow per-section replace, never a deep
/// merge, so conflict semantics stay unambiguous).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectionUpdate {
    /// Replace the description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Replace the auto-convert gate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_convert: Option<bool>,
    /// Replace `syntax_rules`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub syntax_rules: Option<Map<String, Value>>,
    /// Replace `preferences`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferences: Option<Map<String, Value>>,
    /// Replace `auto_corrections`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_corrections: Option<Map<String, Value>>,
    /// Replace `auto_store_triggers`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_store_triggers: Option<Map<String, Value>>,
    /// Replace `auto_retrieve_triggers`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_retrieve_triggers: Option<Map<String, Value>>,
    /// Replace `session_initialization`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_initialization: Option<SessionInitialization>,
}

impl SectionUpdate {
    /// True when no field is populated (the update would be a no-op).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// A typed optimization applied through the mutation pipeline.
///
/// Closed set, tagged by `type` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Optimization {
    /// Add or replace rule entries in a named section.
    PatternImprovement {
        /// Section to modify.
        section: PatternSection,
        /// Entries merged in; existing rule names are replaced.
        entries: Map<String, Value>,
    },
    /// Overwrite scalar entries in `preferences`.
    PreferenceTuning {
        /// Key → value pairs merged into `preferences`.
        preferences: Map<String, Value>,
    },
    /// Overwrite entries in `syntax_rules`.
    RuleRefinement {
        /// Key → value pairs merged into `syntax_rules`.
        rules: Map<String, Value>,
    },
}

impl Optimization {
    /// Short label for logs and change summaries.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PatternImprovement { .. } => "pattern_improvement",
            Self::PreferenceTuning { .. } => "preference_tuning",
            Self::RuleRefinement { .. } => "rule_refinement",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
