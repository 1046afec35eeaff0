//! Core value types for compaction

use crate::error::CompactError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Metadata key marking a message as never prunable
pub const PROTECTED_KEY: &str = "protected";

/// Metadata key carrying an optional display label
pub const LABEL_KEY: &str = "label";

/// Roles counted as conversation turns
pub const TURN_ROLES: [&str; 2] = ["user", "assistant"];

/// Role of tool results kept by the tool I/O window
pub const TOOL_ROLE: &str = "tool";

/// Role of host-authored instructions, budgeted separately from the conversation
pub const DEVELOPER_ROLE: &str = "developer";

/// A single conversation message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
    #[serde(default, alias = "meta", skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Message {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
            metadata: HashMap::new(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new("system", content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new("assistant", content)
    }

    pub fn tool(content: impl Into<String>) -> Self {
        Self::new(TOOL_ROLE, content)
    }

    /// Developer-authored message that is never compacted
    pub fn protected(content: impl Into<String>, label: Option<&str>) -> Self {
        let mut msg = Self::new(DEVELOPER_ROLE, content).with_metadata(PROTECTED_KEY, true);
        if let Some(label) = label {
            msg = msg.with_metadata(LABEL_KEY, label);
        }
        msg
    }

    pub fn with_metadata(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Only a literal `true` counts; truthy strings or numbers do not
    pub fn is_protected(&self) -> bool {
        self.metadata.get(PROTECTED_KEY) == Some(&serde_json::Value::Bool(true))
    }

    pub fn label(&self) -> Option<&str> {
        self.metadata.get(LABEL_KEY).and_then(|v| v.as_str())
    }

    pub fn is_turn(&self) -> bool {
        TURN_ROLES.contains(&self.role.as_str())
    }
}

/// Summarization template selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    #[default]
    TaskState,
    Brief,
    DecisionLog,
    CodeDelta,
}

impl Strategy {
    pub const ALL: [Strategy; 4] = [
        Strategy::TaskState,
        Strategy::Brief,
        Strategy::DecisionLog,
        Strategy::CodeDelta,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::TaskState => "task_state",
            Strategy::Brief => "brief",
            Strategy::DecisionLog => "decision_log",
            Strategy::CodeDelta => "code_delta",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = CompactError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Strategy::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == s)
            .ok_or_else(|| {
                CompactError::InvalidConfig(format!(
                    "strategy must be one of task_state, brief, decision_log, code_delta (got {s:?})"
                ))
            })
    }
}

/// Unvalidated policy fields, as read from config files or built by hand
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicySettings {
    pub trigger_pct: f64,
    pub hard_cap_buffer: usize,
    pub keep_recent_turns: usize,
    pub keep_tool_io_pairs: usize,
    pub roles_never_prune: Vec<String>,
    pub strategy: Strategy,
}

impl Default for PolicySettings {
    fn default() -> Self {
        Self {
            trigger_pct: 0.85,
            hard_cap_buffer: 1500,
            keep_recent_turns: 6,
            keep_tool_io_pairs: 4,
            roles_never_prune: vec!["system".to_string(), DEVELOPER_ROLE.to_string()],
            strategy: Strategy::TaskState,
        }
    }
}

impl PolicySettings {
    pub fn build(self) -> Result<CompactPolicy, CompactError> {
        CompactPolicy::try_from(self)
    }
}

/// Validated compaction policy
///
/// Fields are private so a policy can only exist in a valid state: every
/// constructor goes through [`PolicySettings::build`], including
/// deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PolicySettings", into = "PolicySettings")]
pub struct CompactPolicy {
    trigger_pct: f64,
    hard_cap_buffer: usize,
    keep_recent_turns: usize,
    keep_tool_io_pairs: usize,
    roles_never_prune: Vec<String>,
    strategy: Strategy,
}

impl CompactPolicy {
    pub fn trigger_pct(&self) -> f64 {
        self.trigger_pct
    }

    pub fn hard_cap_buffer(&self) -> usize {
        self.hard_cap_buffer
    }

    pub fn keep_recent_turns(&self) -> usize {
        self.keep_recent_turns
    }

    pub fn keep_tool_io_pairs(&self) -> usize {
        self.keep_tool_io_pairs
    }

    pub fn roles_never_prune(&self) -> &[String] {
        &self.roles_never_prune
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn never_prunes(&self, role: &str) -> bool {
        self.roles_never_prune.iter().any(|r| r == role)
    }

    /// Copy of this policy with both keep counts set, floored at 1
    pub(crate) fn with_keep_counts(&self, recent_turns: usize, tool_io_pairs: usize) -> Self {
        Self {
            keep_recent_turns: recent_turns.max(1),
            keep_tool_io_pairs: tool_io_pairs.max(1),
            ..self.clone()
        }
    }
}

impl Default for CompactPolicy {
    fn default() -> Self {
        let settings = PolicySettings::default();
        Self {
            trigger_pct: settings.trigger_pct,
            hard_cap_buffer: settings.hard_cap_buffer,
            keep_recent_turns: settings.keep_recent_turns,
            keep_tool_io_pairs: settings.keep_tool_io_pairs,
            roles_never_prune: settings.roles_never_prune,
            strategy: settings.strategy,
        }
    }
}

impl TryFrom<PolicySettings> for CompactPolicy {
    type Error = CompactError;

    fn try_from(s: PolicySettings) -> Result<Self, Self::Error> {
        if !(s.trigger_pct > 0.0 && s.trigger_pct <= 1.0) {
            return Err(CompactError::InvalidConfig(format!(
                "trigger_pct must be in range (0.0, 1.0] (got {})",
                s.trigger_pct
            )));
        }
        if s.keep_recent_turns < 1 {
            return Err(CompactError::InvalidConfig(
                "keep_recent_turns must be >= 1".to_string(),
            ));
        }
        if s.keep_tool_io_pairs < 1 {
            return Err(CompactError::InvalidConfig(
                "keep_tool_io_pairs must be >= 1".to_string(),
            ));
        }
        Ok(Self {
            trigger_pct: s.trigger_pct,
            hard_cap_buffer: s.hard_cap_buffer,
            keep_recent_turns: s.keep_recent_turns,
            keep_tool_io_pairs: s.keep_tool_io_pairs,
            roles_never_prune: s.roles_never_prune,
            strategy: s.strategy,
        })
    }
}

impl From<CompactPolicy> for PolicySettings {
    fn from(p: CompactPolicy) -> Self {
        Self {
            trigger_pct: p.trigger_pct,
            hard_cap_buffer: p.hard_cap_buffer,
            keep_recent_turns: p.keep_recent_turns,
            keep_tool_io_pairs: p.keep_tool_io_pairs,
            roles_never_prune: p.roles_never_prune,
            strategy: p.strategy,
        }
    }
}

/// Unvalidated manager configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigSettings {
    pub model: String,
    pub max_context_tokens: usize,
    pub policy: PolicySettings,
    pub telemetry_enabled: bool,
    pub storage_enabled: bool,
    pub redaction_enabled: bool,
    /// Endpoint for the HTTP exporter; console export when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export_url: Option<String>,
}

impl Default for ConfigSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4".to_string(),
            max_context_tokens: 128_000,
            policy: PolicySettings::default(),
            telemetry_enabled: true,
            storage_enabled: true,
            redaction_enabled: true,
            export_url: None,
        }
    }
}

impl ConfigSettings {
    pub fn build(self) -> Result<CompactConfig, CompactError> {
        CompactConfig::try_from(self)
    }
}

/// Validated manager configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ConfigSettings", into = "ConfigSettings")]
pub struct CompactConfig {
    model: String,
    max_context_tokens: usize,
    policy: CompactPolicy,
    telemetry_enabled: bool,
    storage_enabled: bool,
    redaction_enabled: bool,
    export_url: Option<String>,
}

impl CompactConfig {
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn max_context_tokens(&self) -> usize {
        self.max_context_tokens
    }

    pub fn policy(&self) -> &CompactPolicy {
        &self.policy
    }

    pub fn telemetry_enabled(&self) -> bool {
        self.telemetry_enabled
    }

    pub fn storage_enabled(&self) -> bool {
        self.storage_enabled
    }

    pub fn redaction_enabled(&self) -> bool {
        self.redaction_enabled
    }

    pub fn export_url(&self) -> Option<&str> {
        self.export_url.as_deref()
    }
}

impl Default for CompactConfig {
    fn default() -> Self {
        let settings = ConfigSettings::default();
        Self {
            model: settings.model,
            max_context_tokens: settings.max_context_tokens,
            policy: CompactPolicy::default(),
            telemetry_enabled: settings.telemetry_enabled,
            storage_enabled: settings.storage_enabled,
            redaction_enabled: settings.redaction_enabled,
            export_url: settings.export_url,
        }
    }
}

impl TryFrom<ConfigSettings> for CompactConfig {
    type Error = CompactError;

    fn try_from(s: ConfigSettings) -> Result<Self, Self::Error> {
        if s.max_context_tokens < 1000 {
            return Err(CompactError::InvalidConfig(format!(
                "max_context_tokens must be >= 1000 (got {})",
                s.max_context_tokens
            )));
        }
        if s.model.trim().is_empty() {
            return Err(CompactError::InvalidConfig(
                "model must not be empty".to_string(),
            ));
        }
        Ok(Self {
            model: s.model,
            max_context_tokens: s.max_context_tokens,
            policy: s.policy.build()?,
            telemetry_enabled: s.telemetry_enabled,
            storage_enabled: s.storage_enabled,
            redaction_enabled: s.redaction_enabled,
            export_url: s.export_url,
        })
    }
}

impl From<CompactConfig> for ConfigSettings {
    fn from(c: CompactConfig) -> Self {
        Self {
            model: c.model,
            max_context_tokens: c.max_context_tokens,
            policy: c.policy.into(),
            telemetry_enabled: c.telemetry_enabled,
            storage_enabled: c.storage_enabled,
            redaction_enabled: c.redaction_enabled,
            export_url: c.export_url,
        }
    }
}

/// Token accounting for a single model call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBudget {
    pub system_tokens: usize,
    pub developer_tokens: usize,
    pub tools_schema_tokens: usize,
    pub messages_tokens: usize,
}

impl TokenBudget {
    pub fn total(&self) -> usize {
        self.system_tokens + self.developer_tokens + self.tools_schema_tokens + self.messages_tokens
    }
}

/// Number of messages kept per category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeptCounts {
    pub pinned: usize,
    pub summary: usize,
    pub recent: usize,
    pub tool_io: usize,
}

/// Outcome of a compaction run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompactionResult {
    pub messages: Vec<Message>,
    pub summary: Option<Message>,
    pub was_triggered: bool,
    pub tokens_before: usize,
    pub tokens_after: usize,
    pub pruned_count: usize,
    pub kept: KeptCounts,
    /// Policy in force for this run, degraded if the loop had to shrink it
    pub policy_applied: CompactPolicy,
}

impl CompactionResult {
    pub fn tokens_saved(&self) -> usize {
        self.tokens_before.saturating_sub(self.tokens_after)
    }
}
