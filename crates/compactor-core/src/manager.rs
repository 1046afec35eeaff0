//! Compaction orchestration: preflight check and explicit compaction

use crate::error::{CompactError, Result};
use crate::fallback::{summarize_with_fallback, DEFAULT_MAX_RETRIES, MIN_SUMMARY_TOKENS};
use crate::partition::{available_for_kept, reduce_keep_counts, MessagePartitioner, Partition};
use crate::ports::{Exporter, StorageAdapter, Summarizer, TokenEstimator};
use crate::types::{
    CompactConfig, CompactPolicy, CompactionResult, KeptCounts, Message, TokenBudget,
    DEVELOPER_ROLE, LABEL_KEY, PROTECTED_KEY,
};
use serde_json::json;
use std::borrow::Cow;
use tracing::{debug, info, warn};

/// How many times keep counts are reduced before giving up
pub const MAX_DEGRADATIONS: usize = 2;

pub const SUMMARY_PREFIX: &str = "[COMPACT-SUMMARY] ";
pub const SUMMARY_LABEL: &str = "Compaction Summary";

/// Telemetry event names
pub mod events {
    pub const TOKEN_ESTIMATE: &str = "compact.token_estimate";
    pub const TRIGGER_DECISION: &str = "compact.trigger_decision";
    pub const SUMMARY_CREATED: &str = "compact.summary_created";
    pub const PRUNED_MESSAGES: &str = "compact.pruned_messages";
}

#[derive(Debug, Clone, Copy, Default)]
struct KeptTokens {
    pinned: usize,
    recent: usize,
    tool_io: usize,
}

impl KeptTokens {
    fn total(&self) -> usize {
        self.pinned + self.recent + self.tool_io
    }
}

/// Drives compaction for a session
///
/// Holds a partitioner bound to the current policy. Degradation rebinds it,
/// which is why compaction takes `&mut self`: share a manager across sessions
/// only behind a lock.
pub struct CompactManager {
    config: CompactConfig,
    estimator: Box<dyn TokenEstimator>,
    summarizer: Box<dyn Summarizer>,
    exporter: Box<dyn Exporter>,
    storage: Option<Box<dyn StorageAdapter>>,
    partitioner: MessagePartitioner,
    compactions: u32,
}

impl CompactManager {
    pub fn new(
        config: CompactConfig,
        estimator: Box<dyn TokenEstimator>,
        summarizer: Box<dyn Summarizer>,
        exporter: Box<dyn Exporter>,
    ) -> Self {
        let partitioner = MessagePartitioner::new(config.policy().clone());
        Self {
            config,
            estimator,
            summarizer,
            exporter,
            storage: None,
            partitioner,
            compactions: 0,
        }
    }

    pub fn with_storage(mut self, storage: Box<dyn StorageAdapter>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn config(&self) -> &CompactConfig {
        &self.config
    }

    /// Policy currently bound, possibly degraded by an earlier run
    pub fn policy(&self) -> &CompactPolicy {
        self.partitioner.policy()
    }

    pub fn partitioner(&self) -> &MessagePartitioner {
        &self.partitioner
    }

    /// Rebind the partitioner to the configured policy
    pub fn reset_policy(&mut self) {
        self.partitioner = MessagePartitioner::new(self.config.policy().clone());
    }

    /// Estimate total tokens for a model call
    pub fn estimate_budget(
        &self,
        messages: &[Message],
        tools: Option<&[serde_json::Value]>,
        system_prompt: Option<&str>,
    ) -> TokenBudget {
        let developer: Vec<Message> = messages
            .iter()
            .filter(|m| m.role == DEVELOPER_ROLE)
            .cloned()
            .collect();
        let developer_tokens = self.estimator.estimate_messages_tokens(&developer);
        let mut budget = TokenBudget {
            developer_tokens,
            messages_tokens: self
                .estimator
                .estimate_messages_tokens(messages)
                .saturating_sub(developer_tokens),
            ..Default::default()
        };
        if let Some(prompt) = system_prompt.filter(|p| !p.is_empty()) {
            budget.system_tokens = self.estimator.estimate_system_tokens(prompt);
        }
        if let Some(tools) = tools.filter(|t| !t.is_empty()) {
            budget.tools_schema_tokens = self.estimator.estimate_tools_tokens(tools);
        }
        budget
    }

    /// Check the budget before a model call and compact only when triggered
    ///
    /// Untriggered calls hand back the input slice without copying it.
    pub fn preflight<'a>(
        &mut self,
        session_id: &str,
        messages: &'a [Message],
        tools: Option<&[serde_json::Value]>,
        system_prompt: Option<&str>,
    ) -> Result<Cow<'a, [Message]>> {
        let budget = self.estimate_budget(messages, tools, system_prompt);
        let max_tokens = self.config.max_context_tokens();

        self.emit(
            events::TOKEN_ESTIMATE,
            json!({
                "session_id": session_id,
                "model": self.config.model(),
                "tokens_estimated": budget.total(),
                "max_tokens": max_tokens,
                "usage_pct": budget.total() as f64 / max_tokens as f64,
                "breakdown": {
                    "system": budget.system_tokens,
                    "developer": budget.developer_tokens,
                    "messages": budget.messages_tokens,
                    "tools": budget.tools_schema_tokens,
                },
            }),
            None,
        );

        let triggered = self.partitioner.check_trigger(budget.total(), max_tokens);
        let policy = self.partitioner.policy();
        let decision = json!({
            "session_id": session_id,
            "triggered": triggered,
            "reason": if triggered {
                "usage_pct >= trigger_pct"
            } else {
                "usage_pct < trigger_pct"
            },
            "policy": {
                "trigger_pct": policy.trigger_pct(),
                "hard_cap_buffer": policy.hard_cap_buffer(),
                "strategy": policy.strategy(),
            },
        });
        self.emit(events::TRIGGER_DECISION, decision, None);
        debug!(
            session_id,
            tokens = budget.total(),
            max_tokens,
            triggered,
            "preflight trigger check"
        );

        if !triggered {
            self.exporter.flush();
            return Ok(Cow::Borrowed(messages));
        }

        let result = self.manual_compact(session_id, messages, "pre-flight trigger")?;
        Ok(Cow::Owned(result.messages))
    }

    /// Compact messages unconditionally
    ///
    /// Fails only when pinned, recent and tool I/O content cannot fit even
    /// after [`MAX_DEGRADATIONS`] reductions of the keep counts.
    pub fn manual_compact(
        &mut self,
        session_id: &str,
        messages: &[Message],
        note: &str,
    ) -> Result<CompactionResult> {
        self.compactions += 1;
        let step = self.compactions;
        let max_tokens = self.config.max_context_tokens();

        if self.storage_active() {
            self.store("transcript", |s| s.save_transcript(session_id, messages, step));
        }

        let tokens_before = self.estimator.estimate_messages_tokens(messages);

        let mut partition = self.partitioner.partition(messages);
        let mut kept = self.kept_tokens(&partition);
        let mut degradations = 0;

        while !self.partitioner.check_budget_feasibility(
            kept.pinned,
            kept.recent,
            kept.tool_io,
            max_tokens,
        ) {
            if degradations == MAX_DEGRADATIONS {
                // Deliver what preflight already buffered before bailing out
                self.exporter.flush();
                return Err(CompactError::InsufficientBudget {
                    required: kept.total(),
                    available: available_for_kept(max_tokens),
                });
            }
            let reduced = reduce_keep_counts(self.partitioner.policy());
            warn!(
                session_id,
                required = kept.total(),
                keep_recent_turns = reduced.keep_recent_turns(),
                keep_tool_io_pairs = reduced.keep_tool_io_pairs(),
                "kept content over budget, reducing keep counts"
            );
            self.partitioner = MessagePartitioner::new(reduced);
            partition = self.partitioner.partition(messages);
            kept = self.kept_tokens(&partition);
            degradations += 1;
        }

        let policy = self.partitioner.policy().clone();
        let remainder_tokens = self.estimator.estimate_messages_tokens(&partition.remainder);

        let summary = if partition.remainder.is_empty() {
            None
        } else {
            self.summarize_remainder(session_id, &partition, kept, remainder_tokens, &policy)
        };

        let Partition {
            pinned,
            recent,
            tool_io,
            remainder,
        } = partition;

        let counts = KeptCounts {
            pinned: pinned.len(),
            summary: usize::from(summary.is_some()),
            recent: recent.len(),
            tool_io: tool_io.len(),
        };

        let mut compacted = Vec::with_capacity(pinned.len() + 1 + recent.len() + tool_io.len());
        compacted.extend(pinned);
        compacted.extend(summary.iter().cloned());
        compacted.extend(recent);
        compacted.extend(tool_io);

        let tokens_after = self.estimator.estimate_messages_tokens(&compacted);
        let reduction_pct = if tokens_before > 0 {
            (tokens_before as f64 - tokens_after as f64) / tokens_before as f64 * 100.0
        } else {
            0.0
        };

        let pruned = json!({
            "session_id": session_id,
            "note": note,
            "pruned_count": remainder.len(),
            "kept": {
                "pinned": counts.pinned,
                "summary": counts.summary,
                "recent_turns": counts.recent,
                "tool_pairs": counts.tool_io,
            },
            "tokens_before": tokens_before,
            "tokens_after": tokens_after,
            "reduction_pct": reduction_pct,
            "degradations": degradations,
        });
        if self.storage_active() {
            let event = json!({ "type": events::PRUNED_MESSAGES, "properties": &pruned });
            self.store("event", |s| s.save_event(session_id, &event));
        }
        self.emit(events::PRUNED_MESSAGES, pruned, None);
        self.exporter.flush();

        info!(
            session_id,
            note,
            tokens_before,
            tokens_after,
            pruned = remainder.len(),
            summarized = summary.is_some(),
            "compaction complete"
        );

        Ok(CompactionResult {
            messages: compacted,
            summary,
            was_triggered: true,
            tokens_before,
            tokens_after,
            pruned_count: remainder.len(),
            kept: counts,
            policy_applied: policy,
        })
    }

    fn summarize_remainder(
        &mut self,
        session_id: &str,
        partition: &Partition,
        kept: KeptTokens,
        remainder_tokens: usize,
        policy: &CompactPolicy,
    ) -> Option<Message> {
        let available = self.config.max_context_tokens() as i64
            - policy.hard_cap_buffer() as i64
            - kept.total() as i64;
        if available <= MIN_SUMMARY_TOKENS as i64 {
            debug!(session_id, available, "no room for a summary, pruning only");
            return None;
        }

        let text = summarize_with_fallback(
            self.summarizer.as_ref(),
            &partition.remainder,
            available as usize,
            policy,
            DEFAULT_MAX_RETRIES,
        )?;

        let message = Message::assistant(format!("{SUMMARY_PREFIX}{text}"))
            .with_metadata(PROTECTED_KEY, true)
            .with_metadata(LABEL_KEY, SUMMARY_LABEL);

        // A summary that costs as much as what it replaces only grows the context
        let message_tokens = self
            .estimator
            .estimate_messages_tokens(std::slice::from_ref(&message));
        if message_tokens >= remainder_tokens {
            debug!(
                session_id,
                message_tokens, remainder_tokens, "summary not smaller than remainder, pruning only"
            );
            return None;
        }

        let summary_tokens = self.estimator.estimate_tokens(&text);
        let compression_ratio = if remainder_tokens > 0 {
            summary_tokens as f64 / remainder_tokens as f64
        } else {
            0.0
        };
        self.emit(
            events::SUMMARY_CREATED,
            json!({
                "session_id": session_id,
                "strategy": policy.strategy(),
                "input_messages": partition.remainder.len(),
                "summary_tokens": summary_tokens,
                "compression_ratio": compression_ratio,
            }),
            Some(json!({ "summary": &text })),
        );

        if self.storage_active() {
            let step = self.compactions;
            self.store("summary", |s| s.save_summary(session_id, &message, step));
        }
        Some(message)
    }

    fn kept_tokens(&self, partition: &Partition) -> KeptTokens {
        KeptTokens {
            pinned: self.estimator.estimate_messages_tokens(&partition.pinned),
            recent: self.estimator.estimate_messages_tokens(&partition.recent),
            tool_io: self.estimator.estimate_messages_tokens(&partition.tool_io),
        }
    }

    fn emit(
        &mut self,
        event_type: &str,
        properties: serde_json::Value,
        payload: Option<serde_json::Value>,
    ) {
        if self.config.telemetry_enabled() {
            self.exporter.emit_event(event_type, properties, payload);
        }
    }

    fn storage_active(&self) -> bool {
        self.storage.is_some() && self.config.storage_enabled()
    }

    fn store<F>(&self, what: &str, op: F)
    where
        F: FnOnce(&dyn StorageAdapter) -> anyhow::Result<()>,
    {
        if let Some(storage) = &self.storage {
            if let Err(e) = op(storage.as_ref()) {
                warn!(what, error = %e, "failed to archive compaction data");
            }
        }
    }
}
