//! Message partitioning and budget checks

use crate::types::{CompactPolicy, Message, TOOL_ROLE};

/// Tokens held back for the model's own response
pub const RESPONSE_RESERVE: usize = 2048;

/// Messages split into four disjoint groups, each in original order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Partition {
    /// Never-prune roles and protected messages
    pub pinned: Vec<Message>,
    /// Trailing window of turns kept verbatim
    pub recent: Vec<Message>,
    /// Trailing tool results kept verbatim
    pub tool_io: Vec<Message>,
    /// Oldest content, summarized or dropped
    pub remainder: Vec<Message>,
}

impl Partition {
    pub fn len(&self) -> usize {
        self.pinned.len() + self.recent.len() + self.tool_io.len() + self.remainder.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Group {
    Pinned,
    Recent,
    ToolIo,
    Remainder,
}

/// Splits messages according to a policy
#[derive(Debug, Clone)]
pub struct MessagePartitioner {
    policy: CompactPolicy,
}

impl MessagePartitioner {
    pub fn new(policy: CompactPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &CompactPolicy {
        &self.policy
    }

    /// Partition messages into pinned, recent, tool I/O and remainder
    ///
    /// Groups are assigned by position, so duplicate messages are classified
    /// independently and the union of the groups is the input multiset.
    pub fn partition(&self, messages: &[Message]) -> Partition {
        let mut groups = vec![Group::Remainder; messages.len()];

        // Step 1: pinned, regardless of position
        for (group, msg) in groups.iter_mut().zip(messages) {
            if self.policy.never_prunes(&msg.role) || msg.is_protected() {
                *group = Group::Pinned;
            }
        }

        // Step 2: trailing window of unpinned messages until enough turns are seen
        let mut turns = 0;
        for idx in (0..messages.len()).rev() {
            if turns >= self.policy.keep_recent_turns() {
                break;
            }
            if groups[idx] == Group::Pinned {
                continue;
            }
            groups[idx] = Group::Recent;
            if messages[idx].is_turn() {
                turns += 1;
            }
        }

        // Step 3: trailing tool results among what is left
        let mut tool_results = 0;
        for idx in (0..messages.len()).rev() {
            if tool_results >= self.policy.keep_tool_io_pairs() {
                break;
            }
            if groups[idx] == Group::Remainder && messages[idx].role == TOOL_ROLE {
                groups[idx] = Group::ToolIo;
                tool_results += 1;
            }
        }

        // Step 4: everything else stays in the remainder
        let mut partition = Partition::default();
        for (group, msg) in groups.into_iter().zip(messages) {
            let bucket = match group {
                Group::Pinned => &mut partition.pinned,
                Group::Recent => &mut partition.recent,
                Group::ToolIo => &mut partition.tool_io,
                Group::Remainder => &mut partition.remainder,
            };
            bucket.push(msg.clone());
        }
        partition
    }

    /// Whether estimated usage has crossed the trigger threshold
    ///
    /// A hard cap buffer that leaves no effective budget always triggers.
    pub fn check_trigger(&self, tokens_estimated: usize, max_context_tokens: usize) -> bool {
        let effective_max = max_context_tokens as i64 - self.policy.hard_cap_buffer() as i64;
        if effective_max <= 0 {
            return true;
        }
        let usage_pct = tokens_estimated as f64 / effective_max as f64;
        usage_pct >= self.policy.trigger_pct()
    }

    /// Whether the kept groups fit below the context ceiling minus the response reserve
    pub fn check_budget_feasibility(
        &self,
        pinned_tokens: usize,
        recent_tokens: usize,
        tool_io_tokens: usize,
        max_context_tokens: usize,
    ) -> bool {
        let required = pinned_tokens + recent_tokens + tool_io_tokens;
        required as i64 <= available_for_kept(max_context_tokens)
    }
}

/// Tokens left for kept content once the response reserve is held back
pub(crate) fn available_for_kept(max_context_tokens: usize) -> i64 {
    max_context_tokens as i64 - RESPONSE_RESERVE as i64
}

/// Degrade a policy by keeping one fewer turn and one fewer tool result
///
/// Both counts floor at 1; every other field is copied.
pub fn reduce_keep_counts(policy: &CompactPolicy) -> CompactPolicy {
    policy.with_keep_counts(
        policy.keep_recent_turns().saturating_sub(1),
        policy.keep_tool_io_pairs().saturating_sub(1),
    )
}
