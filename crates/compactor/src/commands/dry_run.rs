use crate::cli::{MessagesInput, RuntimeArgs};
use crate::{host, runtime};
use compactor_core::{CompactManager, Message};
use serde::Serialize;

/// What a compaction would do, without doing it
#[derive(Debug, Serialize, PartialEq)]
pub struct Plan {
    pub total: usize,
    pub pinned: usize,
    pub recent: usize,
    pub tool_io: usize,
    pub remainder: usize,
    pub tokens_estimated: usize,
    pub max_context_tokens: usize,
    pub triggered: bool,
}

pub fn plan(manager: &CompactManager, messages: &[Message]) -> Plan {
    let partition = manager.partitioner().partition(messages);
    let tokens = manager.estimate_budget(messages, None, None).total();
    let max = manager.config().max_context_tokens();
    Plan {
        total: messages.len(),
        pinned: partition.pinned.len(),
        recent: partition.recent.len(),
        tool_io: partition.tool_io.len(),
        remainder: partition.remainder.len(),
        tokens_estimated: tokens,
        max_context_tokens: max,
        triggered: manager.partitioner().check_trigger(tokens, max),
    }
}

pub fn run(args: &RuntimeArgs, input: &MessagesInput) -> anyhow::Result<()> {
    let messages = host::read_messages(input)?;
    let config = runtime::load_config(args)?;
    let manager = runtime::build_manager(config, args)?;
    let plan = plan(&manager, &messages);

    println!("Compaction plan:");
    println!("  Total messages: {}", plan.total);
    println!("  Pinned: {}", plan.pinned);
    println!("  Recent: {}", plan.recent);
    println!("  Tool I/O: {}", plan.tool_io);
    println!("  Eligible for pruning: {}", plan.remainder);
    println!(
        "  Estimated tokens: {} / {}",
        plan.tokens_estimated, plan.max_context_tokens
    );
    println!(
        "  Trigger needed: {}",
        if plan.triggered { "yes" } else { "no" }
    );
    Ok(())
}
