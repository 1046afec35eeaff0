use crate::cli::RuntimeArgs;
use crate::runtime;
use anyhow::Context;
use compactor_core::CompactConfig;

pub fn describe(config: &CompactConfig) -> Vec<String> {
    let policy = config.policy();
    vec![
        format!("Model: {}", config.model()),
        format!("Max tokens: {}", config.max_context_tokens()),
        format!("Trigger: {:.0}%", policy.trigger_pct() * 100.0),
        format!("Hard cap buffer: {}", policy.hard_cap_buffer()),
        format!(
            "Keep: {} turns, {} tool results",
            policy.keep_recent_turns(),
            policy.keep_tool_io_pairs()
        ),
        format!("Strategy: {}", policy.strategy()),
    ]
}

pub fn run(args: &RuntimeArgs) -> anyhow::Result<()> {
    let config = runtime::load_config(args).context("configuration error")?;
    println!("Configuration is valid");
    for line in describe(&config) {
        println!("  {line}");
    }
    Ok(())
}
