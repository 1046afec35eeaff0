use crate::cli::{MessagesInput, RuntimeArgs};
use crate::{host, runtime};
use compactor_core::CompactionResult;
use compactor_telemetry::atomic_write;
use serde_json::{json, Value};
use std::path::Path;

/// Compacted messages plus run statistics, as written by `--output`
pub fn render_output(result: &CompactionResult) -> Value {
    json!({
        "messages": host::to_host(&result.messages),
        "statistics": {
            "tokens_before": result.tokens_before,
            "tokens_after": result.tokens_after,
            "pruned_count": result.pruned_count,
            "kept": result.kept,
            "policy_applied": result.policy_applied,
        },
    })
}

pub fn run(
    args: &RuntimeArgs,
    input: &MessagesInput,
    session: &str,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let messages = host::read_messages(input)?;
    let config = runtime::load_config(args)?;
    let mut manager = runtime::build_manager(config, args)?;
    let result = manager.manual_compact(session, &messages, "cli compact")?;

    println!("Compaction result:");
    println!("  Tokens before: {}", result.tokens_before);
    println!("  Tokens after: {}", result.tokens_after);
    println!("  Reduction: {} tokens", result.tokens_saved());
    println!("  Pruned: {} messages", result.pruned_count);
    println!("  Kept:");
    println!("    pinned: {}", result.kept.pinned);
    println!("    summary: {}", result.kept.summary);
    println!("    recent: {}", result.kept.recent);
    println!("    tool_io: {}", result.kept.tool_io);

    if let Some(path) = output {
        let json = serde_json::to_string_pretty(&render_output(&result))?;
        atomic_write(path, json.as_bytes())?;
        println!("  Output saved to: {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::SummarizerKind;

    fn long_conversation() -> String {
        let mut msgs = vec![json!({"role": "system", "content": "You are helpful"})];
        for i in 0..12 {
            msgs.push(json!({"role": "user", "content": format!("Question {i}. Details follow.")}));
            msgs.push(json!({"role": "assistant", "content": format!("Answer {i}. More text.")}));
        }
        serde_json::to_string(&msgs).unwrap()
    }

    #[test]
    fn test_compact_writes_output() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.json");
        let config = dir.path().join("compact.json");
        std::fs::write(
            &config,
            r#"{"telemetry_enabled": false, "policy": {"keep_recent_turns": 2}}"#,
        )
        .unwrap();

        let args = RuntimeArgs {
            config: Some(config),
            summarizer: SummarizerKind::Extractive,
            ..Default::default()
        };
        let input = MessagesInput {
            messages: Some(long_conversation()),
            file: None,
        };
        run(&args, &input, "cli-session", Some(&output)).unwrap();

        let written: Value = serde_json::from_str(&std::fs::read_to_string(&output).unwrap())
            .unwrap();
        let messages = written["messages"].as_array().unwrap();
        // system + summary + last two turns
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0]["role"], "system");
        assert!(messages[1]["content"]
            .as_str()
            .unwrap()
            .starts_with("[COMPACT-SUMMARY] "));
        assert_eq!(messages[3]["content"], "Answer 11. More text.");
        assert_eq!(written["statistics"]["pruned_count"], 22);
        assert_eq!(written["statistics"]["kept"]["summary"], 1);
    }

    #[test]
    fn test_compact_rejects_bad_messages() {
        let args = RuntimeArgs {
            summarizer: SummarizerKind::Extractive,
            config: Some(std::path::PathBuf::from("/nonexistent/compact.json")),
            ..Default::default()
        };
        let input = MessagesInput {
            messages: Some("not json".to_string()),
            file: None,
        };
        assert!(run(&args, &input, "s", None).is_err());
    }
}
