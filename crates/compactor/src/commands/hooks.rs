use crate::cli::RuntimeArgs;
use crate::host::{self, HostMessage};
use crate::runtime;
use compactor_core::CompactManager;
use serde::Deserialize;
use serde_json::{json, Value};
use std::io::{self, Read, Write};
use tracing::warn;

fn default_session() -> String {
    "default".to_string()
}

/// Payload the host sends before each model call
#[derive(Debug, Deserialize)]
struct BeforeModelCall {
    #[serde(default = "default_session")]
    session_id: String,
    #[serde(default)]
    messages: Vec<HostMessage>,
    #[serde(default)]
    tools: Option<Vec<Value>>,
    #[serde(default)]
    system_prompt: Option<String>,
}

fn try_before_model_call(manager: &mut CompactManager, input: &str) -> anyhow::Result<Value> {
    let call: BeforeModelCall = serde_json::from_str(input)?;
    let messages: Vec<_> = call
        .messages
        .into_iter()
        .map(HostMessage::into_message)
        .collect();

    let compacted = manager.preflight(
        &call.session_id,
        &messages,
        call.tools.as_deref(),
        call.system_prompt.as_deref(),
    )?;
    Ok(json!({ "messages": host::to_host(&compacted) }))
}

/// The host's messages, untouched
fn echo(input: &str) -> Value {
    let messages = serde_json::from_str::<Value>(input)
        .ok()
        .and_then(|v| v.get("messages").cloned())
        .unwrap_or_else(|| json!([]));
    json!({ "messages": messages })
}

/// Run pre-flight compaction on a hook payload
///
/// Never fails: any error is logged and the input messages are echoed, so a
/// broken compactor cannot block the host's model call.
pub fn before_model_call(manager: &mut CompactManager, input: &str) -> Value {
    match try_before_model_call(manager, input) {
        Ok(output) => output,
        Err(e) => {
            warn!(error = %e, "before-model-call hook failed, passing messages through");
            echo(input)
        }
    }
}

pub fn hook_before_model_call(args: &RuntimeArgs) -> anyhow::Result<()> {
    let mut input = String::new();
    io::stdin().read_to_string(&mut input)?;

    let output = match runtime::load_config(args).and_then(|c| runtime::build_manager(c, args)) {
        Ok(mut manager) => before_model_call(&mut manager, &input),
        Err(e) => {
            warn!(error = %e, "cannot set up compaction, passing messages through");
            echo(&input)
        }
    };

    let output_json = serde_json::to_string(&output)?;
    io::stdout().write_all(output_json.as_bytes())?;
    io::stdout().flush()?;
    Ok(())
}
