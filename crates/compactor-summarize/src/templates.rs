//! Prompt templates, one per summarization strategy

use compactor_core::{Message, Strategy};

const TASK_STATE: &str = "You are summarizing a conversation so it can be compacted.
Extract only these facts:
- Current goals and success criteria
- Key entities such as names, IDs, filenames, branches and variables
- Constraints on security, compliance, budgets or environment
- Decisions taken and their rationale
- Outstanding actions, blockers and TODOs
- Error messages and whether they were resolved
- Technical details like API endpoints, data models and libraries

Write a tight factual summary of at most {max_tokens} tokens. Do not invent details.
Leave out dialogue and keep to facts.

--- CONVERSATION HISTORY ---
{conversation}

--- SUMMARY ---";

const BRIEF: &str = "You are writing a brief summary of a conversation.
Give a short bullet list covering:
- The main topic or problem
- Key actions taken
- Current status
- Next steps, if any

Stay under {max_tokens} tokens.

--- CONVERSATION HISTORY ---
{conversation}

--- SUMMARY ---";

const DECISION_LOG: &str = "You are writing a decision log for a conversation.
List decisions in the order they were made, each with:
- The question under discussion
- The decision
- Its rationale
- The outcome, if known

Use a numbered list and stay under {max_tokens} tokens.

--- CONVERSATION HISTORY ---
{conversation}

--- DECISION LOG ---";

const CODE_DELTA: &str = "You are summarizing the code changes discussed in a conversation.
For each file or component:
- Its path or name
- Whether it was added, modified or deleted
- Functions or APIs affected
- Why it changed

Stay under {max_tokens} tokens.

--- CONVERSATION HISTORY ---
{conversation}

--- CODE SUMMARY ---";

pub fn template_for(strategy: Strategy) -> &'static str {
    match strategy {
        Strategy::TaskState => TASK_STATE,
        Strategy::Brief => BRIEF,
        Strategy::DecisionLog => DECISION_LOG,
        Strategy::CodeDelta => CODE_DELTA,
    }
}

/// Look up a template by strategy name, falling back to task state
pub fn template_named(name: &str) -> &'static str {
    template_for(name.parse().unwrap_or_default())
}

/// Render messages as `ROLE: content` lines
pub fn render_conversation(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|m| format!("{}: {}", m.role.to_uppercase(), m.content))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn build_prompt(strategy: Strategy, messages: &[Message], max_tokens: usize) -> String {
    template_for(strategy)
        .replace("{max_tokens}", &max_tokens.to_string())
        .replace("{conversation}", &render_conversation(messages))
}
