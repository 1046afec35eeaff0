//! Offline summarization by sentence extraction

use compactor_core::{CompactPolicy, Message, SummarizationError, Summarizer};

/// Rough characters per token used to size the output
const CHARS_PER_TOKEN: usize = 4;

/// Keep the first `max_sentences` sentences of a text
pub fn leading_sentences(content: &str, max_sentences: usize) -> String {
    let sentences: Vec<&str> = content
        .split(['.', '!', '?', '\n'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    let mut out = sentences
        .iter()
        .take(max_sentences)
        .copied()
        .collect::<Vec<_>>()
        .join(". ");
    if sentences.len() > max_sentences {
        out.push_str("...");
    }
    out
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    out.push_str("...");
    out
}

/// Summarizer that needs no model: one `ROLE: lead sentence` line per message
///
/// Output stays within roughly `max_tokens * 4` characters.
#[derive(Debug, Clone, Copy)]
pub struct ExtractiveSummarizer {
    pub sentences_per_message: usize,
}

impl Default for ExtractiveSummarizer {
    fn default() -> Self {
        Self {
            sentences_per_message: 1,
        }
    }
}

impl Summarizer for ExtractiveSummarizer {
    fn summarize(
        &self,
        messages: &[Message],
        max_tokens: usize,
        _policy: &CompactPolicy,
    ) -> Result<String, SummarizationError> {
        let budget = max_tokens * CHARS_PER_TOKEN;
        let mut lines = Vec::new();
        let mut used = 0;

        for msg in messages {
            let lead = leading_sentences(&msg.content, self.sentences_per_message);
            if lead.is_empty() {
                continue;
            }
            let line = format!("{}: {}", msg.role.to_uppercase(), lead);
            let remaining = budget.saturating_sub(used);
            if remaining < 8 {
                break;
            }
            let line = truncate_chars(&line, remaining);
            used += line.chars().count() + 1;
            lines.push(line);
        }

        if lines.is_empty() {
            return Err(SummarizationError::EmptyResponse);
        }
        Ok(lines.join("\n"))
    }
}
