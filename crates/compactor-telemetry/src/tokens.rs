//! Heuristic token estimation

use compactor_core::{Message, TokenEstimator};

/// Role and separator tokens charged per chat message
pub const MESSAGE_OVERHEAD: usize = 3;

const CODE_CHARS_PER_TOKEN: f64 = 2.5;
const MARKDOWN_CHARS_PER_TOKEN: f64 = 3.0;
const PROSE_CHARS_PER_TOKEN: f64 = 4.0;

/// Estimated share of code, markdown and prose in a text
#[derive(Debug, Clone, Copy, PartialEq)]
struct ContentMix {
    code: f64,
    markdown: f64,
}

impl ContentMix {
    fn detect(text: &str) -> Self {
        let chars = text.len() as f64;
        let lines = text.lines().count().max(1) as f64;

        let symbols = text
            .chars()
            .filter(|c| "{}[]();=<>|&!@#$%^*~`\\".contains(*c))
            .count() as f64;
        let md_marks = text.chars().filter(|c| "#-*_>".contains(*c)).count() as f64;
        let indented = text
            .lines()
            .filter(|l| l.starts_with("    ") || l.starts_with('\t'))
            .count() as f64;

        let code = (symbols / chars * 10.0 + indented / lines * 0.5).min(1.0);
        let markdown = (md_marks / chars * 8.0).min(1.0 - code);
        Self { code, markdown }
    }

    fn chars_per_token(&self) -> f64 {
        let prose = 1.0 - self.code - self.markdown;
        self.code * CODE_CHARS_PER_TOKEN
            + self.markdown * MARKDOWN_CHARS_PER_TOKEN
            + prose * PROSE_CHARS_PER_TOKEN
    }
}

/// Estimate BPE token count from text
///
/// Code-heavy text runs near 2.5 chars/token, markdown near 3.0 and prose
/// near 4.0; the ratio is blended from the detected mix.
pub fn estimate_tokens(text: &str) -> usize {
    if text.is_empty() {
        return 0;
    }
    let ratio = ContentMix::detect(text).chars_per_token();
    (text.len() as f64 / ratio).max(1.0) as usize
}

/// Offline [`TokenEstimator`] backed by [`estimate_tokens`]
#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicEstimator;

impl TokenEstimator for HeuristicEstimator {
    fn estimate_tokens(&self, text: &str) -> usize {
        estimate_tokens(text)
    }

    fn estimate_messages_tokens(&self, messages: &[Message]) -> usize {
        messages
            .iter()
            .map(|m| MESSAGE_OVERHEAD + estimate_tokens(&m.content))
            .sum()
    }

    fn estimate_tools_tokens(&self, tools: &[serde_json::Value]) -> usize {
        if tools.is_empty() {
            return 0;
        }
        serde_json::to_string(tools)
            .map(|s| estimate_tokens(&s))
            .unwrap_or(0)
    }
}
