//! Summarizers for compacted conversation history

mod chat;
mod extractive;
pub mod templates;

pub use chat::{ChatSummarizer, API_KEY_VAR, DEFAULT_ENDPOINT, MAX_COMPLETION_TOKENS, REQUEST_TIMEOUT};
pub use extractive::{leading_sentences, ExtractiveSummarizer};
