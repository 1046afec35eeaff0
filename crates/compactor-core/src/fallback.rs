//! Bounded summarization retries with shrinking budgets

use crate::ports::Summarizer;
use crate::types::{CompactPolicy, Message};
use tracing::{debug, warn};

pub const DEFAULT_MAX_RETRIES: usize = 2;

/// Smallest budget worth asking a summarizer for
pub const MIN_SUMMARY_TOKENS: usize = 100;

/// Summarize, halving the budget after each failure
///
/// Returns `None` when every attempt fails or the halved budget drops below
/// [`MIN_SUMMARY_TOKENS`]. Failures are logged and absorbed here.
pub fn summarize_with_fallback(
    summarizer: &dyn Summarizer,
    messages: &[Message],
    max_tokens: usize,
    policy: &CompactPolicy,
    max_retries: usize,
) -> Option<String> {
    let mut budget = max_tokens;

    for attempt in 0..max_retries {
        match summarizer.summarize(messages, budget, policy) {
            Ok(text) => {
                debug!(attempt, budget, "summarization succeeded");
                return Some(text);
            }
            Err(e) => {
                warn!(attempt, budget, error = %e, "summarization attempt failed");
                if attempt + 1 == max_retries {
                    return None;
                }
                budget /= 2;
                if budget < MIN_SUMMARY_TOKENS {
                    debug!(budget, "summary budget below floor, giving up");
                    return None;
                }
            }
        }
    }

    None
}
