//! Exact BPE token counts through `tiktoken-rs`

use crate::tokens::MESSAGE_OVERHEAD;
use compactor_core::{Message, TokenEstimator};
use thiserror::Error;
use tiktoken_rs::CoreBPE;
use tracing::debug;

#[derive(Debug, Error)]
#[error("failed to load BPE encoding: {0}")]
pub struct EncodingError(String);

/// [`TokenEstimator`] backed by the model's tiktoken encoding
///
/// Models tiktoken does not know fall back to `cl100k_base`.
pub struct TiktokenEstimator {
    model: String,
    bpe: CoreBPE,
}

impl TiktokenEstimator {
    pub fn for_model(model: &str) -> Result<Self, EncodingError> {
        let bpe = match tiktoken_rs::get_bpe_from_model(model) {
            Ok(bpe) => bpe,
            Err(e) => {
                debug!(model, error = %e, "no encoding for model, using cl100k_base");
                tiktoken_rs::cl100k_base().map_err(|e| EncodingError(e.to_string()))?
            }
        };
        Ok(Self {
            model: model.to_string(),
            bpe,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl TokenEstimator for TiktokenEstimator {
    fn estimate_tokens(&self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }
        self.bpe.encode_with_special_tokens(text).len()
    }

    fn estimate_messages_tokens(&self, messages: &[Message]) -> usize {
        messages
            .iter()
            .map(|m| MESSAGE_OVERHEAD + self.estimate_tokens(&m.content))
            .sum()
    }

    fn estimate_tools_tokens(&self, tools: &[serde_json::Value]) -> usize {
        if tools.is_empty() {
            return 0;
        }
        serde_json::to_string(tools)
            .map(|s| self.estimate_tokens(&s))
            .unwrap_or(0)
    }
}
