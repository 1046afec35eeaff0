use crate::redact::Redactor;
use compactor_core::Message;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// A message as written to an archive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchivedMessage {
    pub role: String,
    pub content: String,
    #[serde(default)]
    pub meta: HashMap<String, Value>,
}

impl ArchivedMessage {
    pub fn from_message(msg: &Message, redactor: Option<&Redactor>) -> Self {
        let content = match redactor {
            Some(r) => r.redact(&msg.content),
            None => msg.content.clone(),
        };
        Self {
            role: msg.role.clone(),
            content,
            meta: msg.metadata.clone(),
        }
    }

    pub fn into_message(self) -> Message {
        Message {
            role: self.role,
            content: self.content,
            metadata: self.meta,
        }
    }
}

/// Restrict a session id to characters safe in a file name
pub fn sanitize_session_id(session_id: &str) -> String {
    let cleaned: String = session_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "default".to_string()
    } else {
        cleaned
    }
}
