//! Conversion between host-runtime message JSON and [`Message`]

use crate::cli::MessagesInput;
use compactor_core::Message;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::io::Read;

/// A message as the host runtime sends it; only `content` is required
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostMessage {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Value,
    #[serde(
        default,
        alias = "metadata",
        skip_serializing_if = "HashMap::is_empty"
    )]
    pub meta: HashMap<String, Value>,
}

impl HostMessage {
    pub fn into_message(self) -> Message {
        let content = match self.content {
            Value::String(s) => s,
            Value::Null => String::new(),
            other => other.to_string(),
        };
        Message {
            role: self.role.unwrap_or_else(|| "user".to_string()),
            content,
            metadata: self.meta,
        }
    }
}

impl From<&Message> for HostMessage {
    fn from(msg: &Message) -> Self {
        Self {
            role: Some(msg.role.clone()),
            content: Value::String(msg.content.clone()),
            meta: msg.metadata.clone(),
        }
    }
}

pub fn parse_messages(json: &str) -> anyhow::Result<Vec<Message>> {
    let host: Vec<HostMessage> = serde_json::from_str(json)?;
    Ok(host.into_iter().map(HostMessage::into_message).collect())
}

pub fn to_host(messages: &[Message]) -> Vec<HostMessage> {
    messages.iter().map(HostMessage::from).collect()
}

/// Read messages from `--messages`, `--file`, or stdin
pub fn read_messages(input: &MessagesInput) -> anyhow::Result<Vec<Message>> {
    let json = match (&input.messages, &input.file) {
        (Some(inline), _) => inline.clone(),
        (None, Some(path)) => std::fs::read_to_string(path)?,
        (None, None) => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    parse_messages(&json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_role_defaults_to_user() {
        let msgs = parse_messages(r#"[{"content": "hi"}]"#).unwrap();
        assert_eq!(msgs, vec![Message::user("hi")]);
    }

    #[test]
    fn test_meta_and_metadata_keys() {
        let msgs = parse_messages(
            r#"[
                {"role": "developer", "content": "a", "meta": {"protected": true}},
                {"role": "user", "content": "b", "metadata": {"label": "x"}}
            ]"#,
        )
        .unwrap();
        assert!(msgs[0].is_protected());
        assert_eq!(msgs[1].label(), Some("x"));
    }

    #[test]
    fn test_non_string_content() {
        let msgs = parse_messages(
            r#"[{"role": "tool", "content": null}, {"role": "user", "content": [{"type": "text"}]}]"#,
        )
        .unwrap();
        assert_eq!(msgs[0].content, "");
        assert_eq!(msgs[1].content, r#"[{"type":"text"}]"#);
    }

    #[test]
    fn test_to_host_omits_empty_meta() {
        let msgs = vec![
            Message::user("plain"),
            Message::protected("rules", Some("Policy")),
        ];
        let value = serde_json::to_value(to_host(&msgs)).unwrap();

        assert_eq!(value[0], json!({"role": "user", "content": "plain"}));
        assert_eq!(value[1]["meta"]["protected"], true);
        assert_eq!(value[1]["meta"]["label"], "Policy");
    }

    #[test]
    fn test_invalid_json() {
        assert!(parse_messages("{not a list").is_err());
        assert!(parse_messages(r#"{"role": "user"}"#).is_err());
    }

    #[test]
    fn test_read_messages_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("msgs.json");
        std::fs::write(&path, r#"[{"role": "assistant", "content": "ok"}]"#).unwrap();

        let input = MessagesInput {
            messages: None,
            file: Some(path),
        };
        assert_eq!(read_messages(&input).unwrap(), vec![Message::assistant("ok")]);
    }
}
