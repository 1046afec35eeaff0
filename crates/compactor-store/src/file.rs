//! Per-session filesystem archive

use crate::record::{sanitize_session_id, ArchivedMessage};
use crate::redact::Redactor;
use anyhow::{Context, Result};
use compactor_core::{Message, StorageAdapter};
use compactor_telemetry::{append_jsonl, atomic_write, read_jsonl, write_jsonl};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Archives compactions under `<root>/<session>/`
///
/// Layout per session: `transcript-pre-compact-NNN.jsonl`, `summary-NNN.json`
/// and an append-only `events.jsonl`.
#[derive(Debug, Clone)]
pub struct FileArchive {
    root: PathBuf,
    redactor: Option<Redactor>,
}

impl FileArchive {
    /// Archive with the default secret redaction
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self {
            root: root.into(),
            redactor: Some(Redactor::with_defaults()?),
        })
    }

    pub fn without_redaction(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            redactor: None,
        }
    }

    pub fn with_redactor(mut self, redactor: Redactor) -> Self {
        self.redactor = Some(redactor);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn session_dir(&self, session_id: &str) -> PathBuf {
        self.root.join(sanitize_session_id(session_id))
    }

    pub fn transcript_path(&self, session_id: &str, step: u32) -> PathBuf {
        self.session_dir(session_id)
            .join(format!("transcript-pre-compact-{step:03}.jsonl"))
    }

    pub fn summary_path(&self, session_id: &str, step: u32) -> PathBuf {
        self.session_dir(session_id)
            .join(format!("summary-{step:03}.json"))
    }

    pub fn events_path(&self, session_id: &str) -> PathBuf {
        self.session_dir(session_id).join("events.jsonl")
    }

    pub fn load_transcript(&self, session_id: &str, step: u32) -> Result<Vec<Message>> {
        let records: Vec<ArchivedMessage> = read_jsonl(&self.transcript_path(session_id, step))?;
        Ok(records.into_iter().map(ArchivedMessage::into_message).collect())
    }

    pub fn load_summary(&self, session_id: &str, step: u32) -> Result<Option<Message>> {
        let path = self.summary_path(session_id, step);
        if !path.exists() {
            return Ok(None);
        }
        let record: ArchivedMessage = serde_json::from_str(&std::fs::read_to_string(&path)?)
            .with_context(|| format!("corrupt summary archive {}", path.display()))?;
        Ok(Some(record.into_message()))
    }

    pub fn load_events(&self, session_id: &str) -> Result<Vec<serde_json::Value>> {
        Ok(read_jsonl(&self.events_path(session_id))?)
    }

    fn archive(&self, msg: &Message) -> ArchivedMessage {
        ArchivedMessage::from_message(msg, self.redactor.as_ref())
    }
}

impl StorageAdapter for FileArchive {
    fn save_transcript(&self, session_id: &str, messages: &[Message], step: u32) -> Result<()> {
        let path = self.transcript_path(session_id, step);
        let records: Vec<ArchivedMessage> = messages.iter().map(|m| self.archive(m)).collect();
        write_jsonl(&path, &records)
            .with_context(|| format!("failed to write {}", path.display()))?;
        debug!(path = %path.display(), messages = records.len(), "archived transcript");
        Ok(())
    }

    fn save_summary(&self, session_id: &str, summary: &Message, step: u32) -> Result<()> {
        let path = self.summary_path(session_id, step);
        let json = serde_json::to_string_pretty(&self.archive(summary))?;
        atomic_write(&path, json.as_bytes())
            .with_context(|| format!("failed to write {}", path.display()))
    }

    fn save_event(&self, session_id: &str, event: &serde_json::Value) -> Result<()> {
        let path = self.events_path(session_id);
        append_jsonl(&path, event).with_context(|| format!("failed to append {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn transcript() -> Vec<Message> {
        vec![
            Message::system("You are helpful"),
            Message::user("my api_key=sk-live-123 please deploy"),
            Message::protected("never touch prod", Some("Policy")),
        ]
    }

    #[test]
    fn test_layout() {
        let archive = FileArchive::without_redaction("/tmp/archive");
        assert_eq!(
            archive.transcript_path("s1", 1),
            PathBuf::from("/tmp/archive/s1/transcript-pre-compact-001.jsonl")
        );
        assert_eq!(
            archive.summary_path("s1", 12),
            PathBuf::from("/tmp/archive/s1/summary-012.json")
        );
        assert_eq!(
            archive.events_path("a/b"),
            PathBuf::from("/tmp/archive/a_b/events.jsonl")
        );
    }

    #[test]
    fn test_transcript_is_redacted() {
        let dir = tempfile::tempdir().unwrap();
        let archive = FileArchive::new(dir.path()).unwrap();
        archive.save_transcript("s1", &transcript(), 1).unwrap();

        let loaded = archive.load_transcript("s1", 1).unwrap();
        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded[1].content, "my [REDACTED] please deploy");
        assert!(loaded[2].is_protected());
        assert_eq!(loaded[2].label(), Some("Policy"));

        let raw = std::fs::read_to_string(archive.transcript_path("s1", 1)).unwrap();
        assert!(!raw.contains("sk-live-123"));
        assert!(raw.contains("\"meta\""));
    }

    #[test]
    fn test_without_redaction_keeps_content() {
        let dir = tempfile::tempdir().unwrap();
        let archive = FileArchive::without_redaction(dir.path());
        archive.save_transcript("s1", &transcript(), 2).unwrap();

        let loaded = archive.load_transcript("s1", 2).unwrap();
        assert_eq!(loaded, transcript());
    }

    #[test]
    fn test_summary_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let archive = FileArchive::new(dir.path()).unwrap();
        assert!(archive.load_summary("s1", 1).unwrap().is_none());

        let summary = Message::system("[COMPACT-SUMMARY] secret: abc was rotated")
            .with_metadata("summary", true);
        archive.save_summary("s1", &summary, 1).unwrap();

        let loaded = archive.load_summary("s1", 1).unwrap().unwrap();
        assert_eq!(loaded.content, "[COMPACT-SUMMARY] [REDACTED] was rotated");
        assert_eq!(loaded.metadata["summary"], true);
    }

    #[test]
    fn test_events_append() {
        let dir = tempfile::tempdir().unwrap();
        let archive = FileArchive::new(dir.path()).unwrap();
        archive
            .save_event("s1", &json!({"type": "compact.pruned_messages", "n": 1}))
            .unwrap();
        archive
            .save_event("s1", &json!({"type": "compact.pruned_messages", "n": 2}))
            .unwrap();

        let events = archive.load_events("s1").unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1]["n"], 2);
    }
}
