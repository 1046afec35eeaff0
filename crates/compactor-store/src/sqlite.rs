//! SQLite-backed archive

use crate::record::ArchivedMessage;
use crate::redact::Redactor;
use anyhow::{anyhow, Result};
use chrono::Utc;
use compactor_core::{Message, StorageAdapter};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

/// Archives transcripts, summaries and events into one database
pub struct SqliteArchive {
    conn: Mutex<Connection>,
    redactor: Option<Redactor>,
}

impl SqliteArchive {
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        debug!(path = %db_path.display(), "opening archive database");
        Self::from_connection(Connection::open(db_path)?)
    }

    pub fn in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            redactor: Some(Redactor::with_defaults()?),
        })
    }

    pub fn without_redaction(mut self) -> Self {
        self.redactor = None;
        self
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS transcripts (
                session_id TEXT NOT NULL,
                step INTEGER NOT NULL,
                position INTEGER NOT NULL,
                role TEXT NOT NULL,
                content TEXT NOT NULL,
                meta TEXT NOT NULL,
                saved_at TEXT NOT NULL,
                PRIMARY KEY (session_id, step, position)
            );
            CREATE TABLE IF NOT EXISTS summaries (
                session_id TEXT NOT NULL,
                step INTEGER NOT NULL,
                role TEXT NOT NULL,
                content TEXT NOT NULL,
                meta TEXT NOT NULL,
                saved_at TEXT NOT NULL,
                PRIMARY KEY (session_id, step)
            );
            CREATE TABLE IF NOT EXISTS events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id TEXT NOT NULL,
                event TEXT NOT NULL,
                saved_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_events_session ON events(session_id);
            ",
        )?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("archive connection lock poisoned"))
    }

    fn archive(&self, msg: &Message) -> ArchivedMessage {
        ArchivedMessage::from_message(msg, self.redactor.as_ref())
    }

    pub fn load_transcript(&self, session_id: &str, step: u32) -> Result<Vec<Message>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT role, content, meta FROM transcripts
             WHERE session_id = ?1 AND step = ?2
             ORDER BY position",
        )?;
        let rows = stmt.query_map(params![session_id, step], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut messages = Vec::new();
        for row in rows {
            let (role, content, meta) = row?;
            messages.push(
                ArchivedMessage {
                    role,
                    content,
                    meta: serde_json::from_str(&meta)?,
                }
                .into_message(),
            );
        }
        Ok(messages)
    }

    pub fn load_summary(&self, session_id: &str, step: u32) -> Result<Option<Message>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT role, content, meta FROM summaries WHERE session_id = ?1 AND step = ?2",
        )?;
        let mut rows = stmt.query(params![session_id, step])?;

        if let Some(row) = rows.next()? {
            let meta: String = row.get(2)?;
            Ok(Some(
                ArchivedMessage {
                    role: row.get(0)?,
                    content: row.get(1)?,
                    meta: serde_json::from_str(&meta)?,
                }
                .into_message(),
            ))
        } else {
            Ok(None)
        }
    }

    pub fn load_events(&self, session_id: &str) -> Result<Vec<serde_json::Value>> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare("SELECT event FROM events WHERE session_id = ?1 ORDER BY id")?;
        let rows = stmt.query_map(params![session_id], |row| row.get::<_, String>(0))?;

        let mut events = Vec::new();
        for row in rows {
            events.push(serde_json::from_str(&row?)?);
        }
        Ok(events)
    }

    /// Sessions with at least one archived transcript
    pub fn sessions(&self) -> Result<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare("SELECT DISTINCT session_id FROM transcripts ORDER BY session_id")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}

impl StorageAdapter for SqliteArchive {
    fn save_transcript(&self, session_id: &str, messages: &[Message], step: u32) -> Result<()> {
        let saved_at = Utc::now().to_rfc3339();
        let records: Vec<ArchivedMessage> = messages.iter().map(|m| self.archive(m)).collect();

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM transcripts WHERE session_id = ?1 AND step = ?2",
            params![session_id, step],
        )?;
        for (position, record) in records.iter().enumerate() {
            tx.execute(
                "INSERT INTO transcripts VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    session_id,
                    step,
                    position as i64,
                    record.role,
                    record.content,
                    serde_json::to_string(&record.meta)?,
                    saved_at,
                ],
            )?;
        }
        tx.commit()?;
        debug!(session_id, step, messages = records.len(), "archived transcript");
        Ok(())
    }

    fn save_summary(&self, session_id: &str, summary: &Message, step: u32) -> Result<()> {
        let record = self.archive(summary);
        self.lock()?.execute(
            "INSERT OR REPLACE INTO summaries VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                session_id,
                step,
                record.role,
                record.content,
                serde_json::to_string(&record.meta)?,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn save_event(&self, session_id: &str, event: &serde_json::Value) -> Result<()> {
        self.lock()?.execute(
            "INSERT INTO events (session_id, event, saved_at) VALUES (?1, ?2, ?3)",
            params![session_id, event.to_string(), Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }
}
