//! Transcript archives for compaction, on disk or in SQLite

mod file;
mod record;
mod redact;
mod sqlite;

pub use file::FileArchive;
pub use record::{sanitize_session_id, ArchivedMessage};
pub use redact::{Redactor, DEFAULT_PATTERNS, REDACTED};
pub use sqlite::SqliteArchive;
