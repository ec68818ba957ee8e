//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the DocumentStore trait.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{DocumentStore, StorageResult};
use crate::storage::{DocumentCandidate, DocumentRecord, UnverifiedDocument, VerificationRecord};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// Timestamp layout shared with SQLite's `datetime('now')`
const SQLITE_DATETIME: &str = "%Y-%m-%d %H:%M:%S";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// The parent directory is created if it does not exist.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

impl DocumentStore for SqliteStorage {
    // ===== Discovery =====

    fn insert_documents(&mut self, documents: &[DocumentCandidate]) -> StorageResult<usize> {
        let now = Utc::now().format(SQLITE_DATETIME).to_string();
        let tx = self.conn.transaction()?;
        let mut inserted = 0;

        {
            let mut stmt = tx.prepare_cached(
                "INSERT OR IGNORE INTO found_documents (
                    url, source_url, source_title, source_author,
                    link_extension, link_text, link_title, link_date_added
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;

            for doc in documents {
                inserted += stmt.execute(params![
                    doc.url,
                    doc.source_url,
                    doc.source_title,
                    doc.source_author,
                    doc.link_extension,
                    doc.link_text,
                    doc.link_title,
                    now,
                ])?;
            }
        }

        tx.commit()?;
        Ok(inserted)
    }

    fn get_document_by_url(&self, url: &str) -> StorageResult<Option<DocumentRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, url, source_url, source_title, source_author, link_extension,
             link_text, link_title, link_date_added, link_date_accessed, link_http_code,
             link_content_type, link_content_length, link_last_modified, doc_initial_bytes
             FROM found_documents WHERE url = ?1",
        )?;

        let doc = stmt
            .query_row(params![url], |row| {
                Ok(DocumentRecord {
                    id: row.get(0)?,
                    url: row.get(1)?,
                    source_url: row.get(2)?,
                    source_title: row.get(3)?,
                    source_author: row.get(4)?,
                    link_extension: row.get(5)?,
                    link_text: row.get(6)?,
                    link_title: row.get(7)?,
                    link_date_added: row.get(8)?,
                    link_date_accessed: row.get(9)?,
                    link_http_code: row.get(10)?,
                    link_content_type: row.get(11)?,
                    link_content_length: row.get(12)?,
                    link_last_modified: row.get(13)?,
                    doc_initial_bytes: row.get(14)?,
                })
            })
            .optional()?;

        Ok(doc)
    }

    // ===== Verification =====

    fn unverified_documents(&self) -> StorageResult<Vec<UnverifiedDocument>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, url FROM found_documents WHERE link_http_code IS NULL ORDER BY id",
        )?;

        let docs = stmt
            .query_map([], |row| {
                Ok(UnverifiedDocument {
                    id: row.get(0)?,
                    url: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(docs)
    }

    fn record_verification(
        &mut self,
        id: i64,
        record: &VerificationRecord,
    ) -> StorageResult<bool> {
        let content_length = record
            .content_length
            .and_then(|len| i64::try_from(len).ok());

        let changed = self.conn.execute(
            "UPDATE found_documents
             SET link_date_accessed = ?1,
                 link_http_code = ?2,
                 link_content_type = ?3,
                 link_content_length = ?4,
                 link_last_modified = ?5,
                 doc_initial_bytes = ?6
             WHERE id = ?7 AND link_http_code IS NULL",
            params![
                record.accessed_at.to_rfc3339(),
                record.http_code,
                record.content_type,
                content_length,
                record.last_modified,
                record.initial_bytes,
                id,
            ],
        )?;

        Ok(changed > 0)
    }

    // ===== Statistics =====

    fn count_documents(&self) -> StorageResult<u64> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM found_documents", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_unverified(&self) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM found_documents WHERE link_http_code IS NULL",
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn status_breakdown(&self) -> StorageResult<Vec<(u16, u64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT link_http_code, COUNT(*) FROM found_documents
             WHERE link_http_code IS NOT NULL
             GROUP BY link_http_code
             ORDER BY link_http_code",
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, u16>(0)?, row.get::<_, i64>(1)? as u64))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    fn content_type_breakdown(&self) -> StorageResult<Vec<(String, u64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT COALESCE(link_content_type, '(none)') AS ct, COUNT(*) AS count
             FROM found_documents
             WHERE link_http_code IS NOT NULL
             GROUP BY ct
             ORDER BY count DESC, ct",
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }
}
