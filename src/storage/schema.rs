//! Database schema definitions
//!
//! This module contains the SQL schema for the DocHarvest document database.
//! The crawl inserts discovery columns, the verification pass fills the
//! `link_*` access columns, and the downloader owns the `doc_*` columns.

use crate::storage::traits::{StorageError, StorageResult};
use rusqlite::Connection;

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS found_documents (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL UNIQUE,
    source_url TEXT NOT NULL,
    source_title TEXT,
    source_author TEXT,
    link_extension TEXT,
    link_text TEXT,
    link_title TEXT,
    link_date_added TEXT DEFAULT (datetime('now')),
    link_date_accessed TEXT,
    link_http_code INTEGER,
    link_content_type TEXT,
    link_content_length INTEGER,
    link_last_modified TEXT,
    doc_initial_bytes BLOB,
    doc_date_downloaded TEXT,
    doc_local_path TEXT,
    doc_file_size INTEGER,
    doc_file_name TEXT,
    doc_checksum TEXT,
    doc_date_created TEXT,
    doc_author TEXT,
    doc_title TEXT,
    doc_producer TEXT,
    doc_page_count INTEGER
);

CREATE INDEX IF NOT EXISTS idx_found_documents_http_code ON found_documents(link_http_code);
CREATE INDEX IF NOT EXISTS idx_found_documents_source ON found_documents(source_url);
"#;

/// Unique index added to tables created without `url UNIQUE`
const UNIQUE_URL_INDEX_SQL: &str =
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_found_documents_url ON found_documents(url)";

/// Initializes the database schema
///
/// A `found_documents` table created by earlier tooling lacks the
/// `source_author` column and the uniqueness constraint on `url`; both are
/// added in place.
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(StorageError)` - Failed to initialize or upgrade the schema
pub fn initialize_schema(conn: &Connection) -> StorageResult<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    upgrade_existing_table(conn)
}

fn upgrade_existing_table(conn: &Connection) -> StorageResult<()> {
    let columns = table_columns(conn)?;
    if !columns.iter().any(|c| c == "source_author") {
        tracing::info!("Adding source_author column to found_documents");
        conn.execute("ALTER TABLE found_documents ADD COLUMN source_author TEXT", [])?;
    }

    let unique_indexes: i64 = conn.query_row(
        "SELECT COUNT(*) FROM pragma_index_list('found_documents') WHERE \"unique\" = 1",
        [],
        |row| row.get(0),
    )?;
    if unique_indexes > 0 {
        return Ok(());
    }

    let duplicated: i64 = conn.query_row(
        "SELECT COUNT(*) FROM (
            SELECT url FROM found_documents GROUP BY url HAVING COUNT(*) > 1
         )",
        [],
        |row| row.get(0),
    )?;
    if duplicated > 0 {
        return Err(StorageError::Database(format!(
            "found_documents lists {} URLs more than once; remove the duplicate rows \
             before using this database",
            duplicated
        )));
    }

    tracing::info!("Adding unique index on found_documents.url");
    conn.execute_batch(UNIQUE_URL_INDEX_SQL)?;
    Ok(())
}

fn table_columns(conn: &Connection) -> StorageResult<Vec<String>> {
    let mut stmt = conn.prepare("PRAGMA table_info(found_documents)")?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(columns)
}
