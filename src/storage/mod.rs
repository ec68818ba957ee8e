//! Storage module for persisting discovered documents
//!
//! This module handles all database operations for the crawler, including:
//! - SQLite database initialization and schema management
//! - Batched, de-duplicated insertion of document candidates
//! - Selection and update of rows for the verification pass

mod batch;
mod schema;
mod sqlite;
mod traits;

pub use batch::DocumentBatch;
pub use sqlite::SqliteStorage;
pub use traits::{DocumentStore, StorageError, StorageResult};

use chrono::{DateTime, Utc};
use std::path::Path;

/// Initializes or opens a storage database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStorage)` - Successfully initialized storage
/// * `Err(StorageError)` - Failed to initialize storage
pub fn open_storage(path: &Path) -> StorageResult<SqliteStorage> {
    SqliteStorage::new(path)
}

/// A document link found on a crawled page, ready to be inserted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentCandidate {
    pub url: String,
    pub source_url: String,
    pub source_title: Option<String>,
    pub source_author: Option<String>,
    pub link_extension: String,
    pub link_text: String,
    pub link_title: Option<String>,
}

/// Represents a document row in the database
#[derive(Debug, Clone)]
pub struct DocumentRecord {
    pub id: i64,
    pub url: String,
    pub source_url: String,
    pub source_title: Option<String>,
    pub source_author: Option<String>,
    pub link_extension: Option<String>,
    pub link_text: Option<String>,
    pub link_title: Option<String>,
    pub link_date_added: Option<String>,
    pub link_date_accessed: Option<String>,
    pub link_http_code: Option<u16>,
    pub link_content_type: Option<String>,
    pub link_content_length: Option<i64>,
    pub link_last_modified: Option<String>,
    pub doc_initial_bytes: Option<Vec<u8>>,
}

/// A row still waiting for the verification pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnverifiedDocument {
    pub id: i64,
    pub url: String,
}

/// What a verification probe learned about a document URL
#[derive(Debug, Clone)]
pub struct VerificationRecord {
    pub accessed_at: DateTime<Utc>,
    pub http_code: u16,
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
    pub last_modified: Option<String>,
    pub initial_bytes: Vec<u8>,
}
