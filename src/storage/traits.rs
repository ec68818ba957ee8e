//! Storage traits and error types
//!
//! This module defines the trait interface for the document store and its
//! error type.

use crate::storage::{DocumentCandidate, DocumentRecord, UnverifiedDocument, VerificationRecord};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for document store implementations
///
/// The crawl only ever inserts; verification selects rows without a status
/// and updates them one at a time. Rows are never deleted.
pub trait DocumentStore {
    // ===== Discovery =====

    /// Inserts a batch of candidates in a single transaction
    ///
    /// URLs already present are skipped. Either the whole batch is committed
    /// or nothing is.
    ///
    /// # Returns
    ///
    /// The number of rows actually inserted
    fn insert_documents(&mut self, documents: &[DocumentCandidate]) -> StorageResult<usize>;

    /// Gets a document by URL
    fn get_document_by_url(&self, url: &str) -> StorageResult<Option<DocumentRecord>>;

    // ===== Verification =====

    /// Gets every document that has no recorded HTTP status, oldest first
    fn unverified_documents(&self) -> StorageResult<Vec<UnverifiedDocument>>;

    /// Stores the result of probing one document
    ///
    /// The update only applies while the row is still unverified.
    ///
    /// # Returns
    ///
    /// `true` if the row was updated
    fn record_verification(&mut self, id: i64, record: &VerificationRecord)
        -> StorageResult<bool>;

    // ===== Statistics =====

    /// Gets total document count
    fn count_documents(&self) -> StorageResult<u64>;

    /// Counts documents that still need verification
    fn count_unverified(&self) -> StorageResult<u64>;

    /// Gets verified document counts per HTTP status, ascending by status
    fn status_breakdown(&self) -> StorageResult<Vec<(u16, u64)>>;

    /// Gets verified document counts per content type, most common first
    fn content_type_breakdown(&self) -> StorageResult<Vec<(String, u64)>>;
}
