use crate::storage::{DocumentCandidate, DocumentStore, StorageResult};

/// Buffers document candidates and commits them to a store in batches
#[derive(Debug)]
pub struct DocumentBatch {
    pending: Vec<DocumentCandidate>,
    capacity: usize,
    commits: u64,
    inserted: u64,
}

impl DocumentBatch {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            pending: Vec::with_capacity(capacity),
            capacity,
            commits: 0,
            inserted: 0,
        }
    }

    pub fn push(&mut self, candidate: DocumentCandidate) {
        self.pending.push(candidate);
    }

    pub fn is_full(&self) -> bool {
        self.pending.len() >= self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Number of successful commits so far
    pub fn commits(&self) -> u64 {
        self.commits
    }

    /// Number of rows the store reported as newly inserted
    pub fn inserted(&self) -> u64 {
        self.inserted
    }

    /// Commits every pending candidate in one store transaction
    ///
    /// An empty batch is a no-op. When the store fails, the candidates stay
    /// buffered so a later flush can retry them.
    pub fn flush<S: DocumentStore + ?Sized>(&mut self, store: &mut S) -> StorageResult<usize> {
        if self.pending.is_empty() {
            return Ok(0);
        }

        let inserted = store.insert_documents(&self.pending)?;
        tracing::debug!(
            "Committed {} document candidates ({} new)",
            self.pending.len(),
            inserted
        );

        self.pending.clear();
        self.commits += 1;
        self.inserted += inserted as u64;
        Ok(inserted)
    }
}
