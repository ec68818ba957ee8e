//! In-memory state of one crawl run
//!
//! A `CrawlSession` owns the frontier, the visited/in-flight/unreachable
//! sets, the crawl rules and the pending document batch. Every mutation of
//! the crawl state goes through it so the eligibility rules stay in one
//! place.

use crate::crawler::eligibility::{check_eligibility, Rejection};
use crate::crawler::scheduler::{FrontierEntry, Scheduler};
use crate::state::{CheckpointResult, CheckpointStore, CrawlState, DomainThrottle, LoadedState};
use crate::storage::{DocumentBatch, DocumentStore, StorageResult};
use crate::url::CrawlRules;
use std::collections::HashSet;
use std::time::Duration;
use url::Url;

pub struct CrawlSession {
    pub(crate) frontier: Scheduler<FrontierEntry>,
    pub(crate) state: CrawlState,
    pub(crate) rules: CrawlRules,
    pub(crate) batch: DocumentBatch,
    /// Document URLs already buffered or committed during this run
    pub(crate) added_documents: HashSet<String>,
    pub(crate) max_depth: u32,
}

impl CrawlSession {
    pub fn new(rules: CrawlRules, delay: Duration, batch_size: usize, max_depth: u32) -> Self {
        Self {
            frontier: Scheduler::new(delay),
            state: CrawlState::new(),
            rules,
            batch: DocumentBatch::new(batch_size),
            added_documents: HashSet::new(),
            max_depth,
        }
    }

    /// Rebuilds the session from a checkpoint
    ///
    /// Queued entries keep their order. Entries that were in flight when the
    /// previous run stopped are appended after them, since they never
    /// finished. Anything now ineligible (visited, unreachable, blocked by
    /// edited rules) or deeper than the depth limit is dropped.
    pub fn restore(&mut self, loaded: LoadedState) -> usize {
        let LoadedState { frontier, state } = loaded;
        self.state = state;

        let in_flight = self.state.take_in_flight();
        let requeued = in_flight.len();
        if requeued > 0 {
            tracing::info!("Requeueing {} URLs that were in flight", requeued);
        }

        let mut restored = 0;
        for (raw, depth) in frontier.into_iter().chain(in_flight) {
            let url = match Url::parse(&raw) {
                Ok(url) => url,
                Err(e) => {
                    tracing::warn!("Dropping unparseable checkpoint URL {}: {}", raw, e);
                    continue;
                }
            };
            if self.enqueue(url, depth) {
                restored += 1;
            }
        }

        tracing::info!(
            "Restored crawl state: {} queued, {} visited, {} unreachable domains",
            restored,
            self.state.visited_count(),
            self.state.unreachable_count()
        );
        restored
    }

    /// Checks a URL against the crawl rules and current state
    pub fn eligibility(&self, url: &Url) -> Result<(), Rejection> {
        let verdict = check_eligibility(url, &self.rules, &self.state, &self.frontier);
        if let Err(reason) = verdict {
            tracing::debug!("Skipping {}: {}", url, reason);
        }
        verdict
    }

    /// Adds a URL to the frontier if it is eligible and within the depth limit
    pub fn enqueue(&mut self, url: Url, depth: u32) -> bool {
        if depth > self.max_depth {
            tracing::debug!(
                "Skipping {}: depth {} exceeds limit {}",
                url,
                depth,
                self.max_depth
            );
            return false;
        }
        if self.eligibility(&url).is_err() {
            return false;
        }

        match FrontierEntry::new(url, depth) {
            Ok(entry) => self.frontier.push(entry),
            Err(e) => {
                tracing::debug!("Skipping URL without domain: {}", e);
                false
            }
        }
    }

    /// Waits for the next politely schedulable entry
    pub async fn next_entry(&mut self) -> Option<FrontierEntry> {
        self.frontier.next_entry().await
    }

    pub fn begin(&mut self, url: &Url, depth: u32) {
        self.state.begin(url.as_str(), depth);
    }

    pub fn finish(&mut self, url: &Url) {
        self.state.complete(url.as_str());
    }

    /// Marks a domain unreachable for the rest of the run and drops its
    /// queued entries
    ///
    /// Returns true when the domain was not already marked.
    pub fn mark_unreachable(&mut self, domain: &str) -> bool {
        if !self.state.mark_unreachable(domain) {
            return false;
        }

        let dropped = self.frontier.remove_domain(domain);
        if !dropped.is_empty() {
            tracing::info!(
                "Dropped {} queued URLs for unreachable domain {}",
                dropped.len(),
                domain
            );
        }
        true
    }

    pub fn throttle_mut(&mut self) -> &mut DomainThrottle {
        self.frontier.throttle_mut()
    }

    pub fn flush<S: DocumentStore + ?Sized>(&mut self, store: &mut S) -> StorageResult<usize> {
        self.batch.flush(store)
    }

    /// Writes the frontier and crawl state to the checkpoint directory
    pub fn checkpoint(&self, store: &CheckpointStore) -> CheckpointResult<()> {
        let frontier = self.frontier.snapshot();
        store.save(
            frontier.iter().map(|entry| (entry.url.as_str(), entry.depth)),
            &self.state,
        )
    }

    pub fn frontier(&self) -> &Scheduler<FrontierEntry> {
        &self.frontier
    }

    pub fn state(&self) -> &CrawlState {
        &self.state
    }

    pub fn batch(&self) -> &DocumentBatch {
        &self.batch
    }

    pub fn documents_found(&self) -> usize {
        self.added_documents.len()
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }
}
