//! Statistics generation from the document store and checkpoints
//!
//! This module provides functionality for extracting and displaying
//! document statistics, checkpoint sizes, and per-run summaries.

use crate::state::LoadedState;
use crate::storage::{DocumentStore, StorageResult};
use crate::verify::VerifySummary;
use std::time::Duration;

/// Document table statistics
#[derive(Debug, Clone, Default)]
pub struct DocumentStatistics {
    /// Total number of document rows
    pub total_documents: u64,

    /// Rows still waiting for the verification pass
    pub unverified: u64,

    /// Verified rows grouped by HTTP status, in status order
    pub status_breakdown: Vec<(u16, u64)>,

    /// Verified rows grouped by Content-Type, most common first
    pub content_type_breakdown: Vec<(String, u64)>,
}

/// Sizes of the persisted crawl state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CheckpointStatistics {
    pub queued: usize,
    pub visited: usize,
    pub in_flight: usize,
    pub unreachable_domains: usize,
}

impl From<&LoadedState> for CheckpointStatistics {
    fn from(loaded: &LoadedState) -> Self {
        Self {
            queued: loaded.frontier.len(),
            visited: loaded.state.visited_count(),
            in_flight: loaded.state.in_flight_count(),
            unreachable_domains: loaded.state.unreachable_count(),
        }
    }
}

/// Counters for one crawl run
#[derive(Debug, Clone, Default)]
pub struct CrawlSummary {
    /// Pages whose request got an answer or a network error
    pub pages_fetched: u64,
    /// HTML pages whose links were extracted
    pub pages_processed: u64,
    /// Pages that only redirected through a meta refresh
    pub meta_refreshes: u64,
    pub http_errors: u64,
    pub content_mismatches: u64,
    pub network_failures: u64,
    /// Document links buffered during this run
    pub documents_found: u64,
    /// Rows the store reported as new
    pub documents_inserted: u64,
    /// Domains newly marked unreachable during this run
    pub domains_unreachable: u64,
    /// Entries left in the frontier at exit
    pub frontier_remaining: usize,
    pub interrupted: bool,
    pub elapsed: Duration,
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The document store to query
///
/// # Returns
///
/// * `Ok(DocumentStatistics)` - Successfully loaded statistics
/// * `Err(StorageError)` - Failed to query statistics
pub fn load_statistics(storage: &dyn DocumentStore) -> StorageResult<DocumentStatistics> {
    Ok(DocumentStatistics {
        total_documents: storage.count_documents()?,
        unverified: storage.count_unverified()?,
        status_breakdown: storage.status_breakdown()?,
        content_type_breakdown: storage.content_type_breakdown()?,
    })
}

fn percentage(part: u64, total: u64) -> f64 {
    if total > 0 {
        (part as f64 / total as f64) * 100.0
    } else {
        0.0
    }
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(docs: &DocumentStatistics, checkpoint: &CheckpointStatistics) {
    println!("=== Document Statistics ===\n");

    println!("Overview:");
    println!("  Documents found: {}", docs.total_documents);
    let verified = docs.total_documents.saturating_sub(docs.unverified);
    println!(
        "  Verified: {} ({:.1}%)",
        verified,
        percentage(verified, docs.total_documents)
    );
    println!("  Awaiting verification: {}", docs.unverified);
    println!();

    if !docs.status_breakdown.is_empty() {
        println!("HTTP Status:");
        for (code, count) in &docs.status_breakdown {
            println!(
                "  {}: {} ({:.1}%)",
                code,
                count,
                percentage(*count, verified)
            );
        }
        println!();
    }

    if !docs.content_type_breakdown.is_empty() {
        println!("Content Types:");
        for (content_type, count) in &docs.content_type_breakdown {
            println!("  {}: {}", content_type, count);
        }
        println!();
    }

    println!("Crawl State:");
    println!("  Queued: {}", checkpoint.queued);
    println!("  Visited: {}", checkpoint.visited);
    println!("  In flight: {}", checkpoint.in_flight);
    println!("  Unreachable domains: {}", checkpoint.unreachable_domains);
}

pub fn print_crawl_summary(summary: &CrawlSummary) {
    println!();
    if summary.interrupted {
        println!("=== Crawl Interrupted ===\n");
    } else {
        println!("=== Crawl Complete ===\n");
    }

    println!("  Pages fetched: {}", summary.pages_fetched);
    println!("  Pages processed: {}", summary.pages_processed);
    println!("  Meta refreshes: {}", summary.meta_refreshes);
    println!("  HTTP errors: {}", summary.http_errors);
    println!("  Non-HTML responses: {}", summary.content_mismatches);
    println!("  Network failures: {}", summary.network_failures);
    println!("  Domains marked unreachable: {}", summary.domains_unreachable);
    println!(
        "  Documents found: {} ({} new in the database)",
        summary.documents_found, summary.documents_inserted
    );
    println!("  Still queued: {}", summary.frontier_remaining);
    println!("  Elapsed: {:.1}s", summary.elapsed.as_secs_f64());

    if summary.interrupted && summary.frontier_remaining > 0 {
        println!("\nRun the same command again to resume.");
    }
}

pub fn print_verify_summary(summary: &VerifySummary) {
    println!();
    if summary.interrupted {
        println!("=== Verification Interrupted ===\n");
    } else {
        println!("=== Verification Complete ===\n");
    }

    println!("  Checked: {}", summary.checked);
    println!("  Recorded: {}", summary.recorded);
    println!("  Network failures: {}", summary.failed);
    println!("  Still pending: {}", summary.remaining);
    println!("  Elapsed: {:.1}s", summary.elapsed.as_secs_f64());
}
