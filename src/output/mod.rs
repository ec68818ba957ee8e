//! Output module for run summaries, statistics and the error log
//!
//! This module handles:
//! - Printing crawl and verification summaries
//! - Document and checkpoint statistics for `--stats`
//! - The append-only, timestamped error log

mod error_log;
pub mod stats;

pub use error_log::ErrorLog;
pub use stats::{
    load_statistics, print_crawl_summary, print_statistics, print_verify_summary,
    CheckpointStatistics, CrawlSummary, DocumentStatistics,
};
