//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - Domain-throttled scheduling of the frontier
//! - Eligibility checks for discovered URLs
//! - HTTP fetching with per-domain politeness and failure budgets
//! - HTML parsing, link classification and document batching
//! - Overall crawl coordination

mod coordinator;
mod eligibility;
mod fetcher;
mod parser;
mod processor;
mod scheduler;
mod session;

pub use coordinator::Coordinator;
pub use eligibility::{check_eligibility, Rejection};
pub use fetcher::{build_http_client, FetchResult, Fetcher};
pub use parser::{parse_html, AnchorLink, ParsedPage, NO_LINK_TEXT};
pub use processor::PageOutcome;
pub use scheduler::{FrontierEntry, ScheduledTask, Scheduler};
pub use session::CrawlSession;

use crate::config::Config;
use crate::output::CrawlSummary;
use crate::Result;

/// Runs a complete crawl operation
///
/// This is the main entry point for a non-interactive crawl. It will:
/// 1. Load rules, checkpoints and the document database
/// 2. Requeue entries a previous run left in flight
/// 3. Queue `seed` if given
/// 4. Fetch, parse and follow links until the frontier is empty
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `seed` - Optional seed URL, added at depth 0
pub async fn crawl(config: &Config, seed: Option<&str>) -> Result<CrawlSummary> {
    let mut coordinator = Coordinator::new(config)?;
    if let Some(seed) = seed {
        coordinator.add_seed(seed)?;
    }
    coordinator.run().await
}
