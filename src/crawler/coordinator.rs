//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the main crawl loop that coordinates all aspects of
//! the crawling process, including:
//! - Loading checkpoints and requeueing interrupted work
//! - Drawing politely scheduled entries from the frontier
//! - Coordinating fetching, redirect re-validation and page processing
//! - Checkpointing after every cycle
//! - Flushing and checkpointing once more on interrupt or error

use crate::config::Config;
use crate::crawler::fetcher::{build_http_client, FetchResult, Fetcher};
use crate::crawler::processor::PageOutcome;
use crate::crawler::scheduler::FrontierEntry;
use crate::crawler::session::CrawlSession;
use crate::output::{CrawlSummary, ErrorLog};
use crate::state::CheckpointStore;
use crate::storage::{open_storage, SqliteStorage};
use crate::url::{normalize_url, CrawlRules};
use crate::{ConfigError, Result};
use std::future::Future;
use std::time::Instant;
use url::Url;

/// Main crawler coordinator structure
pub struct Coordinator {
    session: CrawlSession,
    fetcher: Fetcher,
    checkpoints: CheckpointStore,
    storage: SqliteStorage,
    error_log: ErrorLog,
    summary: CrawlSummary,
}

impl Coordinator {
    /// Creates a coordinator from configuration and whatever state a
    /// previous run left behind
    ///
    /// # Arguments
    ///
    /// * `config` - The validated crawler configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to crawl (the frontier may be empty)
    /// * `Err(HarvestError)` - Rules, checkpoints, database or HTTP client
    ///   could not be set up
    pub fn new(config: &Config) -> Result<Self> {
        let rules = CrawlRules::from_config(&config.rules)?;

        let checkpoints = CheckpointStore::open(&config.state.directory)?;
        let loaded = checkpoints.load(config.crawler.max_depth)?;

        let storage = open_storage(&config.state.database_path)?;

        let client = build_http_client(&config.user_agent, config.crawler.request_timeout())?;
        let fetcher = Fetcher::new(client, config.crawler.failure_budget);

        let mut session = CrawlSession::new(
            rules,
            config.crawler.request_delay(),
            config.crawler.pdf_batch_size,
            config.crawler.max_depth,
        );
        session.restore(loaded);

        let error_log = ErrorLog::new(checkpoints.error_log_path());

        Ok(Self {
            session,
            fetcher,
            checkpoints,
            storage,
            error_log,
            summary: CrawlSummary::default(),
        })
    }

    /// True when nothing is queued and a seed URL is needed to start
    pub fn needs_seed(&self) -> bool {
        self.session.frontier().is_empty()
    }

    /// Queues a seed URL at depth 0
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - The seed was queued
    /// * `Ok(false)` - The seed is valid but ineligible (already visited,
    ///   blocked, ...)
    /// * `Err(HarvestError)` - The seed is not an absolute http(s) URL
    pub fn add_seed(&mut self, seed: &str) -> Result<bool> {
        let url = normalize_url(seed)
            .map_err(|e| ConfigError::MissingSeed(format!("{}: {}", seed, e)))?;

        let queued = self.session.enqueue(url.clone(), 0);
        if queued {
            tracing::info!("Seeded frontier with {}", url);
        } else {
            tracing::warn!("Seed {} was not queued (see debug log for the reason)", url);
        }
        Ok(queued)
    }

    pub fn session(&self) -> &CrawlSession {
        &self.session
    }

    pub fn storage(&self) -> &SqliteStorage {
        &self.storage
    }

    /// Runs until the frontier is exhausted
    pub async fn run(&mut self) -> Result<CrawlSummary> {
        self.run_until(std::future::pending::<()>()).await
    }

    /// Runs until the frontier is exhausted or `shutdown` completes
    ///
    /// The crawl state is checkpointed after every cycle. Whatever ends the
    /// loop (empty frontier, shutdown, or a persistence error), pending
    /// documents are flushed and the state checkpointed before returning.
    /// An entry interrupted mid-fetch stays in flight and is requeued by the
    /// next run.
    pub async fn run_until<F>(&mut self, shutdown: F) -> Result<CrawlSummary>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        let start = Instant::now();
        self.summary = CrawlSummary::default();
        tracing::info!(
            "Starting crawl: {} queued, {} visited",
            self.session.frontier().len(),
            self.session.state().visited_count()
        );

        let outcome: Result<()> = loop {
            let entry = tokio::select! {
                _ = &mut shutdown => {
                    self.summary.interrupted = true;
                    break Ok(());
                }
                entry = self.session.next_entry() => entry,
            };

            let Some(entry) = entry else {
                tracing::info!("Frontier is empty, crawl complete");
                break Ok(());
            };

            let cycle = tokio::select! {
                _ = &mut shutdown => {
                    self.summary.interrupted = true;
                    break Ok(());
                }
                cycle = self.process_entry(entry) => cycle,
            };

            if let Err(e) = cycle.and_then(|_| self.checkpoint()) {
                break Err(e);
            }

            if self.summary.pages_fetched > 0 && self.summary.pages_fetched % 25 == 0 {
                let elapsed = start.elapsed().as_secs_f64();
                tracing::info!(
                    "Progress: {} pages fetched, {} queued, {} documents found, {:.2} pages/sec",
                    self.summary.pages_fetched,
                    self.session.frontier().len(),
                    self.session.documents_found(),
                    self.summary.pages_fetched as f64 / elapsed.max(f64::EPSILON)
                );
            }
        };

        if self.summary.interrupted {
            tracing::info!("Interrupt received, saving state");
        }

        let flushed = self.session.flush(&mut self.storage);
        if let Err(e) = &flushed {
            tracing::error!("Final document flush failed: {}", e);
        }
        let saved = self.checkpoint();
        if let Err(e) = &saved {
            tracing::error!("Final checkpoint failed: {}", e);
        }

        outcome?;
        flushed?;
        saved?;

        self.summary.documents_found = self.session.documents_found() as u64;
        self.summary.documents_inserted = self.session.batch().inserted();
        self.summary.frontier_remaining = self.session.frontier().len();
        self.summary.elapsed = start.elapsed();
        Ok(self.summary.clone())
    }

    fn checkpoint(&self) -> Result<()> {
        self.session.checkpoint(&self.checkpoints)?;
        Ok(())
    }

    /// Runs one fetch-and-process cycle for a frontier entry
    async fn process_entry(&mut self, entry: FrontierEntry) -> Result<()> {
        let FrontierEntry { url, depth, .. } = entry;

        // Things may have changed since the entry was queued.
        if self.session.eligibility(&url).is_err() {
            return Ok(());
        }

        self.session.begin(&url, depth);
        tracing::info!("Crawling (depth {}): {}", depth, url);

        let result = self.fetcher.fetch(&url, self.session.throttle_mut()).await;
        self.summary.pages_fetched += 1;

        match result {
            FetchResult::Success { final_url, body, .. } => {
                let page_url = self.resolve_redirect(&url, final_url, depth);
                let Some(page_url) = page_url else {
                    self.session.finish(&url);
                    return Ok(());
                };

                let outcome = self
                    .session
                    .process_page(&body, &page_url, depth, &mut self.storage)?;
                if page_url != url {
                    self.session.finish(&url);
                }

                match outcome {
                    PageOutcome::Refreshed { .. } => self.summary.meta_refreshes += 1,
                    PageOutcome::Processed {
                        title,
                        pages_enqueued,
                        documents_found,
                    } => {
                        self.summary.pages_processed += 1;
                        tracing::info!(
                            "Processed {} ({}): {} pages queued, {} documents",
                            page_url,
                            title.as_deref().unwrap_or("untitled"),
                            pages_enqueued,
                            documents_found
                        );
                    }
                }
            }

            FetchResult::HttpError {
                final_url,
                status_code,
            } => {
                self.summary.http_errors += 1;
                tracing::warn!("HTTP {} for {}", status_code, final_url);
                self.error_log
                    .record(&format!("HTTP {} for {} ({})", status_code, url, final_url));
                self.session.finish(&url);
            }

            FetchResult::ContentMismatch {
                final_url,
                content_type,
            } => {
                self.summary.content_mismatches += 1;
                tracing::info!("Skipping non-HTML {} ({})", final_url, content_type);
                self.session.finish(&url);
            }

            FetchResult::BodyError { final_url, error } => {
                tracing::warn!("Could not read body of {}: {}", final_url, error);
                self.error_log
                    .record(&format!("Unreadable body for {}: {}", url, error));
                self.session.finish(&url);
            }

            FetchResult::NetworkError {
                domain: failed_domain,
                error,
                domain_exhausted,
            } => {
                self.summary.network_failures += 1;
                self.error_log
                    .record(&format!("Request failed for {}: {}", url, error));
                if domain_exhausted && self.session.mark_unreachable(&failed_domain) {
                    self.summary.domains_unreachable += 1;
                    tracing::warn!("Marking domain {} unreachable for this run", failed_domain);
                    self.error_log
                        .record(&format!("Domain {} marked unreachable", failed_domain));
                }
                self.session.finish(&url);
            }
        }

        Ok(())
    }

    /// Decides which URL a fetched page is processed under
    ///
    /// When HTTP redirects led somewhere else, the final URL must pass the
    /// eligibility checks on its own; it then joins the in-flight set beside
    /// the requested URL. Returns None when the redirect target is rejected.
    fn resolve_redirect(&mut self, requested: &Url, final_url: Url, depth: u32) -> Option<Url> {
        let final_url = normalize_url(final_url.as_str()).unwrap_or(final_url);
        if &final_url == requested {
            return Some(final_url);
        }

        match self.session.eligibility(&final_url) {
            Ok(()) => {
                tracing::info!("Followed redirect {} -> {}", requested, final_url);
                self.session.begin(&final_url, depth);
                Some(final_url)
            }
            Err(reason) => {
                tracing::info!(
                    "Redirect {} -> {} not processed: {}",
                    requested,
                    final_url,
                    reason
                );
                None
            }
        }
    }
}
