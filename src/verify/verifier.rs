use crate::config::Config;
use crate::crawler::{build_http_client, Fetcher, ScheduledTask, Scheduler};
use crate::output::ErrorLog;
use crate::state::ERROR_LOG_FILE;
use crate::storage::{open_storage, DocumentStore, SqliteStorage};
use crate::url::{extract_domain, normalize_url};
use crate::Result;
use std::future::Future;
use std::time::{Duration, Instant};
use url::Url;

/// A document row waiting for its liveness check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyTask {
    pub id: i64,
    pub url: Url,
    pub domain: String,
}

impl ScheduledTask for VerifyTask {
    type Key = i64;

    fn key(&self) -> i64 {
        self.id
    }

    fn domain(&self) -> &str {
        &self.domain
    }
}

/// Counters for one verification pass
#[derive(Debug, Clone, Default)]
pub struct VerifySummary {
    /// Rows probed, whatever the outcome
    pub checked: u64,
    /// Rows whose verification columns were written
    pub recorded: u64,
    /// Probes that ended in a network error
    pub failed: u64,
    /// Rows left in the queue at exit
    pub remaining: usize,
    pub interrupted: bool,
    pub elapsed: Duration,
}

/// Revisits recorded document links under per-domain politeness rules
pub struct Verifier {
    fetcher: Fetcher,
    storage: SqliteStorage,
    scheduler: Scheduler<VerifyTask>,
    prefix_bytes: usize,
    error_log: ErrorLog,
}

impl Verifier {
    pub fn new(config: &Config) -> Result<Self> {
        std::fs::create_dir_all(&config.state.directory)?;
        let storage = open_storage(&config.state.database_path)?;

        let client = build_http_client(&config.user_agent, config.crawler.request_timeout())?;
        let fetcher = Fetcher::new(client, config.crawler.failure_budget);

        Ok(Self {
            fetcher,
            storage,
            scheduler: Scheduler::new(config.verifier.request_delay()),
            prefix_bytes: config.verifier.prefix_bytes,
            error_log: ErrorLog::new(config.state.directory.join(ERROR_LOG_FILE)),
        })
    }

    /// Queues every row that has no HTTP status yet
    ///
    /// Rows whose URL no longer parses as an http(s) URL are logged and left
    /// alone.
    pub fn load_pending(&mut self) -> Result<usize> {
        let rows = self.storage.unverified_documents()?;
        let mut queued = 0;

        for row in rows {
            let task = normalize_url(&row.url).ok().and_then(|url| {
                extract_domain(&url).map(|domain| VerifyTask {
                    id: row.id,
                    url,
                    domain,
                })
            });

            match task {
                Some(task) => {
                    if self.scheduler.push(task) {
                        queued += 1;
                    }
                }
                None => {
                    tracing::warn!("Skipping document {} with unusable URL {}", row.id, row.url);
                    self.error_log.record(&format!(
                        "Cannot verify document {}: unusable URL {}",
                        row.id, row.url
                    ));
                }
            }
        }

        tracing::info!(
            "{} documents pending verification across {} domains",
            queued,
            self.scheduler.domain_count()
        );
        Ok(queued)
    }

    pub fn pending(&self) -> usize {
        self.scheduler.len()
    }

    pub fn storage(&self) -> &SqliteStorage {
        &self.storage
    }

    /// Verifies until nothing is pending
    pub async fn run(&mut self) -> Result<VerifySummary> {
        self.run_until(std::future::pending::<()>()).await
    }

    /// Verifies until nothing is pending or `shutdown` completes
    ///
    /// Each probe is written in its own statement, so an interrupted pass
    /// only loses the probe that was in progress; that row stays unverified.
    pub async fn run_until<F>(&mut self, shutdown: F) -> Result<VerifySummary>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        let start = Instant::now();
        let mut summary = VerifySummary::default();

        loop {
            let task = tokio::select! {
                _ = &mut shutdown => {
                    summary.interrupted = true;
                    break;
                }
                task = self.scheduler.next_entry() => task,
            };

            let Some(task) = task else {
                break;
            };

            let probe = tokio::select! {
                _ = &mut shutdown => {
                    summary.interrupted = true;
                    break;
                }
                probe = self.fetcher.probe(&task.url, self.prefix_bytes, self.scheduler.throttle_mut()) => probe,
            };
            summary.checked += 1;

            match probe {
                Ok(record) => {
                    tracing::info!(
                        "Verified {}: HTTP {} ({})",
                        task.url,
                        record.http_code,
                        record.content_type.as_deref().unwrap_or("no content type")
                    );
                    if self.storage.record_verification(task.id, &record)? {
                        summary.recorded += 1;
                    } else {
                        tracing::debug!("Document {} was already verified", task.id);
                    }
                }
                Err(error) => {
                    summary.failed += 1;
                    tracing::warn!("Verification failed for {}: {}", task.url, error);
                    self.error_log
                        .record(&format!("Verification failed for {}: {}", task.url, error));
                }
            }
        }

        if summary.interrupted {
            tracing::info!("Interrupt received, stopping verification");
        }

        summary.remaining = self.scheduler.len();
        summary.elapsed = start.elapsed();
        Ok(summary)
    }
}
