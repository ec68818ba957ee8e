use crate::url::MatchMode;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for DocHarvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub verifier: VerifierConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub state: StateConfig,
    #[serde(default)]
    pub rules: RulesConfig,
}

/// Crawl engine behavior
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum link depth from the seed page
    #[serde(rename = "max-depth", default = "default_max_depth")]
    pub max_depth: u32,

    /// Minimum time between requests to the same domain (milliseconds)
    #[serde(rename = "request-delay-ms", default = "default_crawl_delay_ms")]
    pub request_delay_ms: u64,

    /// Fixed timeout applied to every request (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Number of document candidates buffered before a store commit
    #[serde(rename = "pdf-batch-size", default = "default_batch_size")]
    pub pdf_batch_size: usize,

    /// Network failures tolerated before a domain is marked unreachable
    #[serde(rename = "failure-budget", default = "default_failure_budget")]
    pub failure_budget: u32,
}

impl CrawlerConfig {
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            request_delay_ms: default_crawl_delay_ms(),
            request_timeout_secs: default_timeout_secs(),
            pdf_batch_size: default_batch_size(),
            failure_budget: default_failure_budget(),
        }
    }
}

/// Link verification pass behavior
#[derive(Debug, Clone, Deserialize)]
pub struct VerifierConfig {
    /// Minimum time between verification requests to the same domain (milliseconds)
    #[serde(rename = "request-delay-ms", default = "default_verify_delay_ms")]
    pub request_delay_ms: u64,

    /// Number of leading body bytes captured per document
    #[serde(rename = "prefix-bytes", default = "default_prefix_bytes")]
    pub prefix_bytes: usize,
}

impl VerifierConfig {
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            request_delay_ms: default_verify_delay_ms(),
            prefix_bytes: default_prefix_bytes(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Formats the header value: `Name/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Where checkpoints, the error log and the document database live
#[derive(Debug, Clone, Deserialize)]
pub struct StateConfig {
    /// Directory holding the checkpoint files and the error log
    #[serde(default = "default_state_dir")]
    pub directory: PathBuf,

    /// Path to the SQLite document database
    #[serde(rename = "database-path", default = "default_database_path")]
    pub database_path: PathBuf,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            directory: default_state_dir(),
            database_path: default_database_path(),
        }
    }
}

/// Allow/block rule files and how their patterns match
#[derive(Debug, Clone, Deserialize)]
pub struct RulesConfig {
    #[serde(rename = "allow-file", default = "default_allow_file")]
    pub allow_file: PathBuf,

    #[serde(rename = "block-file", default = "default_block_file")]
    pub block_file: PathBuf,

    #[serde(rename = "match-mode", default)]
    pub match_mode: MatchMode,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            allow_file: default_allow_file(),
            block_file: default_block_file(),
            match_mode: MatchMode::default(),
        }
    }
}

fn default_max_depth() -> u32 {
    3
}

fn default_crawl_delay_ms() -> u64 {
    2000
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_batch_size() -> usize {
    20
}

fn default_failure_budget() -> u32 {
    1
}

fn default_verify_delay_ms() -> u64 {
    1000
}

fn default_prefix_bytes() -> usize {
    32
}

fn default_state_dir() -> PathBuf {
    PathBuf::from("state")
}

fn default_database_path() -> PathBuf {
    PathBuf::from("state/found_documents.db")
}

fn default_allow_file() -> PathBuf {
    PathBuf::from("allowed_crawl_patterns.txt")
}

fn default_block_file() -> PathBuf {
    PathBuf::from("blocked_crawl_patterns.txt")
}
