//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with proper user agent strings
//! - GET requests to fetch page content
//! - Per-domain politeness bookkeeping, whatever the outcome
//! - Failure budgets that mark domains unreachable
//! - Prefix probes for the verification pass

use crate::config::UserAgentConfig;
use crate::state::DomainThrottle;
use crate::storage::VerificationRecord;
use crate::url::extract_domain;
use chrono::Utc;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE, LAST_MODIFIED, LOCATION};
use reqwest::{redirect::Policy, Client, Response, StatusCode};
use std::time::{Duration, Instant};
use url::Url;

/// Maximum number of HTTP redirects followed for one request
///
/// Redirects are followed by hand so every hop waits for its own domain's
/// politeness slot.
const MAX_REDIRECTS: usize = 10;

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchResult {
    /// Successfully fetched an HTML page
    Success {
        /// Final URL after redirects
        final_url: Url,
        /// HTTP status code
        status_code: u16,
        /// Page body content
        body: String,
    },

    /// The server answered with a non-2xx status
    HttpError { final_url: Url, status_code: u16 },

    /// Page is not HTML (Content-Type mismatch)
    ContentMismatch {
        final_url: Url,
        /// The actual Content-Type received
        content_type: String,
    },

    /// The headers arrived but the body could not be read
    BodyError { final_url: Url, error: String },

    /// Network error (connection refused, timeout, etc.)
    NetworkError {
        /// Domain whose request failed (a redirect hop's domain, if it failed there)
        domain: String,
        /// Error description
        error: String,
        /// Whether the domain has used up its failure budget
        domain_exhausted: bool,
    },
}

impl FetchResult {
    /// The URL the response came from, if any response arrived
    pub fn final_url(&self) -> Option<&Url> {
        match self {
            Self::Success { final_url, .. }
            | Self::HttpError { final_url, .. }
            | Self::ContentMismatch { final_url, .. }
            | Self::BodyError { final_url, .. } => Some(final_url),
            Self::NetworkError { .. } => None,
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout` - Fixed timeout applied to every request
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use docharvest::config::UserAgentConfig;
/// use docharvest::crawler::build_http_client;
/// use std::time::Duration;
///
/// let config = UserAgentConfig {
///     crawler_name: "DocHarvest".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config, Duration::from_secs(10)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .redirect(Policy::none())
        .gzip(true)
        .brotli(true)
        .build()
}

/// Performs requests under the politeness rules of a `DomainThrottle`
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    failure_budget: u32,
}

impl Fetcher {
    pub fn new(client: Client, failure_budget: u32) -> Self {
        Self {
            client,
            failure_budget: failure_budget.max(1),
        }
    }

    /// Fetches a page
    ///
    /// # Request Flow
    ///
    /// 1. Sleep if the domain's last request started less than the delay ago
    /// 2. Record the request start for the domain
    /// 3. Send GET
    /// 4. On a redirect, repeat from 1 for the target (up to 10 hops)
    /// 5. Classify the last response
    ///
    /// | Condition | Result |
    /// |-----------|--------|
    /// | Connect error, timeout, TLS error | NetworkError (counts against the failing domain's budget) |
    /// | Non-2xx status, including a redirect past the hop limit | HttpError |
    /// | Content-Type not HTML | ContentMismatch |
    /// | Body read fails | BodyError |
    /// | Otherwise | Success |
    pub async fn fetch(&self, url: &Url, throttle: &mut DomainThrottle) -> FetchResult {
        let response = match self.send(url, throttle).await {
            Ok(response) => response,
            Err(failure) => return self.network_failure(failure, throttle),
        };

        let final_url = response.url().clone();

        let status = response.status();
        if !status.is_success() {
            return FetchResult::HttpError {
                final_url,
                status_code: status.as_u16(),
            };
        }

        let content_type = header_string(&response, CONTENT_TYPE.as_str()).unwrap_or_default();
        if !is_html(&content_type) {
            return FetchResult::ContentMismatch {
                final_url,
                content_type,
            };
        }

        match response.text().await {
            Ok(body) => FetchResult::Success {
                final_url,
                status_code: status.as_u16(),
                body,
            },
            Err(e) => FetchResult::BodyError {
                final_url,
                error: e.to_string(),
            },
        }
    }

    /// Requests a document and captures its headers and leading bytes
    ///
    /// At most `prefix_len` body bytes are read, and only for 200 and 206
    /// responses. Content-Length is kept only when it is a plain integer.
    ///
    /// # Returns
    ///
    /// * `Ok(VerificationRecord)` - The server answered (any status)
    /// * `Err(String)` - Network failure; nothing should be recorded
    pub async fn probe(
        &self,
        url: &Url,
        prefix_len: usize,
        throttle: &mut DomainThrottle,
    ) -> Result<VerificationRecord, String> {
        let mut response = match self.send(url, throttle).await {
            Ok(response) => response,
            Err(failure) => {
                throttle.record_failure(&failure.domain);
                return Err(describe_error(&failure.error));
            }
        };

        let status = response.status();
        let content_type = header_string(&response, CONTENT_TYPE.as_str());
        let last_modified = header_string(&response, LAST_MODIFIED.as_str());
        let content_length = header_string(&response, CONTENT_LENGTH.as_str())
            .filter(|v| !v.is_empty() && v.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|v| v.parse::<u64>().ok());

        let mut initial_bytes = Vec::with_capacity(prefix_len);
        if status == StatusCode::OK || status == StatusCode::PARTIAL_CONTENT {
            while initial_bytes.len() < prefix_len {
                match response.chunk().await {
                    Ok(Some(chunk)) => {
                        let take = (prefix_len - initial_bytes.len()).min(chunk.len());
                        initial_bytes.extend_from_slice(&chunk[..take]);
                    }
                    Ok(None) => break,
                    Err(e) => {
                        tracing::debug!("Body read for {} stopped early: {}", url, e);
                        break;
                    }
                }
            }
        }

        Ok(VerificationRecord {
            accessed_at: Utc::now(),
            http_code: status.as_u16(),
            content_type,
            content_length,
            last_modified,
            initial_bytes,
        })
    }

    /// Sends a GET and follows redirects one hop at a time
    ///
    /// Each hop goes through `start_request` for its own domain. A redirect
    /// without a usable http(s) `Location`, or one past `MAX_REDIRECTS`, is
    /// returned as the response.
    async fn send(&self, url: &Url, throttle: &mut DomainThrottle) -> Result<Response, HopFailure> {
        let mut current = url.clone();
        let mut hops = 0;

        loop {
            let domain = extract_domain(&current).unwrap_or_default();
            self.start_request(&domain, throttle).await;

            let response = match self.client.get(current.as_str()).send().await {
                Ok(response) => response,
                Err(error) => {
                    return Err(HopFailure {
                        domain,
                        url: current,
                        error,
                    })
                }
            };

            if hops == MAX_REDIRECTS {
                return Ok(response);
            }
            let Some(next) = redirect_target(&response) else {
                return Ok(response);
            };

            tracing::debug!("Redirect {} -> {} ({})", current, next, response.status());
            hops += 1;
            current = next;
        }
    }

    /// Waits out the politeness delay if needed, then records the request start
    async fn start_request(&self, domain: &str, throttle: &mut DomainThrottle) {
        if let Some(wait) = throttle.time_until_next_request(domain, Instant::now()) {
            tracing::debug!("Throttling: waiting {:?} before accessing {}", wait, domain);
            tokio::time::sleep(wait).await;
        }
        throttle.record_request(domain, Instant::now());
    }

    fn network_failure(&self, failure: HopFailure, throttle: &mut DomainThrottle) -> FetchResult {
        let HopFailure { domain, url, error } = failure;
        let failures = throttle.record_failure(&domain);
        let domain_exhausted = failures >= self.failure_budget;
        let error = describe_error(&error);

        tracing::warn!(
            "Request failed for {} ({}/{} failures for {}): {}",
            url,
            failures,
            self.failure_budget,
            domain,
            error
        );

        FetchResult::NetworkError {
            domain,
            error,
            domain_exhausted,
        }
    }
}

/// A request that failed before any response arrived
struct HopFailure {
    domain: String,
    url: Url,
    error: reqwest::Error,
}

/// The http(s) URL a redirect response points at, if any
fn redirect_target(response: &Response) -> Option<Url> {
    let status = response.status();
    if !matches!(
        status,
        StatusCode::MOVED_PERMANENTLY
            | StatusCode::FOUND
            | StatusCode::SEE_OTHER
            | StatusCode::TEMPORARY_REDIRECT
            | StatusCode::PERMANENT_REDIRECT
    ) {
        return None;
    }

    let location = response.headers().get(LOCATION)?.to_str().ok()?;
    let next = response.url().join(location.trim()).ok()?;
    matches!(next.scheme(), "http" | "https").then_some(next)
}

fn header_string(response: &Response, name: &str) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
}

/// Missing Content-Type is treated as HTML
fn is_html(content_type: &str) -> bool {
    let ct = content_type.to_ascii_lowercase();
    ct.is_empty() || ct.contains("text/html") || ct.contains("application/xhtml+xml")
}

fn describe_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        format!("Request timeout: {}", e)
    } else if e.is_connect() {
        format!("Connection failed: {}", e)
    } else {
        e.to_string()
    }
}
