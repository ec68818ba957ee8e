use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Tracks the politeness state of a single domain
///
/// Two timestamps are kept apart: `reserved_at` is set when a scheduler hands
/// out an entry for the domain, `last_request_time` when a request actually
/// starts. The scheduler honours both; the fetch executor only looks at real
/// request starts.
#[derive(Debug, Clone, Default)]
pub struct DomainState {
    /// Number of requests made to this domain in the current run
    pub request_count: u32,

    /// Start time of the last request to this domain
    pub last_request_time: Option<Instant>,

    /// When a scheduler last claimed this domain's politeness slot
    pub reserved_at: Option<Instant>,

    /// Network failures seen for this domain in the current run
    pub failures: u32,
}

impl DomainState {
    /// Creates a new DomainState with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// The later of the last reservation and the last request start
    pub fn last_activity(&self) -> Option<Instant> {
        match (self.reserved_at, self.last_request_time) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        }
    }

    /// Earliest instant at which a scheduler may hand out this domain again
    ///
    /// Returns None for a domain that has never been touched.
    pub fn next_eligible(&self, delay: Duration) -> Option<Instant> {
        self.last_activity().map(|t| t + delay)
    }

    /// Checks if a scheduler may hand out this domain at `now`
    ///
    /// # Arguments
    ///
    /// * `delay` - The minimum interval between two requests
    /// * `now` - The current time instant
    pub fn can_request(&self, delay: Duration, now: Instant) -> bool {
        self.next_eligible(delay).map_or(true, |t| now >= t)
    }

    /// Calculates how long a request must wait after the last real request start
    ///
    /// Returns None if a request can be made now.
    pub fn time_until_next_request(&self, delay: Duration, now: Instant) -> Option<Duration> {
        let last = self.last_request_time?;
        let elapsed = now.saturating_duration_since(last);
        if elapsed < delay {
            Some(delay - elapsed)
        } else {
            None
        }
    }

    /// Claims the politeness slot without starting a request
    pub fn reserve(&mut self, now: Instant) {
        self.reserved_at = Some(now);
    }

    /// Records that a request started, whatever its outcome
    pub fn record_request(&mut self, now: Instant) {
        self.request_count += 1;
        self.last_request_time = Some(now);
    }

    /// Records a network failure and returns the running total
    pub fn record_failure(&mut self) -> u32 {
        self.failures += 1;
        self.failures
    }
}

/// Per-domain politeness bookkeeping for one scheduler instance
#[derive(Debug, Clone)]
pub struct DomainThrottle {
    delay: Duration,
    states: HashMap<String, DomainState>,
}

impl DomainThrottle {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            states: HashMap::new(),
        }
    }

    /// The minimum interval between two requests to one domain
    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn state(&self, domain: &str) -> Option<&DomainState> {
        self.states.get(domain)
    }

    pub fn can_request(&self, domain: &str, now: Instant) -> bool {
        self.states
            .get(domain)
            .map_or(true, |s| s.can_request(self.delay, now))
    }

    pub fn next_eligible(&self, domain: &str) -> Option<Instant> {
        self.states
            .get(domain)
            .and_then(|s| s.next_eligible(self.delay))
    }

    pub fn time_until_next_request(&self, domain: &str, now: Instant) -> Option<Duration> {
        self.states
            .get(domain)
            .and_then(|s| s.time_until_next_request(self.delay, now))
    }

    pub fn reserve(&mut self, domain: &str, now: Instant) {
        self.entry(domain).reserve(now);
    }

    pub fn record_request(&mut self, domain: &str, now: Instant) {
        self.entry(domain).record_request(now);
    }

    pub fn record_failure(&mut self, domain: &str) -> u32 {
        self.entry(domain).record_failure()
    }

    pub fn request_count(&self, domain: &str) -> u32 {
        self.states.get(domain).map_or(0, |s| s.request_count)
    }

    /// Total requests started across all domains
    pub fn total_requests(&self) -> u64 {
        self.states.values().map(|s| u64::from(s.request_count)).sum()
    }

    /// Number of domains seen so far
    pub fn domain_count(&self) -> usize {
        self.states.len()
    }

    fn entry(&mut self, domain: &str) -> &mut DomainState {
        self.states.entry(domain.to_string()).or_default()
    }
}
