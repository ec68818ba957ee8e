use std::collections::{BTreeSet, HashMap, HashSet};

/// Membership sets for a crawl, apart from the frontier
///
/// The frontier itself lives in the scheduler. A URL moves frontier →
/// in-flight → visited and is never in two of those places at once.
#[derive(Debug, Clone, Default)]
pub struct CrawlState {
    visited: HashSet<String>,
    in_flight: HashMap<String, u32>,
    unreachable_domains: BTreeSet<String>,
}

impl CrawlState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds state from checkpointed sets
    pub fn from_parts(
        visited: HashSet<String>,
        in_flight: HashMap<String, u32>,
        unreachable_domains: BTreeSet<String>,
    ) -> Self {
        Self {
            visited,
            in_flight,
            unreachable_domains,
        }
    }

    pub fn is_visited(&self, url: &str) -> bool {
        self.visited.contains(url)
    }

    pub fn is_in_flight(&self, url: &str) -> bool {
        self.in_flight.contains_key(url)
    }

    pub fn is_unreachable(&self, domain: &str) -> bool {
        self.unreachable_domains.contains(domain)
    }

    /// Claims a URL for processing at the given depth
    pub fn begin(&mut self, url: &str, depth: u32) {
        self.in_flight.insert(url.to_string(), depth);
    }

    /// Resolves a claimed URL: it leaves in-flight and becomes visited
    pub fn complete(&mut self, url: &str) {
        self.in_flight.remove(url);
        self.visited.insert(url.to_string());
    }

    /// Marks a domain unreachable for the rest of the run
    ///
    /// Returns true if the domain was not already marked.
    pub fn mark_unreachable(&mut self, domain: &str) -> bool {
        self.unreachable_domains.insert(domain.to_string())
    }

    /// Removes every in-flight entry, ordered by URL
    ///
    /// Used at startup: whatever was in flight when the previous run stopped
    /// never finished and goes back to the frontier.
    pub fn take_in_flight(&mut self) -> Vec<(String, u32)> {
        let mut entries: Vec<(String, u32)> = self.in_flight.drain().collect();
        entries.sort();
        entries
    }

    pub fn visited(&self) -> impl Iterator<Item = &str> {
        self.visited.iter().map(String::as_str)
    }

    pub fn in_flight(&self) -> impl Iterator<Item = (&str, u32)> {
        self.in_flight.iter().map(|(url, depth)| (url.as_str(), *depth))
    }

    pub fn unreachable_domains(&self) -> impl Iterator<Item = &str> {
        self.unreachable_domains.iter().map(String::as_str)
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    pub fn unreachable_count(&self) -> usize {
        self.unreachable_domains.len()
    }
}
