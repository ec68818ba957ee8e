use crate::crawler::scheduler::{FrontierEntry, Scheduler};
use crate::state::CrawlState;
use crate::url::{extract_domain, CrawlRules};
use std::fmt;
use url::Url;

/// Why a URL may not be scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rejection {
    UnreachableDomain,
    Blocked,
    NotAllowed,
    AlreadyVisited,
    InFlight,
    AlreadyQueued,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::UnreachableDomain => "domain marked unreachable",
            Self::Blocked => "matched a block rule",
            Self::NotAllowed => "matched no allow rule",
            Self::AlreadyVisited => "already visited",
            Self::InFlight => "already in flight",
            Self::AlreadyQueued => "already queued",
        };
        f.write_str(reason)
    }
}

/// Decides whether a normalized URL may enter the frontier
///
/// Checks run in a fixed order and the first failure wins: unreachable
/// domain, block rules, allow rules, visited, in flight, queued.
pub fn check_eligibility(
    url: &Url,
    rules: &CrawlRules,
    state: &CrawlState,
    frontier: &Scheduler<FrontierEntry>,
) -> Result<(), Rejection> {
    if let Some(domain) = extract_domain(url) {
        if state.is_unreachable(&domain) {
            return Err(Rejection::UnreachableDomain);
        }
    }

    if rules.is_blocked(url) {
        return Err(Rejection::Blocked);
    }

    if !rules.is_allowed(url) {
        return Err(Rejection::NotAllowed);
    }

    let key = url.to_string();

    if state.is_visited(&key) {
        return Err(Rejection::AlreadyVisited);
    }

    if state.is_in_flight(&key) {
        return Err(Rejection::InFlight);
    }

    if frontier.contains(&key) {
        return Err(Rejection::AlreadyQueued);
    }

    Ok(())
}
