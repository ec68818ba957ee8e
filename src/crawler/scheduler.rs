//! Domain-throttled task scheduler
//!
//! This module handles:
//! - Per-domain FIFO queues of pending tasks
//! - A min-heap of domains keyed by the instant they next become eligible
//! - A min-heap of ready domains keyed by the arrival order of their head task
//! - Sleeping until the earliest eligible instant when nothing is ready
//!
//! The same scheduler drives the crawl frontier and the verification pass.

use crate::state::DomainThrottle;
use crate::url::extract_domain;
use crate::UrlError;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet, VecDeque};
use std::hash::Hash;
use std::time::{Duration, Instant};
use url::Url;

/// Something a `Scheduler` can hand out under per-domain politeness rules
pub trait ScheduledTask {
    /// Identity used to reject duplicate pushes
    type Key: Hash + Eq + Clone;

    fn key(&self) -> Self::Key;

    /// Domain whose politeness slot the task consumes
    fn domain(&self) -> &str;
}

/// A URL waiting in the crawl frontier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierEntry {
    pub url: Url,
    pub depth: u32,
    pub domain: String,
}

impl FrontierEntry {
    pub fn new(url: Url, depth: u32) -> Result<Self, UrlError> {
        let domain = extract_domain(&url).ok_or(UrlError::MissingDomain)?;
        Ok(Self { url, depth, domain })
    }
}

impl ScheduledTask for FrontierEntry {
    type Key = String;

    fn key(&self) -> String {
        self.url.to_string()
    }

    fn domain(&self) -> &str {
        &self.domain
    }
}

/// Scheduler hands out tasks so that no domain is hit more often than the
/// throttle delay allows
///
/// Among domains that are ready, the one whose head task arrived first wins.
/// A domain that has just been handed out goes to the back of the waiting
/// heap, so busy domains cannot starve the others.
pub struct Scheduler<T: ScheduledTask> {
    /// Pending tasks per domain, tagged with their arrival sequence
    queues: HashMap<String, VecDeque<(u64, T)>>,

    /// Keys of every pending task
    queued: HashSet<T::Key>,

    /// Domains not yet eligible: (eligible at, head sequence, domain)
    waiting: BinaryHeap<Reverse<(Instant, u64, String)>>,

    /// Domains eligible now: (head sequence, domain)
    ready: BinaryHeap<Reverse<(u64, String)>>,

    throttle: DomainThrottle,
    next_seq: u64,
}

impl<T: ScheduledTask> Scheduler<T> {
    /// Creates a new scheduler with the given politeness delay
    pub fn new(delay: Duration) -> Self {
        Self {
            queues: HashMap::new(),
            queued: HashSet::new(),
            waiting: BinaryHeap::new(),
            ready: BinaryHeap::new(),
            throttle: DomainThrottle::new(delay),
            next_seq: 0,
        }
    }

    /// Adds a task to the back of its domain's queue
    ///
    /// # Returns
    ///
    /// `false` if a task with the same key is already queued
    pub fn push(&mut self, task: T) -> bool {
        let key = task.key();
        if self.queued.contains(&key) {
            return false;
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        let domain = task.domain().to_string();
        self.queued.insert(key);

        let queue = self.queues.entry(domain.clone()).or_default();
        let was_idle = queue.is_empty();
        queue.push_back((seq, task));

        if was_idle {
            self.schedule_domain(domain, seq, Instant::now());
        }

        true
    }

    pub fn contains(&self, key: &T::Key) -> bool {
        self.queued.contains(key)
    }

    /// Drops every task queued for `domain`, returning them in order
    ///
    /// Heap entries for the domain go stale and are skipped when popped.
    pub fn remove_domain(&mut self, domain: &str) -> Vec<T> {
        let Some(queue) = self.queues.remove(domain) else {
            return Vec::new();
        };

        queue
            .into_iter()
            .map(|(_, task)| {
                self.queued.remove(&task.key());
                task
            })
            .collect()
    }

    /// Returns the number of queued tasks
    pub fn len(&self) -> usize {
        self.queued.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queued.is_empty()
    }

    /// Number of domains with at least one queued task
    pub fn domain_count(&self) -> usize {
        self.queues.len()
    }

    pub fn throttle(&self) -> &DomainThrottle {
        &self.throttle
    }

    /// Gives the fetch executor access to the shared politeness state
    pub fn throttle_mut(&mut self) -> &mut DomainThrottle {
        &mut self.throttle
    }

    /// All queued tasks in the order they were pushed
    pub fn snapshot(&self) -> Vec<&T> {
        let mut entries: Vec<(u64, &T)> = self
            .queues
            .values()
            .flat_map(|queue| queue.iter().map(|(seq, task)| (*seq, task)))
            .collect();
        entries.sort_by_key(|(seq, _)| *seq);
        entries.into_iter().map(|(_, task)| task).collect()
    }

    /// Hands out the earliest-queued task whose domain is eligible at `now`
    ///
    /// The domain's politeness slot is reserved at `now`. Returns None when
    /// no domain is eligible yet (or nothing is queued).
    pub fn next_ready(&mut self, now: Instant) -> Option<T> {
        self.promote_waiting(now);

        while let Some(Reverse((head_seq, domain))) = self.ready.pop() {
            // The throttle may have moved since the domain was marked ready.
            if let Some(at) = self.throttle.next_eligible(&domain) {
                if at > now {
                    self.waiting.push(Reverse((at, head_seq, domain)));
                    continue;
                }
            }

            let Some(queue) = self.queues.get_mut(&domain) else {
                continue;
            };
            let Some((_, task)) = queue.pop_front() else {
                self.queues.remove(&domain);
                continue;
            };

            self.throttle.reserve(&domain, now);
            self.queued.remove(&task.key());

            match queue.front().map(|(seq, _)| *seq) {
                Some(next_seq) => {
                    let at = now + self.throttle.delay();
                    self.waiting.push(Reverse((at, next_seq, domain)));
                }
                None => {
                    self.queues.remove(&domain);
                }
            }

            return Some(task);
        }

        None
    }

    /// Earliest instant at which a waiting domain may become eligible
    pub fn next_wake(&self) -> Option<Instant> {
        if !self.ready.is_empty() {
            return Some(Instant::now());
        }
        self.waiting.peek().map(|Reverse((at, _, _))| *at)
    }

    /// Waits for and hands out the next eligible task
    ///
    /// Sleeps until the earliest next-eligible instant rather than polling.
    /// Returns None once the scheduler is empty.
    pub async fn next_entry(&mut self) -> Option<T> {
        loop {
            if self.is_empty() {
                return None;
            }

            if let Some(task) = self.next_ready(Instant::now()) {
                return Some(task);
            }

            let wake = self.next_wake()?;
            tracing::trace!(
                "No domain ready, sleeping {:?} ({} tasks queued)",
                wake.saturating_duration_since(Instant::now()),
                self.len()
            );
            tokio::time::sleep_until(tokio::time::Instant::from_std(wake)).await;
        }
    }

    /// Moves every waiting domain whose instant has passed onto the ready heap
    fn promote_waiting(&mut self, now: Instant) {
        while let Some(Reverse((at, _, _))) = self.waiting.peek() {
            if *at > now {
                break;
            }
            let Some(Reverse((_, head_seq, domain))) = self.waiting.pop() else {
                break;
            };

            match self.throttle.next_eligible(&domain) {
                Some(actual) if actual > now => {
                    self.waiting.push(Reverse((actual, head_seq, domain)));
                }
                _ => self.ready.push(Reverse((head_seq, domain))),
            }
        }
    }

    /// Places a domain that just gained its first task on the right heap
    fn schedule_domain(&mut self, domain: String, head_seq: u64, now: Instant) {
        match self.throttle.next_eligible(&domain) {
            Some(at) if at > now => self.waiting.push(Reverse((at, head_seq, domain))),
            _ => self.ready.push(Reverse((head_seq, domain))),
        }
    }
}
