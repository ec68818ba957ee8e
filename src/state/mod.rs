//! State module for tracking crawl progress
//!
//! This module provides the state that must survive a crash or restart.
//!
//! # Components
//!
//! - `CrawlState`: Visited, in-flight and unreachable-domain sets
//! - `DomainState` / `DomainThrottle`: Per-domain politeness bookkeeping
//! - `CheckpointStore`: Atomic persistence of the crawl state to plain text files

mod checkpoint;
mod crawl_state;
mod domain_state;

// Re-export main types
pub use checkpoint::{
    CheckpointError, CheckpointResult, CheckpointStore, LoadedState, ERROR_LOG_FILE,
    FRONTIER_FILE, IN_FLIGHT_FILE, UNREACHABLE_FILE, VISITED_FILE,
};
pub use crawl_state::CrawlState;
pub use domain_state::{DomainState, DomainThrottle};
