//! URL handling module for DocHarvest
//!
//! This module provides URL normalization, domain extraction, link
//! classification, and the allow/block rules that gate what may be crawled.

mod classify;
mod domain;
mod matcher;
mod normalize;
mod rules;

// Re-export main functions
pub use classify::{classify, file_extension, LinkKind};
pub use domain::{extract_domain, extract_host};
pub use matcher::{matches_domain_suffix, MatchMode};
pub use normalize::{normalize_url, resolve_url};
pub use rules::CrawlRules;
