//! Configuration module for DocHarvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use docharvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("docharvest.toml")).unwrap();
//! println!("Crawler will use max depth: {}", config.crawler.max_depth);
//! ```

mod parser;
mod types;
mod validation;

pub use types::{
    Config, CrawlerConfig, RulesConfig, StateConfig, UserAgentConfig, VerifierConfig,
};

pub use parser::{compute_config_hash, load_config, load_config_with_hash};
