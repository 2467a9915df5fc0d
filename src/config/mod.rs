//! Configuration module for Sumi-Scrape
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every field has a default, so an empty file (or no file at all) yields a
//! usable snapshot.
//!
//! # Example
//!
//! ```no_run
//! use sumi_scrape::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("scrape.toml")).unwrap();
//! println!("Fetches will be attempted {} times", config.fetch.retries);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    AccessConfig, BatchConfig, CacheConfig, Config, FetchConfig, HandlerConfig, SummaryConfig,
    DEFAULT_USER_AGENT, MAX_CONCURRENCY,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
