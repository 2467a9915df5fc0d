//! Batch module for Sumi-Scrape
//!
//! This module contains the scrape orchestrator, its output types and the
//! optional in-memory result cache.

mod cache;
mod orchestrator;
mod output;

// Re-export main types
pub use cache::{CacheEntry, CacheInfo, TtlCache};
pub use orchestrator::{run_bounded, ScrapeRequest, Scraper};
pub use output::{concatenate, ScrapeEntry, ScrapeResponse};
