use crate::content::ScrapeOutput;
use serde::Serialize;
use std::fmt;

/// The content produced for one caller URL
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScrapeEntry {
    /// The URL as supplied by the caller
    pub url: String,
    pub content: ScrapeOutput,
}

/// Aggregated result of a scrape request, in input order
#[derive(Debug, Clone, PartialEq)]
pub enum ScrapeResponse {
    /// All entries joined into one attributable string
    Concatenated(String),
    /// One `{url, content}` record per input URL
    Structured(Vec<ScrapeEntry>),
}

impl ScrapeResponse {
    /// Returns the concatenated string, if that was the requested shape
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Concatenated(text) => Some(text),
            Self::Structured(_) => None,
        }
    }

    /// Returns the entries, if that was the requested shape
    pub fn entries(&self) -> Option<&[ScrapeEntry]> {
        match self {
            Self::Concatenated(_) => None,
            Self::Structured(entries) => Some(entries),
        }
    }

    /// Renders the response as JSON (a string, or an array of records)
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        match self {
            Self::Concatenated(text) => serde_json::to_string(text),
            Self::Structured(entries) => serde_json::to_string_pretty(entries),
        }
    }
}

impl fmt::Display for ScrapeResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Concatenated(text) => f.write_str(text),
            Self::Structured(entries) => f.write_str(&concatenate(entries)),
        }
    }
}

/// Joins entries into a single string, each starting with its provenance line
pub fn concatenate(entries: &[ScrapeEntry]) -> String {
    entries
        .iter()
        .map(|entry| entry.content.to_aggregate(&entry.url))
        .collect::<Vec<_>>()
        .join("\n")
}
