//! Content module for Sumi-Scrape
//!
//! This module turns a decoded body into what the caller receives:
//! - Classification into JSON, XML or markup
//! - HTML to plaintext extraction
//! - The provenance line that makes concatenated output attributable

mod classify;
mod extract;
mod xml;

use crate::config::SummaryConfig;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

// Re-export main types
pub use classify::{classify, Classification, ContentKind, ParsedBody};
pub use extract::{extract_text, preclean};
pub use xml::{has_xml_declaration, parse_xml, XmlElement, XmlNode};

/// Prefix of the provenance line
pub const PROVENANCE_PREFIX: &str = "Contents of url: ";

/// Builds the provenance line for a source URL, including the trailing newline
///
/// # Examples
///
/// ```
/// use sumi_scrape::content::provenance;
///
/// assert_eq!(provenance("https://example.com"), "Contents of url: https://example.com\n");
/// ```
pub fn provenance(url: &str) -> String {
    format!("{}{}\n", PROVENANCE_PREFIX, url)
}

/// The content produced for one URL
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ScrapeOutput {
    /// The body exactly as fetched
    Raw(String),
    /// Extracted plaintext, prefixed with the provenance line
    Text(String),
    /// A parsed JSON value
    Json(Value),
    /// A parsed XML document element
    Xml(XmlElement),
}

impl ScrapeOutput {
    /// Returns the string content of a raw or plaintext output
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Raw(text) | Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Returns the JSON value if this is a JSON output
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the XML element if this is an XML output
    pub fn as_xml(&self) -> Option<&XmlElement> {
        match self {
            Self::Xml(element) => Some(element),
            _ => None,
        }
    }

    /// Returns true if the output carries no content
    ///
    /// A blank raw body or a plaintext output holding only its provenance
    /// line is empty, as is a JSON null, empty string, empty array or empty
    /// object.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Raw(body) => body.trim().is_empty(),
            Self::Text(text) => text
                .strip_prefix(PROVENANCE_PREFIX)
                .and_then(|rest| rest.split_once('\n'))
                .map_or(text.as_str(), |(_, body)| body)
                .trim()
                .is_empty(),
            Self::Json(value) => match value {
                Value::Null => true,
                Value::String(s) => s.is_empty(),
                Value::Array(items) => items.is_empty(),
                Value::Object(map) => map.is_empty(),
                Value::Bool(_) | Value::Number(_) => false,
            },
            Self::Xml(_) => false,
        }
    }

    /// Renders the output for a concatenated result
    ///
    /// Plaintext already carries its provenance line; every other kind gets
    /// one here.
    pub fn to_aggregate(&self, source: &str) -> String {
        match self {
            Self::Text(text) => text.clone(),
            other => format!("{}{}", provenance(source), other),
        }
    }
}

impl fmt::Display for ScrapeOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Raw(text) | Self::Text(text) => f.write_str(text),
            Self::Json(value) => write!(f, "{}", value),
            Self::Xml(element) => write!(f, "{}", element),
        }
    }
}

/// Produces the output for a classified body
///
/// # Decision
///
/// | Kind | Raw requested or forced | Plaintext |
/// |------|-------------------------|-----------|
/// | JSON | original text | parsed value |
/// | XML | original text | parsed element |
/// | Markup | original text | extracted text, or original text if extraction is empty |
///
/// Structural kinds are parsed regardless of size; only markup is subject to
/// the size-forced raw rule. Extracted text is prefixed with the provenance
/// line, original text is returned untouched.
///
/// # Arguments
///
/// * `source` - The caller-supplied URL, used for the provenance line
/// * `body` - The decoded body
/// * `classification` - The result of [`classify`] on `body`
/// * `want_raw` - Whether the caller asked for the raw body
/// * `summary` - Size limits for extraction
pub fn render(
    source: &str,
    body: &str,
    classification: Classification,
    want_raw: bool,
    summary: &SummaryConfig,
) -> ScrapeOutput {
    let raw = || ScrapeOutput::Raw(body.to_string());

    if want_raw {
        return raw();
    }

    let force_raw = classification.force_raw;
    match classification.parsed {
        ParsedBody::Json(value) => ScrapeOutput::Json(value),
        ParsedBody::Xml(element) => ScrapeOutput::Xml(element),
        ParsedBody::Markup if force_raw => raw(),
        ParsedBody::Markup => match extract_text(body, summary.max_size) {
            Some(text) => ScrapeOutput::Text(format!("{}{}", provenance(source), text)),
            None => {
                tracing::debug!("No text extracted from {}, returning raw body", source);
                raw()
            }
        },
    }
}
