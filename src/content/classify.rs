//! Body classification
//!
//! A pure decision over a decoded body: which representation it is in, and
//! whether it is small enough that it must be returned raw.

use super::xml::{has_xml_declaration, parse_xml, XmlElement};
use crate::config::SummaryConfig;
use serde_json::Value;

/// Representation of a fetched body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    Json,
    Xml,
    /// HTML or plain text
    Markup,
}

/// A body parsed according to its detected kind
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedBody {
    Json(Value),
    Xml(XmlElement),
    Markup,
}

/// Result of classifying a body
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    /// The parsed structural value, if any
    pub parsed: ParsedBody,
    /// True when the body is at or below the minimum summary size
    pub force_raw: bool,
}

impl Classification {
    /// Returns the detected kind
    pub fn kind(&self) -> ContentKind {
        match self.parsed {
            ParsedBody::Json(_) => ContentKind::Json,
            ParsedBody::Xml(_) => ContentKind::Xml,
            ParsedBody::Markup => ContentKind::Markup,
        }
    }
}

/// Classifies a decoded body
///
/// Detection order is fixed:
/// 1. Valid JSON
/// 2. An XML declaration followed by well-formed XML
/// 3. Anything else is markup
///
/// Independently, a body whose character count is `<= summary.min_size` is
/// forced raw. A `min_size` of 0 disables forcing.
///
/// # Examples
///
/// ```
/// use sumi_scrape::config::SummaryConfig;
/// use sumi_scrape::content::{classify, ContentKind};
///
/// let summary = SummaryConfig { min_size: 4, max_size: 100 };
/// let result = classify(r#"{"a": 1}"#, &summary);
/// assert_eq!(result.kind(), ContentKind::Json);
/// assert!(!result.force_raw);
/// ```
pub fn classify(body: &str, summary: &SummaryConfig) -> Classification {
    let parsed = if let Ok(value) = serde_json::from_str::<Value>(body) {
        ParsedBody::Json(value)
    } else if has_xml_declaration(body) {
        parse_xml(body).map_or(ParsedBody::Markup, ParsedBody::Xml)
    } else {
        ParsedBody::Markup
    };

    let force_raw = summary.min_size > 0 && body.chars().count() <= summary.min_size;

    Classification { parsed, force_raw }
}
