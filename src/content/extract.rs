//! HTML to plaintext extraction
//!
//! Extraction is best-effort: a regex pass strips known noise (head, scripts,
//! styles, comments, navigation) before the remaining markup is walked with
//! `scraper` and flattened to text in reading order.

use ego_tree::NodeRef;
use regex::Regex;
use scraper::{Html, Node};
use std::sync::OnceLock;

/// Patterns removed before parsing, in application order
const PRECLEAN_PATTERNS: &[&str] = &[
    r"(?is)^.*?Contents\s+move to sidebar\s+hide",
    r"(?is)<head\b[^>]*>.*?</head\s*>",
    r"(?is)<script\b[^>]*>.*?</script\s*>",
    r"(?is)<style\b[^>]*>.*?</style\s*>",
    r"(?is)<noscript\b[^>]*>.*?</noscript\s*>",
    r"(?s)<!--.*?-->",
    r"(?is)<nav\b[^>]*>.*?</nav\s*>",
    r"(?is)<footer\b[^>]*>.*?</footer\s*>",
];

/// Elements whose content is never text
const SKIPPED_ELEMENTS: &[&str] = &[
    "head", "script", "style", "noscript", "template", "iframe", "svg", "canvas",
];

/// Elements that start a new line
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "dd", "details", "div", "dl", "dt",
    "fieldset", "figcaption", "figure", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header",
    "hr", "li", "main", "ol", "p", "pre", "section", "summary", "table", "tr", "ul",
];

fn preclean_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        PRECLEAN_PATTERNS
            .iter()
            .filter_map(|pattern| Regex::new(pattern).ok())
            .collect()
    })
}

/// Removes boilerplate blocks from raw HTML by pattern substitution
///
/// This is not a sanitizer; malformed markup may leave residue behind.
pub fn preclean(html: &str) -> String {
    preclean_patterns()
        .iter()
        .fold(html.to_string(), |text, pattern| {
            pattern.replace_all(&text, "").into_owned()
        })
}

/// Converts HTML to plaintext
///
/// Applying the extractor to its own output returns that output unchanged.
/// Decoded text that would read back as markup (`&lt;b&gt;` becoming `<b>`)
/// is returned with `&` and `<` escaped so a second pass decodes it to the
/// same characters instead of parsing new elements.
///
/// # Arguments
/// * `html` - Raw HTML string
/// * `max_chars` - Maximum characters to return (hard cutoff)
///
/// # Returns
/// The extracted text, or None if nothing but whitespace remains, in which
/// case callers should fall back to the raw body.
///
/// # Example
///
/// ```
/// use sumi_scrape::content::extract_text;
///
/// let text = extract_text("<html><body><p>Hello</p><p>World</p></body></html>", 100);
/// assert_eq!(text.as_deref(), Some("Hello\nWorld"));
/// ```
pub fn extract_text(html: &str, max_chars: usize) -> Option<String> {
    let text = flatten(html, max_chars)?;
    if flatten(&text, max_chars).as_deref() == Some(text.as_str()) {
        Some(text)
    } else {
        Some(escape_markup(&text))
    }
}

/// Single extraction pass: preclean, parse, walk, collapse, truncate
fn flatten(html: &str, max_chars: usize) -> Option<String> {
    let cleaned = preclean(html);
    let document = Html::parse_document(&cleaned);

    let mut raw = String::new();
    walk(document.tree.root(), &mut raw);

    let collapsed = collapse_whitespace(&raw);
    let truncated: String = collapsed.trim().chars().take(max_chars).collect();
    let text = truncated.trim_end();

    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// Escapes the characters that start entities and tags
fn escape_markup(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;")
}

fn walk(node: NodeRef<'_, Node>, out: &mut String) {
    match node.value() {
        Node::Text(text) => out.push_str(text),
        Node::Element(element) => {
            let name = element.name();
            if SKIPPED_ELEMENTS.contains(&name) {
                return;
            }
            if name == "br" {
                out.push('\n');
                return;
            }

            let block = BLOCK_ELEMENTS.contains(&name);
            if block {
                out.push('\n');
            }
            for child in node.children() {
                walk(child, out);
            }
            if block {
                out.push('\n');
            }
        }
        Node::Document | Node::Fragment => {
            for child in node.children() {
                walk(child, out);
            }
        }
        _ => {}
    }
}

/// Collapses whitespace runs: a run containing a line break becomes a single
/// newline, any other run a single space
fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending: Option<char> = None;

    for ch in text.chars() {
        if ch.is_whitespace() {
            pending = match (pending, ch) {
                (_, '\n') | (Some('\n'), _) => Some('\n'),
                _ => Some(' '),
            };
        } else {
            if let Some(separator) = pending.take() {
                out.push(separator);
            }
            out.push(ch);
        }
    }

    out
}
