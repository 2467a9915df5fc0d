//! Response body decoding
//!
//! Bodies are decoded with the charset named in the Content-Type header,
//! falling back to UTF-8. Malformed byte sequences become U+FFFD; decoding
//! never fails.

use encoding_rs::{Encoding, UTF_8};

/// Extracts the `charset` parameter from a Content-Type header value
///
/// # Examples
///
/// ```
/// use sumi_scrape::fetch::charset_from_content_type;
///
/// assert_eq!(
///     charset_from_content_type("text/html; charset=ISO-8859-1"),
///     Some("ISO-8859-1")
/// );
/// assert_eq!(charset_from_content_type("application/json"), None);
/// ```
pub fn charset_from_content_type(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        if name.trim().eq_ignore_ascii_case("charset") {
            let value = value.trim().trim_matches('"').trim_matches('\'');
            (!value.is_empty()).then_some(value)
        } else {
            None
        }
    })
}

/// Decodes a response body into text
///
/// A byte-order mark overrides the declared charset. Unknown charset labels
/// fall back to UTF-8.
///
/// # Arguments
///
/// * `bytes` - The raw response body
/// * `content_type` - The Content-Type header value (may be empty)
pub fn decode_body(bytes: &[u8], content_type: &str) -> String {
    let encoding = charset_from_content_type(content_type)
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .unwrap_or(UTF_8);

    let (text, used, had_errors) = encoding.decode(bytes);
    if had_errors {
        tracing::debug!(
            "Replaced malformed {} sequences while decoding response body",
            used.name()
        );
    }
    text.into_owned()
}

/// Truncates text to at most `max_bytes` bytes without splitting a character
pub fn cap_body(mut text: String, max_bytes: Option<usize>) -> String {
    let Some(max) = max_bytes else {
        return text;
    };
    if text.len() > max {
        let mut cut = max;
        while !text.is_char_boundary(cut) {
            cut -= 1;
        }
        text.truncate(cut);
    }
    text
}
