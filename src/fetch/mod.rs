//! Fetch module for Sumi-Scrape
//!
//! This module owns everything between a URL and its decoded body: the shared
//! HTTP session, the retrying GET, charset decoding and progress events.

mod decode;
mod fetcher;
mod progress;
mod session;

// Re-export main types
pub use decode::{cap_body, charset_from_content_type, decode_body};
pub use fetcher::{fetch, FetchPolicy, FetchedPage};
pub use progress::{
    notify, NoProgress, ProgressEvent, ProgressRecorder, ProgressSink, SinkError,
    TracingProgress,
};
pub use session::{build_http_client, Session};
