//! HTTP cache validation module
//!
//! Provides `ETag`/`Last-Modified` generation and conditional request handling.

use chrono::{DateTime, Utc};
use std::time::SystemTime;

const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Cache validators for one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validators {
    /// Quoted `ETag`, e.g. `"6553f100-b"`
    pub etag: String,
    /// `Last-Modified` header value
    pub last_modified: String,
    modified_secs: i64,
}

impl Validators {
    /// Derive validators from file metadata without reading the content
    pub fn new(size: u64, modified: SystemTime) -> Self {
        let modified = DateTime::<Utc>::from(modified);
        let modified_secs = modified.timestamp();
        Self {
            etag: format!("\"{modified_secs:x}-{size:x}\""),
            last_modified: modified.format(HTTP_DATE_FORMAT).to_string(),
            modified_secs,
        }
    }

    /// Whether a 304 should be sent instead of the body.
    ///
    /// `If-None-Match` takes precedence; `If-Modified-Since` is only consulted
    /// when it is absent.
    pub fn not_modified(&self, if_none_match: Option<&str>, if_modified_since: Option<&str>) -> bool {
        if if_none_match.is_some() {
            return check_etag_match(if_none_match, &self.etag);
        }
        if_modified_since
            .and_then(parse_http_date)
            .is_some_and(|since| self.modified_secs <= since)
    }
}

/// Check if client's `If-None-Match` header matches the server's `ETag`
///
/// Supports:
/// - Single `ETag`: `"abc123"`
/// - Multiple `ETags`: `"abc123", "def456"`
/// - Weak `ETags`: `W/"abc123"`
/// - Wildcard: `*`
pub fn check_etag_match(if_none_match: Option<&str>, etag: &str) -> bool {
    if_none_match.is_some_and(|client_etag| {
        client_etag.split(',').any(|e| {
            let e = e.trim();
            e == "*" || e.trim_start_matches("W/") == etag
        })
    })
}

/// Parse an HTTP date into a Unix timestamp
pub fn parse_http_date(value: &str) -> Option<i64> {
    DateTime::parse_from_rfc2822(value.trim())
        .ok()
        .map(|t| t.timestamp())
}
