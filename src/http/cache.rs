//! HTTP cache control module
//!
//! Provides validator generation (weak `ETag`, `Last-Modified`) and
//! conditional request evaluation. Validators are derived from file
//! metadata on every request; nothing is cached between requests.

use chrono::{DateTime, NaiveDateTime, Utc};
use std::fs::Metadata;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// IMF-fixdate, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`
const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Validators for one version of a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validator {
    /// Weak `ETag`, e.g. `W/"11-5620f340"`
    pub etag: String,
    /// Modification time truncated to whole seconds
    pub last_modified: SystemTime,
}

impl Validator {
    /// Build validators from a size and modification time
    pub fn new(size: u64, modified: SystemTime) -> Self {
        let secs = modified
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_secs());
        Self {
            etag: generate_etag(size, secs),
            last_modified: UNIX_EPOCH + Duration::from_secs(secs),
        }
    }

    /// Build validators from file metadata
    ///
    /// Platforms without modification times fall back to the epoch.
    pub fn from_metadata(metadata: &Metadata) -> Self {
        Self::new(metadata.len(), metadata.modified().unwrap_or(UNIX_EPOCH))
    }

    /// `Last-Modified` header value
    pub fn last_modified_header(&self) -> String {
        format_http_date(self.last_modified)
    }

    /// Whether the request's preconditions say the client copy is current
    ///
    /// `If-None-Match` takes precedence; `If-Modified-Since` is only
    /// consulted when no entity tags were sent.
    pub fn is_not_modified(&self, if_none_match: Option<&str>, if_modified_since: Option<&str>) -> bool {
        if if_none_match.is_some() {
            return check_etag_match(if_none_match, &self.etag);
        }
        if_modified_since
            .and_then(parse_http_date)
            .is_some_and(|since| self.last_modified <= since)
    }
}

/// Generate a weak `ETag` from size and modification seconds
///
/// # Returns
/// Quoted weak `ETag` string, e.g., `W/"11-5620f340"`
pub fn generate_etag(size: u64, modified_secs: u64) -> String {
    format!("W/\"{size:x}-{modified_secs:x}\"")
}

/// Check if client's `If-None-Match` header matches the server's `ETag`
///
/// Uses weak comparison, so `W/"a"` and `"a"` are equal.
///
/// Supports:
/// - Single `ETag`: `"abc123"`
/// - Multiple `ETags`: `"abc123", W/"def456"`
/// - Wildcard: `*`
pub fn check_etag_match(if_none_match: Option<&str>, etag: &str) -> bool {
    let ours = opaque_tag(etag);
    if_none_match.is_some_and(|client_etag| {
        client_etag.split(',').any(|e| {
            let e = e.trim();
            e == "*" || opaque_tag(e) == ours
        })
    })
}

fn opaque_tag(etag: &str) -> &str {
    let etag = etag.trim();
    etag.strip_prefix("W/").unwrap_or(etag)
}

/// Format a timestamp as an HTTP date (always GMT)
pub fn format_http_date(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).format(HTTP_DATE_FORMAT).to_string()
}

/// Parse an HTTP date
///
/// Accepts IMF-fixdate and, as a fallback, anything RFC 2822 shaped.
/// Returns `None` for unparseable input.
pub fn parse_http_date(value: &str) -> Option<SystemTime> {
    let value = value.trim();
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, HTTP_DATE_FORMAT) {
        return Some(naive.and_utc().into());
    }
    DateTime::parse_from_rfc2822(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc).into())
}
