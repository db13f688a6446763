//! HTTP Date Handling
//!
//! Formatting and parsing for the IMF-fixdate form used by `Date`,
//! `Last-Modified`, `Expires`, and friends. Parsing also accepts the two
//! obsolete forms (RFC 850 and asctime) that RFC 9110 requires recipients
//! to understand; all of that is delegated to the `httpdate` crate.
//!
//! [`cached_date_header`] serves the hot path: a server stamps every
//! response with a `Date` header, but the rendered string only changes once
//! a second, so it is cached globally and re-rendered at most once per
//! second across all threads.

use std::time::{SystemTime, UNIX_EPOCH};

use compact_str::CompactString;
use once_cell::sync::Lazy;
use parking_lot::Mutex;

/// Render a timestamp as an IMF-fixdate string, e.g.
/// `Sun, 06 Nov 1994 08:49:37 GMT`.
#[inline]
pub fn format_http_date(time: SystemTime) -> String {
    httpdate::fmt_http_date(time)
}

/// Parse an HTTP date in any of the three RFC 9110 forms.
///
/// Returns `None` for anything unparseable; callers treat a malformed
/// conditional header as absent rather than failing the request.
#[inline]
pub fn parse_http_date(value: &str) -> Option<SystemTime> {
    httpdate::parse_http_date(value.trim()).ok()
}

// ============================================================================
// Cached Date Header
// ============================================================================

struct CachedDate {
    second: u64,
    rendered: CompactString,
}

static DATE_CACHE: Lazy<Mutex<CachedDate>> = Lazy::new(|| {
    Mutex::new(CachedDate {
        second: 0,
        rendered: CompactString::const_new(""),
    })
});

/// Current time as a `Date` header value, cached at one-second granularity.
pub fn cached_date_header() -> CompactString {
    let now = SystemTime::now();
    let second = unix_seconds(now);

    let mut cache = DATE_CACHE.lock();
    if cache.second != second || cache.rendered.is_empty() {
        cache.second = second;
        cache.rendered = CompactString::new(httpdate::fmt_http_date(now));
    }
    cache.rendered.clone()
}

// ============================================================================
// Conditional Comparisons
// ============================================================================

#[inline]
fn unix_seconds(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Evaluate an `If-Modified-Since` header against a resource timestamp.
///
/// Returns `true` when the resource changed after the header's instant, so
/// the full response should be sent; `false` means a 304 is in order. HTTP
/// dates carry whole seconds only, so both sides are truncated before
/// comparing. A malformed header counts as modified.
pub fn modified_since(header: &str, last_modified: SystemTime) -> bool {
    match parse_http_date(header) {
        Some(since) => unix_seconds(last_modified) > unix_seconds(since),
        None => true,
    }
}

/// Evaluate an `If-Unmodified-Since` header against a resource timestamp.
///
/// Returns `true` when the resource is unchanged since the header's
/// instant, so the request may proceed; `false` calls for a 412. A
/// malformed header fails the precondition.
pub fn unmodified_since(header: &str, last_modified: SystemTime) -> bool {
    match parse_http_date(header) {
        Some(since) => unix_seconds(last_modified) <= unix_seconds(since),
        None => false,
    }
}
