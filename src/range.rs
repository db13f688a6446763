//! Byte-Range Requests
//!
//! Parses the `Range` header and resolves it against a resource length
//! into the 206/416/200 decision. Per RFC 7233 a malformed `Range` header
//! is not an error: [`ByteRange::parse`] returns `None` and the caller
//! serves the full representation. Multiple ranges parse, but resolution
//! falls back to a full response rather than emitting
//! `multipart/byteranges`.
//!
//! # Example
//!
//! ```rust
//! use gusset::range::{ByteRange, RangeResponse};
//!
//! let range = ByteRange::parse("bytes=0-99").unwrap();
//! match range.response(1000) {
//!     RangeResponse::Partial { start, end, content_length } => {
//!         assert_eq!((start, end, content_length), (0, 99, 100));
//!     }
//!     _ => unreachable!(),
//! }
//! ```

use std::time::SystemTime;

use smallvec::SmallVec;

use crate::date;
use crate::etag::ETag;

/// One range out of a `Range` header, bounds still relative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeSpec {
    /// `start-end` (inclusive) or `start-` when `end` is `None`.
    From { start: u64, end: Option<u64> },
    /// `-n`: the final `n` bytes.
    Suffix(u64),
}

/// What to send back for a `Range` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeResponse {
    /// 206 with `start..=end` of the resource.
    Partial {
        start: u64,
        end: u64,
        content_length: u64,
    },
    /// 416, `Content-Range: bytes */len`.
    NotSatisfiable { complete_length: u64 },
    /// 200 with the whole resource; the header was ignorable.
    Full,
}

/// A parsed `Range` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ByteRange {
    ranges: SmallVec<[RangeSpec; 1]>,
}

impl ByteRange {
    /// Parse a `Range` header value.
    ///
    /// `None` means the header should be ignored: wrong unit, bad syntax,
    /// an inverted range, or no ranges at all. RFC 7233 wants a full 200
    /// response in all those cases, never a 400.
    pub fn parse(header: &str) -> Option<ByteRange> {
        let spec = header.strip_prefix("bytes=")?;
        let mut ranges: SmallVec<[RangeSpec; 1]> = SmallVec::new();

        for item in spec.split(',') {
            let item = item.trim();
            let (start, end) = item.split_once('-')?;
            if start.is_empty() {
                // Suffix form "-n".
                ranges.push(RangeSpec::Suffix(parse_u64(end)?));
                continue;
            }
            let start = parse_u64(start)?;
            let end = if end.is_empty() {
                None
            } else {
                let end = parse_u64(end)?;
                if end < start {
                    return None;
                }
                Some(end)
            };
            ranges.push(RangeSpec::From { start, end });
        }

        if ranges.is_empty() {
            return None;
        }
        Some(ByteRange { ranges })
    }

    /// The ranges as listed in the header.
    #[inline]
    pub fn ranges(&self) -> &[RangeSpec] {
        &self.ranges
    }

    /// Resolve against the resource length.
    ///
    /// Only single-range requests produce a 206; a multi-range request
    /// resolves to [`RangeResponse::Full`].
    pub fn response(&self, complete_length: u64) -> RangeResponse {
        if self.ranges.len() != 1 {
            return RangeResponse::Full;
        }

        match self.ranges[0] {
            RangeSpec::From { start, end } => {
                if start >= complete_length {
                    return RangeResponse::NotSatisfiable { complete_length };
                }
                let end = end
                    .unwrap_or(complete_length - 1)
                    .min(complete_length - 1);
                RangeResponse::Partial {
                    start,
                    end,
                    content_length: end - start + 1,
                }
            }
            RangeSpec::Suffix(n) => {
                if n == 0 || complete_length == 0 {
                    return RangeResponse::NotSatisfiable { complete_length };
                }
                let start = complete_length - n.min(complete_length);
                RangeResponse::Partial {
                    start,
                    end: complete_length - 1,
                    content_length: complete_length - start,
                }
            }
        }
    }
}

#[inline]
fn parse_u64(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Render `Content-Range` for a 206.
pub fn format_content_range(start: u64, end: u64, complete_length: u64) -> String {
    format!("bytes {start}-{end}/{complete_length}")
}

/// Render `Content-Range` for a 416.
pub fn format_unsatisfied_range(complete_length: u64) -> String {
    format!("bytes */{complete_length}")
}

/// Evaluate an `If-Range` header.
///
/// Returns `true` when the range may be honored: the header carries
/// either an entity tag (strong comparison against the current tag) or a
/// date (resource unmodified since then). Anything else, or a missing
/// validator on our side, means serve the full representation.
pub fn if_range_permits(
    header: &str,
    etag: Option<&ETag>,
    last_modified: Option<SystemTime>,
) -> bool {
    let header = header.trim();
    if header.is_empty() {
        return false;
    }

    // An entity tag always starts with a quote or the weakness marker.
    if header.starts_with('"') || header.starts_with("W/") || header.starts_with("w/") {
        return match (ETag::parse(header), etag) {
            (Some(requested), Some(current)) => requested.strong_match(current),
            _ => false,
        };
    }

    match last_modified {
        Some(last_modified) => date::unmodified_since(header, last_modified),
        None => false,
    }
}
