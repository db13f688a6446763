//! Fuzz target for `Range` header parsing.
//!
//! Tests that arbitrary header text never panics the parser and that every
//! resolved range stays inside the resource.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use gusset::{ByteRange, RangeResponse};

/// Arbitrary range request for fuzzing.
#[derive(Debug, Arbitrary)]
struct FuzzRange {
    /// Raw `Range` header value
    header: String,
    /// Resource length to resolve against
    complete_length: u64,
}

fuzz_target!(|data: FuzzRange| {
    if data.header.len() > 10_000 {
        return;
    }

    // Parsing must not panic, whatever the header looks like
    let Some(range) = ByteRange::parse(&data.header) else {
        return;
    };
    assert!(!range.ranges().is_empty());

    // A resolved range must hold its bounds
    match range.response(data.complete_length) {
        RangeResponse::Partial {
            start,
            end,
            content_length,
        } => {
            assert!(start <= end);
            assert!(end < data.complete_length);
            assert_eq!(content_length, end - start + 1);
        }
        RangeResponse::NotSatisfiable { complete_length } => {
            assert_eq!(complete_length, data.complete_length);
        }
        RangeResponse::Full => {}
    }
});
