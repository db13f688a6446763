//! Fuzz target for header storage and header value parsing.
//!
//! Tests the header map, token lists, quality values, entity tags, HTTP
//! dates, and URL decoding with arbitrary input.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use gusset::{
    best_match, decode_query_component, parse_http_date, parse_query_string, parse_ranked,
    parse_tokens, url, ETag, ETagList, HeaderMap,
};

/// Arbitrary header traffic for fuzzing.
#[derive(Debug, Arbitrary)]
struct FuzzHeaders {
    /// Key-value pairs to store
    pairs: Vec<(String, String)>,
    /// Raw value text fed to the value parsers
    value: String,
}

fuzz_target!(|data: FuzzHeaders| {
    if data.value.len() > 10_000 {
        return;
    }

    // Test 1: the header map takes or rejects pairs without panicking
    let mut headers = HeaderMap::new();
    for (name, value) in data.pairs.iter().take(100) {
        if name.len() > 1_000 || value.len() > 1_000 {
            continue;
        }
        if headers.insert(name.as_str(), value.as_str()).is_ok() {
            // Stored values read back under any spelling of the name
            assert_eq!(headers.get(name.as_str()), Some(value.as_str()));
            assert_eq!(
                headers.get(name.to_ascii_uppercase()),
                Some(value.as_str())
            );
        }
    }
    let _ = headers.content_length();
    let _ = headers.is_keep_alive();

    // Test 2: token lists
    for token in parse_tokens(&data.value) {
        assert!(!token.name.is_empty());
    }

    // Test 3: quality values, ranked best first
    let groups = parse_ranked(&data.value);
    for pair in groups.windows(2) {
        assert!(pair[0][0].quality >= pair[1][0].quality);
    }
    let _ = best_match(&data.value, |v| v.len() % 2 == 0);

    // Test 4: entity tags
    if let Some(etag) = ETag::parse(&data.value) {
        assert!(etag.weak_match(&etag));
        let list = ETagList::parse(&etag.to_header_value());
        assert!(list.contains_weak(&etag));
    }

    // Test 5: HTTP dates
    let _ = parse_http_date(&data.value);

    // Test 6: URL decoding and query strings
    let _ = url::decode(&data.value, false);
    let _ = url::decode(&data.value, true);
    let _ = decode_query_component(&data.value);
    if let Ok(pairs) = parse_query_string(&data.value) {
        for (name, _) in &pairs {
            assert!(!name.is_empty());
        }
    }
});
