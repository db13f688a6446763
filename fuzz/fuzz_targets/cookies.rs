//! Fuzz target for cookie parsing and rendering.
//!
//! Tests `Cookie` request/response parsing with arbitrary header text and
//! checks that rendered cookies survive a parse round trip.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use gusset::{
    parse_request_cookies, parse_set_cookie, Cookie, CookieParseOptions, SameSite,
};

/// Arbitrary cookie traffic for fuzzing.
#[derive(Debug, Arbitrary)]
struct FuzzCookies {
    /// A raw `Cookie` request header
    request_header: String,
    /// A raw `Set-Cookie` response header
    response_header: String,
    /// Parser knobs
    max_cookies: u8,
    allow_equals_in_value: bool,
    comma_is_separator: bool,
    /// Pieces for building a cookie to render
    name: String,
    value: String,
    path: Option<String>,
    max_age: Option<i64>,
    secure: bool,
    http_only: bool,
}

fuzz_target!(|data: FuzzCookies| {
    // Test 1: request parsing must not panic on arbitrary header text
    let options = CookieParseOptions {
        max_cookies: data.max_cookies as usize,
        allow_equals_in_value: data.allow_equals_in_value,
        comma_is_separator: data.comma_is_separator,
    };
    if data.request_header.len() < 10_000 {
        if let Ok(cookies) = parse_request_cookies(&data.request_header, &options) {
            assert!(cookies.len() <= options.max_cookies);
            for cookie in &cookies {
                assert!(!cookie.name.is_empty());
            }
        }
    }

    // Test 2: Set-Cookie parsing must not panic either
    if data.response_header.len() < 10_000 {
        let _ = parse_set_cookie(&data.response_header);
    }

    // Test 3: anything the writer accepts, the parser reads back
    if data.name.len() < 256 && data.value.len() < 1024 {
        let mut cookie = Cookie::new(&data.name, &data.value)
            .with_secure(data.secure)
            .with_http_only(data.http_only)
            .with_same_site(SameSite::Lax);
        if let Some(path) = &data.path {
            cookie = cookie.with_path(path);
        }
        if let Some(max_age) = data.max_age {
            cookie = cookie.with_max_age(max_age);
        }

        if let Ok(header) = cookie.to_set_cookie_header() {
            let parsed = parse_set_cookie(&header).expect("rendered cookie must parse");
            assert_eq!(parsed.name, cookie.name);
            assert_eq!(parsed.value, cookie.value);
            assert_eq!(parsed.max_age, cookie.max_age);
            assert_eq!(parsed.secure, cookie.secure);
            assert_eq!(parsed.http_only, cookie.http_only);
        }
    }
});
