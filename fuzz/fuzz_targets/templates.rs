//! Fuzz target for path templates and matchers.
//!
//! Tests template parsing and route matching with arbitrary patterns and
//! paths without panicking.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use gusset::{canonicalize, PathMatcher, PathTemplate, PathTemplateMatcher};

/// Arbitrary routing scenario for fuzzing.
#[derive(Debug, Arbitrary)]
struct FuzzTemplates {
    /// Patterns to register
    patterns: Vec<String>,
    /// Paths to match against
    match_paths: Vec<String>,
    /// Prefixes for the literal matcher
    prefixes: Vec<String>,
}

fuzz_target!(|data: FuzzTemplates| {
    // Limit registration count to prevent OOM
    let patterns: Vec<_> = data.patterns.into_iter().take(64).collect();
    let match_paths: Vec<_> = data.match_paths.into_iter().take(64).collect();

    let mut matcher: PathTemplateMatcher<usize> = PathTemplateMatcher::new();
    for (i, pattern) in patterns.iter().enumerate() {
        if pattern.len() > 1_000 {
            continue;
        }
        // May reject the pattern but must not panic
        let _ = matcher.add(pattern, i);
    }

    for path in &match_paths {
        if path.len() > 10_000 {
            continue;
        }

        // Matching must not panic, and captures must come from the path
        if let Some(hit) = matcher.match_path(path) {
            assert!(matcher.get(hit.template.pattern()).is_some());
            for (name, value) in hit.params.iter() {
                assert!(!name.is_empty());
                assert!(!value.is_empty());
                assert!(path.contains(value));
            }
        }

        // Standalone template matching agrees with its own param lists
        if let Ok(template) = PathTemplate::parse(path) {
            if let Some(params) = template.matches(path) {
                assert!(params.len() <= template.param_names().count());
            }
        }

        // Canonicalization is idempotent
        let canon = canonicalize(path);
        assert_eq!(canonicalize(&canon), canon.as_ref());
    }

    // The literal matcher handles arbitrary mounts
    let mut literal: PathMatcher<usize> = PathMatcher::new();
    for (i, prefix) in data.prefixes.into_iter().take(64).enumerate() {
        if prefix.len() > 1_000 {
            continue;
        }
        literal.add_prefix(&prefix, i);
    }
    for path in &match_paths {
        if let Some(hit) = literal.match_path(path) {
            assert!(path.ends_with(hit.remaining));
        }
    }
});
