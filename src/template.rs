//! Path Templates
//!
//! URI templates in the `/users/{id}/orders/{order}` style, plus a
//! matcher that picks the most specific registered template for a path:
//!
//! - **Zero-allocation matching**: parameter values borrow from the path,
//!   names borrow from the template
//! - **Trailing wildcard**: `/static/*` captures the remainder under `*`
//! - **Specificity ordering**: literal segments beat parameters, and both
//!   beat a wildcard tail, no matter the registration order
//!
//! Fully literal templates short-circuit through an exact-match table;
//! only templated patterns pay for the ordered scan.
//!
//! # Example
//!
//! ```rust
//! use gusset::template::PathTemplateMatcher;
//!
//! let mut matcher = PathTemplateMatcher::new();
//! matcher.add("/users/{id}", 1).unwrap();
//! matcher.add("/users/me", 2).unwrap();
//!
//! let hit = matcher.match_path("/users/me").unwrap();
//! assert_eq!(*hit.value, 2);
//!
//! let hit = matcher.match_path("/users/42").unwrap();
//! assert_eq!(hit.params.get("id"), Some("42"));
//! ```

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use compact_str::CompactString;
use smallvec::SmallVec;

use crate::error::{Error, Result};

/// Maximum number of inline path parameters before heap allocation.
pub const INLINE_PARAM_COUNT: usize = 8;

/// Maximum template segments for inline storage.
pub const INLINE_SEGMENT_COUNT: usize = 16;

// ============================================================================
// Parameters
// ============================================================================

/// Parameters captured by a template match.
///
/// Names borrow from the template (`'t`), values from the matched path
/// (`'p`); nothing is copied during matching.
#[derive(Debug, Clone, Default)]
pub struct PathParams<'t, 'p> {
    params: SmallVec<[(&'t str, &'p str); INLINE_PARAM_COUNT]>,
    wildcard: Option<&'p str>,
}

impl<'t, 'p> PathParams<'t, 'p> {
    #[inline]
    fn push(&mut self, name: &'t str, value: &'p str) {
        self.params.push((name, value));
    }

    /// Get a parameter by name. `"*"` returns the wildcard capture.
    #[inline]
    pub fn get(&self, name: &str) -> Option<&'p str> {
        if name == "*" {
            return self.wildcard;
        }
        self.params
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| *v)
    }

    /// Get a parameter and parse it.
    #[inline]
    pub fn get_parsed<T: std::str::FromStr>(&self, name: &str) -> Option<T> {
        self.get(name)?.parse().ok()
    }

    /// The trailing-wildcard capture, if the template had one.
    #[inline]
    pub fn wildcard(&self) -> Option<&'p str> {
        self.wildcard
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Check if params are stored inline.
    #[inline]
    pub fn is_inline(&self) -> bool {
        !self.params.spilled()
    }

    /// Iterate over `(name, value)` pairs in template order.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&'t str, &'p str)> {
        self.params.iter().copied()
    }

    /// Copy out into owned pairs.
    pub fn to_owned_pairs(&self) -> Vec<(CompactString, CompactString)> {
        self.params
            .iter()
            .map(|(n, v)| (CompactString::new(n), CompactString::new(v)))
            .collect()
    }
}

// ============================================================================
// Template
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
enum TemplateSegment {
    Literal(CompactString),
    Param(CompactString),
}

/// A parsed path template.
#[derive(Debug, Clone)]
pub struct PathTemplate {
    pattern: CompactString,
    segments: SmallVec<[TemplateSegment; INLINE_SEGMENT_COUNT]>,
    trailing_wildcard: bool,
}

impl PathTemplate {
    /// Parse a template.
    ///
    /// Rules: the template starts with `/`; a `{name}` parameter occupies
    /// a whole segment; parameter names are unique within a template; `*`
    /// is only legal as the final segment.
    pub fn parse(pattern: &str) -> Result<Self> {
        let Some(body) = pattern.strip_prefix('/') else {
            return Err(Error::InvalidTemplate(format!(
                "template must start with '/': {pattern:?}"
            )));
        };

        let mut segments: SmallVec<[TemplateSegment; INLINE_SEGMENT_COUNT]> = SmallVec::new();
        let mut trailing_wildcard = false;

        for raw in body.split('/') {
            if trailing_wildcard {
                return Err(Error::InvalidTemplate(format!(
                    "'*' must be the final segment: {pattern:?}"
                )));
            }
            if raw == "*" {
                trailing_wildcard = true;
                continue;
            }
            if let Some(inner) = raw.strip_prefix('{') {
                let Some(name) = inner.strip_suffix('}') else {
                    return Err(Error::InvalidTemplate(format!(
                        "unclosed parameter in {pattern:?}"
                    )));
                };
                if name.is_empty() || name.contains(['{', '}', '/']) {
                    return Err(Error::InvalidTemplate(format!(
                        "bad parameter name {name:?} in {pattern:?}"
                    )));
                }
                if segments
                    .iter()
                    .any(|s| matches!(s, TemplateSegment::Param(n) if n == name))
                {
                    return Err(Error::InvalidTemplate(format!(
                        "duplicate parameter {name:?} in {pattern:?}"
                    )));
                }
                segments.push(TemplateSegment::Param(CompactString::new(name)));
            } else {
                if raw.contains(['{', '}']) {
                    return Err(Error::InvalidTemplate(format!(
                        "parameter must span a whole segment: {pattern:?}"
                    )));
                }
                segments.push(TemplateSegment::Literal(CompactString::new(raw)));
            }
        }

        Ok(Self {
            pattern: CompactString::new(pattern),
            segments,
            trailing_wildcard,
        })
    }

    /// The template as written.
    #[inline]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Check for a template with no parameters and no wildcard.
    #[inline]
    pub fn is_static(&self) -> bool {
        !self.trailing_wildcard
            && self
                .segments
                .iter()
                .all(|s| matches!(s, TemplateSegment::Literal(_)))
    }

    /// Check for the trailing `*`.
    #[inline]
    pub fn has_wildcard(&self) -> bool {
        self.trailing_wildcard
    }

    /// The parameter names, in template order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            TemplateSegment::Param(name) => Some(name.as_str()),
            TemplateSegment::Literal(_) => None,
        })
    }

    /// Match a path, capturing parameters.
    ///
    /// Matching is strict: segment counts must line up (unless the
    /// template ends in `*`), empty path segments only match themselves,
    /// and a parameter never captures an empty segment.
    pub fn matches<'t, 'p>(&'t self, path: &'p str) -> Option<PathParams<'t, 'p>> {
        let body = path.strip_prefix('/')?;

        // Segment spans, so the wildcard tail can borrow from `path`.
        let mut spans: SmallVec<[(usize, usize); INLINE_SEGMENT_COUNT]> = SmallVec::new();
        let mut start = 1;
        for segment in body.split('/') {
            spans.push((start, start + segment.len()));
            start += segment.len() + 1;
        }

        if self.trailing_wildcard {
            if spans.len() <= self.segments.len() {
                return None;
            }
        } else if spans.len() != self.segments.len() {
            return None;
        }

        let mut params = PathParams::default();
        for (segment, &(seg_start, seg_end)) in self.segments.iter().zip(spans.iter()) {
            let value = &path[seg_start..seg_end];
            match segment {
                TemplateSegment::Literal(expected) => {
                    if expected != value {
                        return None;
                    }
                }
                TemplateSegment::Param(name) => {
                    if value.is_empty() {
                        return None;
                    }
                    params.push(name, value);
                }
            }
        }

        if self.trailing_wildcard {
            let (tail_start, _) = spans[self.segments.len()];
            params.wildcard = Some(&path[tail_start..]);
        }
        Some(params)
    }

    /// Check for the same structure: identical literals and parameter
    /// positions, parameter names ignored.
    pub fn same_shape(&self, other: &PathTemplate) -> bool {
        self.trailing_wildcard == other.trailing_wildcard
            && self.segments.len() == other.segments.len()
            && self
                .segments
                .iter()
                .zip(other.segments.iter())
                .all(|(a, b)| match (a, b) {
                    (TemplateSegment::Literal(x), TemplateSegment::Literal(y)) => x == y,
                    (TemplateSegment::Param(_), TemplateSegment::Param(_)) => true,
                    _ => false,
                })
    }

    /// Specificity order: templates that should be tried earlier sort
    /// first. Literals beat parameters segment by segment; a wildcard
    /// tail loses to anything more precise.
    pub fn cmp_specificity(&self, other: &PathTemplate) -> Ordering {
        for pair in self.segments.iter().zip(other.segments.iter()) {
            match pair {
                (TemplateSegment::Literal(a), TemplateSegment::Literal(b)) => match a.cmp(b) {
                    Ordering::Equal => {}
                    unequal => return unequal,
                },
                (TemplateSegment::Literal(_), TemplateSegment::Param(_)) => {
                    return Ordering::Less;
                }
                (TemplateSegment::Param(_), TemplateSegment::Literal(_)) => {
                    return Ordering::Greater;
                }
                (TemplateSegment::Param(_), TemplateSegment::Param(_)) => {}
            }
        }
        // Shared prefix: the longer template is more specific, and a
        // wildcard tail is less specific than none.
        match other.segments.len().cmp(&self.segments.len()) {
            Ordering::Equal => self.trailing_wildcard.cmp(&other.trailing_wildcard),
            unequal => unequal,
        }
    }
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern)
    }
}

// ============================================================================
// Matcher
// ============================================================================

/// A successful template match.
#[derive(Debug)]
pub struct PathTemplateMatch<'t, 'p, T> {
    /// The winning template.
    pub template: &'t PathTemplate,
    /// The value registered with it.
    pub value: &'t T,
    /// Captured parameters.
    pub params: PathParams<'t, 'p>,
}

/// Routes paths to values through a set of templates, most specific
/// template first.
#[derive(Debug, Default)]
pub struct PathTemplateMatcher<T> {
    /// Fully literal templates, matched through a single hash lookup.
    statics: HashMap<CompactString, (PathTemplate, T)>,
    /// Templated patterns in specificity order.
    templated: Vec<(PathTemplate, T)>,
}

impl<T> PathTemplateMatcher<T> {
    pub fn new() -> Self {
        Self {
            statics: HashMap::new(),
            templated: Vec::new(),
        }
    }

    /// Number of registered templates.
    pub fn len(&self) -> usize {
        self.statics.len() + self.templated.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statics.is_empty() && self.templated.is_empty()
    }

    /// Register a template.
    ///
    /// Fails on a malformed template or one whose structure is already
    /// registered; `/users/{id}` and `/users/{name}` route identically
    /// and are treated as the same template.
    pub fn add(&mut self, pattern: &str, value: T) -> Result<()> {
        let template = PathTemplate::parse(pattern)?;

        if template.is_static() {
            if self.statics.contains_key(template.pattern()) {
                return Err(Error::TemplateConflict(pattern.to_string()));
            }
            tracing::debug!(template = %template, "registered exact template");
            self.statics
                .insert(template.pattern.clone(), (template, value));
            return Ok(());
        }

        if self.templated.iter().any(|(t, _)| t.same_shape(&template)) {
            return Err(Error::TemplateConflict(pattern.to_string()));
        }
        let insert_at = self
            .templated
            .partition_point(|(t, _)| t.cmp_specificity(&template) == Ordering::Less);
        tracing::debug!(template = %template, "registered path template");
        self.templated.insert(insert_at, (template, value));
        Ok(())
    }

    /// Remove a template by pattern, returning its value. Parameter
    /// names are ignored, exactly as in [`PathTemplateMatcher::add`].
    pub fn remove(&mut self, pattern: &str) -> Option<T> {
        let template = PathTemplate::parse(pattern).ok()?;
        if template.is_static() {
            return self.statics.remove(template.pattern()).map(|(_, v)| v);
        }
        let pos = self
            .templated
            .iter()
            .position(|(t, _)| t.same_shape(&template))?;
        Some(self.templated.remove(pos).1)
    }

    /// Look up the value registered for a template structure.
    pub fn get(&self, pattern: &str) -> Option<&T> {
        let template = PathTemplate::parse(pattern).ok()?;
        if template.is_static() {
            return self.statics.get(template.pattern()).map(|(_, v)| v);
        }
        self.templated
            .iter()
            .find(|(t, _)| t.same_shape(&template))
            .map(|(_, v)| v)
    }

    /// Match a path against the registered templates.
    ///
    /// Anything from `?` onwards is ignored. The most specific matching
    /// template wins.
    pub fn match_path<'t, 'p>(&'t self, path: &'p str) -> Option<PathTemplateMatch<'t, 'p, T>> {
        MATCHER_STATS.record_attempt();
        let path = match memchr::memchr(b'?', path.as_bytes()) {
            Some(pos) => &path[..pos],
            None => path,
        };

        if let Some((template, value)) = self.statics.get(path) {
            MATCHER_STATS.record_hit(true);
            return Some(PathTemplateMatch {
                template,
                value,
                params: PathParams::default(),
            });
        }

        for (template, value) in &self.templated {
            if let Some(params) = template.matches(path) {
                MATCHER_STATS.record_hit(false);
                return Some(PathTemplateMatch {
                    template,
                    value,
                    params,
                });
            }
        }
        None
    }

    /// Iterate over every registered template.
    pub fn templates(&self) -> impl Iterator<Item = &PathTemplate> {
        self.statics
            .values()
            .map(|(t, _)| t)
            .chain(self.templated.iter().map(|(t, _)| t))
    }
}

// ============================================================================
// Statistics
// ============================================================================

/// Template matcher statistics.
#[derive(Debug, Default)]
pub struct MatcherStats {
    attempts: AtomicU64,
    exact_hits: AtomicU64,
    template_hits: AtomicU64,
}

impl MatcherStats {
    fn record_attempt(&self) {
        self.attempts.fetch_add(1, AtomicOrdering::Relaxed);
    }

    fn record_hit(&self, exact: bool) {
        if exact {
            self.exact_hits.fetch_add(1, AtomicOrdering::Relaxed);
        } else {
            self.template_hits.fetch_add(1, AtomicOrdering::Relaxed);
        }
    }

    pub fn attempts(&self) -> u64 {
        self.attempts.load(AtomicOrdering::Relaxed)
    }

    pub fn exact_hits(&self) -> u64 {
        self.exact_hits.load(AtomicOrdering::Relaxed)
    }

    pub fn template_hits(&self) -> u64 {
        self.template_hits.load(AtomicOrdering::Relaxed)
    }

    /// Share of attempts answered by a match.
    pub fn hit_ratio(&self) -> f64 {
        let attempts = self.attempts() as f64;
        if attempts > 0.0 {
            (self.exact_hits() + self.template_hits()) as f64 / attempts
        } else {
            0.0
        }
    }
}

static MATCHER_STATS: MatcherStats = MatcherStats {
    attempts: AtomicU64::new(0),
    exact_hits: AtomicU64::new(0),
    template_hits: AtomicU64::new(0),
};

/// Global matcher stats.
pub fn matcher_stats() -> &'static MatcherStats {
    &MATCHER_STATS
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basics() {
        let t = PathTemplate::parse("/users/{id}/orders/{order}").unwrap();
        assert!(!t.is_static());
        assert!(!t.has_wildcard());
        let names: Vec<&str> = t.param_names().collect();
        assert_eq!(names, vec!["id", "order"]);
    }

    #[test]
    fn test_parse_rejects() {
        assert!(PathTemplate::parse("users/{id}").is_err());
        assert!(PathTemplate::parse("/users/{id").is_err());
        assert!(PathTemplate::parse("/users/{}").is_err());
        assert!(PathTemplate::parse("/users/{id}/{id}").is_err());
        assert!(PathTemplate::parse("/v{version}").is_err());
        assert!(PathTemplate::parse("/a/*/b").is_err());
    }

    #[test]
    fn test_match_params() {
        let t = PathTemplate::parse("/users/{id}/posts/{post}").unwrap();
        let params = t.matches("/users/42/posts/7").unwrap();
        assert_eq!(params.get("id"), Some("42"));
        assert_eq!(params.get("post"), Some("7"));
        assert_eq!(params.get_parsed::<u32>("post"), Some(7));
        assert!(params.is_inline());
    }

    #[test]
    fn test_match_strictness() {
        let t = PathTemplate::parse("/users/{id}").unwrap();
        assert!(t.matches("/users/42/extra").is_none());
        assert!(t.matches("/users").is_none());
        assert!(t.matches("/users/").is_none()); // empty param segment
        assert!(t.matches("users/42").is_none());
        assert!(t.matches("/Users/42").is_none());
    }

    #[test]
    fn test_match_root() {
        let t = PathTemplate::parse("/").unwrap();
        assert!(t.matches("/").is_some());
        assert!(t.matches("/x").is_none());
    }

    #[test]
    fn test_wildcard_capture() {
        let t = PathTemplate::parse("/static/*").unwrap();
        let params = t.matches("/static/css/app.css").unwrap();
        assert_eq!(params.wildcard(), Some("css/app.css"));
        assert_eq!(params.get("*"), Some("css/app.css"));

        assert_eq!(t.matches("/static/").unwrap().wildcard(), Some(""));
        assert!(t.matches("/static").is_none());
    }

    #[test]
    fn test_wildcard_after_param() {
        let t = PathTemplate::parse("/api/{version}/*").unwrap();
        let params = t.matches("/api/v2/users/42").unwrap();
        assert_eq!(params.get("version"), Some("v2"));
        assert_eq!(params.wildcard(), Some("users/42"));
    }

    #[test]
    fn test_specificity_literal_beats_param() {
        let mut matcher = PathTemplateMatcher::new();
        matcher.add("/users/{id}", "param").unwrap();
        matcher.add("/users/me", "literal").unwrap();

        assert_eq!(*matcher.match_path("/users/me").unwrap().value, "literal");
        assert_eq!(*matcher.match_path("/users/42").unwrap().value, "param");
    }

    #[test]
    fn test_specificity_wildcard_loses() {
        let mut matcher = PathTemplateMatcher::new();
        matcher.add("/files/*", "wild").unwrap();
        matcher.add("/files/{name}", "param").unwrap();

        assert_eq!(*matcher.match_path("/files/a").unwrap().value, "param");
        assert_eq!(*matcher.match_path("/files/a/b").unwrap().value, "wild");
    }

    #[test]
    fn test_longer_wildcard_prefix_wins() {
        let mut matcher = PathTemplateMatcher::new();
        matcher.add("/a/*", "short").unwrap();
        matcher.add("/a/b/*", "long").unwrap();

        assert_eq!(*matcher.match_path("/a/b/c").unwrap().value, "long");
        assert_eq!(*matcher.match_path("/a/x/c").unwrap().value, "short");
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut matcher = PathTemplateMatcher::new();
        matcher.add("/users/{id}", 1).unwrap();
        let err = matcher.add("/users/{name}", 2);
        assert!(matches!(err, Err(Error::TemplateConflict(_))));

        matcher.add("/about", 3).unwrap();
        assert!(matches!(
            matcher.add("/about", 4),
            Err(Error::TemplateConflict(_))
        ));
    }

    #[test]
    fn test_remove_and_get() {
        let mut matcher = PathTemplateMatcher::new();
        matcher.add("/users/{id}", 1).unwrap();
        matcher.add("/about", 2).unwrap();

        assert_eq!(matcher.get("/users/{anything}"), Some(&1));
        assert_eq!(matcher.remove("/users/{id}"), Some(1));
        assert!(matcher.match_path("/users/42").is_none());

        assert_eq!(matcher.remove("/about"), Some(2));
        assert!(matcher.is_empty());
    }

    #[test]
    fn test_query_string_ignored() {
        let mut matcher = PathTemplateMatcher::new();
        matcher.add("/users/{id}", ()).unwrap();
        let hit = matcher.match_path("/users/42?verbose=1").unwrap();
        assert_eq!(hit.params.get("id"), Some("42"));
    }

    #[test]
    fn test_match_reports_template() {
        let mut matcher = PathTemplateMatcher::new();
        matcher.add("/users/{id}", ()).unwrap();
        let hit = matcher.match_path("/users/42").unwrap();
        assert_eq!(hit.template.pattern(), "/users/{id}");
    }
}
