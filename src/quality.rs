//! Quality Value Parsing
//!
//! Handles the `q=` weighting parameter carried by `Accept-Encoding`, `TE`,
//! and similar headers. Qualities are kept as fixed-point thousandths
//! (`0..=1000`) rather than floats, so `0.001` granularity survives
//! comparison and sorting exactly as RFC 9110 defines it.
//!
//! [`parse_ranked`] returns the listed values grouped by quality, best
//! group first, which is the shape content-encoding selection wants: pick
//! the first supported value out of the best group, only then fall through
//! to the next group.
//!
//! # Example
//!
//! ```rust
//! use gusset::quality::parse_ranked;
//!
//! let ranked = parse_ranked("gzip;q=0.8, deflate, br;q=0.8");
//! assert_eq!(ranked[0][0].value, "deflate");
//! assert_eq!(ranked[1].len(), 2);
//! ```

use std::fmt;

use compact_str::CompactString;

/// A quality weight in fixed-point thousandths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QValue(u16);

impl QValue {
    /// `q=0`, an explicit refusal.
    pub const ZERO: QValue = QValue(0);
    /// `q=1`, the default weight.
    pub const MAX: QValue = QValue(1000);

    /// Build from thousandths, clamping to `1000`.
    #[inline]
    pub const fn from_thousandths(value: u16) -> Self {
        if value > 1000 {
            QValue(1000)
        } else {
            QValue(value)
        }
    }

    /// Parse the RFC 9110 `qvalue` form: `0` with up to three decimal
    /// digits, or `1` with up to three zeros. Anything above `1.000` is
    /// rejected, not clamped.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().as_bytes();
        let &first = s.first()?;
        let base: u16 = match first {
            b'0' => 0,
            b'1' => 1000,
            _ => return None,
        };
        let rest = &s[1..];
        if rest.is_empty() {
            return Some(QValue(base));
        }
        if rest[0] != b'.' || rest.len() > 4 {
            return None;
        }

        let mut frac = 0u16;
        let mut scale = 100u16;
        for &b in &rest[1..] {
            if !b.is_ascii_digit() {
                return None;
            }
            frac += u16::from(b - b'0') * scale;
            scale /= 10;
        }
        if base == 1000 && frac > 0 {
            return None;
        }
        Some(QValue(base + frac))
    }

    /// The weight in thousandths.
    #[inline]
    pub const fn thousandths(&self) -> u16 {
        self.0
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// The weight as a float, for interop with float-based scoring.
    #[inline]
    pub fn as_f32(&self) -> f32 {
        f32::from(self.0) / 1000.0
    }
}

impl Default for QValue {
    fn default() -> Self {
        QValue::MAX
    }
}

impl fmt::Display for QValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            1000 => f.write_str("1"),
            0 => f.write_str("0"),
            n => {
                let digits = format!("{n:03}");
                write!(f, "0.{}", digits.trim_end_matches('0'))
            }
        }
    }
}

// ============================================================================
// Ranked Header Parsing
// ============================================================================

/// One listed value with its parsed weight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QValueResult {
    /// The value itself, e.g. `gzip` or `identity`.
    pub value: CompactString,
    /// Its weight; `q=1` when the parameter is absent or malformed.
    pub quality: QValue,
}

impl QValueResult {
    /// Check for an explicit `q=0` refusal.
    #[inline]
    pub fn is_refused(&self) -> bool {
        self.quality.is_zero()
    }
}

/// Parse a weighted header value into groups of equal quality, best first.
///
/// Order within a group follows the header. A missing or malformed `q`
/// parameter counts as `q=1`.
pub fn parse_ranked(header: &str) -> Vec<Vec<QValueResult>> {
    let mut results: Vec<QValueResult> = Vec::new();

    for item in header.split(',') {
        let item = item.trim();
        if item.is_empty() {
            continue;
        }

        let (value, params) = match item.split_once(';') {
            Some((v, p)) => (v.trim(), Some(p)),
            None => (item, None),
        };
        if value.is_empty() {
            continue;
        }

        let quality = params
            .into_iter()
            .flat_map(|p| p.split(';'))
            .find_map(|param| {
                let (key, raw) = param.split_once('=')?;
                if key.trim().eq_ignore_ascii_case("q") {
                    QValue::parse(raw)
                } else {
                    None
                }
            })
            .unwrap_or_default();

        results.push(QValueResult {
            value: CompactString::new(value),
            quality,
        });
    }

    // Stable sort keeps header order inside each quality group.
    results.sort_by(|a, b| b.quality.cmp(&a.quality));

    let mut grouped: Vec<Vec<QValueResult>> = Vec::new();
    for result in results {
        match grouped.last_mut() {
            Some(group) if group[0].quality == result.quality => group.push(result),
            _ => grouped.push(vec![result]),
        }
    }
    grouped
}

/// Pick the highest-quality value satisfying `supported`, skipping
/// explicit `q=0` refusals.
pub fn best_match<F>(header: &str, mut supported: F) -> Option<CompactString>
where
    F: FnMut(&str) -> bool,
{
    for group in parse_ranked(header) {
        for result in group {
            if result.is_refused() {
                continue;
            }
            if supported(&result.value) {
                return Some(result.value);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qvalue_parse() {
        assert_eq!(QValue::parse("1"), Some(QValue::MAX));
        assert_eq!(QValue::parse("1.0"), Some(QValue::MAX));
        assert_eq!(QValue::parse("1.000"), Some(QValue::MAX));
        assert_eq!(QValue::parse("0"), Some(QValue::ZERO));
        assert_eq!(QValue::parse("0.8"), Some(QValue::from_thousandths(800)));
        assert_eq!(QValue::parse("0.05"), Some(QValue::from_thousandths(50)));
        assert_eq!(QValue::parse("0.001"), Some(QValue::from_thousandths(1)));
    }

    #[test]
    fn test_qvalue_parse_rejects() {
        assert_eq!(QValue::parse(""), None);
        assert_eq!(QValue::parse("2"), None);
        assert_eq!(QValue::parse("-1"), None);
        assert_eq!(QValue::parse(".5"), None);
        assert_eq!(QValue::parse("0.1234"), None);
        assert_eq!(QValue::parse("0.x"), None);
    }

    #[test]
    fn test_qvalue_parse_rejects_above_one() {
        assert_eq!(QValue::parse("1.5"), None);
        assert_eq!(QValue::parse("1.001"), None);
        assert_eq!(QValue::parse("1.0001"), None);
    }

    #[test]
    fn test_from_thousandths_clamps() {
        assert_eq!(QValue::from_thousandths(5000), QValue::MAX);
    }

    #[test]
    fn test_qvalue_display() {
        assert_eq!(QValue::MAX.to_string(), "1");
        assert_eq!(QValue::ZERO.to_string(), "0");
        assert_eq!(QValue::from_thousandths(800).to_string(), "0.8");
        assert_eq!(QValue::from_thousandths(50).to_string(), "0.05");
        assert_eq!(QValue::from_thousandths(123).to_string(), "0.123");
    }

    #[test]
    fn test_parse_ranked_groups() {
        let ranked = parse_ranked("gzip;q=0.8, deflate, br;q=0.8, identity;q=0.1");
        assert_eq!(ranked.len(), 3);

        assert_eq!(ranked[0][0].value, "deflate");
        assert_eq!(ranked[0][0].quality, QValue::MAX);

        let middle: Vec<&str> = ranked[1].iter().map(|r| r.value.as_str()).collect();
        assert_eq!(middle, vec!["gzip", "br"]);

        assert_eq!(ranked[2][0].value, "identity");
    }

    #[test]
    fn test_parse_ranked_default_quality() {
        let ranked = parse_ranked("gzip, deflate");
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].len(), 2);
    }

    #[test]
    fn test_parse_ranked_malformed_q_defaults() {
        let ranked = parse_ranked("gzip;q=banana");
        assert_eq!(ranked[0][0].quality, QValue::MAX);
    }

    #[test]
    fn test_parse_ranked_ignores_empty_items() {
        let ranked = parse_ranked("gzip,, ,deflate");
        assert_eq!(ranked[0].len(), 2);
    }

    #[test]
    fn test_refusal() {
        let ranked = parse_ranked("identity;q=0");
        assert!(ranked[0][0].is_refused());
    }

    #[test]
    fn test_best_match() {
        let header = "br;q=1.0, gzip;q=0.8, identity;q=0";
        let best = best_match(header, |v| v == "gzip" || v == "identity");
        assert_eq!(best.as_deref(), Some("gzip"));

        // Refused values are never selected.
        let none = best_match(header, |v| v == "identity");
        assert_eq!(none, None);
    }

    #[test]
    fn test_best_match_case_of_uppercase_q() {
        let ranked = parse_ranked("gzip;Q=0.5");
        assert_eq!(ranked[0][0].quality, QValue::from_thousandths(500));
    }
}
