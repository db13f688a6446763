//! Peer Address Access Control
//!
//! An ordered allow/deny rule list evaluated against a peer's IP address.
//! Rules match an exact address, a CIDR block, or an IPv4 octet wildcard
//! (`192.168.*.*`); the first matching rule decides, and the default policy
//! covers everything else.
//!
//! IPv4-mapped IPv6 peers (`::ffff:a.b.c.d`) are folded back to IPv4 before
//! matching, so a dual-stack listener needs only one rule per host.
//!
//! ## Example
//!
//! ```rust
//! use gusset::acl::PeerAcl;
//!
//! let acl = PeerAcl::builder()
//!     .deny("10.0.0.5")?
//!     .allow("10.0.0.0/8")?
//!     .allow("192.168.*.*")?
//!     .default_allow(false)
//!     .build();
//!
//! assert!(acl.is_allowed("10.1.2.3".parse()?));
//! assert!(!acl.is_allowed("10.0.0.5".parse()?));
//! assert!(!acl.is_allowed("8.8.8.8".parse()?));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use ipnet::IpNet;
use serde::Deserialize;
use serde::de;

use crate::error::{Error, Result};

// ============================================================================
// Rules
// ============================================================================

/// What a single rule matches against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RulePattern {
    /// One address, compared for equality.
    Exact(IpAddr),
    /// A CIDR block, v4 or v6.
    Subnet(IpNet),
    /// Four IPv4 octets, `None` standing for `*`. Never matches IPv6.
    Ipv4Wildcard([Option<u8>; 4]),
}

impl RulePattern {
    /// Parse a pattern spec: exact IP, CIDR, or IPv4 wildcard.
    pub fn parse(spec: &str) -> Result<Self> {
        let spec = spec.trim();
        if let Ok(ip) = spec.parse::<IpAddr>() {
            return Ok(Self::Exact(ip));
        }
        if let Ok(net) = spec.parse::<IpNet>() {
            return Ok(Self::Subnet(net));
        }
        if spec.contains('*') {
            return parse_wildcard(spec);
        }
        Err(Error::InvalidAclRule(spec.to_string()))
    }

    fn matches(&self, peer: &IpAddr) -> bool {
        match self {
            Self::Exact(addr) => addr == peer,
            Self::Subnet(net) => net.contains(peer),
            Self::Ipv4Wildcard(octets) => match peer {
                IpAddr::V4(v4) => octets
                    .iter()
                    .zip(v4.octets())
                    .all(|(rule, actual)| rule.is_none_or(|b| b == actual)),
                IpAddr::V6(_) => false,
            },
        }
    }
}

impl fmt::Display for RulePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(addr) => addr.fmt(f),
            Self::Subnet(net) => net.fmt(f),
            Self::Ipv4Wildcard(octets) => {
                for (i, octet) in octets.iter().enumerate() {
                    if i > 0 {
                        f.write_str(".")?;
                    }
                    match octet {
                        Some(b) => write!(f, "{b}")?,
                        None => f.write_str("*")?,
                    }
                }
                Ok(())
            }
        }
    }
}

fn parse_wildcard(spec: &str) -> Result<RulePattern> {
    let mut octets = [None; 4];
    let mut parts = spec.split('.');
    for slot in &mut octets {
        let part = parts
            .next()
            .ok_or_else(|| Error::InvalidAclRule(spec.to_string()))?;
        *slot = match part {
            "*" => None,
            octet => Some(
                octet
                    .parse::<u8>()
                    .map_err(|_| Error::InvalidAclRule(spec.to_string()))?,
            ),
        };
    }
    if parts.next().is_some() {
        return Err(Error::InvalidAclRule(spec.to_string()));
    }
    Ok(RulePattern::Ipv4Wildcard(octets))
}

/// One access-control rule: a pattern plus its verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AclRule {
    pattern: RulePattern,
    allow: bool,
}

impl AclRule {
    /// An allow rule for the given spec.
    pub fn allow(spec: &str) -> Result<Self> {
        Ok(Self {
            pattern: RulePattern::parse(spec)?,
            allow: true,
        })
    }

    /// A deny rule for the given spec.
    pub fn deny(spec: &str) -> Result<Self> {
        Ok(Self {
            pattern: RulePattern::parse(spec)?,
            allow: false,
        })
    }

    /// Whether this rule admits matching peers.
    #[inline]
    pub fn is_allow(&self) -> bool {
        self.allow
    }

    /// The pattern this rule matches.
    #[inline]
    pub fn pattern(&self) -> &RulePattern {
        &self.pattern
    }
}

impl fmt::Display for AclRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verdict = if self.allow { "allow" } else { "deny" };
        write!(f, "{verdict} {}", self.pattern)
    }
}

/// The textual form used in config files: `"allow 10.0.0.0/8"`,
/// `"deny 192.168.*.*"`.
impl FromStr for AclRule {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (verdict, spec) = s
            .trim()
            .split_once(char::is_whitespace)
            .ok_or_else(|| Error::InvalidAclRule(s.to_string()))?;
        match verdict {
            v if v.eq_ignore_ascii_case("allow") => Self::allow(spec),
            v if v.eq_ignore_ascii_case("deny") => Self::deny(spec),
            _ => Err(Error::InvalidAclRule(s.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for AclRule {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

// ============================================================================
// The ACL
// ============================================================================

/// An ordered peer ACL. First matching rule wins; the default policy covers
/// peers no rule matches.
#[derive(Debug, Clone)]
pub struct PeerAcl {
    rules: Vec<AclRule>,
    default_allow: bool,
}

impl PeerAcl {
    /// Start building an ACL. The default policy starts as deny.
    pub fn builder() -> PeerAclBuilder {
        PeerAclBuilder::default()
    }

    /// Decide whether `peer` may proceed.
    pub fn is_allowed(&self, peer: IpAddr) -> bool {
        let peer = peer.to_canonical();
        for rule in &self.rules {
            if rule.pattern.matches(&peer) {
                if !rule.allow {
                    tracing::debug!(peer = %peer, rule = %rule, "peer denied");
                }
                return rule.allow;
            }
        }
        if !self.default_allow {
            tracing::debug!(peer = %peer, "peer denied by default policy");
        }
        self.default_allow
    }

    /// The rules, in evaluation order.
    pub fn rules(&self) -> &[AclRule] {
        &self.rules
    }
}

/// Builder for [`PeerAcl`].
#[derive(Debug, Default)]
pub struct PeerAclBuilder {
    rules: Vec<AclRule>,
    default_allow: bool,
}

impl PeerAclBuilder {
    /// Append an allow rule.
    pub fn allow(mut self, spec: &str) -> Result<Self> {
        self.rules.push(AclRule::allow(spec)?);
        Ok(self)
    }

    /// Append a deny rule.
    pub fn deny(mut self, spec: &str) -> Result<Self> {
        self.rules.push(AclRule::deny(spec)?);
        Ok(self)
    }

    /// Append an already-parsed rule.
    pub fn rule(mut self, rule: AclRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Append rules in bulk, keeping their order.
    pub fn rules(mut self, rules: impl IntoIterator<Item = AclRule>) -> Self {
        self.rules.extend(rules);
        self
    }

    /// Set the verdict for peers no rule matches.
    pub fn default_allow(mut self, allow: bool) -> Self {
        self.default_allow = allow;
        self
    }

    pub fn build(self) -> PeerAcl {
        PeerAcl {
            rules: self.rules,
            default_allow: self.default_allow,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn test_first_match_wins() {
        let acl = PeerAcl::builder()
            .deny("10.0.0.5")
            .unwrap()
            .allow("10.0.0.0/8")
            .unwrap()
            .build();

        assert!(!acl.is_allowed(ip("10.0.0.5")));
        assert!(acl.is_allowed(ip("10.0.0.6")));
        assert!(acl.is_allowed(ip("10.255.255.255")));
        assert!(!acl.is_allowed(ip("11.0.0.1")));
    }

    #[test]
    fn test_default_policy() {
        let deny_by_default = PeerAcl::builder().build();
        assert!(!deny_by_default.is_allowed(ip("1.2.3.4")));

        let allow_by_default = PeerAcl::builder().default_allow(true).build();
        assert!(allow_by_default.is_allowed(ip("1.2.3.4")));
    }

    #[test]
    fn test_ipv6_subnet() {
        let acl = PeerAcl::builder()
            .allow("2001:db8::/32")
            .unwrap()
            .build();

        assert!(acl.is_allowed(ip("2001:db8::1")));
        assert!(acl.is_allowed(ip("2001:db8:ffff::9")));
        assert!(!acl.is_allowed(ip("2001:db9::1")));
    }

    #[test]
    fn test_ipv4_wildcard() {
        let acl = PeerAcl::builder()
            .allow("192.168.*.*")
            .unwrap()
            .build();

        assert!(acl.is_allowed(ip("192.168.0.1")));
        assert!(acl.is_allowed(ip("192.168.255.254")));
        assert!(!acl.is_allowed(ip("192.169.0.1")));
        // A wildcard never matches a v6 peer.
        assert!(!acl.is_allowed(ip("2001:db8::1")));
    }

    #[test]
    fn test_wildcard_middle_octet() {
        let acl = PeerAcl::builder()
            .allow("10.*.0.1")
            .unwrap()
            .build();

        assert!(acl.is_allowed(ip("10.0.0.1")));
        assert!(acl.is_allowed(ip("10.200.0.1")));
        assert!(!acl.is_allowed(ip("10.0.0.2")));
    }

    #[test]
    fn test_mapped_v6_peer_hits_v4_rules() {
        let acl = PeerAcl::builder()
            .deny("10.0.0.5")
            .unwrap()
            .allow("10.0.0.0/8")
            .unwrap()
            .build();

        assert!(!acl.is_allowed(ip("::ffff:10.0.0.5")));
        assert!(acl.is_allowed(ip("::ffff:10.0.0.6")));
    }

    #[test]
    fn test_invalid_specs() {
        for bad in ["", "10.0.0", "10.0.0.0/33", "300.*.*.*", "1.2.3.*.5", "bogus"] {
            assert!(
                matches!(RulePattern::parse(bad), Err(Error::InvalidAclRule(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_rule_from_str() {
        let rule: AclRule = "deny 10.0.0.0/8".parse().unwrap();
        assert!(!rule.is_allow());
        assert_eq!(rule.to_string(), "deny 10.0.0.0/8");

        let rule: AclRule = "ALLOW 192.168.*.*".parse().unwrap();
        assert!(rule.is_allow());

        assert!("permit 10.0.0.1".parse::<AclRule>().is_err());
        assert!("allow".parse::<AclRule>().is_err());
    }

    #[test]
    fn test_rules_from_config() {
        let rules: Vec<AclRule> =
            serde_json::from_str(r#"["deny 10.0.0.5", "allow 10.0.0.0/8"]"#).unwrap();
        let acl = PeerAcl::builder().rules(rules).build();

        assert!(!acl.is_allowed(ip("10.0.0.5")));
        assert!(acl.is_allowed(ip("10.0.0.6")));
    }
}
