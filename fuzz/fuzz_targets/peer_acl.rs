//! Fuzz target for peer ACL rules.
//!
//! Tests rule parsing with arbitrary spec text and checks that matching
//! treats a mapped IPv4 peer like the IPv4 address it carries.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use gusset::{AclRule, PeerAcl};

/// Arbitrary ACL scenario for fuzzing.
#[derive(Debug, Arbitrary)]
struct FuzzAcl {
    /// Raw rule lines
    rules: Vec<String>,
    /// Peers to test, as raw address bytes
    v4_peers: Vec<[u8; 4]>,
    v6_peers: Vec<[u8; 16]>,
    default_allow: bool,
}

fuzz_target!(|data: FuzzAcl| {
    // Parse rules; malformed lines must fail cleanly
    let mut builder = PeerAcl::builder().default_allow(data.default_allow);
    for line in data.rules.iter().take(64) {
        if line.len() > 1_000 {
            continue;
        }
        if let Ok(rule) = line.parse::<AclRule>() {
            builder = builder.rule(rule);
        }
    }
    let acl = builder.build();

    // Matching must not panic for any peer
    for octets in data.v4_peers.iter().take(64) {
        let v4 = Ipv4Addr::from(*octets);
        let direct = acl.is_allowed(IpAddr::V4(v4));

        // The same peer arriving through a dual-stack socket
        let mapped = IpAddr::V6(v4.to_ipv6_mapped());
        assert_eq!(acl.is_allowed(mapped), direct);
    }
    for octets in data.v6_peers.iter().take(64) {
        let _ = acl.is_allowed(IpAddr::V6(Ipv6Addr::from(*octets)));
    }
});
