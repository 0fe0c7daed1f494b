// SPDX-License-Identifier: Apache-2.0
//! The Common Name sanity filter (spec.md invariant 3 / §4.D step 5),
//! ported from `original_source/main.go`'s `MatchIPv4`/`MatchIPv6` gate. No
//! counterpart exists in the teacher (`certstream-server-rust` streams every
//! parsed leaf and applies no such identity gate). The original validated
//! the two literal forms with hand-written regexes; `std::net::Ipv4Addr`/
//! `Ipv6Addr` parsing expresses the same check more idiomatically in Rust.
use std::net::{Ipv4Addr, Ipv6Addr};

/// `true` if `cn` is acceptable to persist.
///
/// A CN is only scrutinized at all if it looks like a public-suffix-rooted
/// hostname; anything else (non-hostname strings, bare labels) passes
/// through unfiltered, matching `publicsuffix.EffectiveTLDPlusOne`'s gate in
/// the original source.
#[must_use]
pub fn is_acceptable(cn: &str) -> bool {
    if psl::domain(cn.as_bytes()).is_none() {
        return true;
    }
    is_ipv4_literal(cn) || is_ipv6_literal(cn) || !looks_malformed(cn)
}

fn looks_malformed(cn: &str) -> bool {
    cn.contains(' ') || cn.contains(':') || cn.trim().is_empty()
}

fn is_ipv4_literal(s: &str) -> bool {
    s.parse::<Ipv4Addr>().is_ok()
}

fn is_ipv6_literal(s: &str) -> bool {
    s.parse::<Ipv6Addr>().is_ok()
}
