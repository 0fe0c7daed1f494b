// SPDX-License-Identifier: Apache-2.0
//! Log identity and the built-in log list. `LogEndpoint` plays the role of
//! `ct/log_list.rs::CtLog` (URL identity plus the wire shape of a log
//! entry), narrowed to what the pipeline actually consumes: spec.md's
//! "Configured log list" (§6) is a fixed build-time set, not `CtLog`'s
//! `fetch_log_list()` network discovery against Google's all-logs JSON plus
//! user-configured `CustomCtLog` merge — there is no runtime config loader
//! here at all, per spec.
use serde::{Deserialize, Serialize};

pub mod fetcher;

/// Base URL of a CT log. Identity key across the system.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LogEndpoint(pub String);

impl LogEndpoint {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self(base_url)
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn get_sth_url(&self) -> String {
        format!("{}ct/v1/get-sth", self.0)
    }

    /// `end` is inclusive, matching the CT `get-entries` wire format.
    #[must_use]
    pub fn get_entries_url(&self, start: u64, end: u64) -> String {
        format!("{}ct/v1/get-entries?start={}&end={}", self.0, start, end)
    }
}

impl std::fmt::Display for LogEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A log's Signed Tree Head. Only `tree_size` is consumed by the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sth {
    pub tree_size: u64,
    pub timestamp: u64,
    pub sha256_root_hash: String,
    pub tree_head_signature: String,
}

/// Built-in list of CT log base URLs. Entries are commented in/out at build
/// time; there is no runtime config loader in the core (spec.md §6).
pub fn configured_logs() -> Vec<LogEndpoint> {
    [
        "https://ct.googleapis.com/logs/argon2021/",
        "https://ct.googleapis.com/logs/xenon2022/",
        "https://ct.googleapis.com/logs/xenon2023/",
        "https://oak.ct.letsencrypt.org/2022/",
        "https://oak.ct.letsencrypt.org/2023/",
        // "https://ct.googleapis.com/aviator/",
        // "https://ct.googleapis.com/icarus/",
        // "https://ct.googleapis.com/pilot/",
        // "https://ct.googleapis.com/rocketeer/",
        // "https://ct.googleapis.com/skydiver/",
        // "https://ct.cloudflare.com/logs/nimbus2022/",
        // "https://ct.cloudflare.com/logs/nimbus2023/",
        // "https://ct1.digicert-ct.com/log/",
        // "https://yeti2023.ct.digicert.com/log/",
        // "https://nessie2023.ct.digicert.com/log/",
    ]
    .into_iter()
    .map(LogEndpoint::new)
    .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn normalizes_trailing_slash() {
        assert_eq!(
            LogEndpoint::new("https://ct.example.com/logs/foo").base_url(),
            "https://ct.example.com/logs/foo/"
        );
        assert_eq!(
            LogEndpoint::new("https://ct.example.com/logs/foo/").base_url(),
            "https://ct.example.com/logs/foo/"
        );
    }

    #[test]
    fn builds_urls() {
        let log = LogEndpoint::new("https://ct.example.com/logs/foo/");
        assert_eq!(log.get_sth_url(), "https://ct.example.com/logs/foo/ct/v1/get-sth");
        assert_eq!(
            log.get_entries_url(10, 19),
            "https://ct.example.com/logs/foo/ct/v1/get-entries?start=10&end=19"
        );
    }

    #[test]
    fn configured_logs_nonempty_and_unique() {
        let logs = configured_logs();
        assert!(!logs.is_empty());
        let mut seen = std::collections::HashSet::new();
        for log in &logs {
            assert!(seen.insert(log.clone()), "duplicate log endpoint: {}", log);
        }
    }
}
