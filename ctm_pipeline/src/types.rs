// SPDX-License-Identifier: Apache-2.0
use ctm_log_list::LogEndpoint;
use std::sync::atomic::{AtomicU64, Ordering};

/// `(endpoint, oldIndex, newIndex)`. Invariant: `old_index <= new_index`.
/// Closed on the left, open on the right.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRange {
    pub endpoint: LogEndpoint,
    pub old_index: u64,
    pub new_index: u64,
}

impl LogRange {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.new_index <= self.old_index
    }
}

/// A contiguous, half-open sub-range within a `LogRange`:
/// `end - start <= BATCH_SIZE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchDescriptor {
    pub endpoint: LogEndpoint,
    pub start: u64,
    pub end: u64,
}

impl FetchDescriptor {
    #[must_use]
    pub fn width(&self) -> u64 {
        self.end - self.start
    }
}

/// Purely observational counters (spec.md §5). No correctness depends on
/// these; they exist to be logged at shutdown.
#[derive(Debug, Default)]
pub struct Metrics {
    pub input_count: AtomicU64,
    pub output_count: AtomicU64,
}

impl Metrics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_input(&self) {
        self.input_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_output(&self) {
        self.output_count.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn snapshot(&self) -> (u64, u64) {
        (
            self.input_count.load(Ordering::Relaxed),
            self.output_count.load(Ordering::Relaxed),
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn range_emptiness() {
        let r = LogRange {
            endpoint: LogEndpoint::new("https://ct.example.com/"),
            old_index: 5,
            new_index: 5,
        };
        assert!(r.is_empty());
        let r = LogRange { new_index: 6, ..r };
        assert!(!r.is_empty());
    }

    #[test]
    fn metrics_counts() {
        let m = Metrics::new();
        m.record_input();
        m.record_input();
        m.record_output();
        assert_eq!(m.snapshot(), (2, 1));
    }
}
