// SPDX-License-Identifier: Apache-2.0
//! Tunable knobs for the pipeline. Defaults match spec.md §5/§9; `BATCH_SIZE`
//! is deliberately a per-run policy value rather than a constant (§9
//! REDESIGN FLAGS), since most logs tolerate far more than the reference's
//! hardcoded 10.

#[derive(Debug, Clone)]
pub struct Config {
    /// Long-lived range fetcher workers sharing the descriptor channel.
    pub downloader_count: usize,
    /// Width, in entries, of a single `get-entries` request.
    pub batch_size: u64,
    /// Descriptor channel capacity.
    pub download_buffer_size: usize,
    /// Raw entry channel capacity. Deliberately small: parsing is fast and
    /// buffering here doesn't help (spec.md §5).
    pub parse_buffer_size: usize,
    /// Record channel capacity. Large: absorbs database write latency.
    pub insert_buffer_size: usize,
    /// Linear backoff unit: the k-th retry sleeps `retry_wait * k`.
    pub retry_wait: std::time::Duration,
    /// Sleep between successive requests for the same descriptor.
    pub pacing_interval: std::time::Duration,
    /// Number of consecutive failures before logging loudly (retries are
    /// never abandoned, per spec.md §4.C / §9).
    pub loud_failure_threshold: u32,
    /// TLS verification for outbound fetch traffic. `false` by default
    /// (spec.md §4.C): CT log operators are frequently misconfigured.
    pub verify_tls: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            downloader_count: 20,
            batch_size: 10,
            download_buffer_size: 50,
            parse_buffer_size: 2,
            insert_buffer_size: 10_000,
            retry_wait: std::time::Duration::from_secs(1),
            pacing_interval: std::time::Duration::from_secs(1),
            loud_failure_threshold: 10,
            verify_tls: false,
        }
    }
}
