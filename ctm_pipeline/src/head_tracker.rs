// SPDX-License-Identifier: Apache-2.0
//! Module A: the Log Head Tracker (spec.md §4.A).
use crate::types::LogRange;
use ctm_db::Pool;
use ctm_log_list::{fetcher::Fetcher, LogEndpoint};
use std::collections::HashMap;
use tracing::warn;

/// Computes `(oldIndex, newIndex)` for every configured endpoint (or just
/// `only`, if given). A per-endpoint STH fetch failure is logged and drops
/// that endpoint from the run; it never aborts the others (spec.md §4.A —
/// the reference Go program calls `log.Fatal` here, which §9 flags as a
/// hardening point this implementation corrects).
pub async fn discover_ranges(
    fetcher: &Fetcher,
    pool: &Pool,
    logs: &[LogEndpoint],
    only: Option<&LogEndpoint>,
) -> HashMap<LogEndpoint, LogRange> {
    // Built up front regardless of the `only` branch so there's no window
    // where the map is read before it exists (spec.md §9's "latent
    // dereference-before-allocation" note on the reference's `--logurl`
    // handling).
    let mut ranges = HashMap::new();

    let candidates: Vec<LogEndpoint> = match only {
        Some(one) => vec![one.clone()],
        None => logs.to_vec(),
    };

    for endpoint in candidates {
        let old_index = match ctm_db::last_index(pool, endpoint.base_url()).await {
            Ok(idx) => idx,
            Err(e) => {
                warn!(log = %endpoint, error = %e, "failed to read last_index, skipping");
                continue;
            }
        };
        let sth = match fetcher.fetch_sth(&endpoint).await {
            Ok(sth) => sth,
            Err(e) => {
                warn!(log = %endpoint, error = %e, "failed to fetch STH, skipping");
                continue;
            }
        };
        let range = LogRange {
            endpoint: endpoint.clone(),
            old_index,
            new_index: sth.tree_size,
        };
        if range.is_empty() {
            continue;
        }
        ranges.insert(endpoint, range);
    }

    ranges
}
