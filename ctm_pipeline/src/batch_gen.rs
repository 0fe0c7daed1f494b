// SPDX-License-Identifier: Apache-2.0
//! Module B: the Batch Generator (spec.md §4.B).
use crate::types::{FetchDescriptor, LogRange};
use tokio::sync::mpsc;
use tracing::trace;

/// Splits `range` into ascending, non-overlapping descriptors of width at
/// most `batch_size` and sends them, blocking on a full channel
/// (backpressure). Does not retry — failures are a downstream concern.
pub async fn generate(
    range: LogRange,
    batch_size: u64,
    tx: mpsc::Sender<FetchDescriptor>,
) {
    let mut start = range.old_index;
    while start < range.new_index {
        let end = (start + batch_size).min(range.new_index);
        trace!(log = %range.endpoint, start, end, "generated descriptor");
        let descriptor = FetchDescriptor {
            endpoint: range.endpoint.clone(),
            start,
            end,
        };
        if tx.send(descriptor).await.is_err() {
            // Descriptor channel closed early (shutdown coordinator bug or
            // a receiver panic). Nothing more we can do.
            break;
        }
        start = end;
    }
}
