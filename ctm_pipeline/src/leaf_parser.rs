// SPDX-License-Identifier: Apache-2.0
//! Module D: the Leaf Parser pool (spec.md §4.D).
use crate::types::Metrics;
use ctm_cert::CertRecord;
use ctm_log_list::fetcher::RawEntry;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::warn;

/// Spawns `worker_count` workers sharing `entry_rx`. Parser failures are
/// per-entry and logged; the pool never halts on a bad leaf.
pub fn spawn_pool(
    worker_count: usize,
    metrics: Arc<Metrics>,
    entry_rx: mpsc::Receiver<RawEntry>,
    record_tx: mpsc::Sender<CertRecord>,
) -> Vec<tokio::task::JoinHandle<()>> {
    let entry_rx = Arc::new(Mutex::new(entry_rx));
    (0..worker_count.max(1))
        .map(|id| {
            let metrics = Arc::clone(&metrics);
            let entry_rx = Arc::clone(&entry_rx);
            let record_tx = record_tx.clone();
            tokio::spawn(async move {
                worker_loop(id, &metrics, &entry_rx, &record_tx).await;
            })
        })
        .collect()
}

async fn worker_loop(
    id: usize,
    metrics: &Metrics,
    entry_rx: &Mutex<mpsc::Receiver<RawEntry>>,
    record_tx: &mpsc::Sender<CertRecord>,
) {
    loop {
        let entry = {
            let mut rx = entry_rx.lock().await;
            rx.recv().await
        };
        let Some(entry) = entry else {
            break;
        };
        match ctm_cert::parse_entry(&entry.leaf_input) {
            Ok(Some(record)) => {
                metrics.record_input();
                if record_tx.send(record).await.is_err() {
                    warn!(parser = id, "record channel closed, dropping remaining work");
                    break;
                }
            }
            Ok(None) => {
                // Structurally fine, filtered out (unknown entry type
                // handled below, CN rejected, or no subject CN at all).
            }
            Err(e) => {
                warn!(parser = id, error = %e, "failed to parse leaf");
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn malformed_entry_is_dropped_not_fatal() {
        let metrics = Arc::new(Metrics::new());
        let (entry_tx, entry_rx) = mpsc::channel(4);
        let (record_tx, mut record_rx) = mpsc::channel(4);

        entry_tx
            .send(RawEntry {
                leaf_input: vec![0, 0], // too short to decode
                extra_data: vec![],
            })
            .await
            .unwrap();
        drop(entry_tx);

        let handles = spawn_pool(1, metrics, entry_rx, record_tx);
        for h in handles {
            h.await.unwrap();
        }
        assert!(record_rx.recv().await.is_none());
    }
}
