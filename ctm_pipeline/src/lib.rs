// SPDX-License-Identifier: Apache-2.0
//! The concurrent ingestion pipeline: per-log range computation, parallel
//! bounded-rate fetching with retry, Merkle-leaf decoding, deduping
//! persistence, and the shutdown coordination that ties the stages
//! together. See SPEC_FULL.md for the full module breakdown.
pub mod batch_gen;
pub mod config;
pub mod head_tracker;
pub mod inserter;
pub mod leaf_parser;
pub mod range_fetcher;
pub mod types;

pub use config::Config;
pub use types::{FetchDescriptor, LogRange, Metrics};

use ctm_db::Pool;
use ctm_log_list::{fetcher::Fetcher, LogEndpoint};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info};

/// Module F: runs one full ingestion pass over `logs` (or just `only`, if
/// given) and returns the observational counters (spec.md §5).
///
/// Shutdown proceeds in the mandatory order from spec.md §4.F: generators
/// drain and drop their descriptor-channel senders, which closes the
/// channel once all of them finish; fetchers then drain and drop their
/// entry-channel senders; parsers then drain and drop their record-channel
/// sender; the inserter drains last. In this codebase "close the channel"
/// is expressed the idiomatic Rust way — dropping every `Sender` — rather
/// than an explicit `close()` call.
pub async fn run(
    pool: &Pool,
    fetcher: Fetcher,
    config: Config,
    logs: &[LogEndpoint],
    only: Option<&LogEndpoint>,
) -> Arc<Metrics> {
    let metrics = Arc::new(Metrics::new());
    let config = Arc::new(config);

    let ranges = head_tracker::discover_ranges(&fetcher, pool, logs, only).await;
    let total: u64 = ranges
        .values()
        .map(|r| r.new_index - r.old_index)
        .sum();
    info!(logs = ranges.len(), entries = total, "starting ingestion pass");

    let (descriptor_tx, descriptor_rx) = mpsc::channel::<types::FetchDescriptor>(config.download_buffer_size);
    let (entry_tx, entry_rx) = mpsc::channel(config.parse_buffer_size);
    let (record_tx, record_rx) = mpsc::channel(config.insert_buffer_size);

    // Module B: one Batch Generator task per log with new entries.
    let mut generator_handles = Vec::new();
    for range in ranges.values().cloned() {
        let tx = descriptor_tx.clone();
        let batch_size = config.batch_size;
        generator_handles.push(tokio::spawn(async move {
            batch_gen::generate(range, batch_size, tx).await;
        }));
    }
    drop(descriptor_tx);

    // Module C: the range fetcher pool.
    let fetcher_handles = range_fetcher::spawn_pool(
        Arc::clone(&config),
        fetcher,
        descriptor_rx,
        entry_tx,
    );

    // Module D: the leaf parser pool, sized to available parallelism.
    let parser_count = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    let parser_handles = leaf_parser::spawn_pool(
        parser_count,
        Arc::clone(&metrics),
        entry_rx,
        record_tx,
    );

    // Module E: the single Deduping Inserter, running inline on this task
    // so it naturally drains only once the record channel is fully closed.
    let inserter_fut = inserter::run(pool, Arc::clone(&metrics), record_rx);

    for handle in generator_handles {
        let _ = handle.await;
    }
    info!("batch generators finished");
    for handle in fetcher_handles {
        let _ = handle.await;
    }
    info!("range fetchers finished");
    for handle in parser_handles {
        let _ = handle.await;
    }
    info!("leaf parsers finished");
    inserter_fut.await;
    info!("inserter finished");

    // End-of-run checkpoint pass (spec.md §5): advance every ingested log's
    // last_index to the tree_size observed at scan start.
    for range in ranges.values() {
        if let Err(e) =
            ctm_db::set_last_index(pool, range.endpoint.base_url(), range.new_index).await
        {
            error!(log = %range.endpoint, error = %e, "failed to checkpoint");
        }
    }

    let (input, output) = metrics.snapshot();
    info!("finished: {input} certs extracted, {output} rows inserted");

    metrics
}
