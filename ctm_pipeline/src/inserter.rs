// SPDX-License-Identifier: Apache-2.0
//! Module E: the Deduping Inserter (spec.md §4.E). Exactly one instance so
//! the store sees a serial write stream.
use crate::types::Metrics;
use ctm_cert::CertRecord;
use ctm_db::Pool;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::error;

pub async fn run(pool: &Pool, metrics: Arc<Metrics>, mut record_rx: mpsc::Receiver<CertRecord>) {
    while let Some(record) = record_rx.recv().await {
        match ctm_db::insert_cert_ignore(pool, &record).await {
            Ok(_) => metrics.record_output(),
            Err(e) => error!(
                cn = %record.common_name,
                dn = %record.distinguished_name,
                serial = %record.serial_number,
                error = %e,
                "failed saving cert"
            ),
        }
    }
}
