// SPDX-License-Identifier: Apache-2.0
//! The SQLite persistent store: `CTLog`/`Downloaded` schema, last-index
//! bookkeeping, insert-or-ignore. No crate in `certstream-server-rust`
//! persists anything (it's a pure broadcast/fan-out server); `sqlx` is
//! pulled from the wider example pack instead — it's the only SQL crate
//! with real precedent anywhere in the retrieved pack, in
//! `redbullberat-zksync-era`'s DAL layer — and its async SQLite driver fits
//! a `tokio`-native pipeline better than a blocking connection that would
//! need `spawn_blocking` at every call site.
use ctm_cert::CertRecord;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

/// Re-exported so callers don't need a direct `sqlx` dependency just to name
/// the pool type.
pub type Pool = SqlitePool;

/// Opens (creating if necessary) the SQLite store and applies the schema.
pub async fn connect(db_path: &Path) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))?
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new().connect_with(options).await?;
    debug!(path = %db_path.display(), "opened sqlite store");
    sqlx::raw_sql(include_str!("init_db.sql"))
        .execute(&pool)
        .await?;
    Ok(pool)
}

/// An in-memory store for tests. A single pooled connection is kept alive
/// for the pool's lifetime, since SQLite's `:memory:` database is private to
/// the connection that created it — a second pooled connection would see an
/// empty, unmigrated database.
pub async fn connect_in_memory() -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;
    sqlx::raw_sql(include_str!("init_db.sql"))
        .execute(&pool)
        .await?;
    Ok(pool)
}

/// `last_index` for a log, treating a missing row as `0` (spec.md §4.A).
pub async fn last_index(pool: &SqlitePool, url: &str) -> Result<u64, sqlx::Error> {
    let row = sqlx::query("SELECT lastIndex FROM CTLog WHERE url = ?")
        .bind(url)
        .fetch_optional(pool)
        .await?;
    Ok(row.map_or(0, |r| r.get::<i64, _>(0).max(0) as u64))
}

/// Advances (or creates) a log's checkpoint. Per spec.md §5, callers must
/// never pass a value lower than what's already stored.
pub async fn set_last_index(pool: &SqlitePool, url: &str, index: u64) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO CTLog (url, lastIndex) VALUES (?1, ?2)
         ON CONFLICT(url) DO UPDATE SET lastIndex = excluded.lastIndex
         WHERE excluded.lastIndex > CTLog.lastIndex",
    )
    .bind(url)
    .bind(index as i64)
    .execute(pool)
    .await?;
    Ok(())
}

/// Inserts a certificate record, ignoring duplicates on the
/// `(CN, DN, SerialNumber)` primary key. Returns `true` if a new row was
/// actually written.
pub async fn insert_cert_ignore(
    pool: &SqlitePool,
    record: &CertRecord,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT OR IGNORE INTO Downloaded (CN, DN, SerialNumber) VALUES (?1, ?2, ?3)",
    )
    .bind(&record.common_name)
    .bind(&record.distinguished_name)
    .bind(&record.serial_number)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod test {
    use super::*;

    fn rec(cn: &str) -> CertRecord {
        CertRecord {
            common_name: cn.to_string(),
            distinguished_name: format!("CN={cn}"),
            serial_number: "1".to_string(),
        }
    }

    #[tokio::test]
    async fn missing_log_has_zero_last_index() {
        let pool = connect_in_memory().await.unwrap();
        assert_eq!(last_index(&pool, "https://ct.example.com/").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn last_index_roundtrip() {
        let pool = connect_in_memory().await.unwrap();
        set_last_index(&pool, "https://ct.example.com/", 42).await.unwrap();
        assert_eq!(last_index(&pool, "https://ct.example.com/").await.unwrap(), 42);
    }

    #[tokio::test]
    async fn last_index_never_regresses() {
        let pool = connect_in_memory().await.unwrap();
        set_last_index(&pool, "https://ct.example.com/", 42).await.unwrap();
        set_last_index(&pool, "https://ct.example.com/", 10).await.unwrap();
        assert_eq!(last_index(&pool, "https://ct.example.com/").await.unwrap(), 42);
    }

    #[tokio::test]
    async fn duplicate_insert_is_ignored() {
        let pool = connect_in_memory().await.unwrap();
        assert!(insert_cert_ignore(&pool, &rec("a.example")).await.unwrap());
        assert!(!insert_cert_ignore(&pool, &rec("a.example")).await.unwrap());
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM Downloaded")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }
}
