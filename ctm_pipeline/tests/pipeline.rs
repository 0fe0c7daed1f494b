// SPDX-License-Identifier: Apache-2.0
//! End-to-end exercises of the testable properties in spec.md §8, against
//! an in-process stub CT log (axum) rather than a real one.
use axum::{extract::State, routing::get, Json, Router};
use base64::{engine::general_purpose::STANDARD, Engine};
use ctm_log_list::{fetcher::Fetcher, LogEndpoint};
use ctm_pipeline::Config;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One scripted response to a `get-entries` call.
enum Scripted {
    Error(&'static str),
    Entries(Vec<(String, String)>),
}

struct Stub {
    tree_size: u64,
    script: VecDeque<Scripted>,
    calls: u32,
}

type SharedStub = Arc<Mutex<Stub>>;

async fn get_sth(State(stub): State<SharedStub>) -> Json<Value> {
    let tree_size = stub.lock().unwrap().tree_size;
    Json(json!({
        "tree_size": tree_size,
        "timestamp": 0,
        "sha256_root_hash": "",
        "tree_head_signature": "",
    }))
}

async fn get_entries(State(stub): State<SharedStub>) -> Json<Value> {
    let mut stub = stub.lock().unwrap();
    stub.calls += 1;
    match stub.script.pop_front() {
        Some(Scripted::Error(msg)) => json_error(msg),
        Some(Scripted::Entries(entries)) => json_entries(&entries),
        None => json_entries(&[]),
    }
}

fn json_error(msg: &str) -> Json<Value> {
    Json(json!({ "error_message": msg, "success": false }))
}

fn json_entries(entries: &[(String, String)]) -> Json<Value> {
    Json(json!({
        "entries": entries.iter().map(|(leaf, extra)| {
            json!({ "leaf_input": leaf, "extra_data": extra })
        }).collect::<Vec<_>>()
    }))
}

/// A syntactically valid RFC 6962 Merkle leaf wrapping an X509 entry whose
/// "certificate" bytes are not actually parseable DER. Good enough to
/// exercise coverage/retry/checkpointing without needing real cert bytes;
/// the leaf parser will log-and-drop these (spec.md §7's "X.509 parse
/// (fatal) -> drop" row), which is itself part of what's under test.
fn fake_leaf(tag: u8) -> String {
    let mut v = vec![0u8, 0u8]; // version, leaf type
    v.extend_from_slice(&0u64.to_be_bytes()); // timestamp
    v.extend_from_slice(&0u16.to_be_bytes()); // entry type: X509
    let cert = vec![tag; 4];
    let len = cert.len() as u32;
    v.push((len >> 16) as u8);
    v.push((len >> 8) as u8);
    v.push(len as u8);
    v.extend_from_slice(&cert);
    v.extend_from_slice(&0u16.to_be_bytes()); // empty extensions
    STANDARD.encode(v)
}

async fn spawn_stub(stub: Stub) -> (LogEndpoint, SharedStub) {
    let shared = Arc::new(Mutex::new(stub));
    let app = Router::new()
        .route("/ct/v1/get-sth", get(get_sth))
        .route("/ct/v1/get-entries", get(get_entries))
        .with_state(Arc::clone(&shared));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app.into_make_service()).await.unwrap();
    });

    (LogEndpoint::new(format!("http://{addr}/")), shared)
}

fn test_config() -> Config {
    Config {
        downloader_count: 1,
        batch_size: 1000,
        download_buffer_size: 10,
        parse_buffer_size: 2,
        insert_buffer_size: 100,
        retry_wait: Duration::from_millis(5),
        pacing_interval: Duration::from_millis(5),
        loud_failure_threshold: 10,
        verify_tls: true, // irrelevant for a plain-HTTP stub
    }
}

#[tokio::test]
async fn coverage_and_checkpoint_advance_despite_unparseable_certs() {
    let entries: Vec<_> = (0..5)
        .map(|i| (fake_leaf(i), STANDARD.encode("extra")))
        .collect();
    let (log, stub) = spawn_stub(Stub {
        tree_size: 5,
        script: VecDeque::from([Scripted::Entries(entries)]),
        calls: 0,
    })
    .await;

    let pool = ctm_db::connect_in_memory().await.unwrap();
    let fetcher = Fetcher::new(false);
    ctm_pipeline::run(&pool, fetcher, test_config(), &[log.clone()], None).await;

    assert_eq!(ctm_db::last_index(&pool, log.base_url()).await.unwrap(), 5);
    assert_eq!(stub.lock().unwrap().calls, 1);
}

#[tokio::test]
async fn retries_on_transient_log_error_then_succeeds() {
    let entries: Vec<_> = (0..3)
        .map(|i| (fake_leaf(i), STANDARD.encode("extra")))
        .collect();
    let (log, stub) = spawn_stub(Stub {
        tree_size: 3,
        script: VecDeque::from([
            Scripted::Error("rate limit"),
            Scripted::Error("rate limit"),
            Scripted::Entries(entries),
        ]),
        calls: 0,
    })
    .await;

    let pool = ctm_db::connect_in_memory().await.unwrap();
    let fetcher = Fetcher::new(false);
    ctm_pipeline::run(&pool, fetcher, test_config(), &[log.clone()], None).await;

    assert_eq!(ctm_db::last_index(&pool, log.base_url()).await.unwrap(), 3);
    assert!(stub.lock().unwrap().calls >= 3);
}

#[tokio::test]
async fn partial_return_is_continued_until_covered() {
    let first: Vec<_> = (0..2)
        .map(|i| (fake_leaf(i), STANDARD.encode("extra")))
        .collect();
    let second: Vec<_> = (2..5)
        .map(|i| (fake_leaf(i), STANDARD.encode("extra")))
        .collect();
    let (log, stub) = spawn_stub(Stub {
        tree_size: 5,
        script: VecDeque::from([Scripted::Entries(first), Scripted::Entries(second)]),
        calls: 0,
    })
    .await;

    let pool = ctm_db::connect_in_memory().await.unwrap();
    let fetcher = Fetcher::new(false);
    ctm_pipeline::run(&pool, fetcher, test_config(), &[log.clone()], None).await;

    assert_eq!(ctm_db::last_index(&pool, log.base_url()).await.unwrap(), 5);
    assert_eq!(stub.lock().unwrap().calls, 2);
}

#[tokio::test]
async fn second_run_over_same_range_is_a_no_op() {
    let entries: Vec<_> = (0..4)
        .map(|i| (fake_leaf(i), STANDARD.encode("extra")))
        .collect();
    let (log, _stub) = spawn_stub(Stub {
        tree_size: 4,
        script: VecDeque::from([Scripted::Entries(entries)]),
        calls: 0,
    })
    .await;

    let pool = ctm_db::connect_in_memory().await.unwrap();
    let fetcher = Fetcher::new(false);
    ctm_pipeline::run(&pool, fetcher.clone(), test_config(), &[log.clone()], None).await;
    assert_eq!(ctm_db::last_index(&pool, log.base_url()).await.unwrap(), 4);

    // Second pass: tree_size hasn't grown past last_index, so the head
    // tracker must treat the range as empty and skip the log entirely
    // (spec.md §4.A, checkpoint monotonicity property in §8).
    ctm_pipeline::run(&pool, fetcher, test_config(), &[log.clone()], None).await;
    assert_eq!(ctm_db::last_index(&pool, log.base_url()).await.unwrap(), 4);
}

#[tokio::test]
async fn whole_run_completes_promptly_under_default_timeout() {
    let (log, _stub) = spawn_stub(Stub {
        tree_size: 0,
        script: VecDeque::new(),
        calls: 0,
    })
    .await;

    let pool = ctm_db::connect_in_memory().await.unwrap();
    let fetcher = Fetcher::new(false);
    let result = tokio::time::timeout(
        Duration::from_secs(5),
        ctm_pipeline::run(&pool, fetcher, test_config(), &[log], None),
    )
    .await;
    assert!(result.is_ok(), "pipeline run hung with nothing to fetch");
}
