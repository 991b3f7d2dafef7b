//! Concurrent access stress tests for `MemoryBackend`.
//!
//! Many tasks run read-modify-write transactions against a shared counter,
//! resubmitting on conflict the way an invoking client would. Every
//! committed value must be unique and the final counter must account for
//! every successful commit.

#![allow(clippy::expect_used, clippy::panic)]

use std::collections::HashSet;

use beatchain_storage::{CompositeKey, MemoryBackend, StorageBackend};
use tokio::task::JoinSet;

/// Number of concurrent tasks.
const CONCURRENCY: usize = 16;

/// Number of successful increments each task performs.
const OPS_PER_TASK: usize = 25;

fn counter_key() -> Vec<u8> {
    CompositeKey::new("UniqueId").encode()
}

/// Reads, increments and writes the counter in one transaction, retrying on
/// conflict. Returns the value this task committed.
async fn increment(backend: &MemoryBackend) -> u64 {
    loop {
        let mut txn = backend.transaction().await.expect("txn");
        let current = match txn.get(&counter_key()).await.expect("get") {
            Some(bytes) => std::str::from_utf8(&bytes)
                .expect("utf-8")
                .parse::<u64>()
                .expect("numeric counter"),
            None => 0,
        };
        let next = current + 1;
        txn.set(counter_key(), next.to_string().into_bytes());
        match txn.commit().await {
            Ok(()) => return next,
            Err(e) if e.is_conflict() => {
                tokio::task::yield_now().await;
            },
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_counter_increments_issue_unique_values() {
    let backend = MemoryBackend::new();

    let mut set = JoinSet::new();
    for _ in 0..CONCURRENCY {
        let backend = backend.clone();
        set.spawn(async move {
            let mut issued = Vec::with_capacity(OPS_PER_TASK);
            for _ in 0..OPS_PER_TASK {
                issued.push(increment(&backend).await);
            }
            issued
        });
    }

    let mut all = HashSet::new();
    while let Some(result) = set.join_next().await {
        let issued = result.expect("task should not panic");
        assert!(issued.windows(2).all(|w| w[0] < w[1]), "per-task values must increase");
        for value in issued {
            assert!(all.insert(value), "value {value} committed twice");
        }
    }

    let total = (CONCURRENCY * OPS_PER_TASK) as u64;
    assert_eq!(all.len() as u64, total);
    let stored = backend.get(&counter_key()).await.expect("get").expect("counter exists");
    assert_eq!(stored.as_ref(), total.to_string().as_bytes());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn parallel_disjoint_transactions_all_commit() {
    let backend = MemoryBackend::new();

    let mut set = JoinSet::new();
    for task_id in 0..CONCURRENCY {
        let backend = backend.clone();
        set.spawn(async move {
            let key = CompositeKey::new("BankAccount").with(task_id.to_string()).encode();
            let mut txn = backend.transaction().await.expect("txn");
            assert!(txn.get(&key).await.expect("get").is_none());
            txn.set(key, b"0.00".to_vec());
            txn.commit().await
        });
    }

    while let Some(result) = set.join_next().await {
        result.expect("task should not panic").expect("disjoint commits never conflict");
    }

    let (start, end) = CompositeKey::new("BankAccount").prefix_range();
    assert_eq!(backend.get_range((start, end)).await.expect("scan").len(), CONCURRENCY);
}
