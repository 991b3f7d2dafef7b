//! Transaction edge case tests for `MemoryBackend`.
//!
//! Exercises read-your-writes, read-set validation for point reads and
//! scanned ranges, and the all-or-nothing guarantee on conflict or drop.

#![allow(clippy::expect_used, clippy::panic)]

use beatchain_storage::{CompositeKey, MemoryBackend, StorageBackend, StorageError};
use bytes::Bytes;

fn account(id: &str) -> Vec<u8> {
    CompositeKey::new("BankAccount").with(id).encode()
}

// ============================================================================
// Read-your-writes
// ============================================================================

#[tokio::test]
async fn overwrite_then_read_returns_latest_pending_value() {
    let backend = MemoryBackend::new();
    let mut txn = backend.transaction().await.expect("txn");

    txn.set(account("1"), b"10".to_vec());
    txn.set(account("1"), b"20".to_vec());
    assert_eq!(txn.get(&account("1")).await.expect("get"), Some(Bytes::from("20")));

    txn.delete(account("1"));
    assert_eq!(txn.get(&account("1")).await.expect("get"), None);

    txn.set(account("1"), b"30".to_vec());
    txn.commit().await.expect("commit");
    assert_eq!(backend.get(&account("1")).await.expect("get"), Some(Bytes::from("30")));
}

#[tokio::test]
async fn reading_own_write_does_not_join_read_set() {
    let backend = MemoryBackend::new();
    let mut txn = backend.transaction().await.expect("txn");

    txn.set(account("1"), b"mine".to_vec());
    txn.get(&account("1")).await.expect("get");

    backend.set(account("1"), b"theirs".to_vec()).await.expect("set");

    txn.commit().await.expect("blind overwrite commits");
    assert_eq!(backend.get(&account("1")).await.expect("get"), Some(Bytes::from("mine")));
}

// ============================================================================
// Conflicts
// ============================================================================

#[tokio::test]
async fn conflict_applies_nothing() {
    let backend = MemoryBackend::new();
    backend.set(account("1"), b"100".to_vec()).await.expect("set");

    let mut txn = backend.transaction().await.expect("txn");
    txn.get(&account("1")).await.expect("get");
    txn.set(account("1"), b"90".to_vec());
    txn.set(account("2"), b"10".to_vec());

    backend.set(account("1"), b"50".to_vec()).await.expect("concurrent write");

    let result = txn.commit().await;
    assert!(matches!(result, Err(StorageError::Conflict)), "got {result:?}");
    assert_eq!(backend.get(&account("1")).await.expect("get"), Some(Bytes::from("50")));
    assert_eq!(backend.get(&account("2")).await.expect("get"), None);
}

#[tokio::test]
async fn concurrent_delete_of_read_key_conflicts() {
    let backend = MemoryBackend::new();
    backend.set(account("1"), b"100".to_vec()).await.expect("set");

    let mut txn = backend.transaction().await.expect("txn");
    txn.get(&account("1")).await.expect("get");
    txn.set(account("2"), b"copy".to_vec());

    backend.delete(&account("1")).await.expect("delete");

    assert!(matches!(txn.commit().await, Err(StorageError::Conflict)));
}

#[tokio::test]
async fn commit_before_read_is_still_detected() {
    let backend = MemoryBackend::new();
    backend.set(account("1"), b"100".to_vec()).await.expect("set");

    let mut txn = backend.transaction().await.expect("txn");
    backend.set(account("1"), b"75".to_vec()).await.expect("concurrent write");

    // The read observes 75, but the transaction began before that commit.
    assert_eq!(txn.get(&account("1")).await.expect("get"), Some(Bytes::from("75")));
    txn.set(account("1"), b"70".to_vec());

    assert!(matches!(txn.commit().await, Err(StorageError::Conflict)));
}

#[tokio::test]
async fn phantom_in_scanned_prefix_conflicts() {
    let backend = MemoryBackend::new();
    backend.set(account("1"), b"1".to_vec()).await.expect("set");

    let mut txn = backend.transaction().await.expect("txn");
    let (start, end) = CompositeKey::new("BankAccount").prefix_range();
    let listed = txn.get_range(start, end).await.expect("scan");
    assert_eq!(listed.len(), 1);
    txn.set(b"report".to_vec(), b"1 account".to_vec());

    backend.set(account("2"), b"2".to_vec()).await.expect("phantom insert");

    assert!(matches!(txn.commit().await, Err(StorageError::Conflict)));
    assert_eq!(backend.get(b"report").await.expect("get"), None);
}

#[tokio::test]
async fn read_only_transaction_commit_is_validated_too() {
    let backend = MemoryBackend::new();
    backend.set(account("1"), b"1".to_vec()).await.expect("set");

    let mut txn = backend.transaction().await.expect("txn");
    txn.get(&account("1")).await.expect("get");
    backend.set(account("1"), b"2".to_vec()).await.expect("set");

    assert!(matches!(txn.commit().await, Err(StorageError::Conflict)));
}

// ============================================================================
// Drop and sequencing
// ============================================================================

#[tokio::test]
async fn dropping_transaction_discards_writes() {
    let backend = MemoryBackend::new();

    let mut txn = backend.transaction().await.expect("txn");
    txn.set(account("1"), b"100".to_vec());
    drop(txn);

    assert_eq!(backend.get(&account("1")).await.expect("get"), None);
}

#[tokio::test]
async fn each_commit_advances_sequence_once() {
    let backend = MemoryBackend::new();

    let mut txn = backend.transaction().await.expect("txn");
    txn.set(account("1"), b"1".to_vec());
    txn.set(account("2"), b"2".to_vec());
    txn.set(account("3"), b"3".to_vec());
    txn.commit().await.expect("commit");

    assert_eq!(backend.commit_sequence(), 1);
}
