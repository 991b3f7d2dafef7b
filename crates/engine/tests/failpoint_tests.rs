#![allow(clippy::expect_used, clippy::panic)]
#![cfg(feature = "failpoints")]
//! Integration tests for storage faults injected at commit.
//!
//! These tests require the `failpoints` feature:
//! ```bash
//! cargo test -p beatchain-engine --features failpoints --test failpoint_tests
//! ```

#[macro_use]
mod common;

use beatchain_authn::testutil::{admin, customer};
use beatchain_engine::ErrorKind;
use beatchain_storage::testutil::{keys_of_kind, snapshot};
use common::*;

#[tokio::test]
async fn failed_commit_leaves_renewal_unapplied() {
    let scenario = fail::FailScenario::setup();
    let engine = bootstrapped_engine().await;
    let due = common::customer(&engine, CUSTOMER).await.subscription_due_date;
    let before = snapshot(engine.backend()).await.expect("snapshot");

    fail::cfg("memory-before-commit", "return").expect("failed to configure fail point");

    let result = call(&engine, customer(CUSTOMER), "RenewSubscription", &[]).await;
    assert_engine_err!(result, ErrorKind::Storage, "injected failure");

    assert_eq!(balance(&engine, CUSTOMER).await, dec("1000"));
    assert_eq!(balance(&engine, APP_DEV).await, dec("1000"));
    assert_eq!(balance(&engine, ADMIN_ACCOUNT).await, dec("1000"));
    assert_eq!(common::customer(&engine, CUSTOMER).await.subscription_due_date, due);
    assert_eq!(snapshot(engine.backend()).await.expect("snapshot"), before);

    scenario.teardown();
}

#[tokio::test]
async fn failed_commit_does_not_consume_ids() {
    let scenario = fail::FailScenario::setup();
    let engine = bootstrapped_engine().await;

    fail::cfg("memory-before-commit", "1*return").expect("failed to configure fail point");

    let accounts = keys_of_kind(engine.backend(), "BankAccount").await.expect("listing");

    let result = call(&engine, admin(), "CreateNewBankAccount", &[]).await;
    assert_engine_err!(result, ErrorKind::Storage);
    assert_eq!(keys_of_kind(engine.backend(), "BankAccount").await.expect("listing"), accounts);

    let id = assert_engine_ok!(call(&engine, admin(), "CreateNewBankAccount", &[]).await);
    assert_eq!(id, "100000001");

    scenario.teardown();
}
