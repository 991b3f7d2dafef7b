//! Role enforcement at the invocation boundary.
//!
//! Every denial must happen before any ledger write, so each case also checks
//! that the commit sequence did not move.

#![allow(clippy::expect_used, clippy::panic)]

#[macro_use]
mod common;

use beatchain_authn::{
    CallerIdentity, Role,
    testutil::{admin, app_dev, creator, cross_paired, customer, identity_for},
};
use beatchain_engine::{ErrorKind, Operation};
use common::*;
use rstest::rstest;

#[rstest]
#[case::customer_transfers(customer(CUSTOMER), "TransferFunds", &["2222", "10"])]
#[case::creator_lists_accounts(creator(CREATOR), "ListBankAccounts", &[])]
#[case::app_dev_accepts(app_dev(APP_DEV), "AcceptContract", &["3333", "4444", "1111"])]
#[case::customer_offers(customer(CUSTOMER), "OfferContract", &["1111", "3333", "4444", "0.1"])]
#[case::admin_adds_product(admin(), "AddProduct", &["Anthem"])]
#[case::admin_collects(admin(), "CollectPayment", &[])]
#[case::creator_renews(creator(CREATOR), "RenewSubscription", &[])]
#[case::app_dev_streams(app_dev(APP_DEV), "RequestSong", &["2222", "1111", "4444"])]
#[case::creator_adds_customer(creator(CREATOR), "AddCustomerRecord", &["1.00"])]
#[case::app_dev_creates_account(app_dev(APP_DEV), "CreateNewBankAccount", &[])]
#[tokio::test]
async fn callers_outside_the_role_are_denied(
    #[case] identity: CallerIdentity,
    #[case] function: &str,
    #[case] args: &[&str],
) {
    let engine = bootstrapped_engine().await;
    let sequence = engine.backend().commit_sequence();

    let result = call(&engine, identity, function, args).await;
    assert_engine_err!(result, ErrorKind::AccessDenied, "requires");
    assert_eq!(engine.backend().commit_sequence(), sequence);
}

#[tokio::test]
async fn mismatched_registration_holds_no_role() {
    let engine = bootstrapped_engine().await;

    for op in Operation::ALL {
        let identity = cross_paired(Role::Admin, Role::Creator);
        let result = call(&engine, identity, op.name(), &[]).await;
        assert_engine_err!(result, ErrorKind::AccessDenied);
    }
}

#[tokio::test]
async fn party_operations_require_an_id_claim() {
    let engine = bootstrapped_engine().await;

    let identity = identity_for(Role::Creator, None);
    let result = call(&engine, identity, "AddProduct", &["Anthem"]).await;
    assert_engine_err!(result, ErrorKind::Authentication, "id");
}

#[tokio::test]
async fn malformed_id_claim_is_rejected() {
    let engine = bootstrapped_engine().await;
    let identity = identity_for(Role::Customer, None).with_attribute("id", "twenty-two");

    let result = call(&engine, identity, "RenewSubscription", &[]).await;
    assert_engine_err!(result, ErrorKind::Authentication, "not numeric");
}

#[tokio::test]
async fn creators_cannot_delete_other_creators_products() {
    let engine = bootstrapped_engine().await;
    let other = assert_engine_ok!(call(&engine, admin(), "AddCreatorRecord", &[]).await);
    let other: u64 = other.parse().expect("numeric id");
    let sequence = engine.backend().commit_sequence();

    let result = call(&engine, creator(other), "DeleteProduct", &["4444"]).await;
    assert_engine_err!(result, ErrorKind::AccessDenied, "does not own");

    assert!(product(&engine, PRODUCT).await.is_active);
    assert_eq!(engine.backend().commit_sequence(), sequence);
}

#[rstest]
#[case::admin(admin())]
#[case::creator(creator(CREATOR))]
#[tokio::test]
async fn admin_and_creator_may_finalize_contracts(#[case] identity: CallerIdentity) {
    let engine = bootstrapped_engine().await;
    let product =
        assert_engine_ok!(call(&engine, creator(CREATOR), "AddProduct", &["B-side"]).await);
    let offer = ["1111", "3333", product.as_str(), "0.01"];
    assert_engine_ok!(call(&engine, app_dev(APP_DEV), "OfferContract", &offer).await);

    let key = ["3333", product.as_str(), "1111"];
    let result = call(&engine, identity, "RejectContract", &key).await;
    assert_eq!(assert_engine_ok!(result), "REJECTED");
}

#[tokio::test]
async fn wrong_argument_count_is_a_validation_error() {
    let engine = bootstrapped_engine().await;

    let result = call(&engine, admin(), "TransferFunds", &["1"]).await;
    assert_engine_err!(result, ErrorKind::Validation, "expecting 2, found 1");
}

#[tokio::test]
async fn function_names_match_exactly() {
    let engine = bootstrapped_engine().await;

    for name in ["transferfunds", "TransferFunds ", "Transfer"] {
        let result = call(&engine, admin(), name, &["1", "10"]).await;
        assert_engine_err!(result, ErrorKind::Validation, "invalid function name");
    }
}
