//! Transaction handlers, one per [`Operation`].
//!
//! Role checks happen before dispatch. Each handler then validates its
//! arguments, reads what it needs, checks every precondition and only then
//! buffers its writes.

mod contracts;
mod provisioning;
mod queries;
mod settlement;

use crate::{context::InvocationContext, error::Result, operation::Operation};

/// Runs the handler for `op`.
pub(crate) async fn dispatch(
    op: Operation,
    ctx: &mut InvocationContext<'_>,
    args: &[String],
) -> Result<String> {
    match op {
        Operation::AddProduct => provisioning::add_product(ctx, args).await,
        Operation::DeleteProduct => provisioning::delete_product(ctx, args).await,
        Operation::AddCustomerRecord => provisioning::add_customer_record(ctx, args).await,
        Operation::AddCreatorRecord => provisioning::add_creator_record(ctx, args).await,
        Operation::AddAppDevRecord => provisioning::add_app_dev_record(ctx, args).await,
        Operation::CreateNewBankAccount => provisioning::create_new_bank_account(ctx, args).await,
        Operation::RenewSubscription => settlement::renew_subscription(ctx, args).await,
        Operation::CollectPayment => settlement::collect_payment(ctx, args).await,
        Operation::TransferFunds => settlement::transfer_funds(ctx, args).await,
        Operation::OfferContract => contracts::offer_contract(ctx, args).await,
        Operation::AcceptContract => contracts::accept_contract(ctx, args).await,
        Operation::RejectContract => contracts::reject_contract(ctx, args).await,
        Operation::RequestSong => contracts::request_song(ctx, args).await,
        Operation::ListBankAccounts => queries::list_bank_accounts(ctx, args).await,
    }
}
