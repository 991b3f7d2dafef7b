//! Provisioning handlers: products, party records and bank accounts.
//!
//! Party records are always created together with a fresh bank account at
//! balance 0.00, so creating a record can never create money.

use chrono::NaiveTime;
use rust_decimal::Decimal;

use crate::{
    context::InvocationContext,
    error::{EngineError, Result},
    operation::Operation,
    records::{AppDevRecord, BankAccount, CreatorRecord, CustomerRecord, Product},
    types::{AccountId, AppDevId, CreatorId, CustomerId, ProductId, parse_decimal, round_cents},
};

/// Opens a zero-balance account with a fresh id.
async fn open_account(ctx: &mut InvocationContext<'_>, in_use: bool) -> Result<AccountId> {
    let id = AccountId::new(ctx.next_id().await?);
    ctx.ledger.put_bank_account(&BankAccount { id, balance: Decimal::ZERO, in_use })?;
    Ok(id)
}

#[tracing::instrument(skip_all, fields(org = ctx.caller.org()))]
pub(crate) async fn add_product(ctx: &mut InvocationContext<'_>, args: &[String]) -> Result<String> {
    let [name] = Operation::AddProduct.expect_args::<1>(args)?;
    let creator_id = CreatorId::new(ctx.caller.require_id()?);
    if name.trim().is_empty() {
        return Err(EngineError::validation("product name cannot be empty"));
    }

    ctx.ledger.get_creator(creator_id).await?;

    let id = ProductId::new(ctx.next_id().await?);
    ctx.ledger.put_product(&Product {
        id,
        creator_id,
        name: name.clone(),
        total_listens: 0,
        unsettled_listens: 0,
        total_metrics: 0,
        unsettled_metrics: 0,
        additional_metrics: 0,
        is_active: true,
    })?;

    tracing::info!(product_id = %id, creator_id = %creator_id, "product created");
    Ok(id.to_string())
}

/// Marks a product inactive. Deleting an inactive product succeeds again.
#[tracing::instrument(skip_all, fields(org = ctx.caller.org()))]
pub(crate) async fn delete_product(
    ctx: &mut InvocationContext<'_>,
    args: &[String],
) -> Result<String> {
    let [product_id] = Operation::DeleteProduct.expect_args::<1>(args)?;
    let product_id: ProductId = product_id.parse()?;
    let creator_id = CreatorId::new(ctx.caller.require_id()?);

    let creator = ctx.ledger.get_creator(creator_id).await?;
    let mut product = ctx.ledger.get_product(product_id).await?;
    if product.creator_id != creator.id {
        return Err(EngineError::AccessDenied(format!(
            "creator {creator_id} does not own product {product_id}"
        )));
    }

    product.is_active = false;
    ctx.ledger.put_product(&product)?;

    tracing::info!(product_id = %product_id, "product deleted");
    Ok("SUCCESS".to_owned())
}

#[tracing::instrument(skip_all, fields(org = ctx.caller.org()))]
pub(crate) async fn add_customer_record(
    ctx: &mut InvocationContext<'_>,
    args: &[String],
) -> Result<String> {
    let [fee] = Operation::AddCustomerRecord.expect_args::<1>(args)?;
    let subscription_fee = round_cents(parse_decimal("subscriptionFee", fee)?);
    if subscription_fee < Decimal::ZERO {
        return Err(EngineError::validation("subscription fee cannot be negative"));
    }
    let app_dev_id = AppDevId::new(ctx.caller.require_id()?);

    ctx.ledger.get_app_dev(app_dev_id).await?;

    let midnight = ctx.now.date_naive().and_time(NaiveTime::default()).and_utc();
    let subscription_due_date = midnight
        .checked_add_signed(ctx.subscription_period()?)
        .ok_or_else(|| EngineError::invariant("subscription due date out of range"))?;

    let bank_account_id = open_account(ctx, true).await?;
    let id = CustomerId::new(ctx.next_id().await?);
    ctx.ledger.put_customer(&CustomerRecord {
        id,
        app_dev_id,
        bank_account_id,
        subscription_fee,
        subscription_due_date,
        queued_song: None,
        previous_song: None,
    })?;

    tracing::info!(customer_id = %id, app_dev_id = %app_dev_id, "customer created");
    Ok(id.to_string())
}

#[tracing::instrument(skip_all, fields(org = ctx.caller.org()))]
pub(crate) async fn add_creator_record(
    ctx: &mut InvocationContext<'_>,
    args: &[String],
) -> Result<String> {
    let [] = Operation::AddCreatorRecord.expect_args::<0>(args)?;

    let bank_account_id = open_account(ctx, true).await?;
    let id = CreatorId::new(ctx.next_id().await?);
    ctx.ledger.put_creator(&CreatorRecord { id, bank_account_id })?;

    tracing::info!(creator_id = %id, bank_account_id = %bank_account_id, "creator created");
    Ok(id.to_string())
}

#[tracing::instrument(skip_all, fields(org = ctx.caller.org()))]
pub(crate) async fn add_app_dev_record(
    ctx: &mut InvocationContext<'_>,
    args: &[String],
) -> Result<String> {
    let [frac] = Operation::AddAppDevRecord.expect_args::<1>(args)?;
    let admin_fee_frac = parse_decimal("adminFeeFrac", frac)?;
    if !(Decimal::ZERO..=Decimal::ONE).contains(&admin_fee_frac) {
        return Err(EngineError::validation(format!(
            "admin fee fraction must be between 0 and 1, got {admin_fee_frac}"
        )));
    }

    let bank_account_id = open_account(ctx, true).await?;
    let id = AppDevId::new(ctx.next_id().await?);
    ctx.ledger.put_app_dev(&AppDevRecord { id, bank_account_id, admin_fee_frac })?;

    tracing::info!(app_dev_id = %id, bank_account_id = %bank_account_id, "app developer created");
    Ok(id.to_string())
}

/// Creates an account not yet bound to any party.
#[tracing::instrument(skip_all, fields(org = ctx.caller.org()))]
pub(crate) async fn create_new_bank_account(
    ctx: &mut InvocationContext<'_>,
    args: &[String],
) -> Result<String> {
    let [] = Operation::CreateNewBankAccount.expect_args::<0>(args)?;

    let id = open_account(ctx, false).await?;

    tracing::info!(bank_account_id = %id, "bank account created");
    Ok(id.to_string())
}
