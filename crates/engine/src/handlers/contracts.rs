//! Contract lifecycle and streaming handlers.

use rust_decimal::Decimal;

use crate::{
    context::InvocationContext,
    error::{EngineError, Result},
    operation::Operation,
    records::{Contract, ContractStatus},
    types::{AppDevId, CreatorId, CustomerId, ProductId, parse_decimal},
};

/// Creates a contract in `REQUESTED` for an existing app developer, creator
/// and product owned by that creator.
#[tracing::instrument(skip_all, fields(org = ctx.caller.org()))]
pub(crate) async fn offer_contract(
    ctx: &mut InvocationContext<'_>,
    args: &[String],
) -> Result<String> {
    let [app_dev_id, creator_id, product_id, rate] =
        Operation::OfferContract.expect_args::<4>(args)?;
    let app_dev_id: AppDevId = app_dev_id.parse()?;
    let creator_id: CreatorId = creator_id.parse()?;
    let product_id: ProductId = product_id.parse()?;
    let pay_per_stream = parse_decimal("payPerStream", rate)?;
    if pay_per_stream < Decimal::ZERO {
        return Err(EngineError::validation("pay per stream cannot be negative"));
    }

    ctx.ledger.get_app_dev(app_dev_id).await?;
    ctx.ledger.get_creator(creator_id).await?;
    let product = ctx.ledger.get_product(product_id).await?;
    if product.creator_id != creator_id {
        return Err(EngineError::validation(format!(
            "product {product_id} belongs to creator {}, not {creator_id}",
            product.creator_id
        )));
    }
    if ctx.ledger.contract_exists(creator_id, app_dev_id, product_id).await? {
        return Err(EngineError::invariant(format!(
            "contract already exists for creator {creator_id}, app developer {app_dev_id}, \
             product {product_id}"
        )));
    }

    let contract = Contract {
        creator_id,
        app_dev_id,
        product_id,
        pay_per_stream,
        status: ContractStatus::Requested,
    };
    ctx.ledger.put_contract(&contract)?;

    tracing::info!(
        creator_id = %creator_id,
        app_dev_id = %app_dev_id,
        product_id = %product_id,
        "contract offered"
    );
    Ok(contract.status.to_string())
}

#[tracing::instrument(skip_all, fields(org = ctx.caller.org()))]
pub(crate) async fn accept_contract(
    ctx: &mut InvocationContext<'_>,
    args: &[String],
) -> Result<String> {
    let [creator_id, product_id, app_dev_id] = Operation::AcceptContract.expect_args::<3>(args)?;
    finalize_contract(ctx, creator_id, product_id, app_dev_id, ContractStatus::Accepted).await
}

#[tracing::instrument(skip_all, fields(org = ctx.caller.org()))]
pub(crate) async fn reject_contract(
    ctx: &mut InvocationContext<'_>,
    args: &[String],
) -> Result<String> {
    let [creator_id, product_id, app_dev_id] = Operation::RejectContract.expect_args::<3>(args)?;
    finalize_contract(ctx, creator_id, product_id, app_dev_id, ContractStatus::Rejected).await
}

async fn finalize_contract(
    ctx: &mut InvocationContext<'_>,
    creator_id: &str,
    product_id: &str,
    app_dev_id: &str,
    outcome: ContractStatus,
) -> Result<String> {
    let creator_id: CreatorId = creator_id.parse()?;
    let product_id: ProductId = product_id.parse()?;
    let app_dev_id: AppDevId = app_dev_id.parse()?;

    let mut contract = ctx.ledger.get_contract(creator_id, app_dev_id, product_id).await?;
    contract.finalize(outcome)?;
    ctx.ledger.put_contract(&contract)?;

    tracing::info!(
        creator_id = %creator_id,
        app_dev_id = %app_dev_id,
        product_id = %product_id,
        status = %outcome,
        "contract finalized"
    );
    Ok(outcome.to_string())
}

/// Records one stream of a product by the calling customer.
///
/// Every failed check yields [`EngineError::InvalidStreamRequest`], whether a
/// record is missing or a relationship does not hold.
#[tracing::instrument(skip_all, fields(org = ctx.caller.org()))]
pub(crate) async fn request_song(
    ctx: &mut InvocationContext<'_>,
    args: &[String],
) -> Result<String> {
    let [customer_id, app_dev_id, product_id] = Operation::RequestSong.expect_args::<3>(args)?;
    let customer_id: CustomerId = customer_id.parse()?;
    let app_dev_id: AppDevId = app_dev_id.parse()?;
    let product_id: ProductId = product_id.parse()?;
    let caller_id = ctx.caller.require_id()?;
    if caller_id != customer_id.get() {
        return Err(EngineError::InvalidStreamRequest);
    }

    let mut customer = conceal(ctx.ledger.get_customer(customer_id).await)?;
    conceal(ctx.ledger.get_app_dev(app_dev_id).await)?;
    let mut product = conceal(ctx.ledger.get_product(product_id).await)?;
    let contract =
        conceal(ctx.ledger.get_contract(product.creator_id, app_dev_id, product_id).await)?;

    let permitted = customer.is_subscribed_at(ctx.now)
        && customer.app_dev_id == app_dev_id
        && contract.creator_id == product.creator_id
        && contract.status == ContractStatus::Accepted
        && product.is_active;
    if !permitted {
        tracing::debug!(customer_id = %customer_id, product_id = %product_id, "stream refused");
        return Err(EngineError::InvalidStreamRequest);
    }

    customer.previous_song = customer.queued_song.replace(product_id);
    product.record_stream()?;
    ctx.ledger.put_customer(&customer)?;
    ctx.ledger.put_product(&product)?;

    tracing::debug!(customer_id = %customer_id, product_id = %product_id, "stream recorded");
    Ok("SUCCESS".to_owned())
}

/// Collapses a missing record into the generic stream refusal. Storage
/// failures pass through.
fn conceal<T>(result: Result<T>) -> Result<T> {
    result.map_err(|e| match e {
        EngineError::NotFound { .. } => EngineError::InvalidStreamRequest,
        other => other,
    })
}
