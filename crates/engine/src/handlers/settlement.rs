//! Settlement handlers: subscription renewal, royalty collection and manual
//! transfers.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::{
    accessor::LedgerAccessor,
    context::InvocationContext,
    error::{EngineError, Result},
    operation::Operation,
    records::{BankAccount, ContractStatus, Record},
    types::{
        AccountId, CreatorId, CustomerId, checked_product, checked_sum, format_cents,
        parse_decimal, round_cents, split_subscription_fee,
    },
};

/// Accounts touched by one settlement, loaded at most once each.
///
/// Postings are applied to the cached copies, so two parties sharing one
/// account see each other's postings and the account is written once with
/// the combined result.
#[derive(Debug, Default)]
struct AccountBook {
    accounts: BTreeMap<AccountId, BankAccount>,
}

impl AccountBook {
    async fn load(&mut self, ledger: &mut LedgerAccessor, id: AccountId) -> Result<Decimal> {
        if let Some(account) = self.accounts.get(&id) {
            return Ok(account.balance);
        }
        let account = ledger.get_bank_account(id).await?;
        let balance = account.balance;
        self.accounts.insert(id, account);
        Ok(balance)
    }

    fn balance(&self, id: AccountId) -> Result<Decimal> {
        self.accounts
            .get(&id)
            .map(|account| account.balance)
            .ok_or_else(|| EngineError::not_found(BankAccount::KIND, id))
    }

    fn post(&mut self, id: AccountId, delta: Decimal) -> Result<()> {
        let account = self
            .accounts
            .get_mut(&id)
            .ok_or_else(|| EngineError::not_found(BankAccount::KIND, id))?;
        account.balance = checked_sum("balance of bank account", account.balance, delta)?;
        Ok(())
    }

    fn write(&self, ledger: &mut LedgerAccessor, id: AccountId) -> Result<()> {
        let account = self
            .accounts
            .get(&id)
            .ok_or_else(|| EngineError::not_found(BankAccount::KIND, id))?;
        ledger.put_bank_account(account)
    }
}

/// Charges the calling customer one subscription fee and extends the
/// subscription by one period.
///
/// The fee is split with [`split_subscription_fee`]. An unlapsed subscription
/// is extended from its due date; a lapsed one restarts from now.
#[tracing::instrument(skip_all, fields(org = ctx.caller.org()))]
pub(crate) async fn renew_subscription(
    ctx: &mut InvocationContext<'_>,
    args: &[String],
) -> Result<String> {
    let [] = Operation::RenewSubscription.expect_args::<0>(args)?;
    let customer_id = CustomerId::new(ctx.caller.require_id()?);
    let period = ctx.subscription_period()?;
    let admin_account = ctx.config.admin_bank_account_id();

    let mut customer = ctx.ledger.get_customer(customer_id).await?;
    let app_dev = ctx.ledger.get_app_dev(customer.app_dev_id).await?;

    let mut book = AccountBook::default();
    let balance = book.load(&mut ctx.ledger, customer.bank_account_id).await?;
    book.load(&mut ctx.ledger, app_dev.bank_account_id).await?;
    book.load(&mut ctx.ledger, admin_account).await?;

    let fee = customer.subscription_fee;
    if balance < fee {
        return Err(EngineError::invariant(format!(
            "insufficient funds: balance ${} cannot cover fee of ${}",
            format_cents(balance),
            format_cents(fee)
        )));
    }

    let base = if customer.is_subscribed_at(ctx.now) {
        customer.subscription_due_date
    } else {
        ctx.now
    };
    customer.subscription_due_date = base
        .checked_add_signed(period)
        .ok_or_else(|| EngineError::invariant("subscription due date out of range"))?;

    let (app_dev_share, admin_share) = split_subscription_fee(fee, app_dev.admin_fee_frac);
    book.post(customer.bank_account_id, -fee)?;
    book.post(app_dev.bank_account_id, app_dev_share)?;
    book.post(admin_account, admin_share)?;

    ctx.ledger.put_customer(&customer)?;
    for id in [customer.bank_account_id, app_dev.bank_account_id, admin_account] {
        book.write(&mut ctx.ledger, id)?;
    }

    tracing::info!(
        customer_id = %customer_id,
        fee = %format_cents(fee),
        app_dev_share = %format_cents(app_dev_share),
        admin_share = %format_cents(admin_share),
        due = %customer.subscription_due_date,
        "subscription renewed"
    );
    Ok("SUCCESS".to_owned())
}

/// Pays the calling creator for every unsettled listen under its accepted
/// contracts.
///
/// Each contract is settled independently: an app developer that cannot
/// cover its payment produces a warning line and is skipped. The creator's
/// account is credited once with the total after the scan.
#[tracing::instrument(skip_all, fields(org = ctx.caller.org()))]
pub(crate) async fn collect_payment(
    ctx: &mut InvocationContext<'_>,
    args: &[String],
) -> Result<String> {
    let [] = Operation::CollectPayment.expect_args::<0>(args)?;
    let creator_id = CreatorId::new(ctx.caller.require_id()?);

    let creator = ctx.ledger.get_creator(creator_id).await?;
    let mut book = AccountBook::default();
    book.load(&mut ctx.ledger, creator.bank_account_id).await?;

    let contracts = ctx.ledger.scan_contracts_for_creator(creator_id).await?;
    let mut lines = Vec::new();
    let mut total = Decimal::ZERO;
    let mut shortfalls = 0_usize;

    for contract in contracts {
        let contract_key = contract.key().to_string();
        if contract.status != ContractStatus::Accepted {
            tracing::debug!(contract = %contract_key, status = %contract.status, "contract skipped");
            continue;
        }

        let mut product = ctx.ledger.get_product(contract.product_id).await?;
        if !product.is_active {
            continue;
        }

        let accrued = checked_product(
            "royalty accrued",
            Decimal::from(product.unsettled_listens),
            contract.pay_per_stream,
        )?;
        let payment = round_cents(accrued);
        if payment.is_zero() {
            continue;
        }

        let app_dev = ctx.ledger.get_app_dev(contract.app_dev_id).await?;
        let available = book.load(&mut ctx.ledger, app_dev.bank_account_id).await?;
        if available < payment {
            shortfalls += 1;
            tracing::warn!(
                app_dev_id = %app_dev.id,
                payment = %format_cents(payment),
                contract = %contract_key,
                "app developer has insufficient funds"
            );
            lines.push(format!(
                "WARNING! AppDev ID: {} insufficient funds for payment of ${} Contract: {contract_key}",
                app_dev.id,
                format_cents(payment)
            ));
            continue;
        }

        book.post(app_dev.bank_account_id, -payment)?;
        book.post(creator.bank_account_id, payment)?;
        total = checked_sum("total payment", total, payment)?;
        lines.push(format!(
            "Payment: ${} AppDev ID: {} Streams: {} Pay per Stream: ${} Contract: {contract_key}",
            format_cents(payment),
            app_dev.id,
            product.unsettled_listens,
            format_rate(contract.pay_per_stream),
        ));

        product.settle()?;
        ctx.ledger.put_product(&product)?;
        book.write(&mut ctx.ledger, app_dev.bank_account_id)?;
    }

    if total.is_zero() {
        if shortfalls == 0 {
            return Ok("No payable opportunities found.".to_owned());
        }
        lines.push("No payments made. AppDevs found with insufficient funds".to_owned());
        return Ok(lines.join("\n"));
    }

    book.write(&mut ctx.ledger, creator.bank_account_id)?;
    tracing::info!(
        creator_id = %creator_id,
        total = %format_cents(total),
        balance = %format_cents(book.balance(creator.bank_account_id)?),
        "royalties collected"
    );

    lines.push(format!("Total Payment: ${}", format_cents(total)));
    if shortfalls > 0 {
        lines.push("WARNING: AppDevs found with insufficient funds".to_owned());
    }
    Ok(lines.join("\n"))
}

/// Adds a signed, cent-rounded amount to an account.
#[tracing::instrument(skip_all, fields(org = ctx.caller.org()))]
pub(crate) async fn transfer_funds(
    ctx: &mut InvocationContext<'_>,
    args: &[String],
) -> Result<String> {
    let [account_id, amount] = Operation::TransferFunds.expect_args::<2>(args)?;
    let account_id: AccountId = account_id.parse()?;
    let amount = round_cents(parse_decimal("amount", amount)?);
    if amount.is_zero() {
        return Err(EngineError::validation("cannot transfer an amount of $0.00 (rounded)"));
    }
    let ceiling = ctx.config.max_transfer_amount();
    if amount.abs() > ceiling {
        return Err(EngineError::validation(format!(
            "cannot transfer more than ${} in a single transaction, given ${}",
            format_cents(ceiling),
            format_cents(amount)
        )));
    }

    let mut account = ctx.ledger.get_bank_account(account_id).await?;
    let balance = checked_sum("balance of bank account", account.balance, amount)?;
    if balance < Decimal::ZERO {
        return Err(EngineError::invariant(format!(
            "insufficient funds: bank account {account_id} balance ${} cannot cover ${}",
            format_cents(account.balance),
            format_cents(amount.abs())
        )));
    }
    account.balance = balance;
    ctx.ledger.put_bank_account(&account)?;

    tracing::info!(
        bank_account_id = %account_id,
        amount = %format_cents(amount),
        "funds transferred"
    );
    Ok("SUCCESS".to_owned())
}

/// Renders a pay-per-stream rate with four decimal places.
fn format_rate(rate: Decimal) -> String {
    let mut rate = rate;
    if rate.scale() < 4 {
        rate.rescale(4);
    }
    rate.to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_format_rate_pads_to_four_places() {
        assert_eq!(format_rate(Decimal::new(1, 2)), "0.0100");
        assert_eq!(format_rate(Decimal::new(125, 5)), "0.00125");
    }
}
