//! Read-only range queries.

use crate::{
    context::InvocationContext, error::Result, operation::Operation, types::format_cents,
};

/// Lists every bank account, one `Bank Account ID: <id> Balance: <0.00>`
/// line each, in id order.
#[tracing::instrument(skip_all, fields(org = ctx.caller.org()))]
pub(crate) async fn list_bank_accounts(
    ctx: &mut InvocationContext<'_>,
    args: &[String],
) -> Result<String> {
    let [] = Operation::ListBankAccounts.expect_args::<0>(args)?;

    let accounts = ctx.ledger.scan_bank_accounts().await?;
    tracing::debug!(count = accounts.len(), "bank accounts listed");

    Ok(accounts
        .iter()
        .map(|account| {
            format!("Bank Account ID: {} Balance: {}", account.id, format_cents(account.balance))
        })
        .collect::<Vec<_>>()
        .join("\n"))
}
