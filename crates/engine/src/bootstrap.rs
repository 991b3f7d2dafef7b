//! Ledger bootstrap from positional arguments.
//!
//! `initialize` takes either no arguments (leave the ledger untouched) or a
//! fixed positional layout:
//!
//! | Index | Field |
//! |---|---|
//! | 0 | platform account balance |
//! | 1..=4 | app-dev id, app-dev account id, admin fee fraction, account balance |
//! | 5..=9 | customer id, customer account id, subscription fee, due date (`YYYY-MM-DD`), account balance |
//! | 10..=12 | creator id, creator account id, account balance |
//! | 13..=20 | product id, name, total listens, unsettled listens, total metrics, unsettled metrics, additional metrics, active flag |
//! | 21..=22 | contract pay per stream, contract status |
//!
//! Exactly 10 or exactly 23 arguments are accepted. The customer subscribes
//! to the app developer, the product belongs to the creator and the contract
//! binds the three.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;

use crate::{
    accessor::LedgerAccessor,
    error::{EngineError, Result},
    records::{
        AppDevRecord, BankAccount, Contract, ContractStatus, CreatorRecord, CustomerRecord,
        Product,
    },
    types::{
        AccountId, AppDevId, CreatorId, CustomerId, ProductId, parse_count, parse_decimal,
        parse_flag,
    },
};

/// Argument count of the base fixture (platform, app developer, customer).
pub const BASE_FIXTURE_ARGS: usize = 10;

/// Argument count of the full fixture (adds creator, product, contract).
pub const FULL_FIXTURE_ARGS: usize = 23;

/// Parsed bootstrap records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerFixture {
    /// Platform bank account.
    pub admin_account: BankAccount,
    /// App developer and its account.
    pub app_dev: (AppDevRecord, BankAccount),
    /// Customer and its account.
    pub customer: (CustomerRecord, BankAccount),
    /// Creator, product and contract, present for the full fixture.
    pub catalog: Option<CatalogFixture>,
}

/// Creator-side bootstrap records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogFixture {
    /// Creator and its account.
    pub creator: (CreatorRecord, BankAccount),
    /// Product owned by the creator.
    pub product: Product,
    /// Contract between the creator and the app developer for the product.
    pub contract: Contract,
}

impl LedgerFixture {
    /// Parses the positional bootstrap arguments.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Validation`] for a wrong argument count, an
    /// unparsable field, a fee fraction outside `[0, 1]` or a negative amount.
    pub fn parse<S: AsRef<str>>(admin_account_id: AccountId, args: &[S]) -> Result<Self> {
        if args.len() != BASE_FIXTURE_ARGS && args.len() != FULL_FIXTURE_ARGS {
            return Err(EngineError::validation(format!(
                "incorrect number of arguments for initialization: expecting 0, \
                 {BASE_FIXTURE_ARGS} or {FULL_FIXTURE_ARGS}, found {}",
                args.len()
            )));
        }
        let arg = |i: usize| args[i].as_ref();

        let admin_account = account(admin_account_id, amount("admin balance", arg(0))?);

        let app_dev_id: AppDevId = arg(1).parse()?;
        let app_dev_account_id: AccountId = arg(2).parse()?;
        let admin_fee_frac = parse_decimal("adminFeeFrac", arg(3))?;
        if !(Decimal::ZERO..=Decimal::ONE).contains(&admin_fee_frac) {
            return Err(EngineError::validation(format!(
                "admin fee fraction must be between 0 and 1, got {admin_fee_frac}"
            )));
        }
        let app_dev = (
            AppDevRecord { id: app_dev_id, bank_account_id: app_dev_account_id, admin_fee_frac },
            account(app_dev_account_id, amount("app-dev balance", arg(4))?),
        );

        let customer_account_id: AccountId = arg(6).parse()?;
        let customer = (
            CustomerRecord {
                id: arg(5).parse::<CustomerId>()?,
                app_dev_id,
                bank_account_id: customer_account_id,
                subscription_fee: amount("subscriptionFee", arg(7))?,
                subscription_due_date: parse_date("subscriptionDueDate", arg(8))?,
                queued_song: None,
                previous_song: None,
            },
            account(customer_account_id, amount("customer balance", arg(9))?),
        );

        let catalog = if args.len() == FULL_FIXTURE_ARGS {
            let creator_id: CreatorId = arg(10).parse()?;
            let creator_account_id: AccountId = arg(11).parse()?;
            let product_id: ProductId = arg(13).parse()?;
            let pay_per_stream = parse_decimal("payPerStream", arg(21))?;
            if pay_per_stream < Decimal::ZERO {
                return Err(EngineError::validation("pay per stream cannot be negative"));
            }
            Some(CatalogFixture {
                creator: (
                    CreatorRecord { id: creator_id, bank_account_id: creator_account_id },
                    account(creator_account_id, amount("creator balance", arg(12))?),
                ),
                product: Product {
                    id: product_id,
                    creator_id,
                    name: arg(14).to_owned(),
                    total_listens: parse_count("totalListens", arg(15))?,
                    unsettled_listens: parse_count("unsettledListens", arg(16))?,
                    total_metrics: parse_count("totalMetrics", arg(17))?,
                    unsettled_metrics: parse_count("unsettledMetrics", arg(18))?,
                    additional_metrics: parse_count("additionalMetrics", arg(19))?,
                    is_active: parse_flag("isActive", arg(20))?,
                },
                contract: Contract {
                    creator_id,
                    app_dev_id,
                    product_id,
                    pay_per_stream,
                    status: arg(22).parse::<ContractStatus>()?,
                },
            })
        } else {
            None
        };

        Ok(Self { admin_account, app_dev, customer, catalog })
    }

    /// Buffers every fixture record.
    ///
    /// # Errors
    ///
    /// Propagates accessor write failures.
    pub fn write(&self, ledger: &mut LedgerAccessor) -> Result<()> {
        ledger.put_bank_account(&self.admin_account)?;
        ledger.put_app_dev(&self.app_dev.0)?;
        ledger.put_bank_account(&self.app_dev.1)?;
        ledger.put_customer(&self.customer.0)?;
        ledger.put_bank_account(&self.customer.1)?;
        if let Some(catalog) = &self.catalog {
            ledger.put_creator(&catalog.creator.0)?;
            ledger.put_bank_account(&catalog.creator.1)?;
            ledger.put_product(&catalog.product)?;
            ledger.put_contract(&catalog.contract)?;
        }
        Ok(())
    }
}

fn account(id: AccountId, balance: Decimal) -> BankAccount {
    BankAccount { id, balance, in_use: true }
}

fn amount(field: &str, raw: &str) -> Result<Decimal> {
    let value = parse_decimal(field, raw)?;
    if value < Decimal::ZERO {
        return Err(EngineError::validation(format!("{field} cannot be negative, got {raw}")));
    }
    Ok(value)
}

fn parse_date(field: &str, raw: &str) -> Result<DateTime<Utc>> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map(|date| date.and_time(NaiveTime::default()).and_utc())
        .map_err(|_| {
            EngineError::validation(format!("cannot parse {field} '{raw}' as a YYYY-MM-DD date"))
        })
}
