//! Ledger record schema.
//!
//! Records are stored as JSON (camelCase field names) under composite keys
//! of the form `(kind, id)`, except contracts which are keyed by the
//! `(creator, app-dev, product)` triple. A write always replaces the whole
//! record.

use std::{fmt, str::FromStr};

use beatchain_storage::CompositeKey;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{
    error::{EngineError, Result},
    types::{AccountId, AppDevId, CreatorId, CustomerId, ProductId},
};

/// A record stored under its own composite key.
pub trait Record: Serialize + DeserializeOwned + Send {
    /// Record kind; the first composite-key segment.
    const KIND: &'static str;

    /// Composite key this record is stored under.
    fn key(&self) -> CompositeKey;
}

/// Money-holding account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankAccount {
    /// Account id.
    pub id: AccountId,
    /// Current balance. Never negative once written.
    pub balance: Decimal,
    /// Whether the account is bound to a party record.
    pub in_use: bool,
}

impl BankAccount {
    /// Key of the account with the given id.
    pub fn key_for(id: AccountId) -> CompositeKey {
        CompositeKey::new(Self::KIND).with(id.to_string())
    }
}

impl Record for BankAccount {
    const KIND: &'static str = "BankAccount";

    fn key(&self) -> CompositeKey {
        Self::key_for(self.id)
    }
}

/// Subscriber of an app developer's service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRecord {
    /// Customer id.
    pub id: CustomerId,
    /// App developer the subscription is with.
    pub app_dev_id: AppDevId,
    /// Customer's bank account.
    pub bank_account_id: AccountId,
    /// Fee charged on each renewal.
    pub subscription_fee: Decimal,
    /// Instant the current subscription period ends.
    pub subscription_due_date: DateTime<Utc>,
    /// Product most recently requested.
    #[serde(default)]
    pub queued_song: Option<ProductId>,
    /// Product requested before the queued one.
    #[serde(default)]
    pub previous_song: Option<ProductId>,
}

impl CustomerRecord {
    /// Key of the customer with the given id.
    pub fn key_for(id: CustomerId) -> CompositeKey {
        CompositeKey::new(Self::KIND).with(id.to_string())
    }

    /// Returns `true` while the subscription period has not ended.
    pub fn is_subscribed_at(&self, now: DateTime<Utc>) -> bool {
        self.subscription_due_date > now
    }
}

impl Record for CustomerRecord {
    const KIND: &'static str = "CustomerRecord";

    fn key(&self) -> CompositeKey {
        Self::key_for(self.id)
    }
}

/// Application developer reselling subscriptions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppDevRecord {
    /// App-dev id.
    pub id: AppDevId,
    /// App developer's bank account.
    pub bank_account_id: AccountId,
    /// Fraction of each subscription fee kept by the platform, in `[0, 1]`.
    pub admin_fee_frac: Decimal,
}

impl AppDevRecord {
    /// Key of the app developer with the given id.
    pub fn key_for(id: AppDevId) -> CompositeKey {
        CompositeKey::new(Self::KIND).with(id.to_string())
    }
}

impl Record for AppDevRecord {
    const KIND: &'static str = "AppDevRecord";

    fn key(&self) -> CompositeKey {
        Self::key_for(self.id)
    }
}

/// Content creator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatorRecord {
    /// Creator id.
    pub id: CreatorId,
    /// Creator's bank account.
    pub bank_account_id: AccountId,
}

impl CreatorRecord {
    /// Key of the creator with the given id.
    pub fn key_for(id: CreatorId) -> CompositeKey {
        CompositeKey::new(Self::KIND).with(id.to_string())
    }
}

impl Record for CreatorRecord {
    const KIND: &'static str = "CreatorRecord";

    fn key(&self) -> CompositeKey {
        Self::key_for(self.id)
    }
}

/// A streamable product and its usage counters.
///
/// `unsettled_*` counters accrue on every stream; settlement rolls them into
/// the `total_*` counters and zeroes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Product id.
    pub id: ProductId,
    /// Owning creator.
    pub creator_id: CreatorId,
    /// Display name.
    pub name: String,
    /// Settled listens.
    pub total_listens: u64,
    /// Listens not yet paid for.
    pub unsettled_listens: u64,
    /// Settled metrics.
    pub total_metrics: u64,
    /// Metrics not yet settled.
    pub unsettled_metrics: u64,
    /// Free-form additional metric counter.
    pub additional_metrics: u64,
    /// `false` once the product is deleted.
    pub is_active: bool,
}

impl Product {
    /// Key of the product with the given id.
    pub fn key_for(id: ProductId) -> CompositeKey {
        CompositeKey::new(Self::KIND).with(id.to_string())
    }

    /// Records one stream.
    ///
    /// # Errors
    ///
    /// [`EngineError::InvariantViolation`] if an unsettled counter is
    /// saturated; the product is left unchanged.
    pub fn record_stream(&mut self) -> Result<()> {
        let listens = bump(self.unsettled_listens, 1, "unsettled listens")?;
        let metrics = bump(self.unsettled_metrics, 1, "unsettled metrics")?;
        self.unsettled_listens = listens;
        self.unsettled_metrics = metrics;
        Ok(())
    }

    /// Rolls unsettled counters into the totals.
    ///
    /// # Errors
    ///
    /// [`EngineError::InvariantViolation`] if a total would overflow; the
    /// product is left unchanged.
    pub fn settle(&mut self) -> Result<()> {
        let listens = bump(self.total_listens, self.unsettled_listens, "total listens")?;
        let metrics = bump(self.total_metrics, self.unsettled_metrics, "total metrics")?;
        self.total_listens = listens;
        self.total_metrics = metrics;
        self.unsettled_listens = 0;
        self.unsettled_metrics = 0;
        Ok(())
    }
}

fn bump(counter: u64, by: u64, what: &str) -> Result<u64> {
    counter
        .checked_add(by)
        .ok_or_else(|| EngineError::invariant(format!("{what} counter overflows")))
}

impl Record for Product {
    const KIND: &'static str = "Product";

    fn key(&self) -> CompositeKey {
        Self::key_for(self.id)
    }
}

/// Lifecycle state of a [`Contract`].
///
/// `Requested` moves to exactly one of `Accepted` or `Rejected`; both are
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ContractStatus {
    /// Offered, awaiting the creator's decision.
    Requested,
    /// Accepted; streams accrue royalties.
    Accepted,
    /// Rejected.
    Rejected,
}

impl ContractStatus {
    /// Upper-case name, as stored and returned.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Requested => "REQUESTED",
            Self::Accepted => "ACCEPTED",
            Self::Rejected => "REJECTED",
        }
    }

    /// Returns `true` for `Accepted` and `Rejected`.
    pub fn is_final(self) -> bool {
        !matches!(self, Self::Requested)
    }
}

impl fmt::Display for ContractStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContractStatus {
    type Err = EngineError;

    /// Accepts the three names in any case, plus the legacy flags `true`
    /// (accepted) and `false` (rejected).
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "REQUESTED" => Ok(Self::Requested),
            "ACCEPTED" | "TRUE" => Ok(Self::Accepted),
            "REJECTED" | "FALSE" => Ok(Self::Rejected),
            _ => Err(EngineError::validation(format!("unknown contract status '{s}'"))),
        }
    }
}

/// Royalty agreement between a creator and an app developer for one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contract {
    /// Creator receiving royalties.
    pub creator_id: CreatorId,
    /// App developer paying royalties.
    pub app_dev_id: AppDevId,
    /// Product covered.
    pub product_id: ProductId,
    /// Royalty per listen.
    pub pay_per_stream: Decimal,
    /// Lifecycle state.
    pub status: ContractStatus,
}

impl Contract {
    /// Key of the contract for the given triple.
    pub fn key_for(creator: CreatorId, app_dev: AppDevId, product: ProductId) -> CompositeKey {
        CompositeKey::new(Self::KIND)
            .with(creator.to_string())
            .with(app_dev.to_string())
            .with(product.to_string())
    }

    /// Partial key covering every contract of one creator.
    pub fn creator_prefix(creator: CreatorId) -> CompositeKey {
        CompositeKey::new(Self::KIND).with(creator.to_string())
    }

    /// Moves a requested contract to `outcome`.
    ///
    /// # Errors
    ///
    /// - [`EngineError::InvariantViolation`] if the contract is already final
    /// - [`EngineError::Validation`] if `outcome` is not a final state
    pub fn finalize(&mut self, outcome: ContractStatus) -> Result<()> {
        if !outcome.is_final() {
            return Err(EngineError::validation(format!(
                "contract cannot be finalized as {outcome}"
            )));
        }
        if self.status.is_final() {
            return Err(EngineError::invariant(format!(
                "contract already finalized as {}",
                self.status
            )));
        }
        self.status = outcome;
        Ok(())
    }
}

impl Record for Contract {
    const KIND: &'static str = "Contract";

    fn key(&self) -> CompositeKey {
        Self::key_for(self.creator_id, self.app_dev_id, self.product_id)
    }
}
