//! Engine configuration.
//!
//! [`EngineConfig`] holds the ledger-wide constants the handlers depend on:
//! which bank account belongs to the platform, where id issuance starts, the
//! per-transfer ceiling and the subscription period.

use std::time::Duration;

use beatchain_authn::IdentityMode;
use chrono::TimeDelta;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::AccountId;

/// Default platform bank account id.
const DEFAULT_ADMIN_BANK_ACCOUNT_ID: u64 = 1;

/// Default counter value before the first id is issued.
const DEFAULT_UNIQUE_ID_START: u64 = 100_000_000;

/// Default subscription period (30 days).
const DEFAULT_SUBSCRIPTION_PERIOD: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Configuration validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A field holds an unusable value.
    #[error("Invalid configuration: {field} {reason}")]
    InvalidField {
        /// Name of the offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

/// Configuration for [`Engine`](crate::Engine).
///
/// # Example
///
/// ```
/// use std::time::Duration;
///
/// use beatchain_engine::EngineConfig;
/// use rust_decimal::Decimal;
///
/// let config = EngineConfig::builder()
///     .max_transfer_amount(Decimal::new(500, 0))
///     .subscription_period(Duration::from_secs(7 * 24 * 60 * 60))
///     .build()?;
/// assert_eq!(config.admin_bank_account_id().get(), 1);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Bank account credited with the platform's share of subscription fees.
    #[serde(default = "default_admin_bank_account_id")]
    admin_bank_account_id: AccountId,

    /// Counter value assumed when the ledger has never issued an id.
    #[serde(default = "default_unique_id_start")]
    unique_id_start: u64,

    /// Largest magnitude a single `TransferFunds` may move.
    #[serde(default = "default_max_transfer_amount")]
    max_transfer_amount: Decimal,

    /// Length of one subscription period.
    #[serde(with = "humantime_serde", default = "default_subscription_period")]
    subscription_period: Duration,

    /// Where caller identities come from.
    #[serde(default)]
    identity_mode: IdentityMode,
}

fn default_admin_bank_account_id() -> AccountId {
    AccountId::new(DEFAULT_ADMIN_BANK_ACCOUNT_ID)
}

fn default_unique_id_start() -> u64 {
    DEFAULT_UNIQUE_ID_START
}

fn default_max_transfer_amount() -> Decimal {
    Decimal::new(1000, 0)
}

fn default_subscription_period() -> Duration {
    DEFAULT_SUBSCRIPTION_PERIOD
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            admin_bank_account_id: default_admin_bank_account_id(),
            unique_id_start: default_unique_id_start(),
            max_transfer_amount: default_max_transfer_amount(),
            subscription_period: default_subscription_period(),
            identity_mode: IdentityMode::default(),
        }
    }
}

#[bon::bon]
impl EngineConfig {
    /// Creates a configuration, validating every field.
    ///
    /// # Optional Fields
    ///
    /// * `admin_bank_account_id` - Platform account (default: 1).
    /// * `unique_id_start` - Counter start (default: 100000000).
    /// * `max_transfer_amount` - Per-transfer ceiling (default: 1000.00).
    /// * `subscription_period` - Renewal period (default: 30 days).
    /// * `identity_mode` - Identity source (default: host).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidField`] if:
    /// - `max_transfer_amount` is not positive
    /// - `subscription_period` is zero or too large to add to a date
    #[builder]
    pub fn new(
        #[builder(default = default_admin_bank_account_id())] admin_bank_account_id: AccountId,
        #[builder(default = DEFAULT_UNIQUE_ID_START)] unique_id_start: u64,
        #[builder(default = default_max_transfer_amount())] max_transfer_amount: Decimal,
        #[builder(default = DEFAULT_SUBSCRIPTION_PERIOD)] subscription_period: Duration,
        #[builder(default)] identity_mode: IdentityMode,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            admin_bank_account_id,
            unique_id_start,
            max_transfer_amount,
            subscription_period,
            identity_mode,
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks field bounds. Deserialized configurations bypass the builder,
    /// so [`Engine::new`](crate::Engine::new) calls this as well.
    ///
    /// # Errors
    ///
    /// See [`EngineConfig::new`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_transfer_amount <= Decimal::ZERO {
            return Err(ConfigError::InvalidField {
                field: "max_transfer_amount",
                reason: format!("must be positive, got {}", self.max_transfer_amount),
            });
        }
        if self.subscription_period.is_zero() {
            return Err(ConfigError::InvalidField {
                field: "subscription_period",
                reason: "must be non-zero".into(),
            });
        }
        if TimeDelta::from_std(self.subscription_period).is_err() {
            return Err(ConfigError::InvalidField {
                field: "subscription_period",
                reason: "is out of range".into(),
            });
        }
        Ok(())
    }

    /// Returns the platform bank account id.
    #[must_use]
    pub fn admin_bank_account_id(&self) -> AccountId {
        self.admin_bank_account_id
    }

    /// Returns the counter start value.
    #[must_use]
    pub fn unique_id_start(&self) -> u64 {
        self.unique_id_start
    }

    /// Returns the per-transfer ceiling.
    #[must_use]
    pub fn max_transfer_amount(&self) -> Decimal {
        self.max_transfer_amount
    }

    /// Returns the subscription period.
    #[must_use]
    pub fn subscription_period(&self) -> Duration {
        self.subscription_period
    }

    /// Returns the identity mode.
    #[must_use]
    pub fn identity_mode(&self) -> &IdentityMode {
        &self.identity_mode
    }
}
