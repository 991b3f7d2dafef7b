//! Identifier newtypes and currency helpers.
//!
//! Every record id is a `u64` wrapped in a kind-specific newtype so an
//! account id can never be passed where a product id is expected. Ids render
//! as plain decimal strings, which is also how they appear as composite-key
//! components and in invocation arguments.
//!
//! Money is a [`Decimal`]. Amounts are rounded to cents (midpoint away from
//! zero) whenever money moves.

use std::{fmt, str::FromStr};

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Wraps a raw id.
            #[must_use]
            pub const fn new(value: u64) -> Self {
                Self(value)
            }

            /// Returns the raw id.
            #[must_use]
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = EngineError;

            fn from_str(s: &str) -> Result<Self> {
                s.trim().parse::<u64>().map(Self).map_err(|_| {
                    EngineError::validation(format!(concat!($label, " '{}' is not a valid id"), s))
                })
            }
        }
    };
}

record_id!(
    /// Identifier of a [`BankAccount`](crate::records::BankAccount).
    AccountId,
    "bank account id"
);
record_id!(
    /// Identifier of a [`CustomerRecord`](crate::records::CustomerRecord).
    CustomerId,
    "customer id"
);
record_id!(
    /// Identifier of an [`AppDevRecord`](crate::records::AppDevRecord).
    AppDevId,
    "app-dev id"
);
record_id!(
    /// Identifier of a [`CreatorRecord`](crate::records::CreatorRecord).
    CreatorId,
    "creator id"
);
record_id!(
    /// Identifier of a [`Product`](crate::records::Product).
    ProductId,
    "product id"
);

/// Rounds an amount to whole cents, midpoint away from zero.
#[must_use]
pub fn round_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Renders an amount with exactly two decimal places.
#[must_use]
pub fn format_cents(amount: Decimal) -> String {
    let mut rounded = round_cents(amount);
    rounded.rescale(2);
    rounded.to_string()
}

/// Splits a subscription fee between the app developer and the platform.
///
/// The app developer's share is `round_cents(fee * (1 - admin_fee_frac))`;
/// the platform receives the exact remainder, so the two shares always sum
/// to `fee`.
///
/// ```
/// use beatchain_engine::types::split_subscription_fee;
/// use rust_decimal::Decimal;
///
/// let (app_dev, admin) = split_subscription_fee(Decimal::new(100, 2), Decimal::new(1, 1));
/// assert_eq!(app_dev, Decimal::new(90, 2));
/// assert_eq!(admin, Decimal::new(10, 2));
/// ```
#[must_use]
pub fn split_subscription_fee(fee: Decimal, admin_fee_frac: Decimal) -> (Decimal, Decimal) {
    let app_dev_share = round_cents(fee * (Decimal::ONE - admin_fee_frac));
    (app_dev_share, fee - app_dev_share)
}

/// `a + b`, or an invariant violation naming `what` when the sum does not
/// fit in a [`Decimal`].
pub(crate) fn checked_sum(what: &str, a: Decimal, b: Decimal) -> Result<Decimal> {
    a.checked_add(b).ok_or_else(|| EngineError::invariant(format!("{what} overflows")))
}

/// `a * b`, or an invariant violation naming `what` on overflow.
pub(crate) fn checked_product(what: &str, a: Decimal, b: Decimal) -> Result<Decimal> {
    a.checked_mul(b).ok_or_else(|| EngineError::invariant(format!("{what} overflows")))
}

/// Parses a decimal argument, naming `field` in the error.
pub(crate) fn parse_decimal(field: &str, raw: &str) -> Result<Decimal> {
    Decimal::from_str(raw.trim())
        .map_err(|_| EngineError::validation(format!("cannot parse {field} '{raw}' as a decimal")))
}

/// Parses an unsigned counter argument, naming `field` in the error.
pub(crate) fn parse_count(field: &str, raw: &str) -> Result<u64> {
    raw.trim().parse::<u64>().map_err(|_| {
        EngineError::validation(format!("cannot parse {field} '{raw}' as a non-negative integer"))
    })
}

/// Parses a boolean argument (`true`/`false`, any case), naming `field` in the
/// error.
pub(crate) fn parse_flag(field: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(EngineError::validation(format!("cannot parse {field} '{raw}' as a boolean"))),
    }
}
