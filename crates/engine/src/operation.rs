//! The closed set of invocable operations.

use std::{fmt, str::FromStr};

use beatchain_authn::Role;

use crate::error::{EngineError, Result};

/// Every operation the engine can invoke, keyed by exact function name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Create a product owned by the calling creator.
    AddProduct,
    /// Soft-delete a product owned by the calling creator.
    DeleteProduct,
    /// Create a subscriber of the calling app developer.
    AddCustomerRecord,
    /// Create a creator and its bank account.
    AddCreatorRecord,
    /// Create an app developer and its bank account.
    AddAppDevRecord,
    /// Create a detached bank account.
    CreateNewBankAccount,
    /// Charge the calling customer for one more subscription period.
    RenewSubscription,
    /// Settle the calling creator's accrued royalties.
    CollectPayment,
    /// Deposit to or withdraw from a bank account.
    TransferFunds,
    /// Offer a royalty contract.
    OfferContract,
    /// Accept a requested contract.
    AcceptContract,
    /// Reject a requested contract.
    RejectContract,
    /// Stream a product.
    RequestSong,
    /// List every bank account and its balance.
    ListBankAccounts,
}

impl Operation {
    /// Every operation, in declaration order.
    pub const ALL: [Operation; 14] = [
        Operation::AddProduct,
        Operation::DeleteProduct,
        Operation::AddCustomerRecord,
        Operation::AddCreatorRecord,
        Operation::AddAppDevRecord,
        Operation::CreateNewBankAccount,
        Operation::RenewSubscription,
        Operation::CollectPayment,
        Operation::TransferFunds,
        Operation::OfferContract,
        Operation::AcceptContract,
        Operation::RejectContract,
        Operation::RequestSong,
        Operation::ListBankAccounts,
    ];

    /// Function name the operation is invoked by.
    pub fn name(self) -> &'static str {
        match self {
            Operation::AddProduct => "AddProduct",
            Operation::DeleteProduct => "DeleteProduct",
            Operation::AddCustomerRecord => "AddCustomerRecord",
            Operation::AddCreatorRecord => "AddCreatorRecord",
            Operation::AddAppDevRecord => "AddAppDevRecord",
            Operation::CreateNewBankAccount => "CreateNewBankAccount",
            Operation::RenewSubscription => "RenewSubscription",
            Operation::CollectPayment => "CollectPayment",
            Operation::TransferFunds => "TransferFunds",
            Operation::OfferContract => "OfferContract",
            Operation::AcceptContract => "AcceptContract",
            Operation::RejectContract => "RejectContract",
            Operation::RequestSong => "RequestSong",
            Operation::ListBankAccounts => "ListBankAccounts",
        }
    }

    /// Roles allowed to invoke the operation. The caller must hold at least
    /// one of them.
    pub fn allowed_roles(self) -> &'static [Role] {
        match self {
            Operation::AddProduct | Operation::DeleteProduct | Operation::CollectPayment => {
                &[Role::Creator]
            },
            Operation::AddCustomerRecord => &[Role::AppDev],
            Operation::AddCreatorRecord
            | Operation::AddAppDevRecord
            | Operation::CreateNewBankAccount
            | Operation::TransferFunds
            | Operation::ListBankAccounts => &[Role::Admin],
            Operation::RenewSubscription | Operation::RequestSong => &[Role::Customer],
            Operation::OfferContract => &[Role::AppDev, Role::Admin],
            Operation::AcceptContract | Operation::RejectContract => {
                &[Role::Creator, Role::Admin]
            },
        }
    }

    /// Checks the argument count and returns the arguments as a fixed-size
    /// array.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Validation`] if `args` does not hold exactly
    /// `N` arguments.
    pub fn expect_args<const N: usize>(self, args: &[String]) -> Result<&[String; N]> {
        args.try_into().map_err(|_| {
            EngineError::validation(format!(
                "incorrect number of arguments for {self}: expecting {N}, found {}",
                args.len()
            ))
        })
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operation {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        Operation::ALL
            .into_iter()
            .find(|op| op.name() == s)
            .ok_or_else(|| EngineError::InvalidFunction(s.to_owned()))
    }
}
