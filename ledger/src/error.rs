//! Failure kinds for ledger operations.
//!
//! Every variant is a precondition violation detected before any state is
//! touched, so an `Err` always means "nothing happened".

use thiserror::Error;

use crate::address::Address;
use crate::amount::Amount;

/// Errors returned by [`Ledger`](crate::Ledger) operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// The source account holds less than the requested amount.
    #[error("insufficient balance: account {account} has {balance}, requested {requested}")]
    InsufficientBalance {
        /// Account being debited.
        account: Address,
        /// Its current balance.
        balance: Amount,
        /// Amount the caller tried to move.
        requested: Amount,
    },

    /// The spender of an allowance is the zero address.
    #[error("invalid spender: the zero address cannot hold an allowance")]
    InvalidSpender,

    /// A `transfer_from` asked for more than the remaining allowance.
    #[error("allowance exceeded: {spender} may spend {allowance} from {owner}, requested {requested}")]
    AllowanceExceeded {
        /// Account whose funds would move.
        owner: Address,
        /// Account spending on the owner's behalf.
        spender: Address,
        /// Remaining allowance.
        allowance: Amount,
        /// Amount the spender tried to move.
        requested: Amount,
    },

    /// A `decrease_allowance` would take the allowance below zero.
    #[error("allowance below zero: current {allowance}, decrease {requested}")]
    AllowanceBelowZero {
        /// Remaining allowance.
        allowance: Amount,
        /// Amount the caller tried to subtract.
        requested: Amount,
    },

    /// An `increase_allowance` would overflow 256 bits.
    #[error("allowance overflow: current {allowance}, increase {added}")]
    AllowanceOverflow {
        /// Remaining allowance.
        allowance: Amount,
        /// Amount the caller tried to add.
        added: Amount,
    },

    /// Mint destination is the zero address.
    #[error("invalid recipient: cannot mint to the zero address")]
    InvalidRecipient,

    /// Burn source is the zero address.
    #[error("invalid source: cannot burn from the zero address")]
    InvalidSource,

    /// The caller does not hold the owner privilege.
    #[error("unauthorized: {caller} is not the ledger owner")]
    Unauthorized {
        /// The account that attempted the privileged call.
        caller: Address,
    },

    /// Minting would push total supply past `U256::MAX`.
    #[error("supply overflow: total supply {supply}, mint {amount}")]
    SupplyOverflow {
        /// Supply before the failed mint.
        supply: Amount,
        /// Amount that was attempted.
        amount: Amount,
    },

    /// Crediting an account would overflow its balance.
    #[error("balance overflow: account {account} has {balance}, credit {amount}")]
    BalanceOverflow {
        /// Account being credited.
        account: Address,
        /// Its current balance.
        balance: Amount,
        /// Amount that was attempted.
        amount: Amount,
    },
}

impl LedgerError {
    /// Stable, machine-readable name of the failure kind.
    pub fn kind(&self) -> &'static str {
        match self {
            LedgerError::InsufficientBalance { .. } => "InsufficientBalance",
            LedgerError::InvalidSpender => "InvalidSpender",
            LedgerError::AllowanceExceeded { .. } => "AllowanceExceeded",
            LedgerError::AllowanceBelowZero { .. } => "AllowanceBelowZero",
            LedgerError::AllowanceOverflow { .. } => "AllowanceOverflow",
            LedgerError::InvalidRecipient => "InvalidRecipient",
            LedgerError::InvalidSource => "InvalidSource",
            LedgerError::Unauthorized { .. } => "Unauthorized",
            LedgerError::SupplyOverflow { .. } => "SupplyOverflow",
            LedgerError::BalanceOverflow { .. } => "BalanceOverflow",
        }
    }

    /// Returns `true` for failures caused by a missing owner privilege.
    pub fn is_authorization(&self) -> bool {
        matches!(self, LedgerError::Unauthorized { .. })
    }
}
