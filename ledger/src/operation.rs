//! # Operations as Values
//!
//! [`Operation`] names every state-changing call on a [`Ledger`] so that it
//! can travel over the wire, be queued, or be replayed. The caller is not
//! part of the operation; it is supplied separately to
//! [`Ledger::apply`] (or [`SharedLedger::submit`](crate::SharedLedger::submit)).
//!
//! Wire form (JSON):
//!
//! ```text
//! { "op": "transfer_from", "from": "0x…", "to": "0x…", "amount": "60" }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::address::Address;
use crate::amount::{serde_decimal, Amount};
use crate::error::LedgerError;
use crate::token::Ledger;

/// A mutating ledger operation, minus its caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    /// Move the caller's funds to `to`.
    Transfer {
        to: Address,
        #[serde(with = "serde_decimal")]
        amount: Amount,
    },
    /// Set `spender`'s allowance over the caller's funds.
    Approve {
        spender: Address,
        #[serde(with = "serde_decimal")]
        amount: Amount,
    },
    /// Raise `spender`'s allowance over the caller's funds.
    IncreaseAllowance {
        spender: Address,
        #[serde(with = "serde_decimal")]
        amount: Amount,
    },
    /// Lower `spender`'s allowance over the caller's funds.
    DecreaseAllowance {
        spender: Address,
        #[serde(with = "serde_decimal")]
        amount: Amount,
    },
    /// Spend the caller's allowance over `from`.
    TransferFrom {
        from: Address,
        to: Address,
        #[serde(with = "serde_decimal")]
        amount: Amount,
    },
    /// Create new supply (owner only).
    Mint {
        to: Address,
        #[serde(with = "serde_decimal")]
        amount: Amount,
    },
    /// Destroy supply (owner only).
    Burn {
        from: Address,
        #[serde(with = "serde_decimal")]
        amount: Amount,
    },
    /// Hand the owner privilege to another account (owner only).
    TransferOwnership { new_owner: Address },
    /// Give up the owner privilege for good (owner only).
    RenounceOwnership,
}

impl Operation {
    /// Stable snake_case name, matching the `op` tag on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Transfer { .. } => "transfer",
            Operation::Approve { .. } => "approve",
            Operation::IncreaseAllowance { .. } => "increase_allowance",
            Operation::DecreaseAllowance { .. } => "decrease_allowance",
            Operation::TransferFrom { .. } => "transfer_from",
            Operation::Mint { .. } => "mint",
            Operation::Burn { .. } => "burn",
            Operation::TransferOwnership { .. } => "transfer_ownership",
            Operation::RenounceOwnership => "renounce_ownership",
        }
    }

    /// Returns `true` for operations gated on the owner privilege.
    pub fn is_privileged(&self) -> bool {
        matches!(
            self,
            Operation::Mint { .. }
                | Operation::Burn { .. }
                | Operation::TransferOwnership { .. }
                | Operation::RenounceOwnership
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Ledger {
    /// Executes `op` on behalf of `caller`.
    ///
    /// Semantics are exactly those of the corresponding method; this is only
    /// a dispatcher.
    pub fn apply(&mut self, caller: Address, op: &Operation) -> Result<(), LedgerError> {
        match *op {
            Operation::Transfer { to, amount } => self.transfer(caller, to, amount),
            Operation::Approve { spender, amount } => self.approve(caller, spender, amount),
            Operation::IncreaseAllowance { spender, amount } => {
                self.increase_allowance(caller, spender, amount)
            }
            Operation::DecreaseAllowance { spender, amount } => {
                self.decrease_allowance(caller, spender, amount)
            }
            Operation::TransferFrom { from, to, amount } => {
                self.transfer_from(caller, from, to, amount)
            }
            Operation::Mint { to, amount } => self.mint(caller, to, amount),
            Operation::Burn { from, amount } => self.burn(caller, from, amount),
            Operation::TransferOwnership { new_owner } => {
                self.transfer_ownership(caller, new_owner)
            }
            Operation::RenounceOwnership => self.renounce_ownership(caller),
        }
    }
}
