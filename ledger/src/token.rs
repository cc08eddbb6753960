//! # Token Ledger
//!
//! The [`Ledger`] owns every piece of mutable token state: balances,
//! allowances, total supply and the owner account. Each operation either
//! commits completely or returns a [`LedgerError`] without touching state.
//!
//! ## Security Model
//!
//! - **Privilege gating**: `mint`, `burn`, `transfer_ownership` and
//!   `renounce_ownership` check the caller against the owner field before
//!   anything else. A zero owner means privilege was renounced, and no
//!   caller (not even one claiming the zero address) passes the check.
//! - **Supply tracking**: `total_supply == sum(balances)` holds after every
//!   operation. Only mint and burn move the supply.
//! - **Checked arithmetic**: all additions and subtractions are checked.
//!   Preconditions are evaluated in full before the first write.
//!
//! The ledger itself is a plain, single-threaded state machine. Wrap it in a
//! [`SharedLedger`](crate::SharedLedger) to serve concurrent callers.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::address::Address;
use crate::amount::Amount;
use crate::error::LedgerError;
use crate::session::Session;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Display metadata fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    /// Human-readable token name (e.g., "Tally Token").
    pub name: String,
    /// Ticker symbol (e.g., "TLY").
    pub symbol: String,
    /// Number of decimal places used when displaying amounts.
    pub decimals: u8,
}

/// The fungible-token ledger.
#[derive(Debug, Clone)]
pub struct Ledger {
    metadata: TokenMetadata,
    /// Account that holds mint/burn/ownership privilege. Zero once renounced.
    owner: Address,
    total_supply: Amount,
    balances: HashMap<Address, Amount>,
    /// `(owner, spender) -> remaining allowance`.
    allowances: HashMap<(Address, Address), Amount>,
}

impl Ledger {
    /// Creates a ledger and credits the entire initial supply to `owner`.
    pub fn new(
        name: impl Into<String>,
        symbol: impl Into<String>,
        decimals: u8,
        initial_supply: Amount,
        owner: Address,
    ) -> Self {
        let mut balances = HashMap::new();
        balances.insert(owner, initial_supply);

        Self {
            metadata: TokenMetadata {
                name: name.into(),
                symbol: symbol.into(),
                decimals,
            },
            owner,
            total_supply: initial_supply,
            balances,
            allowances: HashMap::new(),
        }
    }

    /// Reassembles a ledger from parts that the caller has already validated.
    pub(crate) fn from_parts(
        metadata: TokenMetadata,
        owner: Address,
        total_supply: Amount,
        balances: HashMap<Address, Amount>,
        allowances: HashMap<(Address, Address), Amount>,
    ) -> Self {
        Self {
            metadata,
            owner,
            total_supply,
            balances,
            allowances,
        }
    }

    /// Returns a handle that performs operations on behalf of `caller`.
    pub fn connect(&mut self, caller: Address) -> Session<'_> {
        Session::new(self, caller)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Token metadata.
    pub fn metadata(&self) -> &TokenMetadata {
        &self.metadata
    }

    /// Token name.
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// Token symbol.
    pub fn symbol(&self) -> &str {
        &self.metadata.symbol
    }

    /// Display decimals.
    pub fn decimals(&self) -> u8 {
        self.metadata.decimals
    }

    /// Current total supply.
    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    /// Balance of `account`, or zero if it has never held tokens.
    pub fn balance_of(&self, account: &Address) -> Amount {
        self.balances.get(account).copied().unwrap_or_else(Amount::zero)
    }

    /// Remaining amount `spender` may move out of `owner`'s balance.
    pub fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or_else(Amount::zero)
    }

    /// The privileged account, or the zero address once renounced.
    pub fn owner(&self) -> Address {
        self.owner
    }

    /// Returns `true` while some account still holds the owner privilege.
    pub fn is_owned(&self) -> bool {
        !self.owner.is_zero()
    }

    pub(crate) fn balances(&self) -> &HashMap<Address, Amount> {
        &self.balances
    }

    pub(crate) fn allowances(&self) -> &HashMap<(Address, Address), Amount> {
        &self.allowances
    }

    // -----------------------------------------------------------------------
    // Transfers and allowances
    // -----------------------------------------------------------------------

    /// Moves `amount` from `from` to `to`.
    ///
    /// The destination is not checked against the zero address; only mint
    /// and the allowance operations reject it.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InsufficientBalance`] if `from` holds less than
    /// `amount`.
    pub fn transfer(&mut self, from: Address, to: Address, amount: Amount) -> Result<(), LedgerError> {
        self.move_balance(from, to, amount)
    }

    /// Sets the allowance of `spender` over `owner`'s funds to exactly `amount`.
    ///
    /// A second call overwrites the first; allowances never accumulate here.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidSpender`] if `spender` is the zero address.
    pub fn approve(&mut self, owner: Address, spender: Address, amount: Amount) -> Result<(), LedgerError> {
        if spender.is_zero() {
            return Err(LedgerError::InvalidSpender);
        }
        self.allowances.insert((owner, spender), amount);
        Ok(())
    }

    /// Adds `added` to the allowance of `spender` over `owner`'s funds.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidSpender`] for the zero spender and
    /// [`LedgerError::AllowanceOverflow`] if the result exceeds 256 bits.
    pub fn increase_allowance(
        &mut self,
        owner: Address,
        spender: Address,
        added: Amount,
    ) -> Result<(), LedgerError> {
        if spender.is_zero() {
            return Err(LedgerError::InvalidSpender);
        }
        let allowance = self.allowance(&owner, &spender);
        let updated = allowance
            .checked_add(added)
            .ok_or(LedgerError::AllowanceOverflow { allowance, added })?;
        self.allowances.insert((owner, spender), updated);
        Ok(())
    }

    /// Subtracts `subtracted` from the allowance of `spender` over `owner`'s funds.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidSpender`] for the zero spender and
    /// [`LedgerError::AllowanceBelowZero`] if the allowance is too small.
    pub fn decrease_allowance(
        &mut self,
        owner: Address,
        spender: Address,
        subtracted: Amount,
    ) -> Result<(), LedgerError> {
        if spender.is_zero() {
            return Err(LedgerError::InvalidSpender);
        }
        let allowance = self.allowance(&owner, &spender);
        let updated = allowance
            .checked_sub(subtracted)
            .ok_or(LedgerError::AllowanceBelowZero {
                allowance,
                requested: subtracted,
            })?;
        self.allowances.insert((owner, spender), updated);
        Ok(())
    }

    /// Moves `amount` from `from` to `to` on behalf of `caller`, spending
    /// `caller`'s allowance over `from`.
    ///
    /// The allowance is checked before anything else. If it is too small the
    /// call fails even when the balance would have sufficed, and neither
    /// balances nor the allowance change.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::AllowanceExceeded`] if `amount` exceeds the
    /// allowance, then [`LedgerError::InsufficientBalance`] if `from` holds
    /// less than `amount`.
    pub fn transfer_from(
        &mut self,
        caller: Address,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        let allowance = self.allowance(&from, &caller);
        if amount > allowance {
            return Err(LedgerError::AllowanceExceeded {
                owner: from,
                spender: caller,
                allowance,
                requested: amount,
            });
        }

        self.move_balance(from, to, amount)?;
        self.allowances.insert((from, caller), allowance - amount);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Privileged operations
    // -----------------------------------------------------------------------

    /// Creates `amount` new tokens in `to`'s balance.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Unauthorized`] if `caller` is not the owner,
    /// [`LedgerError::InvalidRecipient`] if `to` is the zero address, and
    /// [`LedgerError::SupplyOverflow`] if the supply would exceed 256 bits.
    pub fn mint(&mut self, caller: Address, to: Address, amount: Amount) -> Result<(), LedgerError> {
        self.ensure_owner(caller)?;
        if to.is_zero() {
            return Err(LedgerError::InvalidRecipient);
        }

        let new_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(LedgerError::SupplyOverflow {
                supply: self.total_supply,
                amount,
            })?;

        let balance = self.balance_of(&to);
        let new_balance = balance
            .checked_add(amount)
            .ok_or(LedgerError::BalanceOverflow {
                account: to,
                balance,
                amount,
            })?;

        self.total_supply = new_supply;
        self.balances.insert(to, new_balance);
        Ok(())
    }

    /// Destroys `amount` tokens from `from`'s balance.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Unauthorized`] if `caller` is not the owner,
    /// [`LedgerError::InvalidSource`] if `from` is the zero address, and
    /// [`LedgerError::InsufficientBalance`] if `from` holds less than `amount`.
    pub fn burn(&mut self, caller: Address, from: Address, amount: Amount) -> Result<(), LedgerError> {
        self.ensure_owner(caller)?;
        if from.is_zero() {
            return Err(LedgerError::InvalidSource);
        }

        let balance = self.balance_of(&from);
        let new_balance = balance
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientBalance {
                account: from,
                balance,
                requested: amount,
            })?;

        // sum(balances) == total_supply, so the supply covers any balance.
        self.total_supply = self.total_supply.saturating_sub(amount);
        self.balances.insert(from, new_balance);
        Ok(())
    }

    /// Hands the owner privilege to `new_owner`.
    ///
    /// `new_owner` may be the zero address, which has the same effect as
    /// [`renounce_ownership`](Self::renounce_ownership).
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Unauthorized`] if `caller` is not the owner.
    pub fn transfer_ownership(&mut self, caller: Address, new_owner: Address) -> Result<(), LedgerError> {
        self.ensure_owner(caller)?;
        tracing::info!(previous = %self.owner, new_owner = %new_owner, "ownership transferred");
        self.owner = new_owner;
        Ok(())
    }

    /// Gives up the owner privilege permanently.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Unauthorized`] if `caller` is not the owner.
    pub fn renounce_ownership(&mut self, caller: Address) -> Result<(), LedgerError> {
        self.ensure_owner(caller)?;
        tracing::info!(previous = %self.owner, "ownership renounced");
        self.owner = Address::ZERO;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn ensure_owner(&self, caller: Address) -> Result<(), LedgerError> {
        if self.owner.is_zero() || caller != self.owner {
            tracing::warn!(caller = %caller, "privileged call rejected");
            return Err(LedgerError::Unauthorized { caller });
        }
        Ok(())
    }

    /// Debits `from` and credits `to`. Both sides are validated before either
    /// is written.
    fn move_balance(&mut self, from: Address, to: Address, amount: Amount) -> Result<(), LedgerError> {
        let from_balance = self.balance_of(&from);
        let debited = from_balance
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientBalance {
                account: from,
                balance: from_balance,
                requested: amount,
            })?;

        if from == to {
            return Ok(());
        }

        let to_balance = self.balance_of(&to);
        let credited = to_balance
            .checked_add(amount)
            .ok_or(LedgerError::BalanceOverflow {
                account: to,
                balance: to_balance,
                amount,
            })?;

        self.balances.insert(from, debited);
        self.balances.insert(to, credited);
        Ok(())
    }
}
