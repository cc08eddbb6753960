//! Caller-bound view of a [`Ledger`].
//!
//! `ledger.connect(alice).transfer(bob, amount)` reads the way the operation
//! surface is usually described: the caller is implicit and acts as the
//! source of transfers, the owner of approvals, and the spender in
//! `transfer_from`.

use crate::address::Address;
use crate::amount::Amount;
use crate::error::LedgerError;
use crate::token::Ledger;

/// A [`Ledger`] borrowed on behalf of a single caller.
#[derive(Debug)]
pub struct Session<'a> {
    ledger: &'a mut Ledger,
    caller: Address,
}

impl<'a> Session<'a> {
    pub(crate) fn new(ledger: &'a mut Ledger, caller: Address) -> Self {
        Self { ledger, caller }
    }

    /// The account this session acts for.
    pub fn caller(&self) -> Address {
        self.caller
    }

    /// Read-only access to the underlying ledger.
    pub fn ledger(&self) -> &Ledger {
        self.ledger
    }

    pub fn transfer(&mut self, to: Address, amount: Amount) -> Result<(), LedgerError> {
        self.ledger.transfer(self.caller, to, amount)
    }

    pub fn approve(&mut self, spender: Address, amount: Amount) -> Result<(), LedgerError> {
        self.ledger.approve(self.caller, spender, amount)
    }

    pub fn increase_allowance(&mut self, spender: Address, added: Amount) -> Result<(), LedgerError> {
        self.ledger.increase_allowance(self.caller, spender, added)
    }

    pub fn decrease_allowance(&mut self, spender: Address, subtracted: Amount) -> Result<(), LedgerError> {
        self.ledger.decrease_allowance(self.caller, spender, subtracted)
    }

    pub fn transfer_from(&mut self, from: Address, to: Address, amount: Amount) -> Result<(), LedgerError> {
        self.ledger.transfer_from(self.caller, from, to, amount)
    }

    pub fn mint(&mut self, to: Address, amount: Amount) -> Result<(), LedgerError> {
        self.ledger.mint(self.caller, to, amount)
    }

    pub fn burn(&mut self, from: Address, amount: Amount) -> Result<(), LedgerError> {
        self.ledger.burn(self.caller, from, amount)
    }

    pub fn transfer_ownership(&mut self, new_owner: Address) -> Result<(), LedgerError> {
        self.ledger.transfer_ownership(self.caller, new_owner)
    }

    pub fn renounce_ownership(&mut self) -> Result<(), LedgerError> {
        self.ledger.renounce_ownership(self.caller)
    }
}
