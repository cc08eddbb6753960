//! # Serialized Shared Ledger
//!
//! A [`SharedLedger`] lets many threads or tasks drive one [`Ledger`] while
//! keeping the sequential semantics intact:
//!
//! - Every submission takes an exclusive lock over the whole state
//!   (balances, allowances, owner, supply), checks preconditions, applies
//!   effects, and releases. Partial effects are never visible.
//! - Committed operations get a strictly increasing sequence number. The
//!   sequence is the single total order all callers observe. Rejected
//!   operations do not consume a number.
//! - No I/O happens under the lock and the lock is never held across an
//!   `.await`, so async callers can use it directly from handlers.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::address::Address;
use crate::error::LedgerError;
use crate::operation::Operation;
use crate::snapshot::LedgerSnapshot;
use crate::token::Ledger;

/// Proof that an operation committed, and where it sits in the total order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// Position in the commit order, starting at 1.
    pub sequence: u64,
    /// The account the operation ran as.
    pub caller: Address,
    /// The committed operation.
    pub operation: Operation,
}

#[derive(Debug)]
struct Inner {
    ledger: Ledger,
    /// Sequence number of the last committed operation (0 = none yet).
    sequence: u64,
}

/// Thread-safe handle to a single ledger. Cheap to clone.
#[derive(Debug, Clone)]
pub struct SharedLedger {
    inner: Arc<Mutex<Inner>>,
}

impl SharedLedger {
    /// Wraps `ledger` with an empty commit history.
    pub fn new(ledger: Ledger) -> Self {
        Self::with_sequence(ledger, 0)
    }

    /// Wraps `ledger`, continuing the commit order after `sequence`.
    pub fn with_sequence(ledger: Ledger, sequence: u64) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner { ledger, sequence })),
        }
    }

    /// Applies `op` as `caller` in one indivisible step.
    ///
    /// # Errors
    ///
    /// Returns the [`LedgerError`] raised by the operation. The ledger is
    /// left exactly as it was.
    pub fn submit(&self, caller: Address, op: Operation) -> Result<Receipt, LedgerError> {
        let mut inner = self.inner.lock();

        if let Err(e) = inner.ledger.apply(caller, &op) {
            tracing::debug!(caller = %caller, op = op.name(), kind = e.kind(), "operation rejected");
            return Err(e);
        }

        inner.sequence += 1;
        let sequence = inner.sequence;
        drop(inner);

        tracing::debug!(caller = %caller, op = op.name(), sequence, "operation committed");
        Ok(Receipt {
            sequence,
            caller,
            operation: op,
        })
    }

    /// Runs `f` against a consistent view of the ledger.
    pub fn read<R>(&self, f: impl FnOnce(&Ledger) -> R) -> R {
        let inner = self.inner.lock();
        f(&inner.ledger)
    }

    /// Like [`read`](Self::read), but also hands `f` the sequence number of
    /// the last operation reflected in that view.
    pub fn read_at<R>(&self, f: impl FnOnce(&Ledger, u64) -> R) -> R {
        let inner = self.inner.lock();
        f(&inner.ledger, inner.sequence)
    }

    /// Sequence number of the last committed operation.
    pub fn sequence(&self) -> u64 {
        self.inner.lock().sequence
    }

    /// Captures the full state together with the current sequence number.
    pub fn snapshot(&self) -> LedgerSnapshot {
        let inner = self.inner.lock();
        inner.ledger.snapshot_at(inner.sequence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amount::Amount;
    use std::thread;

    fn amt(n: u64) -> Amount {
        Amount::from(n)
    }

    #[test]
    fn commits_are_numbered_and_rejections_are_not() {
        let owner = Address::from_low_u64(1);
        let alice = Address::from_low_u64(2);
        let shared = SharedLedger::new(Ledger::new("T", "T", 18, amt(100), owner));

        let r1 = shared
            .submit(owner, Operation::Transfer { to: alice, amount: amt(10) })
            .unwrap();
        assert_eq!(r1.sequence, 1);
        assert_eq!(r1.caller, owner);

        let err = shared
            .submit(alice, Operation::Transfer { to: owner, amount: amt(11) })
            .unwrap_err();
        assert_eq!(err.kind(), "InsufficientBalance");
        assert_eq!(shared.sequence(), 1);

        let r2 = shared
            .submit(alice, Operation::Transfer { to: owner, amount: amt(10) })
            .unwrap();
        assert_eq!(r2.sequence, 2);
        assert_eq!(shared.read(|l| l.balance_of(&owner)), amt(100));
    }

    #[test]
    fn read_at_pairs_state_with_its_sequence() {
        let owner = Address::from_low_u64(1);
        let alice = Address::from_low_u64(2);
        let shared = SharedLedger::new(Ledger::new("T", "T", 18, amt(100), owner));

        assert_eq!(shared.read_at(|l, seq| (l.balance_of(&alice), seq)), (amt(0), 0));
        shared
            .submit(owner, Operation::Transfer { to: alice, amount: amt(25) })
            .unwrap();
        assert_eq!(shared.read_at(|l, seq| (l.balance_of(&alice), seq)), (amt(25), 1));
    }

    #[test]
    fn concurrent_transfers_conserve_supply() {
        let owner = Address::from_low_u64(1);
        let shared = SharedLedger::new(Ledger::new("T", "T", 18, amt(8_000), owner));

        // Seed eight accounts, then have each shuffle funds to its neighbour.
        for i in 0..8u64 {
            shared
                .submit(
                    owner,
                    Operation::Transfer {
                        to: Address::from_low_u64(100 + i),
                        amount: amt(1_000),
                    },
                )
                .unwrap();
        }

        let handles: Vec<_> = (0..8u64)
            .map(|i| {
                let shared = shared.clone();
                thread::spawn(move || {
                    let me = Address::from_low_u64(100 + i);
                    let next = Address::from_low_u64(100 + (i + 1) % 8);
                    let mut sequences = Vec::new();
                    for _ in 0..200 {
                        if let Ok(r) = shared.submit(me, Operation::Transfer { to: next, amount: amt(3) }) {
                            sequences.push(r.sequence);
                        }
                    }
                    sequences
                })
            })
            .collect();

        let mut all: Vec<u64> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        all.sort_unstable();

        // Sequence numbers are unique and contiguous after the 8 seed transfers.
        let expected: Vec<u64> = (9..9 + all.len() as u64).collect();
        assert_eq!(all, expected);

        shared.read(|l| {
            let sum = (0..8u64)
                .map(|i| l.balance_of(&Address::from_low_u64(100 + i)))
                .fold(l.balance_of(&owner), |acc, b| acc + b);
            assert_eq!(sum, l.total_supply());
            assert_eq!(l.total_supply(), amt(8_000));
        });
    }
}
