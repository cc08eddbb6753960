//! # Ledger Snapshots
//!
//! A [`LedgerSnapshot`] is a self-contained image of a ledger's state:
//! metadata, owner, supply, and every balance and allowance entry, sorted so
//! that two snapshots of the same state are byte-identical. Amounts are
//! written as decimal strings.
//!
//! Restoring never trusts the file. [`Ledger::restore`] re-checks the
//! invariants that the live ledger maintains by construction:
//!
//! 1. `total_supply == sum(balances)` (with no overflow along the way).
//! 2. No account or `(owner, spender)` pair appears twice.
//! 3. No allowance names the zero address as spender.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::address::Address;
use crate::amount::{serde_decimal, Amount};
use crate::shared::SharedLedger;
use crate::token::{Ledger, TokenMetadata};

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised while reading, writing or validating a snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot encoding error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported snapshot version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("total supply {declared} does not match sum of balances {actual}")]
    SupplyMismatch { declared: Amount, actual: Amount },

    #[error("sum of balances overflows 256 bits")]
    BalanceSumOverflow,

    #[error("duplicate balance entry for {0}")]
    DuplicateBalance(Address),

    #[error("duplicate allowance entry for owner {owner}, spender {spender}")]
    DuplicateAllowance { owner: Address, spender: Address },

    #[error("allowance of {owner} names the zero address as spender")]
    ZeroSpender { owner: Address },
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One account's balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceEntry {
    pub account: Address,
    #[serde(with = "serde_decimal")]
    pub amount: Amount,
}

/// One `(owner, spender)` allowance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowanceEntry {
    pub owner: Address,
    pub spender: Address,
    #[serde(with = "serde_decimal")]
    pub amount: Amount,
}

/// Serializable image of a [`Ledger`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    /// Format version, see [`SNAPSHOT_VERSION`].
    pub version: u32,
    /// Sequence number of the last operation included in this image.
    #[serde(default)]
    pub sequence: u64,
    pub metadata: TokenMetadata,
    pub owner: Address,
    #[serde(with = "serde_decimal")]
    pub total_supply: Amount,
    pub balances: Vec<BalanceEntry>,
    pub allowances: Vec<AllowanceEntry>,
}

impl LedgerSnapshot {
    /// Reads a JSON snapshot from `path`. The content is not validated until
    /// it is passed to [`Ledger::restore`].
    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        let bytes = fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Writes the snapshot to `path` as pretty JSON.
    ///
    /// The file is written next to the target and renamed into place so a
    /// crash never leaves a half-written snapshot behind.
    pub fn save(&self, path: &Path) -> Result<(), SnapshotError> {
        let json = serde_json::to_vec_pretty(self)?;
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }
}

impl Ledger {
    /// Captures the full state of this ledger.
    pub fn snapshot(&self) -> LedgerSnapshot {
        self.snapshot_at(0)
    }

    pub(crate) fn snapshot_at(&self, sequence: u64) -> LedgerSnapshot {
        let mut balances: Vec<BalanceEntry> = self
            .balances()
            .iter()
            .map(|(account, amount)| BalanceEntry {
                account: *account,
                amount: *amount,
            })
            .collect();
        balances.sort_by(|a, b| a.account.cmp(&b.account));

        let mut allowances: Vec<AllowanceEntry> = self
            .allowances()
            .iter()
            .map(|((owner, spender), amount)| AllowanceEntry {
                owner: *owner,
                spender: *spender,
                amount: *amount,
            })
            .collect();
        allowances.sort_by(|a, b| (a.owner, a.spender).cmp(&(b.owner, b.spender)));

        LedgerSnapshot {
            version: SNAPSHOT_VERSION,
            sequence,
            metadata: self.metadata().clone(),
            owner: self.owner(),
            total_supply: self.total_supply(),
            balances,
            allowances,
        }
    }

    /// Rebuilds a ledger from a snapshot after validating it.
    ///
    /// # Errors
    ///
    /// Returns a [`SnapshotError`] describing the first violated invariant.
    pub fn restore(snapshot: LedgerSnapshot) -> Result<Self, SnapshotError> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion {
                found: snapshot.version,
                expected: SNAPSHOT_VERSION,
            });
        }

        let mut balances = HashMap::with_capacity(snapshot.balances.len());
        let mut sum = Amount::zero();
        for entry in snapshot.balances {
            if balances.insert(entry.account, entry.amount).is_some() {
                return Err(SnapshotError::DuplicateBalance(entry.account));
            }
            sum = sum
                .checked_add(entry.amount)
                .ok_or(SnapshotError::BalanceSumOverflow)?;
        }
        if sum != snapshot.total_supply {
            return Err(SnapshotError::SupplyMismatch {
                declared: snapshot.total_supply,
                actual: sum,
            });
        }

        let mut allowances = HashMap::with_capacity(snapshot.allowances.len());
        for entry in snapshot.allowances {
            if entry.spender.is_zero() {
                return Err(SnapshotError::ZeroSpender { owner: entry.owner });
            }
            if allowances
                .insert((entry.owner, entry.spender), entry.amount)
                .is_some()
            {
                return Err(SnapshotError::DuplicateAllowance {
                    owner: entry.owner,
                    spender: entry.spender,
                });
            }
        }

        tracing::info!(
            symbol = %snapshot.metadata.symbol,
            accounts = balances.len(),
            allowances = allowances.len(),
            sequence = snapshot.sequence,
            "ledger restored from snapshot"
        );

        Ok(Ledger::from_parts(
            snapshot.metadata,
            snapshot.owner,
            snapshot.total_supply,
            balances,
            allowances,
        ))
    }
}

impl SharedLedger {
    /// Restores a shared ledger, continuing the snapshot's commit order.
    pub fn from_snapshot(snapshot: LedgerSnapshot) -> Result<Self, SnapshotError> {
        let sequence = snapshot.sequence;
        Ok(SharedLedger::with_sequence(Ledger::restore(snapshot)?, sequence))
    }
}
