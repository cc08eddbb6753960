// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Tally Ledger
//!
//! A fungible-token ledger: balances of a single fixed-decimals asset,
//! transfers, delegated spending through allowances, and owner-gated
//! mint/burn with transferable (and renounceable) ownership.
//!
//! - **token**: the [`Ledger`] state machine. Every operation commits
//!   completely or fails with a [`LedgerError`] and changes nothing.
//! - **session**: [`Session`], a caller-bound view (`ledger.connect(addr)`).
//! - **operation**: [`Operation`], each mutating call as a serde value.
//! - **shared**: [`SharedLedger`], a serialized, sequenced handle for
//!   concurrent callers.
//! - **snapshot**: validated save/restore of the full state.
//! - **config**: genesis parameters.
//! - **address** / **amount**: 20-byte account ids and 256-bit amounts.
//!
//! ## Design Principles
//!
//! 1. All monetary arithmetic is checked. Wrapping arithmetic and money do
//!    not mix.
//! 2. Preconditions are evaluated in full before the first write, so a
//!    failed call leaves no trace.
//! 3. The owner check is the first step of every privileged operation.
//! 4. Every public type crossing a process boundary is serializable (serde).

pub mod address;
pub mod amount;
pub mod config;
pub mod error;
pub mod operation;
pub mod session;
pub mod shared;
pub mod snapshot;
pub mod token;

pub use address::{Address, AddressError};
pub use amount::{parse_amount, Amount, AmountError};
pub use config::{ConfigError, GenesisConfig};
pub use error::LedgerError;
pub use operation::Operation;
pub use session::Session;
pub use shared::{Receipt, SharedLedger};
pub use snapshot::{LedgerSnapshot, SnapshotError};
pub use token::{Ledger, TokenMetadata};
