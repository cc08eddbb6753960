//! # Genesis Configuration
//!
//! The construction parameters of a ledger (name, symbol, decimals, initial
//! supply and initial owner) are external configuration, not part of the
//! runtime protocol. [`GenesisConfig`] carries them from a config file into
//! [`Ledger::new`], checking the few things that would make a ledger
//! useless from day one.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::address::Address;
use crate::amount::{serde_decimal, Amount};
use crate::token::Ledger;

/// Decimals used when a config does not say otherwise.
pub const DEFAULT_DECIMALS: u8 = 18;

/// Largest decimals value whose scale factor (10^decimals) fits in 256 bits.
pub const MAX_DECIMALS: u8 = 77;

/// Errors found while validating a genesis configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("token name must not be empty")]
    EmptyName,

    #[error("token symbol must not be empty")]
    EmptySymbol,

    #[error("decimals {0} exceeds the maximum of 77")]
    TooManyDecimals(u8),

    #[error("initial owner must not be the zero address")]
    ZeroOwner,
}

fn default_decimals() -> u8 {
    DEFAULT_DECIMALS
}

/// Parameters for creating a fresh ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisConfig {
    pub name: String,
    pub symbol: String,
    #[serde(default = "default_decimals")]
    pub decimals: u8,
    /// Credited in full to `owner` at construction.
    #[serde(with = "serde_decimal")]
    pub initial_supply: Amount,
    pub owner: Address,
}

impl GenesisConfig {
    /// Checks the parameters without building anything.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::EmptyName);
        }
        if self.symbol.trim().is_empty() {
            return Err(ConfigError::EmptySymbol);
        }
        if self.decimals > MAX_DECIMALS {
            return Err(ConfigError::TooManyDecimals(self.decimals));
        }
        if self.owner.is_zero() {
            return Err(ConfigError::ZeroOwner);
        }
        Ok(())
    }

    /// Validates and builds the ledger.
    pub fn build(&self) -> Result<Ledger, ConfigError> {
        self.validate()?;
        Ok(Ledger::new(
            self.name.clone(),
            self.symbol.clone(),
            self.decimals,
            self.initial_supply,
            self.owner,
        ))
    }
}
