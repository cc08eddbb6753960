//! # Token Amounts
//!
//! Balances, allowances and supply are unsigned 256-bit integers counted in
//! the token's smallest unit. [`Amount`] is an alias for
//! [`primitive_types::U256`] so callers get the full arithmetic API; this
//! module adds the text and serde conventions used at the crate's edges:
//!
//! - Amounts are written as base-10 strings (`"50000000000000000000000000"`).
//!   JSON numbers lose precision above 2^53 in most clients, so we never
//!   emit them.
//! - On input we also accept `0x`-prefixed hex strings and plain integers
//!   that fit in a `u64`.

use primitive_types::U256;
use serde::{de, Deserializer, Serializer};
use std::fmt;
use thiserror::Error;

/// An unsigned 256-bit token quantity in the smallest denomination.
pub type Amount = U256;

/// Errors that can occur while parsing an amount.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    /// The string was empty.
    #[error("amount is empty")]
    Empty,

    /// The string is not a valid base-10 or `0x` hex integer.
    #[error("invalid amount '{0}'")]
    Invalid(String),

    /// The value does not fit in 256 bits.
    #[error("amount '{0}' exceeds 256 bits")]
    TooLarge(String),
}

/// Parses a base-10 or `0x`-prefixed hex string into an [`Amount`].
pub fn parse_amount(s: &str) -> Result<Amount, AmountError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(AmountError::Empty);
    }

    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        if hex.is_empty() || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(AmountError::Invalid(s.to_string()));
        }
        // 64 hex digits is the 256-bit ceiling, ignoring leading zeros.
        let digits = hex.trim_start_matches('0');
        if digits.is_empty() {
            return Ok(U256::zero());
        }
        if digits.len() > 64 {
            return Err(AmountError::TooLarge(s.to_string()));
        }
        return U256::from_str_radix(digits, 16).map_err(|_| AmountError::Invalid(s.to_string()));
    }

    if !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AmountError::Invalid(s.to_string()));
    }
    U256::from_dec_str(s).map_err(|_| AmountError::TooLarge(s.to_string()))
}

/// Serde adapter writing an [`Amount`] as a base-10 string.
///
/// ```ignore
/// #[serde(with = "tally_ledger::amount::serde_decimal")]
/// pub amount: Amount,
/// ```
pub mod serde_decimal {
    use super::*;

    /// Serializes as a base-10 string.
    pub fn serialize<S: Serializer>(amount: &Amount, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&amount.to_string())
    }

    /// Accepts a base-10 string, a `0x` hex string, or an unsigned integer.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Amount, D::Error> {
        deserializer.deserialize_any(AmountVisitor)
    }
}

struct AmountVisitor;

impl<'de> de::Visitor<'de> for AmountVisitor {
    type Value = Amount;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a base-10 string, a 0x hex string, or an unsigned integer")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Amount, E> {
        parse_amount(v).map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Amount, E> {
        Ok(U256::from(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Amount, E> {
        u64::try_from(v)
            .map(U256::from)
            .map_err(|_| E::custom(format!("amount cannot be negative: {}", v)))
    }
}
