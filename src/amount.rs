//! Exact SOL amount arithmetic.
//!
//! This module provides [`SolAmount`], a positive decimal number of SOL that
//! converts losslessly to lamports. All arithmetic goes through
//! [`rust_decimal::Decimal`]; binary floating point is never involved, so an
//! amount like `"1.5"` always becomes exactly `1_500_000_000` lamports.
//!
//! # Example
//!
//! ```
//! use payflow::amount::SolAmount;
//!
//! let amount = SolAmount::parse("1.5").unwrap();
//! assert_eq!(amount.to_lamports().unwrap(), 1_500_000_000);
//! ```

use regex::Regex;
use rust_decimal::Decimal;
use std::fmt;
use std::fmt::Display;
use std::str::FromStr;
use std::sync::LazyLock;

/// Number of decimal places in one SOL.
pub const SOL_DECIMALS: u32 = 9;

/// Lamports per whole SOL (`10^9`).
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

mod bounds {
    use super::*;

    /// One lamport, the smallest representable amount.
    pub const MIN_STR: &str = "0.000000001";
    /// Upper bound chosen so that any in-range amount fits in u64 lamports.
    pub const MAX_STR: &str = "999999999";

    pub static MIN: LazyLock<Decimal> =
        LazyLock::new(|| Decimal::from_str(MIN_STR).expect("valid decimal"));
    pub static MAX: LazyLock<Decimal> =
        LazyLock::new(|| Decimal::from_str(MAX_STR).expect("valid decimal"));
}

static AMOUNT_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\d\.\-]+").expect("valid regex"));

/// A validated, positive amount of SOL.
///
/// Construction enforces the invariants the payment flow relies on:
/// the value is strictly positive, has at most [`SOL_DECIMALS`] fractional
/// digits, and sits within a range whose lamport representation fits in `u64`.
/// Once constructed, [`to_lamports`](SolAmount::to_lamports) cannot drift.
#[derive(Debug, Clone, PartialEq)]
pub struct SolAmount(Decimal);

/// Errors produced when validating or converting a SOL amount.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AmountError {
    /// The input string could not be read as a number.
    #[error("amount is not a number")]
    InvalidFormat,
    /// Zero and negative amounts cannot be transferred.
    #[error("amount must be greater than zero")]
    NotPositive,
    /// The value falls outside the supported range.
    #[error("amount must be between {} and {} SOL", bounds::MIN_STR, bounds::MAX_STR)]
    OutOfRange,
    /// More fractional digits than a lamport can express.
    #[error("at most {SOL_DECIMALS} decimal places are supported, got {0}")]
    TooPrecise(u32),
}

impl SolAmount {
    /// Parses a human-entered amount string.
    ///
    /// Currency symbols, thousand separators, and whitespace are stripped
    /// before parsing, so `"◎1,000.5"` and `"1000.5"` are equivalent.
    ///
    /// # Errors
    ///
    /// Returns an error if the cleaned string is not a number, is not
    /// strictly positive, is out of range, or carries more than
    /// [`SOL_DECIMALS`] fractional digits.
    pub fn parse(input: &str) -> Result<Self, AmountError> {
        let cleaned = AMOUNT_CHARS.replace_all(input, "").to_string();
        let parsed = Decimal::from_str(&cleaned).map_err(|_| AmountError::InvalidFormat)?;
        Self::try_from(parsed)
    }

    /// Returns the amount as a plain decimal, for display and receipts.
    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Converts the amount to lamports with exact integer arithmetic.
    ///
    /// The result equals `mantissa * 10^(9 - scale)`; no rounding occurs.
    ///
    /// # Errors
    ///
    /// Returns [`AmountError::TooPrecise`] or [`AmountError::OutOfRange`] if
    /// the invariants were somehow violated; for any value accepted by the
    /// constructors this cannot happen.
    pub fn to_lamports(&self) -> Result<u64, AmountError> {
        let normalized = self.0.normalize();
        let scale = normalized.scale();
        if scale > SOL_DECIMALS {
            return Err(AmountError::TooPrecise(scale));
        }
        let digits = u64::try_from(normalized.mantissa().unsigned_abs())
            .map_err(|_| AmountError::OutOfRange)?;
        let multiplier = 10u64
            .checked_pow(SOL_DECIMALS - scale)
            .ok_or(AmountError::OutOfRange)?;
        digits.checked_mul(multiplier).ok_or(AmountError::OutOfRange)
    }
}

impl TryFrom<Decimal> for SolAmount {
    type Error = AmountError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        if value.is_sign_negative() || value.is_zero() {
            return Err(AmountError::NotPositive);
        }
        // Precision first: a sub-lamport value like 0.0000000001 is a
        // precision problem, not a range one.
        let scale = value.normalize().scale();
        if scale > SOL_DECIMALS {
            return Err(AmountError::TooPrecise(scale));
        }
        if value < *bounds::MIN || value > *bounds::MAX {
            return Err(AmountError::OutOfRange);
        }
        Ok(SolAmount(value))
    }
}

impl FromStr for SolAmount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SolAmount::parse(s)
    }
}

impl Display for SolAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}
