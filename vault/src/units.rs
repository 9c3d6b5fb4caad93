//! # Unit Conversion
//!
//! Amounts are integers in the smallest unit. People write `0.5`. These two
//! helpers convert between the two for a given number of decimals without
//! ever touching floating point.

use thiserror::Error;

use crate::ledger::Amount;

/// Errors raised by [`parse_units`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnitsError {
    /// The input is empty or contains something other than digits and a
    /// single decimal point.
    #[error("malformed amount: {0:?}")]
    Malformed(String),

    /// More fractional digits than the asset's precision can hold.
    #[error("amount {input:?} has more than {decimals} fractional digits")]
    TooPrecise {
        /// The rejected input.
        input: String,
        /// The asset's decimal places.
        decimals: u8,
    },

    /// The value does not fit in an [`Amount`].
    #[error("amount {0:?} overflows")]
    Overflow(String),
}

/// Parses a decimal string such as `"1.5"` into smallest units.
pub fn parse_units(input: &str, decimals: u8) -> Result<Amount, UnitsError> {
    let trimmed = input.trim();
    let malformed = || UnitsError::Malformed(input.to_string());

    let (whole, fraction) = match trimmed.split_once('.') {
        Some((w, f)) => (w, f),
        None => (trimmed, ""),
    };
    if whole.is_empty() && fraction.is_empty() {
        return Err(malformed());
    }
    if !whole.bytes().all(|b| b.is_ascii_digit()) || !fraction.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(malformed());
    }
    if fraction.len() > decimals as usize {
        return Err(UnitsError::TooPrecise {
            input: input.to_string(),
            decimals,
        });
    }

    let overflow = || UnitsError::Overflow(input.to_string());
    let scale = (10 as Amount)
        .checked_pow(decimals as u32)
        .ok_or_else(overflow)?;

    let whole_value = if whole.is_empty() {
        0
    } else {
        whole.parse::<Amount>().map_err(|_| overflow())?
    };
    let fraction_value = if fraction.is_empty() {
        0
    } else {
        let padded = format!("{:0<width$}", fraction, width = decimals as usize);
        padded.parse::<Amount>().map_err(|_| overflow())?
    };

    whole_value
        .checked_mul(scale)
        .and_then(|v| v.checked_add(fraction_value))
        .ok_or_else(overflow)
}

/// Formats smallest units as a decimal string, trimming trailing zeros.
pub fn format_units(amount: Amount, decimals: u8) -> String {
    if decimals == 0 {
        return amount.to_string();
    }
    let digits = format!("{:0>width$}", amount, width = decimals as usize + 1);
    let (whole, fraction) = digits.split_at(digits.len() - decimals as usize);
    let fraction = fraction.trim_end_matches('0');
    if fraction.is_empty() {
        whole.to_string()
    } else {
        format!("{}.{}", whole, fraction)
    }
}
