//! Unit Conversion
//!
//! Ledgers report integers in the smallest unit; the UI shows decimals.

use rust_decimal::Decimal;

use crate::error::{PlutusError, PlutusResult};

/// Largest scale `Decimal` can represent
const MAX_SCALE: u32 = 28;

/// Convert a smallest-unit integer into display units
///
/// Exponents above 28 are truncated to 28 fractional digits.
pub fn from_base_units(raw: u128, decimals: u32) -> PlutusResult<Decimal> {
    let (raw, decimals) = if decimals > MAX_SCALE {
        let excess = decimals - MAX_SCALE;
        let divisor = 10u128.checked_pow(excess).unwrap_or(0);
        let scaled = if divisor == 0 { 0 } else { raw / divisor };
        (scaled, MAX_SCALE)
    } else {
        (raw, decimals)
    };

    let raw = i128::try_from(raw)
        .map_err(|_| PlutusError::decode(format!("Amount out of range: {}", raw)))?;

    Decimal::try_from_i128_with_scale(raw, decimals)
        .map(|d| d.normalize())
        .map_err(|e| PlutusError::decode(format!("Amount out of range: {}", e)))
}
