//! Decimal helpers for turning fractional weights into capital amounts.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

/// Round a decimal to a specific number of decimal places.
pub fn round_to_precision(value: Decimal, decimals: u32) -> Decimal {
    value.round_dp(decimals)
}

/// Convert a floating-point weight to a decimal.
///
/// Non-finite or out-of-range values map to zero.
pub fn weight_to_decimal(weight: f64) -> Decimal {
    Decimal::from_f64(weight).unwrap_or(Decimal::ZERO)
}

/// Capital assigned to a weight, rounded to `decimals` places.
pub fn capital_budget(capital: Decimal, weight: f64, decimals: u32) -> Decimal {
    round_to_precision(capital * weight_to_decimal(weight), decimals)
}
