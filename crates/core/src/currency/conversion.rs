//! Currency translation arithmetic.
//!
//! Translation rounds half-up to the target currency's minor-unit
//! precision. Residuals this introduces at document level are absorbed
//! deterministically by the derivation engine.

use rust_decimal::Decimal;
use rust_decimal::RoundingStrategy;

/// Converts an amount using the given exchange rate.
///
/// Rounds half-up (midpoint away from zero) to `minor_units` decimal
/// places.
#[must_use]
pub fn convert_amount(amount: Decimal, rate: Decimal, minor_units: u32) -> Decimal {
    (amount * rate).round_dp_with_strategy(minor_units, RoundingStrategy::MidpointAwayFromZero)
}

/// Rounds a value half-up to `minor_units` decimal places.
#[must_use]
pub fn round_half_up(value: Decimal, minor_units: u32) -> Decimal {
    value.round_dp_with_strategy(minor_units, RoundingStrategy::MidpointAwayFromZero)
}
