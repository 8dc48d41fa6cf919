//! Money rounding

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Decimal places kept in every published figure
pub const MONEY_SCALE: u32 = 2;

/// Round to two decimal places, midpoint away from zero
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Published form of an already rounded amount
pub(crate) fn to_published(value: Decimal) -> f64 {
    // every Decimal is within f64 range
    value.to_f64().unwrap_or_default()
}
