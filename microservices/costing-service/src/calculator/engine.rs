//! Unit-economics engine

use indexmap::IndexMap;
use rust_decimal::Decimal;
use tracing::debug;

use super::error::CalculationError;
use super::rounding::{round_money, to_published};
use crate::types::{Amount, CalculationResult, Configuration, LineItem};

const ONE_HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Stateless calculator; every call is a pure function of its input
#[derive(Debug, Clone, Copy, Default)]
pub struct CostCalculator;

impl CostCalculator {
    pub const DEFAULT_BATCH_SIZE: Decimal = Decimal::ONE;
    pub const DEFAULT_SELLING_PRICE: Decimal = Decimal::ZERO;

    /// Compute totals, unit cost, profit and margin for a configuration.
    ///
    /// Per-unit figures build on the already rounded unit cost and profit, so
    /// `selling_price - unit_cost == profit_per_unit` holds in the output.
    pub fn calculate(config: &Configuration) -> Result<CalculationResult, CalculationError> {
        let mut category_totals = IndexMap::with_capacity(config.items.len());
        let mut total_cost = Decimal::ZERO;

        for (category, items) in &config.items {
            let subtotal = Self::category_subtotal(items)?;
            total_cost = total_cost.checked_add(subtotal).ok_or(CalculationError::Overflow)?;
            category_totals.insert(category.clone(), to_published(round_money(subtotal)));
        }

        let batch_size = amount_or(config.batch_size.as_ref(), Self::DEFAULT_BATCH_SIZE, "batch_size")?;
        let unit_cost = if batch_size > Decimal::ZERO {
            round_money(total_cost.checked_div(batch_size).ok_or(CalculationError::Overflow)?)
        } else {
            Decimal::ZERO
        };

        let selling_price = amount_or(
            config.selling_price.as_ref(),
            Self::DEFAULT_SELLING_PRICE,
            "selling_price",
        )?;
        let profit_per_unit = round_money(
            selling_price
                .checked_sub(unit_cost)
                .ok_or(CalculationError::Overflow)?,
        );
        let margin_percent = if selling_price > Decimal::ZERO {
            profit_per_unit
                .checked_div(selling_price)
                .and_then(|ratio| ratio.checked_mul(ONE_HUNDRED))
                .map(round_money)
                .ok_or(CalculationError::Overflow)?
        } else {
            Decimal::ZERO
        };
        let batch_profit = round_money(
            profit_per_unit
                .checked_mul(batch_size)
                .ok_or(CalculationError::Overflow)?,
        );

        let result = CalculationResult {
            total_cost: to_published(round_money(total_cost)),
            category_totals,
            unit_cost: to_published(unit_cost),
            profit_per_unit: to_published(profit_per_unit),
            margin_percent: to_published(margin_percent),
            batch_profit: to_published(batch_profit),
            batch_size: to_published(batch_size),
            selling_price: to_published(selling_price),
        };

        debug!(
            categories = result.category_totals.len(),
            total_cost = result.total_cost,
            unit_cost = result.unit_cost,
            margin_percent = result.margin_percent,
            "Configuration costed"
        );

        Ok(result)
    }

    /// Sum of `price * quantity` over a category, unrounded
    fn category_subtotal(items: &[LineItem]) -> Result<Decimal, CalculationError> {
        items.iter().try_fold(Decimal::ZERO, |subtotal, item| {
            let price = amount_or(item.price.as_ref(), LineItem::DEFAULT_PRICE, "price")?;
            let quantity = amount_or(item.quantity.as_ref(), LineItem::DEFAULT_QUANTITY, "quantity")?;
            price
                .checked_mul(quantity)
                .and_then(|cost| subtotal.checked_add(cost))
                .ok_or(CalculationError::Overflow)
        })
    }
}

/// Absent and `null` fields take the default
fn amount_or(
    amount: Option<&Amount>,
    default: Decimal,
    field: &'static str,
) -> Result<Decimal, CalculationError> {
    match amount {
        None => Ok(default),
        Some(a) if a.is_null() => Ok(default),
        Some(a) => a.to_decimal().ok_or_else(|| CalculationError::OutOfRange {
            field,
            value: a.to_string(),
        }),
    }
}
