//! Cost Calculator
//!
//! Pure unit-economics computation over a configuration.

mod engine;
mod error;
mod rounding;

pub use engine::CostCalculator;
pub use error::CalculationError;
pub use rounding::round_money;
