//! Calculation Error Types

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalculationError {
    #[error("{field} value {value} is outside the supported range")]
    OutOfRange { field: &'static str, value: String },

    #[error("amounts are too large to calculate")]
    Overflow,
}
