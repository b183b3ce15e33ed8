use thiserror::Error;

/// Failures inside the forecasting core.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ForecastError {
    #[error("invalid month {year}-{month:02}")]
    InvalidMonth { year: i32, month: u32 },
    #[error("{model} needs at least {needed} days of data, got {got}")]
    TooFewPoints {
        model: &'static str,
        needed: usize,
        got: usize,
    },
    #[error("{0} produced a non-finite value")]
    NonFinite(&'static str),
    #[error("{model} returned {got} predictions, expected {expected}")]
    HorizonMismatch {
        model: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("amount {0} cannot be represented as a number")]
    Unrepresentable(String),
    #[error("amounts are too large to add up")]
    Overflow,
}
