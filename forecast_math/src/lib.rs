//! # Forecast Math
//!
//! Numeric building blocks shared by the forecasting models.
//! This crate provides differencing and integration of series, ordinary
//! least squares, min-max scaling and the mean square.

use thiserror::Error;

pub mod differencing;
pub mod regression;
pub mod scaling;
pub mod stats;

pub use differencing::{difference, Integrator};
pub use regression::{least_squares, solve_linear_system};
pub use scaling::MinMaxScaler;

/// Errors that can occur in numeric calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for numeric operations
pub type Result<T> = std::result::Result<T, MathError>;
