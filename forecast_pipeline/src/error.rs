//! Error types for the forecast_pipeline crate

use forecast_math::MathError;
use polars::prelude::PolarsError;
use thiserror::Error;

/// Custom error types for the forecast_pipeline crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Malformed or out-of-range arguments (empty series, bad fraction, length mismatch)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Upstream price history could not be retrieved
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    /// Training data insufficient or numerically degenerate
    #[error("Model fit error: {0}")]
    ModelFit(String),

    /// Configuration file could not be parsed or failed validation
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error from CSV output
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    Polars(String),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<PolarsError> for ForecastError {
    fn from(err: PolarsError) -> Self {
        ForecastError::Polars(err.to_string())
    }
}

impl From<toml::de::Error> for ForecastError {
    fn from(err: toml::de::Error) -> Self {
        ForecastError::Config(err.to_string())
    }
}

// Numeric failures surface while fitting, except for caller-supplied bad input
impl From<MathError> for ForecastError {
    fn from(err: MathError) -> Self {
        match err {
            MathError::InvalidInput(msg) => ForecastError::InvalidInput(msg),
            MathError::InsufficientData(msg) | MathError::CalculationError(msg) => {
                ForecastError::ModelFit(msg)
            }
        }
    }
}
