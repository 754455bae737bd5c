//! Forecasting models for time series data
//!
//! Every model family implements the same two capabilities: fit on a
//! training series, then predict from the fitted state. Fitting consumes
//! nothing but the training series; a trained model is owned exclusively by
//! whoever called `fit`.

use crate::data::Series;
use crate::error::{ForecastError, Result};
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, Normal};
use std::fmt::Debug;

/// Model output before any dates are attached
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    /// Name of the producing model
    model: String,
    /// Predicted levels in order
    values: Vec<f64>,
}

impl Prediction {
    /// Create a prediction
    pub fn new(model: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            model: model.into(),
            values,
        }
    }

    /// Name of the producing model
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Predicted values
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Forecast result containing predicted values and optional intervals
#[derive(Debug, Clone)]
pub struct ForecastResult {
    /// Forecasted values
    values: Vec<f64>,
    /// Number of periods forecasted
    horizons: usize,
    /// Confidence intervals (optional)
    intervals: Option<Vec<(f64, f64)>>,
}

impl ForecastResult {
    /// Create a new forecast result
    pub fn new(values: Vec<f64>, horizons: usize) -> Result<Self> {
        if values.len() != horizons {
            return Err(ForecastError::InvalidInput(format!(
                "Values length ({}) doesn't match horizons ({})",
                values.len(),
                horizons
            )));
        }

        Ok(Self {
            values,
            horizons,
            intervals: None,
        })
    }

    /// Create a new forecast result with confidence intervals
    pub fn new_with_intervals(
        values: Vec<f64>,
        horizons: usize,
        intervals: Vec<(f64, f64)>,
    ) -> Result<Self> {
        if values.len() != intervals.len() {
            return Err(ForecastError::InvalidInput(format!(
                "Values length ({}) doesn't match intervals length ({})",
                values.len(),
                intervals.len()
            )));
        }

        let mut result = Self::new(values, horizons)?;
        result.intervals = Some(intervals);
        Ok(result)
    }

    /// Get the forecasted values
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Get the number of periods forecasted
    pub fn horizons(&self) -> usize {
        self.horizons
    }

    /// Get the confidence intervals, if available
    pub fn intervals(&self) -> Option<&[(f64, f64)]> {
        self.intervals.as_deref()
    }
}

/// Trained forecast model
pub trait TrainedForecastModel: Debug + Send {
    /// Forecast `horizon` levels past the end of the training series,
    /// feeding the model its own earlier forecasts
    fn predict(&self, horizon: usize) -> Result<Prediction>;

    /// One-step-ahead forecasts over real observations that follow the
    /// training series. The result may be shorter than `held_out` when the
    /// model needs part of it as input context.
    fn walk_forward(&self, held_out: &[f64]) -> Result<Prediction>;

    /// Recursive forecast with two-sided bounds at `confidence`
    fn predict_with_intervals(&self, horizon: usize, confidence: f64) -> Result<ForecastResult>;

    /// Name of the model
    fn name(&self) -> &str;
}

/// Forecast model that can be fitted to a training series
pub trait ForecastModel: Debug + Clone {
    /// The type of trained model produced
    type Trained: TrainedForecastModel;

    /// Fit the model; fails with `ModelFit` when the series is too short,
    /// has missing observations or is numerically degenerate
    fn fit(&self, train: &Series) -> Result<Self::Trained>;

    /// Fewest training observations `fit` accepts
    fn min_training_len(&self) -> usize;

    /// Get the name of the model
    fn name(&self) -> &str;
}

/// Training closes, refusing short series and missing observations
pub(crate) fn training_values(model: &str, train: &Series, min_len: usize) -> Result<Vec<f64>> {
    if train.len() < min_len {
        return Err(ForecastError::ModelFit(format!(
            "{} needs at least {} training observations, got {}",
            model,
            min_len,
            train.len()
        )));
    }

    let missing = train.missing_count();
    if missing > 0 {
        return Err(ForecastError::ModelFit(format!(
            "{} cannot be fitted on a series with {} missing observations",
            model, missing
        )));
    }

    Ok(train.closes())
}

/// Two-sided standard normal quantile for a confidence level
pub(crate) fn z_score(confidence: f64) -> Result<f64> {
    if !(confidence > 0.0 && confidence < 1.0) {
        return Err(ForecastError::InvalidInput(format!(
            "Confidence level must be between 0 and 1, got {}",
            confidence
        )));
    }

    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| ForecastError::InvalidInput(format!("Normal distribution: {}", e)))?;
    Ok(normal.inverse_cdf(0.5 + confidence / 2.0))
}

pub(crate) fn check_held_out(held_out: &[f64]) -> Result<()> {
    if let Some(pos) = held_out.iter().position(|v| !v.is_finite()) {
        return Err(ForecastError::InvalidInput(format!(
            "Held-out value at position {} is not finite",
            pos
        )));
    }
    Ok(())
}

pub mod arima;
pub mod lstm;

pub use arima::{ArimaModel, ArimaOrder, TrainedArimaModel};
pub use lstm::{LstmConfig, LstmModel, TrainedLstmModel};
