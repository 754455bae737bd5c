//! Metrics for evaluating forecast performance
//!
//! Actual and predicted values are paired by date (an inner join), never by
//! position.

use crate::alignment::AlignedPrediction;
use crate::data::Series;
use crate::error::{ForecastError, Result};
use serde::Serialize;

/// Mean squared error over the dates shared by `actual` and `predicted`
pub fn score(actual: &Series, predicted: &AlignedPrediction) -> Result<f64> {
    Ok(evaluate(actual, predicted)?.mse)
}

/// Accuracy metrics over the dates shared by `actual` and `predicted`
///
/// Only valid actual observations take part in the join.
pub fn evaluate(actual: &Series, predicted: &AlignedPrediction) -> Result<ForecastAccuracy> {
    let pairs = join_on_date(actual, predicted);
    if pairs.is_empty() {
        return Err(ForecastError::InvalidInput(format!(
            "Actual series ({} observations) and prediction ({} values) share no dates",
            actual.len(),
            predicted.len()
        )));
    }

    let n = pairs.len() as f64;
    let errors: Vec<f64> = pairs.iter().map(|(a, p)| a - p).collect();

    // Mean Absolute Error
    let mae = errors.iter().map(|e| e.abs()).sum::<f64>() / n;

    // Mean Squared Error
    let mse = errors.iter().map(|e| e.powi(2)).sum::<f64>() / n;

    // Root Mean Squared Error
    let rmse = mse.sqrt();

    // Mean Absolute Percentage Error, skipping zero actuals
    let nonzero: Vec<(f64, f64)> = pairs
        .iter()
        .zip(errors.iter())
        .filter(|((a, _), _)| *a != 0.0)
        .map(|((a, _), e)| (*a, *e))
        .collect();
    let mape = if nonzero.is_empty() {
        f64::NAN
    } else {
        nonzero
            .iter()
            .map(|(a, e)| (e.abs() / a.abs()) * 100.0)
            .sum::<f64>()
            / nonzero.len() as f64
    };

    Ok(ForecastAccuracy {
        matched: pairs.len(),
        mae,
        mse,
        rmse,
        mape,
    })
}

fn join_on_date(actual: &Series, predicted: &AlignedPrediction) -> Vec<(f64, f64)> {
    predicted
        .points()
        .iter()
        .filter_map(|point| actual.close_on(point.date).map(|a| (a, point.predicted)))
        .collect()
}

/// Forecast accuracy metrics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastAccuracy {
    /// Number of date-matched pairs
    pub matched: usize,
    /// Mean Absolute Error
    pub mae: f64,
    /// Mean Squared Error
    pub mse: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Mean Absolute Percentage Error
    pub mape: f64,
}

impl std::fmt::Display for ForecastAccuracy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Forecast Accuracy Metrics ({} matched dates):", self.matched)?;
        writeln!(f, "  MAE:   {:.4}", self.mae)?;
        writeln!(f, "  MSE:   {:.4}", self.mse)?;
        writeln!(f, "  RMSE:  {:.4}", self.rmse)?;
        writeln!(f, "  MAPE:  {:.4}%", self.mape)?;
        Ok(())
    }
}
