//! Train/test splitting and date alignment of model output
//!
//! Predictions come out of a model as bare values. Dates are attached here
//! by position, anchored to the tail of the *full* series: a windowed model
//! may spend part of the test period as input context and emit fewer values
//! than there are test observations, so pairing against the head of the test
//! split would shift every date.

use crate::data::Series;
use crate::error::{ForecastError, Result};
use crate::models::{ForecastResult, Prediction};
use crate::utils::{future_dates, Frequency};
use chrono::NaiveDate;
use serde::Serialize;

/// Leading training portion and trailing test portion of a series
#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    train: Series,
    test: Series,
}

impl Split {
    /// Training prefix
    pub fn train(&self) -> &Series {
        &self.train
    }

    /// Test suffix
    pub fn test(&self) -> &Series {
        &self.test
    }

    /// Index of the first test observation in the original series
    pub fn split_index(&self) -> usize {
        self.train.len()
    }

    /// Consume the split
    pub fn into_parts(self) -> (Series, Series) {
        (self.train, self.test)
    }
}

/// Split a series at `floor(len * train_fraction)`
pub fn split(series: &Series, train_fraction: f64) -> Result<Split> {
    let len = series.len();
    if len < 2 {
        return Err(ForecastError::InvalidInput(format!(
            "Cannot split a series of {} observations; at least 2 are required",
            len
        )));
    }

    if !(train_fraction > 0.0 && train_fraction < 1.0) {
        return Err(ForecastError::InvalidInput(format!(
            "Train fraction must be strictly between 0 and 1, got {}",
            train_fraction
        )));
    }

    let split_index = (len as f64 * train_fraction).floor() as usize;
    if split_index == 0 || split_index >= len {
        return Err(ForecastError::InvalidInput(format!(
            "Train fraction {} leaves an empty partition for {} observations",
            train_fraction, len
        )));
    }

    Ok(Split {
        train: series.slice(0, split_index),
        test: series.slice(split_index, len),
    })
}

/// A predicted value attached to a calendar date
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AlignedPoint {
    pub date: NaiveDate,
    pub predicted: f64,
}

/// Prediction values paired with the dates of the series tail
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignedPrediction {
    /// Model that produced the values
    model: String,
    /// Index in the full series of the first aligned date
    anchor: usize,
    points: Vec<AlignedPoint>,
}

impl AlignedPrediction {
    /// Name of the producing model
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Anchor offset into the full series
    pub fn anchor(&self) -> usize {
        self.anchor
    }

    /// Dated predictions in order
    pub fn points(&self) -> &[AlignedPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Dates in order
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    /// Predicted values in order
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.predicted).collect()
    }
}

/// Attach dates to a prediction: `prediction[i]` gets the date at
/// `full.len() - prediction.len() + i`
pub fn align_to_dates(full: &Series, prediction: &Prediction) -> Result<AlignedPrediction> {
    if prediction.len() > full.len() {
        return Err(ForecastError::InvalidInput(format!(
            "Prediction has {} values but the series only has {} observations",
            prediction.len(),
            full.len()
        )));
    }

    let anchor = full.len() - prediction.len();
    let points = full.points()[anchor..]
        .iter()
        .zip(prediction.values())
        .map(|(point, &predicted)| AlignedPoint {
            date: point.date,
            predicted,
        })
        .collect();

    Ok(AlignedPrediction {
        model: prediction.model().to_string(),
        anchor,
        points,
    })
}

/// A forecast value past the end of the observed series
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub predicted: f64,
    pub lower: Option<f64>,
    pub upper: Option<f64>,
}

/// Dated out-of-sample forecast
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FutureForecast {
    model: String,
    confidence: Option<f64>,
    points: Vec<ForecastPoint>,
}

impl FutureForecast {
    /// Date a forecast using generated dates after `last_date`
    pub fn from_result(
        model: impl Into<String>,
        result: &ForecastResult,
        last_date: NaiveDate,
        frequency: Frequency,
        confidence: Option<f64>,
    ) -> Result<Self> {
        let dates = future_dates(last_date, result.horizons(), frequency)?;
        let intervals = result.intervals();

        let points = dates
            .into_iter()
            .zip(result.values())
            .enumerate()
            .map(|(i, (date, &predicted))| ForecastPoint {
                date,
                predicted,
                lower: intervals.map(|iv| iv[i].0),
                upper: intervals.map(|iv| iv[i].1),
            })
            .collect();

        Ok(Self {
            model: model.into(),
            confidence,
            points,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Confidence level of the interval bounds, if any
    pub fn confidence(&self) -> Option<f64> {
        self.confidence
    }

    pub fn points(&self) -> &[ForecastPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
