//! Daily price series

use crate::error::{ForecastError, Result};
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// A single daily close observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Trading date
    pub date: NaiveDate,
    /// Closing price
    pub close: f64,
    /// False when the close is missing or NaN
    pub valid: bool,
}

impl PricePoint {
    /// Create an observation; non-finite closes are marked invalid
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self {
            date,
            close,
            valid: close.is_finite(),
        }
    }

    /// Create a placeholder for a date with no observed close
    pub fn missing(date: NaiveDate) -> Self {
        Self {
            date,
            close: f64::NAN,
            valid: false,
        }
    }
}

/// Ordered daily closes for one symbol
///
/// Dates are strictly increasing. Gaps (weekends, holidays) are expected.
/// A `Series` is never mutated once built; every transformation returns a
/// new one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    /// Ticker symbol
    symbol: String,
    /// Observations in date order
    points: Vec<PricePoint>,
}

impl Series {
    /// Create a series, rejecting unordered or duplicate dates
    ///
    /// Points with a non-finite close are stored as missing whatever their
    /// `valid` flag says.
    pub fn new(symbol: impl Into<String>, mut points: Vec<PricePoint>) -> Result<Self> {
        for point in &mut points {
            point.valid &= point.close.is_finite();
        }


        if let Some(pos) = points.windows(2).position(|w| w[0].date >= w[1].date) {
            return Err(ForecastError::InvalidInput(format!(
                "Series dates must be strictly increasing: {} is followed by {}",
                points[pos].date,
                points[pos + 1].date
            )));
        }

        Ok(Self {
            symbol: symbol.into(),
            points,
        })
    }

    /// An empty series for a symbol
    pub fn empty(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            points: Vec::new(),
        }
    }

    /// Build a series of consecutive calendar days starting at `start`
    pub fn from_daily_closes(
        symbol: impl Into<String>,
        start: NaiveDate,
        closes: &[f64],
    ) -> Result<Self> {
        let points = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| {
                start
                    .checked_add_days(Days::new(i as u64))
                    .map(|date| PricePoint::new(date, close))
                    .ok_or_else(|| {
                        ForecastError::InvalidInput(format!(
                            "Date overflow {} days after {}",
                            i, start
                        ))
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        Self::new(symbol, points)
    }

    /// Ticker symbol
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// All observations
    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    /// Observation at an index
    pub fn get(&self, index: usize) -> Option<&PricePoint> {
        self.points.get(index)
    }

    /// Number of observations
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the series is empty
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Observation dates in order
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    /// Closing prices in order, including invalid placeholders
    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.close).collect()
    }

    /// First observation date
    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    /// Last observation date
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }

    /// Number of invalid observations
    pub fn missing_count(&self) -> usize {
        self.points.iter().filter(|p| !p.valid).count()
    }

    /// Copy of the series holding only valid observations
    pub fn without_missing(&self) -> Self {
        Self {
            symbol: self.symbol.clone(),
            points: self.points.iter().filter(|p| p.valid).copied().collect(),
        }
    }

    /// The last `n` observations (all of them if `n >= len`)
    pub fn tail(&self, n: usize) -> Self {
        let start = self.points.len().saturating_sub(n);
        self.slice(start, self.points.len())
    }

    /// Observations in `[start, end)`; bounds are clamped to the series
    pub fn slice(&self, start: usize, end: usize) -> Self {
        let end = end.min(self.points.len());
        let start = start.min(end);
        Self {
            symbol: self.symbol.clone(),
            points: self.points[start..end].to_vec(),
        }
    }

    /// Valid close on a given date, if observed
    pub fn close_on(&self, date: NaiveDate) -> Option<f64> {
        self.points
            .binary_search_by_key(&date, |p| p.date)
            .ok()
            .map(|i| &self.points[i])
            .filter(|p| p.valid)
            .map(|p| p.close)
    }
}
