//! Utility functions for the forecast_pipeline crate

use crate::error::{ForecastError, Result};
use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Spacing of generated forecast dates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    /// Every calendar day
    Daily,
    /// Monday through Friday
    #[default]
    BusinessDaily,
    /// Every seven days
    Weekly,
}

impl FromStr for Frequency {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "daily" | "d" | "1d" => Ok(Frequency::Daily),
            "business" | "business_daily" | "b" => Ok(Frequency::BusinessDaily),
            "weekly" | "w" | "1w" => Ok(Frequency::Weekly),
            _ => Err(ForecastError::InvalidInput(format!(
                "Unsupported frequency: {}",
                s
            ))),
        }
    }
}

/// Create `horizon` dates following `last_date`
pub fn future_dates(last_date: NaiveDate, horizon: usize, frequency: Frequency) -> Result<Vec<NaiveDate>> {
    let mut dates = Vec::with_capacity(horizon);
    let mut current = last_date;

    let step = match frequency {
        Frequency::Daily | Frequency::BusinessDaily => Days::new(1),
        Frequency::Weekly => Days::new(7),
    };

    while dates.len() < horizon {
        current = current.checked_add_days(step).ok_or_else(|| {
            ForecastError::InvalidInput(format!("Date overflow after {}", current))
        })?;

        if frequency == Frequency::BusinessDaily
            && matches!(current.weekday(), Weekday::Sat | Weekday::Sun)
        {
            continue;
        }

        dates.push(current);
    }

    Ok(dates)
}

/// Parse a `YYYY-MM-DD` date, ignoring any trailing time component
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    let trimmed = s.trim();
    let day = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .map_err(|e| ForecastError::InvalidInput(format!("Invalid date '{}': {}", s, e)))
}
