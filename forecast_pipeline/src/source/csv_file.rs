//! Price history stored as one CSV file per symbol

use crate::data::{PricePoint, Series};
use crate::error::{ForecastError, Result};
use crate::source::{validate_request, SeriesSource};
use crate::utils::parse_date;
use chrono::NaiveDate;
use polars::prelude::{CsvReader, DataFrame, DataType, SerReader};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Reads `<dir>/<SYMBOL>.csv` files with a date column and a close column
#[derive(Debug, Clone)]
pub struct CsvSeriesSource {
    dir: PathBuf,
}

impl CsvSeriesSource {
    /// Create a source over a directory of CSV files
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the CSV files
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file for a symbol
    pub fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", symbol))
    }

    /// Load every row of a CSV file as a series
    pub fn load<P: AsRef<Path>>(path: P, symbol: &str) -> Result<Series> {
        let file = File::open(path.as_ref())?;
        let df = CsvReader::new(file)
            .infer_schema(None)
            .has_header(true)
            .finish()?;

        let date_column = Self::detect_date_column(&df)?;
        let close_column = Self::detect_close_column(&df)?;

        let mut points = Self::read_points(&df, &date_column, &close_column)?;
        points.sort_by_key(|p| p.date);

        Series::new(symbol, points)
    }

    /// Detect the date column in a DataFrame
    fn detect_date_column(df: &DataFrame) -> Result<String> {
        let column_names = df.get_column_names();

        // Look for common time column names
        for name in &column_names {
            let lower_name = name.to_lowercase();
            if lower_name.contains("date")
                || lower_name.contains("time")
                || lower_name.contains("timestamp")
            {
                return Ok(name.to_string());
            }
        }

        // If not found, use the first column if it looks like a date
        if let Some(first_col) = df.get_columns().first() {
            if first_col.dtype().is_temporal() {
                return Ok(first_col.name().to_string());
            }
        }

        Err(ForecastError::InvalidInput(
            "No date column found in data".to_string(),
        ))
    }

    /// Detect the close column, preferring raw closes over adjusted ones
    fn detect_close_column(df: &DataFrame) -> Result<String> {
        let column_names = df.get_column_names();

        if let Some(name) = column_names
            .iter()
            .find(|n| n.trim().eq_ignore_ascii_case("close"))
        {
            return Ok(name.to_string());
        }

        let candidates: [fn(&str) -> bool; 3] = [
            |n: &str| n.contains("close") && !n.contains("adj"),
            |n: &str| n.contains("close"),
            |n: &str| n.contains("price"),
        ];
        for matches in candidates {
            if let Some(name) = column_names
                .iter()
                .find(|n| matches(&n.to_lowercase()))
            {
                return Ok(name.to_string());
            }
        }

        Err(ForecastError::InvalidInput(
            "No close or price column found in data".to_string(),
        ))
    }

    /// Pair dates with closes; empty or unparsable closes become missing points
    fn read_points(df: &DataFrame, date_column: &str, close_column: &str) -> Result<Vec<PricePoint>> {
        let dates = df.column(date_column)?.cast(&DataType::Utf8)?;
        let closes = df.column(close_column)?.cast(&DataType::Float64)?;

        let mut points = Vec::with_capacity(df.height());
        let mut skipped = 0usize;

        for (date, close) in dates.utf8()?.into_iter().zip(closes.f64()?.into_iter()) {
            let Some(date) = date else {
                skipped += 1;
                continue;
            };
            let date = parse_date(date)?;
            points.push(match close {
                Some(close) => PricePoint::new(date, close),
                None => PricePoint::missing(date),
            });
        }

        if skipped > 0 {
            warn!(skipped, column = date_column, "rows without a date were skipped");
        }

        Ok(points)
    }
}

impl SeriesSource for CsvSeriesSource {
    fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<Series> {
        validate_request(symbol, start, end)?;

        let path = self.path_for(symbol);
        if !path.is_file() {
            return Err(ForecastError::SourceUnavailable(format!(
                "No price history for symbol {} at {}",
                symbol,
                path.display()
            )));
        }

        let series = Self::load(&path, symbol).map_err(|e| {
            ForecastError::SourceUnavailable(format!("Failed to load {}: {}", path.display(), e))
        })?;

        let in_range: Vec<PricePoint> = series
            .points()
            .iter()
            .filter(|p| p.date >= start && p.date < end)
            .copied()
            .collect();

        debug!(
            symbol,
            path = %path.display(),
            total = series.len(),
            in_range = in_range.len(),
            "loaded CSV price history"
        );

        Series::new(symbol, in_range)
    }
}
