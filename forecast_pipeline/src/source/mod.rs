//! Price history sources
//!
//! A source returns the daily closes of one symbol over `[start, end)`.
//! A symbol that exists but has nothing in range yields an empty series;
//! lookup and transport failures yield `SourceUnavailable`. Sources never
//! retry.

use crate::data::Series;
use crate::error::{ForecastError, Result};
use chrono::NaiveDate;

pub mod cache;
pub mod csv_file;
pub mod yahoo;

pub use self::cache::{CacheKey, CachedSource, SeriesCache};
pub use self::csv_file::CsvSeriesSource;
pub use self::yahoo::YahooChartSource;

/// Supplier of daily price history
pub trait SeriesSource {
    /// Fetch closes for `symbol` dated in `[start, end)`
    fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<Series>;
}

impl<S: SeriesSource + ?Sized> SeriesSource for &S {
    fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<Series> {
        (**self).fetch(symbol, start, end)
    }
}

impl<S: SeriesSource + ?Sized> SeriesSource for Box<S> {
    fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<Series> {
        (**self).fetch(symbol, start, end)
    }
}

/// Reject malformed symbols and inverted ranges
pub(crate) fn validate_request(symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<()> {
    let well_formed = !symbol.is_empty()
        && symbol
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '='));
    if !well_formed {
        return Err(ForecastError::InvalidInput(format!(
            "Invalid ticker symbol '{}'",
            symbol
        )));
    }

    if start > end {
        return Err(ForecastError::InvalidInput(format!(
            "Start date {} is after end date {}",
            start, end
        )));
    }

    Ok(())
}
