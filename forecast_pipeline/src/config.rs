//! Pipeline configuration loaded from TOML
//!
//! Every field has a default, so a file only needs the values it changes.
//! Dates are written as quoted `YYYY-MM-DD` strings.

use crate::error::{ForecastError, Result};
use crate::models::{ArimaOrder, LstmConfig, LstmModel};
use crate::source::{CachedSource, CsvSeriesSource, SeriesCache, SeriesSource, YahooChartSource};
use crate::utils::Frequency;
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

/// Tickers offered by default
pub const SUPPORTED_SYMBOLS: [&str; 4] = ["AAPL", "GOOG", "MSFT", "GME"];

/// Longest future forecast, in years
pub const MAX_FORECAST_YEARS: u32 = 4;

/// How predictions over the test period are produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecastMode {
    /// Forecast the whole test period from the end of training
    #[default]
    Recursive,
    /// One-step-ahead forecasts conditioned on the real test values
    WalkForward,
}

impl std::str::FromStr for ForecastMode {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "recursive" => Ok(ForecastMode::Recursive),
            "walk_forward" | "walk-forward" => Ok(ForecastMode::WalkForward),
            _ => Err(ForecastError::InvalidInput(format!(
                "Unsupported forecast mode: {}",
                s
            ))),
        }
    }
}

/// Model family and its parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ModelConfig {
    Arima(ArimaOrder),
    Lstm(LstmConfig),
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig::Arima(ArimaOrder::default())
    }
}

/// Where price history comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// `<data_dir>/<SYMBOL>.csv`
    #[default]
    Csv,
    /// Yahoo Finance chart endpoint
    Yahoo,
}

/// Series source settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub kind: SourceKind,
    /// Directory of CSV files
    pub data_dir: PathBuf,
    /// Cache lifetime of a fetched series; 0 disables caching
    pub cache_ttl_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: SourceKind::Csv,
            data_dir: PathBuf::from("data"),
            cache_ttl_secs: 3600,
        }
    }
}

impl SourceConfig {
    /// Build the configured source behind a TTL cache
    pub fn build(&self) -> Result<CachedSource<Box<dyn SeriesSource + Send + Sync>>> {
        let inner: Box<dyn SeriesSource + Send + Sync> = match self.kind {
            SourceKind::Csv => Box::new(CsvSeriesSource::new(&self.data_dir)),
            SourceKind::Yahoo => Box::new(YahooChartSource::new()?),
        };
        let cache = SeriesCache::new(Duration::from_secs(self.cache_ttl_secs));
        Ok(CachedSource::new(inner, cache))
    }
}

/// Settings for one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Ticker symbol
    pub symbol: String,
    /// First requested date (inclusive)
    pub start: NaiveDate,
    /// Requested end date (exclusive); today when absent
    pub end: Option<NaiveDate>,
    /// Share of observations used for training
    pub train_fraction: f64,
    pub mode: ForecastMode,
    pub model: ModelConfig,
    /// Drop missing observations before splitting
    pub drop_missing: bool,
    /// Years to forecast past the last observation; 0 disables
    pub forecast_years: u32,
    /// Spacing of future forecast dates
    pub frequency: Frequency,
    /// Confidence level of future forecast bounds
    pub confidence: f64,
    pub source: SourceConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            symbol: SUPPORTED_SYMBOLS[0].to_string(),
            start: NaiveDate::from_ymd_opt(2015, 1, 1).unwrap_or(NaiveDate::MIN),
            end: None,
            train_fraction: 0.8,
            mode: ForecastMode::Recursive,
            model: ModelConfig::default(),
            drop_missing: true,
            forecast_years: 1,
            frequency: Frequency::BusinessDaily,
            confidence: 0.95,
            source: SourceConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Parse a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: PipelineConfig = toml::from_str(content)?;
        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.symbol.trim().is_empty() {
            return Err(ForecastError::Config("Symbol must not be empty".to_string()));
        }
        if !SUPPORTED_SYMBOLS.contains(&self.symbol.as_str()) {
            warn!(symbol = %self.symbol, "symbol is not one of the offered tickers");
        }

        if !(self.train_fraction > 0.0 && self.train_fraction < 1.0) {
            return Err(ForecastError::Config(format!(
                "train_fraction must be strictly between 0 and 1, got {}",
                self.train_fraction
            )));
        }

        let end = self.end_date();
        if self.start >= end {
            return Err(ForecastError::Config(format!(
                "start {} must be before end {}",
                self.start, end
            )));
        }

        if self.forecast_years > MAX_FORECAST_YEARS {
            return Err(ForecastError::Config(format!(
                "forecast_years must be at most {}, got {}",
                MAX_FORECAST_YEARS, self.forecast_years
            )));
        }

        if !(self.confidence > 0.0 && self.confidence < 1.0) {
            return Err(ForecastError::Config(format!(
                "confidence must be strictly between 0 and 1, got {}",
                self.confidence
            )));
        }

        if let ModelConfig::Lstm(lstm) = self.model {
            LstmModel::new(lstm).map_err(|e| ForecastError::Config(e.to_string()))?;
        }

        Ok(())
    }

    /// Resolved exclusive end date
    pub fn end_date(&self) -> NaiveDate {
        self.end.unwrap_or_else(|| Local::now().date_naive())
    }

    /// Future forecast length in calendar-year days
    pub fn horizon_days(&self) -> usize {
        self.forecast_years as usize * 365
    }
}
