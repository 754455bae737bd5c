//! # Forecast Pipeline
//!
//! A Rust library for forecasting daily stock closes and scoring the
//! forecasts against real calendar dates.
//!
//! ## Features
//!
//! - Daily price series with explicit missing observations
//! - Train/test splitting and tail-anchored date alignment
//! - Forecasting models (ARIMA, LSTM) behind one pair of traits
//! - Accuracy metrics over a date join (MAE, MSE, RMSE, MAPE)
//! - Price history from CSV files or the Yahoo chart endpoint, with a TTL cache
//! - Text and CSV presenters
//!
//! ## Alignment
//!
//! A windowed model spends its first `window_size` test observations as
//! input and returns fewer values than there are test dates. Predictions
//! are therefore dated from the tail of the full series:
//!
//! ```text
//! anchor = full.len() - prediction.len()
//! prediction[i]  ->  full[anchor + i].date
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use forecast_pipeline::models::{ArimaModel, ForecastModel, TrainedForecastModel};
//! use forecast_pipeline::source::{CsvSeriesSource, SeriesSource};
//! use forecast_pipeline::{align_to_dates, score, split};
//! use chrono::NaiveDate;
//!
//! # fn main() -> forecast_pipeline::error::Result<()> {
//! let source = CsvSeriesSource::new("data");
//! let start = NaiveDate::from_ymd_opt(2015, 1, 1).unwrap();
//! let end = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//! let series = source.fetch("AAPL", start, end)?.without_missing();
//!
//! let split = split(&series, 0.8)?;
//! let trained = ArimaModel::new(5, 1, 0).fit(split.train())?;
//! let prediction = trained.walk_forward(&split.test().closes())?;
//!
//! let aligned = align_to_dates(&series, &prediction)?;
//! println!("MSE: {:.4}", score(split.test(), &aligned)?);
//! # Ok(())
//! # }
//! ```

pub mod alignment;
pub mod config;
pub mod data;
pub mod error;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod presenter;
pub mod source;
pub mod utils;

// Re-export commonly used types
pub use crate::alignment::{align_to_dates, split, AlignedPrediction, FutureForecast, Split};
pub use crate::config::{ForecastMode, ModelConfig, PipelineConfig};
pub use crate::data::{PricePoint, Series};
pub use crate::error::{ForecastError, Result};
pub use crate::metrics::{evaluate, score, ForecastAccuracy};
pub use crate::models::{ForecastModel, ForecastResult, Prediction, TrainedForecastModel};
pub use crate::pipeline::{fit_in_background, run_configured, ForecastPipeline, PipelineReport};
pub use crate::presenter::{CsvPresenter, Presenter, TablePresenter};
pub use crate::source::SeriesSource;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
