//! # Stock Predict
//!
//! `stock_predict` fetches daily stock closes, fits a forecasting model on
//! the leading part of the history and scores its predictions against the
//! real closes of the trailing part, dated by the series itself.
//!
//! ## Example
//!
//! ```
//! use stock_predict::pipeline::data::Series;
//! use stock_predict::pipeline::models::{ArimaModel, ForecastModel, TrainedForecastModel};
//! use stock_predict::pipeline::{align_to_dates, score, split};
//! use chrono::NaiveDate;
//!
//! let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
//! let closes: Vec<f64> = (0..30).map(|i| 100.0 + 2.0 * i as f64).collect();
//! let series = Series::from_daily_closes("AAPL", start, &closes).unwrap();
//!
//! let split = split(&series, 0.8).unwrap();
//! let trained = ArimaModel::new(1, 1, 0).fit(split.train()).unwrap();
//! let prediction = trained.predict(split.test().len()).unwrap();
//!
//! let aligned = align_to_dates(&series, &prediction).unwrap();
//! assert_eq!(aligned.dates().last(), series.last_date().as_ref());
//! assert!(score(split.test(), &aligned).unwrap() < 1e-6);
//! ```

/// Series, models, sources and the forecast pipeline
pub use forecast_pipeline as pipeline;

/// Numeric kernels
pub use forecast_math as math;

pub use forecast_pipeline::{
    ForecastError, ForecastPipeline, PipelineConfig, PipelineReport, Result, Series,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
