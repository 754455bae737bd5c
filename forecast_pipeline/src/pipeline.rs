//! End-to-end forecast runs
//!
//! fetch -> drop missing -> split -> fit -> predict -> align -> evaluate ->
//! present, followed by an optional forecast past the last observation.
//! Any failing stage aborts the run; no partial report is returned.

use crate::alignment::{align_to_dates, split, AlignedPrediction, FutureForecast};
use crate::config::{ForecastMode, ModelConfig, PipelineConfig};
use crate::data::Series;
use crate::error::{ForecastError, Result};
use crate::metrics::{evaluate, ForecastAccuracy};
use crate::models::{ArimaModel, ForecastModel, LstmModel, Prediction, TrainedForecastModel};
use crate::presenter::Presenter;
use crate::source::SeriesSource;
use serde::Serialize;
use std::thread::{self, JoinHandle};
use tracing::{info, warn};

/// Everything a run produced
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineReport {
    pub symbol: String,
    pub model: String,
    pub mode: ForecastMode,
    /// Observations after missing points were dropped
    pub observations: usize,
    /// Missing observations removed before splitting
    pub dropped_missing: usize,
    /// Index of the first test observation
    pub split_index: usize,
    /// Test split of the cleaned series
    pub actual: Series,
    /// Raw model output over the test period
    pub prediction: Prediction,
    /// Prediction dated against the tail of the series
    pub aligned: AlignedPrediction,
    pub accuracy: ForecastAccuracy,
    pub future: Option<FutureForecast>,
}

/// Fit a model on a worker thread
///
/// The worker owns its copy of the training series; the trained model is
/// handed back through the join handle.
pub fn fit_in_background<M>(model: M, train: Series) -> JoinHandle<Result<M::Trained>>
where
    M: ForecastModel + Send + 'static,
    M::Trained: 'static,
{
    thread::spawn(move || model.fit(&train))
}

fn join_fit<T>(handle: JoinHandle<Result<T>>, model: &str) -> Result<T> {
    handle
        .join()
        .map_err(|_| ForecastError::ModelFit(format!("{} fit thread panicked", model)))?
}

/// Runs the forecast stages for one configuration
#[derive(Debug, Clone)]
pub struct ForecastPipeline {
    config: PipelineConfig,
}

impl ForecastPipeline {
    /// Create a pipeline, validating the configuration
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Fetch the configured series and keep its last `n` observations
    pub fn fetch_tail<S>(&self, source: &S, n: usize) -> Result<Series>
    where
        S: SeriesSource + ?Sized,
    {
        let series = self.fetch(source)?;
        Ok(series.tail(n))
    }

    fn fetch<S>(&self, source: &S) -> Result<Series>
    where
        S: SeriesSource + ?Sized,
    {
        let config = &self.config;
        let end = config.end_date();
        info!(symbol = %config.symbol, start = %config.start, %end, "fetching series");

        let series = source.fetch(&config.symbol, config.start, end)?;
        info!(symbol = %config.symbol, observations = series.len(), "fetched series");
        Ok(series)
    }

    /// Fetch, evaluate and present
    pub fn run<M, S, P>(&self, source: &S, model: &M, presenter: &mut P) -> Result<PipelineReport>
    where
        M: ForecastModel + Send + 'static,
        M::Trained: 'static,
        S: SeriesSource + ?Sized,
        P: Presenter + ?Sized,
    {
        let series = self.fetch(source)?;
        let report = self.evaluate_series(&series, model)?;

        presenter.present_series("actual", &report.actual)?;
        presenter.present_prediction("predicted", &report.aligned)?;
        presenter.present_accuracy("accuracy", &report.accuracy)?;
        if let Some(future) = &report.future {
            presenter.present_future("forecast", future)?;
        }

        info!(symbol = %report.symbol, "run complete");
        Ok(report)
    }

    /// Every stage after fetching, without any IO
    pub fn evaluate_series<M>(&self, series: &Series, model: &M) -> Result<PipelineReport>
    where
        M: ForecastModel + Send + 'static,
        M::Trained: 'static,
    {
        let config = &self.config;

        let dropped_missing = series.missing_count();
        let clean = if config.drop_missing && dropped_missing > 0 {
            warn!(
                symbol = series.symbol(),
                missing = dropped_missing,
                "dropping missing observations"
            );
            series.without_missing()
        } else {
            series.clone()
        };
        let dropped_missing = if config.drop_missing { dropped_missing } else { 0 };

        if clean.is_empty() {
            return Err(ForecastError::InvalidInput(format!(
                "No observations for {} between {} and {}",
                config.symbol,
                config.start,
                config.end_date()
            )));
        }

        let split = split(&clean, config.train_fraction)?;
        info!(
            train = split.train().len(),
            test = split.test().len(),
            split_index = split.split_index(),
            "split series"
        );

        let trained = model.fit(split.train())?;
        info!(model = model.name(), "fitted on training split");

        // Refit on the full series for the future forecast while the test
        // period is predicted
        let future_fit = (config.forecast_years > 0)
            .then(|| fit_in_background(model.clone(), clean.clone()));

        let test = split.test();
        let prediction = match config.mode {
            ForecastMode::Recursive => trained.predict(test.len())?,
            ForecastMode::WalkForward => trained.walk_forward(&test.closes())?,
        };
        info!(mode = ?config.mode, values = prediction.len(), "predicted test period");

        let aligned = align_to_dates(&clean, &prediction)?;
        let accuracy = evaluate(test, &aligned)?;
        info!(
            matched = accuracy.matched,
            mse = accuracy.mse,
            rmse = accuracy.rmse,
            "evaluated prediction"
        );

        let future = match future_fit {
            Some(handle) => {
                let full = join_fit(handle, model.name())?;
                let horizon = config.horizon_days();
                let result = full.predict_with_intervals(horizon, config.confidence)?;
                let last_date = clean.last_date().ok_or_else(|| {
                    ForecastError::InvalidInput("Series has no last date".to_string())
                })?;
                let forecast = FutureForecast::from_result(
                    full.name(),
                    &result,
                    last_date,
                    config.frequency,
                    Some(config.confidence),
                )?;
                info!(horizon, from = %last_date, "forecast past last observation");
                Some(forecast)
            }
            None => None,
        };

        Ok(PipelineReport {
            symbol: clean.symbol().to_string(),
            model: trained.name().to_string(),
            mode: config.mode,
            observations: clean.len(),
            dropped_missing,
            split_index: split.split_index(),
            actual: test.clone(),
            prediction,
            aligned,
            accuracy,
            future,
        })
    }
}

/// Build the configured model and run it
pub fn run_configured<S, P>(config: PipelineConfig, source: &S, presenter: &mut P) -> Result<PipelineReport>
where
    S: SeriesSource + ?Sized,
    P: Presenter + ?Sized,
{
    let model_config = config.model;
    let pipeline = ForecastPipeline::new(config)?;

    match model_config {
        ModelConfig::Arima(order) => {
            pipeline.run(source, &ArimaModel::with_order(order), presenter)
        }
        ModelConfig::Lstm(lstm) => pipeline.run(source, &LstmModel::new(lstm)?, presenter),
    }
}
