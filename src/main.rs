//! Stock forecast CLI
//!
//! # Usage
//!
//! ```bash
//! # ARIMA(5,1,0) on data/AAPL.csv, recursive forecast of the test period
//! stock-predict run --symbol AAPL
//!
//! # LSTM with one-step-ahead predictions, straight from Yahoo
//! stock-predict run --symbol MSFT --source yahoo --model lstm --window 60 --mode walk-forward
//!
//! # Settings from a file, CSV output
//! stock-predict --config forecast.toml run --output csv
//!
//! # Last rows of the raw series
//! stock-predict raw --symbol GME --rows 10
//! ```

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::info;

use stock_predict::pipeline::config::{ForecastMode, ModelConfig, PipelineConfig, SourceKind};
use stock_predict::pipeline::models::{ArimaOrder, LstmConfig};
use stock_predict::pipeline::{
    run_configured, AlignedPrediction, CsvPresenter, ForecastAccuracy, ForecastPipeline,
    FutureForecast, Presenter, Series, TablePresenter,
};

/// Forecast daily stock closes and score the forecasts
#[derive(Parser)]
#[command(name = "stock-predict", version)]
#[command(about = "Forecast daily stock closes and score the forecasts against real dates")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML configuration file; flags override its values
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Split, fit, predict, align and score
    Run {
        #[command(flatten)]
        series: SeriesArgs,

        #[command(flatten)]
        model: ModelArgs,

        /// How the test period is predicted
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,

        /// Years to forecast past the last observation (0-4)
        #[arg(long)]
        years: Option<u32>,

        /// Share of observations used for training
        #[arg(long)]
        train_fraction: Option<f64>,

        /// Confidence level of the future forecast bounds
        #[arg(long)]
        confidence: Option<f64>,

        #[arg(long, value_enum, default_value_t = Output::Table)]
        output: Output,
    },

    /// Print the most recent observations of a series
    Raw {
        #[command(flatten)]
        series: SeriesArgs,

        /// Number of rows
        #[arg(long, default_value_t = 5)]
        rows: usize,

        #[arg(long, value_enum, default_value_t = Output::Table)]
        output: Output,
    },
}

#[derive(Args)]
struct SeriesArgs {
    /// Ticker symbol (offered: AAPL, GOOG, MSFT, GME)
    #[arg(long)]
    symbol: Option<String>,

    /// Start date (YYYY-MM-DD)
    #[arg(long)]
    start: Option<NaiveDate>,

    /// End date, exclusive (YYYY-MM-DD); defaults to today
    #[arg(long)]
    end: Option<NaiveDate>,

    /// Where price history comes from
    #[arg(long, value_enum)]
    source: Option<SourceArg>,

    /// Directory of <SYMBOL>.csv files
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

#[derive(Args)]
struct ModelArgs {
    /// Model family
    #[arg(long, value_enum)]
    model: Option<ModelArg>,

    /// ARIMA order as p,d,q
    #[arg(long)]
    order: Option<ArimaOrder>,

    /// LSTM look-back window
    #[arg(long)]
    window: Option<usize>,

    /// LSTM hidden units
    #[arg(long)]
    hidden: Option<usize>,

    /// LSTM training epochs
    #[arg(long)]
    epochs: Option<usize>,

    /// LSTM learning rate
    #[arg(long)]
    learning_rate: Option<f64>,

    /// LSTM random seed
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Clone, Copy, ValueEnum)]
enum SourceArg {
    Csv,
    Yahoo,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModelArg {
    Arima,
    Lstm,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Recursive,
    WalkForward,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Output {
    Table,
    Csv,
    Json,
}

impl SeriesArgs {
    fn apply(&self, config: &mut PipelineConfig) {
        if let Some(symbol) = &self.symbol {
            config.symbol = symbol.to_uppercase();
        }
        if let Some(start) = self.start {
            config.start = start;
        }
        if self.end.is_some() {
            config.end = self.end;
        }
        if let Some(source) = self.source {
            config.source.kind = match source {
                SourceArg::Csv => SourceKind::Csv,
                SourceArg::Yahoo => SourceKind::Yahoo,
            };
        }
        if let Some(dir) = &self.data_dir {
            config.source.data_dir = dir.clone();
        }
    }
}

impl ModelArgs {
    fn apply(&self, model: &mut ModelConfig) {
        let kind = self.model.unwrap_or(match model {
            ModelConfig::Arima(_) => ModelArg::Arima,
            ModelConfig::Lstm(_) => ModelArg::Lstm,
        });

        *model = match kind {
            ModelArg::Arima => {
                let current = match model {
                    ModelConfig::Arima(order) => *order,
                    ModelConfig::Lstm(_) => ArimaOrder::default(),
                };
                ModelConfig::Arima(self.order.unwrap_or(current))
            }
            ModelArg::Lstm => {
                let mut lstm = match model {
                    ModelConfig::Lstm(lstm) => *lstm,
                    ModelConfig::Arima(_) => LstmConfig::default(),
                };
                if let Some(window) = self.window {
                    lstm.window_size = window;
                }
                if let Some(hidden) = self.hidden {
                    lstm.hidden_size = hidden;
                }
                if let Some(epochs) = self.epochs {
                    lstm.epochs = epochs;
                }
                if let Some(rate) = self.learning_rate {
                    lstm.learning_rate = rate;
                }
                if let Some(seed) = self.seed {
                    lstm.seed = seed;
                }
                ModelConfig::Lstm(lstm)
            }
        };
    }
}

/// Discards presented output; used when the report is written as JSON
struct Silent;

impl Presenter for Silent {
    fn present_series(&mut self, _: &str, _: &Series) -> stock_predict::Result<()> {
        Ok(())
    }

    fn present_prediction(&mut self, _: &str, _: &AlignedPrediction) -> stock_predict::Result<()> {
        Ok(())
    }

    fn present_future(&mut self, _: &str, _: &FutureForecast) -> stock_predict::Result<()> {
        Ok(())
    }

    fn present_accuracy(&mut self, _: &str, _: &ForecastAccuracy) -> stock_predict::Result<()> {
        Ok(())
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<PipelineConfig> {
    match path {
        Some(path) => PipelineConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        None => Ok(PipelineConfig::default()),
    }
}

fn cmd_run(config: PipelineConfig, output: Output) -> Result<()> {
    let source = config.source.build().context("Failed to set up the price source")?;
    info!(symbol = %config.symbol, model = ?config.model, mode = ?config.mode, "starting run");

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match output {
        Output::Table => {
            let mut presenter = TablePresenter::new(&mut out);
            run_configured(config, &source, &mut presenter)?;
        }
        Output::Csv => {
            let mut presenter = CsvPresenter::new(&mut out);
            run_configured(config, &source, &mut presenter)?;
            presenter.flush()?;
        }
        Output::Json => {
            let report = run_configured(config, &source, &mut Silent)?;
            serde_json::to_writer_pretty(&mut out, &report)?;
            writeln!(out)?;
        }
    }

    Ok(())
}

fn cmd_raw(config: PipelineConfig, rows: usize, output: Output) -> Result<()> {
    let source = config.source.build().context("Failed to set up the price source")?;
    let pipeline = ForecastPipeline::new(config)?;
    let tail = pipeline.fetch_tail(&source, rows)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match output {
        Output::Table => TablePresenter::new(&mut out).present_series("raw", &tail)?,
        Output::Csv => {
            let mut presenter = CsvPresenter::new(&mut out);
            presenter.present_series("raw", &tail)?;
            presenter.flush()?;
        }
        Output::Json => {
            serde_json::to_writer_pretty(&mut out, &tail)?;
            writeln!(out)?;
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    // Logs go to stderr so that CSV and JSON output stay clean
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("forecast_pipeline=info".parse()?),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Run {
            series,
            model,
            mode,
            years,
            train_fraction,
            confidence,
            output,
        } => {
            series.apply(&mut config);
            model.apply(&mut config.model);
            if let Some(mode) = mode {
                config.mode = match mode {
                    ModeArg::Recursive => ForecastMode::Recursive,
                    ModeArg::WalkForward => ForecastMode::WalkForward,
                };
            }
            if let Some(years) = years {
                config.forecast_years = years;
            }
            if let Some(fraction) = train_fraction {
                config.train_fraction = fraction;
            }
            if let Some(confidence) = confidence {
                config.confidence = confidence;
            }

            cmd_run(config, output)?;
        }
        Commands::Raw {
            series,
            rows,
            output,
        } => {
            series.apply(&mut config);
            cmd_raw(config, rows, output)?;
        }
    }

    Ok(())
}
