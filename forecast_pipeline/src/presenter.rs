//! Output sinks for series, predictions and metrics

use crate::alignment::{AlignedPrediction, FutureForecast};
use crate::data::Series;
use crate::error::Result;
use crate::metrics::ForecastAccuracy;
use std::io::Write;

/// Receives labelled pipeline output
pub trait Presenter {
    /// Show observed closes
    fn present_series(&mut self, label: &str, series: &Series) -> Result<()>;

    /// Show date-aligned predictions
    fn present_prediction(&mut self, label: &str, prediction: &AlignedPrediction) -> Result<()>;

    /// Show a forecast past the last observation
    fn present_future(&mut self, label: &str, forecast: &FutureForecast) -> Result<()>;

    /// Show evaluation metrics
    fn present_accuracy(&mut self, label: &str, accuracy: &ForecastAccuracy) -> Result<()>;
}

/// Plain-text tables
#[derive(Debug)]
pub struct TablePresenter<W: Write> {
    out: W,
}

impl<W: Write> TablePresenter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

fn fmt_bound(bound: Option<f64>) -> String {
    bound.map(|b| format!("{:.4}", b)).unwrap_or_else(|| "-".to_string())
}

impl<W: Write> Presenter for TablePresenter<W> {
    fn present_series(&mut self, label: &str, series: &Series) -> Result<()> {
        writeln!(self.out, "== {} ({}, {} rows) ==", label, series.symbol(), series.len())?;
        writeln!(self.out, "{:<12} {:>14}", "date", "close")?;
        for point in series.points() {
            let close = if point.valid {
                format!("{:.4}", point.close)
            } else {
                "missing".to_string()
            };
            writeln!(self.out, "{:<12} {:>14}", point.date, close)?;
        }
        Ok(())
    }

    fn present_prediction(&mut self, label: &str, prediction: &AlignedPrediction) -> Result<()> {
        writeln!(
            self.out,
            "== {} ({}, {} rows from index {}) ==",
            label,
            prediction.model(),
            prediction.len(),
            prediction.anchor()
        )?;
        writeln!(self.out, "{:<12} {:>14}", "date", "predicted")?;
        for point in prediction.points() {
            writeln!(self.out, "{:<12} {:>14.4}", point.date, point.predicted)?;
        }
        Ok(())
    }

    fn present_future(&mut self, label: &str, forecast: &FutureForecast) -> Result<()> {
        writeln!(
            self.out,
            "== {} ({}, {} rows) ==",
            label,
            forecast.model(),
            forecast.len()
        )?;
        writeln!(
            self.out,
            "{:<12} {:>14} {:>14} {:>14}",
            "date", "predicted", "lower", "upper"
        )?;
        for point in forecast.points() {
            writeln!(
                self.out,
                "{:<12} {:>14.4} {:>14} {:>14}",
                point.date,
                point.predicted,
                fmt_bound(point.lower),
                fmt_bound(point.upper)
            )?;
        }
        Ok(())
    }

    fn present_accuracy(&mut self, label: &str, accuracy: &ForecastAccuracy) -> Result<()> {
        writeln!(self.out, "== {} ==", label)?;
        write!(self.out, "{}", accuracy)?;
        Ok(())
    }
}

/// CSV rows of `label,date,value,lower,upper`
#[derive(Debug)]
pub struct CsvPresenter<W: Write> {
    writer: csv::Writer<W>,
    header_written: bool,
}

impl<W: Write> CsvPresenter<W> {
    pub fn new(out: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(out),
            header_written: false,
        }
    }

    fn row(&mut self, label: &str, date: &str, value: &str, lower: &str, upper: &str) -> Result<()> {
        if !self.header_written {
            self.writer
                .write_record(["label", "date", "value", "lower", "upper"])?;
            self.header_written = true;
        }
        self.writer.write_record([label, date, value, lower, upper])?;
        Ok(())
    }

    /// Flush buffered rows to the underlying writer
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

impl<W: Write> Presenter for CsvPresenter<W> {
    fn present_series(&mut self, label: &str, series: &Series) -> Result<()> {
        for point in series.points() {
            let value = if point.valid {
                point.close.to_string()
            } else {
                String::new()
            };
            self.row(label, &point.date.to_string(), &value, "", "")?;
        }
        Ok(())
    }

    fn present_prediction(&mut self, label: &str, prediction: &AlignedPrediction) -> Result<()> {
        for point in prediction.points() {
            self.row(label, &point.date.to_string(), &point.predicted.to_string(), "", "")?;
        }
        Ok(())
    }

    fn present_future(&mut self, label: &str, forecast: &FutureForecast) -> Result<()> {
        for point in forecast.points() {
            let lower = point.lower.map(|b| b.to_string()).unwrap_or_default();
            let upper = point.upper.map(|b| b.to_string()).unwrap_or_default();
            self.row(
                label,
                &point.date.to_string(),
                &point.predicted.to_string(),
                &lower,
                &upper,
            )?;
        }
        Ok(())
    }

    fn present_accuracy(&mut self, label: &str, accuracy: &ForecastAccuracy) -> Result<()> {
        let metrics = [
            ("mae", accuracy.mae),
            ("mse", accuracy.mse),
            ("rmse", accuracy.rmse),
            ("mape", accuracy.mape),
        ];
        for (name, value) in metrics {
            self.row(&format!("{}:{}", label, name), "", &value.to_string(), "", "")?;
        }
        Ok(())
    }
}
