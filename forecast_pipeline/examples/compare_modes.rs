//! Recursive vs walk-forward forecasts for both model families

use chrono::NaiveDate;
use forecast_pipeline::config::{ForecastMode, PipelineConfig};
use forecast_pipeline::data::Series;
use forecast_pipeline::models::{ArimaModel, ForecastModel, LstmConfig, LstmModel};
use forecast_pipeline::pipeline::ForecastPipeline;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Forecast Pipeline: Recursive vs Walk-Forward");
    println!("============================================\n");

    let series = create_sample_daily_data()?;

    let arima = ArimaModel::default();
    let lstm = LstmModel::new(LstmConfig {
        window_size: 20,
        hidden_size: 16,
        epochs: 10,
        ..LstmConfig::default()
    })?;

    for mode in [ForecastMode::Recursive, ForecastMode::WalkForward] {
        let pipeline = ForecastPipeline::new(PipelineConfig {
            mode,
            forecast_years: 0,
            end: Some(NaiveDate::from_ymd_opt(2024, 1, 1).ok_or("invalid end date")?),
            ..PipelineConfig::default()
        })?;

        println!("Mode: {:?}", mode);
        compare(&pipeline, &series, &arima)?;
        compare(&pipeline, &series, &lstm)?;
        println!();
    }

    Ok(())
}

fn compare<M>(
    pipeline: &ForecastPipeline,
    series: &Series,
    model: &M,
) -> Result<(), Box<dyn std::error::Error>>
where
    M: ForecastModel + Send + 'static,
{
    let report = pipeline.evaluate_series(series, model)?;
    println!(
        "  {:<28} values {:>4}  first date {}  RMSE {:>8.4}  MAPE {:>6.2}%",
        report.model,
        report.prediction.len(),
        report
            .aligned
            .dates()
            .first()
            .map(|d| d.to_string())
            .unwrap_or_default(),
        report.accuracy.rmse,
        report.accuracy.mape
    );
    Ok(())
}

fn create_sample_daily_data() -> Result<Series, Box<dyn std::error::Error>> {
    let start = NaiveDate::from_ymd_opt(2022, 1, 3).ok_or("invalid start date")?;

    let closes: Vec<f64> = (0..400)
        .map(|i| {
            let t = i as f64;
            80.0 + 0.1 * t + 4.0 * (t / 15.0).sin() + ((i * 31) % 17) as f64 * 0.1
        })
        .collect();

    Ok(Series::from_daily_closes("MSFT", start, &closes)?)
}
