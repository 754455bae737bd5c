use chrono::NaiveDate;
use forecast_pipeline::data::Series;
use forecast_pipeline::models::{ArimaModel, ForecastModel, TrainedForecastModel};
use forecast_pipeline::utils::Frequency;
use forecast_pipeline::{align_to_dates, evaluate, split, FutureForecast};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Forecast Pipeline: Basic Forecasting Example");
    println!("============================================\n");

    // Create sample data
    println!("Creating sample data...");
    let series = create_sample_daily_data()?;
    println!(
        "Sample data created: {} daily points from {} to {}\n",
        series.len(),
        series.first_date().ok_or("empty series")?,
        series.last_date().ok_or("empty series")?
    );

    // Hold out the last 20% for evaluation
    let split = split(&series, 0.8)?;
    println!(
        "Train: {} points, test: {} points\n",
        split.train().len(),
        split.test().len()
    );

    println!("Training model...");
    let model = ArimaModel::new(2, 1, 0);
    let trained = model.fit(split.train())?;
    println!("{} trained\n", trained.name());

    // Forecast the test period from the end of training
    let prediction = trained.predict(split.test().len())?;
    let aligned = align_to_dates(&series, &prediction)?;

    println!("Last five test-period predictions:");
    for point in aligned.points().iter().rev().take(5).rev() {
        let actual = series.close_on(point.date).unwrap_or(f64::NAN);
        println!(
            "  {}: predicted {:.2}, actual {:.2}",
            point.date, point.predicted, actual
        );
    }

    let accuracy = evaluate(split.test(), &aligned)?;
    println!("\n{}", accuracy);

    // Refit on everything and look past the last observation
    let full = model.fit(&series)?;
    let result = full.predict_with_intervals(10, 0.95)?;
    let last_date = series.last_date().ok_or("empty series")?;
    let future = FutureForecast::from_result(
        full.name(),
        &result,
        last_date,
        Frequency::BusinessDaily,
        Some(0.95),
    )?;

    println!("Next 10 business days (95% interval):");
    for point in future.points() {
        println!(
            "  {}: {:.2} ({:.2}, {:.2})",
            point.date,
            point.predicted,
            point.lower.unwrap_or(f64::NAN),
            point.upper.unwrap_or(f64::NAN)
        );
    }

    Ok(())
}

fn create_sample_daily_data() -> Result<Series, Box<dyn std::error::Error>> {
    let start = NaiveDate::from_ymd_opt(2023, 1, 1).ok_or("invalid start date")?;

    // Trend with a weekly-ish cycle
    let closes: Vec<f64> = (0..200)
        .map(|i| {
            let t = i as f64;
            150.0 + 0.25 * t + 3.0 * (t / 7.0).sin() + 1.5 * (t / 3.0).cos()
        })
        .collect();

    Ok(Series::from_daily_closes("AAPL", start, &closes)?)
}
