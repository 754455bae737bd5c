use approx::assert_relative_eq;
use chrono::NaiveDate;
use forecast_pipeline::data::{PricePoint, Series};
use forecast_pipeline::models::Prediction;
use forecast_pipeline::{align_to_dates, evaluate, score, split, ForecastError};

fn sequential(len: usize) -> Series {
    let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
    let closes: Vec<f64> = (0..len).map(|i| 100.0 + i as f64).collect();
    Series::from_daily_closes("AAPL", start, &closes).unwrap()
}

#[test]
fn test_score_scenario_c() {
    let series = sequential(10);
    let split = split(&series, 0.8).unwrap();
    let aligned = align_to_dates(&series, &Prediction::new("test", vec![107.5, 108.7])).unwrap();

    let mse = score(split.test(), &aligned).unwrap();
    assert_relative_eq!(mse, 0.17, epsilon = 1e-9);
}

#[test]
fn test_regression_metrics() {
    let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
    let actual = Series::from_daily_closes("AAPL", start, &[10.0, 20.0, 30.0, 40.0, 50.0]).unwrap();
    let aligned = align_to_dates(
        &actual,
        &Prediction::new("test", vec![12.0, 18.0, 33.0, 37.0, 52.0]),
    )
    .unwrap();

    let accuracy = evaluate(&actual, &aligned).unwrap();

    assert_eq!(accuracy.matched, 5);
    assert_relative_eq!(accuracy.mae, 2.4, epsilon = 1e-9);
    assert_relative_eq!(accuracy.mse, 6.0, epsilon = 1e-9);
    assert_relative_eq!(accuracy.rmse, 6.0_f64.sqrt(), epsilon = 1e-9);
    assert!(accuracy.mape > 0.0 && accuracy.mape < 15.0);

    let report = format!("{}", accuracy);
    assert!(report.contains("MSE"));
    assert!(report.contains("5 matched dates"));
}

#[test]
fn test_join_is_by_date() {
    // Prediction covers the last 3 dates, the actual series only the last 2
    let full = sequential(10);
    let aligned = align_to_dates(&full, &Prediction::new("test", vec![0.0, 108.0, 109.0])).unwrap();
    let actual = full.tail(2);

    let accuracy = evaluate(&actual, &aligned).unwrap();

    assert_eq!(accuracy.matched, 2);
    assert_relative_eq!(accuracy.mse, 0.0);
}

#[test]
fn test_missing_actuals_are_skipped() {
    let day = |d| NaiveDate::from_ymd_opt(2023, 1, d).unwrap();
    let actual = Series::new(
        "AAPL",
        vec![
            PricePoint::new(day(2), 10.0),
            PricePoint::missing(day(3)),
            PricePoint::new(day(4), 12.0),
        ],
    )
    .unwrap();
    let aligned = align_to_dates(&actual, &Prediction::new("test", vec![11.0, 99.0, 13.0])).unwrap();

    let accuracy = evaluate(&actual, &aligned).unwrap();

    assert_eq!(accuracy.matched, 2);
    assert_relative_eq!(accuracy.mse, 1.0);
}

#[test]
fn test_zero_actuals_skip_mape() {
    let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
    let actual = Series::from_daily_closes("AAPL", start, &[0.0, 0.0]).unwrap();
    let aligned = align_to_dates(&actual, &Prediction::new("test", vec![1.0, 1.0])).unwrap();

    let accuracy = evaluate(&actual, &aligned).unwrap();

    assert_relative_eq!(accuracy.mse, 1.0);
    assert!(accuracy.mape.is_nan());
}

#[test]
fn test_score_disjoint_dates() {
    let full = sequential(10);
    let aligned = align_to_dates(&full, &Prediction::new("test", vec![1.0, 2.0])).unwrap();
    // Actual covers only the first three dates
    let actual = full.slice(0, 3);

    let result = score(&actual, &aligned);
    assert!(matches!(result, Err(ForecastError::InvalidInput(_))));
}
