use approx::assert_relative_eq;
use chrono::NaiveDate;
use forecast_pipeline::data::{PricePoint, Series};
use forecast_pipeline::models::{
    ArimaModel, ArimaOrder, ForecastModel, LstmConfig, LstmModel, TrainedForecastModel,
};
use forecast_pipeline::{split, ForecastError};
use pretty_assertions::assert_eq;

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 1, 2).unwrap()
}

fn series_from(closes: &[f64]) -> Series {
    Series::from_daily_closes("AAPL", start(), closes).unwrap()
}

fn linear_trend(len: usize) -> Vec<f64> {
    (0..len).map(|i| 100.0 + 2.0 * i as f64).collect()
}

// Deterministic wiggle around a slow trend
fn noisy_trend(len: usize) -> Vec<f64> {
    (0..len)
        .map(|i| {
            let noise = ((i * 7919) % 101) as f64 / 101.0 - 0.5;
            50.0 + 0.3 * i as f64 + 2.0 * (i as f64 / 5.0).sin() + noise
        })
        .collect()
}

fn small_lstm(window_size: usize) -> LstmModel {
    LstmModel::new(LstmConfig {
        window_size,
        hidden_size: 4,
        epochs: 3,
        learning_rate: 0.01,
        batch_size: 8,
        seed: 7,
    })
    .unwrap()
}

#[test]
fn test_arima_continues_linear_trend() {
    let series = series_from(&linear_trend(30));
    let model = ArimaModel::new(1, 1, 0);

    let trained = model.fit(&series).unwrap();
    assert_relative_eq!(trained.ar_coefficients()[0], 1.0, epsilon = 1e-8);

    let prediction = trained.predict(3).unwrap();
    assert_eq!(prediction.len(), 3);
    assert_eq!(prediction.model(), "ARIMA(1,1,0)");

    let last = 100.0 + 2.0 * 29.0;
    for (k, value) in prediction.values().iter().enumerate() {
        assert_relative_eq!(*value, last + 2.0 * (k + 1) as f64, epsilon = 1e-6);
    }
}

#[test]
fn test_arima_walk_forward_uses_real_values() {
    let closes = linear_trend(40);
    let series = series_from(&closes);
    let split = split(&series, 0.75).unwrap();
    let trained = ArimaModel::new(1, 1, 0).fit(split.train()).unwrap();

    let held_out = split.test().closes();
    let prediction = trained.walk_forward(&held_out).unwrap();

    assert_eq!(prediction.len(), held_out.len());
    for (predicted, actual) in prediction.values().iter().zip(held_out.iter()) {
        assert_relative_eq!(*predicted, *actual, epsilon = 1e-6);
    }
}

#[test]
fn test_arima_with_moving_average_terms() {
    let series = series_from(&noisy_trend(120));
    let model = ArimaModel::new(1, 0, 1);
    assert!(series.len() >= model.min_training_len());

    let trained = model.fit(&series).unwrap();

    assert_eq!(trained.order(), ArimaOrder { p: 1, d: 0, q: 1 });
    assert_eq!(trained.ar_coefficients().len(), 1);
    assert_eq!(trained.ma_coefficients().len(), 1);
    assert!(trained.sigma2().is_finite() && trained.sigma2() > 0.0);
    assert!(trained.predict(10).unwrap().values().iter().all(|v| v.is_finite()));
}

#[test]
fn test_arima_intervals_widen() {
    let series = series_from(&noisy_trend(80));
    let trained = ArimaModel::default().fit(&series).unwrap();

    let result = trained.predict_with_intervals(20, 0.95).unwrap();
    let intervals = result.intervals().unwrap();

    assert_eq!(result.horizons(), 20);
    assert_eq!(intervals.len(), 20);
    let mut previous_width = 0.0;
    for (value, (lower, upper)) in result.values().iter().zip(intervals.iter()) {
        assert!(lower <= value && value <= upper);
        let width = upper - lower;
        assert!(width >= previous_width);
        previous_width = width;
    }

    assert!(matches!(
        trained.predict_with_intervals(5, 1.5),
        Err(ForecastError::InvalidInput(_))
    ));
}

#[test]
fn test_arima_insufficient_data() {
    let model = ArimaModel::default();
    assert_eq!(model.order(), ArimaOrder { p: 5, d: 1, q: 0 });
    assert_eq!(model.min_training_len(), 12);

    let result = model.fit(&series_from(&[100.0, 101.0, 102.0, 103.0, 104.0]));
    match result {
        Err(ForecastError::ModelFit(msg)) => assert!(msg.contains("12")),
        other => panic!("Expected ModelFit, got {:?}", other),
    }
}

#[test]
fn test_fit_rejects_missing_points() {
    let mut points: Vec<PricePoint> = series_from(&linear_trend(20)).points().to_vec();
    points[10] = PricePoint::missing(points[10].date);
    let series = Series::new("AAPL", points).unwrap();

    assert!(matches!(
        ArimaModel::new(1, 1, 0).fit(&series),
        Err(ForecastError::ModelFit(_))
    ));
    assert!(matches!(small_lstm(3).fit(&series), Err(ForecastError::ModelFit(_))));
}

#[test]
fn test_arima_order_parsing() {
    let order: ArimaOrder = "2, 1, 1".parse().unwrap();
    assert_eq!(order, ArimaOrder { p: 2, d: 1, q: 1 });
    assert_eq!(order.to_string(), "(2,1,1)");

    assert!("5,1".parse::<ArimaOrder>().is_err());
    assert!("a,b,c".parse::<ArimaOrder>().is_err());
    assert!("1,2,3,4".parse::<ArimaOrder>().is_err());
}

#[test]
fn test_lstm_scenario_d() {
    let model = LstmModel::new(LstmConfig {
        window_size: 10,
        ..LstmConfig::default()
    })
    .unwrap();
    assert_eq!(model.min_training_len(), 11);

    let result = model.fit(&series_from(&[1.0, 2.0, 3.0, 4.0, 5.0]));
    match result {
        Err(ForecastError::ModelFit(msg)) => assert!(msg.contains("11")),
        other => panic!("Expected ModelFit, got {:?}", other),
    }
}

#[test]
fn test_lstm_walk_forward_length() {
    let series = series_from(&noisy_trend(60));
    let split = split(&series, 0.8).unwrap();
    let trained = small_lstm(5).fit(split.train()).unwrap();

    let held_out = split.test().closes();
    assert_eq!(held_out.len(), 12);

    let prediction = trained.walk_forward(&held_out).unwrap();
    assert_eq!(prediction.len(), held_out.len() - 5);
    assert!(prediction.values().iter().all(|v| v.is_finite()));

    assert!(matches!(
        trained.walk_forward(&held_out[..5]),
        Err(ForecastError::InvalidInput(_))
    ));
}

#[test]
fn test_lstm_recursive_rollout() {
    let series = series_from(&noisy_trend(50));
    let trained = small_lstm(5).fit(&series).unwrap();

    let prediction = trained.predict(15).unwrap();
    assert_eq!(prediction.len(), 15);
    assert!(prediction.values().iter().all(|v| v.is_finite()));
    assert!(trained.final_loss().is_finite());

    let result = trained.predict_with_intervals(15, 0.9).unwrap();
    assert_eq!(result.values(), prediction.values());
}

#[test]
fn test_lstm_scaler_frozen_on_train() {
    let closes = noisy_trend(60);
    let series = series_from(&closes);
    let split = split(&series, 0.8).unwrap();
    let trained = small_lstm(5).fit(split.train()).unwrap();

    let train = split.train().closes();
    let train_min = train.iter().cloned().fold(f64::INFINITY, f64::min);
    let train_max = train.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    assert_relative_eq!(trained.scaler().min(), train_min);
    assert_relative_eq!(trained.scaler().max(), train_max);

    // Test values above the training range stay above 1 once scaled
    let test_max = split
        .test()
        .closes()
        .into_iter()
        .fold(f64::NEG_INFINITY, f64::max);
    assert!(test_max > train_max);
    assert!(trained.scaler().transform(test_max) > 1.0);
}

#[test]
fn test_lstm_is_deterministic() {
    let series = series_from(&noisy_trend(40));
    let first = small_lstm(4).fit(&series).unwrap().predict(5).unwrap();
    let second = small_lstm(4).fit(&series).unwrap().predict(5).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_lstm_rejects_bad_config() {
    let zero_window = LstmModel::new(LstmConfig {
        window_size: 0,
        ..LstmConfig::default()
    });
    assert!(matches!(zero_window, Err(ForecastError::InvalidInput(_))));

    let bad_rate = LstmModel::new(LstmConfig {
        learning_rate: f64::NAN,
        ..LstmConfig::default()
    });
    assert!(matches!(bad_rate, Err(ForecastError::InvalidInput(_))));
}
