use forecast_math::MathError;
use forecast_pipeline::ForecastError;
use std::io;

#[test]
fn test_error_conversion() {
    // Test IO error conversion
    let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
    let forecast_error = ForecastError::from(io_error);

    match forecast_error {
        ForecastError::Io(_) => {}
        _ => panic!("Expected Io variant"),
    }

    // Numeric failures become fit errors, bad arguments stay bad arguments
    let singular = ForecastError::from(MathError::CalculationError("singular".to_string()));
    assert!(matches!(singular, ForecastError::ModelFit(_)));

    let short = ForecastError::from(MathError::InsufficientData("too short".to_string()));
    assert!(matches!(short, ForecastError::ModelFit(_)));

    let invalid = ForecastError::from(MathError::InvalidInput("mismatch".to_string()));
    assert!(matches!(invalid, ForecastError::InvalidInput(_)));
}

#[test]
fn test_toml_error_conversion() {
    let toml_error = toml::from_str::<toml::Table>("= broken").unwrap_err();
    let forecast_error = ForecastError::from(toml_error);

    assert!(matches!(forecast_error, ForecastError::Config(_)));
}

#[test]
fn test_error_display() {
    let error = ForecastError::ModelFit("needs at least 11 training observations".to_string());
    let error_string = format!("{}", error);
    assert!(error_string.contains("Model fit error"));
    assert!(error_string.contains("at least 11"));

    let error = ForecastError::SourceUnavailable("HTTP 404".to_string());
    assert!(format!("{}", error).contains("Source unavailable"));

    // Test with source error
    let io_error = io::Error::new(io::ErrorKind::PermissionDenied, "permission denied");
    let error = ForecastError::from(io_error);
    let error_string = format!("{}", error);

    assert!(error_string.contains("IO error"));
    assert!(error_string.contains("permission denied"));
}
