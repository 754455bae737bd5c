use chrono::NaiveDate;
use forecast_pipeline::source::{CsvSeriesSource, SeriesSource, YahooChartSource};
use forecast_pipeline::ForecastError;
use pretty_assertions::assert_eq;
use std::fs::File;
use std::io::Write;
use tempfile::TempDir;

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 1, d).unwrap()
}

fn data_dir() -> TempDir {
    let dir = TempDir::new().unwrap();

    let mut file = File::create(dir.path().join("AAPL.csv")).unwrap();
    writeln!(file, "Date,Open,High,Low,Close,Adj Close,Volume").unwrap();
    writeln!(file, "2023-01-03,130.2,130.9,124.1,125.07,124.2,112117500").unwrap();
    writeln!(file, "2023-01-04,126.8,128.6,125.0,,125.5,89113600").unwrap();
    writeln!(file, "2023-01-05,127.1,127.7,124.7,125.02,124.1,80962700").unwrap();
    writeln!(file, "2023-01-06,126.0,130.2,124.8,129.62,128.7,87754700").unwrap();
    writeln!(file, "2023-01-09,130.4,133.4,129.8,130.15,129.2,70790800").unwrap();

    let mut file = File::create(dir.path().join("MSFT.csv")).unwrap();
    writeln!(file, "date,price").unwrap();
    writeln!(file, "2023-01-04,229.1").unwrap();
    writeln!(file, "2023-01-03,239.5").unwrap();

    dir
}

#[test]
fn test_csv_source_reads_closes() {
    let dir = data_dir();
    let source = CsvSeriesSource::new(dir.path());

    let series = source.fetch("AAPL", day(1), day(31)).unwrap();

    assert_eq!(series.symbol(), "AAPL");
    assert_eq!(series.len(), 5);
    assert_eq!(series.first_date(), Some(day(3)));
    assert_eq!(series.last_date(), Some(day(9)));
    // Raw close, not the adjusted one
    assert_eq!(series.close_on(day(3)), Some(125.07));
}

#[test]
fn test_csv_source_marks_empty_cells_missing() {
    let dir = data_dir();
    let source = CsvSeriesSource::new(dir.path());

    let series = source.fetch("AAPL", day(1), day(31)).unwrap();

    assert_eq!(series.missing_count(), 1);
    assert!(!series.get(1).unwrap().valid);
    assert_eq!(series.close_on(day(4)), None);
    assert_eq!(series.without_missing().len(), 4);
}

#[test]
fn test_csv_source_range_is_half_open() {
    let dir = data_dir();
    let source = CsvSeriesSource::new(dir.path());

    let series = source.fetch("AAPL", day(4), day(9)).unwrap();
    assert_eq!(series.dates(), vec![day(4), day(5), day(6)]);

    let empty = source.fetch("AAPL", day(20), day(25)).unwrap();
    assert!(empty.is_empty());

    let same_day = source.fetch("AAPL", day(5), day(5)).unwrap();
    assert!(same_day.is_empty());
}

#[test]
fn test_csv_source_price_column_and_sorting() {
    let dir = data_dir();
    let source = CsvSeriesSource::new(dir.path());

    let series = source.fetch("MSFT", day(1), day(31)).unwrap();

    assert_eq!(series.dates(), vec![day(3), day(4)]);
    assert_eq!(series.closes(), vec![239.5, 229.1]);
}

#[test]
fn test_csv_source_errors() {
    let dir = data_dir();
    let source = CsvSeriesSource::new(dir.path());

    assert!(matches!(
        source.fetch("GME", day(1), day(31)),
        Err(ForecastError::SourceUnavailable(_))
    ));
    assert!(matches!(
        source.fetch("AAPL", day(9), day(1)),
        Err(ForecastError::InvalidInput(_))
    ));
    assert!(matches!(
        source.fetch("../AAPL", day(1), day(31)),
        Err(ForecastError::InvalidInput(_))
    ));
    assert!(matches!(
        source.fetch("", day(1), day(31)),
        Err(ForecastError::InvalidInput(_))
    ));
}

#[test]
fn test_csv_source_path_for() {
    let source = CsvSeriesSource::new("data");
    assert_eq!(source.path_for("AAPL"), std::path::Path::new("data").join("AAPL.csv"));
    assert_eq!(source.dir(), std::path::Path::new("data"));
}

#[test]
fn test_parse_chart_response() {
    let body = r#"{
        "chart": {
            "result": [{
                "meta": {"symbol": "AAPL", "currency": "USD"},
                "timestamp": [1672756200, 1672842600, 1672929000],
                "indicators": {"quote": [{"close": [125.07, null, 125.02], "open": [130.28, 126.89, 127.13]}]}
            }],
            "error": null
        }
    }"#;

    let series = YahooChartSource::parse_chart("AAPL", body).unwrap();

    assert_eq!(series.dates(), vec![day(3), day(4), day(5)]);
    assert_eq!(series.close_on(day(3)), Some(125.07));
    assert_eq!(series.missing_count(), 1);
}

#[test]
fn test_parse_chart_error_payload() {
    let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;

    match YahooChartSource::parse_chart("NOPE", body) {
        Err(ForecastError::SourceUnavailable(msg)) => assert!(msg.contains("delisted")),
        other => panic!("Expected SourceUnavailable, got {:?}", other),
    }
}

#[test]
fn test_parse_chart_without_result() {
    let body = r#"{"chart":{"result":[],"error":null}}"#;
    let series = YahooChartSource::parse_chart("AAPL", body).unwrap();
    assert!(series.is_empty());

    assert!(matches!(
        YahooChartSource::parse_chart("AAPL", "not json"),
        Err(ForecastError::SourceUnavailable(_))
    ));
}

#[test]
fn test_parse_chart_repeated_date_keeps_latest_bar() {
    // The trailing bar repeats 2023-01-03 after a bar for 2023-01-04
    let body = r#"{
        "chart": {
            "result": [{
                "timestamp": [1672756200, 1672842600, 1672761600],
                "indicators": {"quote": [{"close": [125.07, 126.36, 125.50]}]}
            }],
            "error": null
        }
    }"#;

    let series = YahooChartSource::parse_chart("AAPL", body).unwrap();

    assert_eq!(series.dates(), vec![day(3), day(4)]);
    assert_eq!(series.close_on(day(3)), Some(125.50));
    assert_eq!(series.close_on(day(4)), Some(126.36));
}
