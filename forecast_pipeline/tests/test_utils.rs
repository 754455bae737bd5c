use chrono::NaiveDate;
use forecast_pipeline::utils::{future_dates, parse_date, Frequency};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[rstest]
#[case("2023-01-15", date(2023, 1, 15))]
#[case(" 2023-01-15 ", date(2023, 1, 15))]
#[case("2023-01-15 00:00:00", date(2023, 1, 15))]
#[case("2023-01-15T16:00:00-05:00", date(2023, 1, 15))]
fn test_parse_date(#[case] input: &str, #[case] expected: NaiveDate) {
    assert_eq!(parse_date(input).unwrap(), expected);
}

#[test]
fn test_parse_date_rejects_garbage() {
    assert!(parse_date("15/01/2023").is_err());
    assert!(parse_date("").is_err());
}

#[test]
fn test_future_dates_business_days() {
    // Thursday
    let dates = future_dates(date(2023, 1, 5), 4, Frequency::BusinessDaily).unwrap();
    assert_eq!(
        dates,
        vec![date(2023, 1, 6), date(2023, 1, 9), date(2023, 1, 10), date(2023, 1, 11)]
    );
}

#[test]
fn test_future_dates_calendar_and_weekly() {
    let daily = future_dates(date(2023, 12, 30), 3, Frequency::Daily).unwrap();
    assert_eq!(daily, vec![date(2023, 12, 31), date(2024, 1, 1), date(2024, 1, 2)]);

    let weekly = future_dates(date(2023, 1, 5), 2, Frequency::Weekly).unwrap();
    assert_eq!(weekly, vec![date(2023, 1, 12), date(2023, 1, 19)]);

    assert!(future_dates(date(2023, 1, 5), 0, Frequency::Daily).unwrap().is_empty());
}

#[test]
fn test_frequency_from_str() {
    assert_eq!("daily".parse::<Frequency>().unwrap(), Frequency::Daily);
    assert_eq!("b".parse::<Frequency>().unwrap(), Frequency::BusinessDaily);
    assert_eq!("weekly".parse::<Frequency>().unwrap(), Frequency::Weekly);
    assert!("hourly".parse::<Frequency>().is_err());
    assert_eq!(Frequency::default(), Frequency::BusinessDaily);
}
