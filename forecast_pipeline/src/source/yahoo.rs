//! Daily closes from the Yahoo Finance chart endpoint

use crate::data::{PricePoint, Series};
use crate::error::{ForecastError, Result};
use crate::source::{validate_request, SeriesSource};
use chrono::{DateTime, NaiveDate, NaiveTime};
use reqwest::blocking::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

/// Default API host
pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

/// Blocking client for `/v8/finance/chart/{symbol}`
#[derive(Debug, Clone)]
pub struct YahooChartSource {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

impl YahooChartSource {
    /// Create a source against the public API host
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Create a source against another host (mirrors, local fixtures)
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("stock-predict/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ForecastError::SourceUnavailable(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Parse a chart response body into a series
    ///
    /// Null closes become missing points. When the API repeats a trading
    /// date the later bar wins.
    pub fn parse_chart(symbol: &str, body: &str) -> Result<Series> {
        let envelope: ChartEnvelope = serde_json::from_str(body).map_err(|e| {
            ForecastError::SourceUnavailable(format!("Malformed chart response for {}: {}", symbol, e))
        })?;

        if let Some(error) = envelope.chart.error {
            return Err(ForecastError::SourceUnavailable(format!(
                "Chart lookup for {} failed ({}): {}",
                symbol, error.code, error.description
            )));
        }

        let Some(result) = envelope.chart.result.and_then(|r| r.into_iter().next()) else {
            return Ok(Series::empty(symbol));
        };

        let closes = result
            .indicators
            .quote
            .into_iter()
            .next()
            .map(|q| q.close)
            .unwrap_or_default();

        let mut points: Vec<PricePoint> = Vec::with_capacity(result.timestamp.len());
        for (i, &ts) in result.timestamp.iter().enumerate() {
            let date = DateTime::from_timestamp(ts, 0)
                .ok_or_else(|| {
                    ForecastError::SourceUnavailable(format!("Timestamp {} out of range", ts))
                })?
                .date_naive();

            let point = match closes.get(i).copied().flatten() {
                Some(close) => PricePoint::new(date, close),
                None => PricePoint::missing(date),
            };

            points.push(point);
        }

        // Stable sort of the reversed bars puts the latest bar for a date first
        points.reverse();
        points.sort_by_key(|p| p.date);
        points.dedup_by_key(|p| p.date);
        Series::new(symbol, points)
    }
}

fn unix_seconds(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp()
}

impl SeriesSource for YahooChartSource {
    fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<Series> {
        validate_request(symbol, start, end)?;
        if start == end {
            return Ok(Series::empty(symbol));
        }

        let url = format!("{}/v8/finance/chart/{}", self.base_url, symbol);
        info!(symbol, %start, %end, "requesting chart history");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("period1", unix_seconds(start).to_string()),
                ("period2", unix_seconds(end).to_string()),
                ("interval", "1d".to_string()),
                ("events", "history".to_string()),
            ])
            .send()
            .map_err(|e| ForecastError::SourceUnavailable(format!("Request to {} failed: {}", url, e)))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| ForecastError::SourceUnavailable(format!("Reading {} failed: {}", url, e)))?;

        // Lookup errors come back as JSON with a non-success status
        if !status.is_success() {
            let detail = match Self::parse_chart(symbol, &body) {
                Err(e) => e.to_string(),
                Ok(_) => "no error payload".to_string(),
            };
            return Err(ForecastError::SourceUnavailable(format!(
                "HTTP {} from {}: {}",
                status, url, detail
            )));
        }

        let series = Self::parse_chart(symbol, &body)?;

        let in_range: Vec<PricePoint> = series
            .points()
            .iter()
            .filter(|p| p.date >= start && p.date < end)
            .copied()
            .collect();
        debug!(symbol, observations = in_range.len(), "parsed chart history");

        Series::new(symbol, in_range)
    }
}
