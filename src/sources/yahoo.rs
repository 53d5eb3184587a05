use crate::models::price::{DailyBar, PriceSeries};
use crate::errors::{Result, StatsError};
use crate::sources::base::PriceSource;
use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone};
use chrono_tz::Tz;
use log::{debug, info, warn};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

const CHART_URL: &str = "https://query2.finance.yahoo.com/v8/finance/chart";

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    meta: Option<ChartMeta>,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    exchange_timezone_name: Option<String>,
    long_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    open: Option<Vec<Option<f64>>>,
    high: Option<Vec<Option<f64>>>,
    low: Option<Vec<Option<f64>>>,
    close: Option<Vec<Option<f64>>>,
    volume: Option<Vec<Option<i64>>>,
}

fn value_at<T: Copy>(values: &Option<Vec<Option<T>>>, i: usize) -> Option<T> {
    values.as_ref().and_then(|v| v.get(i).copied().flatten())
}

/// Yahoo Finance daily history over the v8 chart API
pub struct YahooSource {
    client: Client,
    request_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl YahooSource {
    pub fn with_request_interval(request_interval: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36")
            .build()
            .map_err(StatsError::RequestError)?;

        Ok(Self {
            client,
            request_interval,
            last_request: Mutex::new(None),
        })
    }

    async fn wait_for_rate_limit(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(time) = *last {
            let elapsed = time.elapsed();
            if elapsed < self.request_interval {
                let wait_time = self.request_interval - elapsed;
                debug!("Waiting {:?} before next Yahoo request", wait_time);
                tokio::time::sleep(wait_time).await;
            }
        }

        *last = Some(Instant::now());
    }

    fn chart_url(symbol: &str, start: &NaiveDate, end: &NaiveDate) -> String {
        let start_ts = start.and_hms_opt(0, 0, 0).map(|t| t.and_utc().timestamp()).unwrap_or(0);
        let end_ts = end.and_hms_opt(0, 0, 0).map(|t| t.and_utc().timestamp()).unwrap_or(0);
        format!(
            "{}/{}?period1={}&period2={}&interval=1d&events=history",
            CHART_URL, symbol, start_ts, end_ts
        )
    }

    /// Turn a chart response into a series. Timestamps are converted to dates in
    /// the exchange's own timezone; rows without a close are holidays and skipped.
    fn parse_response(
        symbol: &str,
        resp: ChartResponse,
        start: &NaiveDate,
        end: &NaiveDate,
    ) -> Result<PriceSeries> {
        let data = match resp.chart.result.and_then(|r| r.into_iter().next()) {
            Some(data) => data,
            None => {
                return match resp.chart.error {
                    Some(err) if err.code == "Not Found" => {
                        info!("Yahoo has no symbol {}", symbol);
                        Ok(PriceSeries::new(symbol, Vec::new()))
                    }
                    Some(err) => Err(StatsError::DataError(format!(
                        "Yahoo chart error for {}: {}: {}",
                        symbol, err.code, err.description
                    ))),
                    None => Ok(PriceSeries::new(symbol, Vec::new())),
                };
            }
        };

        let tz: Tz = data
            .meta
            .as_ref()
            .and_then(|m| m.exchange_timezone_name.as_deref())
            .and_then(|name| name.parse().ok())
            .unwrap_or(chrono_tz::America::New_York);
        let name = data
            .meta
            .as_ref()
            .and_then(|m| m.long_name.clone())
            .unwrap_or_else(|| symbol.to_string());

        let timestamps = data.timestamp.unwrap_or_default();
        let quote = data
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| StatsError::DataError(format!("No quote data for {}", symbol)))?;

        let mut daily = Vec::with_capacity(timestamps.len());
        for (i, &ts) in timestamps.iter().enumerate() {
            let close = match value_at(&quote.close, i) {
                Some(c) => c,
                None => continue,
            };
            let date = match tz.timestamp_opt(ts, 0).single() {
                Some(dt) => dt.date_naive(),
                None => {
                    warn!("Skipping invalid timestamp {} for {}", ts, symbol);
                    continue;
                }
            };
            if date < *start || date >= *end {
                continue;
            }
            daily.push(DailyBar {
                date,
                open: value_at(&quote.open, i).unwrap_or(close),
                high: value_at(&quote.high, i).unwrap_or(close),
                low: value_at(&quote.low, i).unwrap_or(close),
                close,
                volume: value_at(&quote.volume, i).unwrap_or(0),
            });
        }

        daily.sort_by(|a, b| a.date.cmp(&b.date));

        Ok(PriceSeries::new(symbol, daily).with_name(&name))
    }
}

#[async_trait]
impl PriceSource for YahooSource {
    fn source_name(&self) -> &'static str {
        "yahoo"
    }

    async fn fetch_history(&self, symbol: &str, start: &NaiveDate, end: &NaiveDate) -> Result<PriceSeries> {
        info!("Fetching {} from {} to {}", symbol, start, end);

        self.wait_for_rate_limit().await;

        let response = self.client
            .get(Self::chart_url(symbol, start, end))
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            info!("Yahoo returned 404 for {}", symbol);
            return Ok(PriceSeries::new(symbol, Vec::new()));
        }
        if !status.is_success() {
            return Err(StatsError::DataError(format!(
                "Yahoo request for {} failed: HTTP status {}", symbol, status
            )));
        }

        let text = response.text().await?;
        let chart: ChartResponse = serde_json::from_str(&text)?;
        let series = Self::parse_response(symbol, chart, start, end)?;

        debug!("Got {} daily bars for {}", series.len(), symbol);
        Ok(series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    const SAMPLE: &str = r#"{
        "chart": {
            "result": [{
                "meta": {"exchangeTimezoneName": "America/New_York", "longName": "Microsoft Corporation"},
                "timestamp": [1704205800, 1704292200, 1704378600, 1704465000],
                "indicators": {"quote": [{
                    "open":   [373.86, 369.01, null, 368.97],
                    "high":   [375.90, 373.26, null, 372.06],
                    "low":    [366.77, 368.51, null, 366.50],
                    "close":  [370.87, 370.60, null, 367.75],
                    "volume": [25258600, 23083500, null, 20987000]
                }]}
            }],
            "error": null
        }
    }"#;

    #[test]
    fn test_parse_response_skips_null_closes() {
        let chart: ChartResponse = serde_json::from_str(SAMPLE).unwrap();
        let series = YahooSource::parse_response("MSFT", chart, &d(2024, 1, 1), &d(2024, 2, 1)).unwrap();
        assert_eq!(series.name, "Microsoft Corporation");
        assert_eq!(series.len(), 3);
        // 09:30 New York time stays on the trading date
        assert_eq!(series.first_date(), Some(d(2024, 1, 2)));
        assert_eq!(series.last_date(), Some(d(2024, 1, 5)));
        assert_eq!(series.last_close(), Some(367.75));
        assert_eq!(series.daily[0].volume, 25258600);
    }

    #[test]
    fn test_parse_response_respects_range() {
        let chart: ChartResponse = serde_json::from_str(SAMPLE).unwrap();
        let series = YahooSource::parse_response("MSFT", chart, &d(2024, 1, 3), &d(2024, 1, 5)).unwrap();
        assert_eq!(series.closes(), vec![370.60]);
    }

    #[test]
    fn test_not_found_is_empty_series() {
        let body = r#"{"chart": {"result": null, "error": {"code": "Not Found", "description": "No data found, symbol may be delisted"}}}"#;
        let chart: ChartResponse = serde_json::from_str(body).unwrap();
        let series = YahooSource::parse_response("XXXX", chart, &d(2024, 1, 1), &d(2024, 2, 1)).unwrap();
        assert!(series.is_empty());
    }

    #[test]
    fn test_other_chart_error_is_data_error() {
        let body = r#"{"chart": {"result": null, "error": {"code": "Bad Request", "description": "Invalid input"}}}"#;
        let chart: ChartResponse = serde_json::from_str(body).unwrap();
        let err = YahooSource::parse_response("MSFT", chart, &d(2024, 1, 1), &d(2024, 2, 1)).unwrap_err();
        assert!(matches!(err, StatsError::DataError(_)));
    }

    #[test]
    fn test_chart_url() {
        let url = YahooSource::chart_url("^GSPC", &d(1970, 1, 2), &d(1970, 1, 3));
        assert!(url.ends_with("/^GSPC?period1=86400&period2=172800&interval=1d&events=history"));
    }
}
