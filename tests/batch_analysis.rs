// End-to-end runs of the analysis service over in-memory price data.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use market_returns::data_provider::PriceDataProvider;
use market_returns::report;
use market_returns::sources::base::PriceSource;
use market_returns::{AnalysisService, Config, PriceSeries, ReturnCategory, StatsError};
use std::sync::Arc;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

/// Weekday closes from `from`, each one `step` above the previous.
fn weekday_series(symbol: &str, from: NaiveDate, days: usize, first: f64, step: f64) -> PriceSeries {
    let mut points = Vec::with_capacity(days);
    let mut date = from;
    let mut close = first;
    while points.len() < days {
        if !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            points.push((date, close));
            close += step;
        }
        date += Duration::days(1);
    }
    PriceSeries::from_closes(symbol, &points)
}

fn service(data: Vec<PriceSeries>) -> AnalysisService {
    let local: Arc<dyn PriceSource + Send + Sync> = Arc::new(PriceDataProvider::new_with_data(data));
    AnalysisService::new(Config::new(), vec![local])
}

#[tokio::test]
async fn batch_skips_instrument_without_data() {
    let service = service(vec![
        weekday_series("TSLA", d(2024, 1, 1), 60, 250.0, -1.0),
        weekday_series("MSFT", d(2024, 1, 1), 60, 370.0, 0.5),
    ]);
    let tickers = vec!["TSLA".to_string(), "PLTR".to_string(), "MSFT".to_string()];

    let outcome = service.analyze_stocks(&tickers, &d(2024, 1, 1), &d(2024, 6, 1)).await;

    let analyzed: Vec<&str> = outcome.reports.iter().map(|r| r.stats.ticker.as_str()).collect();
    assert_eq!(analyzed, vec!["TSLA", "MSFT"]);
    assert_eq!(outcome.skipped.len(), 1);
    assert_eq!(outcome.skipped[0].ticker, "PLTR");

    let tsla = &outcome.reports[0].stats;
    assert_eq!(tsla.up_weeks, 0);
    assert_eq!(tsla.down_weeks, tsla.total_weeks);
    assert_eq!(tsla.avg_up_pct, 0.0);

    let msft = &outcome.reports[1].stats;
    assert_eq!(msft.down_weeks, 0);
    assert_eq!(msft.current_price, 370.0 + 59.0 * 0.5);
}

#[tokio::test]
async fn single_stock_without_data_is_recoverable() {
    let service = service(Vec::new());
    let err = service.analyze_stock("PLTR", &d(2024, 1, 1), &d(2024, 6, 1)).await.unwrap_err();
    assert!(matches!(err, StatsError::DataUnavailable { .. }));
    assert!(err.is_recoverable());
}

#[tokio::test]
async fn index_report_classifies_years_and_rolls() {
    // Ten years of weekday closes growing 0.03 a day
    let series = weekday_series("^GSPC", d(2000, 1, 3), 2_600, 100.0, 0.03);
    let service = service(vec![series]);

    let report = service.analyze_index("^GSPC", &d(2000, 1, 1), &d(2011, 1, 1)).await.unwrap();

    assert!(report.yearly.mismatch.is_none());
    assert_eq!(report.yearly.total_years(), report.yearly.categorized_years());
    assert_eq!(report.yearly.count(ReturnCategory::DownYear), 0);
    assert_eq!(report.rolling.len(), 4);

    let five_year = &report.rolling[0];
    assert_eq!(five_year.years, 5);
    assert!(five_year.values[..1260].iter().all(|v| v.is_none()));
    assert!(five_year.values[1260..].iter().all(|v| v.is_some()));
    // 20-year window never fills on ten years of data
    assert_eq!(report.rolling[3].valid_days(), 0);

    let mut buf = Vec::new();
    report::write_rolling_summary(&mut buf, &report.rolling, &service.config().thresholds, &service.config().render)
        .unwrap();
    let text = String::from_utf8(buf).unwrap();
    assert!(text.contains("20-Year Rolling Returns: 0 valid days, latest n/a, not enough data"));
}
