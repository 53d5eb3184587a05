use chrono::NaiveDate;
use log::{debug, info};

use crate::analysis::resample::{percent_changes, weekly_closes};
use crate::errors::{Result, StatsError};
use crate::models::price::PriceSeries;
use crate::models::returns::{PeriodReturn, WeeklyAnalysis, WeeklyStats};

fn mean_or_zero(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Aggregate up/down statistics over already computed weekly changes.
/// Flat weeks count toward `total_weeks` but belong to neither side.
pub fn weekly_stats(
    ticker: &str,
    weekly_returns: &[PeriodReturn],
    first_close: f64,
    last_close: f64,
) -> WeeklyStats {
    let ups: Vec<f64> = weekly_returns
        .iter()
        .map(|r| r.percent_change)
        .filter(|&p| p > 0.0)
        .collect();
    let downs: Vec<f64> = weekly_returns
        .iter()
        .map(|r| r.percent_change)
        .filter(|&p| p < 0.0)
        .collect();

    WeeklyStats {
        ticker: ticker.to_string(),
        total_weeks: weekly_returns.len(),
        up_weeks: ups.len(),
        down_weeks: downs.len(),
        avg_up_pct: mean_or_zero(&ups),
        avg_down_pct: mean_or_zero(&downs),
        current_price: last_close,
        period_to_date_pct: (last_close / first_close - 1.0) * 100.0,
    }
}

/// Weekly performance of one instrument over `[start, end)`.
///
/// The series is deduplicated by date (last listed bar wins) before it is
/// resampled to week-ending-Friday closes. An empty series is reported as
/// [`StatsError::DataUnavailable`] so a batch can skip the instrument.
pub fn summarize_weekly(
    series: &PriceSeries,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<WeeklyAnalysis> {
    let data = series.deduplicated();
    let (first_close, last_close) = match (data.first_close(), data.last_close()) {
        (Some(f), Some(l)) => (f, l),
        _ => {
            info!("No data found for {}", series.symbol);
            return Err(StatsError::DataUnavailable {
                symbol: series.symbol.clone(),
                start,
                end,
            });
        }
    };
    if data.len() != series.len() {
        debug!(
            "{}: dropped {} duplicate bars",
            series.symbol,
            series.len() - data.len()
        );
    }

    let weekly_returns = percent_changes(&weekly_closes(&data));
    let stats = weekly_stats(&series.symbol, &weekly_returns, first_close, last_close);

    Ok(WeeklyAnalysis {
        stats,
        start,
        end,
        weekly_returns,
    })
}
