// Property tests for the return classifiers.
//
// 1. Yearly partitions are disjoint and cover every computed return
// 2. Category boundaries are closed on the lower end
// 3. Weekly up + down + flat weeks always equal total weeks
// 4. Strictly rising weekly closes never produce a down week

use chrono::{Duration, NaiveDate};
use market_returns::analysis::resample::{percent_changes, weekly_closes};
use market_returns::{analyze_yearly_returns, summarize_weekly, PriceSeries, ReturnCategory, ReturnThresholds};
use proptest::prelude::*;

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(1990, 1, 1).unwrap()
}

/// One bar every `gap` days starting 1990-01-01.
fn series_from(closes: &[f64], gap: i64) -> PriceSeries {
    let points: Vec<_> = closes
        .iter()
        .enumerate()
        .map(|(i, &c)| (start() + Duration::days(i as i64 * gap), c))
        .collect();
    PriceSeries::from_closes("PROP", &points)
}

fn arb_price() -> impl Strategy<Value = f64> {
    (1.0..500.0_f64).prop_map(|p| (p * 100.0).round() / 100.0)
}

proptest! {
    #[test]
    fn yearly_partitions_cover_all_returns(
        closes in prop::collection::vec(arb_price(), 2..60),
        gap in 20i64..400,
    ) {
        let series = series_from(&closes, gap);
        let analysis = analyze_yearly_returns(&series, &ReturnThresholds::default());

        prop_assert!(analysis.mismatch.is_none());
        prop_assert_eq!(analysis.categorized_years(), analysis.total_years());

        for r in &analysis.returns {
            let hits = ReturnCategory::ALL
                .iter()
                .filter(|c| analysis.partition(**c).iter().any(|p| p.year == r.year))
                .count();
            prop_assert_eq!(hits, 1);
        }
    }

    #[test]
    fn yearly_partitions_respect_custom_thresholds(
        closes in prop::collection::vec(arb_price(), 2..40),
        lo in -20.0..0.0_f64,
        width in 0.0..30.0_f64,
    ) {
        let thresholds = ReturnThresholds::new(lo, lo + width).unwrap();
        let analysis = analyze_yearly_returns(&series_from(&closes, 365), &thresholds);

        prop_assert!(analysis.down_years.iter().all(|r| r.return_pct < lo));
        prop_assert!(analysis.no_return_years.iter().all(|r| r.return_pct >= lo && r.return_pct < lo + width));
        prop_assert!(analysis.good_return_years.iter().all(|r| r.return_pct >= lo + width));
        prop_assert_eq!(analysis.categorized_years(), analysis.total_years());
    }

    #[test]
    fn weekly_counts_add_up(
        closes in prop::collection::vec(arb_price(), 1..120),
        gap in 1i64..4,
    ) {
        let series = series_from(&closes, gap);
        let end = start() + Duration::days(1000);
        let stats = summarize_weekly(&series, start(), end).unwrap().stats;

        prop_assert_eq!(stats.up_weeks + stats.down_weeks + stats.flat_weeks(), stats.total_weeks);
        prop_assert!(stats.avg_up_pct >= 0.0);
        prop_assert!(stats.avg_down_pct <= 0.0);
        prop_assert!(stats.avg_up_pct.is_finite() && stats.avg_down_pct.is_finite());
        prop_assert_eq!(stats.current_price, *closes.last().unwrap());
    }

    #[test]
    fn rising_weekly_closes_have_no_down_weeks(
        steps in prop::collection::vec(0.01..5.0_f64, 1..30),
    ) {
        // one bar per Friday, every close above the previous one
        let friday = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        let mut close = 100.0;
        let mut points = vec![(friday, close)];
        for (i, step) in steps.iter().enumerate() {
            close += step;
            points.push((friday + Duration::weeks(i as i64 + 1), close));
        }
        let series = PriceSeries::from_closes("UP", &points);
        let stats = summarize_weekly(&series, friday, friday + Duration::weeks(60)).unwrap().stats;

        prop_assert_eq!(stats.total_weeks, steps.len());
        prop_assert_eq!(stats.up_weeks, stats.total_weeks);
        prop_assert_eq!(stats.down_weeks, 0);
        prop_assert_eq!(stats.avg_down_pct, 0.0);
    }

    #[test]
    fn weekly_resampling_never_skips_a_friday(
        closes in prop::collection::vec(arb_price(), 1..80),
        gap in 1i64..12,
    ) {
        let weekly = weekly_closes(&series_from(&closes, gap));
        for pair in weekly.windows(2) {
            prop_assert_eq!(pair[1].0 - pair[0].0, Duration::days(7));
        }
        prop_assert!(percent_changes(&weekly).len() < weekly.len().max(1));
    }
}

#[test]
fn boundary_values() {
    let t = ReturnThresholds::default();
    assert_eq!(t.categorize(0.0), ReturnCategory::NoReturn);
    assert_eq!(t.categorize(6.0), ReturnCategory::GoodReturn);
    assert_eq!(t.categorize(-0.0001), ReturnCategory::DownYear);
}
