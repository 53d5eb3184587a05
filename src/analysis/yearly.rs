use chrono::Datelike;
use log::{debug, warn};

use crate::analysis::resample::{percent_changes, year_end_closes};
use crate::config::ReturnThresholds;
use crate::models::price::PriceSeries;
use crate::models::returns::{
    ClassificationMismatch, ReturnCategory, YearlyAnalysis, YearlyReturn,
};

/// Year-over-year returns computed from year-end closes. The first year has no
/// predecessor and yields no return.
pub fn yearly_returns(series: &PriceSeries, thresholds: &ReturnThresholds) -> Vec<YearlyReturn> {
    let points: Vec<_> = year_end_closes(series)
        .into_iter()
        .map(|c| (c.period_end, c.close))
        .collect();

    percent_changes(&points)
        .into_iter()
        .map(|r| YearlyReturn {
            year: r.period_end.year(),
            period_end: r.period_end,
            return_pct: r.percent_change,
            category: thresholds.categorize(r.percent_change),
        })
        .collect()
}

/// Compares partition sizes with the number of returns.
pub fn verify_partitions(
    total: usize,
    down: usize,
    no_return: usize,
    good: usize,
) -> Option<ClassificationMismatch> {
    let categorized = down + no_return + good;
    (categorized != total).then_some(ClassificationMismatch { total, categorized })
}

pub fn classify_returns(returns: Vec<YearlyReturn>) -> YearlyAnalysis {
    let pick = |cat: ReturnCategory| -> Vec<YearlyReturn> {
        returns.iter().filter(|r| r.category == cat).copied().collect()
    };
    let down_years = pick(ReturnCategory::DownYear);
    let no_return_years = pick(ReturnCategory::NoReturn);
    let good_return_years = pick(ReturnCategory::GoodReturn);

    let mismatch = verify_partitions(
        returns.len(),
        down_years.len(),
        no_return_years.len(),
        good_return_years.len(),
    );
    if let Some(m) = &mismatch {
        warn!("Category total doesn't match total years: {}", m);
    }

    YearlyAnalysis {
        returns,
        down_years,
        no_return_years,
        good_return_years,
        mismatch,
    }
}

/// Resample to year-end, compute yearly returns and split them into
/// down / no-return / good-return buckets.
pub fn analyze_yearly_returns(series: &PriceSeries, thresholds: &ReturnThresholds) -> YearlyAnalysis {
    let returns = yearly_returns(series, thresholds);
    debug!("{}: {} yearly returns from {} bars", series.symbol, returns.len(), series.len());
    classify_returns(returns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn year_end_series(closes: &[f64]) -> PriceSeries {
        let points: Vec<_> = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| (NaiveDate::from_ymd_opt(2000 + i as i32, 12, 29).unwrap(), c))
            .collect();
        PriceSeries::from_closes("^GSPC", &points)
    }

    #[test]
    fn test_four_year_scenario() {
        let series = year_end_series(&[100.0, 106.0, 100.0, 112.0]);
        let analysis = analyze_yearly_returns(&series, &ReturnThresholds::default());

        assert_eq!(analysis.total_years(), 3);
        let pcts: Vec<f64> = analysis.returns.iter().map(|r| r.return_pct).collect();
        assert!((pcts[0] - 6.0).abs() < 1e-9);
        assert!((pcts[1] - (100.0 / 106.0 - 1.0) * 100.0).abs() < 1e-9);
        assert!((pcts[2] - 12.0).abs() < 1e-9);

        let cats: Vec<_> = analysis.returns.iter().map(|r| r.category).collect();
        assert_eq!(
            cats,
            vec![ReturnCategory::GoodReturn, ReturnCategory::DownYear, ReturnCategory::GoodReturn]
        );
        assert_eq!(analysis.down_years.len(), 1);
        assert_eq!(analysis.no_return_years.len(), 0);
        assert_eq!(analysis.good_return_years.len(), 2);
        assert_eq!(analysis.categorized_years(), 3);
        assert!(analysis.mismatch.is_none());
        assert!(analysis.check().is_ok());
    }

    #[test]
    fn test_partitions_keep_chronological_order() {
        let series = year_end_series(&[100.0, 120.0, 90.0, 130.0, 140.0]);
        let analysis = analyze_yearly_returns(&series, &ReturnThresholds::default());
        let good: Vec<i32> = analysis.good_return_years.iter().map(|r| r.year).collect();
        assert_eq!(good, vec![2001, 2003, 2004]);
        assert_eq!(analysis.positive_years(), 3);
    }

    #[test]
    fn test_flat_year_is_no_return() {
        let series = year_end_series(&[50.0, 50.0]);
        let analysis = analyze_yearly_returns(&series, &ReturnThresholds::default());
        assert_eq!(analysis.returns[0].category, ReturnCategory::NoReturn);
    }

    #[test]
    fn test_single_year_yields_nothing() {
        let series = year_end_series(&[100.0]);
        let analysis = analyze_yearly_returns(&series, &ReturnThresholds::default());
        assert_eq!(analysis.total_years(), 0);
        assert_eq!(analysis.share(ReturnCategory::DownYear), None);
        assert!(analysis.mismatch.is_none());
    }

    #[test]
    fn test_verify_partitions_reports_gap() {
        assert_eq!(verify_partitions(3, 1, 1, 1), None);
        let m = verify_partitions(4, 1, 1, 1).unwrap();
        assert_eq!(m.difference(), 1);
    }
}
