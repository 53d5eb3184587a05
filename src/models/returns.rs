use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

use crate::errors::{Result, StatsError};

/// Percent change of a resampled value against the previous period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PeriodReturn {
    pub period_end: NaiveDate,
    pub percent_change: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ReturnCategory {
    DownYear,
    NoReturn,
    GoodReturn,
}

impl ReturnCategory {
    pub const ALL: [ReturnCategory; 3] = [
        ReturnCategory::DownYear,
        ReturnCategory::NoReturn,
        ReturnCategory::GoodReturn,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ReturnCategory::DownYear => "Down Year",
            ReturnCategory::NoReturn => "No Return",
            ReturnCategory::GoodReturn => "Good Return",
        }
    }

    /// Heading used when counting years, e.g. "Down Years".
    pub fn plural_label(&self) -> &'static str {
        match self {
            ReturnCategory::DownYear => "Down Years",
            ReturnCategory::NoReturn => "No Return Years",
            ReturnCategory::GoodReturn => "Good Return Years",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            ReturnCategory::DownYear => "red",
            ReturnCategory::NoReturn => "yellow",
            ReturnCategory::GoodReturn => "green",
        }
    }
}

impl fmt::Display for ReturnCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct YearlyReturn {
    pub year: i32,
    pub period_end: NaiveDate,
    pub return_pct: f64,
    pub category: ReturnCategory,
}

/// Partition sizes that do not add up to the number of computed returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClassificationMismatch {
    pub total: usize,
    pub categorized: usize,
}

impl ClassificationMismatch {
    pub fn difference(&self) -> i64 {
        self.total as i64 - self.categorized as i64
    }
}

impl fmt::Display for ClassificationMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} years computed but {} categorized (difference {})",
            self.total,
            self.categorized,
            self.difference()
        )
    }
}

/// Result of the yearly return classifier.
#[derive(Debug, Clone, Serialize)]
pub struct YearlyAnalysis {
    pub returns: Vec<YearlyReturn>,
    pub down_years: Vec<YearlyReturn>,
    pub no_return_years: Vec<YearlyReturn>,
    pub good_return_years: Vec<YearlyReturn>,
    pub mismatch: Option<ClassificationMismatch>,
}

impl YearlyAnalysis {
    pub fn total_years(&self) -> usize {
        self.returns.len()
    }

    pub fn categorized_years(&self) -> usize {
        self.down_years.len() + self.no_return_years.len() + self.good_return_years.len()
    }

    pub fn partition(&self, category: ReturnCategory) -> &[YearlyReturn] {
        match category {
            ReturnCategory::DownYear => &self.down_years,
            ReturnCategory::NoReturn => &self.no_return_years,
            ReturnCategory::GoodReturn => &self.good_return_years,
        }
    }

    pub fn count(&self, category: ReturnCategory) -> usize {
        self.partition(category).len()
    }

    /// Years at or above the down threshold.
    pub fn positive_years(&self) -> usize {
        self.no_return_years.len() + self.good_return_years.len()
    }

    /// Share of all years, in percent. `None` when there are no years.
    pub fn share(&self, category: ReturnCategory) -> Option<f64> {
        share_pct(self.count(category), self.total_years())
    }

    pub fn positive_share(&self) -> Option<f64> {
        share_pct(self.positive_years(), self.total_years())
    }

    pub fn check(&self) -> Result<()> {
        match self.mismatch {
            Some(m) => Err(StatsError::ClassificationMismatch(m)),
            None => Ok(()),
        }
    }
}

pub(crate) fn share_pct(count: usize, total: usize) -> Option<f64> {
    if total == 0 {
        None
    } else {
        Some(count as f64 / total as f64 * 100.0)
    }
}

/// Trailing annualized return over a fixed window, one slot per input bar.
#[derive(Debug, Clone, Serialize)]
pub struct RollingReturns {
    pub years: u32,
    pub window_days: usize,
    pub dates: Vec<NaiveDate>,
    /// Fractions (0.06 == 6%). `None` until the window is filled.
    pub values: Vec<Option<f64>>,
}

impl RollingReturns {
    pub fn valid_days(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }

    pub fn latest(&self) -> Option<(NaiveDate, f64)> {
        self.dates
            .iter()
            .zip(self.values.iter())
            .rev()
            .find_map(|(d, v)| v.map(|v| (*d, v)))
    }

    /// Share of valid days whose rolling return is below `threshold`
    /// (a fraction). `None` when no day is valid.
    pub fn fraction_below(&self, threshold: f64) -> Option<f64> {
        let valid = self.valid_days();
        if valid == 0 {
            return None;
        }
        let below = self.values.iter().flatten().filter(|&&v| v < threshold).count();
        Some(below as f64 / valid as f64)
    }
}

/// Weekly up/down statistics for one instrument.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyStats {
    pub ticker: String,
    pub total_weeks: usize,
    pub up_weeks: usize,
    pub down_weeks: usize,
    pub avg_up_pct: f64,
    pub avg_down_pct: f64,
    pub current_price: f64,
    pub period_to_date_pct: f64,
}

impl WeeklyStats {
    /// Weeks that closed exactly flat. They count toward `total_weeks` only.
    pub fn flat_weeks(&self) -> usize {
        self.total_weeks - self.up_weeks - self.down_weeks
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WeeklyAnalysis {
    pub stats: WeeklyStats,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub weekly_returns: Vec<PeriodReturn>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_fraction_below_ignores_undefined_days() {
        let rolling = RollingReturns {
            years: 1,
            window_days: 2,
            dates: vec![d(2020, 1, 1), d(2020, 1, 2), d(2020, 1, 3), d(2020, 1, 6)],
            values: vec![None, None, Some(0.02), Some(0.08)],
        };
        assert_eq!(rolling.valid_days(), 2);
        assert_eq!(rolling.fraction_below(0.06), Some(0.5));
        assert_eq!(rolling.latest(), Some((d(2020, 1, 6), 0.08)));
    }

    #[test]
    fn test_fraction_below_with_no_valid_days() {
        let rolling = RollingReturns {
            years: 5,
            window_days: 1260,
            dates: vec![d(2020, 1, 1)],
            values: vec![None],
        };
        assert_eq!(rolling.fraction_below(0.06), None);
        assert_eq!(rolling.latest(), None);
    }

    #[test]
    fn test_mismatch_check_surfaces_error() {
        let analysis = YearlyAnalysis {
            returns: vec![],
            down_years: vec![],
            no_return_years: vec![],
            good_return_years: vec![],
            mismatch: Some(ClassificationMismatch { total: 3, categorized: 2 }),
        };
        let err = analysis.check().unwrap_err();
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("difference 1"));
    }
}
