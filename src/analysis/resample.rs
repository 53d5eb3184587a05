// Calendar resampling of daily closes.
//
// Period values are labelled with the calendar end of the period
// (Dec 31 for years, the Friday for weeks), not the last trading day.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use std::collections::BTreeMap;

use crate::models::price::PriceSeries;
use crate::models::returns::PeriodReturn;

/// A resampled close for one calendar year.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YearEndClose {
    pub year: i32,
    pub period_end: NaiveDate,
    pub close: f64,
}

/// Close of the last trading day of each calendar year present in the series.
/// Years without bars are absent.
pub fn year_end_closes(series: &PriceSeries) -> Vec<YearEndClose> {
    let mut last_by_year: BTreeMap<i32, (NaiveDate, f64)> = BTreeMap::new();
    for bar in &series.daily {
        let entry = last_by_year.entry(bar.date.year()).or_insert((bar.date, bar.close));
        if bar.date >= entry.0 {
            *entry = (bar.date, bar.close);
        }
    }

    last_by_year
        .into_iter()
        .filter_map(|(year, (_, close))| {
            NaiveDate::from_ymd_opt(year, 12, 31).map(|period_end| YearEndClose {
                year,
                period_end,
                close,
            })
        })
        .collect()
}

/// The Friday that closes the week containing `date` (the date itself if it is a Friday).
pub fn week_ending_friday(date: NaiveDate) -> NaiveDate {
    let from_monday = date.weekday().num_days_from_monday() as i64;
    let friday = Weekday::Fri.num_days_from_monday() as i64;
    date + Duration::days((friday - from_monday).rem_euclid(7))
}

/// Week-ending-Friday closes from the first bar's week through the last bar's week.
/// Each Friday takes the close of the last bar at or before it, so a week without
/// trading repeats the previous week's close. Expects bars sorted by date.
pub fn weekly_closes(series: &PriceSeries) -> Vec<(NaiveDate, f64)> {
    let (first, last) = match (series.first_date(), series.last_date()) {
        (Some(f), Some(l)) => (f, l),
        _ => return Vec::new(),
    };

    let last_friday = week_ending_friday(last);
    let mut friday = week_ending_friday(first);
    let mut bars = series.daily.iter().peekable();
    let mut current: Option<f64> = None;
    let mut out = Vec::new();

    while friday <= last_friday {
        while let Some(bar) = bars.next_if(|b| b.date <= friday) {
            current = Some(bar.close);
        }
        if let Some(close) = current {
            out.push((friday, close));
        }
        friday += Duration::days(7);
    }
    out
}

/// `(v_t / v_{t-1} - 1) * 100` for consecutive points. The first point has no
/// predecessor; pairs that do not produce a finite number are skipped.
pub fn percent_changes(points: &[(NaiveDate, f64)]) -> Vec<PeriodReturn> {
    points
        .windows(2)
        .filter_map(|w| {
            let (_, prev) = w[0];
            let (period_end, value) = w[1];
            let pct = (value / prev - 1.0) * 100.0;
            pct.is_finite().then_some(PeriodReturn {
                period_end,
                percent_change: pct,
            })
        })
        .collect()
}
