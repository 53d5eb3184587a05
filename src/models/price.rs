use chrono::NaiveDate;
use serde::Serialize;

/// One trading day of OHLCV data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl DailyBar {
    /// Bar carrying only a close, for sources that only report closes.
    pub fn from_close(date: NaiveDate, close: f64) -> Self {
        Self {
            date,
            open: close,
            high: close,
            low: close,
            close,
            volume: 0,
        }
    }
}

/// Daily price history of one instrument, oldest bar first.
#[derive(Debug, Clone, Serialize)]
pub struct PriceSeries {
    pub symbol: String,
    pub name: String,
    pub daily: Vec<DailyBar>,
}

impl PriceSeries {
    pub fn new(symbol: &str, daily: Vec<DailyBar>) -> Self {
        Self {
            symbol: symbol.to_string(),
            name: symbol.to_string(),
            daily,
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Convenience constructor used by tests and offline tooling.
    pub fn from_closes(symbol: &str, points: &[(NaiveDate, f64)]) -> Self {
        Self::new(
            symbol,
            points.iter().map(|&(d, c)| DailyBar::from_close(d, c)).collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.daily.is_empty()
    }

    pub fn len(&self) -> usize {
        self.daily.len()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.daily.iter().map(|b| b.close).collect()
    }

    pub fn first_close(&self) -> Option<f64> {
        self.daily.first().map(|b| b.close)
    }

    pub fn last_close(&self) -> Option<f64> {
        self.daily.last().map(|b| b.close)
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.daily.first().map(|b| b.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.daily.last().map(|b| b.date)
    }

    /// Bars with `start <= date < end`.
    pub fn slice(&self, start: NaiveDate, end: NaiveDate) -> PriceSeries {
        PriceSeries {
            symbol: self.symbol.clone(),
            name: self.name.clone(),
            daily: self
                .daily
                .iter()
                .filter(|b| b.date >= start && b.date < end)
                .cloned()
                .collect(),
        }
    }

    /// Copy of this series with duplicate dates removed, see [`dedup_keep_last`].
    pub fn deduplicated(&self) -> PriceSeries {
        PriceSeries {
            symbol: self.symbol.clone(),
            name: self.name.clone(),
            daily: dedup_keep_last(&self.daily),
        }
    }
}

/// Drops repeated dates, keeping the last listed bar for each date.
/// The result is ordered by date.
pub fn dedup_keep_last(bars: &[DailyBar]) -> Vec<DailyBar> {
    let mut indexed: Vec<(usize, &DailyBar)> = bars.iter().enumerate().collect();
    // Stable sort keeps listing order within a date, so the last one wins below.
    indexed.sort_by_key(|(_, b)| b.date);

    let mut out: Vec<DailyBar> = Vec::with_capacity(bars.len());
    for (_, bar) in indexed {
        match out.last_mut() {
            Some(prev) if prev.date == bar.date => *prev = bar.clone(),
            _ => out.push(bar.clone()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_dedup_keeps_last_listed_value() {
        let bars = vec![
            DailyBar::from_close(d(2024, 1, 2), 10.0),
            DailyBar::from_close(d(2024, 1, 3), 11.0),
            DailyBar::from_close(d(2024, 1, 3), 12.5),
            DailyBar::from_close(d(2024, 1, 4), 13.0),
        ];
        let out = dedup_keep_last(&bars);
        assert_eq!(out.len(), 3);
        assert_eq!(out[1].close, 12.5);
    }

    #[test]
    fn test_dedup_sorts_overlapping_chunks() {
        let bars = vec![
            DailyBar::from_close(d(2024, 1, 3), 11.0),
            DailyBar::from_close(d(2024, 1, 4), 13.0),
            DailyBar::from_close(d(2024, 1, 2), 10.0),
            DailyBar::from_close(d(2024, 1, 3), 11.5),
        ];
        let out = dedup_keep_last(&bars);
        let dates: Vec<_> = out.iter().map(|b| b.date).collect();
        assert_eq!(dates, vec![d(2024, 1, 2), d(2024, 1, 3), d(2024, 1, 4)]);
        assert_eq!(out[1].close, 11.5);
    }

    #[test]
    fn test_slice_is_end_exclusive() {
        let series = PriceSeries::from_closes(
            "MSFT",
            &[(d(2024, 1, 2), 1.0), (d(2024, 1, 3), 2.0), (d(2024, 1, 4), 3.0)],
        );
        let sliced = series.slice(d(2024, 1, 3), d(2024, 1, 4));
        assert_eq!(sliced.closes(), vec![2.0]);
    }
}
