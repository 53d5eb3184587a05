use crate::errors::{Result, StatsError};
use crate::models::returns::ReturnCategory;
use serde::Serialize;
use std::time::Duration;

/// Returns strictly below this are down years.
pub const DOWN_YEAR_THRESHOLD_PCT: f64 = 0.0;
/// Returns at or above this are good-return years.
pub const GOOD_RETURN_THRESHOLD_PCT: f64 = 6.0;
pub const TRADING_DAYS_PER_YEAR: usize = 252;
pub const DEFAULT_ROLLING_WINDOWS: [u32; 4] = [5, 10, 15, 20];

/// Category boundaries in percent. Both are closed on the lower end:
/// `down_below` itself is a no-return year, `good_at_or_above` itself is a good year.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReturnThresholds {
    pub down_below: f64,
    pub good_at_or_above: f64,
}

impl ReturnThresholds {
    pub fn new(down_below: f64, good_at_or_above: f64) -> Result<Self> {
        if !down_below.is_finite() || !good_at_or_above.is_finite() {
            return Err(StatsError::ConfigError(format!(
                "thresholds must be finite, got {} and {}",
                down_below, good_at_or_above
            )));
        }
        if down_below > good_at_or_above {
            return Err(StatsError::ConfigError(format!(
                "down threshold {} is above good-return threshold {}",
                down_below, good_at_or_above
            )));
        }
        Ok(Self { down_below, good_at_or_above })
    }

    pub fn categorize(&self, return_pct: f64) -> ReturnCategory {
        if return_pct < self.down_below {
            ReturnCategory::DownYear
        } else if return_pct < self.good_at_or_above {
            ReturnCategory::NoReturn
        } else {
            ReturnCategory::GoodReturn
        }
    }

    /// Human readable range for a category, e.g. `0-6%`.
    pub fn range_label(&self, category: ReturnCategory) -> String {
        match category {
            ReturnCategory::DownYear => format!("<{}%", self.down_below),
            ReturnCategory::NoReturn => format!("{}-{}%", self.down_below, self.good_at_or_above),
            ReturnCategory::GoodReturn => format!(">{}%", self.good_at_or_above),
        }
    }
}

impl Default for ReturnThresholds {
    fn default() -> Self {
        Self {
            down_below: DOWN_YEAR_THRESHOLD_PCT,
            good_at_or_above: GOOD_RETURN_THRESHOLD_PCT,
        }
    }
}

/// Presentation settings handed to the report layer.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Columns available to one side of a bar chart.
    pub chart_width: usize,
    /// Bars with an absolute value at or below this get no inline label.
    pub label_min_abs_pct: f64,
    pub year_label_step: usize,
    pub week_label_step: usize,
    /// Weekly charts label every date up to this many weeks.
    pub week_label_all_max: usize,
    pub precision: usize,
}

impl RenderConfig {
    pub fn new() -> Self {
        Self {
            chart_width: 40,
            label_min_abs_pct: 3.0,
            year_label_step: 5,
            week_label_step: 4,
            week_label_all_max: 20,
            precision: 2,
        }
    }

    pub fn with_chart_width(mut self, width: usize) -> Self {
        self.chart_width = width.max(1);
        self
    }

    pub fn with_label_min_abs_pct(mut self, pct: f64) -> Self {
        self.label_min_abs_pct = pct;
        self
    }

    pub fn with_precision(mut self, precision: usize) -> Self {
        self.precision = precision;
        self
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Config {
    pub data_dir: String,
    pub thresholds: ReturnThresholds,
    pub rolling_windows: Vec<u32>,
    pub trading_days_per_year: usize,
    pub verification_rows: usize,
    pub request_interval: Duration,
    pub offline: bool,
    pub render: RenderConfig,
}

impl Config {
    pub fn new() -> Self {
        Self {
            data_dir: "data".to_string(),
            thresholds: ReturnThresholds::default(),
            rolling_windows: DEFAULT_ROLLING_WINDOWS.to_vec(),
            trading_days_per_year: TRADING_DAYS_PER_YEAR,
            verification_rows: 5,
            request_interval: Duration::from_millis(500),
            offline: false,
            render: RenderConfig::new(),
        }
    }

    pub fn with_data_dir(mut self, dir: &str) -> Self {
        self.data_dir = dir.to_string();
        self
    }

    pub fn with_thresholds(mut self, thresholds: ReturnThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn with_rolling_windows(mut self, windows: Vec<u32>) -> Self {
        self.rolling_windows = windows;
        self
    }

    pub fn with_trading_days_per_year(mut self, days: usize) -> Self {
        self.trading_days_per_year = days;
        self
    }

    pub fn with_verification_rows(mut self, rows: usize) -> Self {
        self.verification_rows = rows;
        self
    }

    pub fn with_request_interval(mut self, interval: Duration) -> Self {
        self.request_interval = interval;
        self
    }

    pub fn with_offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    pub fn with_render(mut self, render: RenderConfig) -> Self {
        self.render = render;
        self
    }

    /// Path of the Arrow file used for offline price data.
    pub fn price_file(&self) -> std::path::PathBuf {
        std::path::Path::new(&self.data_dir).join("prices.arrow")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
