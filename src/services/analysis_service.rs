use crate::analysis::{analyze_yearly_returns, rolling_summary, summarize_weekly};
use crate::config::Config;
use crate::data_provider::PriceDataProvider;
use crate::errors::{Result, StatsError};
use crate::models::price::PriceSeries;
use crate::models::returns::{RollingReturns, WeeklyAnalysis, YearlyAnalysis};
use crate::sources::base::PriceSource;
use chrono::NaiveDate;
use log::{debug, info, warn};
use serde::Serialize;
use std::sync::Arc;

/// Yearly classification and rolling returns of one index.
#[derive(Debug, Clone, Serialize)]
pub struct IndexReport {
    pub symbol: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub trading_days: usize,
    pub yearly: YearlyAnalysis,
    pub rolling: Vec<RollingReturns>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedInstrument {
    pub ticker: String,
    pub reason: String,
}

/// Outcome of a multi-instrument weekly run. Failed instruments end up in
/// `skipped` and never abort the others.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchOutcome {
    pub reports: Vec<WeeklyAnalysis>,
    pub skipped: Vec<SkippedInstrument>,
}

/// 分析服务，按顺序获取数据并计算统计
pub struct AnalysisService {
    config: Config,
    sources: Vec<Arc<dyn PriceSource + Send + Sync>>,
}

impl AnalysisService {
    pub fn new(config: Config, sources: Vec<Arc<dyn PriceSource + Send + Sync>>) -> Self {
        Self { config, sources }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// First non-empty series among the configured sources, in order.
    pub async fn fetch_series(&self, symbol: &str, start: &NaiveDate, end: &NaiveDate) -> Result<PriceSeries> {
        let mut last_error = None;

        for source in &self.sources {
            match source.fetch_history(symbol, start, end).await {
                Ok(series) if !series.is_empty() => {
                    info!("Loaded {} bars for {} from {}", series.len(), symbol, source.source_name());
                    return Ok(series);
                }
                Ok(_) => {
                    debug!("{} has no data for {}", source.source_name(), symbol);
                }
                Err(e) => {
                    warn!("Failed to fetch {} from {}: {}", symbol, source.source_name(), e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| StatsError::DataUnavailable {
            symbol: symbol.to_string(),
            start: *start,
            end: *end,
        }))
    }

    pub fn analyze_index_series(&self, series: &PriceSeries, start: NaiveDate, end: NaiveDate) -> IndexReport {
        let yearly = analyze_yearly_returns(series, &self.config.thresholds);
        let rolling = rolling_summary(
            series,
            &self.config.rolling_windows,
            self.config.trading_days_per_year,
            &self.config.thresholds,
        );

        IndexReport {
            symbol: series.symbol.clone(),
            start,
            end,
            trading_days: series.len(),
            yearly,
            rolling,
        }
    }

    pub async fn analyze_index(&self, symbol: &str, start: &NaiveDate, end: &NaiveDate) -> Result<IndexReport> {
        info!("Fetching {} data from {} to {}", symbol, start, end);
        let series = self.fetch_series(symbol, start, end).await?;
        Ok(self.analyze_index_series(&series, *start, *end))
    }

    pub async fn analyze_stock(&self, ticker: &str, start: &NaiveDate, end: &NaiveDate) -> Result<WeeklyAnalysis> {
        info!("Analyzing {}...", ticker);
        let series = self.fetch_series(ticker, start, end).await?;
        summarize_weekly(&series, *start, *end)
    }

    /// Weekly summaries for every ticker, one at a time.
    pub async fn analyze_stocks(&self, tickers: &[String], start: &NaiveDate, end: &NaiveDate) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();

        for ticker in tickers {
            match self.analyze_stock(ticker, start, end).await {
                Ok(report) => outcome.reports.push(report),
                Err(e) => {
                    warn!("Error analyzing {}: {}", ticker, e);
                    outcome.skipped.push(SkippedInstrument {
                        ticker: ticker.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            "Analyzed {} of {} instruments ({} skipped)",
            outcome.reports.len(),
            tickers.len(),
            outcome.skipped.len()
        );
        outcome
    }

    /// Fetch `symbols` and merge them into the local price file. Returns the
    /// number of symbols stored; symbols without data are skipped.
    pub async fn download(&self, symbols: &[String], start: &NaiveDate, end: &NaiveDate) -> Result<usize> {
        let path = self.config.price_file();
        let path = path.to_string_lossy().to_string();
        let mut provider = PriceDataProvider::load_from_file(&path)?;

        let mut stored = 0;
        for symbol in symbols {
            match self.fetch_series(symbol, start, end).await {
                Ok(series) => {
                    provider.upsert(series);
                    stored += 1;
                }
                Err(e) => warn!("Skipping {}: {}", symbol, e),
            }
        }

        if stored > 0 {
            provider.save_to_file(&path)?;
        }
        info!("Stored {} of {} symbols in {}", stored, symbols.len(), path);
        Ok(stored)
    }
}
