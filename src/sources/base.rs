use crate::models::price::PriceSeries;
use crate::errors::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

/// Base trait for historical price sources
#[async_trait]
pub trait PriceSource {
    /// Short name used in logs
    fn source_name(&self) -> &'static str;

    /// Fetch daily bars for `symbol` with `start <= date < end`, oldest first.
    /// An unknown symbol or an empty range yields an empty series, not an error.
    async fn fetch_history(&self, symbol: &str, start: &NaiveDate, end: &NaiveDate) -> Result<PriceSeries>;
}
