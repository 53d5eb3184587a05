use async_trait::async_trait;
use chrono::NaiveDate;
use log::info;

use crate::models::price::{dedup_keep_last, PriceSeries};
use crate::errors::Result;
use crate::sources::base::PriceSource;
use crate::util::arrow_utils;
use std::collections::HashMap;
use std::path::Path;
use std::fs;

/// 价格数据提供者，保存本地下载的价格序列
pub struct PriceDataProvider {
    data: Vec<PriceSeries>,
    // 索引用于快速查找
    symbol_index: HashMap<String, usize>,
}

impl PriceDataProvider {
    /// 使用提供的数据创建新的数据提供者实例
    pub fn new_with_data(data: Vec<PriceSeries>) -> Self {
        let mut provider = Self {
            data,
            symbol_index: HashMap::new(),
        };

        provider.rebuild_indices();

        provider
    }

    /// 从文件加载数据，文件不存在时返回空的提供者
    pub fn load_from_file(path: &str) -> Result<Self> {
        let data = if Path::new(path).exists() {
            arrow_utils::read_series_from_arrow(path)?
        } else {
            info!("No price file at {}, starting empty", path);
            Vec::new()
        };

        Ok(Self::new_with_data(data))
    }

    /// 保存数据到文件
    pub fn save_to_file(&self, path: &str) -> Result<()> {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        arrow_utils::save_series_to_arrow(&self.data, path)
    }

    pub fn get_all_series(&self) -> &[PriceSeries] {
        &self.data
    }

    pub fn get_series_by_symbol(&self, symbol: &str) -> Option<&PriceSeries> {
        self.symbol_index.get(symbol).map(|&idx| &self.data[idx])
    }

    /// Merge `series` into the stored series of the same symbol. Bars for dates
    /// already present are replaced by the incoming ones.
    pub fn upsert(&mut self, series: PriceSeries) {
        match self.symbol_index.get(&series.symbol) {
            Some(&idx) => {
                let existing = &mut self.data[idx];
                let mut merged = std::mem::take(&mut existing.daily);
                merged.extend(series.daily);
                existing.daily = dedup_keep_last(&merged);
                existing.name = series.name;
            }
            None => {
                let mut series = series;
                series.daily = dedup_keep_last(&series.daily);
                self.data.push(series);
                self.rebuild_indices();
            }
        }
    }

    fn rebuild_indices(&mut self) {
        self.symbol_index.clear();

        for (i, series) in self.data.iter().enumerate() {
            self.symbol_index.insert(series.symbol.clone(), i);
        }
    }

    /// Latest trading date across all stored series.
    pub fn get_latest_trading_date(&self) -> Option<NaiveDate> {
        self.data.iter().filter_map(|s| s.last_date()).max()
    }
}

#[async_trait]
impl PriceSource for PriceDataProvider {
    fn source_name(&self) -> &'static str {
        "local"
    }

    async fn fetch_history(&self, symbol: &str, start: &NaiveDate, end: &NaiveDate) -> Result<PriceSeries> {
        Ok(match self.get_series_by_symbol(symbol) {
            Some(series) => series.slice(*start, *end),
            None => PriceSeries::new(symbol, Vec::new()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_upsert_merges_by_date() {
        let mut provider = PriceDataProvider::new_with_data(vec![PriceSeries::from_closes(
            "MSFT",
            &[(d(2024, 1, 2), 1.0), (d(2024, 1, 3), 2.0)],
        )]);
        provider.upsert(PriceSeries::from_closes(
            "MSFT",
            &[(d(2024, 1, 3), 2.5), (d(2024, 1, 4), 3.0)],
        ));
        provider.upsert(PriceSeries::from_closes("TSLA", &[(d(2024, 1, 2), 9.0)]));

        let msft = provider.get_series_by_symbol("MSFT").unwrap();
        assert_eq!(msft.closes(), vec![1.0, 2.5, 3.0]);
        assert!(provider.get_series_by_symbol("TSLA").is_some());
        assert_eq!(provider.get_latest_trading_date(), Some(d(2024, 1, 4)));
    }

    #[tokio::test]
    async fn test_fetch_history_slices_range() {
        let provider = PriceDataProvider::new_with_data(vec![PriceSeries::from_closes(
            "^GSPC",
            &[(d(2023, 12, 29), 1.0), (d(2024, 1, 2), 2.0), (d(2024, 1, 3), 3.0)],
        )]);
        let series = provider.fetch_history("^GSPC", &d(2024, 1, 1), &d(2024, 1, 3)).await.unwrap();
        assert_eq!(series.closes(), vec![2.0]);

        let missing = provider.fetch_history("NONE", &d(2024, 1, 1), &d(2024, 1, 3)).await.unwrap();
        assert!(missing.is_empty());
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nothing.arrow");
        let provider = PriceDataProvider::load_from_file(path.to_str().unwrap()).unwrap();
        assert!(provider.get_all_series().is_empty());
    }
}
