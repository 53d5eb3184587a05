// 公开导出的模块，供外部使用
pub mod models;
pub mod analysis;
pub mod config;
pub mod errors;
pub mod report;

// 数据获取与批处理，主程序使用
pub mod sources;
pub mod data_provider;
pub mod services;
#[doc(hidden)]
pub mod util;

// 重新导出常用类型，方便使用
pub use models::price::{DailyBar, PriceSeries};
pub use models::returns::{
    PeriodReturn, ReturnCategory, RollingReturns, WeeklyAnalysis, WeeklyStats, YearlyAnalysis, YearlyReturn,
};
pub use config::{Config, RenderConfig, ReturnThresholds};
pub use analysis::{analyze_yearly_returns, rolling_annualized_returns, rolling_summary, summarize_weekly};
pub use data_provider::PriceDataProvider;
pub use services::analysis_service::{AnalysisService, BatchOutcome};
pub use errors::{Result, StatsError};
