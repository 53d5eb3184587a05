pub mod resample;
pub mod rolling;
pub mod weekly;
pub mod yearly;

pub use rolling::{rolling_annualized_returns, rolling_summary};
pub use weekly::summarize_weekly;
pub use yearly::analyze_yearly_returns;
