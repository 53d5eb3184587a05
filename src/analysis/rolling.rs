use log::debug;

use crate::config::ReturnThresholds;
use crate::models::price::PriceSeries;
use crate::models::returns::RollingReturns;

/// Annualized geometric return over the trailing `years * trading_days` bars:
/// `(p_t / p_{t-w})^(1/years) - 1`. Slots before the window is filled are `None`,
/// as are slots whose ratio is not a finite number.
pub fn rolling_annualized_returns(
    series: &PriceSeries,
    years: u32,
    trading_days: usize,
) -> RollingReturns {
    let window = years as usize * trading_days;
    let closes = series.closes();
    let exponent = 1.0 / years.max(1) as f64;

    let values = (0..closes.len())
        .map(|t| {
            if years == 0 || t < window {
                return None;
            }
            let ratio = closes[t] / closes[t - window];
            let annualized = ratio.powf(exponent) - 1.0;
            annualized.is_finite().then_some(annualized)
        })
        .collect();

    RollingReturns {
        years,
        window_days: window,
        dates: series.daily.iter().map(|b| b.date).collect(),
        values,
    }
}

/// Rolling returns for every configured window size.
pub fn rolling_summary(
    series: &PriceSeries,
    windows: &[u32],
    trading_days: usize,
    thresholds: &ReturnThresholds,
) -> Vec<RollingReturns> {
    windows
        .iter()
        .map(|&years| {
            let rolling = rolling_annualized_returns(series, years, trading_days);
            match rolling.fraction_below(thresholds.good_at_or_above / 100.0) {
                Some(f) => debug!(
                    "{}-Year Rolling Returns: {:.1}% of time below {}% threshold",
                    years,
                    f * 100.0,
                    thresholds.good_at_or_above
                ),
                None => debug!("{}-Year Rolling Returns: series shorter than window", years),
            }
            rolling
        })
        .collect()
}
