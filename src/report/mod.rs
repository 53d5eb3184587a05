// Console rendering of analysis results.
//
// Everything here writes to a caller supplied writer and only reads the
// computed records. `rendering` turns an I/O failure into a RenderError.

use std::io::{self, Write};

use crate::config::{RenderConfig, ReturnThresholds};
use crate::errors::{Result, StatsError};
use crate::models::price::PriceSeries;
use crate::models::returns::{
    share_pct, ReturnCategory, RollingReturns, WeeklyAnalysis, WeeklyStats, YearlyAnalysis,
    YearlyReturn,
};
use crate::services::analysis_service::BatchOutcome;

pub fn rendering(result: io::Result<()>) -> Result<()> {
    result.map_err(|e| StatsError::RenderError(e.to_string()))
}

fn pct_or_dash(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.1}%", v))
}

fn glyph(category: ReturnCategory) -> char {
    match category {
        ReturnCategory::DownYear => '-',
        ReturnCategory::NoReturn => '~',
        ReturnCategory::GoodReturn => '#',
    }
}

/// One horizontal bar around a center axis, `width` columns per side.
fn bar(value: f64, max_abs: f64, width: usize, fill: char) -> String {
    let len = if max_abs > 0.0 {
        ((value.abs() / max_abs) * width as f64).round() as usize
    } else {
        0
    };
    let body: String = std::iter::repeat(fill).take(len.min(width)).collect();
    if value < 0.0 {
        format!("{:>w$}|{:w$}", body, "", w = width)
    } else {
        format!("{:w$}|{:<w$}", "", body, w = width)
    }
}

fn verification_line<W: Write>(out: &mut W, r: &YearlyReturn) -> io::Result<()> {
    writeln!(out, "{}: {:.2}% - Category: {}", r.year, r.return_pct, r.category)
}

/// Counts per category, positive years and the first/last rows for eyeballing.
pub fn write_yearly_breakdown<W: Write>(
    out: &mut W,
    analysis: &YearlyAnalysis,
    thresholds: &ReturnThresholds,
    verification_rows: usize,
) -> io::Result<()> {
    let total = analysis.total_years();
    writeln!(out, "\nYearly Returns Analysis:")?;
    writeln!(out, "Total years analyzed: {}", total)?;
    writeln!(out, "Years categorized: {}", analysis.categorized_years())?;
    writeln!(out, "\nBreakdown:")?;
    for category in ReturnCategory::ALL {
        writeln!(
            out,
            "{} ({}): {} ({})",
            category.plural_label(),
            thresholds.range_label(category),
            analysis.count(category),
            pct_or_dash(analysis.share(category)),
        )?;
    }
    writeln!(
        out,
        "\nTotal Positive Years (>={}%): {} ({})",
        thresholds.down_below,
        analysis.positive_years(),
        pct_or_dash(analysis.positive_share()),
    )?;

    if let Some(m) = &analysis.mismatch {
        writeln!(out, "\nWARNING: Category total doesn't match total years!")?;
        writeln!(out, "Difference: {} years", m.difference())?;
    }

    let rows = verification_rows.min(total);
    writeln!(out, "\nFirst {} years of data for verification:", rows)?;
    for r in analysis.returns.iter().take(rows) {
        verification_line(out, r)?;
    }
    writeln!(out, "\nLast {} years of data for verification:", rows)?;
    for r in &analysis.returns[total - rows..] {
        verification_line(out, r)?;
    }
    Ok(())
}

/// Text waterfall of yearly returns, one row per year.
pub fn write_yearly_chart<W: Write>(
    out: &mut W,
    title: &str,
    analysis: &YearlyAnalysis,
    thresholds: &ReturnThresholds,
    render: &RenderConfig,
) -> io::Result<()> {
    let width = render.chart_width;
    let max_abs = analysis
        .returns
        .iter()
        .map(|r| r.return_pct.abs())
        .fold(thresholds.good_at_or_above.abs(), f64::max);

    writeln!(out, "\n{}", title)?;
    for category in ReturnCategory::ALL.iter().rev() {
        writeln!(
            out,
            "  {} {} ({}) [{}]",
            glyph(*category),
            category.label(),
            thresholds.range_label(*category),
            category.color()
        )?;
    }

    // Marker row: `0` on the axis, `^` on the good-return threshold.
    let mut marker: Vec<char> = vec![' '; width * 2 + 1];
    marker[width] = '0';
    if max_abs > 0.0 {
        let offset = (thresholds.good_at_or_above / max_abs * width as f64).round() as i64;
        let pos = width as i64 + offset;
        if pos >= 0 && (pos as usize) < marker.len() && pos as usize != width {
            marker[pos as usize] = '^';
        }
    }
    writeln!(out, "{:6} {}  ^ = {}% threshold", "", marker.iter().collect::<String>(), thresholds.good_at_or_above)?;

    let step = render.year_label_step.max(1);
    for (i, r) in analysis.returns.iter().enumerate() {
        let year_label = if i % step == 0 { r.year.to_string() } else { String::new() };
        let value_label = if r.return_pct.abs() > render.label_min_abs_pct {
            format!("{:.1}%", r.return_pct)
        } else {
            String::new()
        };
        writeln!(
            out,
            "{:>6} {} {}",
            year_label,
            bar(r.return_pct, max_abs, width, glyph(r.category)),
            value_label
        )?;
    }
    Ok(())
}

/// Category counts as a share of all years.
pub fn write_distribution<W: Write>(
    out: &mut W,
    title: &str,
    analysis: &YearlyAnalysis,
    thresholds: &ReturnThresholds,
) -> io::Result<()> {
    writeln!(out, "\n{}", title)?;
    for category in ReturnCategory::ALL {
        let count = analysis.count(category);
        writeln!(
            out,
            "{:<12} {:>8} {:>7} ({} years)",
            category.label(),
            thresholds.range_label(category),
            pct_or_dash(analysis.share(category)),
            count
        )?;
    }
    Ok(())
}

pub fn write_rolling_summary<W: Write>(
    out: &mut W,
    rolling: &[RollingReturns],
    thresholds: &ReturnThresholds,
    render: &RenderConfig,
) -> io::Result<()> {
    writeln!(out, "\nRolling Returns and {}% Threshold:", thresholds.good_at_or_above)?;
    for r in rolling {
        let latest = r
            .latest()
            .map(|(date, v)| format!("{:.p$}% on {}", v * 100.0, date, p = render.precision))
            .unwrap_or_else(|| "n/a".to_string());
        let below = r
            .fraction_below(thresholds.good_at_or_above / 100.0)
            .map(|f| format!("{:.1}% of time below threshold", f * 100.0))
            .unwrap_or_else(|| "not enough data".to_string());
        writeln!(
            out,
            "{}-Year Rolling Returns: {} valid days, latest {}, {}",
            r.years,
            r.valid_days(),
            latest,
            below
        )?;
    }
    Ok(())
}

pub fn write_weekly_stats<W: Write>(out: &mut W, stats: &WeeklyStats, render: &RenderConfig) -> io::Result<()> {
    let p = render.precision;
    writeln!(out, "\nStatistics:")?;
    writeln!(out, "Ticker: {}", stats.ticker)?;
    writeln!(out, "Total Weeks: {}", stats.total_weeks)?;
    writeln!(out, "Up Weeks: {}", stats.up_weeks)?;
    writeln!(out, "Down Weeks: {}", stats.down_weeks)?;
    writeln!(out, "Average Up Week Change (%): {:.p$}", stats.avg_up_pct, p = p)?;
    writeln!(out, "Average Down Week Change (%): {:.p$}", stats.avg_down_pct, p = p)?;
    writeln!(out, "Current Price: {:.p$}", stats.current_price, p = p)?;
    writeln!(out, "Period Change (%): {:.p$}", stats.period_to_date_pct, p = p)?;
    Ok(())
}

/// Up/down bar per week. Long runs only label every `week_label_step`-th week.
pub fn write_weekly_chart<W: Write>(out: &mut W, analysis: &WeeklyAnalysis, render: &RenderConfig) -> io::Result<()> {
    let returns = &analysis.weekly_returns;
    let max_abs = returns.iter().map(|r| r.percent_change.abs()).fold(0.0, f64::max);
    let step = if returns.len() > render.week_label_all_max {
        render.week_label_step.max(1)
    } else {
        1
    };

    writeln!(
        out,
        "\n{} Weekly Returns ({} to {})",
        analysis.stats.ticker, analysis.start, analysis.end
    )?;
    for (i, r) in returns.iter().enumerate() {
        let label = if i % step == 0 { r.period_end.to_string() } else { String::new() };
        let fill = if r.percent_change > 0.0 { '+' } else { '-' };
        writeln!(
            out,
            "{:>10} {} {:.p$}%",
            label,
            bar(r.percent_change, max_abs, render.chart_width, fill),
            r.percent_change,
            p = render.precision
        )?;
    }
    Ok(())
}

/// Final table over every instrument that produced statistics.
pub fn write_summary_table<W: Write>(out: &mut W, outcome: &BatchOutcome, render: &RenderConfig) -> io::Result<()> {
    if outcome.reports.is_empty() {
        writeln!(out, "\nNo valid results to display.")?;
        return Ok(());
    }

    let p = render.precision;
    writeln!(out, "\nSummary of All Stocks:")?;
    writeln!(
        out,
        "{:<8} {:>11} {:>8} {:>10} {:>12} {:>14} {:>13} {:>13}",
        "Ticker", "Total Weeks", "Up Weeks", "Down Weeks", "Avg Up (%)", "Avg Down (%)", "Current Price", "Change (%)"
    )?;
    for report in &outcome.reports {
        let s = &report.stats;
        writeln!(
            out,
            "{:<8} {:>11} {:>8} {:>10} {:>12.p$} {:>14.p$} {:>13.p$} {:>13.p$}",
            s.ticker,
            s.total_weeks,
            s.up_weeks,
            s.down_weeks,
            s.avg_up_pct,
            s.avg_down_pct,
            s.current_price,
            s.period_to_date_pct,
            p = p
        )?;
    }
    for skipped in &outcome.skipped {
        writeln!(out, "{:<8} skipped: {}", skipped.ticker, skipped.reason)?;
    }

    let up: usize = outcome.reports.iter().map(|r| r.stats.up_weeks).sum();
    let total: usize = outcome.reports.iter().map(|r| r.stats.total_weeks).sum();
    writeln!(out, "Up weeks across all stocks: {} of {} ({})", up, total, pct_or_dash(share_pct(up, total)))?;
    Ok(())
}

/// Listing of stored series with their first `limit` bars.
pub fn write_series_overview<W: Write>(out: &mut W, series: &[&PriceSeries], limit: usize) -> io::Result<()> {
    for s in series.iter().take(limit) {
        let range = match (s.first_date(), s.last_date()) {
            (Some(first), Some(last)) => format!("{} .. {}", first, last),
            _ => "no daily data".to_string(),
        };
        writeln!(out, "Series: {} ({}) - {} bars, {}", s.name, s.symbol, s.len(), range)?;
        writeln!(out, "{:-<72}", "")?;
        writeln!(out, "{:<10} {:>10} {:>10} {:>10} {:>10} {:>15}", "Date", "Open", "High", "Low", "Close", "Volume")?;
        for bar in s.daily.iter().take(limit) {
            writeln!(
                out,
                "{:<10} {:>10.2} {:>10.2} {:>10.2} {:>10.2} {:>15}",
                bar.date, bar.open, bar.high, bar.low, bar.close, bar.volume
            )?;
        }
        if s.len() > limit {
            writeln!(out, "... and {} more records", s.len() - limit)?;
        }
    }
    Ok(())
}
