use market_returns::config::{Config, RenderConfig, ReturnThresholds};
use market_returns::data_provider::PriceDataProvider;
use market_returns::models::price::PriceSeries;
use market_returns::report;
use market_returns::services::analysis_service::AnalysisService;
use market_returns::sources::base::PriceSource;
use market_returns::sources::yahoo::YahooSource;
use market_returns::util;

use anyhow::{bail, Context};
use clap::{App, Arg, ArgMatches, SubCommand};
use chrono::NaiveDate;
use log::{error, info};
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

fn date_arg(matches: &ArgMatches, name: &str) -> anyhow::Result<NaiveDate> {
    let value = matches.value_of(name).context(format!("missing --{}", name))?;
    util::parse_date(value).with_context(|| format!("invalid --{} '{}', expected YYYY-MM-DD", name, value))
}

fn number_arg<T: std::str::FromStr>(matches: &ArgMatches, name: &str, default: T) -> anyhow::Result<T> {
    match matches.value_of(name) {
        Some(v) => v.parse::<T>().map_err(|_| anyhow::anyhow!("invalid --{} '{}'", name, v)),
        None => Ok(default),
    }
}

fn windows_arg(matches: &ArgMatches) -> anyhow::Result<Vec<u32>> {
    let list = matches.value_of("windows").unwrap_or("5,10,15,20");
    let windows = list
        .split(',')
        .map(str::trim)
        .filter(|w| !w.is_empty())
        .map(|w| w.parse::<u32>().map_err(|_| anyhow::anyhow!("invalid rolling window '{}'", w)))
        .collect::<anyhow::Result<Vec<u32>>>()?;
    if windows.is_empty() || windows.contains(&0) {
        bail!("rolling windows must be positive year counts");
    }
    Ok(windows)
}

fn build_sources(config: &Config) -> anyhow::Result<Vec<Arc<dyn PriceSource + Send + Sync>>> {
    let price_file = config.price_file();
    let local = PriceDataProvider::load_from_file(&price_file.to_string_lossy())
        .with_context(|| format!("failed to read {}", price_file.display()))?;
    let local: Arc<dyn PriceSource + Send + Sync> = Arc::new(local);

    if config.offline {
        info!("Offline mode: using {}", price_file.display());
        return Ok(vec![local]);
    }

    let yahoo: Arc<dyn PriceSource + Send + Sync> =
        Arc::new(YahooSource::with_request_interval(config.request_interval)?);
    Ok(vec![yahoo, local])
}

async fn run_yearly(config: Config, matches: &ArgMatches) -> anyhow::Result<()> {
    let symbol = matches.value_of("symbol").unwrap_or("^GSPC");
    let start = date_arg(matches, "start")?;
    let end = date_arg(matches, "end")?;

    let sources = build_sources(&config)?;
    let service = AnalysisService::new(config, sources);
    let index = service
        .analyze_index(symbol, &start, &end)
        .await
        .with_context(|| format!("failed to analyze {}", symbol))?;

    let config = service.config();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    if let Err(e) = report::rendering(report::write_yearly_breakdown(
        &mut out,
        &index.yearly,
        &config.thresholds,
        config.verification_rows,
    )) {
        error!("Error printing yearly breakdown: {}", e);
    }

    let title = format!("{} Yearly Returns ({} to {})", symbol, start, end);
    if let Err(e) = report::rendering(report::write_yearly_chart(
        &mut out,
        &title,
        &index.yearly,
        &config.thresholds,
        &config.render,
    )) {
        error!("Error creating chart: {}", e);
    }

    let title = format!("{} Returns Distribution", symbol);
    if let Err(e) = report::rendering(report::write_distribution(&mut out, &title, &index.yearly, &config.thresholds)) {
        error!("Error creating distribution: {}", e);
    }

    if let Err(e) = report::rendering(report::write_rolling_summary(
        &mut out,
        &index.rolling,
        &config.thresholds,
        &config.render,
    )) {
        error!("Error printing rolling returns: {}", e);
    }

    Ok(())
}

async fn run_weekly(config: Config, matches: &ArgMatches) -> anyhow::Result<()> {
    let tickers = util::parse_symbol_list(matches.value_of("tickers").unwrap_or("TSLA,PLTR,MSFT"));
    if tickers.is_empty() {
        bail!("no tickers given");
    }
    let start = date_arg(matches, "start")?;
    let end = date_arg(matches, "end")?;
    let json = matches.is_present("json");
    let charts = !matches.is_present("no-chart");

    let sources = build_sources(&config)?;
    let service = AnalysisService::new(config, sources);
    let outcome = service.analyze_stocks(&tickers, &start, &end).await;

    let render = &service.config().render;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    if json {
        let stats: Vec<_> = outcome.reports.iter().map(|r| &r.stats).collect();
        serde_json::to_writer_pretty(&mut out, &stats)?;
        writeln!(out)?;
        return Ok(());
    }

    for report in &outcome.reports {
        if let Err(e) = report::rendering(report::write_weekly_stats(&mut out, &report.stats, render)) {
            error!("Error printing statistics for {}: {}", report.stats.ticker, e);
        }
        if charts {
            if let Err(e) = report::rendering(report::write_weekly_chart(&mut out, report, render)) {
                error!("Error creating plot for {}: {}", report.stats.ticker, e);
            }
        }
    }

    if let Err(e) = report::rendering(report::write_summary_table(&mut out, &outcome, render)) {
        error!("Error printing summary: {}", e);
    }

    Ok(())
}

async fn run_fetch(config: Config, matches: &ArgMatches) -> anyhow::Result<()> {
    let symbols = util::parse_symbol_list(matches.value_of("symbols").unwrap_or_default());
    if symbols.is_empty() {
        bail!("no symbols given");
    }
    let start = date_arg(matches, "start")?;
    let end = date_arg(matches, "end")?;

    let yahoo: Arc<dyn PriceSource + Send + Sync> =
        Arc::new(YahooSource::with_request_interval(config.request_interval)?);
    let service = AnalysisService::new(config, vec![yahoo]);
    let stored = service.download(&symbols, &start, &end).await?;

    info!("Fetched {} of {} symbols", stored, symbols.len());
    Ok(())
}

fn run_explore(config: &Config, matches: &ArgMatches) -> anyhow::Result<()> {
    let symbol_filter = matches.value_of("symbol").map(|s| s.to_uppercase());
    let limit = number_arg(matches, "limit", 10usize)?;

    let price_file = config.price_file();
    let provider = PriceDataProvider::load_from_file(&price_file.to_string_lossy())?;
    info!("Found {} series in {}", provider.get_all_series().len(), price_file.display());
    if let Some(latest) = provider.get_latest_trading_date() {
        info!("Latest trading date: {}", latest);
    }

    let filtered: Vec<&PriceSeries> = provider
        .get_all_series()
        .iter()
        .filter(|s| symbol_filter.as_ref().map_or(true, |f| s.symbol.contains(f.as_str())))
        .collect();
    info!("Filtered to {} series", filtered.len());

    let stdout = io::stdout();
    let mut out = stdout.lock();
    report::rendering(report::write_series_overview(&mut out, &filtered, limit))?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let today = chrono::Local::now().format("%Y-%m-%d").to_string();

    let offline_arg = Arg::with_name("offline")
        .long("offline")
        .help("Only use price data stored by the fetch command")
        .takes_value(false);

    let app = App::new("market_returns")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Yearly return buckets, rolling returns and weekly up/down statistics")
        .arg(
            Arg::with_name("data-dir")
                .long("data-dir")
                .value_name("DIR")
                .help("Directory holding prices.arrow")
                .takes_value(true)
                .global(true)
                .default_value("data"),
        )
        .arg(
            Arg::with_name("request-interval")
                .long("request-interval")
                .value_name("MS")
                .help("Minimum delay between Yahoo requests in milliseconds")
                .takes_value(true)
                .global(true)
                .default_value("500"),
        )
        .arg(
            Arg::with_name("precision")
                .long("precision")
                .help("Decimal places in printed percentages and prices")
                .takes_value(true)
                .global(true)
                .default_value("2"),
        )
        .subcommand(
            SubCommand::with_name("yearly")
                .about("Categorize yearly returns of an index and compute rolling returns")
                .arg(Arg::with_name("symbol").short('s').long("symbol").takes_value(true).default_value("^GSPC"))
                .arg(Arg::with_name("start").long("start").takes_value(true).default_value("1926-01-01"))
                .arg(Arg::with_name("end").long("end").takes_value(true).default_value("2025-01-01"))
                .arg(
                    Arg::with_name("good-threshold")
                        .long("good-threshold")
                        .help("Yearly return (%) at or above which a year counts as good")
                        .takes_value(true)
                        .default_value("6"),
                )
                .arg(
                    Arg::with_name("down-threshold")
                        .long("down-threshold")
                        .help("Yearly return (%) below which a year counts as down")
                        .takes_value(true)
                        .default_value("0"),
                )
                .arg(
                    Arg::with_name("rows")
                        .long("rows")
                        .help("Number of first/last years printed for verification")
                        .takes_value(true)
                        .default_value("5"),
                )
                .arg(
                    Arg::with_name("windows")
                        .long("windows")
                        .help("Comma separated rolling windows in years")
                        .takes_value(true)
                        .default_value("5,10,15,20"),
                )
                .arg(
                    Arg::with_name("trading-days")
                        .long("trading-days")
                        .help("Trading days per year used to size rolling windows")
                        .takes_value(true)
                        .default_value("252"),
                )
                .arg(
                    Arg::with_name("label-min")
                        .long("label-min")
                        .help("Smallest absolute yearly return (%) labelled on the chart")
                        .takes_value(true)
                        .default_value("3"),
                )
                .arg(Arg::with_name("chart-width").long("chart-width").takes_value(true).default_value("40"))
                .arg(offline_arg.clone()),
        )
        .subcommand(
            SubCommand::with_name("weekly")
                .about("Summarize weekly up/down performance of individual stocks")
                .arg(
                    Arg::with_name("tickers")
                        .short('t')
                        .long("tickers")
                        .help("Comma separated ticker list")
                        .takes_value(true)
                        .default_value("TSLA,PLTR,MSFT"),
                )
                .arg(Arg::with_name("start").long("start").takes_value(true).default_value("2024-01-01"))
                .arg(Arg::with_name("end").long("end").takes_value(true).default_value(&today))
                .arg(Arg::with_name("json").long("json").help("Print the statistics as JSON").takes_value(false))
                .arg(Arg::with_name("no-chart").long("no-chart").help("Skip the weekly bar charts").takes_value(false))
                .arg(Arg::with_name("chart-width").long("chart-width").takes_value(true).default_value("40"))
                .arg(offline_arg),
        )
        .subcommand(
            SubCommand::with_name("fetch")
                .about("Download daily prices from Yahoo Finance into the local price file")
                .arg(
                    Arg::with_name("symbols")
                        .short('s')
                        .long("symbols")
                        .value_name("SYMBOLS")
                        .help("Comma separated symbol list")
                        .required(true)
                        .takes_value(true),
                )
                .arg(Arg::with_name("start").long("start").takes_value(true).default_value("1926-01-01"))
                .arg(Arg::with_name("end").long("end").takes_value(true).default_value(&today)),
        )
        .subcommand(
            SubCommand::with_name("explore")
                .about("List series stored in the local price file")
                .arg(Arg::with_name("symbol").short('s').long("symbol").takes_value(true))
                .arg(Arg::with_name("limit").short('l').long("limit").takes_value(true).default_value("10")),
        );

    let matches = app.get_matches();
    let data_dir = matches.value_of("data-dir").unwrap_or("data").to_string();
    let base = Config::new()
        .with_data_dir(&data_dir)
        .with_request_interval(Duration::from_millis(number_arg(&matches, "request-interval", 500u64)?));
    let precision = number_arg(&matches, "precision", 2usize)?;

    match matches.subcommand() {
        Some(("yearly", sub)) => {
            let thresholds = ReturnThresholds::new(
                number_arg(sub, "down-threshold", 0.0)?,
                number_arg(sub, "good-threshold", 6.0)?,
            )?;
            let trading_days = number_arg(sub, "trading-days", 252usize)?;
            if trading_days == 0 {
                bail!("--trading-days must be positive");
            }
            let render = RenderConfig::new()
                .with_chart_width(number_arg(sub, "chart-width", 40usize)?)
                .with_label_min_abs_pct(number_arg(sub, "label-min", 3.0)?)
                .with_precision(number_arg(sub, "precision", precision)?);
            let config = base
                .with_thresholds(thresholds)
                .with_rolling_windows(windows_arg(sub)?)
                .with_trading_days_per_year(trading_days)
                .with_verification_rows(number_arg(sub, "rows", 5usize)?)
                .with_offline(sub.is_present("offline"))
                .with_render(render);
            run_yearly(config, sub).await
        }
        Some(("weekly", sub)) => {
            let render = RenderConfig::new()
                .with_chart_width(number_arg(sub, "chart-width", 40usize)?)
                .with_precision(number_arg(sub, "precision", precision)?);
            let config = base.with_offline(sub.is_present("offline")).with_render(render);
            run_weekly(config, sub).await
        }
        Some(("fetch", sub)) => run_fetch(base, sub).await,
        Some(("explore", sub)) => run_explore(&base, sub),
        _ => {
            info!("No command specified. Use --help for usage information.");
            Ok(())
        }
    }
}
