use std::num::NonZeroU32;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use clap::Parser;
use derive_more::{Display, Error};
use error_stack::{Report, ResultExt};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use stock_analyzer::analysis::{self, AnalysisParams, AnalysisReport};
use stock_analyzer::config::{self, AppConfig, GeneralConfig, ProviderConfig};
use stock_analyzer::error::{AnalysisError, ProviderError};
use stock_analyzer::export;
use stock_analyzer::model::Column;
use stock_analyzer::notifier::Notifier;
use stock_analyzer::notifier::terminal::TerminalNotifier;
use stock_analyzer::provider::csv_file::CsvFileProvider;
use stock_analyzer::provider::yahoo::YahooProvider;
use stock_analyzer::provider::{FetchRange, PriceProvider};
use stock_analyzer::statistics::average_close;

const DEFAULT_PERIOD: &str = "1mo";

#[derive(Debug, Display, Error)]
pub enum AppError {
    #[display("configuration error")]
    Config,
    #[display("price provider error")]
    Provider,
    #[display("analysis error")]
    Analysis,
    #[display("export error")]
    Export,
}

#[derive(Parser)]
#[command(
    name = "stock-analyzer",
    about = "Stock price indicators, statistics and fluctuation alerts"
)]
struct Cli {
    /// Ticker symbol, e.g. AAPL
    symbol: String,

    /// Path to an optional TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Preset period: 1d, 5d, 1mo, 3mo, 6mo, 1y, 2y, 5y, 10y, ytd, max
    #[arg(short, long, conflicts_with_all = ["start", "end"])]
    period: Option<String>,

    /// First date to include (YYYY-MM-DD)
    #[arg(long, requires = "end")]
    start: Option<NaiveDate>,

    /// Date to stop before (YYYY-MM-DD)
    #[arg(long, requires = "start")]
    end: Option<NaiveDate>,

    /// Fluctuation alert threshold in percent
    #[arg(short, long, allow_hyphen_values = true)]
    threshold: Option<f64>,

    /// Moving average window
    #[arg(short, long)]
    window: Option<usize>,

    /// Price source: "yahoo" or "csv"
    #[arg(long)]
    provider: Option<String>,

    /// Input file for the csv provider
    #[arg(long)]
    csv_input: Option<PathBuf>,

    /// Output CSV path (default: <output_dir>/<SYMBOL>_<period>_stock_data.csv)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    if let Err(report) = run().await {
        eprintln!("{report:?}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Report<AppError>> {
    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => config::load(path).change_context(AppError::Config)?,
        None => AppConfig::default(),
    };
    apply_overrides(&mut config, &cli);
    config::validate(&config).change_context(AppError::Config)?;

    init_tracing(&config.general);

    // ── Fetch ─────────────────────────────────────────────────────────────────
    let range = resolve_range(&cli).change_context(AppError::Provider)?;
    let provider = build_provider(&config.provider).change_context(AppError::Provider)?;

    info!(
        symbol = %cli.symbol,
        range = %range,
        provider = provider.name(),
        "fetching price history"
    );
    let series = provider
        .fetch_history(&cli.symbol, range)
        .await
        .change_context(AppError::Provider)?;

    // ── Analysis ──────────────────────────────────────────────────────────────
    let params = AnalysisParams::from(&config.analysis);
    let report = analysis::run(series, &params).change_context(AppError::Analysis)?;
    log_report(&report).change_context(AppError::Analysis)?;

    let notifier: Box<dyn Notifier> = Box::new(TerminalNotifier);
    let fluctuation = &report.fluctuation;
    if fluctuation.exceeds_threshold {
        notifier.notify(report.series.symbol(), fluctuation);
    } else if let Some(percent) = fluctuation.fluctuation_percent {
        info!(
            threshold_percent = fluctuation.threshold_percent,
            fluctuation_percent = percent,
            "price fluctuated less than the threshold"
        );
    }

    // ── Export ────────────────────────────────────────────────────────────────
    let output = cli.output.clone().unwrap_or_else(|| {
        Path::new(&config.general.output_dir)
            .join(export::default_file_name(report.series.symbol(), &range.label()))
    });
    export::save_csv(&report.series, &output).change_context(AppError::Export)?;

    info!(
        path = %output.display(),
        rows = report.series.len(),
        "data exported"
    );
    Ok(())
}

fn init_tracing(config: &GeneralConfig) {
    let filter = EnvFilter::new(&config.log_level);
    match config.log_format.as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .init();
        }
        _ => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
    }
}

fn apply_overrides(config: &mut AppConfig, cli: &Cli) {
    if let Some(threshold) = cli.threshold {
        config.analysis.threshold_percent = threshold;
    }
    if let Some(window) = cli.window {
        config.analysis.window_size = window;
    }
    if let Some(path) = &cli.csv_input {
        config.provider.csv_path = Some(path.display().to_string());
        config.provider.name = "csv".into();
    }
    if let Some(name) = &cli.provider {
        config.provider.name = name.clone();
    }
}

fn resolve_range(cli: &Cli) -> Result<FetchRange, Report<ProviderError>> {
    match (cli.start, cli.end) {
        (Some(start), Some(end)) => FetchRange::dates(start, end),
        _ => FetchRange::preset(cli.period.as_deref().unwrap_or(DEFAULT_PERIOD)),
    }
}

fn build_provider(
    config: &ProviderConfig,
) -> Result<Box<dyn PriceProvider>, Report<ProviderError>> {
    match (config.name.as_str(), &config.csv_path) {
        ("yahoo", _) => {
            let rate = NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::MIN);
            Ok(Box::new(YahooProvider::with_config(&config.base_url, rate)))
        }
        ("csv", Some(path)) => Ok(Box::new(CsvFileProvider::new(path))),
        (other, _) => Err(Report::new(ProviderError::Request {
            provider: other.to_owned(),
        })
        .attach("provider is not configured")),
    }
}

fn log_report(report: &AnalysisReport) -> Result<(), Report<AnalysisError>> {
    let series = &report.series;
    let average = average_close(series)?;
    info!(
        symbol = series.symbol(),
        from = ?series.first_date(),
        to = ?series.last_date(),
        "average closing price over the period: {average:.2}"
    );

    for (name, value) in report.statistics.entries() {
        match value {
            Some(value) => info!(statistic = name, value, "close statistic"),
            None => warn!(statistic = name, "close statistic undefined"),
        }
    }

    for column in [
        Column::MovingAverage,
        Column::Rsi,
        Column::Macd,
        Column::SignalLine,
    ] {
        let latest = series
            .column(column)
            .and_then(|values| values.last().copied().flatten());
        match latest {
            Some(value) => info!(indicator = %column, value, "latest indicator value"),
            None => info!(indicator = %column, "latest indicator value undefined"),
        }
    }
    Ok(())
}
