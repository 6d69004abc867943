use error_stack::Report;
use tracing::{debug, info};

use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::fluctuation::{FluctuationReport, notify_if_strong_fluctuations};
use crate::indicator::Indicator;
use crate::indicator::ma::Sma;
use crate::indicator::macd::Macd;
use crate::indicator::rsi::Rsi;
use crate::model::Series;
use crate::statistics::{Statistics, calculate_statistics};

/// Explicit parameters for one analysis run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisParams {
    pub window_size: usize,
    pub rsi_window: usize,
    pub macd_short: usize,
    pub macd_long: usize,
    pub macd_signal: usize,
    pub threshold_percent: f64,
}

impl From<&AnalysisConfig> for AnalysisParams {
    fn from(config: &AnalysisConfig) -> Self {
        Self {
            window_size: config.window_size,
            rsi_window: config.rsi_window,
            macd_short: config.macd_short,
            macd_long: config.macd_long,
            macd_signal: config.macd_signal,
            threshold_percent: config.threshold_percent,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnalysisReport {
    /// Input series with `Moving_Average`, `RSI`, `MACD` and `Signal_Line`.
    pub series: Series,
    pub statistics: Statistics,
    pub fluctuation: FluctuationReport,
}

pub fn build_indicators(
    params: &AnalysisParams,
) -> Result<Vec<Box<dyn Indicator>>, Report<AnalysisError>> {
    let macd = Macd::new(params.macd_short, params.macd_long, params.macd_signal)?;
    let indicators: Vec<Box<dyn Indicator>> = vec![
        Box::new(Sma::new(params.window_size)),
        Box::new(Rsi::new(params.rsi_window)),
        Box::new(macd),
    ];
    Ok(indicators)
}

/// Augment `series` with every indicator, then summarize it.
///
/// Structural problems (no rows, missing or non-numeric `Close`) fail before
/// any indicator runs.
pub fn run(series: Series, params: &AnalysisParams) -> Result<AnalysisReport, Report<AnalysisError>> {
    series.closes()?;
    let indicators = build_indicators(params)?;

    info!(
        symbol = series.symbol(),
        rows = series.len(),
        indicators = indicators.len(),
        "running analysis"
    );

    let series = indicators.iter().try_fold(series, |series, indicator| {
        debug!(indicator = indicator.name(), columns = ?indicator.columns(), "applying indicator");
        indicator.augment(series)
    })?;

    let statistics = calculate_statistics(&series)?;
    let fluctuation = notify_if_strong_fluctuations(&series, params.threshold_percent)?;

    Ok(AnalysisReport {
        series,
        statistics,
        fluctuation,
    })
}
