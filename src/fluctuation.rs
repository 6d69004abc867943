use error_stack::Report;
use serde::Serialize;
use tracing::warn;

use crate::error::AnalysisError;
use crate::model::Series;

/// Outcome of a fluctuation check over the whole series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FluctuationReport {
    pub threshold_percent: f64,
    pub max_close: f64,
    pub min_close: f64,
    /// `(max - min) / min * 100`; `None` when the minimum close is zero.
    pub fluctuation_percent: Option<f64>,
    pub exceeds_threshold: bool,
}

impl FluctuationReport {
    pub fn is_undefined(&self) -> bool {
        self.fluctuation_percent.is_none()
    }
}

/// Compare the series' percentage range against `threshold_percent`.
///
/// The alert fires on a strictly greater fluctuation. The threshold is not
/// range-checked: a negative threshold fires for any defined fluctuation, a
/// zero threshold for any movement at all. An undefined fluctuation never
/// fires.
pub fn notify_if_strong_fluctuations(
    series: &Series,
    threshold_percent: f64,
) -> Result<FluctuationReport, Report<AnalysisError>> {
    let closes = series.closes()?;
    let max_close = closes.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min_close = closes.iter().copied().fold(f64::INFINITY, f64::min);

    let fluctuation_percent = if min_close == 0.0 {
        warn!(
            symbol = series.symbol(),
            max_close, "undefined fluctuation: minimum close is zero"
        );
        None
    } else {
        Some((max_close - min_close) / min_close * 100.0)
    };

    Ok(FluctuationReport {
        threshold_percent,
        max_close,
        min_close,
        fluctuation_percent,
        exceeds_threshold: fluctuation_percent.is_some_and(|f| f > threshold_percent),
    })
}
