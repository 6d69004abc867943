pub mod ma;
pub mod macd;
pub mod rsi;

use error_stack::Report;

use crate::error::AnalysisError;
use crate::model::{Column, Series};

/// A technical analysis indicator that augments a series with derived columns.
///
/// Implementations read only `Close`, so indicators can be applied in any
/// order. Every produced column has one cell per row; rows without enough
/// history hold `None`.
pub trait Indicator: Send + Sync {
    /// Unique name of this indicator (e.g., "rsi", "sma").
    fn name(&self) -> &str;

    /// Columns written by [`Indicator::augment`].
    fn columns(&self) -> &'static [Column];

    /// Compute the indicator and return the series with its columns added or
    /// overwritten.
    fn augment(&self, series: Series) -> Result<Series, Report<AnalysisError>>;
}

/// Trailing arithmetic mean over `window` cells.
///
/// A row is `None` until a full window is available, and whenever the window
/// contains an undefined cell. `window == 0` or a window longer than the input
/// yields all `None`.
pub fn rolling_mean(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if window == 0 || window > values.len() {
        return out;
    }

    for (i, cells) in values.windows(window).enumerate() {
        out[i + window - 1] = cells
            .iter()
            .copied()
            .sum::<Option<f64>>()
            .map(|sum| sum / window as f64);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rolling_mean_leading_rows_undefined() {
        let values = [Some(1.0), Some(2.0), Some(3.0), Some(4.0)];
        let out = rolling_mean(&values, 3);
        assert_eq!(out, vec![None, None, Some(2.0), Some(3.0)]);
    }

    #[test]
    fn rolling_mean_propagates_undefined_cells() {
        let values = [None, Some(2.0), Some(4.0), Some(6.0)];
        let out = rolling_mean(&values, 2);
        assert_eq!(out, vec![None, None, Some(3.0), Some(5.0)]);
    }

    #[test]
    fn rolling_mean_degenerate_windows() {
        let values = [Some(1.0), Some(2.0)];
        let undefined: Vec<Option<f64>> = vec![None, None];
        assert_eq!(rolling_mean(&values, 0), undefined);
        assert_eq!(rolling_mean(&values, 3), undefined);
        assert!(rolling_mean(&[], 1).is_empty());
    }
}
