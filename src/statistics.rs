use error_stack::Report;
use serde::Serialize;
use tracing::warn;

use crate::error::AnalysisError;
use crate::model::Series;

/// Full-history descriptive statistics of `Close`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Statistics {
    pub mean_close: f64,
    /// Sample standard deviation (divisor n - 1); undefined for a single row.
    pub std_dev_close: Option<f64>,
    pub min_close: f64,
    pub max_close: f64,
    pub median_close: f64,
}

impl Statistics {
    /// The statistics as a name-to-value mapping, in a fixed order.
    pub fn entries(&self) -> [(&'static str, Option<f64>); 5] {
        [
            ("mean_close", Some(self.mean_close)),
            ("std_dev_close", self.std_dev_close),
            ("min_close", Some(self.min_close)),
            ("max_close", Some(self.max_close)),
            ("median_close", Some(self.median_close)),
        ]
    }
}

pub fn calculate_statistics(series: &Series) -> Result<Statistics, Report<AnalysisError>> {
    let closes = series.closes()?;
    let mean_close = mean(&closes);

    let std_dev_close = sample_std_dev(&closes, mean_close);
    if std_dev_close.is_none() {
        warn!(
            symbol = series.symbol(),
            rows = closes.len(),
            "standard deviation undefined for a single observation"
        );
    }

    Ok(Statistics {
        mean_close,
        std_dev_close,
        min_close: closes.iter().copied().fold(f64::INFINITY, f64::min),
        max_close: closes.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        median_close: median(&closes),
    })
}

/// Average closing price over the whole series.
pub fn average_close(series: &Series) -> Result<f64, Report<AnalysisError>> {
    Ok(mean(&series.closes()?))
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn sample_std_dev(values: &[f64], mean: f64) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(variance.sqrt())
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Column;
    use chrono::{Days, NaiveDate};

    fn series_from_closes(closes: &[f64]) -> Series {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let dates = (0..closes.len())
            .map(|i| start + Days::new(i as u64))
            .collect();
        let cells = closes.iter().copied().map(Some).collect();
        Series::new("TEST", dates, vec![(Column::Close, cells)]).unwrap()
    }

    #[test]
    fn statistics_known_values() {
        let stats = calculate_statistics(&series_from_closes(&[10.0, 20.0, 30.0])).unwrap();
        assert!((stats.mean_close - 20.0).abs() < 1e-9);
        assert!((stats.std_dev_close.unwrap() - 10.0).abs() < 1e-9);
        assert_eq!(stats.min_close, 10.0);
        assert_eq!(stats.max_close, 30.0);
        assert_eq!(stats.median_close, 20.0);
    }

    #[test]
    fn statistics_even_length_median() {
        let stats = calculate_statistics(&series_from_closes(&[4.0, 1.0, 3.0, 2.0])).unwrap();
        assert_eq!(stats.median_close, 2.5);
        assert_eq!(stats.min_close, 1.0);
        assert_eq!(stats.max_close, 4.0);
    }

    #[test]
    fn statistics_single_row_has_undefined_std_dev() {
        let stats = calculate_statistics(&series_from_closes(&[42.0])).unwrap();
        assert_eq!(stats.std_dev_close, None);
        assert_eq!(stats.mean_close, 42.0);
        assert_eq!(stats.median_close, 42.0);
    }

    #[test]
    fn statistics_do_not_touch_series() {
        let series = series_from_closes(&[1.0, 2.0, 3.0]);
        let before = series.clone();
        calculate_statistics(&series).unwrap();
        assert_eq!(series, before);
    }

    #[test]
    fn statistics_empty_series_rejected() {
        let err = calculate_statistics(&series_from_closes(&[])).unwrap_err();
        assert!(matches!(
            err.current_context(),
            AnalysisError::DataUnavailable { .. }
        ));
    }

    #[test]
    fn entries_are_named() {
        let stats = calculate_statistics(&series_from_closes(&[10.0, 20.0, 30.0])).unwrap();
        let names: Vec<&str> = stats.entries().iter().map(|(name, _)| *name).collect();
        assert_eq!(
            names,
            ["mean_close", "std_dev_close", "min_close", "max_close", "median_close"]
        );
    }

    #[test]
    fn average_close_matches_mean() {
        let avg = average_close(&series_from_closes(&[1.0, 2.0, 6.0])).unwrap();
        assert!((avg - 3.0).abs() < 1e-12);
    }
}
