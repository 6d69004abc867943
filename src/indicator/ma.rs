use error_stack::{Report, bail};
use tracing::debug;

use crate::error::AnalysisError;
use crate::indicator::{Indicator, rolling_mean};
use crate::model::{Column, Series};

/// Simple Moving Average of `Close`, written to `Moving_Average`.
pub struct Sma {
    window: usize,
}

impl Sma {
    /// Degenerate windows (zero, or longer than the series) are accepted and
    /// leave every row undefined.
    pub fn new(window: usize) -> Self {
        Self { window }
    }

    /// Calculate SMA values from a price slice, aligned with the input.
    pub fn calculate_prices(&self, prices: &[f64]) -> Vec<Option<f64>> {
        let cells: Vec<Option<f64>> = prices.iter().copied().map(Some).collect();
        rolling_mean(&cells, self.window)
    }
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        "sma"
    }

    fn columns(&self) -> &'static [Column] {
        &[Column::MovingAverage]
    }

    fn augment(&self, series: Series) -> Result<Series, Report<AnalysisError>> {
        let prices = series.closes()?;
        if self.window == 0 || self.window > prices.len() {
            debug!(
                symbol = series.symbol(),
                window = self.window,
                rows = prices.len(),
                "moving average window leaves every row undefined"
            );
        }
        let values = self.calculate_prices(&prices);
        series.with_column(Column::MovingAverage, values)
    }
}

/// Add a `Moving_Average` column with the trailing mean of `window_size` closes.
pub fn add_moving_average(
    series: Series,
    window_size: usize,
) -> Result<Series, Report<AnalysisError>> {
    Sma::new(window_size).augment(series)
}

/// Exponential Moving Average with span-based decay, `alpha = 2 / (span + 1)`.
pub struct Ema {
    span: usize,
}

impl Ema {
    pub fn new(span: usize) -> Result<Self, Report<AnalysisError>> {
        if span == 0 {
            bail!(AnalysisError::InvalidParameter {
                name: "span must be > 0".into(),
            });
        }
        Ok(Self { span })
    }

    pub fn alpha(&self) -> f64 {
        2.0 / (self.span as f64 + 1.0)
    }

    /// Calculate EMA values from a price slice, one per input value.
    ///
    /// The first value seeds the recurrence, so there is no warm-up region.
    pub fn calculate_prices(&self, prices: &[f64]) -> Vec<f64> {
        let alpha = self.alpha();
        prices
            .iter()
            .scan(None, |prev: &mut Option<f64>, &price| {
                let ema = match *prev {
                    Some(p) => alpha * price + (1.0 - alpha) * p,
                    None => price,
                };
                *prev = Some(ema);
                Some(ema)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
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
    fn sma_defined_count_and_values() {
        let closes = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let window = 3;
        let series = add_moving_average(series_from_closes(&closes), window).unwrap();
        let values = series.column(Column::MovingAverage).unwrap();

        assert_eq!(values.len(), closes.len());
        assert_eq!(
            values.iter().filter(|v| v.is_some()).count(),
            closes.len() - window + 1
        );
        assert!(values[..window - 1].iter().all(Option::is_none));
        for (i, value) in values.iter().enumerate().skip(window - 1) {
            let expected = closes[i + 1 - window..=i].iter().sum::<f64>() / window as f64;
            assert!((value.unwrap() - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn sma_window_longer_than_series_is_all_undefined() {
        let series = add_moving_average(series_from_closes(&[1.0, 2.0]), 5).unwrap();
        let values = series.column(Column::MovingAverage).unwrap();
        assert!(values.len() == 2 && values.iter().all(Option::is_none));
    }

    #[test]
    fn sma_zero_window_is_all_undefined() {
        let series = add_moving_average(series_from_closes(&[1.0, 2.0]), 0).unwrap();
        assert!(
            series
                .column(Column::MovingAverage)
                .unwrap()
                .iter()
                .all(Option::is_none)
        );
    }

    #[test]
    fn sma_reapplication_is_idempotent() {
        let once = add_moving_average(series_from_closes(&[3.0, 1.0, 4.0, 1.0, 5.0]), 2).unwrap();
        let twice = add_moving_average(once.clone(), 2).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn sma_empty_series_rejected() {
        let result = add_moving_average(series_from_closes(&[]), 3);
        assert!(matches!(
            result.unwrap_err().current_context(),
            AnalysisError::DataUnavailable { .. }
        ));
    }

    #[test]
    fn ema_span_zero_invalid() {
        assert!(Ema::new(0).is_err());
    }

    #[test]
    fn ema_seeds_with_first_price() {
        let values = Ema::new(3).unwrap().calculate_prices(&[10.0, 12.0, 8.0]);
        // alpha = 0.5
        assert_eq!(values.len(), 3);
        assert!((values[0] - 10.0).abs() < 1e-12);
        assert!((values[1] - 11.0).abs() < 1e-12);
        assert!((values[2] - 9.5).abs() < 1e-12);
    }

    #[test]
    fn ema_flat_prices() {
        let values = Ema::new(5).unwrap().calculate_prices(&[7.0; 6]);
        for v in &values {
            assert!((v - 7.0).abs() < 1e-12);
        }
    }
}
