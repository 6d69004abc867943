use std::iter;

use error_stack::Report;

use crate::error::AnalysisError;
use crate::indicator::{Indicator, rolling_mean};
use crate::model::{Column, Series};

/// RSI (Relative Strength Index) from simple rolling means of gains and losses.
///
/// The first close has no predecessor, so the first `window` rows are
/// undefined. A window with no losses saturates at exactly 100.
pub struct Rsi {
    window: usize,
}

impl Rsi {
    pub fn new(window: usize) -> Self {
        Self { window }
    }

    pub fn calculate_prices(&self, prices: &[f64]) -> Vec<Option<f64>> {
        let deltas: Vec<Option<f64>> = iter::once(None)
            .chain(prices.windows(2).map(|w| Some(w[1] - w[0])))
            .collect();

        let gains: Vec<Option<f64>> = deltas.iter().map(|d| d.map(|d| d.max(0.0))).collect();
        let losses: Vec<Option<f64>> = deltas.iter().map(|d| d.map(|d| (-d).max(0.0))).collect();

        let avg_gains = rolling_mean(&gains, self.window);
        let avg_losses = rolling_mean(&losses, self.window);

        avg_gains
            .into_iter()
            .zip(avg_losses)
            .map(|(gain, loss)| Some(rsi_value(gain?, loss?)))
            .collect()
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        "rsi"
    }

    fn columns(&self) -> &'static [Column] {
        &[Column::Rsi]
    }

    fn augment(&self, series: Series) -> Result<Series, Report<AnalysisError>> {
        let values = self.calculate_prices(&series.closes()?);
        series.with_column(Column::Rsi, values)
    }
}

/// Add an `RSI` column computed over `window` periods.
pub fn calculate_rsi(series: Series, window: usize) -> Result<Series, Report<AnalysisError>> {
    Rsi::new(window).augment(series)
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    100.0 - 100.0 / (1.0 + rs)
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
    fn rsi_warm_up_equals_window() {
        let values = Rsi::new(14).calculate_prices(&[100.0_f64; 20]);
        assert_eq!(values.len(), 20);
        assert!(values[..14].iter().all(Option::is_none));
        assert!(values[14..].iter().all(Option::is_some));
    }

    #[test]
    fn rsi_constant_prices_saturate_at_100() {
        let values = Rsi::new(3).calculate_prices(&[10.0; 8]);
        for v in values.iter().skip(3) {
            assert_eq!(*v, Some(100.0));
        }
    }

    #[test]
    fn rsi_all_gains_returns_100() {
        let values = Rsi::new(3).calculate_prices(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(values[3], Some(100.0));
    }

    #[test]
    fn rsi_all_losses_returns_0() {
        let values = Rsi::new(3).calculate_prices(&[4.0, 3.0, 2.0, 1.0]);
        assert!((values[3].unwrap() - 0.0).abs() < 1e-9);
    }

    #[test]
    fn rsi_known_value() {
        // deltas: +2, -1, +1 -> avg_gain = 1, avg_loss = 1/3, RS = 3 -> RSI = 75
        let values = Rsi::new(3).calculate_prices(&[10.0, 12.0, 11.0, 12.0]);
        assert!((values[3].unwrap() - 75.0).abs() < 1e-9);
    }

    #[test]
    fn rsi_stays_in_bounds() {
        let closes = [44.3, 44.1, 44.2, 43.6, 44.3, 44.8, 45.1, 45.4, 45.8, 46.1, 45.9];
        let values = Rsi::new(5).calculate_prices(&closes);
        for v in values.into_iter().flatten() {
            assert!((0.0..=100.0).contains(&v));
        }
    }

    #[test]
    fn rsi_window_longer_than_series_is_all_undefined() {
        let series = calculate_rsi(series_from_closes(&[1.0, 2.0, 3.0]), 14).unwrap();
        let values = series.column(Column::Rsi).unwrap();
        assert_eq!(values.len(), 3);
        assert!(values.iter().all(Option::is_none));
    }

    #[test]
    fn rsi_missing_close_is_invalid_input() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let series = Series::new("TEST", vec![date], vec![(Column::Open, vec![Some(1.0)])]).unwrap();
        let err = calculate_rsi(series, 14).unwrap_err();
        assert!(matches!(
            err.current_context(),
            AnalysisError::InvalidInput { .. }
        ));
    }

    #[test]
    fn rsi_empty_series_rejected() {
        assert!(calculate_rsi(series_from_closes(&[]), 14).is_err());
    }
}
