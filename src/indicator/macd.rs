use error_stack::{Report, bail};

use crate::error::AnalysisError;
use crate::indicator::Indicator;
use crate::indicator::ma::Ema;
use crate::model::{Column, Series};

/// MACD and signal line values, one per input price.
#[derive(Debug, Clone, PartialEq)]
pub struct MacdLines {
    pub macd: Vec<f64>,
    pub signal: Vec<f64>,
}

pub struct Macd {
    short_span: usize,
    long_span: usize,
    signal_span: usize,
}

impl Macd {
    pub fn new(
        short_span: usize,
        long_span: usize,
        signal_span: usize,
    ) -> Result<Self, Report<AnalysisError>> {
        if short_span == 0 || long_span == 0 || signal_span == 0 {
            bail!(AnalysisError::InvalidParameter {
                name: "all MACD spans must be > 0".into(),
            });
        }
        Ok(Self {
            short_span,
            long_span,
            signal_span,
        })
    }

    /// Calculate the MACD line (short EMA minus long EMA) and its signal line.
    ///
    /// Every EMA is seeded with its first input, so both lines are defined for
    /// every row.
    pub fn calculate_prices(&self, prices: &[f64]) -> Result<MacdLines, Report<AnalysisError>> {
        let short_ema = Ema::new(self.short_span)?.calculate_prices(prices);
        let long_ema = Ema::new(self.long_span)?.calculate_prices(prices);

        let macd: Vec<f64> = short_ema
            .iter()
            .zip(&long_ema)
            .map(|(s, l)| s - l)
            .collect();
        let signal = Ema::new(self.signal_span)?.calculate_prices(&macd);

        Ok(MacdLines { macd, signal })
    }
}

impl Indicator for Macd {
    fn name(&self) -> &str {
        "macd"
    }

    fn columns(&self) -> &'static [Column] {
        &[Column::Macd, Column::SignalLine]
    }

    fn augment(&self, series: Series) -> Result<Series, Report<AnalysisError>> {
        let lines = self.calculate_prices(&series.closes()?)?;
        series
            .with_column(Column::Macd, lines.macd.into_iter().map(Some).collect())?
            .with_column(
                Column::SignalLine,
                lines.signal.into_iter().map(Some).collect(),
            )
    }
}

/// Add `MACD` and `Signal_Line` columns.
pub fn calculate_macd(
    series: Series,
    short: usize,
    long: usize,
    signal: usize,
) -> Result<Series, Report<AnalysisError>> {
    Macd::new(short, long, signal)?.augment(series)
}
