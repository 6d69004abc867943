use std::fmt;

use chrono::NaiveDate;
use error_stack::{Report, bail};
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// Named column of a [`Series`].
///
/// String representations match the tabular export headers (e.g. `"Close"`,
/// `"Moving_Average"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Column {
    Open,
    High,
    Low,
    Close,
    Volume,
    MovingAverage,
    Rsi,
    Macd,
    SignalLine,
}

impl Column {
    /// Parse an export header into a `Column`.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Open" => Some(Self::Open),
            "High" => Some(Self::High),
            "Low" => Some(Self::Low),
            "Close" => Some(Self::Close),
            "Volume" => Some(Self::Volume),
            "Moving_Average" => Some(Self::MovingAverage),
            "RSI" => Some(Self::Rsi),
            "MACD" => Some(Self::Macd),
            "Signal_Line" => Some(Self::SignalLine),
            _ => None,
        }
    }

    /// Return the export header for this column.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::High => "High",
            Self::Low => "Low",
            Self::Close => "Close",
            Self::Volume => "Volume",
            Self::MovingAverage => "Moving_Average",
            Self::Rsi => "RSI",
            Self::Macd => "MACD",
            Self::SignalLine => "Signal_Line",
        }
    }

    /// Whether the column is produced by an indicator rather than fetched.
    pub fn is_derived(self) -> bool {
        matches!(
            self,
            Self::MovingAverage | Self::Rsi | Self::Macd | Self::SignalLine
        )
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One trading period as returned by a price provider.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: f64,
    pub volume: Option<f64>,
}

/// Date-indexed price series with named, row-aligned columns.
///
/// Rows are strictly ascending by date and never reordered. Every column has
/// exactly one cell per row; `None` marks an undefined cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    symbol: String,
    dates: Vec<NaiveDate>,
    columns: Vec<(Column, Vec<Option<f64>>)>,
}

impl Series {
    pub fn new(
        symbol: impl Into<String>,
        dates: Vec<NaiveDate>,
        columns: Vec<(Column, Vec<Option<f64>>)>,
    ) -> Result<Self, Report<AnalysisError>> {
        if let Some(pair) = dates.windows(2).find(|w| w[0] >= w[1]) {
            return Err(Report::new(AnalysisError::InvalidInput {
                reason: "period identifiers must be unique and ascending".into(),
            })
            .attach(format!("{} is followed by {}", pair[0], pair[1])));
        }

        let mut series = Self {
            symbol: symbol.into(),
            dates,
            columns: Vec::with_capacity(columns.len()),
        };
        for (column, values) in columns {
            if series.has_column(column) {
                bail!(AnalysisError::InvalidInput {
                    reason: format!("duplicate column {column}"),
                });
            }
            series = series.with_column(column, values)?;
        }
        Ok(series)
    }

    /// Build a series from fetched bars, which must already be in date order.
    ///
    /// Optional fields become columns only when at least one bar carries them.
    pub fn from_bars(
        symbol: impl Into<String>,
        bars: &[Bar],
    ) -> Result<Self, Report<AnalysisError>> {
        let dates = bars.iter().map(|b| b.date).collect();
        let optional: [(Column, fn(&Bar) -> Option<f64>); 4] = [
            (Column::Open, |b| b.open),
            (Column::High, |b| b.high),
            (Column::Low, |b| b.low),
            (Column::Volume, |b| b.volume),
        ];

        let mut columns = Vec::with_capacity(5);
        for (column, field) in optional {
            let values: Vec<Option<f64>> = bars.iter().map(field).collect();
            if values.iter().any(Option::is_some) {
                columns.push((column, values));
            }
        }
        // Keep the conventional OHLCV order.
        let close = bars.iter().map(|b| Some(b.close)).collect();
        let close_at = columns
            .iter()
            .position(|(c, _)| *c == Column::Volume)
            .unwrap_or(columns.len());
        columns.insert(close_at, (Column::Close, close));

        Self::new(symbol, dates, columns)
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    pub fn has_column(&self, column: Column) -> bool {
        self.columns.iter().any(|(c, _)| *c == column)
    }

    pub fn column(&self, column: Column) -> Option<&[Option<f64>]> {
        self.columns
            .iter()
            .find(|(c, _)| *c == column)
            .map(|(_, values)| values.as_slice())
    }

    /// Columns in insertion order.
    pub fn columns(&self) -> impl Iterator<Item = (Column, &[Option<f64>])> {
        self.columns.iter().map(|(c, v)| (*c, v.as_slice()))
    }

    /// Add `column`, or overwrite it in place when it already exists.
    pub fn with_column(
        mut self,
        column: Column,
        values: Vec<Option<f64>>,
    ) -> Result<Self, Report<AnalysisError>> {
        if values.len() != self.dates.len() {
            bail!(AnalysisError::InvalidInput {
                reason: format!(
                    "column {column} has {} values for {} rows",
                    values.len(),
                    self.dates.len()
                ),
            });
        }

        match self.columns.iter_mut().find(|(c, _)| *c == column) {
            Some((_, existing)) => *existing = values,
            None => self.columns.push((column, values)),
        }
        Ok(self)
    }

    /// Closing prices, one per row.
    ///
    /// Fails with `DataUnavailable` on a zero-row series and with
    /// `InvalidInput` when `Close` is missing or any cell is not a finite
    /// number.
    pub fn closes(&self) -> Result<Vec<f64>, Report<AnalysisError>> {
        if self.is_empty() {
            bail!(AnalysisError::DataUnavailable {
                reason: format!("series for {} has no rows", self.symbol),
            });
        }

        let Some(cells) = self.column(Column::Close) else {
            bail!(AnalysisError::InvalidInput {
                reason: format!("series for {} has no Close column", self.symbol),
            });
        };

        cells
            .iter()
            .zip(&self.dates)
            .map(|(cell, date)| match cell {
                Some(v) if v.is_finite() => Ok(*v),
                _ => Err(Report::new(AnalysisError::InvalidInput {
                    reason: "Close must be numeric for every row".into(),
                })
                .attach(format!("date: {date}"))),
            })
            .collect()
    }

    /// Rows with `start <= date < end`; an absent bound is unbounded.
    pub fn between(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        let from = start.map_or(0, |s| self.dates.partition_point(|d| *d < s));
        let to = end.map_or(self.dates.len(), |e| self.dates.partition_point(|d| *d < e));
        let to = to.max(from);

        Self {
            symbol: self.symbol.clone(),
            dates: self.dates[from..to].to_vec(),
            columns: self
                .columns
                .iter()
                .map(|(c, v)| (*c, v[from..to].to_vec()))
                .collect(),
        }
    }
}
