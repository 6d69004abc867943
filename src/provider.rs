pub mod csv_file;
pub mod yahoo;

use std::fmt;

use chrono::{Datelike, Days, Months, NaiveDate};
use error_stack::{Report, bail};
use futures::future::BoxFuture;

use crate::error::ProviderError;
use crate::model::Series;

/// Named look-back period accepted by [`FetchRange::Preset`].
///
/// String representations match the command-line format (e.g. `"1mo"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Period {
    Day1,
    Day5,
    Month1,
    Month3,
    Month6,
    Year1,
    Year2,
    Year5,
    Year10,
    YearToDate,
    Max,
}

impl Period {
    /// Parse a command-line string into a `Period`.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "1d" => Some(Self::Day1),
            "5d" => Some(Self::Day5),
            "1mo" => Some(Self::Month1),
            "3mo" => Some(Self::Month3),
            "6mo" => Some(Self::Month6),
            "1y" => Some(Self::Year1),
            "2y" => Some(Self::Year2),
            "5y" => Some(Self::Year5),
            "10y" => Some(Self::Year10),
            "ytd" => Some(Self::YearToDate),
            "max" => Some(Self::Max),
            _ => None,
        }
    }

    /// Return the command-line string, which is also Yahoo's `range` value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Day1 => "1d",
            Self::Day5 => "5d",
            Self::Month1 => "1mo",
            Self::Month3 => "3mo",
            Self::Month6 => "6mo",
            Self::Year1 => "1y",
            Self::Year2 => "2y",
            Self::Year5 => "5y",
            Self::Year10 => "10y",
            Self::YearToDate => "ytd",
            Self::Max => "max",
        }
    }

    /// First calendar date covered when the period ends on `last` (inclusive).
    ///
    /// `None` means unbounded.
    pub fn first_day(self, last: NaiveDate) -> Option<NaiveDate> {
        let back_months = |n: u32| {
            last.checked_sub_months(Months::new(n))
                .and_then(|d| d.checked_add_days(Days::new(1)))
        };
        match self {
            Self::Day1 => Some(last),
            Self::Day5 => last.checked_sub_days(Days::new(4)),
            Self::Month1 => back_months(1),
            Self::Month3 => back_months(3),
            Self::Month6 => back_months(6),
            Self::Year1 => back_months(12),
            Self::Year2 => back_months(24),
            Self::Year5 => back_months(60),
            Self::Year10 => back_months(120),
            Self::YearToDate => NaiveDate::from_ymd_opt(last.year(), 1, 1),
            Self::Max => None,
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What part of an instrument's history to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchRange {
    Preset(Period),
    /// Daily rows with `start <= date < end`.
    Dates { start: NaiveDate, end: NaiveDate },
}

impl FetchRange {
    pub fn preset(period: &str) -> Result<Self, Report<ProviderError>> {
        match Period::from_str(period) {
            Some(p) => Ok(Self::Preset(p)),
            None => bail!(ProviderError::DataUnavailable {
                reason: format!("unknown period \"{period}\""),
            }),
        }
    }

    pub fn dates(start: NaiveDate, end: NaiveDate) -> Result<Self, Report<ProviderError>> {
        if start >= end {
            bail!(ProviderError::DataUnavailable {
                reason: format!("start date {start} is not before end date {end}"),
            });
        }
        Ok(Self::Dates { start, end })
    }

    /// Label used in export file names: `1mo`, or `2024-01-01_to_2024-02-01`.
    pub fn label(&self) -> String {
        match self {
            Self::Preset(p) => p.as_str().to_owned(),
            Self::Dates { start, end } => format!("{start}_to_{end}"),
        }
    }
}

impl fmt::Display for FetchRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Source of historical daily prices.
///
/// Uses `BoxFuture` (from `futures` crate) instead of `async fn` in trait
/// to keep the trait object-safe (`dyn PriceProvider`).
pub trait PriceProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Fetch the daily series of `symbol` for `range`, oldest row first.
    ///
    /// Never returns an empty series: no rows is `ProviderError::DataUnavailable`.
    fn fetch_history(
        &self,
        symbol: &str,
        range: FetchRange,
    ) -> BoxFuture<'_, Result<Series, Report<ProviderError>>>;
}

pub(crate) fn validate_symbol(symbol: &str) -> Result<&str, Report<ProviderError>> {
    let trimmed = symbol.trim();
    if trimmed.is_empty() || trimmed.contains(char::is_whitespace) {
        bail!(ProviderError::InvalidSymbol {
            symbol: symbol.to_owned(),
        });
    }
    Ok(trimmed)
}

pub(crate) fn ensure_not_empty(
    series: Series,
    range: FetchRange,
) -> Result<Series, Report<ProviderError>> {
    if series.is_empty() {
        bail!(ProviderError::DataUnavailable {
            reason: format!("no trading data for {} in {range}", series.symbol()),
        });
    }
    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn period_round_trip() {
        let periods = [
            ("1d", Period::Day1),
            ("5d", Period::Day5),
            ("1mo", Period::Month1),
            ("3mo", Period::Month3),
            ("6mo", Period::Month6),
            ("1y", Period::Year1),
            ("2y", Period::Year2),
            ("5y", Period::Year5),
            ("10y", Period::Year10),
            ("ytd", Period::YearToDate),
            ("max", Period::Max),
        ];
        for (s, p) in periods {
            assert_eq!(Period::from_str(s), Some(p));
            assert_eq!(p.as_str(), s);
        }
    }

    #[test]
    fn period_invalid_string_returns_none() {
        assert_eq!(Period::from_str("2w"), None);
        assert_eq!(Period::from_str(""), None);
        assert!(FetchRange::preset("1week").is_err());
    }

    #[test]
    fn period_first_day() {
        let last = date(2024, 3, 15);
        assert_eq!(Period::Day1.first_day(last), Some(last));
        assert_eq!(Period::Day5.first_day(last), Some(date(2024, 3, 11)));
        assert_eq!(Period::Month1.first_day(last), Some(date(2024, 2, 16)));
        assert_eq!(Period::Year1.first_day(last), Some(date(2023, 3, 16)));
        assert_eq!(Period::YearToDate.first_day(last), Some(date(2024, 1, 1)));
        assert_eq!(Period::Max.first_day(last), None);
    }

    #[test]
    fn date_range_must_be_ordered() {
        assert!(FetchRange::dates(date(2024, 1, 1), date(2024, 2, 1)).is_ok());
        let err = FetchRange::dates(date(2024, 2, 1), date(2024, 1, 1)).unwrap_err();
        assert!(matches!(
            err.current_context(),
            ProviderError::DataUnavailable { .. }
        ));
        assert!(FetchRange::dates(date(2024, 1, 1), date(2024, 1, 1)).is_err());
    }

    #[test]
    fn range_labels() {
        assert_eq!(FetchRange::Preset(Period::Month3).label(), "3mo");
        let range = FetchRange::dates(date(2024, 1, 1), date(2024, 2, 1)).unwrap();
        assert_eq!(range.label(), "2024-01-01_to_2024-02-01");
    }

    #[test]
    fn symbol_validation() {
        assert_eq!(validate_symbol(" AAPL ").unwrap(), "AAPL");
        assert!(validate_symbol("").is_err());
        assert!(validate_symbol("BRK B").is_err());
    }
}
