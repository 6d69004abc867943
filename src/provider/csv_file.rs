use std::path::{Path, PathBuf};

use error_stack::{Report, ResultExt};
use futures::future::BoxFuture;
use tracing::info;

use crate::error::ProviderError;
use crate::export;
use crate::model::Series;
use crate::provider::{FetchRange, PriceProvider, ensure_not_empty, validate_symbol};

/// Serves price history from a local CSV file in the export format.
///
/// Presets are counted back from the last row in the file rather than from
/// today, so archived files stay usable.
pub struct CsvFileProvider {
    path: PathBuf,
}

impl CsvFileProvider {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn load(&self, symbol: &str, range: FetchRange) -> Result<Series, Report<ProviderError>> {
        let series = export::load_csv(symbol, &self.path).change_context(
            ProviderError::ResponseParse {
                provider: "csv".into(),
            },
        )?;
        let series = ensure_not_empty(series, range)?;

        let selected = match range {
            FetchRange::Preset(period) => {
                let first = series.last_date().and_then(|last| period.first_day(last));
                series.between(first, None)
            }
            FetchRange::Dates { start, end } => series.between(Some(start), Some(end)),
        };
        ensure_not_empty(selected, range)
    }
}

impl PriceProvider for CsvFileProvider {
    fn name(&self) -> &str {
        "csv"
    }

    fn fetch_history(
        &self,
        symbol: &str,
        range: FetchRange,
    ) -> BoxFuture<'_, Result<Series, Report<ProviderError>>> {
        let symbol = symbol.to_owned();
        Box::pin(async move {
            let symbol = validate_symbol(&symbol)?;
            let series = self.load(symbol, range)?;
            info!(
                symbol,
                path = %self.path.display(),
                range = %range,
                rows = series.len(),
                "csv price history loaded"
            );
            Ok(series)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::Period;
    use chrono::NaiveDate;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    fn price_file() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "Date,Close").unwrap();
        for (m, d, close) in [(1, 2, 10.0), (1, 15, 11.0), (2, 1, 12.0), (2, 20, 13.0), (3, 1, 14.0)] {
            writeln!(file, "2024-{m:02}-{d:02},{close}").unwrap();
        }
        file
    }

    #[tokio::test]
    async fn preset_counts_back_from_last_row() {
        let file = price_file();
        let provider = CsvFileProvider::new(file.path());
        let series = provider
            .fetch_history("TEST", FetchRange::Preset(Period::Month1))
            .await
            .unwrap();
        assert_eq!(series.dates(), &[date(2, 20), date(3, 1)]);
        assert_eq!(series.symbol(), "TEST");
    }

    #[tokio::test]
    async fn max_keeps_every_row() {
        let file = price_file();
        let provider = CsvFileProvider::new(file.path());
        let series = provider
            .fetch_history("TEST", FetchRange::Preset(Period::Max))
            .await
            .unwrap();
        assert_eq!(series.len(), 5);
    }

    #[tokio::test]
    async fn date_range_is_half_open() {
        let file = price_file();
        let provider = CsvFileProvider::new(file.path());
        let range = FetchRange::dates(date(1, 15), date(2, 20)).unwrap();
        let series = provider.fetch_history("TEST", range).await.unwrap();
        assert_eq!(series.closes().unwrap(), vec![11.0, 12.0]);
    }

    #[tokio::test]
    async fn empty_range_is_data_unavailable() {
        let file = price_file();
        let provider = CsvFileProvider::new(file.path());
        let range = FetchRange::dates(date(6, 1), date(7, 1)).unwrap();
        let err = provider.fetch_history("TEST", range).await.unwrap_err();
        assert!(matches!(
            err.current_context(),
            ProviderError::DataUnavailable { .. }
        ));
    }

    #[tokio::test]
    async fn missing_file_fails() {
        let provider = CsvFileProvider::new("/nonexistent/prices.csv");
        let result = provider
            .fetch_history("TEST", FetchRange::Preset(Period::Max))
            .await;
        assert!(result.is_err());
    }
}
