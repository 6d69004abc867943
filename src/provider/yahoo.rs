use std::num::NonZeroU32;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate};
use error_stack::{Report, ResultExt};
use futures::future::BoxFuture;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::ProviderError;
use crate::model::{Bar, Series};
use crate::provider::{FetchRange, PriceProvider, ensure_not_empty, validate_symbol};

const YAHOO_BASE_URL: &str = "https://query1.finance.yahoo.com";
/// Yahoo rejects requests without a browser-like user agent.
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) stock-analyzer/0.1";
/// Unofficial endpoint without a published quota; stay well below throttling.
const DEFAULT_REQUESTS_PER_SECOND: NonZeroU32 = NonZeroU32::new(2).unwrap();

pub struct YahooProvider {
    client: reqwest::Client,
    base_url: String,
    rate_limiter: Arc<DefaultDirectRateLimiter>,
}

impl YahooProvider {
    pub fn new() -> Self {
        Self::with_config(YAHOO_BASE_URL, DEFAULT_REQUESTS_PER_SECOND)
    }

    pub fn with_config(base_url: impl Into<String>, requests_per_second: NonZeroU32) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            rate_limiter: Arc::new(RateLimiter::direct(Quota::per_second(requests_per_second))),
        }
    }

    async fn fetch_chart(
        &self,
        symbol: &str,
        range: FetchRange,
    ) -> Result<ChartResponse, Report<ProviderError>> {
        // Wait for rate limiter before making the request
        self.rate_limiter.until_ready().await;

        let url = format!("{}/v8/finance/chart/{}", self.base_url, symbol);
        let mut params = vec![
            ("interval".to_owned(), "1d".to_owned()),
            ("events".to_owned(), "history".to_owned()),
        ];
        match range {
            FetchRange::Preset(period) => {
                params.push(("range".to_owned(), period.as_str().to_owned()));
            }
            FetchRange::Dates { start, end } => {
                params.push(("period1".to_owned(), midnight_timestamp(start).to_string()));
                params.push(("period2".to_owned(), midnight_timestamp(end).to_string()));
            }
        }

        let response = self
            .client
            .get(&url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .query(&params)
            .send()
            .await
            .change_context(ProviderError::Request {
                provider: "yahoo".into(),
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(Report::new(ProviderError::DataUnavailable {
                reason: format!("yahoo has no chart for {symbol}"),
            })
            .attach(format!("HTTP status: {status}")));
        }
        if !status.is_success() {
            return Err(Report::new(ProviderError::Request {
                provider: "yahoo".into(),
            })
            .attach(format!("HTTP status: {status}")));
        }

        response
            .json()
            .await
            .change_context(ProviderError::ResponseParse {
                provider: "yahoo".into(),
            })
    }
}

impl Default for YahooProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl PriceProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo"
    }

    fn fetch_history(
        &self,
        symbol: &str,
        range: FetchRange,
    ) -> BoxFuture<'_, Result<Series, Report<ProviderError>>> {
        let symbol = symbol.to_owned();
        Box::pin(async move {
            let symbol = validate_symbol(&symbol)?;
            let response = self.fetch_chart(symbol, range).await?;
            let bars = response.into_bars()?;

            info!(
                symbol,
                range = %range,
                fetched = bars.len(),
                "yahoo price history fetch complete"
            );

            let series = Series::from_bars(symbol, &bars).change_context(
                ProviderError::ResponseParse {
                    provider: "yahoo".into(),
                },
            )?;
            ensure_not_empty(series, range)
        })
    }
}

fn midnight_timestamp(date: NaiveDate) -> i64 {
    date.and_time(chrono::NaiveTime::MIN).and_utc().timestamp()
}

// ── Chart API response types ──────────────────────────────────────────────────

/// `{ "chart": { "result": [ ... ], "error": null } }`
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<Quote>,
}

/// Column-oriented OHLCV arrays; Yahoo uses `null` for missing values.
#[derive(Debug, Default, Deserialize)]
struct Quote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

impl ChartResponse {
    /// Convert into bars sorted by date, dropping rows without a close and
    /// keeping the last row when two timestamps fall on the same day.
    fn into_bars(self) -> Result<Vec<Bar>, Report<ProviderError>> {
        if let Some(error) = self.chart.error {
            return Err(Report::new(ProviderError::DataUnavailable {
                reason: error.description,
            })
            .attach(format!("yahoo error code: {}", error.code)));
        }

        let Some(result) = self.chart.result.and_then(|r| r.into_iter().next()) else {
            return Ok(Vec::new());
        };
        let quote = result.indicators.quote.into_iter().next().unwrap_or_default();
        let cell = |values: &[Option<f64>], i: usize| values.get(i).copied().flatten();

        let mut bars: Vec<Bar> = Vec::with_capacity(result.timestamp.len());
        for (i, &ts) in result.timestamp.iter().enumerate() {
            let Some(close) = cell(&quote.close, i).filter(|c| c.is_finite()) else {
                debug!(timestamp = ts, "skipping row without close");
                continue;
            };
            let Some(time) = DateTime::from_timestamp(ts, 0) else {
                return Err(Report::new(ProviderError::ResponseParse {
                    provider: "yahoo".into(),
                })
                .attach(format!("timestamp out of range: {ts}")));
            };

            bars.push(Bar {
                date: time.date_naive(),
                open: cell(&quote.open, i),
                high: cell(&quote.high, i),
                low: cell(&quote.low, i),
                close,
                volume: cell(&quote.volume, i),
            });
        }

        bars.sort_by_key(|b| b.date);
        let mut deduped: Vec<Bar> = Vec::with_capacity(bars.len());
        for bar in bars {
            match deduped.last_mut() {
                Some(last) if last.date == bar.date => *last = bar,
                _ => deduped.push(bar),
            }
        }
        Ok(deduped)
    }
}
