//! Adjusted close history from Yahoo Finance.

use crate::error::{DataError, Result};
use crate::source::{PriceFrame, PriceSource, columns};
use chrono::{NaiveDate, NaiveTime};
use polars::prelude::*;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};
use yahoo_finance_api as yahoo;

/// Default per-request deadline.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default pause between consecutive symbol requests.
pub const DEFAULT_RATE_LIMIT: Duration = Duration::from_millis(250);

/// Yahoo Finance quote provider with rate limiting and a request timeout.
pub struct YahooQuoteProvider {
    provider: yahoo::YahooConnector,
    rate_limit_delay: Duration,
    timeout: Duration,
}

impl std::fmt::Debug for YahooQuoteProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YahooQuoteProvider")
            .field("rate_limit_delay", &self.rate_limit_delay)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl YahooQuoteProvider {
    /// Create a provider with the default rate limit and timeout.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::YahooApi`] if the HTTP connector cannot be built.
    pub fn new() -> Result<Self> {
        Ok(Self {
            provider: yahoo::YahooConnector::new()?,
            rate_limit_delay: DEFAULT_RATE_LIMIT,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Set the pause between symbol requests.
    pub const fn with_rate_limit(mut self, rate_limit_delay: Duration) -> Self {
        self.rate_limit_delay = rate_limit_delay;
        self
    }

    /// Set the per-request deadline.
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Fetch adjusted closes for a single symbol.
    ///
    /// # Arguments
    /// * `symbol` - The ticker symbol (e.g., "AAPL")
    /// * `start` - First date of the window
    /// * `end` - End of the window (exclusive)
    ///
    /// # Returns
    /// A Polars DataFrame with columns: date, adjusted_close
    pub async fn fetch_adjusted_closes(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<DataFrame> {
        if symbol.is_empty() {
            return Err(DataError::InvalidSymbol("Empty symbol".to_string()));
        }

        let start_time = to_offset_date_time(start)?;
        let end_time = to_offset_date_time(end)?;

        let response = timeout(
            self.timeout,
            self.provider.get_quote_history(symbol, start_time, end_time),
        )
        .await
        .map_err(|_| DataError::Timeout {
            symbol: symbol.to_string(),
            timeout: self.timeout,
        })??;

        let quotes = response
            .quotes()
            .map_err(|e| DataError::YahooApi(e.to_string()))?;

        if quotes.is_empty() {
            return Err(DataError::MissingData {
                symbol: symbol.to_string(),
                reason: "No data returned from Yahoo Finance".to_string(),
            });
        }

        let timestamps: Vec<i64> = quotes.iter().map(|q| q.timestamp).collect();
        let adj_closes: Vec<f64> = quotes.iter().map(|q| q.adjclose).collect();

        let df = DataFrame::new(vec![
            Series::new("timestamp".into(), timestamps).into(),
            Series::new(columns::ADJUSTED_CLOSE.into(), adj_closes).into(),
        ])?;

        // Convert timestamp to date
        let df = df
            .lazy()
            .with_column(
                (col("timestamp") * lit(1_000_000_000))
                    .cast(DataType::Datetime(TimeUnit::Nanoseconds, None))
                    .cast(DataType::Date)
                    .alias(columns::DATE),
            )
            .select([col(columns::DATE), col(columns::ADJUSTED_CLOSE)])
            .collect()?;

        debug!(symbol, rows = df.height(), "fetched quote history");
        Ok(df)
    }
}

impl PriceSource for YahooQuoteProvider {
    async fn fetch(
        &self,
        tickers: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceFrame> {
        if end <= start {
            debug!(%start, %end, "window holds no trading days, skipping request");
            return Ok(match tickers {
                [symbol] => PriceFrame::flat(symbol.as_str(), DataFrame::empty()),
                _ => PriceFrame::Keyed(DataFrame::empty()),
            });
        }

        let mut frames = collect_frames(tickers, self.rate_limit_delay, |symbol| async move {
            self.fetch_adjusted_closes(&symbol, start, end).await
        })
        .await?;

        if let [symbol] = tickers {
            let frame = frames
                .pop()
                .map_or_else(DataFrame::empty, |(_, frame)| frame);
            return Ok(PriceFrame::flat(symbol.as_str(), frame));
        }

        PriceFrame::keyed(frames)
    }
}

/// Fetch each symbol in turn, pausing `delay` between requests.
///
/// Symbols that fail are logged and left out. A timeout stops the whole
/// request.
async fn collect_frames<F, Fut>(
    tickers: &[String],
    delay: Duration,
    mut fetch_one: F,
) -> Result<Vec<(String, DataFrame)>>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<DataFrame>>,
{
    let mut frames = Vec::with_capacity(tickers.len());

    for (i, symbol) in tickers.iter().enumerate() {
        if i > 0 {
            sleep(delay).await;
        }
        match fetch_one(symbol.clone()).await {
            Ok(df) => frames.push((symbol.clone(), df)),
            Err(e @ DataError::Timeout { .. }) => return Err(e),
            Err(e) => {
                warn!(%symbol, error = %e, "failed to fetch data, leaving ticker out");
            }
        }
    }

    Ok(frames)
}

fn to_offset_date_time(date: NaiveDate) -> Result<time::OffsetDateTime> {
    let timestamp = date.and_time(NaiveTime::MIN).and_utc().timestamp();
    time::OffsetDateTime::from_unix_timestamp(timestamp)
        .map_err(|e| DataError::TimeConversion(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::price_rows;

    fn window() -> (NaiveDate, NaiveDate) {
        (
            NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2023, 2, 1).unwrap(),
        )
    }

    #[test]
    fn test_offset_date_time_is_midnight_utc() {
        let date = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
        let odt = to_offset_date_time(date).unwrap();
        assert_eq!(odt.unix_timestamp(), 1_672_617_600);
    }

    #[tokio::test]
    async fn test_empty_window_skips_request() {
        let provider = YahooQuoteProvider::new().unwrap();
        let (start, _) = window();

        let single = provider
            .fetch(&["AAPL".to_string()], start, start)
            .await
            .unwrap();
        assert!(matches!(single, PriceFrame::Flat { .. }));
        assert!(single.is_empty());

        let multi = provider
            .fetch(&["AAPL".to_string(), "MSFT".to_string()], start, start)
            .await
            .unwrap();
        assert!(matches!(multi, PriceFrame::Keyed(_)));
        assert!(multi.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_symbol() {
        let provider = YahooQuoteProvider::new().unwrap();
        let (start, end) = window();

        let result = provider.fetch_adjusted_closes("", start, end).await;
        assert!(matches!(result, Err(DataError::InvalidSymbol(_))));
    }

    fn symbols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_failed_symbol_is_left_out() {
        let (start, _) = window();

        let frames = collect_frames(&symbols(&["AAPL", "NOPE", "MSFT"]), Duration::ZERO, |symbol| async move {
            if symbol == "NOPE" {
                return Err(DataError::MissingData {
                    symbol,
                    reason: "No data returned from Yahoo Finance".to_string(),
                });
            }
            price_rows(&[start], &[100.0])
        })
        .await
        .unwrap();

        let fetched: Vec<&str> = frames.iter().map(|(s, _)| s.as_str()).collect();
        assert_eq!(fetched, vec!["AAPL", "MSFT"]);
    }

    #[tokio::test]
    async fn test_timeout_stops_remaining_symbols() {
        let mut requested = Vec::new();

        let result = collect_frames(&symbols(&["AAPL", "MSFT", "GOOGL"]), Duration::ZERO, |symbol| {
            requested.push(symbol.clone());
            async move {
                Err(DataError::Timeout {
                    symbol,
                    timeout: Duration::from_secs(30),
                })
            }
        })
        .await;

        assert!(matches!(
            result,
            Err(DataError::Timeout { ref symbol, .. }) if symbol == "AAPL"
        ));
        assert_eq!(requested, vec!["AAPL"]);
    }

    #[tokio::test]
    async fn test_provider_reports_timeout() {
        let provider = YahooQuoteProvider::new()
            .unwrap()
            .with_timeout(Duration::from_nanos(1));
        let (start, end) = window();

        let result = provider
            .fetch(&["AAPL".to_string(), "MSFT".to_string()], start, end)
            .await;

        match result {
            Err(DataError::Timeout { symbol, timeout }) => {
                assert_eq!(symbol, "AAPL");
                assert_eq!(timeout, Duration::from_nanos(1));
            }
            other => panic!("expected timeout on the first symbol, got {other:?}"),
        }
    }

    #[tokio::test]
    #[ignore = "requires network access"]
    async fn test_fetch_adjusted_closes() {
        let provider = YahooQuoteProvider::new().unwrap();
        let (start, end) = window();

        let df = provider
            .fetch_adjusted_closes("AAPL", start, end)
            .await
            .unwrap();
        assert!(df.height() > 0);
        assert_eq!(
            df.get_column_names(),
            vec![columns::DATE, columns::ADJUSTED_CLOSE]
        );
    }

    #[tokio::test]
    #[ignore = "requires network access"]
    async fn test_fetch_keyed() {
        let provider = YahooQuoteProvider::new()
            .unwrap()
            .with_rate_limit(Duration::from_millis(100));
        let (start, end) = window();

        let frame = provider
            .fetch(&["AAPL".to_string(), "MSFT".to_string()], start, end)
            .await
            .unwrap();
        assert!(matches!(frame, PriceFrame::Keyed(_)));
        assert!(frame.height() > 0);
    }
}
