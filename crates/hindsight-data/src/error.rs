//! Error types for data operations.

use thiserror::Error;

/// Result type for data operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors that can occur while fetching or aligning price data.
#[derive(Debug, Error)]
pub enum DataError {
    /// Yahoo Finance API error
    #[error("Yahoo Finance API error: {0}")]
    YahooApi(String),

    /// The price request did not complete in time
    #[error("Timed out after {timeout:?} fetching prices for {symbol}")]
    Timeout {
        /// Symbol being fetched when the deadline passed
        symbol: String,
        /// Deadline that was exceeded
        timeout: std::time::Duration,
    },

    /// Expected price field absent from the fetched data
    #[error("'{column}' column not found in downloaded data")]
    MissingColumn {
        /// Name of the absent column
        column: String,
    },

    /// Fetched data is empty for the requested tickers and range
    #[error("No stock data returned for {tickers} ({reason})")]
    NoData {
        /// Comma-separated tickers that were requested
        tickers: String,
        /// Why nothing came back
        reason: String,
    },

    /// Missing data for a single symbol
    #[error("Missing data for {symbol}: {reason}")]
    MissingData {
        /// Symbol that was queried
        symbol: String,
        /// Reason for missing data
        reason: String,
    },

    /// Invalid symbol
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    /// Price table dimensions or dates are inconsistent
    #[error("Invalid price table: {0}")]
    InvalidTable(String),

    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// Time conversion error
    #[error("Time conversion error: {0}")]
    TimeConversion(String),
}

impl From<yahoo_finance_api::YahooError> for DataError {
    fn from(err: yahoo_finance_api::YahooError) -> Self {
        Self::YahooApi(err.to_string())
    }
}
