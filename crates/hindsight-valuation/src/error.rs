//! Error types for the valuation core.

use thiserror::Error;

/// Result type for valuation operations.
pub type Result<T> = std::result::Result<T, ValuationError>;

/// Errors raised while normalizing weights or valuing a portfolio.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValuationError {
    /// All raw weights are zero, so normalization is undefined.
    #[error("All portfolio weights are zero; at least one weight must be positive")]
    DegenerateWeights,

    /// A raw weight is negative or not a finite number.
    #[error("Invalid weight {weight} for {ticker}: weights must be finite and non-negative")]
    InvalidWeight {
        /// Ticker the weight belongs to.
        ticker: String,
        /// Offending value.
        weight: f64,
    },

    /// Number of weights does not match number of tickers.
    #[error("Got {weights} weights for {tickers} tickers")]
    WeightCountMismatch {
        /// Ticker count.
        tickers: usize,
        /// Weight count.
        weights: usize,
    },

    /// Weights and returns list their tickers in a different order.
    #[error("Weight tickers {weights:?} do not match return tickers {returns:?}")]
    TickerMismatch {
        /// Tickers carried by the weight vector.
        weights: Vec<String>,
        /// Tickers carried by the return series.
        returns: Vec<String>,
    },

    /// Initial investment is not a positive finite amount.
    #[error("Initial investment must be a positive amount, got {0}")]
    InvalidInvestment(f64),

    /// Return matrix dimensions do not match its dates and tickers.
    #[error("Invalid return series: {0}")]
    InvalidSeries(String),
}
