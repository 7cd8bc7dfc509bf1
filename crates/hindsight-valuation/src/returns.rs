//! Daily fractional returns.

use crate::error::{Result, ValuationError};
use chrono::NaiveDate;
use hindsight_data::PriceTable;
use ndarray::{Array2, ArrayView1, ArrayView2, Axis, s};
use tracing::{debug, warn};

/// Per-ticker daily returns on a common date index.
///
/// Each row is dated by the later of the two prices it was computed from.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnSeries {
    tickers: Vec<String>,
    dates: Vec<NaiveDate>,
    returns: Array2<f64>,
}

impl ReturnSeries {
    /// Build a return series from parts.
    ///
    /// # Errors
    ///
    /// Returns [`ValuationError::InvalidSeries`] if the matrix shape does not
    /// match the dates and tickers, or a value is not finite.
    pub fn new(tickers: Vec<String>, dates: Vec<NaiveDate>, returns: Array2<f64>) -> Result<Self> {
        if returns.dim() != (dates.len(), tickers.len()) {
            return Err(ValuationError::InvalidSeries(format!(
                "return matrix is {:?} but there are {} dates and {} tickers",
                returns.dim(),
                dates.len(),
                tickers.len()
            )));
        }
        if returns.iter().any(|r| !r.is_finite()) {
            return Err(ValuationError::InvalidSeries(
                "returns must be finite".to_string(),
            ));
        }

        Ok(Self {
            tickers,
            dates,
            returns,
        })
    }

    fn empty(tickers: Vec<String>) -> Self {
        let width = tickers.len();
        Self {
            tickers,
            dates: Vec::new(),
            returns: Array2::zeros((0, width)),
        }
    }

    /// Tickers in input order.
    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    /// Return dates.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Return matrix, rows = dates, columns = tickers.
    pub fn returns(&self) -> ArrayView2<'_, f64> {
        self.returns.view()
    }

    /// Returns for one ticker.
    pub fn column(&self, ticker: &str) -> Option<ArrayView1<'_, f64>> {
        self.tickers
            .iter()
            .position(|t| t == ticker)
            .map(|idx| self.returns.column(idx))
    }

    /// Number of return rows.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// True when there are no usable rows.
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

/// Compute `p(t) / p(t-1) - 1` for every ticker.
///
/// A table with `n` rows yields `n - 1` return rows; fewer than two rows
/// yields an empty series. Any row with a non-finite return for some ticker
/// is dropped for all tickers.
pub fn compute_returns(prices: &PriceTable) -> ReturnSeries {
    let tickers = prices.tickers().to_vec();
    let matrix = prices.prices();

    if matrix.nrows() < 2 {
        debug!(rows = matrix.nrows(), "not enough prices to compute returns");
        return ReturnSeries::empty(tickers);
    }

    let current = matrix.slice(s![1.., ..]);
    let previous = matrix.slice(s![..-1, ..]);
    let raw = &current / &previous - 1.0;

    let keep: Vec<usize> = raw
        .rows()
        .into_iter()
        .enumerate()
        .filter(|(_, row)| row.iter().all(|r| r.is_finite()))
        .map(|(idx, _)| idx)
        .collect();

    if keep.len() < raw.nrows() {
        warn!(
            dropped = raw.nrows() - keep.len(),
            "dropped return rows with undefined values"
        );
    }

    let dates = keep.iter().map(|&idx| prices.dates()[idx + 1]).collect();
    let returns = raw.select(Axis(0), &keep);

    ReturnSeries {
        tickers,
        dates,
        returns,
    }
}
