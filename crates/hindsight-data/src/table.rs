//! Aligned date-by-ticker price table.
//!
//! A [`PriceTable`] is built from a [`PriceFrame`] immediately after a fetch.
//! Alignment is a strict join: a date survives only if every ticker has a
//! positive, finite adjusted close on it. Weighted sums downstream need one
//! common date index, so a date missing for one ticker is dropped for all.

use crate::error::{DataError, Result};
use crate::source::{PriceFrame, UNIX_EPOCH_DAYS_FROM_CE, columns};
use chrono::NaiveDate;
use ndarray::{Array2, ArrayView1, ArrayView2, s};
use polars::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// Adjusted closes aligned on a common date index.
///
/// Rows are dates in strictly increasing order, columns are tickers in input
/// order.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceTable {
    tickers: Vec<String>,
    dates: Vec<NaiveDate>,
    prices: Array2<f64>,
}

impl PriceTable {
    /// Build a table from already-aligned parts.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::InvalidTable`] if the matrix shape does not match
    /// the dates and tickers, or if dates are not strictly increasing.
    pub fn new(tickers: Vec<String>, dates: Vec<NaiveDate>, prices: Array2<f64>) -> Result<Self> {
        if prices.dim() != (dates.len(), tickers.len()) {
            return Err(DataError::InvalidTable(format!(
                "price matrix is {:?} but there are {} dates and {} tickers",
                prices.dim(),
                dates.len(),
                tickers.len()
            )));
        }
        if dates.windows(2).any(|w| w[0] >= w[1]) {
            return Err(DataError::InvalidTable(
                "dates must be strictly increasing".to_string(),
            ));
        }

        Ok(Self {
            tickers,
            dates,
            prices,
        })
    }

    /// Normalize a raw fetch response into an aligned table.
    ///
    /// Both response shapes end up here. Tickers missing from the response
    /// get no valid dates, which leaves the table empty after the join.
    ///
    /// # Errors
    ///
    /// - [`DataError::NoData`] if the response has no rows.
    /// - [`DataError::MissingColumn`] if `date`, `adjusted_close` or (for keyed
    ///   frames) `symbol` is absent.
    pub fn from_frame(frame: &PriceFrame, tickers: &[String]) -> Result<Self> {
        if frame.is_empty() {
            return Err(DataError::NoData {
                tickers: tickers.join(", "),
                reason: "empty response".to_string(),
            });
        }

        let series: Vec<BTreeMap<NaiveDate, f64>> = match frame {
            PriceFrame::Flat { symbol, frame } => {
                let prices = read_prices(frame)?;
                tickers
                    .iter()
                    .map(|ticker| {
                        if ticker == symbol {
                            prices.clone()
                        } else {
                            BTreeMap::new()
                        }
                    })
                    .collect()
            }
            PriceFrame::Keyed(frame) => {
                require_column(frame, columns::SYMBOL)?;
                require_column(frame, columns::DATE)?;
                require_column(frame, columns::ADJUSTED_CLOSE)?;
                tickers
                    .iter()
                    .map(|ticker| {
                        let rows = frame
                            .clone()
                            .lazy()
                            .filter(col(columns::SYMBOL).eq(lit(ticker.as_str())))
                            .collect()?;
                        read_prices(&rows)
                    })
                    .collect::<Result<_>>()?
            }
        };

        for (ticker, prices) in tickers.iter().zip(&series) {
            if prices.is_empty() {
                warn!(%ticker, "no usable prices in range");
            }
        }

        Ok(Self::align(tickers.to_vec(), &series))
    }

    /// Strict join of per-ticker series onto their common dates.
    fn align(tickers: Vec<String>, series: &[BTreeMap<NaiveDate, f64>]) -> Self {
        let all_dates: BTreeSet<NaiveDate> = series.iter().flat_map(|s| s.keys().copied()).collect();
        let dates: Vec<NaiveDate> = all_dates
            .iter()
            .copied()
            .filter(|date| series.iter().all(|s| s.contains_key(date)))
            .collect();

        let dropped = all_dates.len() - dates.len();
        if dropped > 0 {
            warn!(
                dropped,
                kept = dates.len(),
                "dropped dates where at least one ticker has no price"
            );
        }

        let mut prices = Array2::zeros((dates.len(), tickers.len()));
        for (row, date) in dates.iter().enumerate() {
            for (column, ticker_prices) in series.iter().enumerate() {
                prices[[row, column]] = ticker_prices[date];
            }
        }
        debug!(rows = dates.len(), tickers = tickers.len(), "aligned price table");

        Self {
            tickers,
            dates,
            prices,
        }
    }

    /// Tickers in input order.
    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    /// Trading dates in increasing order.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Price matrix, rows = dates, columns = tickers.
    pub fn prices(&self) -> ArrayView2<'_, f64> {
        self.prices.view()
    }

    /// Prices for one ticker.
    pub fn column(&self, ticker: &str) -> Option<ArrayView1<'_, f64>> {
        self.tickers
            .iter()
            .position(|t| t == ticker)
            .map(|idx| self.prices.column(idx))
    }

    /// Number of aligned dates.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// True when no date survived alignment.
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// The last `n` rows (or all of them if there are fewer).
    pub fn tail(&self, n: usize) -> Self {
        let start = self.len().saturating_sub(n);
        Self {
            tickers: self.tickers.clone(),
            dates: self.dates[start..].to_vec(),
            prices: self.prices.slice(s![start.., ..]).to_owned(),
        }
    }
}

fn require_column(frame: &DataFrame, name: &str) -> Result<()> {
    if frame.get_column_index(name).is_none() {
        return Err(DataError::MissingColumn {
            column: name.to_string(),
        });
    }
    Ok(())
}

/// Read `[date, adjusted_close]` into a date-ordered map, skipping nulls and
/// non-positive or non-finite prices.
fn read_prices(frame: &DataFrame) -> Result<BTreeMap<NaiveDate, f64>> {
    require_column(frame, columns::DATE)?;
    require_column(frame, columns::ADJUSTED_CLOSE)?;

    let days = frame
        .column(columns::DATE)?
        .as_materialized_series()
        .cast(&DataType::Int32)?;
    let closes = frame
        .column(columns::ADJUSTED_CLOSE)?
        .as_materialized_series()
        .cast(&DataType::Float64)?;

    let rows = days
        .i32()?
        .into_iter()
        .zip(closes.f64()?)
        .filter_map(|(day, close)| {
            let date = NaiveDate::from_num_days_from_ce_opt(day? + UNIX_EPOCH_DAYS_FROM_CE)?;
            let close = close.filter(|c| c.is_finite() && *c > 0.0)?;
            Some((date, close))
        });

    let mut prices = BTreeMap::new();
    for (date, close) in rows {
        if let Some(previous) = prices.insert(date, close) {
            warn!(%date, previous, close, "duplicate date in price data, keeping the later row");
        }
    }

    Ok(prices)
}
