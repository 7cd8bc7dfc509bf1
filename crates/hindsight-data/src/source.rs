//! Price sources and the raw response shapes they produce.

use crate::error::{DataError, Result};
use chrono::{Datelike, NaiveDate};
use polars::prelude::*;

/// Days from 0001-01-01 (CE) to 1970-01-01, the epoch polars dates count from.
pub(crate) const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Column names shared by every [`PriceFrame`].
pub mod columns {
    /// Ticker symbol (keyed frames only).
    pub const SYMBOL: &str = "symbol";
    /// Trading date.
    pub const DATE: &str = "date";
    /// Close adjusted for splits and dividends.
    pub const ADJUSTED_CLOSE: &str = "adjusted_close";
}

/// Raw price response, before alignment.
///
/// Upstream data comes in two shapes: a single ticker yields a flat table,
/// several tickers yield one long table keyed by symbol. Both are turned into
/// a [`PriceTable`](crate::PriceTable) right after the fetch so nothing
/// downstream has to care which one it was.
#[derive(Debug, Clone)]
pub enum PriceFrame {
    /// One ticker: columns `[date, adjusted_close]`.
    Flat {
        /// The ticker the rows belong to.
        symbol: String,
        /// Price rows.
        frame: DataFrame,
    },
    /// Several tickers: columns `[symbol, date, adjusted_close]`.
    Keyed(DataFrame),
}

impl PriceFrame {
    /// Single-ticker response.
    pub fn flat(symbol: impl Into<String>, frame: DataFrame) -> Self {
        Self::Flat {
            symbol: symbol.into(),
            frame,
        }
    }

    /// Multi-ticker response from per-symbol `[date, adjusted_close]` frames.
    ///
    /// Adds the `symbol` column to each frame and stacks them.
    pub fn keyed(frames: Vec<(String, DataFrame)>) -> Result<Self> {
        let mut lazy_frames = Vec::with_capacity(frames.len());
        for (symbol, mut df) in frames {
            let symbol_col: Column =
                Series::new(columns::SYMBOL.into(), vec![symbol.as_str(); df.height()]).into();
            df.with_column(symbol_col)?;
            let df = df.select([columns::SYMBOL, columns::DATE, columns::ADJUSTED_CLOSE])?;
            lazy_frames.push(df.lazy());
        }

        if lazy_frames.is_empty() {
            return Ok(Self::Keyed(DataFrame::empty()));
        }

        let combined = concat(lazy_frames, UnionArgs::default())?.collect()?;
        Ok(Self::Keyed(combined))
    }

    /// Underlying DataFrame regardless of shape.
    pub const fn frame(&self) -> &DataFrame {
        match self {
            Self::Flat { frame, .. } | Self::Keyed(frame) => frame,
        }
    }

    /// Number of price rows.
    pub fn height(&self) -> usize {
        self.frame().height()
    }

    /// True when the source returned no rows at all.
    pub fn is_empty(&self) -> bool {
        self.height() == 0
    }
}

/// Build a `[date, adjusted_close]` frame.
///
/// # Errors
///
/// Returns [`DataError::InvalidTable`] if `dates` and `closes` differ in
/// length.
pub fn price_rows(dates: &[NaiveDate], closes: &[f64]) -> Result<DataFrame> {
    if dates.len() != closes.len() {
        return Err(DataError::InvalidTable(format!(
            "{} dates but {} closes",
            dates.len(),
            closes.len()
        )));
    }

    let days: Vec<i32> = dates
        .iter()
        .map(|d| d.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE)
        .collect();
    let date_col = Series::new(columns::DATE.into(), days).cast(&DataType::Date)?;

    let df = DataFrame::new(vec![
        date_col.into(),
        Series::new(columns::ADJUSTED_CLOSE.into(), closes.to_vec()).into(),
    ])?;

    Ok(df)
}

/// Something that can supply adjusted daily closes.
///
/// `end` is exclusive. Tickers the source does not recognise are left out of
/// the response rather than failing the whole request.
#[allow(async_fn_in_trait)]
pub trait PriceSource {
    /// Fetch adjusted closes for `tickers` between `start` and `end`.
    async fn fetch(&self, tickers: &[String], start: NaiveDate, end: NaiveDate)
    -> Result<PriceFrame>;
}
