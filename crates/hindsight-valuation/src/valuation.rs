//! Weighted portfolio returns and compounded value.
//!
//! Compounding is multiplicative: returns of +10% then -10% leave the
//! portfolio at 0.99 of its starting value, not at 1.0.

use crate::error::{Result, ValuationError};
use crate::returns::ReturnSeries;
use crate::weights::WeightVector;
use chrono::NaiveDate;
use ndarray::{Array1, ArrayView1};
use tracing::debug;

/// One weighted return per date.
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioReturnSeries {
    dates: Vec<NaiveDate>,
    returns: Array1<f64>,
}

impl PortfolioReturnSeries {
    /// Build a series from dated returns.
    ///
    /// # Errors
    ///
    /// Returns [`ValuationError::InvalidSeries`] if lengths differ.
    pub fn new(dates: Vec<NaiveDate>, returns: Array1<f64>) -> Result<Self> {
        if dates.len() != returns.len() {
            return Err(ValuationError::InvalidSeries(format!(
                "{} dates but {} portfolio returns",
                dates.len(),
                returns.len()
            )));
        }
        Ok(Self { dates, returns })
    }

    /// Dates.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Returns in date order.
    pub fn returns(&self) -> ArrayView1<'_, f64> {
        self.returns.view()
    }

    /// Number of dates.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// True if there are no dates.
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

/// Dollar value of the portfolio on each date.
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioValueSeries {
    initial_investment: f64,
    dates: Vec<NaiveDate>,
    values: Vec<f64>,
}

impl PortfolioValueSeries {
    /// Amount invested before the first return.
    pub const fn initial_investment(&self) -> f64 {
        self.initial_investment
    }

    /// Dates.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Values in date order.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// `(date, value)` pairs in date order.
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.dates.iter().copied().zip(self.values.iter().copied())
    }

    /// Value on the last date.
    pub fn final_value(&self) -> Option<f64> {
        self.values.last().copied()
    }

    /// Number of dates.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// True if there are no dates.
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

/// Outcome of valuing a portfolio.
#[derive(Debug, Clone, PartialEq)]
pub enum Valuation {
    /// At least one dated value.
    Valued(PortfolioValueSeries),
    /// No usable returns, so nothing to compound.
    Empty,
}

impl Valuation {
    /// Value on the last date, or `None` when there is no data.
    pub fn final_value(&self) -> Option<f64> {
        match self {
            Self::Valued(series) => series.final_value(),
            Self::Empty => None,
        }
    }

    /// The value series, if any.
    pub const fn series(&self) -> Option<&PortfolioValueSeries> {
        match self {
            Self::Valued(series) => Some(series),
            Self::Empty => None,
        }
    }

    /// True for [`Valuation::Empty`].
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

/// Weighted sum of per-ticker returns for every date.
///
/// # Errors
///
/// Returns [`ValuationError::TickerMismatch`] if `weights` does not list the
/// same tickers in the same order as `returns`.
pub fn weighted_returns(
    returns: &ReturnSeries,
    weights: &WeightVector,
) -> Result<PortfolioReturnSeries> {
    if returns.tickers() != weights.tickers() {
        return Err(ValuationError::TickerMismatch {
            weights: weights.tickers().to_vec(),
            returns: returns.tickers().to_vec(),
        });
    }

    let portfolio = returns.returns().dot(&weights.weights());

    Ok(PortfolioReturnSeries {
        dates: returns.dates().to_vec(),
        returns: portfolio,
    })
}

/// Compounds portfolio returns from an initial investment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PortfolioValuator {
    initial_investment: f64,
}

impl PortfolioValuator {
    /// Create a valuator for the given starting amount.
    ///
    /// # Errors
    ///
    /// Returns [`ValuationError::InvalidInvestment`] unless the amount is
    /// positive and finite.
    pub fn new(initial_investment: f64) -> Result<Self> {
        if !initial_investment.is_finite() || initial_investment <= 0.0 {
            return Err(ValuationError::InvalidInvestment(initial_investment));
        }
        Ok(Self { initial_investment })
    }

    /// Starting amount.
    pub const fn initial_investment(&self) -> f64 {
        self.initial_investment
    }

    /// `value(t) = initial * prod_{s <= t} (1 + r(s))`.
    pub fn compound(&self, returns: &PortfolioReturnSeries) -> Valuation {
        if returns.is_empty() {
            return Valuation::Empty;
        }

        let mut factor = 1.0;
        let values = returns
            .returns
            .iter()
            .map(|r| {
                factor *= 1.0 + r;
                self.initial_investment * factor
            })
            .collect();

        Valuation::Valued(PortfolioValueSeries {
            initial_investment: self.initial_investment,
            dates: returns.dates.clone(),
            values,
        })
    }

    /// Weighted sum followed by compounding.
    ///
    /// # Errors
    ///
    /// See [`weighted_returns`].
    pub fn value(
        &self,
        returns: &ReturnSeries,
        weights: &WeightVector,
    ) -> Result<(PortfolioReturnSeries, Valuation)> {
        let portfolio_returns = weighted_returns(returns, weights)?;
        let valuation = self.compound(&portfolio_returns);
        debug!(
            dates = portfolio_returns.len(),
            final_value = ?valuation.final_value(),
            "valued portfolio"
        );
        Ok((portfolio_returns, valuation))
    }
}
