//! Fetch, align, value.

use crate::config::{ConfigError, PortfolioConfig};
use chrono::NaiveDate;
use hindsight_data::{DataError, PriceSource, PriceTable};
use hindsight_output::{ExportError, ReportError, ValuationReport};
use hindsight_valuation::{
    PortfolioReturnSeries, PortfolioValuator, PortfolioValueSeries, Valuation, ValuationError,
    WeightVector, compute_returns,
};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Reasons a run stops before producing a value series.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Expected price field absent from the fetched data.
    #[error("'{column}' column not found in downloaded data")]
    MissingColumn {
        /// Name of the absent column.
        column: String,
    },

    /// Nothing came back for the requested tickers and range.
    #[error("No stock data returned for {tickers} ({reason})")]
    NoData {
        /// Tickers that were requested.
        tickers: String,
        /// Why nothing came back.
        reason: String,
    },

    /// Every raw weight is zero.
    #[error("All portfolio weights are zero; at least one weight must be positive")]
    DegenerateWeights,

    /// No two consecutive aligned trading days in the window.
    #[error("No usable returns between {start} and {end}: need at least two common trading days")]
    EmptySeries {
        /// Window start.
        start: NaiveDate,
        /// Window end.
        end: NaiveDate,
    },

    /// The price fetch exceeded its deadline.
    #[error("Timed out after {timeout:?} fetching prices for {symbol}")]
    Timeout {
        /// Symbol being fetched when the deadline passed.
        symbol: String,
        /// Deadline that was exceeded.
        timeout: Duration,
    },

    /// Invalid run inputs.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Other data errors.
    #[error(transparent)]
    Data(DataError),

    /// Other valuation errors.
    #[error(transparent)]
    Valuation(ValuationError),

    /// Report rendering failed.
    #[error(transparent)]
    Report(#[from] ReportError),

    /// Export failed.
    #[error(transparent)]
    Export(#[from] ExportError),
}

impl From<DataError> for PipelineError {
    fn from(err: DataError) -> Self {
        match err {
            DataError::MissingColumn { column } => Self::MissingColumn { column },
            DataError::NoData { tickers, reason } => Self::NoData { tickers, reason },
            DataError::Timeout { symbol, timeout } => Self::Timeout { symbol, timeout },
            other => Self::Data(other),
        }
    }
}

impl From<ValuationError> for PipelineError {
    fn from(err: ValuationError) -> Self {
        match err {
            ValuationError::DegenerateWeights => Self::DegenerateWeights,
            other => Self::Valuation(other),
        }
    }
}

/// Everything one run produced.
#[derive(Debug, Clone)]
pub struct PortfolioRun {
    config: PortfolioConfig,
    prices: PriceTable,
    weights: WeightVector,
    returns: PortfolioReturnSeries,
    values: PortfolioValueSeries,
}

impl PortfolioRun {
    /// Inputs the run was made with.
    pub const fn config(&self) -> &PortfolioConfig {
        &self.config
    }

    /// Aligned prices.
    pub const fn prices(&self) -> &PriceTable {
        &self.prices
    }

    /// Normalized weights.
    pub const fn weights(&self) -> &WeightVector {
        &self.weights
    }

    /// Weighted daily returns.
    pub const fn returns(&self) -> &PortfolioReturnSeries {
        &self.returns
    }

    /// Portfolio value per date.
    pub const fn values(&self) -> &PortfolioValueSeries {
        &self.values
    }

    /// Value on the last date.
    pub fn final_value(&self) -> Option<f64> {
        self.values.final_value()
    }

    /// Presentation view of the run.
    pub fn report(&self) -> ValuationReport {
        ValuationReport::new(
            &self.prices,
            &self.weights,
            &Valuation::Valued(self.values.clone()),
            self.config.initial_investment(),
            self.config.start_date(),
            self.config.end_date(),
        )
    }
}

/// Value a portfolio over the configured window.
///
/// Weights are checked before anything is fetched.
///
/// # Errors
///
/// - [`PipelineError::DegenerateWeights`] if every weight is zero.
/// - [`PipelineError::Timeout`] if the source gives up waiting.
/// - [`PipelineError::NoData`] if the source returns nothing.
/// - [`PipelineError::MissingColumn`] if the response lacks prices.
/// - [`PipelineError::EmptySeries`] if fewer than two aligned trading days
///   remain.
pub async fn run<S: PriceSource>(source: &S, config: &PortfolioConfig) -> Result<PortfolioRun> {
    let weights = config.weight_vector()?;
    let valuator = PortfolioValuator::new(config.initial_investment())?;
    let (start, end) = (config.start_date(), config.end_date());
    let empty_series = || PipelineError::EmptySeries { start, end };

    debug!(tickers = ?config.tickers(), %start, %end, "fetching prices");
    let frame = source.fetch(config.tickers(), start, end).await?;

    if frame.is_empty() && end <= start {
        return Err(empty_series());
    }

    let prices = PriceTable::from_frame(&frame, config.tickers())?;
    debug!(rows = prices.len(), "aligned prices");

    let returns = compute_returns(&prices);
    if returns.is_empty() {
        return Err(empty_series());
    }

    let (portfolio_returns, valuation) = valuator.value(&returns, &weights)?;
    let values = match valuation {
        Valuation::Valued(values) => values,
        Valuation::Empty => return Err(empty_series()),
    };

    info!(
        tickers = config.tickers().len(),
        days = values.len(),
        final_value = ?values.final_value(),
        "portfolio valued"
    );

    Ok(PortfolioRun {
        config: config.clone(),
        prices,
        weights,
        returns: portfolio_returns,
        values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_errors_map_to_taxonomy() {
        let err: PipelineError = DataError::MissingColumn {
            column: "adjusted_close".to_string(),
        }
        .into();
        assert!(matches!(err, PipelineError::MissingColumn { .. }));
        assert_eq!(
            err.to_string(),
            "'adjusted_close' column not found in downloaded data"
        );

        let err: PipelineError = DataError::Timeout {
            symbol: "AAPL".to_string(),
            timeout: Duration::from_secs(30),
        }
        .into();
        assert!(matches!(err, PipelineError::Timeout { .. }));
        assert_eq!(err.to_string(), "Timed out after 30s fetching prices for AAPL");

        let err: PipelineError = DataError::Timeout {
            symbol: "MSFT".to_string(),
            timeout: Duration::from_millis(250),
        }
        .into();
        assert_eq!(err.to_string(), "Timed out after 250ms fetching prices for MSFT");

        let err: PipelineError = DataError::InvalidSymbol("".to_string()).into();
        assert!(matches!(err, PipelineError::Data(_)));
    }

    #[test]
    fn test_valuation_errors_map_to_taxonomy() {
        let err: PipelineError = ValuationError::DegenerateWeights.into();
        assert!(matches!(err, PipelineError::DegenerateWeights));

        let err: PipelineError = ValuationError::InvalidInvestment(0.0).into();
        assert!(matches!(err, PipelineError::Valuation(_)));
    }
}
