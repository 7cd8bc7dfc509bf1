//! Valuation report.

use chrono::NaiveDate;
use hindsight_data::PriceTable;
use hindsight_valuation::{Valuation, WeightVector};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use thousands::Separable;

/// Rows of the price table shown in a report.
pub const PRICE_TAIL_ROWS: usize = 5;

/// Errors that can occur during report generation.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One row of the price table tail.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceRow {
    /// Trading date.
    pub date: NaiveDate,
    /// Adjusted closes in ticker order.
    pub prices: Vec<f64>,
}

/// A ticker and its normalized weight.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeightRow {
    /// Ticker symbol.
    pub ticker: String,
    /// Weight between 0 and 1.
    pub weight: f64,
}

/// Portfolio value on one date.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValuePoint {
    /// Date.
    pub date: NaiveDate,
    /// Portfolio value in dollars.
    pub value: f64,
}

/// Everything a presenter needs from one run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValuationReport {
    /// Tickers in input order.
    pub tickers: Vec<String>,

    /// First date of the requested window.
    pub start_date: NaiveDate,

    /// End of the requested window.
    pub end_date: NaiveDate,

    /// Amount invested at the start.
    pub initial_investment: f64,

    /// Last rows of the aligned price table.
    pub price_tail: Vec<PriceRow>,

    /// Normalized weights.
    pub weights: Vec<WeightRow>,

    /// Portfolio value per date.
    pub values: Vec<ValuePoint>,

    /// Value on the last date, `None` when there is no data.
    pub final_value: Option<f64>,
}

impl ValuationReport {
    /// Assemble a report from the results of a run.
    pub fn new(
        prices: &PriceTable,
        weights: &WeightVector,
        valuation: &Valuation,
        initial_investment: f64,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Self {
        let tail = prices.tail(PRICE_TAIL_ROWS);
        let price_tail = tail
            .dates()
            .iter()
            .zip(tail.prices().rows())
            .map(|(date, row)| PriceRow {
                date: *date,
                prices: row.to_vec(),
            })
            .collect();

        let weights = weights
            .iter()
            .map(|(ticker, weight)| WeightRow {
                ticker: ticker.to_string(),
                weight,
            })
            .collect();

        let values = valuation
            .series()
            .map(|series| {
                series
                    .iter()
                    .map(|(date, value)| ValuePoint { date, value })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            tickers: prices.tickers().to_vec(),
            start_date,
            end_date,
            initial_investment,
            price_tail,
            weights,
            values,
            final_value: valuation.final_value(),
        }
    }

    /// Total return over the window, `None` when there is no data.
    pub fn total_return(&self) -> Option<f64> {
        self.final_value
            .map(|value| value / self.initial_investment - 1.0)
    }

    /// Convert report to JSON string.
    pub fn to_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Generate a plain-text table.
    pub fn to_ascii_table(&self) -> String {
        let mut output = String::new();

        output.push_str("\nCumulative Portfolio Value\n");
        output.push_str(&format!(
            "Period: {} to {}\n",
            self.start_date, self.end_date
        ));
        output.push_str(&"=".repeat(64));
        output.push('\n');

        output.push_str("\nStock Prices (last rows):\n");
        output.push_str(&"-".repeat(64));
        output.push('\n');
        output.push_str(&format!("{:<12}", "Date"));
        for ticker in &self.tickers {
            output.push_str(&format!(" {:>12}", ticker));
        }
        output.push('\n');
        for row in &self.price_tail {
            output.push_str(&format!("{:<12}", row.date.to_string()));
            for price in &row.prices {
                output.push_str(&format!(" {:>12.2}", price));
            }
            output.push('\n');
        }

        output.push_str("\nNormalized Weights:\n");
        output.push_str(&"-".repeat(64));
        output.push('\n');
        for row in &self.weights {
            output.push_str(&format!("  {}: {:.2}%\n", row.ticker, row.weight * 100.0));
        }

        output.push_str("\nFinal Portfolio Value:\n");
        output.push_str(&"-".repeat(64));
        output.push('\n');
        match self.final_value {
            Some(value) => {
                output.push_str(&format!("  {}", format_currency(value)));
                if let Some(total_return) = self.total_return() {
                    output.push_str(&format!(
                        " ({:+.2}% on {})",
                        total_return * 100.0,
                        format_currency(self.initial_investment)
                    ));
                }
                output.push('\n');
            }
            None => output.push_str("  No data to display.\n"),
        }

        output
    }
}

/// Format a dollar amount with thousands separators and two decimals.
///
/// # Examples
///
/// ```
/// use hindsight_output::format_currency;
///
/// assert_eq!(format_currency(1234567.891), "$1,234,567.89");
/// assert_eq!(format_currency(-950.0), "-$950.00");
/// ```
pub fn format_currency(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let sign = if amount < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{sign}${}", fixed.separate_with_commas())
}
