//! CSV and JSON export of valuation results.

use crate::report::{ValuationReport, ValuePoint};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during export operations.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV serialization error.
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid format error.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Export format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma-separated values format.
    Csv,

    /// Compact JSON format.
    Json,

    /// Pretty-printed JSON format.
    PrettyJson,
}

impl ExportFormat {
    /// Get the file extension for this format.
    pub const fn extension(&self) -> &str {
        match self {
            Self::Csv => "csv",
            Self::Json | Self::PrettyJson => "json",
        }
    }

    /// Pick a format from a file extension. JSON files are pretty-printed.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::InvalidFormat`] for any other extension.
    pub fn from_path(path: &Path) -> Result<Self, ExportError> {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("csv") => Ok(Self::Csv),
            Some("json") => Ok(Self::PrettyJson),
            _ => Err(ExportError::InvalidFormat(format!(
                "cannot infer export format from '{}'",
                path.display()
            ))),
        }
    }
}

/// A CSV row: the portfolio value on one date.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValueRecord {
    /// Date.
    pub date: chrono::NaiveDate,

    /// Portfolio value in dollars.
    pub value: f64,

    /// Return since the initial investment.
    pub cumulative_return: f64,
}

impl ValueRecord {
    fn from_point(point: &ValuePoint, initial_investment: f64) -> Self {
        Self {
            date: point.date,
            value: point.value,
            cumulative_return: point.value / initial_investment - 1.0,
        }
    }
}

/// Trait for types that can be exported.
pub trait Exporter {
    /// Export data to a string in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError>;

    /// Export data to a file in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    fn export_to_file(&self, path: &Path, format: ExportFormat) -> Result<(), ExportError> {
        let content = self.export_to_string(format)?;
        let mut file = File::create(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }
}

impl Exporter for ValuationReport {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => {
                let mut output = String::new();

                // Header information as comments
                output.push_str(&format!("# Tickers: {}\n", self.tickers.join(",")));
                output.push_str(&format!(
                    "# Period: {} to {}\n",
                    self.start_date, self.end_date
                ));
                output.push_str(&format!(
                    "# Initial Investment: {:.2}\n",
                    self.initial_investment
                ));
                let weights = self
                    .weights
                    .iter()
                    .map(|w| format!("{}={:.6}", w.ticker, w.weight))
                    .collect::<Vec<_>>()
                    .join(",");
                output.push_str(&format!("# Weights: {}\n", weights));

                let mut wtr = csv::Writer::from_writer(vec![]);
                for point in &self.values {
                    wtr.serialize(ValueRecord::from_point(point, self.initial_investment))?;
                }
                // An empty series still gets a header row.
                if self.values.is_empty() {
                    wtr.write_record(["date", "value", "cumulative_return"])?;
                }
                let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
                let data = String::from_utf8(bytes)
                    .map_err(|e| ExportError::InvalidFormat(e.to_string()))?;
                output.push_str(&data);

                Ok(output)
            }
            ExportFormat::Json => Ok(serde_json::to_string(self)?),
            ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(self)?),
        }
    }
}
