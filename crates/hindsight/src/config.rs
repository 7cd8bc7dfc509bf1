//! Run configuration.
//!
//! A [`PortfolioConfig`] is built once from CLI flags and an optional TOML
//! file, validated, and then passed by reference to the pipeline.

use chrono::NaiveDate;
use hindsight_valuation::{ValuationError, WeightVector};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Smallest accepted initial investment.
pub const MIN_INVESTMENT: f64 = 1_000.0;

/// Initial investment when none is given.
pub const DEFAULT_INVESTMENT: f64 = 10_000.0;

/// Tickers when none are given.
pub const DEFAULT_TICKERS: [&str; 3] = ["AAPL", "MSFT", "GOOGL"];

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Errors raised while collecting run inputs.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("Failed to read config file {}: {source}", .path.display())]
    Io {
        /// File that was read.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// Config file is not valid TOML for this schema.
    #[error("Invalid config file: {0}")]
    Toml(#[from] toml::de::Error),

    /// Date not in `YYYY-MM-DD` form.
    #[error("Invalid date '{value}': expected YYYY-MM-DD")]
    InvalidDate {
        /// Text that failed to parse.
        value: String,
    },

    /// No ticker survived parsing.
    #[error("No tickers given")]
    NoTickers,

    /// Number of weights does not match number of tickers.
    #[error("Got {weights} weights for {tickers} tickers")]
    WeightCountMismatch {
        /// Ticker count.
        tickers: usize,
        /// Weight count.
        weights: usize,
    },

    /// Raw weight outside `[0, 1]`.
    #[error("Weight {weight} for {ticker} is outside [0, 1]")]
    WeightOutOfRange {
        /// Ticker the weight belongs to.
        ticker: String,
        /// Offending value.
        weight: f64,
    },

    /// Initial investment that is NaN or infinite.
    #[error("Initial investment must be a finite amount, got {amount}")]
    InvalidInvestment {
        /// Requested amount.
        amount: f64,
    },

    /// Initial investment below [`MIN_INVESTMENT`].
    #[error("Initial investment {amount} is below the minimum of {minimum}")]
    InvestmentBelowMinimum {
        /// Requested amount.
        amount: f64,
        /// Smallest accepted amount.
        minimum: f64,
    },
}

/// Default start of the valuation window.
pub fn default_start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 1, 1).unwrap_or_default()
}

/// Default end of the valuation window.
pub fn default_end_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 12, 31).unwrap_or_default()
}

/// Parse a `YYYY-MM-DD` date.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidDate`] for anything else.
pub fn parse_date(value: &str) -> Result<NaiveDate, ConfigError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| ConfigError::InvalidDate {
        value: value.to_string(),
    })
}

/// Split a comma-separated ticker list.
///
/// Entries are trimmed and upper-cased; empty entries are ignored.
///
/// # Examples
///
/// ```
/// use hindsight::parse_tickers;
///
/// assert_eq!(parse_tickers(" aapl, msft,,googl "), vec!["AAPL", "MSFT", "GOOGL"]);
/// ```
pub fn parse_tickers(input: &str) -> Vec<String> {
    normalize_tickers(input.split(','))
}

fn normalize_tickers<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    raw.into_iter()
        .map(|t| t.as_ref().trim().to_uppercase())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Optional settings read from a TOML file.
///
/// ```toml
/// tickers = ["AAPL", "MSFT"]
/// weights = [0.6, 0.4]
/// initial_investment = 25000
/// start_date = "2023-01-01"
/// end_date = "2023-12-31"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Ticker symbols.
    pub tickers: Option<Vec<String>>,
    /// Raw weights, one per ticker.
    pub weights: Option<Vec<f64>>,
    /// Amount invested at the start.
    pub initial_investment: Option<f64>,
    /// Window start, `YYYY-MM-DD`.
    pub start_date: Option<String>,
    /// Window end, `YYYY-MM-DD`.
    pub end_date: Option<String>,
}

impl ConfigFile {
    /// Parse TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Toml`] on malformed input or unknown keys.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`ConfigFile::parse`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }
}

/// Validated, immutable inputs for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioConfig {
    tickers: Vec<String>,
    weights: Vec<f64>,
    initial_investment: f64,
    start_date: NaiveDate,
    end_date: NaiveDate,
}

impl PortfolioConfig {
    /// Start building a config.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Unique tickers in input order.
    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    /// Raw weights in ticker order, each in `[0, 1]` except where
    /// duplicates were merged.
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Amount invested at the start.
    pub const fn initial_investment(&self) -> f64 {
        self.initial_investment
    }

    /// First date of the window.
    pub const fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    /// End of the window, exclusive.
    pub const fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    /// Normalized weights.
    ///
    /// # Errors
    ///
    /// Returns [`ValuationError::DegenerateWeights`] if every weight is zero.
    pub fn weight_vector(&self) -> Result<WeightVector, ValuationError> {
        WeightVector::normalize(&self.tickers, &self.weights)
    }
}

impl Default for PortfolioConfig {
    fn default() -> Self {
        let n = DEFAULT_TICKERS.len();
        Self {
            tickers: DEFAULT_TICKERS.iter().map(|t| t.to_string()).collect(),
            weights: vec![1.0 / n as f64; n],
            initial_investment: DEFAULT_INVESTMENT,
            start_date: default_start_date(),
            end_date: default_end_date(),
        }
    }
}

/// Collects inputs for a [`PortfolioConfig`].
///
/// Values set directly on the builder win over values from
/// [`ConfigBuilder::file`], which win over defaults.
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    tickers: Option<Vec<String>>,
    weights: Option<Vec<f64>>,
    initial_investment: Option<f64>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    file: Option<ConfigFile>,
}

impl ConfigBuilder {
    /// Tickers from a comma-separated string.
    pub fn tickers_csv(mut self, tickers: &str) -> Self {
        self.tickers = Some(parse_tickers(tickers));
        self
    }

    /// Tickers from a list.
    pub fn tickers<I, S>(mut self, tickers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.tickers = Some(normalize_tickers(tickers));
        self
    }

    /// Raw weights, one per ticker as given.
    pub fn weights(mut self, weights: Vec<f64>) -> Self {
        self.weights = Some(weights);
        self
    }

    /// Amount invested at the start.
    pub const fn initial_investment(mut self, amount: f64) -> Self {
        self.initial_investment = Some(amount);
        self
    }

    /// First date of the window.
    pub const fn start_date(mut self, date: NaiveDate) -> Self {
        self.start_date = Some(date);
        self
    }

    /// End of the window.
    pub const fn end_date(mut self, date: NaiveDate) -> Self {
        self.end_date = Some(date);
        self
    }

    /// Fallback values from a config file.
    pub fn file(mut self, file: ConfigFile) -> Self {
        self.file = Some(file);
        self
    }

    /// Validate and freeze.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::NoTickers`] if the ticker list is empty.
    /// - [`ConfigError::WeightCountMismatch`] unless there is one weight
    ///   per ticker.
    /// - [`ConfigError::WeightOutOfRange`] for a weight outside `[0, 1]`.
    /// - [`ConfigError::InvalidInvestment`] for a NaN or infinite amount.
    /// - [`ConfigError::InvestmentBelowMinimum`] for less than
    ///   [`MIN_INVESTMENT`].
    /// - [`ConfigError::InvalidDate`] for a malformed date in the file.
    pub fn build(self) -> Result<PortfolioConfig, ConfigError> {
        let file = self.file.unwrap_or_default();

        let tickers = match (self.tickers, file.tickers) {
            (Some(tickers), _) => tickers,
            (None, Some(tickers)) => normalize_tickers(tickers),
            (None, None) => DEFAULT_TICKERS.iter().map(|t| t.to_string()).collect(),
        };
        if tickers.is_empty() {
            return Err(ConfigError::NoTickers);
        }

        let weights = match self.weights.or(file.weights) {
            Some(weights) => {
                check_weights(&tickers, &weights)?;
                Some(weights)
            }
            None => None,
        };
        let (tickers, weights) = merge_duplicates(tickers, weights);

        let initial_investment = self
            .initial_investment
            .or(file.initial_investment)
            .unwrap_or(DEFAULT_INVESTMENT);
        if !initial_investment.is_finite() {
            return Err(ConfigError::InvalidInvestment {
                amount: initial_investment,
            });
        }
        if initial_investment < MIN_INVESTMENT {
            return Err(ConfigError::InvestmentBelowMinimum {
                amount: initial_investment,
                minimum: MIN_INVESTMENT,
            });
        }

        let start_date = match self.start_date {
            Some(date) => date,
            None => file
                .start_date
                .as_deref()
                .map(parse_date)
                .transpose()?
                .unwrap_or_else(default_start_date),
        };
        let end_date = match self.end_date {
            Some(date) => date,
            None => file
                .end_date
                .as_deref()
                .map(parse_date)
                .transpose()?
                .unwrap_or_else(default_end_date),
        };

        Ok(PortfolioConfig {
            tickers,
            weights,
            initial_investment,
            start_date,
            end_date,
        })
    }
}

fn check_weights(tickers: &[String], weights: &[f64]) -> Result<(), ConfigError> {
    if tickers.len() != weights.len() {
        return Err(ConfigError::WeightCountMismatch {
            tickers: tickers.len(),
            weights: weights.len(),
        });
    }
    if let Some((ticker, &weight)) = tickers
        .iter()
        .zip(weights)
        .find(|(_, w)| !(0.0..=1.0).contains(*w))
    {
        return Err(ConfigError::WeightOutOfRange {
            ticker: ticker.clone(),
            weight,
        });
    }
    Ok(())
}

/// Collapse repeated tickers onto their first position, summing weights.
///
/// Without explicit weights every unique ticker gets `1/n`.
fn merge_duplicates(tickers: Vec<String>, weights: Option<Vec<f64>>) -> (Vec<String>, Vec<f64>) {
    let mut unique: Vec<String> = Vec::with_capacity(tickers.len());
    let mut merged: Vec<f64> = Vec::with_capacity(tickers.len());

    for (i, ticker) in tickers.into_iter().enumerate() {
        let weight = weights
            .as_ref()
            .and_then(|w| w.get(i).copied())
            .unwrap_or(0.0);
        match unique.iter().position(|t| *t == ticker) {
            Some(pos) => merged[pos] += weight,
            None => {
                unique.push(ticker);
                merged.push(weight);
            }
        }
    }

    if weights.is_none() {
        let n = unique.len() as f64;
        merged.iter_mut().for_each(|w| *w = 1.0 / n);
    }

    (unique, merged)
}
