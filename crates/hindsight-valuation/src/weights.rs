//! Portfolio weight normalization.

use crate::error::{Result, ValuationError};
use ndarray::{Array1, ArrayView1};
use std::fmt;

/// Normalized portfolio weights.
///
/// Entries are non-negative, sum to 1 and follow ticker input order.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightVector {
    tickers: Vec<String>,
    weights: Array1<f64>,
}

impl WeightVector {
    /// Scale raw weights so they sum to 1.
    ///
    /// `normalized[i] = raw[i] / sum(raw)`.
    ///
    /// # Errors
    ///
    /// - [`ValuationError::WeightCountMismatch`] if there is not exactly one
    ///   weight per ticker.
    /// - [`ValuationError::InvalidWeight`] for a negative or non-finite weight.
    /// - [`ValuationError::DegenerateWeights`] if every weight is zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use hindsight_valuation::WeightVector;
    ///
    /// let tickers = vec!["AAPL".to_string(), "MSFT".to_string()];
    /// let weights = WeightVector::normalize(&tickers, &[0.2, 0.6]).unwrap();
    ///
    /// assert!((weights.get("AAPL").unwrap() - 0.25).abs() < 1e-12);
    /// assert!((weights.get("MSFT").unwrap() - 0.75).abs() < 1e-12);
    /// ```
    pub fn normalize(tickers: &[String], raw: &[f64]) -> Result<Self> {
        if tickers.len() != raw.len() {
            return Err(ValuationError::WeightCountMismatch {
                tickers: tickers.len(),
                weights: raw.len(),
            });
        }

        if let Some((ticker, &weight)) = tickers
            .iter()
            .zip(raw)
            .find(|(_, w)| !w.is_finite() || **w < 0.0)
        {
            return Err(ValuationError::InvalidWeight {
                ticker: ticker.clone(),
                weight,
            });
        }

        let total: f64 = raw.iter().sum();
        if total <= 0.0 {
            return Err(ValuationError::DegenerateWeights);
        }

        Ok(Self {
            tickers: tickers.to_vec(),
            weights: raw.iter().map(|w| w / total).collect(),
        })
    }

    /// Equal weights `1/n` for every ticker.
    ///
    /// # Errors
    ///
    /// Returns [`ValuationError::DegenerateWeights`] for an empty ticker list.
    pub fn equal(tickers: &[String]) -> Result<Self> {
        let n = tickers.len();
        Self::normalize(tickers, &vec![1.0; n])
    }

    /// Tickers in input order.
    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    /// Weights in ticker order.
    pub fn weights(&self) -> ArrayView1<'_, f64> {
        self.weights.view()
    }

    /// Weight of one ticker.
    pub fn get(&self, ticker: &str) -> Option<f64> {
        self.tickers
            .iter()
            .position(|t| t == ticker)
            .map(|idx| self.weights[idx])
    }

    /// `(ticker, weight)` pairs in input order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.tickers
            .iter()
            .map(String::as_str)
            .zip(self.weights.iter().copied())
    }

    /// Number of weights.
    pub fn len(&self) -> usize {
        self.tickers.len()
    }

    /// True if there are no weights.
    pub fn is_empty(&self) -> bool {
        self.tickers.is_empty()
    }
}

impl fmt::Display for WeightVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (ticker, weight)) in self.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}: {:.2}%", ticker, weight * 100.0)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn tickers(n: usize) -> Vec<String> {
        ["AAPL", "MSFT", "GOOGL", "AMZN"][..n]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn test_normalize_preserves_order() {
        let weights = WeightVector::normalize(&tickers(3), &[0.5, 0.25, 0.25]).unwrap();

        assert_eq!(weights.tickers(), &tickers(3)[..]);
        assert_relative_eq!(weights.weights()[0], 0.5);
        assert_relative_eq!(weights.weights()[1], 0.25);
        assert_relative_eq!(weights.weights()[2], 0.25);
    }

    #[test]
    fn test_normalize_scales_to_one() {
        let weights = WeightVector::normalize(&tickers(3), &[1.0, 1.0, 0.5]).unwrap();

        assert_relative_eq!(weights.weights().sum(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(weights.get("GOOGL").unwrap(), 0.2, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_weight_is_allowed_when_others_positive() {
        let weights = WeightVector::normalize(&tickers(2), &[0.0, 0.3]).unwrap();
        assert_eq!(weights.get("AAPL"), Some(0.0));
        assert_eq!(weights.get("MSFT"), Some(1.0));
    }

    #[test]
    fn test_all_zero_is_degenerate() {
        let result = WeightVector::normalize(&tickers(3), &[0.0, 0.0, 0.0]);
        assert_eq!(result, Err(ValuationError::DegenerateWeights));
    }

    #[test]
    fn test_empty_is_degenerate() {
        assert_eq!(
            WeightVector::equal(&[]),
            Err(ValuationError::DegenerateWeights)
        );
    }

    #[rstest]
    #[case::negative(-0.1)]
    #[case::nan(f64::NAN)]
    #[case::infinite(f64::INFINITY)]
    fn test_invalid_weight(#[case] bad: f64) {
        let result = WeightVector::normalize(&tickers(2), &[0.5, bad]);
        assert!(matches!(
            result,
            Err(ValuationError::InvalidWeight { ref ticker, .. }) if ticker == "MSFT"
        ));
    }

    #[test]
    fn test_count_mismatch() {
        let result = WeightVector::normalize(&tickers(3), &[0.5, 0.5]);
        assert_eq!(
            result,
            Err(ValuationError::WeightCountMismatch {
                tickers: 3,
                weights: 2
            })
        );
    }

    #[test]
    fn test_equal_weights() {
        let weights = WeightVector::equal(&tickers(4)).unwrap();
        assert!(weights.iter().all(|(_, w)| (w - 0.25).abs() < 1e-12));
    }

    #[test]
    fn test_display_as_percentages() {
        let weights = WeightVector::equal(&tickers(3)).unwrap();
        assert_eq!(
            weights.to_string(),
            "AAPL: 33.33%\nMSFT: 33.33%\nGOOGL: 33.33%"
        );
    }
}
