#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hindsight/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod returns;
pub mod valuation;
pub mod weights;

pub use error::{Result, ValuationError};
pub use returns::{ReturnSeries, compute_returns};
pub use valuation::{
    PortfolioReturnSeries, PortfolioValuator, PortfolioValueSeries, Valuation, weighted_returns,
};
pub use weights::WeightVector;
