#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hindsight/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod source;
pub mod table;
pub mod yahoo;

pub use error::{DataError, Result};
pub use source::{PriceFrame, PriceSource, columns, price_rows};
pub use table::PriceTable;

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
