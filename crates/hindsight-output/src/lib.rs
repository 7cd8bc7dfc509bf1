#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hindsight/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod chart;
pub mod export;
pub mod report;

pub use chart::{CHART_TITLE, ValueChart};
pub use export::{ExportError, ExportFormat, Exporter, ValueRecord};
pub use report::{
    PRICE_TAIL_ROWS, PriceRow, ReportError, ValuationReport, ValuePoint, WeightRow,
    format_currency,
};
