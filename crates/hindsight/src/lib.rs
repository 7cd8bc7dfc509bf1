#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hindsight/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod pipeline;

// Re-export main types from sub-crates
pub use hindsight_data as data;
pub use hindsight_output as output;
pub use hindsight_valuation as valuation;

pub use config::{
    ConfigBuilder, ConfigError, ConfigFile, DEFAULT_INVESTMENT, DEFAULT_TICKERS, MIN_INVESTMENT,
    PortfolioConfig, parse_date, parse_tickers,
};
pub use pipeline::{PipelineError, PortfolioRun, Result, run};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
