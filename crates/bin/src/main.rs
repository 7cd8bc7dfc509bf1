//! Hindsight CLI binary.
//!
//! Values a weighted stock portfolio over a past date window.

use clap::{Args, Parser, Subcommand, ValueEnum};
use hindsight::data::yahoo::YahooQuoteProvider;
use hindsight::output::{ExportFormat, Exporter, ValueChart};
use hindsight::{ConfigBuilder, ConfigFile, PortfolioConfig, parse_date};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::process;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hindsight")]
#[command(about = "Hindsight: what a weighted stock portfolio would be worth", long_about = None)]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch prices and compute the cumulative portfolio value
    Value {
        #[command(flatten)]
        portfolio: PortfolioArgs,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Write an HTML chart of the value series
        #[arg(long, value_name = "PATH")]
        chart: Option<PathBuf>,

        /// Export the value series (.csv or .json)
        #[arg(long, value_name = "PATH")]
        export: Option<PathBuf>,

        /// Per-request timeout in seconds
        #[arg(long, default_value = "30")]
        timeout: u64,
    },

    /// Show the normalized weights without fetching prices
    Weights {
        #[command(flatten)]
        portfolio: PortfolioArgs,
    },
}

#[derive(Args)]
struct PortfolioArgs {
    /// Comma-separated ticker symbols [default: AAPL,MSFT,GOOGL]
    #[arg(long)]
    tickers: Option<String>,

    /// Comma-separated weights in [0, 1], one per ticker [default: equal]
    #[arg(long)]
    weights: Option<String>,

    /// Initial investment in dollars, at least 1000 [default: 10000]
    #[arg(long)]
    investment: Option<f64>,

    /// Start date (YYYY-MM-DD) [default: 2023-01-01]
    #[arg(long)]
    start: Option<String>,

    /// End date (YYYY-MM-DD), exclusive [default: 2023-12-31]
    #[arg(long)]
    end: Option<String>,

    /// TOML file with the same settings
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

impl PortfolioArgs {
    fn to_config(&self) -> Result<PortfolioConfig, Box<dyn std::error::Error>> {
        let mut builder = ConfigBuilder::default();

        if let Some(path) = &self.config {
            builder = builder.file(ConfigFile::load(path)?);
        }
        if let Some(tickers) = &self.tickers {
            builder = builder.tickers_csv(tickers);
        }
        if let Some(weights) = &self.weights {
            builder = builder.weights(parse_weights(weights)?);
        }
        if let Some(investment) = self.investment {
            builder = builder.initial_investment(investment);
        }
        if let Some(start) = &self.start {
            builder = builder.start_date(parse_date(start)?);
        }
        if let Some(end) = &self.end {
            builder = builder.end_date(parse_date(end)?);
        }

        Ok(builder.build()?)
    }
}

fn parse_weights(input: &str) -> Result<Vec<f64>, String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|w| !w.is_empty())
        .map(|w| {
            w.parse::<f64>()
                .map_err(|_| format!("Invalid weight '{}': expected a number", w))
        })
        .collect()
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Value {
            portfolio,
            format,
            chart,
            export,
            timeout,
        } => {
            let config = portfolio.to_config()?;
            value_portfolio(&config, format, chart, export, timeout).await?;
        }
        Commands::Weights { portfolio } => {
            let config = portfolio.to_config()?;
            println!("{}", config.weight_vector()?);
        }
    }

    Ok(())
}

async fn value_portfolio(
    config: &PortfolioConfig,
    format: OutputFormat,
    chart: Option<PathBuf>,
    export: Option<PathBuf>,
    timeout: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    let provider = YahooQuoteProvider::new()?.with_timeout(Duration::from_secs(timeout));

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(format!(
        "Fetching prices for {}...",
        config.tickers().join(", ")
    ));

    let result = hindsight::run(&provider, config).await;
    pb.finish_and_clear();
    let portfolio = result?;
    let report = portfolio.report();

    match format {
        OutputFormat::Text => print!("{}", report.to_ascii_table()),
        OutputFormat::Json => println!("{}", report.to_json()?),
    }

    if let Some(path) = chart {
        ValueChart::from_report(&report).write_html(&path)?;
        info!(path = %path.display(), "wrote chart");
        eprintln!("Chart written to {}", path.display());
    }

    if let Some(path) = export {
        report.export_to_file(&path, ExportFormat::from_path(&path)?)?;
        info!(path = %path.display(), "exported value series");
        eprintln!("Exported value series to {}", path.display());
    }

    Ok(())
}
