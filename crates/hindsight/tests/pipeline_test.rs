//! End-to-end pipeline runs against in-memory price sources.

use approx::assert_relative_eq;
use chrono::{Duration, NaiveDate};
use hindsight::data::{DataError, PriceFrame, PriceSource, price_rows};
use hindsight::{PipelineError, PortfolioConfig, run};
use polars::prelude::*;
use std::cell::Cell;

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 3, d).unwrap()
}

/// Serves fixed daily closes, honouring the `[start, end)` window.
struct StaticSource {
    series: Vec<(&'static str, Vec<f64>)>,
    first_day: NaiveDate,
    calls: Cell<usize>,
}

impl StaticSource {
    fn new(series: Vec<(&'static str, Vec<f64>)>) -> Self {
        Self {
            series,
            first_day: day(1),
            calls: Cell::new(0),
        }
    }
}

impl PriceSource for StaticSource {
    async fn fetch(
        &self,
        tickers: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> hindsight::data::Result<PriceFrame> {
        self.calls.set(self.calls.get() + 1);

        let mut frames = Vec::new();
        for ticker in tickers {
            let Some((_, closes)) = self.series.iter().find(|(s, _)| *s == ticker.as_str()) else {
                continue;
            };
            let (dates, closes): (Vec<NaiveDate>, Vec<f64>) = closes
                .iter()
                .enumerate()
                .map(|(i, &c)| (self.first_day + Duration::days(i as i64), c))
                .filter(|(d, _)| *d >= start && *d < end)
                .unzip();
            frames.push((ticker.clone(), price_rows(&dates, &closes)?));
        }

        if let [ticker] = tickers {
            let frame = frames
                .pop()
                .map_or_else(DataFrame::empty, |(_, frame)| frame);
            return Ok(PriceFrame::flat(ticker.as_str(), frame));
        }
        PriceFrame::keyed(frames)
    }
}

/// Returns the same frame, or error, for every request.
enum FixedSource {
    Frame(PriceFrame),
    TimesOut,
}

impl PriceSource for FixedSource {
    async fn fetch(
        &self,
        tickers: &[String],
        _start: NaiveDate,
        _end: NaiveDate,
    ) -> hindsight::data::Result<PriceFrame> {
        match self {
            Self::Frame(frame) => Ok(frame.clone()),
            Self::TimesOut => Err(DataError::Timeout {
                symbol: tickers[0].clone(),
                timeout: std::time::Duration::from_secs(30),
            }),
        }
    }
}

fn config(tickers: &str, weights: Vec<f64>, start: NaiveDate, end: NaiveDate) -> PortfolioConfig {
    PortfolioConfig::builder()
        .tickers_csv(tickers)
        .weights(weights)
        .initial_investment(10_000.0)
        .start_date(start)
        .end_date(end)
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_weighted_run() {
    let source = StaticSource::new(vec![
        ("AAPL", vec![100.0, 102.0, 101.0]),
        ("MSFT", vec![200.0, 198.0, 204.0]),
    ]);
    let config = config("aapl, msft", vec![0.75, 0.25], day(1), day(31));

    let result = run(&source, &config).await.unwrap();

    assert_eq!(result.prices().len(), 3);
    assert_eq!(result.values().dates(), &[day(2), day(3)]);

    // 0.75 * 0.02 + 0.25 * -0.01 = 0.0125
    assert_relative_eq!(result.returns().returns()[0], 0.0125, epsilon = 1e-12);
    assert_relative_eq!(result.values().values()[0], 10_125.0, epsilon = 1e-6);

    let second = 0.75 * (101.0 / 102.0 - 1.0) + 0.25 * (204.0 / 198.0 - 1.0);
    assert_relative_eq!(
        result.final_value().unwrap(),
        10_125.0 * (1.0 + second),
        epsilon = 1e-6
    );
}

#[tokio::test]
async fn test_offsetting_moves_keep_initial_value() {
    let source = StaticSource::new(vec![("A", vec![100.0, 110.0]), ("B", vec![50.0, 45.0])]);
    let config = config("A,B", vec![0.5, 0.5], day(1), day(31));

    let result = run(&source, &config).await.unwrap();

    assert_relative_eq!(result.returns().returns()[0], 0.0, epsilon = 1e-12);
    assert_relative_eq!(result.final_value().unwrap(), 10_000.0, epsilon = 1e-9);
}

#[tokio::test]
async fn test_single_ticker_compounds_multiplicatively() {
    let source = StaticSource::new(vec![("SPY", vec![100.0, 110.0, 99.0])]);
    let config = config("SPY", vec![1.0], day(1), day(31));

    let result = run(&source, &config).await.unwrap();

    assert_relative_eq!(result.final_value().unwrap(), 9_900.0, epsilon = 1e-6);
    let report = result.report();
    assert!(report.to_ascii_table().contains("$9,900.00"));
}

#[tokio::test]
async fn test_same_start_and_end_is_empty_series() {
    let source = StaticSource::new(vec![("AAPL", vec![100.0, 101.0, 102.0])]);
    let config = config("AAPL", vec![1.0], day(2), day(2));

    let result = run(&source, &config).await;

    assert!(matches!(result, Err(PipelineError::EmptySeries { .. })));
}

#[tokio::test]
async fn test_single_trading_day_is_empty_series() {
    let source = StaticSource::new(vec![
        ("AAPL", vec![100.0, 101.0, 102.0]),
        ("MSFT", vec![200.0, 201.0, 202.0]),
    ]);
    let config = config("AAPL,MSFT", vec![0.5, 0.5], day(2), day(3));

    let result = run(&source, &config).await;

    assert!(matches!(result, Err(PipelineError::EmptySeries { .. })));
}

#[tokio::test]
async fn test_degenerate_weights_never_fetch() {
    let source = StaticSource::new(vec![("AAPL", vec![100.0, 101.0])]);
    let config = config("AAPL,MSFT", vec![0.0, 0.0], day(1), day(31));

    let result = run(&source, &config).await;

    assert!(matches!(result, Err(PipelineError::DegenerateWeights)));
    assert_eq!(source.calls.get(), 0);
}

#[tokio::test]
async fn test_timeout_aborts() {
    let config = config("AAPL", vec![1.0], day(1), day(31));

    let result = run(&FixedSource::TimesOut, &config).await;

    assert!(matches!(
        result,
        Err(PipelineError::Timeout { ref symbol, timeout })
            if symbol == "AAPL" && timeout.as_secs() == 30
    ));
}

#[tokio::test]
async fn test_missing_price_column() {
    let frame = df!("date" => [0i32, 1], "close" => [1.0, 2.0]).unwrap();
    let config = config("AAPL", vec![1.0], day(1), day(31));

    let result = run(&FixedSource::Frame(PriceFrame::flat("AAPL", frame)), &config).await;

    assert!(matches!(
        result,
        Err(PipelineError::MissingColumn { ref column }) if column == "adjusted_close"
    ));
}

#[tokio::test]
async fn test_nothing_returned_is_no_data() {
    let source = StaticSource::new(Vec::new());
    let config = config("AAPL,MSFT", vec![0.5, 0.5], day(1), day(31));

    let result = run(&source, &config).await;

    assert!(matches!(result, Err(PipelineError::NoData { .. })));
    assert_eq!(source.calls.get(), 1);
}

#[tokio::test]
async fn test_unknown_ticker_leaves_no_common_dates() {
    let source = StaticSource::new(vec![("AAPL", vec![100.0, 101.0, 102.0])]);
    let config = config("AAPL,NOPE", vec![0.5, 0.5], day(1), day(31));

    let result = run(&source, &config).await;

    assert!(matches!(result, Err(PipelineError::EmptySeries { .. })));
}

#[tokio::test]
async fn test_runs_are_bit_identical() {
    let closes = |seed: f64| -> Vec<f64> { (0..60).map(|i| seed + (i as f64 * 0.37).sin() * 5.0).collect() };
    let source = StaticSource::new(vec![
        ("AAPL", closes(150.0)),
        ("MSFT", closes(300.0)),
        ("GOOGL", closes(90.0)),
    ]);
    let config = config("AAPL,MSFT,GOOGL", vec![0.2, 0.3, 0.5], day(1), day(31));

    let first = run(&source, &config).await.unwrap();
    let second = run(&source, &config).await.unwrap();

    let bits = |values: &[f64]| values.iter().map(|v| v.to_bits()).collect::<Vec<_>>();
    assert_eq!(bits(first.values().values()), bits(second.values().values()));
    assert_eq!(first.values().len(), 29);
}
