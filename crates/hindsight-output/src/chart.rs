//! HTML line chart of portfolio value over time.

use crate::report::{ReportError, ValuationReport};
use plotly::color::NamedColor;
use plotly::common::{DashType, Line, Mode, Title};
use plotly::layout::{Axis, Layout};
use plotly::{Plot, Scatter};
use std::path::Path;

/// Chart title.
pub const CHART_TITLE: &str = "Cumulative Portfolio Value";

/// Value line plus a flat reference line at the initial investment.
#[derive(Debug, Clone)]
pub struct ValueChart {
    dates: Vec<String>,
    values: Vec<f64>,
    initial_investment: f64,
    line_width: f64,
}

impl ValueChart {
    /// Chart the value series of a report.
    pub fn from_report(report: &ValuationReport) -> Self {
        Self {
            dates: report.values.iter().map(|p| p.date.to_string()).collect(),
            values: report.values.iter().map(|p| p.value).collect(),
            initial_investment: report.initial_investment,
            line_width: 2.0,
        }
    }

    /// Override the value line width.
    pub const fn with_line_width(mut self, width: f64) -> Self {
        self.line_width = width;
        self
    }

    /// Number of plotted points.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True if there is nothing to plot.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Build the plotly figure.
    pub fn plot(&self) -> Plot {
        let mut plot = Plot::new();

        let value = Scatter::new(self.dates.clone(), self.values.clone())
            .mode(Mode::Lines)
            .name("Portfolio Value")
            .line(Line::new().width(self.line_width).color(NamedColor::Green));

        let reference = Scatter::new(
            self.dates.clone(),
            vec![self.initial_investment; self.dates.len()],
        )
        .mode(Mode::Lines)
        .name("Initial Investment")
        .line(Line::new().color(NamedColor::Red).dash(DashType::Dash));

        plot.add_trace(value);
        plot.add_trace(reference);
        plot.set_layout(
            Layout::new()
                .title(Title::from(CHART_TITLE))
                .x_axis(Axis::new().title("Date"))
                .y_axis(Axis::new().title("Portfolio Value ($)")),
        );
        plot
    }

    /// Standalone HTML document.
    pub fn to_html(&self) -> String {
        self.plot().to_html()
    }

    /// Write the HTML document to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Io`] if the file cannot be written.
    pub fn write_html(&self, path: &Path) -> Result<(), ReportError> {
        std::fs::write(path, self.to_html())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::ValuePoint;
    use chrono::NaiveDate;

    fn report() -> ValuationReport {
        let day = |d| NaiveDate::from_ymd_opt(2023, 5, d).unwrap();
        ValuationReport {
            tickers: vec!["AAPL".to_string()],
            start_date: day(1),
            end_date: day(5),
            initial_investment: 10_000.0,
            price_tail: Vec::new(),
            weights: Vec::new(),
            values: vec![
                ValuePoint {
                    date: day(2),
                    value: 10_150.0,
                },
                ValuePoint {
                    date: day(3),
                    value: 9_975.5,
                },
            ],
            final_value: Some(9_975.5),
        }
    }

    #[test]
    fn test_chart_points() {
        let chart = ValueChart::from_report(&report());
        assert_eq!(chart.len(), 2);
        assert!(!chart.is_empty());
    }

    #[test]
    fn test_chart_html_labels() {
        let html = ValueChart::from_report(&report()).to_html();

        assert!(html.contains(CHART_TITLE));
        assert!(html.contains("Initial Investment"));
        assert!(html.contains("Portfolio Value ($)"));
        assert!(html.contains("2023-05-02"));
    }
}
