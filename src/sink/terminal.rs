use error_stack::Report;

use crate::error::ReportError;
use crate::report::{Cell, Projection, SignalReport, TrendReport};
use crate::sink::{ReportSink, write_stdout};

const EMPTY_MESSAGE: &str = "No valid stock data was gathered.";
const TREND_HEADERS: [&str; 6] = [
    "symbol",
    "golden_cross_imminent",
    "bias",
    "ma_short",
    "ma_long",
    "rsi",
];

/// Plain-text table on stdout.
pub struct TerminalSink {
    projection: Projection,
}

impl TerminalSink {
    pub fn new(projection: Projection) -> Self {
        Self { projection }
    }
}

impl ReportSink for TerminalSink {
    fn publish_signals(&self, report: &SignalReport) -> Result<(), Report<ReportError>> {
        tracing::debug!(run_id = %report.run_id, rows = report.records.len(), "rendering table");
        write_stdout(&render_signals(report, &self.projection))
    }

    fn publish_trends(&self, report: &TrendReport) -> Result<(), Report<ReportError>> {
        tracing::debug!(run_id = %report.run_id, rows = report.records.len(), "rendering table");
        write_stdout(&render_trends(report))
    }
}

pub fn render_signals(report: &SignalReport, projection: &Projection) -> String {
    if report.records.is_empty() {
        return EMPTY_MESSAGE.to_owned();
    }
    let headers: Vec<&str> = projection.columns().iter().map(|c| c.as_str()).collect();
    let rows: Vec<Vec<String>> = report
        .records
        .iter()
        .map(|record| {
            projection
                .row(record)
                .iter()
                .map(ToString::to_string)
                .collect()
        })
        .collect();
    render_table(&headers, &rows)
}

pub fn render_trends(report: &TrendReport) -> String {
    if report.records.is_empty() {
        return EMPTY_MESSAGE.to_owned();
    }
    let rows: Vec<Vec<String>> = report
        .records
        .iter()
        .map(|r| {
            vec![
                r.symbol.clone(),
                r.golden_cross_imminent.to_string(),
                r.bias.to_string(),
                Cell::Number(r.ma_short).to_string(),
                Cell::Number(r.ma_long).to_string(),
                Cell::Number(r.rsi).to_string(),
            ]
        })
        .collect();
    render_table(&TREND_HEADERS, &rows)
}

/// Left-aligned text, right-aligned everything else, columns padded to the
/// widest cell.
fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let header: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
    let rule: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();

    let mut out = Vec::with_capacity(rows.len() + 2);
    out.push(format_line(&header, &widths));
    out.push(format_line(&rule, &widths));
    out.extend(rows.iter().map(|row| format_line(row, &widths)));
    out.join("\n")
}

fn format_line(cells: &[String], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .enumerate()
        .map(|(i, (cell, &width))| {
            if i == 0 {
                format!("{cell:<width$}")
            } else {
                format!("{cell:>width$}")
            }
        })
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_owned()
}
