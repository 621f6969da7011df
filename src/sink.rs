pub mod json;
pub mod terminal;

use error_stack::Report;

use crate::error::ReportError;
use crate::report::{SignalReport, TrendReport};

/// Destination for finished reports.
pub trait ReportSink: Send + Sync {
    fn publish_signals(&self, report: &SignalReport) -> Result<(), Report<ReportError>>;

    fn publish_trends(&self, report: &TrendReport) -> Result<(), Report<ReportError>>;
}

/// Write `content` followed by a newline to stdout.
fn write_stdout(content: &str) -> Result<(), Report<ReportError>> {
    use std::io::Write;

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{content}")
        .and_then(|()| stdout.flush())
        .map_err(|e| Report::new(e).change_context(ReportError::Render))
}
