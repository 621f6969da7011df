use error_stack::{Report, ResultExt};
use serde::Serialize;

use crate::error::ReportError;
use crate::report::{Projection, SignalReport, TrendReport};
use crate::sink::{ReportSink, write_stdout};

/// Pretty-printed JSON on stdout, the payload handed to downstream tooling.
pub struct JsonSink {
    projection: Projection,
}

impl JsonSink {
    pub fn new(projection: Projection) -> Self {
        Self { projection }
    }

    pub fn render_signals(&self, report: &SignalReport) -> Result<String, Report<ReportError>> {
        to_pretty_json(&self.projection.apply(report))
    }
}

fn to_pretty_json<T: Serialize>(value: &T) -> Result<String, Report<ReportError>> {
    serde_json::to_string_pretty(value).change_context(ReportError::Render)
}

impl ReportSink for JsonSink {
    fn publish_signals(&self, report: &SignalReport) -> Result<(), Report<ReportError>> {
        write_stdout(&self.render_signals(report)?)
    }

    fn publish_trends(&self, report: &TrendReport) -> Result<(), Report<ReportError>> {
        write_stdout(&to_pretty_json(report)?)
    }
}
