//! Output formatting utilities

use std::fmt::Write as _;
use std::io::Write;

use crate::error::CliResult;
use crate::replay::ReplayReport;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// One line per telemetry event, then a summary
    #[default]
    Text,
    /// The full report as JSON
    Json,
}

/// Render a replay report as text.
pub fn render_text(report: &ReplayReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "attempt {}", report.attempt_id);
    for event in &report.events {
        let _ = writeln!(
            out,
            "{:>4}.{:03}s  {:<28} {}",
            event.at_ms / 1_000,
            event.at_ms % 1_000,
            event.event_type.as_str(),
            event.payload
        );
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "final state:     {}", report.final_state);
    let _ = writeln!(out, "status:          {}", report.status.headline);
    let _ = writeln!(
        out,
        "ended at:        {}.{:03}s",
        report.ended_at_ms / 1_000,
        report.ended_at_ms % 1_000
    );
    let _ = writeln!(
        out,
        "force submitted: {}",
        if report.force_submitted { "yes" } else { "no" }
    );
    let _ = writeln!(
        out,
        "photos:          {} captured, {} stored",
        report.capture_attempts,
        report.evidence.len()
    );
    out
}

/// Write a report in the requested format.
pub fn write_report<W: Write>(
    writer: &mut W,
    report: &ReplayReport,
    format: OutputFormat,
) -> CliResult<()> {
    match format {
        OutputFormat::Text => writer.write_all(render_text(report).as_bytes())?,
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *writer, report)?;
            writeln!(writer)?;
        }
    }
    Ok(())
}
