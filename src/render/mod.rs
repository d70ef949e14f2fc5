//! Output rendering: human summaries and JSON run records.

use colored::Colorize;

use crate::cli::args::OutputFormat;
use crate::core::pipeline::RunRecord;
use crate::error::{ProbeError, Result};

/// Render one run record in the requested format.
///
/// # Errors
///
/// Returns error if JSON serialization fails.
pub fn render_record(
    record: &RunRecord,
    format: OutputFormat,
    pretty: bool,
    no_color: bool,
) -> Result<String> {
    match format {
        OutputFormat::Json => {
            let out = if pretty {
                serde_json::to_string_pretty(record)?
            } else {
                serde_json::to_string(record)?
            };
            Ok(out)
        }
        OutputFormat::Human => Ok(render_human(record, no_color)),
    }
}

/// Render a batch of records (one probe report).
///
/// # Errors
///
/// Returns error if JSON serialization fails.
pub fn render_records(
    records: &[RunRecord],
    format: OutputFormat,
    pretty: bool,
    no_color: bool,
) -> Result<String> {
    match format {
        OutputFormat::Json => {
            let out = if pretty {
                serde_json::to_string_pretty(records)?
            } else {
                serde_json::to_string(records)?
            };
            Ok(out)
        }
        OutputFormat::Human => {
            let parts: Vec<String> = records
                .iter()
                .map(|record| render_human(record, no_color))
                .collect();
            Ok(parts.join("\n\n"))
        }
    }
}

fn render_human(record: &RunRecord, no_color: bool) -> String {
    let header = format!("{} · {}", record.provider_id, record.operation);
    let mut lines = Vec::with_capacity(record.summary.lines().count() + 1);
    if no_color {
        lines.push(header);
        lines.push(record.summary.clone());
        return lines.join("\n");
    }

    lines.push(header.bold().to_string());
    for line in record.summary.lines() {
        lines.push(colorize_line(line, record.response.ok));
    }
    lines.join("\n")
}

fn colorize_line(line: &str, ok: bool) -> String {
    if line.starts_with("[HTTP]") {
        if ok {
            line.green().to_string()
        } else {
            line.red().to_string()
        }
    } else if line.starts_with("[Error]") {
        line.red().to_string()
    } else if line.starts_with("[Hint]") || line.starts_with("[Note]") {
        line.yellow().to_string()
    } else if line.starts_with("[URL]") {
        line.dimmed().to_string()
    } else {
        line.to_string()
    }
}

/// Render a fatal error in the requested format.
#[must_use]
pub fn render_error(error: &ProbeError, format: OutputFormat, no_color: bool) -> String {
    let tag = error.kind().tag();
    match format {
        OutputFormat::Json => serde_json::json!({
            "error": {
                "kind": tag,
                "message": error.to_string(),
            }
        })
        .to_string(),
        OutputFormat::Human => {
            let line = format!("[{tag}] {error}");
            if no_color {
                line
            } else {
                line.red().to_string()
            }
        }
    }
}
