use serde::Serialize;
use serde_json::Value;

use crate::cli::OutputFormat;
use crate::error::CliError;
use crate::metadata::RunId;

/// Everything a command prints to stdout.
#[derive(Debug, Serialize)]
pub struct Report {
    pub run_id: RunId,
    pub command: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    pub data: Value,
}

pub fn render(report: &Report, format: OutputFormat, pretty: bool) -> Result<(), CliError> {
    match format {
        OutputFormat::Json => {
            let payload = if pretty {
                serde_json::to_string_pretty(report)?
            } else {
                serde_json::to_string(report)?
            };
            println!("{payload}");
        }
        OutputFormat::Table => print!("{}", render_table(report)?),
    }
    Ok(())
}

fn render_table(report: &Report) -> Result<String, CliError> {
    let mut out = String::new();
    out.push_str(&format!("run_id : {}\n", report.run_id));
    out.push_str(&format!("command: {}\n", report.command));
    if !report.warnings.is_empty() {
        out.push_str("warnings:\n");
        for warning in &report.warnings {
            out.push_str(&format!("  - {warning}\n"));
        }
    }

    if let Some(grid) = grid(&report.data) {
        out.push_str(&grid);
        return Ok(out);
    }

    out.push_str("data:\n");
    for line in serde_json::to_string_pretty(&report.data)?.lines() {
        out.push_str(&format!("  {line}\n"));
    }
    Ok(out)
}

/// Column-aligned rendering for `{columns, rows}` payloads.
fn grid(data: &Value) -> Option<String> {
    let columns = data.get("columns")?.as_array()?;
    let rows = data.get("rows")?.as_array()?;

    let header: Vec<String> = columns
        .iter()
        .map(|column| {
            column
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_owned()
        })
        .collect();
    let body: Vec<Vec<String>> = rows
        .iter()
        .filter_map(Value::as_array)
        .map(|row| row.iter().map(cell).collect())
        .collect();

    let mut widths: Vec<usize> = header.iter().map(String::len).collect();
    for row in &body {
        for (width, value) in widths.iter_mut().zip(row) {
            *width = (*width).max(value.len());
        }
    }

    let line = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_owned()
    };

    let mut out = String::new();
    out.push_str(&line(&header));
    out.push('\n');
    out.push_str(
        &widths
            .iter()
            .map(|width| "-".repeat(*width))
            .collect::<Vec<_>>()
            .join("-+-"),
    );
    out.push('\n');
    for row in &body {
        out.push_str(&line(row));
        out.push('\n');
    }
    Some(out)
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::from("NULL"),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
