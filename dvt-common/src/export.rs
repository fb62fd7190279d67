//! Delimited-text (CSV) export of backend records
//!
//! Header row comes from the keys of the first record, in insertion order.
//! Every row emits values in that same key order. Strings containing a comma
//! or a double quote are wrapped in quotes with inner quotes doubled.

use serde_json::Value;
use thiserror::Error;

use crate::Record;

/// Export errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExportError {
    /// Nothing to export; no file is produced
    #[error("No data to export")]
    NoData,
}

/// Serialize uniform flat records to delimited text
pub fn to_delimited(records: &[Record]) -> Result<String, ExportError> {
    let first = records.first().ok_or(ExportError::NoData)?;
    let headers: Vec<&String> = first.keys().collect();

    let mut lines = Vec::with_capacity(records.len() + 1);
    lines.push(
        headers
            .iter()
            .map(|h| h.as_str())
            .collect::<Vec<_>>()
            .join(","),
    );

    for record in records {
        let row: Vec<String> = headers
            .iter()
            .map(|header| format_cell(record.get(header.as_str())))
            .collect();
        lines.push(row.join(","));
    }

    Ok(lines.join("\n"))
}

fn format_cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => quote_if_needed(s),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => n.to_string(),
        // Arrays and objects (e.g. music_platforms) go out as their JSON text
        Some(other) => quote_if_needed(&other.to_string()),
    }
}

fn quote_if_needed(s: &str) -> String {
    if s.contains(',') || s.contains('"') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
