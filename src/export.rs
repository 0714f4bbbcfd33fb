//! Export encoders over completed scan results.
//!
//! Pure serializers: they only ever read the already-produced records.

use crate::error::Result;
use crate::records::{EmailRecord, LinkRecord};
use chrono::Utc;
use serde_json::json;

/// Serializes link records as pretty JSON with an export envelope
pub fn links_to_json(records: &[&LinkRecord]) -> Result<String> {
    let payload = json!({
        "links": records,
        "exportedAt": Utc::now(),
        "totalCount": records.len(),
    });
    Ok(serde_json::to_string_pretty(&payload)?)
}

/// Serializes email records as pretty JSON with an export envelope
pub fn emails_to_json(records: &[&EmailRecord]) -> Result<String> {
    let payload = json!({
        "emails": records,
        "exportedAt": Utc::now(),
        "totalCount": records.len(),
    });
    Ok(serde_json::to_string_pretty(&payload)?)
}

/// Serializes link records as CSV
pub fn links_to_csv(records: &[&LinkRecord]) -> String {
    let mut csv = String::from("URL,Text,Type,Domain,Visible on Page\n");

    for record in records {
        let text = if record.text.is_empty() {
            "No text"
        } else {
            record.text.as_str()
        };
        csv.push_str(&format!(
            "{},{},{},{},{}\n",
            quote(&record.url),
            quote(text),
            if record.is_external { "External" } else { "Internal" },
            quote(&record.domain),
            if record.is_visible { "Yes" } else { "No" },
        ));
    }

    csv
}

/// Serializes email records as CSV
pub fn emails_to_csv(records: &[&EmailRecord]) -> String {
    let mut csv = String::from("Email,Source,Domain,Context,Visible on Page\n");

    for record in records {
        csv.push_str(&format!(
            "{},{},{},{},{}\n",
            quote(&record.email),
            record.source,
            quote(&record.domain),
            quote(&record.context),
            if record.is_visible { "Yes" } else { "No" },
        ));
    }

    csv
}

/// Timestamped export filename, e.g. `links-2025-01-05T10-30-00.json`
pub fn export_filename(prefix: &str, extension: &str) -> String {
    let timestamp = Utc::now().format("%Y-%m-%dT%H-%M-%S");
    format!("{prefix}-{timestamp}.{extension}")
}

/// Double-quotes a CSV field, escaping embedded quotes
fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}
