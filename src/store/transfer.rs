//! JSON import and export of the quote collection.

use serde_json::Value;
use std::path::Path;
use tracing::debug;

use crate::error::{QuoteError, Result};
use crate::models::Record;

/// Default export file name
pub const EXPORT_FILE_NAME: &str = "quotes.json";

/// Pretty-printed JSON array mirroring the persisted collection
pub fn export_json(records: &[Record]) -> Result<String> {
    Ok(serde_json::to_string_pretty(records)?)
}

/// Write the export to `path`
pub fn export_to_file(records: &[Record], path: &Path) -> Result<()> {
    std::fs::write(path, export_json(records)?)?;
    Ok(())
}

fn non_empty_str(item: &Value, field: &str) -> bool {
    item.get(field)
        .and_then(Value::as_str)
        .map(|s| !s.is_empty())
        .unwrap_or(false)
}

/// Parse an import document.
///
/// The top-level value must be an array. Elements without non-empty string
/// `text` and `category` are skipped; if nothing survives the import is
/// rejected as a whole.
pub fn parse_import(json: &str) -> Result<Vec<Record>> {
    let value: Value = serde_json::from_str(json)?;
    let Value::Array(items) = value else {
        return Err(QuoteError::ImportNotArray);
    };

    let total = items.len();
    let valid: Vec<Record> = items
        .into_iter()
        .filter(|item| non_empty_str(item, "text") && non_empty_str(item, "category"))
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect();

    debug!("Import: {} of {} elements valid", valid.len(), total);

    if valid.is_empty() {
        return Err(QuoteError::NoValidQuotes);
    }
    Ok(valid)
}
