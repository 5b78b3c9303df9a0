//! Row normalization: one raw CSV row into one [`Measurement`] document.

use std::collections::BTreeMap;

use crate::coerce::{EpochUnit, coerce_bool, coerce_float, parse_epoch_timestamp};
use crate::document::Measurement;
use crate::identity::build_id;

/// Column holding the device identifier.
pub const DEVICE_COL: &str = "device";
/// Column holding the epoch timestamp.
pub const TS_COL: &str = "ts";
/// Columns a chunk must have for any of its rows to acquire an identity.
pub const REQUIRED_COLUMNS: [&str; 2] = [DEVICE_COL, TS_COL];

/// Declared float-valued measurement columns.
pub const NUMERIC_KEYS: [&str; 5] = ["temp", "humidity", "co", "smoke", "lpg"];
/// Declared boolean-valued measurement columns.
pub const BOOL_KEYS: [&str; 2] = ["light", "motion"];

/// Sentinel device for rows that carry no device identifier.
pub const UNKNOWN_DEVICE: &str = "unknown";

/// Cell values treated as missing, in addition to empty/whitespace.
/// Exact match, applied after trimming.
const NA_TOKENS: [&str; 4] = ["NA", "NaN", "null", "None"];

/// Normalize a column name: trim, lowercase, spaces to underscores.
pub fn normalize_column(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "_")
}

fn clean_cell(raw: &str) -> Option<&str> {
    let value = raw.trim();
    if value.is_empty() || NA_TOKENS.contains(&value) {
        None
    } else {
        Some(value)
    }
}

fn is_declared(column: &str) -> bool {
    column == DEVICE_COL
        || column == TS_COL
        || NUMERIC_KEYS.contains(&column)
        || BOOL_KEYS.contains(&column)
}

/// Borrowed view of one raw row: normalized column names paired with one
/// CSV record.
///
/// A cell is *missing* when its column is absent, the trimmed value is
/// empty, or the trimmed value is an NA token (`NA`, `NaN`, `null`,
/// `None`). Missing cells are indistinguishable from absent columns.
#[derive(Debug, Clone, Copy)]
pub struct RawRow<'a> {
    columns: &'a [String],
    record: &'a csv::StringRecord,
}

impl<'a> RawRow<'a> {
    pub fn new(columns: &'a [String], record: &'a csv::StringRecord) -> Self {
        Self { columns, record }
    }

    /// The trimmed value under `column`, or `None` if missing.
    pub fn get(&self, column: &str) -> Option<&'a str> {
        let idx = self.columns.iter().position(|c| c == column)?;
        clean_cell(self.record.get(idx)?)
    }

    /// All present (column, value) cells, in column order.
    pub fn cells(&self) -> impl Iterator<Item = (&'a str, &'a str)> {
        let columns = self.columns;
        let record = self.record;
        columns
            .iter()
            .zip(record.iter())
            .filter_map(|(name, value)| Some((name.as_str(), clean_cell(value)?)))
    }
}

/// Assemble a canonical document from a raw row.
///
/// - a missing device becomes [`UNKNOWN_DEVICE`] rather than rejecting the
///   row (an uncorrelated reading is still a reading)
/// - a row whose id cannot be computed is discarded; this is the sole
///   unconditional drop rule
/// - declared numeric/boolean fields are included only when coercion
///   succeeds
/// - with `keep_raw`, every unmapped non-missing cell is collected into the
///   `raw` sub-mapping, attached only if non-empty
pub fn normalize_row(row: &RawRow<'_>, epoch_unit: EpochUnit, keep_raw: bool) -> Option<Measurement> {
    let device = row.get(DEVICE_COL).unwrap_or(UNKNOWN_DEVICE);
    let timestamp = row.get(TS_COL).and_then(|v| parse_epoch_timestamp(v, epoch_unit));

    // No id, no document.
    let id = build_id(device, timestamp.map(|t| t.timestamp()))?;
    let timestamp = timestamp?;

    let raw = if keep_raw { unmapped_cells(row) } else { None };

    Some(Measurement {
        id,
        device: device.to_owned(),
        timestamp,
        temp: row.get("temp").and_then(coerce_float),
        humidity: row.get("humidity").and_then(coerce_float),
        co: row.get("co").and_then(coerce_float),
        smoke: row.get("smoke").and_then(coerce_float),
        lpg: row.get("lpg").and_then(coerce_float),
        light: row.get("light").and_then(coerce_bool),
        motion: row.get("motion").and_then(coerce_bool),
        raw,
    })
}

fn unmapped_cells(row: &RawRow<'_>) -> Option<BTreeMap<String, String>> {
    let raw: BTreeMap<String, String> = row
        .cells()
        .filter(|(name, _)| !is_declared(name))
        .map(|(name, value)| (name.to_owned(), value.to_owned()))
        .collect();
    (!raw.is_empty()).then_some(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_column_trims_lowercases_and_underscores() {
        assert_eq!(normalize_column(" Device ID "), "device_id");
        assert_eq!(normalize_column("TS"), "ts");
        assert_eq!(normalize_column("co"), "co");
    }

    #[test]
    fn raw_row_treats_na_tokens_as_missing() {
        let columns = vec!["device".to_string(), "ts".to_string()];
        let record = csv::StringRecord::from(vec!["NA", " 1700000000 "]);
        let row = RawRow::new(&columns, &record);

        assert_eq!(row.get("device"), None);
        assert_eq!(row.get("ts"), Some("1700000000"));
        assert_eq!(row.get("nonexistent"), None);
    }

    #[test]
    fn raw_row_cells_skip_missing_values() {
        let columns = vec!["device".to_string(), "note".to_string(), "ts".to_string()];
        let record = csv::StringRecord::from(vec!["dev-A", "", "1700000000"]);
        let row = RawRow::new(&columns, &record);

        let cells: Vec<_> = row.cells().collect();
        assert_eq!(cells, vec![("device", "dev-A"), ("ts", "1700000000")]);
    }

    #[test]
    fn raw_row_tolerates_short_records() {
        // Ragged row: fewer fields than columns.
        let columns = vec!["device".to_string(), "ts".to_string(), "temp".to_string()];
        let record = csv::StringRecord::from(vec!["dev-A", "1700000000"]);
        let row = RawRow::new(&columns, &record);

        assert_eq!(row.get("temp"), None);
        assert_eq!(row.get("device"), Some("dev-A"));
    }
}
