//! Row normalization: raw cell grid → canonical ticket table.
//!
//! Headers are lowercased, embedded newlines become spaces and whitespace runs
//! collapse to a single space, so `"Umur\n  Tiket"` and `"umur tiket"` name
//! the same column.

use std::collections::HashMap;

use serde_json::Value;
use sheet_source::Grid;

use crate::errors::{ReportError, ReportResult};

/// Canonical column names used by the reports.
pub mod columns {
    pub const INCIDENT: &str = "incident";
    pub const STATUS: &str = "status";
    pub const SEKTOR: &str = "sektor";
    pub const CATEGORY: &str = "kategori loker";
    pub const AGE: &str = "umur tiket";
    pub const MEASUREMENT: &str = "hasil ukur";
    pub const CUSTOMER_TYPE: &str = "customer type";
    pub const CUSTOMER_SEGMENT: &str = "customer segment";
    pub const SUGAR_STATUS: &str = "status sugar";
    pub const STO: &str = "sto";
    pub const SUMMARY: &str = "summary";
    pub const SERIAL_NUMBER: &str = "sn";
    pub const CONTACT_NAME: &str = "contact name";
    pub const PHONE: &str = "no hp";
    pub const USER: &str = "user";
    pub const DATEK: &str = "datek";
    pub const TTR_4H: &str = "proses ttr 4 jam";
}

/// Canonical form of a header cell. Non-string cells yield `""`.
pub fn clean_header(cell: &Value) -> String {
    match cell {
        Value::String(s) => clean_header_text(s),
        _ => String::new(),
    }
}

/// Canonical form of a header string. Idempotent.
pub fn clean_header_text(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Value form used for comparisons: trimmed, whitespace collapsed, upper-cased.
pub fn normalize_token(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

/// Numeric ticket age; `None` when the cell is not a finite number.
pub fn parse_age(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn cell_text(cell: &Value) -> String {
    match cell {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Bool(true) => "TRUE".to_string(),
        Value::Bool(false) => "FALSE".to_string(),
        other => other.to_string(),
    }
}

/// One ticket: canonical column name → cell text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketRow {
    cells: HashMap<String, String>,
}

impl TicketRow {
    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells.get(column).map(String::as_str)
    }

    /// Cell text, or `""` when the column is absent.
    pub fn value(&self, column: &str) -> &str {
        self.get(column).unwrap_or("")
    }

    /// Cell text passed through [`normalize_token`].
    pub fn normalized(&self, column: &str) -> String {
        normalize_token(self.value(column))
    }

    pub fn age(&self) -> Option<f64> {
        parse_age(self.value(columns::AGE))
    }

    /// Normalized incident identifier used for matching.
    pub fn incident_key(&self) -> String {
        self.value(columns::INCIDENT).trim().to_uppercase()
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<String>) {
        self.cells.insert(column.into(), value.into());
    }
}

impl<K, V> FromIterator<(K, V)> for TicketRow
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            cells: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// A sheet after header normalization.
#[derive(Debug, Clone, Default)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<TicketRow>,
}

impl Table {
    /// Builds a table from a raw grid whose first row is the header row.
    ///
    /// Short rows are padded with `""`; cells past the header width are
    /// ignored. If two headers normalize to the same name, the left-most
    /// column wins.
    pub fn from_grid(grid: Grid) -> Self {
        let mut rows_iter = grid.into_iter();
        let Some(header_row) = rows_iter.next() else {
            return Self::default();
        };

        let headers: Vec<String> = header_row.iter().map(clean_header).collect();

        let rows = rows_iter
            .map(|raw| {
                let mut cells = HashMap::with_capacity(headers.len());
                for (idx, name) in headers.iter().enumerate() {
                    let text = raw.get(idx).map(cell_text).unwrap_or_default();
                    cells.entry(name.clone()).or_insert(text);
                }
                TicketRow { cells }
            })
            .collect();

        Self { headers, rows }
    }

    /// Builds a table directly from rows (headers are taken from `headers`).
    pub fn from_rows(headers: Vec<String>, rows: Vec<TicketRow>) -> Self {
        Self { headers, rows }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[TicketRow] {
        &self.rows
    }

    /// True when the sheet had no header row at all.
    pub fn is_blank(&self) -> bool {
        self.headers.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.headers.iter().any(|h| h == name)
    }

    /// Fails with [`ReportError::MissingColumn`] for the first absent column.
    /// A blank sheet has nothing to filter and passes.
    pub fn require_columns(&self, names: &[&str]) -> ReportResult<()> {
        if self.is_blank() {
            return Ok(());
        }
        match names.iter().find(|n| !self.has_column(n)) {
            Some(missing) => Err(ReportError::MissingColumn((*missing).to_string())),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn grid(rows: Vec<Value>) -> Grid {
        rows.into_iter()
            .map(|r| r.as_array().cloned().unwrap_or_default())
            .collect()
    }

    #[test]
    fn headers_are_canonicalized() {
        assert_eq!(clean_header(&json!("  Umur\nTiket ")), "umur tiket");
        assert_eq!(clean_header(&json!("KATEGORI   LOKER")), "kategori loker");
        assert_eq!(clean_header(&json!("Proses\r\nTTR 4 Jam")), "proses ttr 4 jam");
        assert_eq!(clean_header(&json!(42)), "");
        assert_eq!(clean_header(&Value::Null), "");
    }

    #[test]
    fn header_cleaning_is_idempotent() {
        for raw in ["  Status\nSugar", "HASIL  UKUR", "sto", "Customer\t\tType ", ""] {
            let once = clean_header_text(raw);
            assert_eq!(clean_header_text(&once), once);
        }
    }

    #[test]
    fn empty_grid_gives_blank_table() {
        let table = Table::from_grid(Vec::new());
        assert!(table.is_blank());
        assert!(table.rows().is_empty());
        assert!(table.require_columns(&["sektor"]).is_ok());
    }

    #[test]
    fn ragged_rows_are_padded() {
        let table = Table::from_grid(grid(vec![
            json!(["Incident", "Status", "Umur\nTiket"]),
            json!(["INC1", "OPEN"]),
            json!(["INC2", "OPEN", 3, "extra"]),
        ]));

        assert_eq!(table.headers(), &["incident", "status", "umur tiket"]);
        assert_eq!(table.rows()[0].value("umur tiket"), "");
        assert_eq!(table.rows()[1].value("umur tiket"), "3");
        assert_eq!(table.rows()[1].age(), Some(3.0));
        assert_eq!(table.rows()[1].get("extra"), None);
    }

    #[test]
    fn leftmost_duplicate_header_wins() {
        let table = Table::from_grid(grid(vec![
            json!(["STO", "sto "]),
            json!(["JAP", "ABE"]),
        ]));
        assert_eq!(table.rows()[0].value("sto"), "JAP");
    }

    #[test]
    fn missing_column_is_reported() {
        let table = Table::from_grid(grid(vec![json!(["incident"]), json!(["INC1"])]));
        let err = table.require_columns(&["incident", "sektor"]).unwrap_err();
        assert!(matches!(err, ReportError::MissingColumn(c) if c == "sektor"));
    }

    #[test]
    fn age_parsing_rejects_non_numbers() {
        assert_eq!(parse_age(" 7 "), Some(7.0));
        assert_eq!(parse_age("2.5"), Some(2.5));
        assert_eq!(parse_age(""), None);
        assert_eq!(parse_age("abc"), None);
        assert_eq!(parse_age("NaN"), None);
        assert_eq!(parse_age("inf"), None);
    }
}
