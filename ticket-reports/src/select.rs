//! Ticket selection and enrichment.
//!
//! Two report selectors (regional SQM, global CCAN) plus single-incident
//! lookup. Selectors borrow rows from the source [`Table`] and return them in
//! report order.

use std::{
    cmp::Ordering,
    collections::{BTreeSet, HashMap},
    sync::LazyLock,
};

use regex::Regex;
use tracing::debug;

use crate::{
    errors::ReportResult,
    table::{Table, TicketRow, columns, normalize_token},
};

const STATUS_OPEN: &str = "OPEN";
const MEASUREMENT_LOS: &str = "LOS";
const CATEGORY_SQM: &str = "SQM";
const CATEGORY_CCAN: &str = "SQM(CCAN)";
/// Segment shown when the lookup sheet has nothing for a ticket.
pub const SEGMENT_UNKNOWN: &str = "N/A";

static INCIDENT_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\binc\d+\b").expect("valid incident regex"));

/// A row selected for a regional SQM report.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionalTicket<'a> {
    pub row: &'a TicketRow,
    pub age: f64,
}

/// A row selected for the global CCAN report, joined with its segment.
#[derive(Debug, Clone, PartialEq)]
pub struct CcanTicket<'a> {
    pub row: &'a TicketRow,
    pub age: Option<f64>,
    pub segment: String,
}

fn is_open_los(row: &TicketRow) -> bool {
    row.normalized(columns::STATUS) == STATUS_OPEN
        && row.normalized(columns::MEASUREMENT) == MEASUREMENT_LOS
}

/// Open LOS tickets of category SQM in the given sektor labels, younger than
/// `threshold`, sorted by age (stable). Rows with unparseable age are dropped.
pub fn select_regional_sqm<'a>(
    table: &'a Table,
    sektor_labels: &[String],
    threshold: f64,
) -> ReportResult<Vec<RegionalTicket<'a>>> {
    table.require_columns(&[
        columns::SEKTOR,
        columns::STATUS,
        columns::MEASUREMENT,
        columns::CATEGORY,
        columns::AGE,
    ])?;

    let labels: BTreeSet<String> = sektor_labels.iter().map(|l| normalize_token(l)).collect();

    let mut selected: Vec<RegionalTicket<'a>> = table
        .rows()
        .iter()
        .filter(|row| labels.contains(&row.normalized(columns::SEKTOR)))
        .filter(|row| is_open_los(row))
        .filter(|row| row.normalized(columns::CATEGORY) == CATEGORY_SQM)
        .filter_map(|row| {
            row.age()
                .filter(|age| *age < threshold)
                .map(|age| RegionalTicket { row, age })
        })
        .collect();

    selected.sort_by(|a, b| a.age.total_cmp(&b.age));

    debug!(
        labels = sektor_labels.len(),
        selected = selected.len(),
        "regional SQM selection"
    );
    Ok(selected)
}

/// Open LOS tickets of category SQM(CCAN), left-joined with `lookup` on the
/// incident to attach `customer segment`. Sorted by age; rows whose age does
/// not parse come last, in table order.
pub fn select_global_ccan<'a>(
    tickets: &'a Table,
    lookup: &Table,
) -> ReportResult<Vec<CcanTicket<'a>>> {
    tickets.require_columns(&[
        columns::INCIDENT,
        columns::STATUS,
        columns::MEASUREMENT,
        columns::CATEGORY,
        columns::AGE,
    ])?;
    lookup.require_columns(&[columns::INCIDENT, columns::CUSTOMER_SEGMENT])?;

    let index = index_by_incident(lookup);

    let mut selected: Vec<CcanTicket<'a>> = tickets
        .rows()
        .iter()
        .filter(|row| is_open_los(row))
        .filter(|row| row.normalized(columns::CATEGORY) == CATEGORY_CCAN)
        .map(|row| {
            let segment = index
                .get(&row.incident_key())
                .map(|extra| extra.value(columns::CUSTOMER_SEGMENT).trim())
                .filter(|s| !s.is_empty())
                .unwrap_or(SEGMENT_UNKNOWN)
                .to_string();
            CcanTicket {
                row,
                age: row.age(),
                segment,
            }
        })
        .collect();

    selected.sort_by(|a, b| cmp_missing_last(a.age, b.age));

    debug!(selected = selected.len(), "global CCAN selection");
    Ok(selected)
}

/// Ascending order with `None` after every number.
fn cmp_missing_last(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Maps normalized incident → first row carrying it.
pub fn index_by_incident(table: &Table) -> HashMap<String, &TicketRow> {
    let mut index = HashMap::with_capacity(table.rows().len());
    for row in table.rows() {
        let key = row.incident_key();
        if !key.is_empty() {
            index.entry(key).or_insert(row);
        }
    }
    index
}

/// First row whose incident matches `incident_id` case-insensitively.
pub fn find_incident<'a>(table: &'a Table, incident_id: &str) -> ReportResult<Option<&'a TicketRow>> {
    table.require_columns(&[columns::INCIDENT])?;
    let wanted = incident_id.trim().to_uppercase();
    Ok(table.rows().iter().find(|row| row.incident_key() == wanted))
}

/// Copy of `row` with `summary` and `customer segment` filled from the
/// matching lookup row when that row has non-blank values.
pub fn enrich_incident(row: &TicketRow, lookup: Option<&HashMap<String, &TicketRow>>) -> TicketRow {
    let mut enriched = row.clone();
    let Some(extra) = lookup.and_then(|index| index.get(&row.incident_key())) else {
        return enriched;
    };

    for column in [columns::SUMMARY, columns::CUSTOMER_SEGMENT] {
        let value = extra.value(column).trim();
        if !value.is_empty() {
            enriched.insert(column, value);
        }
    }
    enriched
}

/// `INC<digits>` tokens anywhere in `text`, upper-cased, deduplicated, sorted.
pub fn extract_incident_ids(text: &str) -> Vec<String> {
    INCIDENT_TOKEN
        .find_iter(text)
        .map(|m| m.as_str().to_uppercase())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
