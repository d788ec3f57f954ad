//! Report rendering in Telegram's HTML subset.
//!
//! Every raw sheet value is escaped before it is embedded; only the markup
//! produced here (`<code>`, `<b>`) reaches the chat unescaped.

use std::borrow::Cow;

use chrono::DateTime;
use chrono_tz::Tz;

use crate::{
    select::{CcanTicket, RegionalTicket, SEGMENT_UNKNOWN},
    table::{TicketRow, columns, normalize_token},
};

const TITLE_ICON: &str = "⏰";
const ALERT_MARKER: &str = "🔴";
const DETAIL_ICON: &str = "📄";
const NOT_FOUND_ICON: &str = "❌";
const TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M";

const NO_REGIONAL_TICKETS: &str = "Tidak ada tiket SQM baru.";
const NO_CCAN_TICKETS: &str = "Tidak ada tiket SQM(CCAN) yang open.";

/// Which report a title belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Sqm,
    SqmCcan,
}

impl ReportKind {
    pub fn label(self) -> &'static str {
        match self {
            ReportKind::Sqm => "Laporan Tiket SQM",
            ReportKind::SqmCcan => "Laporan Tiket SQM(CCAN)",
        }
    }
}

/// Escapes `&`, `<` and `>` for HTML parse mode.
pub fn escape_html(raw: &str) -> Cow<'_, str> {
    if !raw.contains(['&', '<', '>']) {
        return Cow::Borrowed(raw);
    }
    let mut out = String::with_capacity(raw.len() + 8);
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    Cow::Owned(out)
}

/// `"<icon> <kind> - <scope> — dd/mm/yyyy HH:MM\n"`.
pub fn report_title(kind: ReportKind, scope: &str, at: &DateTime<Tz>) -> String {
    format!(
        "{TITLE_ICON} {} - {} — {}\n",
        kind.label(),
        escape_html(scope),
        at.format(TIMESTAMP_FORMAT)
    )
}

fn assemble(title: String, lines: Vec<String>, placeholder: &str) -> String {
    if lines.is_empty() {
        format!("{title}\n{placeholder}")
    } else {
        format!("{title}\n{}", lines.join("\n"))
    }
}

/// Full regional SQM report text.
pub fn format_regional_report(region: &str, tickets: &[RegionalTicket<'_>], at: &DateTime<Tz>) -> String {
    let lines = tickets.iter().map(|t| regional_line(t.row)).collect();
    assemble(report_title(ReportKind::Sqm, region, at), lines, NO_REGIONAL_TICKETS)
}

/// Full global CCAN report text.
pub fn format_ccan_report(tickets: &[CcanTicket<'_>], at: &DateTime<Tz>) -> String {
    let lines = tickets.iter().map(ccan_line).collect();
    assemble(report_title(ReportKind::SqmCcan, "Global", at), lines, NO_CCAN_TICKETS)
}

/// PLATINUM/DIAMOND/REGULER shortened, anything else unchanged.
pub fn abbreviate_customer_type(raw: &str) -> &str {
    match normalize_token(raw).as_str() {
        "PLATINUM" => "PLAT",
        "DIAMOND" => "DMND",
        "REGULER" => "REG",
        _ => raw,
    }
}

fn is_sugar(row: &TicketRow) -> bool {
    row.normalized(columns::SUGAR_STATUS) == "SUGAR"
}

fn code(raw: &str) -> String {
    format!("<code>{}</code>", escape_html(raw))
}

/// `incident | age j | cust type | sto | status sugar | hasil ukur`, with the
/// alert marker and bold status for SUGAR tickets.
pub fn regional_line(row: &TicketRow) -> String {
    let sugar = is_sugar(row);
    let raw_status = row.value(columns::SUGAR_STATUS);
    let status = if sugar {
        format!("<b>{}</b>", escape_html(raw_status))
    } else if normalize_token(raw_status) == "NON SUGAR" {
        "NON SGR".to_string()
    } else {
        escape_html(raw_status).into_owned()
    };

    let line = [
        code(row.value(columns::INCIDENT)),
        format!("{}j", escape_html(row.value(columns::AGE))),
        escape_html(abbreviate_customer_type(row.value(columns::CUSTOMER_TYPE))).into_owned(),
        escape_html(row.value(columns::STO)).into_owned(),
        status,
        escape_html(row.value(columns::MEASUREMENT)).into_owned(),
    ]
    .join(" | ");

    if sugar {
        format!("{ALERT_MARKER} {line}")
    } else {
        line
    }
}

/// `incident | age j | segment | sto | hasil ukur`.
pub fn ccan_line(ticket: &CcanTicket<'_>) -> String {
    let row = ticket.row;
    let segment = if ticket.segment.is_empty() {
        SEGMENT_UNKNOWN
    } else {
        ticket.segment.as_str()
    };

    [
        code(row.value(columns::INCIDENT)),
        format!("{}j", escape_html(row.value(columns::AGE))),
        escape_html(segment).into_owned(),
        escape_html(row.value(columns::STO)).into_owned(),
        escape_html(row.value(columns::MEASUREMENT)).into_owned(),
    ]
    .join(" | ")
}

/* ------------------------------------------------------------------------- */
/* Incident lookups                                                          */
/* ------------------------------------------------------------------------- */

/// (label, column) pairs for the detail block of an SQM ticket.
const SQM_DETAIL_FIELDS: &[(&str, &str)] = &[
    ("Contact Name", columns::CONTACT_NAME),
    ("No HP", columns::PHONE),
    ("User", columns::USER),
    ("Customer Type", columns::CUSTOMER_TYPE),
    ("DATEK", columns::DATEK),
    ("STO", columns::STO),
    ("Status Sugar", columns::SUGAR_STATUS),
    ("Hasil Ukur", columns::MEASUREMENT),
    ("Proses TTR 4 Jam", columns::TTR_4H),
    ("SN", columns::SERIAL_NUMBER),
    ("Summary", columns::SUMMARY),
];

const CCAN_DETAIL_FIELDS: &[(&str, &str)] = &[
    ("Contact Name", columns::CONTACT_NAME),
    ("No HP", columns::PHONE),
    ("Customer Segment", columns::CUSTOMER_SEGMENT),
    ("Customer Type", columns::CUSTOMER_TYPE),
    ("DATEK", columns::DATEK),
    ("STO", columns::STO),
    ("Hasil Ukur", columns::MEASUREMENT),
    ("SN", columns::SERIAL_NUMBER),
    ("Summary", columns::SUMMARY),
];

/// (display name, column) pairs for the one-line layout.
const SQM_SUMMARY_COLUMNS: &[(&str, &str)] = &[
    ("Umur Tiket", columns::AGE),
    ("Customer Type", columns::CUSTOMER_TYPE),
    ("STO", columns::STO),
    ("Status Sugar", columns::SUGAR_STATUS),
    ("Hasil Ukur", columns::MEASUREMENT),
    ("Summary", columns::SUMMARY),
];

const CCAN_SUMMARY_COLUMNS: &[(&str, &str)] = &[
    ("Umur Tiket", columns::AGE),
    ("Customer Segment", columns::CUSTOMER_SEGMENT),
    ("STO", columns::STO),
    ("Hasil Ukur", columns::MEASUREMENT),
    ("Summary", columns::SUMMARY),
];

fn is_ccan(row: &TicketRow) -> bool {
    row.normalized(columns::CATEGORY) == "SQM(CCAN)"
}

fn incident_label(row: &TicketRow) -> &str {
    match row.value(columns::INCIDENT).trim() {
        "" => "N/A",
        id => id,
    }
}

/// Multi-line labelled block; blank fields are left out.
pub fn incident_detail(row: &TicketRow) -> String {
    let fields = if is_ccan(row) {
        CCAN_DETAIL_FIELDS
    } else {
        SQM_DETAIL_FIELDS
    };

    let mut lines = vec![format!(
        "{DETAIL_ICON} Detail Ticket: {}",
        code(incident_label(row))
    )];
    for (label, column) in fields {
        let value = row.value(column).trim();
        if !value.is_empty() {
            lines.push(format!("• {label}: {}", escape_html(value)));
        }
    }
    lines.join("\n")
}

/// One pipe-separated line; blank values show the column's display name.
pub fn incident_summary_line(row: &TicketRow) -> String {
    let fields = if is_ccan(row) {
        CCAN_SUMMARY_COLUMNS
    } else {
        SQM_SUMMARY_COLUMNS
    };

    let mut parts = vec![code(incident_label(row))];
    parts.extend(fields.iter().map(|(display, column)| {
        match row.value(column).trim() {
            "" => (*display).to_string(),
            value if *column == columns::AGE => format!("{}j", escape_html(value)),
            value => escape_html(value).into_owned(),
        }
    }));
    parts.join(" | ")
}

/// Reply line for an incident absent from the tickets sheet.
pub fn incident_not_found(incident_id: &str, sheet: &str) -> String {
    format!(
        "{NOT_FOUND_ICON} Tidak ditemukan di sheet {}: {}",
        escape_html(sheet),
        code(incident_id)
    )
}

/// Joins per-incident replies with a blank line.
pub fn join_incident_replies(replies: &[String]) -> String {
    replies.join("\n\n")
}
