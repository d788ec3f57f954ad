//! Immutable report configuration.
//!
//! Built once at process start and passed by reference into every report
//! generation; nothing in the pipeline reads the environment directly.

use std::{collections::HashSet, str::FromStr};

use chrono_tz::Tz;

use crate::errors::ReportConfigError;

/// Sheet holding every ticket.
pub const DEFAULT_TICKETS_SHEET: &str = "ALLTIKET";
/// Secondary sheet used to enrich tickets (segment, summary).
pub const DEFAULT_LOOKUP_SHEET: &str = "INSERA";
/// Regional reports only list tickets younger than this many hours.
pub const DEFAULT_AGE_THRESHOLD: f64 = 10.0;
/// Zone used for report title timestamps.
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::Asia::Tokyo;

const DEFAULT_REGION_GROUPS: &[(&str, &[&str])] = &[
    ("Jayapura", &["JAYAPURA 1", "JAYAPURA 2"]),
    ("Abepura", &["ABEPURA 1"]),
    ("Waena", &["ABEPURA 2"]),
    ("Sentani", &["SENTANI"]),
    ("Biak", &["BIAK"]),
    ("Merauke", &["MERAUKE"]),
    ("Wilsus", &["WILSUS"]),
];

/// A named set of raw `sektor` labels reported together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionGroup {
    pub name: String,
    pub sektor_labels: Vec<String>,
}

impl RegionGroup {
    pub fn new<I, S>(name: impl Into<String>, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            sektor_labels: labels.into_iter().map(Into::into).collect(),
        }
    }
}

/// How looked-up incidents are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IncidentLayout {
    /// Multi-line labelled block per incident.
    #[default]
    Detail,
    /// One pipe-separated line per incident.
    Summary,
}

impl FromStr for IncidentLayout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "detail" => Ok(IncidentLayout::Detail),
            "summary" => Ok(IncidentLayout::Summary),
            other => Err(format!("unknown incident layout `{other}`")),
        }
    }
}

/// Everything report generation needs to know besides the data itself.
#[derive(Debug, Clone)]
pub struct ReportConfig {
    region_groups: Vec<RegionGroup>,
    pub age_threshold: f64,
    pub timezone: Tz,
    pub incident_layout: IncidentLayout,
    pub tickets_sheet: String,
    pub lookup_sheet: String,
}

impl ReportConfig {
    /// Validates region uniqueness and threshold, keeping group order.
    pub fn new(region_groups: Vec<RegionGroup>, age_threshold: f64) -> Result<Self, ReportConfigError> {
        if !age_threshold.is_finite() {
            return Err(ReportConfigError::InvalidThreshold);
        }

        let mut seen = HashSet::new();
        for group in &region_groups {
            if !seen.insert(group.name.to_lowercase()) {
                return Err(ReportConfigError::DuplicateRegion(group.name.clone()));
            }
            if group.sektor_labels.is_empty() {
                return Err(ReportConfigError::EmptyRegion(group.name.clone()));
            }
        }

        Ok(Self {
            region_groups,
            age_threshold,
            timezone: DEFAULT_TIMEZONE,
            incident_layout: IncidentLayout::default(),
            tickets_sheet: DEFAULT_TICKETS_SHEET.to_string(),
            lookup_sheet: DEFAULT_LOOKUP_SHEET.to_string(),
        })
    }

    pub fn with_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }

    pub fn with_incident_layout(mut self, layout: IncidentLayout) -> Self {
        self.incident_layout = layout;
        self
    }

    /// Region groups in reporting-cycle order.
    pub fn region_groups(&self) -> &[RegionGroup] {
        &self.region_groups
    }

    /// Region names in reporting-cycle order.
    pub fn region_names(&self) -> Vec<String> {
        self.region_groups.iter().map(|g| g.name.clone()).collect()
    }

    /// Case-insensitive lookup by region name.
    pub fn region(&self, name: &str) -> Option<&RegionGroup> {
        self.region_groups
            .iter()
            .find(|g| g.name.eq_ignore_ascii_case(name.trim()))
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        let groups = DEFAULT_REGION_GROUPS
            .iter()
            .map(|(name, labels)| RegionGroup::new(*name, labels.iter().copied()))
            .collect();

        // The built-in table is unique and non-empty.
        Self {
            region_groups: groups,
            age_threshold: DEFAULT_AGE_THRESHOLD,
            timezone: DEFAULT_TIMEZONE,
            incident_layout: IncidentLayout::default(),
            tickets_sheet: DEFAULT_TICKETS_SHEET.to_string(),
            lookup_sheet: DEFAULT_LOOKUP_SHEET.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_cycle_order_is_stable() {
        let cfg = ReportConfig::default();
        assert_eq!(
            cfg.region_names(),
            vec!["Jayapura", "Abepura", "Waena", "Sentani", "Biak", "Merauke", "Wilsus"]
        );
        assert_eq!(
            cfg.region("waena").map(|g| g.sektor_labels.clone()),
            Some(vec!["ABEPURA 2".to_string()])
        );
        assert!(cfg.region("Atlantis").is_none());
    }

    #[test]
    fn rejects_duplicate_region_names() {
        let err = ReportConfig::new(
            vec![
                RegionGroup::new("Biak", ["BIAK"]),
                RegionGroup::new("BIAK", ["BIAK 2"]),
            ],
            10.0,
        )
        .unwrap_err();
        assert!(matches!(err, ReportConfigError::DuplicateRegion(name) if name == "BIAK"));
    }

    #[test]
    fn rejects_empty_groups_and_bad_threshold() {
        let err = ReportConfig::new(vec![RegionGroup::new("X", Vec::<String>::new())], 10.0)
            .unwrap_err();
        assert!(matches!(err, ReportConfigError::EmptyRegion(_)));

        let err = ReportConfig::new(Vec::new(), f64::NAN).unwrap_err();
        assert!(matches!(err, ReportConfigError::InvalidThreshold));
    }

    #[test]
    fn incident_layout_parses() {
        assert_eq!("Summary".parse::<IncidentLayout>(), Ok(IncidentLayout::Summary));
        assert_eq!(" detail ".parse::<IncidentLayout>(), Ok(IncidentLayout::Detail));
        assert!("table".parse::<IncidentLayout>().is_err());
    }
}
