//! Flattening answers and the report into the lead record.
//!
//! | Source value         | Record value                 |
//! |----------------------|------------------------------|
//! | text                 | trimmed text                 |
//! | list                 | non-blank items joined with `", "` |
//! | flag                 | `"true"` / `"false"`         |
//! | number               | plain decimal                |
//! | resolved location    | postcode, jurisdiction, zone |
//! | report               | [`ResultReport::display_fields`] |
//!
//! Coordinates never leave the core.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::{FormState, FormValue, ResultReport, fields};

pub const LIST_DELIMITER: &str = ", ";

pub const JURISDICTION_KEY: &str = "jurisdiction";
pub const CERTIFICATE_ZONE_KEY: &str = "certificateZone";
pub const LOCATION_NAME_KEY: &str = "locationName";

/// Flat string-keyed record handed to the lead-capture backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionRecord {
    fields: BTreeMap<String, String>,
}

impl SubmissionRecord {
    pub fn get(
        &self,
        key: &str,
    ) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

fn render(value: &FormValue) -> String {
    match value {
        FormValue::Text(text) => text.trim().to_string(),
        FormValue::List(items) => items
            .iter()
            .map(|item| item.trim())
            .filter(|item| !item.is_empty())
            .collect::<Vec<_>>()
            .join(LIST_DELIMITER),
        FormValue::Flag(flag) => flag.to_string(),
        FormValue::Number(number) => number.normalize().to_string(),
    }
}

/// Builds the record for one submission attempt.
pub fn build_record(
    state: &FormState,
    report: &ResultReport,
) -> SubmissionRecord {
    let mut record = SubmissionRecord::default();

    for (key, value) in state.answers() {
        record.insert(key, render(value));
    }

    if let Some(location) = state.location() {
        record.insert(fields::POSTCODE, location.postcode.clone());
        record.insert(JURISDICTION_KEY, location.jurisdiction.as_str());
        if let Some(zone) = location.certificate_zone {
            record.insert(CERTIFICATE_ZONE_KEY, zone.to_string());
        }
        if let Some(name) = &location.display_name {
            record.insert(LOCATION_NAME_KEY, name.clone());
        }
    }

    for (key, value) in report.display_fields() {
        record.insert(key, value);
    }

    record
}
