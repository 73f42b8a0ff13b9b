use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::Jurisdiction;

/// Lowest and highest STC zone ratings.
pub const MIN_CERTIFICATE_ZONE: u8 = 1;
pub const MAX_CERTIFICATE_ZONE: u8 = 4;

/// Static postcode entry: authoritative jurisdiction and STC zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationRecord {
    pub jurisdiction: Jurisdiction,
    pub certificate_zone: Option<u8>,
}

/// Postcode → [`LocationRecord`] lookup loaded once at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostcodeTable {
    records: HashMap<String, LocationRecord>,
}

impl PostcodeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a record, returning the previous one.
    pub fn insert(
        &mut self,
        postcode: impl Into<String>,
        record: LocationRecord,
    ) -> Option<LocationRecord> {
        self.records.insert(postcode.into(), record)
    }

    pub fn get(
        &self,
        postcode: &str,
    ) -> Option<&LocationRecord> {
        self.records.get(postcode.trim())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Outcome of location resolution, stored in the form state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedLocation {
    pub postcode: String,
    pub jurisdiction: Jurisdiction,
    pub certificate_zone: Option<u8>,
    pub latitude: f64,
    pub longitude: f64,
    /// Geocoder display name for the matched place, when one was returned.
    pub display_name: Option<String>,
}

impl ResolvedLocation {
    /// The zone, if present and within the rated range.
    pub fn valid_zone(&self) -> Option<u8> {
        self.certificate_zone
            .filter(|z| (MIN_CERTIFICATE_ZONE..=MAX_CERTIFICATE_ZONE).contains(z))
    }
}
