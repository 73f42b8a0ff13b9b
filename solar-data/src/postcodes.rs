use std::io::Read;

use serde::Deserialize;
use solar_core::{
    Jurisdiction, LocationRecord, MAX_CERTIFICATE_ZONE, MIN_CERTIFICATE_ZONE, PostcodeTable,
};
use tracing::debug;

use crate::TableLoadError;

const TABLE: &str = "postcodes";

/// A contiguous run of postcodes sharing a jurisdiction and certificate zone.
///
/// Postcodes are four digits and written zero-padded (`0800`). An empty
/// `zone` cell records a postcode whose zone is not known; lookups against
/// it fail rather than guessing.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PostcodeRangeRecord {
    pub postcode_from: String,
    pub postcode_to: String,
    pub jurisdiction: String,
    pub zone: Option<u8>,
}

/// Loader for the postcode → (jurisdiction, zone) table.
pub struct PostcodeLoader;

impl PostcodeLoader {
    pub fn parse<R: Read>(reader: R) -> Result<Vec<PostcodeRangeRecord>, TableLoadError> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut records = Vec::new();

        for result in csv_reader.deserialize() {
            let record: PostcodeRangeRecord = result.map_err(|e| TableLoadError::csv(TABLE, e))?;
            records.push(record);
        }

        Ok(records)
    }

    /// Expand ranges into a [`PostcodeTable`] keyed by individual postcode.
    ///
    /// Overlapping ranges are rejected.
    pub fn build(records: Vec<PostcodeRangeRecord>) -> Result<PostcodeTable, TableLoadError> {
        let mut table = PostcodeTable::new();

        for (index, record) in records.into_iter().enumerate() {
            let line = index + 2;
            let (from, to) = parse_range(&record.postcode_from, &record.postcode_to).ok_or_else(
                || TableLoadError::InvalidRange {
                    line,
                    from: record.postcode_from.clone(),
                    to: record.postcode_to.clone(),
                },
            )?;

            let jurisdiction = Jurisdiction::parse(&record.jurisdiction).ok_or_else(|| {
                TableLoadError::UnknownJurisdiction {
                    table: TABLE,
                    line,
                    code: record.jurisdiction.trim().to_string(),
                }
            })?;

            if let Some(zone) = record.zone {
                if !(MIN_CERTIFICATE_ZONE..=MAX_CERTIFICATE_ZONE).contains(&zone) {
                    return Err(TableLoadError::InvalidZone { line, zone });
                }
            }

            let location = LocationRecord {
                jurisdiction,
                certificate_zone: record.zone,
            };
            for code in from..=to {
                let postcode = format!("{code:04}");
                if table.get(&postcode).is_some() {
                    return Err(TableLoadError::DuplicatePostcode { line, postcode });
                }
                table.insert(postcode, location);
            }
        }

        debug!(postcodes = table.len(), "Loaded postcode table");
        Ok(table)
    }

    pub fn load<R: Read>(reader: R) -> Result<PostcodeTable, TableLoadError> {
        Self::build(Self::parse(reader)?)
    }
}

fn parse_range(
    from: &str,
    to: &str,
) -> Option<(u16, u16)> {
    let from = parse_postcode(from)?;
    let to = parse_postcode(to)?;
    (from <= to).then_some((from, to))
}

fn parse_postcode(code: &str) -> Option<u16> {
    let code = code.trim();
    if code.len() != 4 || !code.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    code.parse().ok()
}
