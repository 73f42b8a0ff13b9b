use std::collections::HashSet;
use std::io::Read;

use rust_decimal::Decimal;
use serde::Deserialize;
use solar_core::{
    BatteryRebate, BatteryRebateKind, FeedInTariff, IncentiveProfile, IncentiveTable, Jurisdiction,
};
use tracing::debug;

use crate::TableLoadError;
use crate::decimal::{deserialize_optional_decimal, deserialize_optional_string};

/// Code used for the fallback row applied to jurisdictions without their own.
pub const DEFAULT_CODE: &str = "DEFAULT";

const TABLE: &str = "incentives";

/// A single row from the incentives CSV file.
///
/// - `jurisdiction`: a state code (`NSW`, `VIC`, ...) or `DEFAULT`
/// - `residential_rebate` / `business_rebate`: flat panel rebates in dollars
/// - `battery_rebate_kind`: `cash` or `loan`, paired with `battery_rebate_amount`
/// - `feed_in_fixed`, `feed_in_min`, `feed_in_max`: $/kWh export tariffs
/// - `default_energy_price`: $/kWh used when the customer gives no price
///
/// Every column except `jurisdiction` may be empty.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct IncentiveRecord {
    pub jurisdiction: String,
    #[serde(deserialize_with = "deserialize_optional_decimal")]
    pub residential_rebate: Option<Decimal>,
    #[serde(deserialize_with = "deserialize_optional_decimal")]
    pub business_rebate: Option<Decimal>,
    #[serde(deserialize_with = "deserialize_optional_string")]
    pub battery_rebate_kind: Option<String>,
    #[serde(deserialize_with = "deserialize_optional_decimal")]
    pub battery_rebate_amount: Option<Decimal>,
    #[serde(deserialize_with = "deserialize_optional_decimal")]
    pub feed_in_fixed: Option<Decimal>,
    #[serde(deserialize_with = "deserialize_optional_decimal")]
    pub feed_in_min: Option<Decimal>,
    #[serde(deserialize_with = "deserialize_optional_decimal")]
    pub feed_in_max: Option<Decimal>,
    #[serde(deserialize_with = "deserialize_optional_decimal")]
    pub default_energy_price: Option<Decimal>,
    #[serde(default)]
    pub notes: String,
}

impl IncentiveRecord {
    fn into_profile(
        self,
        line: usize,
    ) -> Result<IncentiveProfile, TableLoadError> {
        let amounts = [
            ("residential_rebate", self.residential_rebate),
            ("business_rebate", self.business_rebate),
            ("battery_rebate_amount", self.battery_rebate_amount),
            ("feed_in_fixed", self.feed_in_fixed),
            ("feed_in_min", self.feed_in_min),
            ("feed_in_max", self.feed_in_max),
            ("default_energy_price", self.default_energy_price),
        ];
        if let Some((field, _)) = amounts
            .iter()
            .find(|(_, v)| v.is_some_and(|v| v.is_sign_negative()))
        {
            return Err(TableLoadError::NegativeAmount { line, field });
        }

        if let (Some(min), Some(max)) = (self.feed_in_min, self.feed_in_max) {
            if min > max {
                return Err(TableLoadError::InvertedFeedIn { line });
            }
        }

        let battery_rebate = match (self.battery_rebate_kind, self.battery_rebate_amount) {
            (None, None) => None,
            (Some(kind), Some(amount)) => {
                let kind = BatteryRebateKind::parse(&kind)
                    .ok_or(TableLoadError::UnknownBatteryKind { line, kind })?;
                Some(BatteryRebate { kind, amount })
            }
            _ => return Err(TableLoadError::IncompleteBatteryRebate { line }),
        };

        Ok(IncentiveProfile {
            residential_rebate: self.residential_rebate,
            business_rebate: self.business_rebate,
            battery_rebate,
            feed_in: FeedInTariff {
                fixed: self.feed_in_fixed,
                min: self.feed_in_min,
                max: self.feed_in_max,
            },
            default_energy_price: self.default_energy_price,
            notes: self.notes.trim().to_string(),
        })
    }
}

/// Loader for the per-jurisdiction incentive table.
pub struct IncentiveLoader;

impl IncentiveLoader {
    /// Parse incentive records from a CSV reader.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<IncentiveRecord>, TableLoadError> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut records = Vec::new();

        for result in csv_reader.deserialize() {
            let record: IncentiveRecord = result.map_err(|e| TableLoadError::csv(TABLE, e))?;
            records.push(record);
        }

        Ok(records)
    }

    /// Build an [`IncentiveTable`] from parsed records.
    ///
    /// Exactly one `DEFAULT` row is required. Each jurisdiction may appear
    /// at most once.
    pub fn build(records: Vec<IncentiveRecord>) -> Result<IncentiveTable, TableLoadError> {
        let mut default = None;
        let mut seen = HashSet::new();
        let mut profiles = Vec::new();

        for (index, record) in records.into_iter().enumerate() {
            // header is line 1
            let line = index + 2;
            let code = record.jurisdiction.trim().to_string();

            if !seen.insert(code.to_ascii_uppercase()) {
                return Err(TableLoadError::DuplicateJurisdiction(code));
            }

            if code.eq_ignore_ascii_case(DEFAULT_CODE) {
                default = Some(record.into_profile(line)?);
                continue;
            }

            let jurisdiction =
                Jurisdiction::parse(&code).ok_or_else(|| TableLoadError::UnknownJurisdiction {
                    table: TABLE,
                    line,
                    code: code.clone(),
                })?;
            profiles.push((jurisdiction, record.into_profile(line)?));
        }

        let mut table = IncentiveTable::new(default.ok_or(TableLoadError::MissingDefault)?);
        for (jurisdiction, profile) in profiles {
            table.insert(jurisdiction, profile);
        }
        debug!(jurisdictions = table.len(), "Loaded incentive table");
        Ok(table)
    }

    /// Parse and build in one step.
    pub fn load<R: Read>(reader: R) -> Result<IncentiveTable, TableLoadError> {
        Self::build(Self::parse(reader)?)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    const HEADER: &str = "jurisdiction,residential_rebate,business_rebate,battery_rebate_kind,battery_rebate_amount,feed_in_fixed,feed_in_min,feed_in_max,default_energy_price,notes\n";

    fn csv(rows: &str) -> String {
        format!("{HEADER}{rows}")
    }

    // =========================================================================
    // Parsing
    // =========================================================================

    #[test]
    fn parse_reads_empty_cells_as_none() {
        let data = csv("VIC,1400,,,,0.033,,,0.28,Panel rebate\n");

        let records = IncentiveLoader::parse(data.as_bytes()).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].jurisdiction, "VIC");
        assert_eq!(records[0].residential_rebate, Some(dec!(1400)));
        assert_eq!(records[0].business_rebate, None);
        assert_eq!(records[0].battery_rebate_kind, None);
        assert_eq!(records[0].feed_in_fixed, Some(dec!(0.033)));
        assert_eq!(records[0].default_energy_price, Some(dec!(0.28)));
    }

    #[test]
    fn parse_rejects_non_numeric_amount() {
        let data = csv("VIC,lots,,,,,,,,\n");

        let err = IncentiveLoader::parse(data.as_bytes()).unwrap_err();

        assert!(matches!(err, TableLoadError::CsvParse { table: "incentives", .. }));
    }

    // =========================================================================
    // Building
    // =========================================================================

    #[test]
    fn build_separates_default_from_jurisdictions() {
        let data = csv(
            "DEFAULT,,,,,,,,0.30,\n\
             NSW,,,cash,1600,,,,0.327,\n\
             ACT,,,loan,15000,,0.04,0.12,,\n",
        );

        let table = IncentiveLoader::load(data.as_bytes()).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.default_profile().default_energy_price, Some(dec!(0.30)));
        assert_eq!(
            table.profile_for(Jurisdiction::Nsw).battery_rebate,
            Some(BatteryRebate {
                kind: BatteryRebateKind::Cash,
                amount: dec!(1600),
            })
        );
        assert_eq!(
            table.profile_for(Jurisdiction::Act).feed_in,
            FeedInTariff {
                fixed: None,
                min: Some(dec!(0.04)),
                max: Some(dec!(0.12)),
            }
        );
        assert!(!table.has_explicit(Jurisdiction::Qld));
    }

    #[test]
    fn build_requires_default_row() {
        let data = csv("NSW,,,,,,,,0.327,\n");

        assert_eq!(
            IncentiveLoader::load(data.as_bytes()).unwrap_err(),
            TableLoadError::MissingDefault
        );
    }

    #[test]
    fn build_rejects_duplicates_case_insensitively() {
        let data = csv("DEFAULT,,,,,,,,0.30,\nvic,,,,,,,,,\nVIC,,,,,,,,,\n");

        assert_eq!(
            IncentiveLoader::load(data.as_bytes()).unwrap_err(),
            TableLoadError::DuplicateJurisdiction("VIC".to_string())
        );
    }

    #[test]
    fn build_rejects_unknown_jurisdiction() {
        let data = csv("DEFAULT,,,,,,,,0.30,\nNZ,,,,,,,,,\n");

        assert_eq!(
            IncentiveLoader::load(data.as_bytes()).unwrap_err(),
            TableLoadError::UnknownJurisdiction {
                table: "incentives",
                line: 3,
                code: "NZ".to_string(),
            }
        );
    }

    #[test]
    fn build_rejects_negative_amounts() {
        let data = csv("DEFAULT,,,,,,,,0.30,\nWA,,,,,-0.02,,,,\n");

        assert_eq!(
            IncentiveLoader::load(data.as_bytes()).unwrap_err(),
            TableLoadError::NegativeAmount {
                line: 3,
                field: "feed_in_fixed",
            }
        );
    }

    #[test]
    fn build_rejects_inverted_feed_in_bounds() {
        let data = csv("DEFAULT,,,,,,0.10,0.05,0.30,\n");

        assert_eq!(
            IncentiveLoader::load(data.as_bytes()).unwrap_err(),
            TableLoadError::InvertedFeedIn { line: 2 }
        );
    }

    #[test]
    fn battery_rebate_needs_kind_and_amount() {
        let unknown = csv("DEFAULT,,,grant,500,,,,,\n");
        let incomplete = csv("DEFAULT,,,cash,,,,,,\n");

        assert_eq!(
            IncentiveLoader::load(unknown.as_bytes()).unwrap_err(),
            TableLoadError::UnknownBatteryKind {
                line: 2,
                kind: "grant".to_string(),
            }
        );
        assert_eq!(
            IncentiveLoader::load(incomplete.as_bytes()).unwrap_err(),
            TableLoadError::IncompleteBatteryRebate { line: 2 }
        );
    }
}
