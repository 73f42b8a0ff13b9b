use thiserror::Error;

/// Errors raised while reading or checking a reference table.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableLoadError {
    #[error("{table}: CSV parse error: {message}")]
    CsvParse { table: &'static str, message: String },

    #[error("failed to read {path}: {message}")]
    Io { path: String, message: String },

    #[error("{table} line {line}: unknown jurisdiction '{code}'")]
    UnknownJurisdiction {
        table: &'static str,
        line: usize,
        code: String,
    },

    #[error("incentives: duplicate row for {0}")]
    DuplicateJurisdiction(String),

    #[error("incentives: missing DEFAULT row")]
    MissingDefault,

    #[error("incentives line {line}: unknown battery rebate kind '{kind}'")]
    UnknownBatteryKind { line: usize, kind: String },

    #[error("incentives line {line}: battery rebate needs both a kind and an amount")]
    IncompleteBatteryRebate { line: usize },

    #[error("incentives line {line}: {field} must not be negative")]
    NegativeAmount { line: usize, field: &'static str },

    #[error("incentives line {line}: feed-in minimum exceeds maximum")]
    InvertedFeedIn { line: usize },

    #[error("postcodes line {line}: invalid postcode range {from}-{to}")]
    InvalidRange { line: usize, from: String, to: String },

    #[error("postcodes line {line}: zone {zone} is outside 1-4")]
    InvalidZone { line: usize, zone: u8 },

    #[error("postcodes line {line}: postcode {postcode} already listed")]
    DuplicatePostcode { line: usize, postcode: String },
}

impl TableLoadError {
    pub(crate) fn csv(
        table: &'static str,
        err: csv::Error,
    ) -> Self {
        Self::CsvParse {
            table,
            message: err.to_string(),
        }
    }
}
