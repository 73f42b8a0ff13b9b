//! Reference tables for quote calculations.
//!
//! Two CSV tables ship with the crate and are compiled in:
//!
//! | File                  | Builds            | Keyed by           |
//! |-----------------------|-------------------|--------------------|
//! | `data/incentives.csv` | `IncentiveTable`  | jurisdiction code  |
//! | `data/postcodes.csv`  | `PostcodeTable`   | four-digit postcode|
//!
//! Either table can be replaced at startup with a file on disk via
//! [`load_reference_data`].

mod decimal;
mod error;
pub mod incentives;
pub mod postcodes;

use std::fs::File;
use std::path::Path;

use solar_core::ReferenceData;
use tracing::info;

pub use error::TableLoadError;
pub use incentives::{IncentiveLoader, IncentiveRecord};
pub use postcodes::{PostcodeLoader, PostcodeRangeRecord};

pub const BUNDLED_INCENTIVES: &str = include_str!("../data/incentives.csv");
pub const BUNDLED_POSTCODES: &str = include_str!("../data/postcodes.csv");

/// Reference data built from the tables compiled into this crate.
pub fn bundled() -> Result<ReferenceData, TableLoadError> {
    Ok(ReferenceData {
        incentives: IncentiveLoader::load(BUNDLED_INCENTIVES.as_bytes())?,
        postcodes: PostcodeLoader::load(BUNDLED_POSTCODES.as_bytes())?,
    })
}

/// Load reference data, preferring the given files over the bundled tables.
pub fn load_reference_data(
    incentives: Option<&Path>,
    postcodes: Option<&Path>,
) -> Result<ReferenceData, TableLoadError> {
    let incentives = match incentives {
        Some(path) => {
            info!(path = %path.display(), "Loading incentive table from file");
            IncentiveLoader::load(open(path)?)?
        }
        None => IncentiveLoader::load(BUNDLED_INCENTIVES.as_bytes())?,
    };
    let postcodes = match postcodes {
        Some(path) => {
            info!(path = %path.display(), "Loading postcode table from file");
            PostcodeLoader::load(open(path)?)?
        }
        None => PostcodeLoader::load(BUNDLED_POSTCODES.as_bytes())?,
    };

    Ok(ReferenceData {
        incentives,
        postcodes,
    })
}

fn open(path: &Path) -> Result<File, TableLoadError> {
    File::open(path).map_err(|e| TableLoadError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}
