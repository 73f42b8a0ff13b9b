pub mod catalog;
mod form_state;
mod incentive;
mod jurisdiction;
mod location;
mod report;
mod step;

pub use catalog::{CatalogError, StepCatalog, fields};
pub use form_state::{
    BillingFrequency, FormEvent, FormState, FormValue, normalize_selection, parse_amount,
};
pub use incentive::{
    BatteryRebate, BatteryRebateKind, FeedInTariff, IncentiveProfile, IncentiveTable,
};
pub use jurisdiction::Jurisdiction;
pub use location::{
    LocationRecord, MAX_CERTIFICATE_ZONE, MIN_CERTIFICATE_ZONE, PostcodeTable, ResolvedLocation,
};
pub use report::{Assumptions, Payback, ResultReport};
pub use step::{AddressMode, StepDefinition, StepKind, StepOption};

/// Static lookup tables loaded once at startup and shared read-only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceData {
    pub incentives: IncentiveTable,
    pub postcodes: PostcodeTable,
}
