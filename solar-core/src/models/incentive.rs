use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Jurisdiction;

/// How a jurisdiction's battery incentive is paid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatteryRebateKind {
    Cash,
    Loan,
}

impl BatteryRebateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Loan => "loan",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cash" => Some(Self::Cash),
            "loan" => Some(Self::Loan),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatteryRebate {
    pub kind: BatteryRebateKind,
    pub amount: Decimal,
}

/// Feed-in tariff bounds in dollars per kWh.
///
/// A jurisdiction either regulates a fixed rate or publishes a minimum
/// (and sometimes a maximum) that retailers must offer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedInTariff {
    pub fixed: Option<Decimal>,
    pub min: Option<Decimal>,
    pub max: Option<Decimal>,
}

impl FeedInTariff {
    /// Selects the rate used for export income: fixed, then minimum, then
    /// the supplied fallback.
    pub fn effective_rate(
        &self,
        fallback: Decimal,
    ) -> Decimal {
        self.fixed.or(self.min).unwrap_or(fallback)
    }
}

/// Rebate and tariff parameters for one jurisdiction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncentiveProfile {
    pub residential_rebate: Option<Decimal>,
    pub business_rebate: Option<Decimal>,
    pub battery_rebate: Option<BatteryRebate>,
    pub feed_in: FeedInTariff,
    pub default_energy_price: Option<Decimal>,
    pub notes: String,
}

impl IncentiveProfile {
    /// Panel rebate for the declared property type. Business properties use
    /// the business figure when one exists and fall back to the residential
    /// figure otherwise.
    pub fn panel_rebate(
        &self,
        is_business: bool,
    ) -> Decimal {
        let rebate = if is_business {
            self.business_rebate.or(self.residential_rebate)
        } else {
            self.residential_rebate
        };
        rebate.unwrap_or(Decimal::ZERO)
    }
}

/// Jurisdiction → incentive lookup with a mandatory `DEFAULT` profile.
///
/// Every lookup returns a profile; jurisdictions without an explicit row
/// resolve to the default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncentiveTable {
    profiles: HashMap<Jurisdiction, IncentiveProfile>,
    default: IncentiveProfile,
}

impl IncentiveTable {
    pub fn new(default: IncentiveProfile) -> Self {
        Self {
            profiles: HashMap::new(),
            default,
        }
    }

    /// Adds or replaces a profile, returning the previous one.
    pub fn insert(
        &mut self,
        jurisdiction: Jurisdiction,
        profile: IncentiveProfile,
    ) -> Option<IncentiveProfile> {
        self.profiles.insert(jurisdiction, profile)
    }

    pub fn profile_for(
        &self,
        jurisdiction: Jurisdiction,
    ) -> &IncentiveProfile {
        self.profiles.get(&jurisdiction).unwrap_or(&self.default)
    }

    pub fn has_explicit(
        &self,
        jurisdiction: Jurisdiction,
    ) -> bool {
        self.profiles.contains_key(&jurisdiction)
    }

    pub fn default_profile(&self) -> &IncentiveProfile {
        &self.default
    }

    /// Number of explicit (non-default) profiles.
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}
