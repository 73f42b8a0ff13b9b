use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{BatteryRebate, Jurisdiction};
use crate::calculations::common::{currency, fixed, grouped, round_dp, round_to_nearest};

/// How long the system takes to pay for itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Payback {
    /// Years to recover the net cost, rounded to one decimal place.
    Years(Decimal),
    /// Incentives cover the whole system cost.
    Immediate,
    /// Net cost is positive but the system earns nothing back.
    NotApplicable,
}

impl fmt::Display for Payback {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Self::Years(years) => write!(f, "Approx. {} years", fixed(*years, 1)),
            Self::Immediate => f.write_str("Immediate (incentives cover the system cost)"),
            Self::NotApplicable => f.write_str("N/A"),
        }
    }
}

/// Inputs echoed back so the customer can see what the estimate assumed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assumptions {
    pub postcode: String,
    pub jurisdiction: Jurisdiction,
    pub certificate_zone: u8,
    /// Dollars per kWh applied to self-consumed energy.
    pub energy_price: Decimal,
    /// Dollars per kWh paid for exported energy.
    pub feed_in_rate: Decimal,
    /// Annual consumption inferred from the bill, when one was given.
    pub estimated_consumption_kwh: Option<Decimal>,
}

/// Financial and environmental projection for one calculation run.
///
/// Currency amounts are held to the cent; [`ResultReport::display_fields`]
/// rounds them to whole dollars.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultReport {
    pub system_size_kw: Decimal,
    pub annual_production_kwh: Decimal,
    pub required_roof_area_m2: Decimal,
    pub system_type: String,
    pub system_cost: Decimal,
    pub panel_rebate: Decimal,
    pub certificate_count: Decimal,
    pub certificate_value: Decimal,
    pub total_incentives: Decimal,
    pub net_cost: Decimal,
    pub self_consumption_savings: Decimal,
    pub feed_in_income: Decimal,
    pub total_annual_benefit: Decimal,
    pub payback: Payback,
    pub co2_reduction_tonnes: Decimal,
    pub tree_equivalent: Decimal,
    pub battery_rebate: Option<BatteryRebate>,
    pub assumptions: Assumptions,
}

impl ResultReport {
    /// Customer-facing strings keyed by field name, in display order.
    pub fn display_fields(&self) -> Vec<(&'static str, String)> {
        let assumptions = &self.assumptions;
        let mut fields = vec![
            (
                "recommendedSystemSize",
                format!("{} kWp", fixed(self.system_size_kw, 1)),
            ),
            (
                "estimatedAnnualProduction",
                format!(
                    "~{} kWh/year",
                    grouped(round_to_nearest(self.annual_production_kwh, Decimal::ONE_HUNDRED))
                ),
            ),
            (
                "requiredRoofArea",
                format!("Approx. {} m²", round_dp(self.required_roof_area_m2, 0)),
            ),
            ("systemType", self.system_type.clone()),
            ("estimatedSystemCost", currency(self.system_cost)),
            ("eligibleGovernmentRebates", currency(self.panel_rebate)),
            (
                "stcValue",
                format!(
                    "{} ({} STCs)",
                    currency(self.certificate_value),
                    self.certificate_count
                ),
            ),
            ("totalIncentives", currency(self.total_incentives)),
            ("netCostAfterRebates", currency(self.net_cost)),
            (
                "estimatedAnnualSavings",
                currency(self.self_consumption_savings),
            ),
            ("feedInIncome", currency(self.feed_in_income)),
            ("totalAnnualBenefit", currency(self.total_annual_benefit)),
            ("paybackTime", self.payback.to_string()),
            (
                "co2Reduction",
                format!("Approx. {} tonnes/year", fixed(self.co2_reduction_tonnes, 1)),
            ),
            (
                "equivalentTrees",
                format!("{} trees per year", round_dp(self.tree_equivalent, 0)),
            ),
            (
                "assumedEnergyPrice",
                format!("${}/kWh", assumptions.energy_price.normalize()),
            ),
            (
                "assumedFeedInRate",
                format!("${}/kWh", assumptions.feed_in_rate.normalize()),
            ),
            (
                "location",
                format!(
                    "{} {} (STC zone {})",
                    assumptions.postcode, assumptions.jurisdiction, assumptions.certificate_zone
                ),
            ),
        ];

        if let Some(consumption) = assumptions.estimated_consumption_kwh {
            fields.push((
                "estimatedAnnualConsumption",
                format!("~{} kWh/year", grouped(consumption)),
            ));
        }
        if let Some(battery) = &self.battery_rebate {
            fields.push((
                "batteryRebate",
                format!(
                    "Up to {} ({})",
                    currency(battery.amount),
                    battery.kind.as_str()
                ),
            ));
        }

        fields
    }
}
