//! The quote calculation.
//!
//! A run has three phases:
//!
//! | Phase      | Method                          | Notes                          |
//! |------------|---------------------------------|--------------------------------|
//! | Prepare    | [`CalculationEngine::prepare`]  | preconditions, sizing, prices  |
//! | Production | [`ProductionEstimator`]         | the only asynchronous call     |
//! | Finish     | [`CalculationEngine::finish`]   | cost, incentives, payback, CO₂ |
//!
//! [`CalculationEngine::calculate`] chains all three. Prepare and finish are
//! pure, so identical answers and an identical production figure always
//! produce an identical [`ResultReport`].
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use rust_decimal_macros::dec;
//! use solar_core::calculations::{CalculationConfig, CalculationEngine};
//! use solar_core::services::ProductionEstimate;
//! use solar_core::{FormEvent, FormState, IncentiveTable, Jurisdiction, ResolvedLocation, fields};
//!
//! let engine =
//!     CalculationEngine::new(CalculationConfig::default(), Arc::new(IncentiveTable::default()))
//!         .unwrap();
//!
//! let mut state = FormState::new()
//!     .apply(FormEvent::text(fields::BILL_AMOUNT, "300"))
//!     .apply(FormEvent::text(fields::BILL_FREQUENCY, "monthly"));
//! state.set_location(ResolvedLocation {
//!     postcode: "2000".to_string(),
//!     jurisdiction: Jurisdiction::Nsw,
//!     certificate_zone: Some(3),
//!     latitude: -33.87,
//!     longitude: 151.21,
//!     display_name: None,
//! });
//!
//! let input = engine.prepare(&state).unwrap();
//! assert_eq!(input.system_size_kw, dec!(10.0));
//!
//! let report = engine
//!     .finish(&input, ProductionEstimate { annual_ac_kwh: dec!(14000) })
//!     .unwrap();
//! assert_eq!(report.certificate_count, dec!(270));
//! ```

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use super::common::{round_dp, round_half_up};
use super::config::{CalculationConfig, ConfigError};
use crate::models::{
    Assumptions, BillingFrequency, FormState, IncentiveTable, Jurisdiction, Payback, ResultReport,
    fields,
};
use crate::services::{ProductionError, ProductionEstimate, ProductionEstimator, ProductionRequest};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CalculationError {
    /// Postcode, jurisdiction or coordinates have not been resolved.
    #[error("location data is incomplete; please re-enter your postcode")]
    LocationData,

    /// The resolved certificate zone is missing or outside 1–4.
    #[error("certificate zone {0:?} is not a rated zone; please re-enter your postcode")]
    InvalidZone(Option<u8>),

    /// An intermediate figure left the representable decimal range.
    #[error("the figures entered are too large to quote; please check your bill amount")]
    OutOfRange,

    #[error(transparent)]
    Production(#[from] ProductionError),

    #[error("invalid calculation configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
}

/// Everything [`CalculationEngine::finish`] needs besides the production
/// figure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationInput {
    pub postcode: String,
    pub jurisdiction: Jurisdiction,
    pub certificate_zone: u8,
    pub latitude: f64,
    pub longitude: f64,
    pub is_business: bool,
    pub wants_battery: bool,
    /// Annual consumption implied by the bill, when a usable bill was given.
    pub estimated_consumption_kwh: Option<Decimal>,
    pub system_size_kw: Decimal,
    /// Price applied to self-consumed energy.
    pub energy_price: Decimal,
    pub feed_in_rate: Decimal,
}

pub struct CalculationEngine {
    config: CalculationConfig,
    incentives: Arc<IncentiveTable>,
}

impl CalculationEngine {
    /// # Errors
    ///
    /// Returns [`CalculationError::InvalidConfig`] when `config` fails
    /// validation.
    pub fn new(
        config: CalculationConfig,
        incentives: Arc<IncentiveTable>,
    ) -> Result<Self, CalculationError> {
        config.validate()?;
        Ok(Self { config, incentives })
    }

    pub fn config(&self) -> &CalculationConfig {
        &self.config
    }

    pub fn incentives(&self) -> &IncentiveTable {
        &self.incentives
    }

    /// Checks location preconditions and derives sizing and prices from the
    /// answers.
    pub fn prepare(
        &self,
        state: &FormState,
    ) -> Result<CalculationInput, CalculationError> {
        let location = state.location().ok_or(CalculationError::LocationData)?;
        if location.postcode.trim().is_empty()
            || !location.latitude.is_finite()
            || !location.longitude.is_finite()
        {
            return Err(CalculationError::LocationData);
        }
        let zone = location
            .valid_zone()
            .ok_or(CalculationError::InvalidZone(location.certificate_zone))?;

        let profile = self.incentives.profile_for(location.jurisdiction);
        let regional_price = profile
            .default_energy_price
            .filter(|p| *p > Decimal::ZERO)
            .unwrap_or(self.config.default_energy_price);

        let estimated_consumption_kwh = self.estimate_consumption(state, regional_price)?;
        let system_size_kw = match estimated_consumption_kwh {
            Some(kwh) => self.size_for_consumption(kwh),
            None => self.config.default_system_size_kw,
        };

        let energy_price = state
            .number(fields::ENERGY_PRICE)
            .filter(|p| *p > Decimal::ZERO)
            .unwrap_or(regional_price);
        let feed_in_rate = profile.feed_in.effective_rate(self.config.default_feed_in_rate);

        let input = CalculationInput {
            postcode: location.postcode.clone(),
            jurisdiction: location.jurisdiction,
            certificate_zone: zone,
            latitude: location.latitude,
            longitude: location.longitude,
            is_business: state.text(fields::PROPERTY_TYPE) == Some(fields::BUSINESS_PROPERTY),
            wants_battery: matches!(
                state.text(fields::BATTERY_INTEREST),
                Some("yes") | Some("maybe")
            ),
            estimated_consumption_kwh,
            system_size_kw,
            energy_price,
            feed_in_rate,
        };
        debug!(
            postcode = %input.postcode,
            size_kw = %input.system_size_kw,
            consumption = ?input.estimated_consumption_kwh,
            "prepared calculation input"
        );
        Ok(input)
    }

    /// Annualised bill divided by `price`. `Ok(None)` when the bill amount
    /// is missing or non-positive or the frequency is unrecognised.
    ///
    /// # Errors
    ///
    /// [`CalculationError::OutOfRange`] when the annualised figure overflows.
    pub fn estimate_consumption(
        &self,
        state: &FormState,
        price: Decimal,
    ) -> Result<Option<Decimal>, CalculationError> {
        let amount = state.number(fields::BILL_AMOUNT).filter(|a| *a > Decimal::ZERO);
        let frequency = state
            .text(fields::BILL_FREQUENCY)
            .and_then(BillingFrequency::parse);
        let (Some(amount), Some(frequency)) = (amount, frequency) else {
            return Ok(None);
        };
        if price <= Decimal::ZERO {
            return Ok(None);
        }
        let annual = in_range(amount.checked_mul(frequency.periods_per_year()))?;
        in_range(annual.checked_div(price)).map(Some)
    }

    /// Smallest bucket whose threshold covers `consumption_kwh`; the
    /// unbounded bucket catches the rest.
    pub fn size_for_consumption(
        &self,
        consumption_kwh: Decimal,
    ) -> Decimal {
        self.config
            .size_buckets
            .iter()
            .find(|bucket| {
                bucket
                    .max_consumption_kwh
                    .is_none_or(|threshold| consumption_kwh <= threshold)
            })
            .or(self.config.size_buckets.last())
            .map_or(self.config.default_system_size_kw, |bucket| bucket.size_kw)
    }

    /// `floor(size × deeming years × zone)`.
    pub fn certificate_count(
        &self,
        system_size_kw: Decimal,
        zone: u8,
    ) -> Result<Decimal, CalculationError> {
        let kw_years = in_range(system_size_kw.checked_mul(self.config.deeming_years))?;
        in_range(kw_years.checked_mul(Decimal::from(zone))).map(|count| count.floor())
    }

    pub fn production_request(
        &self,
        input: &CalculationInput,
    ) -> ProductionRequest {
        ProductionRequest::new(input.latitude, input.longitude, input.system_size_kw)
    }

    /// Builds the report from prepared input and the production figure.
    ///
    /// # Errors
    ///
    /// [`CalculationError::OutOfRange`] when a figure overflows.
    pub fn finish(
        &self,
        input: &CalculationInput,
        production: ProductionEstimate,
    ) -> Result<ResultReport, CalculationError> {
        let config = &self.config;
        let profile = self.incentives.profile_for(input.jurisdiction);
        let annual_kwh = production.annual_ac_kwh.max(Decimal::ZERO);

        let system_cost =
            round_half_up(in_range(input.system_size_kw.checked_mul(config.cost_per_kw))?);
        let panel_rebate = round_half_up(profile.panel_rebate(input.is_business));
        let certificate_count =
            self.certificate_count(input.system_size_kw, input.certificate_zone)?;
        let certificate_value =
            round_half_up(in_range(certificate_count.checked_mul(config.certificate_price))?);
        let total_incentives = in_range(panel_rebate.checked_add(certificate_value))?;
        let net_cost = in_range(system_cost.checked_sub(total_incentives))?;

        let exported_kwh = in_range(annual_kwh.checked_mul(config.export_fraction))?;
        let self_consumed_kwh = annual_kwh - exported_kwh;
        let self_consumption_savings =
            round_half_up(in_range(self_consumed_kwh.checked_mul(input.energy_price))?);
        let feed_in_income = round_half_up(in_range(exported_kwh.checked_mul(input.feed_in_rate))?);
        let total_annual_benefit =
            in_range(self_consumption_savings.checked_add(feed_in_income))?;

        let payback = if net_cost <= Decimal::ZERO {
            Payback::Immediate
        } else if total_annual_benefit > Decimal::ZERO {
            Payback::Years(round_dp(in_range(net_cost.checked_div(total_annual_benefit))?, 1))
        } else {
            Payback::NotApplicable
        };

        let co2_tonnes = in_range(annual_kwh.checked_mul(config.co2_tonnes_per_kwh))?;
        let co2_reduction_tonnes = round_dp(co2_tonnes, 3);
        let tree_equivalent = round_dp(
            in_range(co2_tonnes.checked_div(config.tree_absorption_tonnes))?,
            0,
        );
        let required_roof_area_m2 =
            round_dp(in_range(input.system_size_kw.checked_mul(config.roof_area_per_kw))?, 0);

        let system_type = if input.wants_battery {
            "Grid-tied with optional battery storage"
        } else {
            "Grid-tied"
        };

        let report = ResultReport {
            system_size_kw: input.system_size_kw,
            annual_production_kwh: round_dp(annual_kwh, 0),
            required_roof_area_m2,
            system_type: system_type.to_string(),
            system_cost,
            panel_rebate,
            certificate_count,
            certificate_value,
            total_incentives,
            net_cost,
            self_consumption_savings,
            feed_in_income,
            total_annual_benefit,
            payback,
            co2_reduction_tonnes,
            tree_equivalent,
            battery_rebate: profile.battery_rebate.clone().filter(|_| input.wants_battery),
            assumptions: Assumptions {
                postcode: input.postcode.clone(),
                jurisdiction: input.jurisdiction,
                certificate_zone: input.certificate_zone,
                energy_price: input.energy_price,
                feed_in_rate: input.feed_in_rate,
                estimated_consumption_kwh: input
                    .estimated_consumption_kwh
                    .map(|kwh| round_dp(kwh, 0)),
            },
        };

        info!(
            postcode = %report.assumptions.postcode,
            size_kw = %report.system_size_kw,
            net_cost = %report.net_cost,
            payback = %report.payback,
            "calculated quote"
        );
        Ok(report)
    }

    /// Runs the full calculation, calling `estimator` once.
    pub async fn calculate(
        &self,
        state: &FormState,
        estimator: &dyn ProductionEstimator,
    ) -> Result<ResultReport, CalculationError> {
        let input = self.prepare(state)?;
        let estimate = estimator.estimate(&self.production_request(&input)).await?;
        self.finish(&input, estimate)
    }
}

fn in_range(value: Option<Decimal>) -> Result<Decimal, CalculationError> {
    value.ok_or(CalculationError::OutOfRange)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::{
        BatteryRebate, BatteryRebateKind, FeedInTariff, FormEvent, IncentiveProfile,
        ResolvedLocation,
    };
    use crate::services::memory::FixedProduction;

    fn test_incentives() -> IncentiveTable {
        let mut table = IncentiveTable::new(IncentiveProfile {
            notes: "National defaults".to_string(),
            ..IncentiveProfile::default()
        });
        table.insert(
            Jurisdiction::Nsw,
            IncentiveProfile {
                battery_rebate: Some(BatteryRebate {
                    kind: BatteryRebateKind::Cash,
                    amount: dec!(1600),
                }),
                default_energy_price: Some(dec!(0.327)),
                ..IncentiveProfile::default()
            },
        );
        table.insert(
            Jurisdiction::Vic,
            IncentiveProfile {
                residential_rebate: Some(dec!(1400)),
                feed_in: FeedInTariff {
                    fixed: Some(dec!(0.033)),
                    min: Some(dec!(0.01)),
                    max: None,
                },
                default_energy_price: Some(dec!(0.28)),
                ..IncentiveProfile::default()
            },
        );
        table
    }

    fn engine() -> CalculationEngine {
        CalculationEngine::new(CalculationConfig::default(), Arc::new(test_incentives())).unwrap()
    }

    fn located(
        state: FormState,
        postcode: &str,
        jurisdiction: Jurisdiction,
        zone: Option<u8>,
    ) -> FormState {
        let mut state = state;
        state.set_location(ResolvedLocation {
            postcode: postcode.to_string(),
            jurisdiction,
            certificate_zone: zone,
            latitude: -33.87,
            longitude: 151.21,
            display_name: None,
        });
        state
    }

    fn with_bill(
        amount: &str,
        frequency: &str,
    ) -> FormState {
        FormState::new()
            .apply(FormEvent::text(fields::PROPERTY_TYPE, "house"))
            .apply(FormEvent::text(fields::BILL_AMOUNT, amount))
            .apply(FormEvent::text(fields::BILL_FREQUENCY, frequency))
    }

    fn sydney_house() -> FormState {
        located(with_bill("300", "monthly"), "2000", Jurisdiction::Nsw, Some(3))
    }

    // =========================================================================
    // Preconditions
    // =========================================================================

    #[test]
    fn prepare_requires_location() {
        let result = engine().prepare(&with_bill("300", "monthly"));

        assert_eq!(result, Err(CalculationError::LocationData));
    }

    #[test]
    fn prepare_rejects_missing_zone() {
        let state = located(FormState::new(), "2000", Jurisdiction::Nsw, None);

        assert_eq!(
            engine().prepare(&state),
            Err(CalculationError::InvalidZone(None))
        );
    }

    #[test]
    fn prepare_rejects_zone_out_of_range() {
        for zone in [0, 5] {
            let state = located(FormState::new(), "2000", Jurisdiction::Nsw, Some(zone));

            assert_eq!(
                engine().prepare(&state),
                Err(CalculationError::InvalidZone(Some(zone)))
            );
        }
    }

    #[test]
    fn new_rejects_invalid_config() {
        let config = CalculationConfig {
            size_buckets: Vec::new(),
            ..CalculationConfig::default()
        };

        let result = CalculationEngine::new(config, Arc::new(test_incentives()));

        assert!(matches!(
            result,
            Err(CalculationError::InvalidConfig(ConfigError::NoSizeBuckets))
        ));
    }

    // =========================================================================
    // Consumption and sizing
    // =========================================================================

    #[test]
    fn consumption_annualises_bill_over_regional_price() {
        let input = engine().prepare(&sydney_house()).unwrap();

        let consumption = input.estimated_consumption_kwh.unwrap();
        assert_eq!(round_dp(consumption, 0), dec!(11009));
        assert_eq!(input.system_size_kw, dec!(10.0));
    }

    #[test]
    fn consumption_uses_global_price_without_regional_one() {
        let state = located(with_bill("450", "monthly"), "0800", Jurisdiction::Nt, Some(1));

        let input = engine().prepare(&state).unwrap();

        assert_eq!(input.estimated_consumption_kwh, Some(dec!(18000)));
        assert_eq!(input.energy_price, dec!(0.30));
        assert_eq!(input.system_size_kw, dec!(10.0));
    }

    #[test]
    fn consumption_frequencies() {
        let engine = engine();
        let cases = [
            ("monthly", dec!(3600)),
            ("bimonthly", dec!(1800)),
            ("quarterly", dec!(1200)),
        ];

        for (frequency, expected) in cases {
            let state = with_bill("90", frequency);
            assert_eq!(
                engine.estimate_consumption(&state, dec!(0.30)),
                Ok(Some(expected)),
                "{frequency}"
            );
        }
    }

    #[test]
    fn missing_or_non_positive_bill_uses_default_size() {
        let engine = engine();
        for state in [
            FormState::new(),
            with_bill("0", "monthly"),
            with_bill("-20", "monthly"),
            with_bill("abc", "monthly"),
            with_bill("300", "weekly"),
        ] {
            let input = engine
                .prepare(&located(state, "2000", Jurisdiction::Nsw, Some(3)))
                .unwrap();

            assert_eq!(input.estimated_consumption_kwh, None);
            assert_eq!(input.system_size_kw, dec!(6.6));
        }
    }

    #[test]
    fn oversized_bill_is_out_of_range() {
        let state = located(
            with_bill("10000000000000000000000000000", "monthly"),
            "2000",
            Jurisdiction::Nsw,
            Some(3),
        );

        assert_eq!(engine().prepare(&state), Err(CalculationError::OutOfRange));
    }

    #[test]
    fn size_picks_smallest_covering_bucket() {
        let engine = engine();

        assert_eq!(engine.size_for_consumption(dec!(0)), dec!(3.0));
        assert_eq!(engine.size_for_consumption(dec!(4000)), dec!(3.0));
        assert_eq!(engine.size_for_consumption(dec!(4000.01)), dec!(5.0));
        assert_eq!(engine.size_for_consumption(dec!(8500)), dec!(6.6));
        assert_eq!(engine.size_for_consumption(dec!(10000)), dec!(8.0));
        assert_eq!(engine.size_for_consumption(dec!(250000)), dec!(10.0));
    }

    #[test]
    fn certificate_count_floors() {
        let engine = engine();

        assert_eq!(engine.certificate_count(dec!(10.0), 3), Ok(dec!(270)));
        assert_eq!(engine.certificate_count(dec!(6.6), 3), Ok(dec!(178)));
        assert_eq!(engine.certificate_count(dec!(6.6), 1), Ok(dec!(59)));
        assert_eq!(engine.certificate_count(dec!(3.0), 4), Ok(dec!(108)));
    }

    // =========================================================================
    // Prices
    // =========================================================================

    #[test]
    fn user_price_overrides_regional_for_savings_only() {
        let state = located(
            with_bill("300", "monthly").apply(FormEvent::text(fields::ENERGY_PRICE, "0.40")),
            "2000",
            Jurisdiction::Nsw,
            Some(3),
        );

        let input = engine().prepare(&state).unwrap();

        assert_eq!(input.energy_price, dec!(0.40));
        assert_eq!(input.system_size_kw, dec!(10.0));
    }

    #[test]
    fn non_positive_user_price_is_ignored() {
        let state = located(
            with_bill("300", "monthly").apply(FormEvent::text(fields::ENERGY_PRICE, "0")),
            "2000",
            Jurisdiction::Nsw,
            Some(3),
        );

        assert_eq!(engine().prepare(&state).unwrap().energy_price, dec!(0.327));
    }

    #[test]
    fn feed_in_prefers_fixed_rate() {
        let state = located(with_bill("300", "monthly"), "3000", Jurisdiction::Vic, Some(4));

        assert_eq!(engine().prepare(&state).unwrap().feed_in_rate, dec!(0.033));
    }

    #[test]
    fn feed_in_falls_back_to_global() {
        assert_eq!(engine().prepare(&sydney_house()).unwrap().feed_in_rate, dec!(0.05));
    }

    // =========================================================================
    // Full report
    // =========================================================================

    #[test]
    fn sydney_house_report() {
        let engine = engine();
        let input = engine.prepare(&sydney_house()).unwrap();

        let report = engine
            .finish(&input, ProductionEstimate {
                annual_ac_kwh: dec!(14000),
            })
            .unwrap();

        assert_eq!(report.system_cost, dec!(11400.00));
        assert_eq!(report.panel_rebate, dec!(0));
        assert_eq!(report.certificate_count, dec!(270));
        assert_eq!(report.certificate_value, dec!(10395.00));
        assert_eq!(report.total_incentives, dec!(10395.00));
        assert_eq!(report.net_cost, dec!(1005.00));
        assert_eq!(report.self_consumption_savings, dec!(1831.20));
        assert_eq!(report.feed_in_income, dec!(420.00));
        assert_eq!(report.total_annual_benefit, dec!(2251.20));
        assert_eq!(report.payback, Payback::Years(dec!(0.4)));
        assert_eq!(report.co2_reduction_tonnes, dec!(5.6));
        assert_eq!(report.tree_equivalent, dec!(255));
        assert_eq!(report.required_roof_area_m2, dec!(66));
        assert_eq!(report.system_type, "Grid-tied");
        assert_eq!(report.battery_rebate, None);
    }

    #[test]
    fn residential_rebate_adds_to_incentives() {
        let engine = engine();
        let state = located(with_bill("300", "monthly"), "3000", Jurisdiction::Vic, Some(4));
        let input = engine.prepare(&state).unwrap();

        let report = engine
            .finish(&input, ProductionEstimate {
                annual_ac_kwh: dec!(12000),
            })
            .unwrap();

        // 3600 / 0.28 = 12857 kWh → 10.0 kW; floor(10 × 9 × 4) = 360 STCs.
        assert_eq!(report.certificate_value, dec!(13860.00));
        assert_eq!(report.panel_rebate, dec!(1400.00));
        assert_eq!(report.total_incentives, dec!(15260.00));
        assert_eq!(report.net_cost, dec!(-3860.00));
        assert_eq!(report.payback, Payback::Immediate);
    }

    #[test]
    fn zero_production_with_positive_net_cost_is_not_applicable() {
        let engine = engine();
        let state = located(FormState::new(), "0800", Jurisdiction::Nt, Some(1));
        let input = engine.prepare(&state).unwrap();

        let report = engine
            .finish(&input, ProductionEstimate {
                annual_ac_kwh: Decimal::ZERO,
            })
            .unwrap();

        assert!(report.net_cost > Decimal::ZERO);
        assert_eq!(report.payback, Payback::NotApplicable);
        assert_eq!(report.tree_equivalent, dec!(0));
    }

    #[test]
    fn battery_interest_changes_label_and_adds_rebate() {
        let engine = engine();
        let state = sydney_house().apply(FormEvent::text(fields::BATTERY_INTEREST, "maybe"));
        let input = engine.prepare(&state).unwrap();

        let report = engine
            .finish(&input, ProductionEstimate {
                annual_ac_kwh: dec!(14000),
            })
            .unwrap();

        assert_eq!(report.system_type, "Grid-tied with optional battery storage");
        assert_eq!(
            report.battery_rebate,
            Some(BatteryRebate {
                kind: BatteryRebateKind::Cash,
                amount: dec!(1600)
            })
        );
    }

    #[test]
    fn business_property_without_business_rebate_uses_residential() {
        let engine = engine();
        let state = located(
            with_bill("300", "monthly").apply(FormEvent::text(fields::PROPERTY_TYPE, "business")),
            "3000",
            Jurisdiction::Vic,
            Some(4),
        );

        let input = engine.prepare(&state).unwrap();
        let report = engine
            .finish(&input, ProductionEstimate {
                annual_ac_kwh: dec!(12000),
            })
            .unwrap();

        assert!(input.is_business);
        assert_eq!(report.panel_rebate, dec!(1400.00));
    }

    #[test]
    fn overflowing_cost_factor_is_out_of_range() {
        let config = CalculationConfig {
            cost_per_kw: Decimal::MAX,
            ..CalculationConfig::default()
        };
        let engine = CalculationEngine::new(config, Arc::new(test_incentives())).unwrap();
        let input = engine.prepare(&sydney_house()).unwrap();

        let result = engine.finish(&input, ProductionEstimate {
            annual_ac_kwh: dec!(14000),
        });

        assert_eq!(result, Err(CalculationError::OutOfRange));
    }

    #[test]
    fn huge_production_figure_still_reports() {
        let engine = engine();
        let input = engine.prepare(&sydney_house()).unwrap();

        let report = engine
            .finish(&input, ProductionEstimate {
                annual_ac_kwh: Decimal::MAX,
            })
            .unwrap();

        assert_eq!(report.payback, Payback::Years(dec!(0.0)));
    }

    #[tokio::test]
    async fn calculate_is_deterministic() {
        let engine = engine();
        let production = FixedProduction::annual(dec!(14321.7));

        let first = engine.calculate(&sydney_house(), &production).await.unwrap();
        let second = engine.calculate(&sydney_house(), &production).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.display_fields(), second.display_fields());
        assert_eq!(production.calls(), 2);
    }

    #[tokio::test]
    async fn calculate_sends_chosen_size_and_coordinates() {
        let engine = engine();
        let production = FixedProduction::annual(dec!(14000));

        engine.calculate(&sydney_house(), &production).await.unwrap();

        let request = production.last_request().unwrap();
        assert_eq!(request.system_size_kw, dec!(10.0));
        assert_eq!(request.latitude, -33.87);
        assert_eq!(request.tilt, 20);
    }

    #[tokio::test]
    async fn calculate_propagates_production_failure() {
        let production = FixedProduction::failing(ProductionError::Status {
            status: 503,
            message: "unavailable".to_string(),
        });

        let result = engine().calculate(&sydney_house(), &production).await;

        assert_eq!(
            result,
            Err(CalculationError::Production(ProductionError::Status {
                status: 503,
                message: "unavailable".to_string(),
            }))
        );
    }

    #[tokio::test]
    async fn calculate_skips_production_when_location_missing() {
        let production = FixedProduction::annual(dec!(14000));

        let result = engine().calculate(&with_bill("300", "monthly"), &production).await;

        assert_eq!(result, Err(CalculationError::LocationData));
        assert_eq!(production.calls(), 0);
    }
}
