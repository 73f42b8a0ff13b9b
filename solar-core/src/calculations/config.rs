//! Constants driving the quote calculation.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rejected [`CalculationConfig`] values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be positive, got {value}")]
    NotPositive { name: &'static str, value: Decimal },

    #[error("export fraction must be between 0 and 1, got {0}")]
    InvalidExportFraction(Decimal),

    #[error("at least one system size bucket is required")]
    NoSizeBuckets,

    #[error("only the last size bucket may be unbounded")]
    UnboundedBucketNotLast,

    #[error("size bucket thresholds must be strictly ascending")]
    ThresholdsNotAscending,
}

/// One entry of the sizing ladder: the system size offered when estimated
/// consumption is at or below `max_consumption_kwh`. `None` catches
/// everything above the previous threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeBucket {
    pub size_kw: Decimal,
    pub max_consumption_kwh: Option<Decimal>,
}

impl SizeBucket {
    pub const fn new(
        size_kw: Decimal,
        max_consumption_kwh: Option<Decimal>,
    ) -> Self {
        Self {
            size_kw,
            max_consumption_kwh,
        }
    }
}

/// Fixed parameters of the cost, incentive, savings and environmental
/// formulas.
///
/// | Field                      | Default | Unit          |
/// |----------------------------|---------|---------------|
/// | `cost_per_kw`              | 1140    | $/kW          |
/// | `deeming_years`            | 9       | years         |
/// | `certificate_price`        | 38.50   | $/certificate |
/// | `default_system_size_kw`   | 6.6     | kW            |
/// | `default_energy_price`     | 0.30    | $/kWh         |
/// | `default_feed_in_rate`     | 0.05    | $/kWh         |
/// | `export_fraction`          | 0.6     | share         |
/// | `roof_area_per_kw`         | 6.6     | m²/kW         |
/// | `co2_tonnes_per_kwh`       | 0.0004  | t/kWh         |
/// | `tree_absorption_tonnes`   | 0.022   | t/tree/year   |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalculationConfig {
    pub cost_per_kw: Decimal,
    pub deeming_years: Decimal,
    pub certificate_price: Decimal,
    /// Ascending by threshold, unbounded bucket last.
    pub size_buckets: Vec<SizeBucket>,
    /// Used when no usable bill was entered.
    pub default_system_size_kw: Decimal,
    pub default_energy_price: Decimal,
    pub default_feed_in_rate: Decimal,
    /// Share of annual production exported to the grid.
    pub export_fraction: Decimal,
    pub roof_area_per_kw: Decimal,
    pub co2_tonnes_per_kwh: Decimal,
    pub tree_absorption_tonnes: Decimal,
}

impl Default for CalculationConfig {
    fn default() -> Self {
        Self {
            cost_per_kw: dec!(1140),
            deeming_years: dec!(9),
            certificate_price: dec!(38.50),
            size_buckets: vec![
                SizeBucket::new(dec!(3.0), Some(dec!(4000))),
                SizeBucket::new(dec!(5.0), Some(dec!(6500))),
                SizeBucket::new(dec!(6.6), Some(dec!(8500))),
                SizeBucket::new(dec!(8.0), Some(dec!(10000))),
                SizeBucket::new(dec!(10.0), None),
            ],
            default_system_size_kw: dec!(6.6),
            default_energy_price: dec!(0.30),
            default_feed_in_rate: dec!(0.05),
            export_fraction: dec!(0.6),
            roof_area_per_kw: dec!(6.6),
            co2_tonnes_per_kwh: dec!(0.0004),
            tree_absorption_tonnes: dec!(0.022),
        }
    }
}

impl CalculationConfig {
    /// Checks that every factor is usable and the sizing ladder is ordered.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positives = [
            ("cost per kW", self.cost_per_kw),
            ("deeming years", self.deeming_years),
            ("certificate price", self.certificate_price),
            ("default system size", self.default_system_size_kw),
            ("default energy price", self.default_energy_price),
            ("roof area per kW", self.roof_area_per_kw),
            ("tree absorption", self.tree_absorption_tonnes),
        ];
        for (name, value) in positives {
            if value <= Decimal::ZERO {
                return Err(ConfigError::NotPositive { name, value });
            }
        }
        if self.default_feed_in_rate < Decimal::ZERO {
            return Err(ConfigError::NotPositive {
                name: "default feed-in rate",
                value: self.default_feed_in_rate,
            });
        }
        if self.co2_tonnes_per_kwh < Decimal::ZERO {
            return Err(ConfigError::NotPositive {
                name: "CO2 factor",
                value: self.co2_tonnes_per_kwh,
            });
        }
        if self.export_fraction < Decimal::ZERO || self.export_fraction > Decimal::ONE {
            return Err(ConfigError::InvalidExportFraction(self.export_fraction));
        }

        let Some((last, rest)) = self.size_buckets.split_last() else {
            return Err(ConfigError::NoSizeBuckets);
        };
        let mut previous: Option<Decimal> = None;
        for bucket in rest {
            let Some(threshold) = bucket.max_consumption_kwh else {
                return Err(ConfigError::UnboundedBucketNotLast);
            };
            if previous.is_some_and(|p| threshold <= p) {
                return Err(ConfigError::ThresholdsNotAscending);
            }
            previous = Some(threshold);
        }
        if let (Some(threshold), Some(p)) = (last.max_consumption_kwh, previous) {
            if threshold <= p {
                return Err(ConfigError::ThresholdsNotAscending);
            }
        }
        for bucket in &self.size_buckets {
            if bucket.size_kw <= Decimal::ZERO {
                return Err(ConfigError::NotPositive {
                    name: "bucket system size",
                    value: bucket.size_kw,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(CalculationConfig::default().validate(), Ok(()));
    }

    #[test]
    fn validate_rejects_zero_cost() {
        let config = CalculationConfig {
            cost_per_kw: dec!(0),
            ..CalculationConfig::default()
        };

        assert_eq!(
            config.validate(),
            Err(ConfigError::NotPositive {
                name: "cost per kW",
                value: dec!(0)
            })
        );
    }

    #[test]
    fn validate_rejects_export_fraction_above_one() {
        let config = CalculationConfig {
            export_fraction: dec!(1.2),
            ..CalculationConfig::default()
        };

        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidExportFraction(dec!(1.2)))
        );
    }

    #[test]
    fn validate_rejects_empty_ladder() {
        let config = CalculationConfig {
            size_buckets: Vec::new(),
            ..CalculationConfig::default()
        };

        assert_eq!(config.validate(), Err(ConfigError::NoSizeBuckets));
    }

    #[test]
    fn validate_rejects_unbounded_bucket_in_the_middle() {
        let config = CalculationConfig {
            size_buckets: vec![
                SizeBucket::new(dec!(3.0), None),
                SizeBucket::new(dec!(5.0), Some(dec!(6500))),
            ],
            ..CalculationConfig::default()
        };

        assert_eq!(config.validate(), Err(ConfigError::UnboundedBucketNotLast));
    }

    #[test]
    fn validate_rejects_descending_thresholds() {
        let config = CalculationConfig {
            size_buckets: vec![
                SizeBucket::new(dec!(3.0), Some(dec!(6500))),
                SizeBucket::new(dec!(5.0), Some(dec!(4000))),
            ],
            ..CalculationConfig::default()
        };

        assert_eq!(config.validate(), Err(ConfigError::ThresholdsNotAscending));
    }
}
