//! Quote calculation: sizing, cost, incentives, savings and environmental
//! impact.

pub mod common;
pub mod config;
pub mod engine;

pub use config::{CalculationConfig, ConfigError, SizeBucket};
pub use engine::{CalculationEngine, CalculationError, CalculationInput};
