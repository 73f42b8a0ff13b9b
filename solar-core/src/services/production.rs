use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProductionError {
    /// The request never got a response.
    #[error("production estimate service unreachable: {0}")]
    Unreachable(String),

    /// The service answered with an error status.
    #[error("production estimate service returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("malformed production estimate response: {0}")]
    Malformed(String),
}

/// Default array parameters. Azimuth 0° faces north, which suits the
/// southern hemisphere.
pub const DEFAULT_AZIMUTH_DEG: u16 = 0;
pub const DEFAULT_TILT_DEG: u16 = 20;
/// Fixed roof mount.
pub const DEFAULT_ARRAY_TYPE: u8 = 1;
/// Standard module.
pub const DEFAULT_MODULE_TYPE: u8 = 0;
pub const DEFAULT_SYSTEM_LOSSES_PCT: u16 = 14;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionRequest {
    pub latitude: f64,
    pub longitude: f64,
    pub system_size_kw: Decimal,
    pub azimuth: u16,
    pub tilt: u16,
    pub array_type: u8,
    pub module_type: u8,
    pub losses_pct: u16,
}

impl ProductionRequest {
    pub fn new(
        latitude: f64,
        longitude: f64,
        system_size_kw: Decimal,
    ) -> Self {
        Self {
            latitude,
            longitude,
            system_size_kw,
            azimuth: DEFAULT_AZIMUTH_DEG,
            tilt: DEFAULT_TILT_DEG,
            array_type: DEFAULT_ARRAY_TYPE,
            module_type: DEFAULT_MODULE_TYPE,
            losses_pct: DEFAULT_SYSTEM_LOSSES_PCT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionEstimate {
    /// Annual AC output in kWh.
    pub annual_ac_kwh: Decimal,
}

/// External solar production model.
#[async_trait]
pub trait ProductionEstimator: Send + Sync {
    async fn estimate(
        &self,
        request: &ProductionRequest,
    ) -> Result<ProductionEstimate, ProductionError>;
}
