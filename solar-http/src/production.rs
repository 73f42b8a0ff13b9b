//! PVWatts production model client.

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use solar_core::services::{
    ProductionError, ProductionEstimate, ProductionEstimator, ProductionRequest,
};
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct PvWattsResponse {
    #[serde(default)]
    outputs: Option<Outputs>,
    #[serde(default)]
    errors: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct Outputs {
    ac_annual: Option<f64>,
}

/// Extracts the annual AC total from a response body.
///
/// A body listing errors, or one without a finite non-negative
/// `outputs.ac_annual`, is [`ProductionError::Malformed`].
pub fn decode_estimate(body: &str) -> Result<ProductionEstimate, ProductionError> {
    let response: PvWattsResponse =
        serde_json::from_str(body).map_err(|e| ProductionError::Malformed(e.to_string()))?;

    if !response.errors.is_empty() {
        return Err(ProductionError::Malformed(response.errors.join("; ")));
    }

    let annual = response
        .outputs
        .and_then(|o| o.ac_annual)
        .filter(|v| v.is_finite() && *v >= 0.0)
        .ok_or_else(|| ProductionError::Malformed("missing outputs.ac_annual".to_string()))?;

    let annual_ac_kwh = Decimal::try_from(annual)
        .map_err(|e| ProductionError::Malformed(e.to_string()))?;
    Ok(ProductionEstimate { annual_ac_kwh })
}

/// Best-effort message from an error response body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<PvWattsResponse>(body)
        .ok()
        .map(|r| r.errors.join("; "))
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| body.chars().take(200).collect())
}

pub struct PvWattsEstimator {
    client: Client,
    url: String,
    api_key: String,
}

impl PvWattsEstimator {
    pub fn new(
        client: Client,
        url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            url: url.into(),
            api_key: api_key.into(),
        }
    }

    pub fn query_params(
        &self,
        request: &ProductionRequest,
    ) -> Vec<(&'static str, String)> {
        vec![
            ("api_key", self.api_key.clone()),
            ("lat", request.latitude.to_string()),
            ("lon", request.longitude.to_string()),
            ("system_capacity", request.system_size_kw.normalize().to_string()),
            ("azimuth", request.azimuth.to_string()),
            ("tilt", request.tilt.to_string()),
            ("array_type", request.array_type.to_string()),
            ("module_type", request.module_type.to_string()),
            ("losses", request.losses_pct.to_string()),
        ]
    }
}

#[async_trait]
impl ProductionEstimator for PvWattsEstimator {
    async fn estimate(
        &self,
        request: &ProductionRequest,
    ) -> Result<ProductionEstimate, ProductionError> {
        let response = self
            .client
            .get(&self.url)
            .query(&self.query_params(request))
            .send()
            .await
            .map_err(|e| ProductionError::Unreachable(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProductionError::Unreachable(e.to_string()))?;

        if !status.is_success() {
            let message = error_message(&body);
            warn!(status = status.as_u16(), %message, "production service error");
            return Err(ProductionError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let estimate = decode_estimate(&body)?;
        debug!(
            size_kw = %request.system_size_kw,
            annual_kwh = %estimate.annual_ac_kwh,
            "production estimate"
        );
        Ok(estimate)
    }
}
