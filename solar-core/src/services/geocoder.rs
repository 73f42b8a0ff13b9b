use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeocodeError {
    #[error("geocoding service unreachable: {0}")]
    Unreachable(String),

    #[error("geocoding service returned status {0}")]
    Status(u16),

    #[error("malformed geocoding response: {0}")]
    Malformed(String),
}

/// What to look up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeocodeQuery {
    Postcode(String),
    FreeText(String),
}

impl GeocodeQuery {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Postcode(s) | Self::FreeText(s) => s,
        }
    }
}

/// One geocoder match. Coordinates arrive as numeric strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeocodeCandidate {
    pub display_name: String,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub postcode: Option<String>,
    /// State or territory, as named by the geocoder.
    pub region: Option<String>,
}

impl GeocodeCandidate {
    /// Parsed `(latitude, longitude)`, or `None` if either is missing or
    /// not a finite number.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        let lat = self.latitude.as_deref()?.trim().parse::<f64>().ok()?;
        let lon = self.longitude.as_deref()?.trim().parse::<f64>().ok()?;
        (lat.is_finite() && lon.is_finite()).then_some((lat, lon))
    }
}

/// Address / postcode lookup service.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Returns candidates in the service's ranking order, at most `limit`.
    async fn search(
        &self,
        query: &GeocodeQuery,
        limit: usize,
    ) -> Result<Vec<GeocodeCandidate>, GeocodeError>;
}
