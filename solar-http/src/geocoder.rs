//! Nominatim search client.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use solar_core::services::{GeocodeCandidate, GeocodeError, GeocodeQuery, Geocoder};
use tracing::debug;

#[derive(Debug, Deserialize)]
struct SearchResult {
    display_name: String,
    lat: Option<String>,
    lon: Option<String>,
    #[serde(default)]
    address: Option<Address>,
}

#[derive(Debug, Default, Deserialize)]
struct Address {
    postcode: Option<String>,
    state: Option<String>,
    /// Territories are sometimes reported here instead of `state`.
    territory: Option<String>,
}

/// Decodes a `/search?format=jsonv2&addressdetails=1` response body.
pub fn decode_candidates(body: &str) -> Result<Vec<GeocodeCandidate>, GeocodeError> {
    let results: Vec<SearchResult> =
        serde_json::from_str(body).map_err(|e| GeocodeError::Malformed(e.to_string()))?;

    Ok(results
        .into_iter()
        .map(|result| {
            let address = result.address.unwrap_or_default();
            GeocodeCandidate {
                display_name: result.display_name,
                latitude: result.lat,
                longitude: result.lon,
                postcode: address.postcode,
                region: address.state.or(address.territory),
            }
        })
        .collect())
}

pub struct NominatimGeocoder {
    client: Client,
    base_url: String,
    country_code: String,
}

impl NominatimGeocoder {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        country_code: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            country_code: country_code.into(),
        }
    }

    /// Query-string pairs for one search.
    pub fn query_params(
        &self,
        query: &GeocodeQuery,
        limit: usize,
    ) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("format", "jsonv2".to_string()),
            ("addressdetails", "1".to_string()),
            ("countrycodes", self.country_code.clone()),
            ("limit", limit.max(1).to_string()),
        ];
        match query {
            GeocodeQuery::Postcode(postcode) => {
                params.push(("postalcode", postcode.trim().to_string()));
            }
            GeocodeQuery::FreeText(text) => params.push(("q", text.trim().to_string())),
        }
        params
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn search(
        &self,
        query: &GeocodeQuery,
        limit: usize,
    ) -> Result<Vec<GeocodeCandidate>, GeocodeError> {
        let url = format!("{}/search", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&self.query_params(query, limit))
            .send()
            .await
            .map_err(|e| GeocodeError::Unreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeocodeError::Status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| GeocodeError::Unreachable(e.to_string()))?;
        let candidates = decode_candidates(&body)?;
        debug!(query = query.as_str(), found = candidates.len(), "geocoded");
        Ok(candidates)
    }
}
