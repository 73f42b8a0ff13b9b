use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::models::{Jurisdiction, PostcodeTable, ResolvedLocation};
use crate::services::{GeocodeCandidate, GeocodeError, GeocodeQuery, Geocoder};
use crate::validation::is_postcode;

/// Why a location could not be resolved. Every variant is recoverable: the
/// user stays on the address step and may retry.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Please enter a valid 4-digit postcode.")]
    InvalidPostcode,

    #[error("Please enter your address.")]
    EmptyAddress,

    #[error("Could not look up your location ({0}). Please try again.")]
    Geocoding(#[from] GeocodeError),

    #[error("We couldn't find that location. Please check it and try again.")]
    NotFound,

    #[error("Coordinates unavailable for that location. Please try again.")]
    CoordinatesUnavailable,

    #[error("We couldn't find a postcode for that address. Please enter your postcode instead.")]
    MissingPostcode,

    /// The jurisdiction is known but no rated zone exists for the postcode.
    #[error(
        "Solar zone data is unavailable for postcode {postcode} ({jurisdiction}). \
         Please try a nearby postcode."
    )]
    ZoneUnavailable {
        postcode: String,
        jurisdiction: Jurisdiction,
    },

    #[error("Cannot determine the state or solar zone for postcode {0}. Please try again.")]
    Undetermined(String),
}

/// Turns a postcode or address into a [`ResolvedLocation`].
///
/// The geocoder supplies coordinates and, failing that, a jurisdiction
/// hint. The static postcode table is authoritative for jurisdiction and
/// zone. A postcode missing from the table is never assigned a guessed
/// zone.
#[derive(Clone)]
pub struct LocationResolver {
    geocoder: Arc<dyn Geocoder>,
    postcodes: Arc<PostcodeTable>,
}

impl LocationResolver {
    pub fn new(
        geocoder: Arc<dyn Geocoder>,
        postcodes: Arc<PostcodeTable>,
    ) -> Self {
        Self {
            geocoder,
            postcodes,
        }
    }

    pub fn geocoder(&self) -> &Arc<dyn Geocoder> {
        &self.geocoder
    }

    /// Resolves a four-digit postcode. Malformed input is rejected without
    /// contacting the geocoder; otherwise exactly one lookup is made and
    /// only its first candidate is used.
    pub async fn resolve_postcode(
        &self,
        raw: &str,
    ) -> Result<ResolvedLocation, ResolveError> {
        let postcode = raw.trim();
        if !is_postcode(postcode) {
            return Err(ResolveError::InvalidPostcode);
        }

        let candidates = self
            .geocoder
            .search(&GeocodeQuery::Postcode(postcode.to_string()), 1)
            .await
            .inspect_err(|e| warn!(postcode, error = %e, "postcode lookup failed"))?;
        let candidate = candidates.first().ok_or(ResolveError::NotFound)?;

        self.resolve_candidate(postcode, candidate)
    }

    /// Resolves a free-text address. When `selected` is the suggestion the
    /// user picked and its display name still matches `text`, it is used as
    /// is; otherwise the text is geocoded once.
    pub async fn resolve_address(
        &self,
        text: &str,
        selected: Option<&GeocodeCandidate>,
    ) -> Result<ResolvedLocation, ResolveError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ResolveError::EmptyAddress);
        }

        let looked_up;
        let candidate = match selected.filter(|c| c.display_name.trim() == text) {
            Some(candidate) => {
                debug!(address = text, "using selected suggestion");
                candidate
            }
            None => {
                looked_up = self
                    .geocoder
                    .search(&GeocodeQuery::FreeText(text.to_string()), 1)
                    .await
                    .inspect_err(|e| warn!(error = %e, "address lookup failed"))?;
                looked_up.first().ok_or(ResolveError::NotFound)?
            }
        };

        let postcode = candidate
            .postcode
            .as_deref()
            .map(str::trim)
            .filter(|p| is_postcode(p))
            .ok_or(ResolveError::MissingPostcode)?;

        self.resolve_candidate(postcode, candidate)
    }

    /// Combines a geocoder candidate with the postcode table.
    pub fn resolve_candidate(
        &self,
        postcode: &str,
        candidate: &GeocodeCandidate,
    ) -> Result<ResolvedLocation, ResolveError> {
        let (latitude, longitude) = candidate
            .coordinates()
            .ok_or(ResolveError::CoordinatesUnavailable)?;

        let hint = candidate
            .region
            .as_deref()
            .and_then(Jurisdiction::from_region_name);

        let (jurisdiction, certificate_zone) = match self.postcodes.get(postcode) {
            Some(record) => (record.jurisdiction, record.certificate_zone),
            None => {
                let error = match hint {
                    Some(jurisdiction) => ResolveError::ZoneUnavailable {
                        postcode: postcode.to_string(),
                        jurisdiction,
                    },
                    None => ResolveError::Undetermined(postcode.to_string()),
                };
                warn!(postcode, hint = ?hint, "postcode not in zone table");
                return Err(error);
            }
        };

        if hint.is_some_and(|h| h != jurisdiction) {
            debug!(
                postcode,
                hint = ?hint,
                table = %jurisdiction,
                "geocoder region disagrees with table"
            );
        }

        let location = ResolvedLocation {
            postcode: postcode.to_string(),
            jurisdiction,
            certificate_zone,
            latitude,
            longitude,
            display_name: Some(candidate.display_name.clone()),
        };
        if location.valid_zone().is_none() {
            return Err(ResolveError::ZoneUnavailable {
                postcode: postcode.to_string(),
                jurisdiction,
            });
        }

        info!(postcode, %jurisdiction, zone = ?certificate_zone, "resolved location");
        Ok(location)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::models::LocationRecord;
    use crate::services::memory::MemoryGeocoder;

    fn candidate(
        postcode: Option<&str>,
        region: Option<&str>,
        coordinates: Option<(&str, &str)>,
    ) -> GeocodeCandidate {
        GeocodeCandidate {
            display_name: "1 George St, Sydney NSW 2000".to_string(),
            latitude: coordinates.map(|c| c.0.to_string()),
            longitude: coordinates.map(|c| c.1.to_string()),
            postcode: postcode.map(str::to_string),
            region: region.map(str::to_string),
        }
    }

    fn sydney() -> GeocodeCandidate {
        candidate(Some("2000"), Some("New South Wales"), Some(("-33.87", "151.21")))
    }

    fn table() -> Arc<PostcodeTable> {
        let mut table = PostcodeTable::new();
        table.insert("2000", LocationRecord {
            jurisdiction: Jurisdiction::Nsw,
            certificate_zone: Some(3),
        });
        table.insert("2611", LocationRecord {
            jurisdiction: Jurisdiction::Act,
            certificate_zone: None,
        });
        Arc::new(table)
    }

    fn resolver(geocoder: MemoryGeocoder) -> (LocationResolver, Arc<MemoryGeocoder>) {
        let geocoder = Arc::new(geocoder);
        (LocationResolver::new(geocoder.clone(), table()), geocoder)
    }

    #[tokio::test]
    async fn malformed_postcode_never_reaches_geocoder() {
        let (resolver, geocoder) = resolver(MemoryGeocoder::new());

        for raw in ["", "200", "20000", "abcd", "2 00", "٢٠٠٠", "２０００"] {
            assert_eq!(
                resolver.resolve_postcode(raw).await,
                Err(ResolveError::InvalidPostcode),
                "{raw:?}"
            );
        }
        assert_eq!(geocoder.calls(), 0);
    }

    #[tokio::test]
    async fn resolves_known_postcode() {
        let (resolver, geocoder) =
            resolver(MemoryGeocoder::new().with_entry("2000", vec![sydney()]));

        let location = resolver.resolve_postcode(" 2000 ").await.unwrap();

        assert_eq!(location.postcode, "2000");
        assert_eq!(location.jurisdiction, Jurisdiction::Nsw);
        assert_eq!(location.certificate_zone, Some(3));
        assert_eq!((location.latitude, location.longitude), (-33.87, 151.21));
        assert_eq!(geocoder.calls(), 1);
    }

    #[tokio::test]
    async fn table_overrides_geocoder_region() {
        let misleading = candidate(Some("2000"), Some("Victoria"), Some(("-33.87", "151.21")));
        let (resolver, _) = resolver(MemoryGeocoder::new().with_entry("2000", vec![misleading]));

        let location = resolver.resolve_postcode("2000").await.unwrap();

        assert_eq!(location.jurisdiction, Jurisdiction::Nsw);
    }

    #[tokio::test]
    async fn only_first_candidate_is_consulted() {
        let no_coordinates = candidate(Some("2000"), Some("New South Wales"), None);
        let (resolver, _) =
            resolver(MemoryGeocoder::new().with_entry("2000", vec![no_coordinates, sydney()]));

        assert_eq!(
            resolver.resolve_postcode("2000").await,
            Err(ResolveError::CoordinatesUnavailable)
        );
    }

    #[tokio::test]
    async fn no_candidates_is_not_found() {
        let (resolver, _) = resolver(MemoryGeocoder::new());

        assert_eq!(resolver.resolve_postcode("2000").await, Err(ResolveError::NotFound));
    }

    #[tokio::test]
    async fn geocoder_failure_propagates() {
        let (resolver, _) = resolver(MemoryGeocoder::failing(GeocodeError::Status(503)));

        assert_eq!(
            resolver.resolve_postcode("2000").await,
            Err(ResolveError::Geocoding(GeocodeError::Status(503)))
        );
    }

    #[tokio::test]
    async fn unknown_postcode_with_hint_has_no_zone() {
        let perth = candidate(Some("6999"), Some("Western Australia"), Some(("-31.95", "115.86")));
        let (resolver, _) = resolver(MemoryGeocoder::new().with_entry("6999", vec![perth]));

        assert_eq!(
            resolver.resolve_postcode("6999").await,
            Err(ResolveError::ZoneUnavailable {
                postcode: "6999".to_string(),
                jurisdiction: Jurisdiction::Wa,
            })
        );
    }

    #[tokio::test]
    async fn unknown_postcode_without_hint_is_undetermined() {
        let nowhere = candidate(Some("9999"), None, Some(("-31.95", "115.86")));
        let (resolver, _) = resolver(MemoryGeocoder::new().with_entry("9999", vec![nowhere]));

        assert_eq!(
            resolver.resolve_postcode("9999").await,
            Err(ResolveError::Undetermined("9999".to_string()))
        );
    }

    #[tokio::test]
    async fn table_entry_without_zone_fails() {
        let canberra = candidate(Some("2611"), Some("ACT"), Some(("-35.3", "149.1")));
        let (resolver, _) = resolver(MemoryGeocoder::new().with_entry("2611", vec![canberra]));

        assert_eq!(
            resolver.resolve_postcode("2611").await,
            Err(ResolveError::ZoneUnavailable {
                postcode: "2611".to_string(),
                jurisdiction: Jurisdiction::Act,
            })
        );
    }

    #[tokio::test]
    async fn address_uses_candidate_postcode() {
        let (resolver, geocoder) =
            resolver(MemoryGeocoder::new().with_entry("1 George St", vec![sydney()]));

        let location = resolver.resolve_address("1 George St", None).await.unwrap();

        assert_eq!(location.postcode, "2000");
        assert_eq!(
            location.display_name.as_deref(),
            Some("1 George St, Sydney NSW 2000")
        );
        assert_eq!(geocoder.calls(), 1);
    }

    #[tokio::test]
    async fn address_reuses_matching_selection() {
        let (resolver, geocoder) = resolver(MemoryGeocoder::new());
        let selected = sydney();

        let location = resolver
            .resolve_address("1 George St, Sydney NSW 2000", Some(&selected))
            .await
            .unwrap();

        assert_eq!(location.jurisdiction, Jurisdiction::Nsw);
        assert_eq!(geocoder.calls(), 0);
    }

    #[tokio::test]
    async fn address_ignores_stale_selection() {
        let (resolver, geocoder) = resolver(MemoryGeocoder::new());
        let selected = sydney();

        let result = resolver.resolve_address("2 Pitt St", Some(&selected)).await;

        assert_eq!(result, Err(ResolveError::NotFound));
        assert_eq!(geocoder.calls(), 1);
    }

    #[tokio::test]
    async fn address_without_postcode_fails() {
        let vague = candidate(None, Some("New South Wales"), Some(("-33.87", "151.21")));
        let (resolver, _) = resolver(MemoryGeocoder::new().with_entry("sydney", vec![vague]));

        assert_eq!(
            resolver.resolve_address("Sydney", None).await,
            Err(ResolveError::MissingPostcode)
        );
    }

    #[tokio::test]
    async fn blank_address_is_rejected() {
        let (resolver, geocoder) = resolver(MemoryGeocoder::new());

        assert_eq!(
            resolver.resolve_address("  ", None).await,
            Err(ResolveError::EmptyAddress)
        );
        assert_eq!(geocoder.calls(), 0);
    }
}
