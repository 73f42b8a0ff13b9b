//! In-process collaborators.
//!
//! Used by the `memory` backend for offline runs and by tests that need
//! deterministic, inspectable service behaviour.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use rust_decimal::Decimal;

use super::{
    GeocodeCandidate, GeocodeError, GeocodeQuery, Geocoder, LeadCapture, LeadCaptureError,
    ProductionError, ProductionEstimate, ProductionEstimator, ProductionRequest, ServiceConfig,
    ServiceError, ServiceFactory, Services,
};
use crate::submission::SubmissionRecord;

fn key(query: &str) -> String {
    query.trim().to_lowercase()
}

/// Geocoder answering from a fixed set of entries.
///
/// Exact query matches win. Free-text queries with no exact match return
/// every entry whose key starts with the query.
#[derive(Debug, Default)]
pub struct MemoryGeocoder {
    entries: HashMap<String, Vec<GeocodeCandidate>>,
    failure: Option<GeocodeError>,
    calls: AtomicUsize,
}

impl MemoryGeocoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(error: GeocodeError) -> Self {
        Self {
            failure: Some(error),
            ..Self::default()
        }
    }

    pub fn with_entry(
        mut self,
        query: &str,
        candidates: Vec<GeocodeCandidate>,
    ) -> Self {
        self.entries.insert(key(query), candidates);
        self
    }

    /// Number of `search` calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Geocoder for MemoryGeocoder {
    async fn search(
        &self,
        query: &GeocodeQuery,
        limit: usize,
    ) -> Result<Vec<GeocodeCandidate>, GeocodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }

        let wanted = key(query.as_str());
        if let Some(found) = self.entries.get(&wanted) {
            return Ok(found.iter().take(limit).cloned().collect());
        }

        let mut matches: Vec<(&String, &Vec<GeocodeCandidate>)> = match query {
            GeocodeQuery::FreeText(_) => self
                .entries
                .iter()
                .filter(|(k, _)| k.starts_with(&wanted))
                .collect(),
            GeocodeQuery::Postcode(_) => Vec::new(),
        };
        matches.sort_by(|a, b| a.0.cmp(b.0));

        Ok(matches
            .into_iter()
            .flat_map(|(_, candidates)| candidates.iter().cloned())
            .take(limit)
            .collect())
    }
}

#[derive(Debug, Clone, Copy)]
enum Yield {
    Annual(Decimal),
    PerKw(Decimal),
}

/// Production model returning a fixed figure.
#[derive(Debug)]
pub struct FixedProduction {
    yield_: Yield,
    failure: Option<ProductionError>,
    calls: AtomicUsize,
    last_request: Mutex<Option<ProductionRequest>>,
}

impl FixedProduction {
    /// Same annual output regardless of system size.
    pub fn annual(kwh: Decimal) -> Self {
        Self::with_yield(Yield::Annual(kwh))
    }

    /// Output proportional to system size.
    pub fn per_kw(kwh_per_kw: Decimal) -> Self {
        Self::with_yield(Yield::PerKw(kwh_per_kw))
    }

    pub fn failing(error: ProductionError) -> Self {
        Self {
            failure: Some(error),
            ..Self::with_yield(Yield::Annual(Decimal::ZERO))
        }
    }

    fn with_yield(yield_: Yield) -> Self {
        Self {
            yield_,
            failure: None,
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<ProductionRequest> {
        self.last_request
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl ProductionEstimator for FixedProduction {
    async fn estimate(
        &self,
        request: &ProductionRequest,
    ) -> Result<ProductionEstimate, ProductionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self
            .last_request
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(request.clone());

        if let Some(error) = &self.failure {
            return Err(error.clone());
        }

        let annual_ac_kwh = match self.yield_ {
            Yield::Annual(kwh) => kwh,
            Yield::PerKw(rate) => rate * request.system_size_kw,
        };
        Ok(ProductionEstimate { annual_ac_kwh })
    }
}

/// Lead sink that keeps every accepted record.
#[derive(Debug, Default)]
pub struct RecordingLeadCapture {
    submissions: Mutex<Vec<SubmissionRecord>>,
    failures_remaining: AtomicUsize,
    attempts: AtomicUsize,
}

impl RecordingLeadCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects the first `times` submissions, then accepts.
    pub fn failing_times(times: usize) -> Self {
        Self {
            failures_remaining: AtomicUsize::new(times),
            ..Self::default()
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn submissions(&self) -> Vec<SubmissionRecord> {
        self.submissions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl LeadCapture for RecordingLeadCapture {
    async fn submit(
        &self,
        record: &SubmissionRecord,
    ) -> Result<(), LeadCaptureError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        let should_fail = self
            .failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if should_fail {
            return Err(LeadCaptureError("backend rejected the submission".to_string()));
        }

        self.submissions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record.clone());
        Ok(())
    }
}

/// Capital-city candidates used by the offline backend.
fn capital_cities() -> MemoryGeocoder {
    let cities = [
        ("0800", "Darwin", "Northern Territory", "-12.4634", "130.8456"),
        ("2000", "Sydney", "New South Wales", "-33.8688", "151.2093"),
        ("2600", "Canberra", "Australian Capital Territory", "-35.2809", "149.1300"),
        ("3000", "Melbourne", "Victoria", "-37.8136", "144.9631"),
        ("4000", "Brisbane", "Queensland", "-27.4698", "153.0251"),
        ("5000", "Adelaide", "South Australia", "-34.9285", "138.6007"),
        ("6000", "Perth", "Western Australia", "-31.9505", "115.8605"),
        ("7000", "Hobart", "Tasmania", "-42.8821", "147.3272"),
    ];

    cities
        .into_iter()
        .fold(MemoryGeocoder::new(), |geocoder, (postcode, city, region, lat, lon)| {
            let candidate = GeocodeCandidate {
                display_name: format!("{city}, {region}, {postcode}, Australia"),
                latitude: Some(lat.to_string()),
                longitude: Some(lon.to_string()),
                postcode: Some(postcode.to_string()),
                region: Some(region.to_string()),
            };
            geocoder
                .with_entry(postcode, vec![candidate.clone()])
                .with_entry(city, vec![candidate])
        })
}

/// Offline backend: capital-city geocoding, a flat 1,400 kWh per kW
/// production model, and an in-memory lead sink.
pub struct MemoryServiceFactory;

#[async_trait]
impl ServiceFactory for MemoryServiceFactory {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn create(
        &self,
        _config: &ServiceConfig,
    ) -> Result<Services, ServiceError> {
        Ok(Services {
            geocoder: Arc::new(capital_cities()),
            production: Arc::new(FixedProduction::per_kw(Decimal::from(1400))),
            lead_capture: Arc::new(RecordingLeadCapture::new()),
        })
    }
}
