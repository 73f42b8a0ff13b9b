use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Geocoder, LeadCapture, ProductionEstimator};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ServiceError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Client error: {0}")]
    Client(String),
}

/// Backend-agnostic collaborator configuration.
///
/// `backend` must match the [`ServiceFactory::backend_name`] of a
/// registered factory. The remaining fields are passed through unchanged;
/// each backend decides which of them it needs.
///
/// | backend | meaning                                          |
/// |---------|--------------------------------------------------|
/// | `http`  | Nominatim geocoder, PVWatts model, form POST     |
/// | `memory`| capital-city geocoder, flat yield, in-memory leads |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Lowercase identifier matching a registered factory (e.g. `"http"`).
    pub backend: String,
    pub geocoder_url: String,
    /// Sent with every geocoding request; public Nominatim requires one.
    pub user_agent: String,
    /// ISO 3166-1 alpha-2 code restricting geocoder results.
    pub country_code: String,
    pub production_url: String,
    pub production_api_key: String,
    pub lead_capture_url: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            backend: "http".to_string(),
            geocoder_url: "https://nominatim.openstreetmap.org".to_string(),
            user_agent: "SolarQuote/0.1".to_string(),
            country_code: "au".to_string(),
            production_url: "https://developer.nrel.gov/api/pvwatts/v8.json".to_string(),
            production_api_key: "DEMO_KEY".to_string(),
            lead_capture_url: "http://127.0.0.1:8080/leads".to_string(),
        }
    }
}

/// The three external collaborators a quote session talks to.
#[derive(Clone)]
pub struct Services {
    pub geocoder: Arc<dyn Geocoder>,
    pub production: Arc<dyn ProductionEstimator>,
    pub lead_capture: Arc<dyn LeadCapture>,
}

/// One implementation per backend. Each backend crate exports a unit
/// struct implementing this trait, registered with a [`ServiceRegistry`]
/// at startup.
#[async_trait]
pub trait ServiceFactory: Send + Sync {
    /// Unique, lowercase identifier for this backend.
    fn backend_name(&self) -> &'static str;

    async fn create(
        &self,
        config: &ServiceConfig,
    ) -> Result<Services, ServiceError>;
}

/// Registry of [`ServiceFactory`] instances, keyed by backend name.
pub struct ServiceRegistry {
    factories: HashMap<&'static str, Box<dyn ServiceFactory>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a backend factory. A factory with the same name is replaced.
    pub fn register(
        &mut self,
        factory: Box<dyn ServiceFactory>,
    ) {
        self.factories.insert(factory.backend_name(), factory);
    }

    /// Names of every registered backend, sorted alphabetically.
    pub fn available_backends(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Dispatch to the factory that matches `config.backend`.
    ///
    /// # Errors
    /// * [`ServiceError::Configuration`] when no factory is registered for
    ///   the requested backend.
    /// * Any error the chosen factory itself returns.
    pub async fn create(
        &self,
        config: &ServiceConfig,
    ) -> Result<Services, ServiceError> {
        let factory = self
            .factories
            .get(config.backend.as_str())
            .ok_or_else(|| {
                ServiceError::Configuration(format!(
                    "unknown backend '{}'; available: {:?}",
                    config.backend,
                    self.available_backends()
                ))
            })?;

        factory.create(config).await
    }
}

impl Default for ServiceRegistry {
    fn default() -> Self {
        Self::new()
    }
}
