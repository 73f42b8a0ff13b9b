use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use solar_core::services::{ServiceConfig, ServiceError, ServiceFactory, Services};

use crate::{FormPostLeadCapture, NominatimGeocoder, PvWattsEstimator};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// [`ServiceFactory`] for the public HTTP collaborators.
///
/// Register this with a [`solar_core::services::ServiceRegistry`] to make the
/// `"http"` backend available:
///
/// ```rust,no_run
/// use solar_core::services::ServiceRegistry;
/// use solar_http::HttpServiceFactory;
///
/// let mut registry = ServiceRegistry::new();
/// registry.register(Box::new(HttpServiceFactory));
/// ```
pub struct HttpServiceFactory;

#[async_trait]
impl ServiceFactory for HttpServiceFactory {
    fn backend_name(&self) -> &'static str {
        "http"
    }

    /// Builds one shared client carrying `config.user_agent`, which public
    /// Nominatim requires.
    async fn create(
        &self,
        config: &ServiceConfig,
    ) -> Result<Services, ServiceError> {
        if config.user_agent.trim().is_empty() {
            return Err(ServiceError::Configuration(
                "user_agent must not be empty".to_string(),
            ));
        }
        for (name, url) in [
            ("geocoder_url", &config.geocoder_url),
            ("production_url", &config.production_url),
            ("lead_capture_url", &config.lead_capture_url),
        ] {
            reqwest::Url::parse(url)
                .map_err(|e| ServiceError::Configuration(format!("{name} '{url}': {e}")))?;
        }

        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| ServiceError::Client(e.to_string()))?;

        Ok(Services {
            geocoder: Arc::new(NominatimGeocoder::new(
                client.clone(),
                config.geocoder_url.clone(),
                config.country_code.clone(),
            )),
            production: Arc::new(PvWattsEstimator::new(
                client.clone(),
                config.production_url.clone(),
                config.production_api_key.clone(),
            )),
            lead_capture: Arc::new(FormPostLeadCapture::new(
                client,
                config.lead_capture_url.clone(),
            )),
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// tests
// ─────────────────────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use solar_core::services::ServiceRegistry;

    use super::*;

    #[tokio::test]
    async fn default_config_builds_services() {
        let mut registry = ServiceRegistry::new();
        registry.register(Box::new(HttpServiceFactory));

        assert!(registry.create(&ServiceConfig::default()).await.is_ok());
        assert_eq!(registry.available_backends(), vec!["http"]);
    }

    #[tokio::test]
    async fn rejects_invalid_url() {
        let config = ServiceConfig {
            production_url: "not a url".to_string(),
            ..ServiceConfig::default()
        };

        let err = HttpServiceFactory.create(&config).await.err();

        assert!(matches!(
            err,
            Some(ServiceError::Configuration(msg)) if msg.starts_with("production_url")
        ));
    }

    #[tokio::test]
    async fn rejects_blank_user_agent() {
        let config = ServiceConfig {
            user_agent: " ".to_string(),
            ..ServiceConfig::default()
        };

        assert_eq!(
            HttpServiceFactory.create(&config).await.err(),
            Some(ServiceError::Configuration("user_agent must not be empty".to_string()))
        );
    }
}
