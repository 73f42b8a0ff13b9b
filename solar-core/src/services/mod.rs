//! Interfaces to the external collaborators.
//!
//! The core never performs I/O itself: it calls these traits and decides what
//! to do with the answers. Concrete backends live in their own crates and are
//! selected at startup through the [`ServiceRegistry`].

pub mod factory;
pub mod geocoder;
pub mod lead_capture;
pub mod memory;
pub mod production;

pub use factory::{ServiceConfig, ServiceError, ServiceFactory, ServiceRegistry, Services};
pub use geocoder::{GeocodeCandidate, GeocodeError, GeocodeQuery, Geocoder};
pub use lead_capture::{LeadCapture, LeadCaptureError};
pub use production::{ProductionError, ProductionEstimate, ProductionEstimator, ProductionRequest};
