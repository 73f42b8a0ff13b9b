//! HTTP implementations of the quote collaborators.

mod factory;
mod geocoder;
mod lead_capture;
mod production;

pub use factory::HttpServiceFactory;
pub use geocoder::{NominatimGeocoder, decode_candidates};
pub use lead_capture::FormPostLeadCapture;
pub use production::{PvWattsEstimator, decode_estimate};
