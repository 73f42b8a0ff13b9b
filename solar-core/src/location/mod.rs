//! Postcode and address resolution.

mod resolver;

pub use resolver::{LocationResolver, ResolveError};
