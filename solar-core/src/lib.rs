pub mod calculations;
pub mod location;
pub mod models;
pub mod services;
pub mod submission;
pub mod suggestions;
pub mod validation;
pub mod wizard;

pub use calculations::{CalculationConfig, CalculationEngine, CalculationError};
pub use location::{LocationResolver, ResolveError};
pub use models::*;
pub use submission::{SubmissionRecord, build_record};
pub use validation::{ValidationError, is_valid, validate};
pub use wizard::{QuoteSession, Transition, Wizard, WizardError};
