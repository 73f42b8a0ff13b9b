//! Step sequencing and the asynchronous "verify then advance" flow.

mod machine;
mod session;

pub use machine::{
    LocationQuery, LocationRequest, Progress, SubmissionRequest, Ticket, Transition, Wizard,
    WizardError,
};
pub use session::QuoteSession;
