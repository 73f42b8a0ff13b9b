use async_trait::async_trait;
use thiserror::Error;

use crate::submission::SubmissionRecord;

/// Opaque failure from the lead-capture backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("lead submission failed: {0}")]
pub struct LeadCaptureError(pub String);

/// Receives the flattened lead record.
#[async_trait]
pub trait LeadCapture: Send + Sync {
    async fn submit(
        &self,
        record: &SubmissionRecord,
    ) -> Result<(), LeadCaptureError>;
}
