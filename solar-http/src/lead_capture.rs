//! Form-encoded POST of the lead record.

use async_trait::async_trait;
use reqwest::Client;
use solar_core::SubmissionRecord;
use solar_core::services::{LeadCapture, LeadCaptureError};
use tracing::info;

pub struct FormPostLeadCapture {
    client: Client,
    url: String,
}

impl FormPostLeadCapture {
    pub fn new(
        client: Client,
        url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl LeadCapture for FormPostLeadCapture {
    async fn submit(
        &self,
        record: &SubmissionRecord,
    ) -> Result<(), LeadCaptureError> {
        let fields: Vec<(&str, &str)> = record.iter().collect();
        let response = self
            .client
            .post(&self.url)
            .form(&fields)
            .send()
            .await
            .map_err(|e| LeadCaptureError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LeadCaptureError(format!("status {}", status.as_u16())));
        }
        info!(fields = fields.len(), "lead submitted");
        Ok(())
    }
}
