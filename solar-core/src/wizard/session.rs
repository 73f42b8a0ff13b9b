use std::sync::Arc;

use tracing::debug;

use super::machine::{LocationQuery, Transition, Wizard, WizardError};
use crate::calculations::CalculationEngine;
use crate::location::LocationResolver;
use crate::models::{FormEvent, PostcodeTable, StepCatalog};
use crate::services::{GeocodeCandidate, LeadCapture, ProductionEstimator, Services};

/// One customer's questionnaire, wired to its collaborators.
///
/// Drives the [`Wizard`] through its asynchronous transitions: location
/// resolution on the address step, then calculation and submission on the
/// lead step. Each session owns its own wizard, so concurrent sessions share
/// only the read-only catalog, tables and service clients.
pub struct QuoteSession {
    wizard: Wizard,
    resolver: LocationResolver,
    engine: Arc<CalculationEngine>,
    production: Arc<dyn ProductionEstimator>,
    lead_capture: Arc<dyn LeadCapture>,
}

impl QuoteSession {
    pub fn new(
        catalog: Arc<StepCatalog>,
        engine: Arc<CalculationEngine>,
        postcodes: Arc<PostcodeTable>,
        services: &Services,
    ) -> Self {
        Self {
            wizard: Wizard::new(catalog),
            resolver: LocationResolver::new(services.geocoder.clone(), postcodes),
            engine,
            production: services.production.clone(),
            lead_capture: services.lead_capture.clone(),
        }
    }

    pub fn wizard(&self) -> &Wizard {
        &self.wizard
    }

    pub fn resolver(&self) -> &LocationResolver {
        &self.resolver
    }

    pub fn apply(
        &mut self,
        event: FormEvent,
    ) {
        self.wizard.apply(event);
    }

    pub fn select_suggestion(
        &mut self,
        candidate: GeocodeCandidate,
    ) {
        self.wizard.select_suggestion(candidate);
    }

    pub fn retreat(&mut self) -> Result<Transition, WizardError> {
        self.wizard.retreat()
    }

    pub fn jump_to(
        &mut self,
        id: &str,
    ) -> Result<Transition, WizardError> {
        self.wizard.jump_to(id)
    }

    /// Advances, performing whatever collaborator calls the step needs.
    /// Returns the final [`Transition::Moved`], or the error that kept the
    /// wizard on the current step.
    pub async fn advance(&mut self) -> Result<Transition, WizardError> {
        let mut transition = self.wizard.advance()?;
        loop {
            transition = match transition {
                Transition::NeedsLocation(request) => {
                    let outcome = match &request.query {
                        LocationQuery::Postcode(postcode) => {
                            self.resolver.resolve_postcode(postcode).await
                        }
                        LocationQuery::Address { text, selected } => {
                            self.resolver.resolve_address(text, selected.as_ref()).await
                        }
                    };
                    self.wizard.complete_location(request.ticket, outcome)?
                }
                Transition::NeedsReport(ticket) => {
                    let outcome = self
                        .engine
                        .calculate(self.wizard.state(), self.production.as_ref())
                        .await;
                    self.wizard.complete_report(ticket, outcome)?
                }
                Transition::NeedsSubmission(request) => {
                    debug!(fields = request.record.len(), "submitting lead");
                    let outcome = self.lead_capture.submit(&request.record).await;
                    self.wizard.complete_submission(request.ticket, outcome)?
                }
                done @ (Transition::Moved { .. } | Transition::Stale) => return Ok(done),
            };
        }
    }
}
