//! The questionnaire state machine.
//!
//! [`Wizard`] owns the form state and the current step index. It performs
//! no I/O: transitions that need a collaborator return a request carrying a
//! [`Ticket`], and the caller reports the outcome through the matching
//! `complete_*` method. A ticket is honoured only while the wizard is still
//! on the step that issued it and no navigation has happened since, so late
//! responses are discarded instead of applied retroactively.
//!
//! | Current step | `advance()` returns                | Completion                         |
//! |--------------|------------------------------------|------------------------------------|
//! | address      | [`Transition::NeedsLocation`]      | [`Wizard::complete_location`]      |
//! | lead         | [`Transition::NeedsReport`]        | [`Wizard::complete_report`]        |
//! |              | then [`Transition::NeedsSubmission`] | [`Wizard::complete_submission`]  |
//! | results      | moves to thank-you                 |                                    |
//! | thank-you    | [`WizardError::Terminal`]          |                                    |
//! | any other    | [`Transition::Moved`]              |                                    |

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::calculations::CalculationError;
use crate::location::ResolveError;
use crate::models::{
    AddressMode, FormEvent, FormState, ResultReport, ResolvedLocation, StepCatalog, StepDefinition,
    StepKind,
};
use crate::services::{GeocodeCandidate, LeadCaptureError};
use crate::submission::{SubmissionRecord, build_record};
use crate::validation::{ValidationError, validate, validate_lead};

/// Why a transition did not happen. Nothing here is fatal: the wizard stays
/// on the current step with every answer intact.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WizardError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Location(#[from] ResolveError),

    #[error("We couldn't calculate your estimate: {0}")]
    Calculation(#[from] CalculationError),

    #[error("We couldn't send your details. Please try again. ({0})")]
    Submission(#[from] LeadCaptureError),

    #[error("please wait for the current request to finish")]
    Busy,

    #[error("already at the first step")]
    AtStart,

    #[error("the questionnaire is complete")]
    Terminal,

    #[error("unknown step '{0}'")]
    UnknownStep(String),
}

/// Identifies the step visit that issued an asynchronous request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    step: usize,
    epoch: u64,
}

impl Ticket {
    pub fn step(&self) -> usize {
        self.step
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LocationQuery {
    Postcode(String),
    Address {
        text: String,
        selected: Option<GeocodeCandidate>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocationRequest {
    pub ticket: Ticket,
    pub query: LocationQuery,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionRequest {
    pub ticket: Ticket,
    pub record: SubmissionRecord,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Moved { from: usize, to: usize },
    NeedsLocation(LocationRequest),
    NeedsReport(Ticket),
    NeedsSubmission(SubmissionRequest),
    /// The completion arrived for a step visit that is no longer current.
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    Location(Ticket),
    Report(Ticket),
    Submission(Ticket),
}

/// Position for a step-marker progress indicator: markers `1..=total`, with
/// `current` the active one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub current: usize,
    pub total: usize,
}

pub struct Wizard {
    catalog: Arc<StepCatalog>,
    state: FormState,
    current: usize,
    epoch: u64,
    pending: Option<Pending>,
    error: Option<WizardError>,
    report: Option<ResultReport>,
    staged_report: Option<ResultReport>,
    selected_suggestion: Option<GeocodeCandidate>,
}

impl Wizard {
    pub fn new(catalog: Arc<StepCatalog>) -> Self {
        Self {
            catalog,
            state: FormState::new(),
            current: 0,
            epoch: 0,
            pending: None,
            error: None,
            report: None,
            staged_report: None,
            selected_suggestion: None,
        }
    }

    pub fn catalog(&self) -> &StepCatalog {
        &self.catalog
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_step(&self) -> Option<&StepDefinition> {
        self.catalog.get(self.current)
    }

    /// Message to show under the current step, if any.
    pub fn error(&self) -> Option<&WizardError> {
        self.error.as_ref()
    }

    /// The report from the last successful submission.
    pub fn report(&self) -> Option<&ResultReport> {
        self.report.as_ref()
    }

    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    pub fn is_finished(&self) -> bool {
        self.current_step().is_some_and(|s| s.kind == StepKind::ThankYou)
    }

    pub fn selected_suggestion(&self) -> Option<&GeocodeCandidate> {
        self.selected_suggestion.as_ref()
    }

    /// Whether the "next" control should be enabled.
    pub fn can_advance(&self) -> bool {
        if self.pending.is_some() || self.is_finished() {
            return false;
        }
        match self.current_step() {
            Some(step) if step.kind == StepKind::Lead => validate_lead(&self.state).is_ok(),
            Some(step) => validate(step, &self.state).is_ok(),
            None => false,
        }
    }

    /// Progress markers for question steps; `None` on intro, lead, results
    /// and thank-you.
    pub fn progress(&self) -> Option<Progress> {
        self.current_step()
            .filter(|s| s.kind.is_question())
            .map(|_| Progress {
                current: self.current,
                total: self.catalog.visible_step_count(),
            })
    }

    /// Applies an edit and re-checks the current step. A validation
    /// message is cleared once the answer becomes valid; the step index
    /// never changes.
    pub fn apply(
        &mut self,
        event: FormEvent,
    ) {
        let field = event.field().to_string();
        let touches_address = self
            .catalog
            .steps()
            .iter()
            .any(|s| matches!(s.kind, StepKind::Address(_)) && s.id == field);

        let state = std::mem::take(&mut self.state);
        self.state = state.apply(event);

        if touches_address {
            self.state.clear_location();
            if matches!(self.pending, Some(Pending::Location(_))) {
                self.supersede();
            }
            let typed = self.state.text(&field).map(str::trim);
            let stale_selection = self
                .selected_suggestion
                .as_ref()
                .is_some_and(|c| Some(c.display_name.trim()) != typed);
            if stale_selection {
                self.selected_suggestion = None;
            }
        }

        if matches!(self.error, Some(WizardError::Validation(_))) && self.can_advance() {
            self.error = None;
        }
    }

    /// Records an autocomplete choice for a free-text address step and
    /// copies its display name into the field.
    pub fn select_suggestion(
        &mut self,
        candidate: GeocodeCandidate,
    ) {
        let Some(step) = self.current_step() else {
            return;
        };
        if step.kind != StepKind::Address(AddressMode::FreeText) {
            return;
        }
        let field = step.id.clone();
        self.apply(FormEvent::text(field, candidate.display_name.clone()));
        self.selected_suggestion = Some(candidate);
    }

    pub fn advance(&mut self) -> Result<Transition, WizardError> {
        if self.pending.is_some() {
            return Err(WizardError::Busy);
        }
        let step = self
            .current_step()
            .cloned()
            .ok_or(WizardError::Terminal)?;

        match step.kind {
            StepKind::ThankYou => Err(WizardError::Terminal),
            StepKind::Results => {
                let target = self
                    .catalog
                    .steps()
                    .iter()
                    .position(|s| s.kind == StepKind::ThankYou)
                    .ok_or(WizardError::Terminal)?;
                Ok(self.move_to(target))
            }
            StepKind::Lead => {
                self.check(validate_lead(&self.state))?;
                let ticket = self.issue_ticket();
                self.pending = Some(Pending::Report(ticket));
                debug!(step = %step.id, "requesting report");
                Ok(Transition::NeedsReport(ticket))
            }
            StepKind::Address(mode) => {
                self.check(validate(&step, &self.state))?;
                let text = self.state.text(&step.id).unwrap_or_default().trim().to_string();
                let query = match mode {
                    AddressMode::Postcode => LocationQuery::Postcode(text),
                    AddressMode::FreeText => LocationQuery::Address {
                        text,
                        selected: self.selected_suggestion.clone(),
                    },
                };
                let ticket = self.issue_ticket();
                self.pending = Some(Pending::Location(ticket));
                debug!(step = %step.id, "requesting location");
                Ok(Transition::NeedsLocation(LocationRequest { ticket, query }))
            }
            _ => {
                self.check(validate(&step, &self.state))?;
                if self.current + 1 >= self.catalog.len() {
                    return Err(WizardError::Terminal);
                }
                Ok(self.move_to(self.current + 1))
            }
        }
    }

    /// Steps back one step. Any in-flight request is abandoned and its
    /// eventual response will be reported as [`Transition::Stale`].
    pub fn retreat(&mut self) -> Result<Transition, WizardError> {
        if self.is_finished() {
            return Err(WizardError::Terminal);
        }
        if self.current == 0 {
            return Err(WizardError::AtStart);
        }
        Ok(self.move_to(self.current - 1))
    }

    pub fn jump_to(
        &mut self,
        id: &str,
    ) -> Result<Transition, WizardError> {
        if self.is_finished() {
            return Err(WizardError::Terminal);
        }
        let target = self
            .catalog
            .position(id)
            .ok_or_else(|| WizardError::UnknownStep(id.to_string()))?;
        Ok(self.move_to(target))
    }

    pub fn complete_location(
        &mut self,
        ticket: Ticket,
        outcome: Result<ResolvedLocation, ResolveError>,
    ) -> Result<Transition, WizardError> {
        if !self.is_current(Pending::Location(ticket)) {
            debug!(?ticket, "discarding stale location response");
            return Ok(Transition::Stale);
        }
        self.pending = None;

        match outcome {
            Ok(location) => {
                info!(postcode = %location.postcode, "location resolved");
                self.state.set_location(location);
                self.error = None;
                Ok(self.move_to(self.current + 1))
            }
            Err(e) => Err(self.fail(e.into())),
        }
    }

    pub fn complete_report(
        &mut self,
        ticket: Ticket,
        outcome: Result<ResultReport, CalculationError>,
    ) -> Result<Transition, WizardError> {
        if !self.is_current(Pending::Report(ticket)) {
            debug!(?ticket, "discarding stale report");
            return Ok(Transition::Stale);
        }

        match outcome {
            Ok(report) => {
                let record = build_record(&self.state, &report);
                self.staged_report = Some(report);
                self.pending = Some(Pending::Submission(ticket));
                Ok(Transition::NeedsSubmission(SubmissionRequest { ticket, record }))
            }
            Err(e) => {
                self.pending = None;
                Err(self.fail(e.into()))
            }
        }
    }

    /// On success the staged report becomes the visible one and the wizard
    /// jumps to results. On failure the staged report is discarded, so a
    /// retry recalculates before submitting again.
    pub fn complete_submission(
        &mut self,
        ticket: Ticket,
        outcome: Result<(), LeadCaptureError>,
    ) -> Result<Transition, WizardError> {
        if !self.is_current(Pending::Submission(ticket)) {
            debug!(?ticket, "discarding stale submission result");
            return Ok(Transition::Stale);
        }
        self.pending = None;
        let staged = self.staged_report.take();

        match (outcome, staged) {
            (Ok(()), Some(report)) => {
                self.report = Some(report);
                self.error = None;
                let target = self
                    .catalog
                    .steps()
                    .iter()
                    .position(|s| s.kind == StepKind::Results)
                    .unwrap_or(self.current + 1);
                Ok(self.move_to(target))
            }
            (Ok(()), None) => Ok(Transition::Stale),
            (Err(e), _) => Err(self.fail(e.into())),
        }
    }

    fn issue_ticket(&mut self) -> Ticket {
        self.epoch += 1;
        Ticket {
            step: self.current,
            epoch: self.epoch,
        }
    }

    fn is_current(
        &self,
        expected: Pending,
    ) -> bool {
        self.pending == Some(expected)
    }

    fn check(
        &mut self,
        result: Result<(), ValidationError>,
    ) -> Result<(), WizardError> {
        result.map_err(|e| self.fail(e.into()))
    }

    fn fail(
        &mut self,
        error: WizardError,
    ) -> WizardError {
        warn!(step = self.current, error = %error, "transition blocked");
        self.error = Some(error.clone());
        error
    }

    /// Invalidates outstanding tickets without moving.
    fn supersede(&mut self) {
        self.epoch += 1;
        self.pending = None;
        self.staged_report = None;
    }

    fn move_to(
        &mut self,
        target: usize,
    ) -> Transition {
        let from = self.current;
        self.supersede();
        self.error = None;
        self.current = target;
        debug!(from, to = target, "moved");
        Transition::Moved { from, to: target }
    }
}
