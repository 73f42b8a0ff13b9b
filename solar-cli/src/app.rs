//! Startup wiring and the interactive loop.

use std::io::BufRead;
use std::sync::Arc;

use anyhow::{Context, Result};
use solar_core::services::memory::MemoryServiceFactory;
use solar_core::services::{GeocodeCandidate, ServiceRegistry, Services};
use solar_core::suggestions::{SuggestionDebouncer, SuggestionUpdate};
use solar_core::{
    AddressMode, CalculationEngine, FormValue, QuoteSession, StepCatalog, StepDefinition, StepKind,
};
use solar_http::HttpServiceFactory;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info, warn};

use crate::input::{
    Command, HELP, InputError, Prompt, answer_events, parse_command, prompt_event, prompts_for,
};
use crate::render::Renderer;
use crate::settings::Settings;

/// Every backend this binary can talk to.
pub fn build_registry() -> ServiceRegistry {
    let mut registry = ServiceRegistry::new();
    registry.register(Box::new(HttpServiceFactory));
    registry.register(Box::new(MemoryServiceFactory));
    registry
}

/// Loads reference tables, creates the configured services and returns a
/// fresh session.
pub async fn build_session(
    settings: &Settings,
    registry: &ServiceRegistry,
) -> Result<QuoteSession> {
    let data = solar_data::load_reference_data(
        settings.data.incentives.as_deref(),
        settings.data.postcodes.as_deref(),
    )
    .context("Failed to load reference tables")?;
    info!(
        postcodes = data.postcodes.len(),
        jurisdictions = data.incentives.len(),
        "reference data loaded"
    );

    let services: Services = registry
        .create(&settings.services)
        .await
        .with_context(|| format!("Failed to create '{}' services", settings.services.backend))?;

    let engine = CalculationEngine::new(settings.calculation.clone(), Arc::new(data.incentives))
        .context("Invalid calculation settings")?;

    let mode: AddressMode = settings.wizard.address_mode.into();
    let catalog = StepCatalog::solar_quote().with_address_mode(mode);

    Ok(QuoteSession::new(
        Arc::new(catalog),
        Arc::new(engine),
        Arc::new(data.postcodes),
        &services,
    ))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The lead was submitted and the thank-you step reached.
    Submitted,
    /// The customer quit or input ended first.
    Abandoned,
}

enum Flow {
    Stay,
    Quit,
}

/// Line-oriented frontend over a [`QuoteSession`].
pub struct Terminal<R, V> {
    input: R,
    view: V,
    suggestions: Vec<GeocodeCandidate>,
}

impl<R: BufRead, V: Renderer> Terminal<R, V> {
    pub fn new(
        input: R,
        view: V,
    ) -> Self {
        Self {
            input,
            view,
            suggestions: Vec::new(),
        }
    }

    pub fn into_view(self) -> V {
        self.view
    }

    /// Runs until the thank-you step, `:quit`, or end of input.
    pub async fn run(
        &mut self,
        session: &mut QuoteSession,
    ) -> Result<Outcome> {
        let (mut debouncer, mut updates) =
            SuggestionDebouncer::new(session.resolver().geocoder().clone());

        loop {
            self.view.step(session.wizard())?;
            let Some(step) = session.wizard().current_step().cloned() else {
                return Ok(Outcome::Abandoned);
            };
            if step.kind == StepKind::ThankYou {
                return Ok(Outcome::Submitted);
            }

            let prompts = prompts_for(step.kind);
            let flow = if prompts.is_empty() {
                self.single_answer(session, &step, &mut debouncer, &mut updates)
                    .await?
            } else {
                self.multi_part(session, &step, prompts).await?
            };
            if let Flow::Quit = flow {
                info!(step = %step.id, "session abandoned");
                return Ok(Outcome::Abandoned);
            }
        }
    }

    async fn single_answer(
        &mut self,
        session: &mut QuoteSession,
        step: &StepDefinition,
        debouncer: &mut SuggestionDebouncer,
        updates: &mut UnboundedReceiver<SuggestionUpdate>,
    ) -> Result<Flow> {
        loop {
            self.view.prompt("")?;
            let Some(line) = self.read_line()? else {
                return Ok(Flow::Quit);
            };

            match parse_command(&line) {
                Command::Quit => return Ok(Flow::Quit),
                Command::Help => self.view.notice(HELP)?,
                Command::Summary => self.view.summary(session.wizard())?,
                Command::Back => {
                    self.back(session)?;
                    return Ok(Flow::Stay);
                }
                Command::Continue => {
                    self.advance(session).await?;
                    return Ok(Flow::Stay);
                }
                Command::Suggest(_) | Command::Pick(_) if !is_free_text(step) => {
                    self.view
                        .notice("Address search is only available on the address step.")?;
                }
                Command::Suggest(query) => self.suggest(&query, debouncer, updates).await?,
                Command::Pick(n) => {
                    let picked = n.checked_sub(1).and_then(|i| self.suggestions.get(i)).cloned();
                    match picked {
                        Some(candidate) => {
                            session.select_suggestion(candidate);
                            self.advance(session).await?;
                            return Ok(Flow::Stay);
                        }
                        None => self
                            .view
                            .notice(&InputError::NoSuchSuggestion(n).to_string())?,
                    }
                }
                Command::Answer(_) if !step.kind.is_question() => {
                    self.advance(session).await?;
                    return Ok(Flow::Stay);
                }
                Command::Answer(text) => {
                    match answer_events(step, session.wizard().state(), &text) {
                        Ok(events) => {
                            for event in events {
                                session.apply(event);
                            }
                            self.advance(session).await?;
                            return Ok(Flow::Stay);
                        }
                        Err(err) => self.view.notice(&err.to_string())?,
                    }
                }
            }
        }
    }

    async fn multi_part(
        &mut self,
        session: &mut QuoteSession,
        step: &StepDefinition,
        prompts: &[Prompt],
    ) -> Result<Flow> {
        let mut index = 0;
        while let Some(prompt) = prompts.get(index) {
            let label = match current_value(session, prompt.field) {
                Some(current) => format!("{} [{current}]", prompt.label),
                None => prompt.label.to_string(),
            };
            self.view.prompt(&label)?;
            let Some(line) = self.read_line()? else {
                return Ok(Flow::Quit);
            };

            match parse_command(&line) {
                Command::Quit => return Ok(Flow::Quit),
                Command::Help => self.view.notice(HELP)?,
                Command::Summary => self.view.summary(session.wizard())?,
                Command::Back => {
                    self.back(session)?;
                    return Ok(Flow::Stay);
                }
                _ => match prompt_event(prompt, step, &line) {
                    Ok(event) => {
                        if let Some(event) = event {
                            session.apply(event);
                        }
                        index += 1;
                    }
                    Err(err) => self.view.notice(&err.to_string())?,
                },
            }
        }

        self.advance(session).await?;
        Ok(Flow::Stay)
    }

    async fn advance(
        &mut self,
        session: &mut QuoteSession,
    ) -> Result<()> {
        if let Err(err) = session.advance().await {
            debug!(error = %err, "advance refused");
            // errors the wizard keeps are shown with the step
            if session.wizard().error().is_none() {
                self.view.notice(&err.to_string())?;
            }
        }
        self.suggestions.clear();
        Ok(())
    }

    fn back(
        &mut self,
        session: &mut QuoteSession,
    ) -> Result<()> {
        if let Err(err) = session.retreat() {
            self.view.notice(&err.to_string())?;
        }
        self.suggestions.clear();
        Ok(())
    }

    async fn suggest(
        &mut self,
        query: &str,
        debouncer: &mut SuggestionDebouncer,
        updates: &mut UnboundedReceiver<SuggestionUpdate>,
    ) -> Result<()> {
        debouncer.input(query);
        match updates.recv().await {
            Some(SuggestionUpdate::Results { candidates, .. }) => {
                self.view.suggestions(&candidates)?;
                self.suggestions = candidates;
            }
            Some(SuggestionUpdate::Failed { error, .. }) => {
                warn!(%error, "suggestion lookup failed");
                self.view.notice("Address search is unavailable right now.")?;
            }
            Some(SuggestionUpdate::Cleared) => {
                self.suggestions.clear();
                self.view.notice("Type at least 4 characters to search.")?;
            }
            None => {}
        }
        Ok(())
    }

    fn read_line(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .context("Failed to read input")?;
        Ok((read > 0).then_some(line))
    }
}

fn is_free_text(step: &StepDefinition) -> bool {
    step.kind == StepKind::Address(AddressMode::FreeText)
}

fn current_value(
    session: &QuoteSession,
    field: &str,
) -> Option<String> {
    let value = session.wizard().state().get(field)?;
    let shown = match value {
        FormValue::Text(text) => text.clone(),
        FormValue::Number(number) => number.normalize().to_string(),
        FormValue::Flag(flag) => (if *flag { "y" } else { "n" }).to_string(),
        FormValue::List(values) => values.join(", "),
    };
    (!value.is_empty()).then_some(shown)
}
