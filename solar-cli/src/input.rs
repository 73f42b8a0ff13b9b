//! Turns typed lines into wizard commands and form events.
//!
//! | Input       | Meaning                                         |
//! |-------------|-------------------------------------------------|
//! | *(empty)*   | continue with the current answer                |
//! | `-`         | clear the current value of a multi-part prompt  |
//! | `:back`     | previous step                                   |
//! | `:summary`  | list the answers given so far                   |
//! | `:help`     | show this table                                 |
//! | `:quit`     | leave without submitting                        |
//! | `?text`     | look up address suggestions (address step only) |
//! | `#n`        | use suggestion `n`                              |
//! | anything else | the answer to the current question            |

use solar_core::{FormEvent, FormState, StepDefinition, StepKind, fields};
use thiserror::Error;

use crate::utils::{parse_decimal, parse_yes_no};

/// Typed at a multi-part prompt to clear that value.
pub const CLEAR: &str = "-";

pub const HELP: &str = "\
  <enter>    continue, keeping the shown answer
  -          clear the shown answer
  :back      previous step
  :summary   answers so far
  :quit      leave without submitting
  ?text      search for an address
  #n         use suggestion n";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Continue,
    Back,
    Summary,
    Help,
    Quit,
    Suggest(String),
    Pick(usize),
    Answer(String),
}

pub fn parse_command(line: &str) -> Command {
    let line = line.trim();
    match line {
        "" => Command::Continue,
        ":b" | ":back" => Command::Back,
        ":s" | ":summary" => Command::Summary,
        ":h" | ":help" => Command::Help,
        ":q" | ":quit" => Command::Quit,
        _ => {
            if let Some(query) = line.strip_prefix('?') {
                return Command::Suggest(query.trim().to_string());
            }
            if let Some(n) = line.strip_prefix('#').and_then(|n| n.trim().parse().ok()) {
                return Command::Pick(n);
            }
            Command::Answer(line.to_string())
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("'{0}' is not one of the listed options.")]
    UnknownOption(String),

    #[error("Please answer yes or no.")]
    NotYesNo,

    #[error("There is no suggestion {0}.")]
    NoSuchSuggestion(usize),
}

/// How one prompt of a multi-part step is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Text,
    Amount,
    /// One of the step's options.
    Choice,
    YesNo,
}

/// One prompt of a step that collects several values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prompt {
    pub field: &'static str,
    pub label: &'static str,
    pub kind: PromptKind,
}

const fn prompt(
    field: &'static str,
    label: &'static str,
    kind: PromptKind,
) -> Prompt {
    Prompt { field, label, kind }
}

/// The prompts for steps that store more than one value. Other steps take
/// a single answer keyed by the step id.
pub fn prompts_for(kind: StepKind) -> &'static [Prompt] {
    const ENERGY: [Prompt; 3] = [
        prompt(fields::BILL_AMOUNT, "Bill amount ($)", PromptKind::Amount),
        prompt(fields::BILL_FREQUENCY, "Billing frequency", PromptKind::Choice),
        prompt(
            fields::ENERGY_PRICE,
            "Price per kWh (optional, e.g. 0.32)",
            PromptKind::Amount,
        ),
    ];
    const LEAD: [Prompt; 4] = [
        prompt(fields::FIRST_NAME, "First name (optional)", PromptKind::Text),
        prompt(fields::EMAIL_ADDRESS, "Email address", PromptKind::Text),
        prompt(fields::PHONE_NUMBER, "Phone (optional)", PromptKind::Text),
        prompt(
            fields::CONSENT,
            "May we contact you with your quote? (y/n)",
            PromptKind::YesNo,
        ),
    ];

    match kind {
        StepKind::CustomEnergyInput => &ENERGY,
        StepKind::Lead => &LEAD,
        _ => &[],
    }
}

/// Reads one prompt's answer. A blank line keeps the current value
/// (`None`); [`CLEAR`] removes it.
pub fn prompt_event(
    prompt: &Prompt,
    step: &StepDefinition,
    text: &str,
) -> Result<Option<FormEvent>, InputError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    if text == CLEAR {
        return Ok(Some(FormEvent::Clear {
            field: prompt.field.to_string(),
        }));
    }

    let event = match prompt.kind {
        PromptKind::Text => FormEvent::text(prompt.field, text),
        // unparseable amounts are stored as typed so validation can report them
        PromptKind::Amount => match parse_decimal(text) {
            Ok(Some(value)) => FormEvent::number(prompt.field, value),
            _ => FormEvent::text(prompt.field, text),
        },
        PromptKind::Choice => FormEvent::text(prompt.field, choose(step, text)?),
        PromptKind::YesNo => parse_yes_no(text)
            .map(|value| FormEvent::flag(prompt.field, value))
            .ok_or(InputError::NotYesNo)?,
    };
    Ok(Some(event))
}

/// Events for a single-answer step.
///
/// Radio and select steps accept an option number, value or label.
/// Multi-select checkboxes take a list of options separated by spaces or
/// commas; each listed option is toggled.
pub fn answer_events(
    step: &StepDefinition,
    state: &FormState,
    text: &str,
) -> Result<Vec<FormEvent>, InputError> {
    let text = text.trim();
    match step.kind {
        StepKind::Radio | StepKind::Select => {
            Ok(vec![FormEvent::text(&step.id, choose(step, text)?)])
        }
        StepKind::Checkbox if step.multi_select => {
            let current = state.list(&step.id).unwrap_or(&[]);
            let mut events = Vec::new();
            let mut toggled: Vec<&str> = Vec::new();
            for token in text
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|t| !t.is_empty())
            {
                let value = choose(step, token)?;
                let was_selected =
                    current.iter().any(|v| v == value) ^ toggled.contains(&value);
                toggled.push(value);
                events.push(FormEvent::toggle(&step.id, value, !was_selected));
            }
            Ok(events)
        }
        StepKind::Checkbox => parse_yes_no(text)
            .map(|value| vec![FormEvent::flag(&step.id, value)])
            .ok_or(InputError::NotYesNo),
        _ => Ok(vec![FormEvent::text(&step.id, text)]),
    }
}

fn choose<'a>(
    step: &'a StepDefinition,
    text: &str,
) -> Result<&'a str, InputError> {
    let text = text.trim();
    let by_number = text
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| step.options.get(i));

    by_number
        .or_else(|| {
            step.options.iter().find(|o| {
                o.value.eq_ignore_ascii_case(text) || o.label.eq_ignore_ascii_case(text)
            })
        })
        .map(|o| o.value.as_str())
        .ok_or_else(|| InputError::UnknownOption(text.to_string()))
}
