//! Per-step answer checks.
//!
//! Validation is pure: it reads the form state and never changes it. The
//! wizard runs [`validate`] after every edit so the frontend can enable or
//! disable its "next" control, and again before each forward transition.
//!
//! | Step kind           | Rule                                                   |
//! |---------------------|--------------------------------------------------------|
//! | intro, results, thankyou, lead | always valid (lead uses [`validate_lead`])  |
//! | address (postcode)  | exactly four digits                                    |
//! | address (free text) | non-blank                                              |
//! | text, radio, select | non-blank                                              |
//! | customEnergyInput   | 0 < bill amount ≤ [`MAX_BILL_AMOUNT`], known frequency |
//! | checkbox, multi     | at least one option                                    |
//! | checkbox, single    | checked                                                |
//!
//! An optional step with no answer yet is valid.

use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use thiserror::Error;

use crate::models::{AddressMode, BillingFrequency, FormState, StepDefinition, StepKind, fields};

static POSTCODE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{4}$").expect("postcode pattern compiles"));

/// Largest bill amount accepted for any billing period.
pub const MAX_BILL_AMOUNT: Decimal = dec!(1000000);

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

/// User-correctable problem with the current step's answer. The display
/// text is the inline message shown under the step.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter a valid 4-digit postcode.")]
    InvalidPostcode,

    #[error("Please enter your address.")]
    MissingAddress,

    #[error("Please answer this question to continue.")]
    Required,

    #[error("Please select at least one option.")]
    NothingSelected,

    #[error("Please tick the box to continue.")]
    NotChecked,

    #[error("Please enter a bill amount greater than zero.")]
    InvalidBillAmount,

    #[error("Please enter a bill amount of $1,000,000 or less.")]
    BillAmountTooLarge,

    #[error("Please choose how often you receive your bill.")]
    MissingBillFrequency,

    #[error("Please enter a valid email address.")]
    InvalidEmail,

    #[error("Please agree to be contacted so we can send your quote.")]
    ConsentRequired,
}

pub fn is_postcode(value: &str) -> bool {
    POSTCODE_PATTERN.is_match(value.trim())
}

pub fn is_email(value: &str) -> bool {
    EMAIL_PATTERN.is_match(value.trim())
}

/// Checks `step`'s answer in `state`.
pub fn validate(
    step: &StepDefinition,
    state: &FormState,
) -> Result<(), ValidationError> {
    if matches!(
        step.kind,
        StepKind::Intro | StepKind::Lead | StepKind::Results | StepKind::ThankYou
    ) {
        return Ok(());
    }
    if step.optional && !has_answer(step, state) {
        return Ok(());
    }

    match step.kind {
        StepKind::Address(AddressMode::Postcode) => {
            let value = state.text(&step.id).unwrap_or_default();
            if is_postcode(value) {
                Ok(())
            } else {
                Err(ValidationError::InvalidPostcode)
            }
        }
        StepKind::Address(AddressMode::FreeText) => {
            if state.has(&step.id) {
                Ok(())
            } else {
                Err(ValidationError::MissingAddress)
            }
        }
        StepKind::Text | StepKind::Radio | StepKind::Select => {
            if state.has(&step.id) {
                Ok(())
            } else {
                Err(ValidationError::Required)
            }
        }
        StepKind::Checkbox if step.multi_select => {
            if state.list(&step.id).is_some_and(|items| !items.is_empty()) {
                Ok(())
            } else {
                Err(ValidationError::NothingSelected)
            }
        }
        StepKind::Checkbox => {
            if state.flag(&step.id) == Some(true) {
                Ok(())
            } else {
                Err(ValidationError::NotChecked)
            }
        }
        StepKind::CustomEnergyInput => validate_energy_usage(state),
        StepKind::Intro | StepKind::Lead | StepKind::Results | StepKind::ThankYou => Ok(()),
    }
}

pub fn is_valid(
    step: &StepDefinition,
    state: &FormState,
) -> bool {
    validate(step, state).is_ok()
}

/// Contact details gate: a well-formed email and explicit consent.
pub fn validate_lead(state: &FormState) -> Result<(), ValidationError> {
    let email = state.text(fields::EMAIL_ADDRESS).unwrap_or_default();
    if !is_email(email) {
        return Err(ValidationError::InvalidEmail);
    }
    if state.flag(fields::CONSENT) != Some(true) {
        return Err(ValidationError::ConsentRequired);
    }
    Ok(())
}

fn validate_energy_usage(state: &FormState) -> Result<(), ValidationError> {
    match state.number(fields::BILL_AMOUNT) {
        Some(amount) if amount > MAX_BILL_AMOUNT => {
            return Err(ValidationError::BillAmountTooLarge);
        }
        Some(amount) if amount > Decimal::ZERO => {}
        _ => return Err(ValidationError::InvalidBillAmount),
    }
    if state
        .text(fields::BILL_FREQUENCY)
        .and_then(BillingFrequency::parse)
        .is_none()
    {
        return Err(ValidationError::MissingBillFrequency);
    }
    Ok(())
}

fn has_answer(
    step: &StepDefinition,
    state: &FormState,
) -> bool {
    match step.kind {
        StepKind::CustomEnergyInput => {
            state.has(fields::BILL_AMOUNT) || state.has(fields::BILL_FREQUENCY)
        }
        _ => state.has(&step.id),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::{FormEvent, StepCatalog};

    fn step(id: &str) -> StepDefinition {
        StepCatalog::solar_quote().by_id(id).cloned().unwrap()
    }

    // =========================================================================
    // Patterns
    // =========================================================================

    #[test]
    fn postcode_pattern() {
        assert!(is_postcode("2000"));
        assert!(is_postcode(" 0800 "));
        assert!(!is_postcode("200"));
        assert!(!is_postcode("20000"));
        assert!(!is_postcode("20a0"));
        assert!(!is_postcode("٢٠٠٠"));
        assert!(!is_postcode("２０００"));
        assert!(!is_postcode(""));
    }

    #[test]
    fn email_pattern() {
        assert!(is_email("sam@example.com"));
        assert!(is_email("a.b@c.io"));
        assert!(!is_email("sam@example"));
        assert!(!is_email("sam example@x.com"));
        assert!(!is_email("@example.com"));
        assert!(!is_email(""));
    }

    // =========================================================================
    // Dispatch by step kind
    // =========================================================================

    #[test]
    fn non_question_steps_are_always_valid() {
        let state = FormState::new();

        for id in ["intro", fields::LEAD, fields::RESULTS, fields::THANK_YOU] {
            assert_eq!(validate(&step(id), &state), Ok(()), "{id}");
        }
    }

    #[test]
    fn postcode_step() {
        let postcode = step(fields::POSTCODE);

        assert_eq!(
            validate(&postcode, &FormState::new()),
            Err(ValidationError::InvalidPostcode)
        );
        assert_eq!(
            validate(&postcode, &FormState::new().apply(FormEvent::text(fields::POSTCODE, "123"))),
            Err(ValidationError::InvalidPostcode)
        );
        assert!(is_valid(
            &postcode,
            &FormState::new().apply(FormEvent::text(fields::POSTCODE, "2000"))
        ));
    }

    #[test]
    fn free_text_address_needs_non_blank_text() {
        let address = StepDefinition::new("address", StepKind::Address(AddressMode::FreeText));

        assert_eq!(
            validate(&address, &FormState::new().apply(FormEvent::text("address", "   "))),
            Err(ValidationError::MissingAddress)
        );
        assert!(is_valid(
            &address,
            &FormState::new().apply(FormEvent::text("address", "1 George St"))
        ));
    }

    #[test]
    fn radio_requires_selection() {
        let ownership = step(fields::OWNERSHIP);

        assert_eq!(
            validate(&ownership, &FormState::new()),
            Err(ValidationError::Required)
        );
        assert!(is_valid(
            &ownership,
            &FormState::new().apply(FormEvent::text(fields::OWNERSHIP, "yes"))
        ));
    }

    #[test]
    fn optional_radio_without_answer_is_valid() {
        assert!(is_valid(&step(fields::ROOF_PITCH), &FormState::new()));
    }

    #[test]
    fn multi_select_requires_one_option() {
        let usage = step(fields::FUTURE_USAGE);
        let cleared = FormState::new()
            .apply(FormEvent::toggle(fields::FUTURE_USAGE, "ev_charger", true))
            .apply(FormEvent::toggle(fields::FUTURE_USAGE, "ev_charger", false));

        assert_eq!(validate(&usage, &cleared), Err(ValidationError::NothingSelected));
        assert!(is_valid(
            &usage,
            &FormState::new().apply(FormEvent::toggle(fields::FUTURE_USAGE, "none", true))
        ));
    }

    #[test]
    fn single_checkbox_requires_true() {
        let consent = StepDefinition::new(fields::CONSENT, StepKind::Checkbox);

        assert_eq!(
            validate(&consent, &FormState::new().apply(FormEvent::flag(fields::CONSENT, false))),
            Err(ValidationError::NotChecked)
        );
        assert!(is_valid(
            &consent,
            &FormState::new().apply(FormEvent::flag(fields::CONSENT, true))
        ));
    }

    #[test]
    fn energy_usage_rules() {
        let usage = step(fields::ENERGY_USAGE);
        let base = FormState::new().apply(FormEvent::text(fields::BILL_FREQUENCY, "monthly"));

        assert_eq!(
            validate(&usage, &base),
            Err(ValidationError::InvalidBillAmount)
        );
        assert_eq!(
            validate(&usage, &base.clone().apply(FormEvent::number(fields::BILL_AMOUNT, dec!(0)))),
            Err(ValidationError::InvalidBillAmount)
        );
        assert_eq!(
            validate(
                &usage,
                &FormState::new().apply(FormEvent::text(fields::BILL_AMOUNT, "$1,200"))
            ),
            Err(ValidationError::MissingBillFrequency)
        );
        assert_eq!(
            validate(
                &usage,
                &base
                    .clone()
                    .apply(FormEvent::text(fields::BILL_AMOUNT, "300"))
                    .apply(FormEvent::text(fields::BILL_FREQUENCY, "weekly"))
            ),
            Err(ValidationError::MissingBillFrequency)
        );
        assert!(is_valid(
            &usage,
            &base.apply(FormEvent::text(fields::BILL_AMOUNT, "300"))
        ));
    }

    #[test]
    fn bill_amount_is_capped() {
        let usage = step(fields::ENERGY_USAGE);
        let monthly = FormState::new().apply(FormEvent::text(fields::BILL_FREQUENCY, "monthly"));

        assert_eq!(
            validate(
                &usage,
                &monthly
                    .clone()
                    .apply(FormEvent::text(fields::BILL_AMOUNT, "10000000000000000000000000000"))
            ),
            Err(ValidationError::BillAmountTooLarge)
        );
        assert_eq!(
            validate(
                &usage,
                &monthly
                    .clone()
                    .apply(FormEvent::number(fields::BILL_AMOUNT, MAX_BILL_AMOUNT + dec!(0.01)))
            ),
            Err(ValidationError::BillAmountTooLarge)
        );
        assert!(is_valid(
            &usage,
            &monthly.apply(FormEvent::number(fields::BILL_AMOUNT, MAX_BILL_AMOUNT))
        ));
    }

    #[test]
    fn energy_price_never_blocks() {
        let usage = step(fields::ENERGY_USAGE);
        let state = FormState::new()
            .apply(FormEvent::text(fields::BILL_AMOUNT, "300"))
            .apply(FormEvent::text(fields::BILL_FREQUENCY, "quarterly"))
            .apply(FormEvent::text(fields::ENERGY_PRICE, "not a number"));

        assert!(is_valid(&usage, &state));
    }

    // =========================================================================
    // Lead gate
    // =========================================================================

    #[test]
    fn lead_requires_email_and_consent() {
        let email_only =
            FormState::new().apply(FormEvent::text(fields::EMAIL_ADDRESS, "sam@example.com"));

        assert_eq!(
            validate_lead(&FormState::new()),
            Err(ValidationError::InvalidEmail)
        );
        assert_eq!(validate_lead(&email_only), Err(ValidationError::ConsentRequired));
        assert_eq!(
            validate_lead(&email_only.apply(FormEvent::flag(fields::CONSENT, true))),
            Ok(())
        );
    }
}
