//! The ordered questionnaire.
//!
//! The catalog is built once and shared read-only by every session. Step ids
//! double as form-state keys; the few answers that live under other keys
//! (energy usage sub-fields, lead contact fields) are named in [`fields`].

use std::collections::HashSet;

use thiserror::Error;

use super::{AddressMode, StepDefinition, StepKind};

/// Form-state keys read by the calculation and submission stages.
pub mod fields {
    pub const POSTCODE: &str = "postcode";
    /// Step id used when the location step takes a free-text address.
    pub const ADDRESS: &str = "address";
    pub const OWNERSHIP: &str = "ownership";
    pub const PROPERTY_TYPE: &str = "propertyType";
    pub const ENERGY_USAGE: &str = "energyUsage";
    pub const BILL_AMOUNT: &str = "billAmount";
    pub const BILL_FREQUENCY: &str = "billFrequency";
    pub const ENERGY_PRICE: &str = "energyPrice";
    pub const BATTERY_INTEREST: &str = "batteryInterest";
    pub const FUTURE_USAGE: &str = "futureUsage";
    pub const ROOF_ORIENTATION: &str = "roofOrientation";
    pub const ROOF_PITCH: &str = "roofPitch";
    pub const LEAD: &str = "lead";
    pub const FIRST_NAME: &str = "firstName";
    pub const EMAIL_ADDRESS: &str = "emailAddress";
    pub const PHONE_NUMBER: &str = "phoneNumber";
    pub const CONSENT: &str = "consent";
    pub const RESULTS: &str = "results";
    pub const THANK_YOU: &str = "thankyou";

    /// Exclusive "none of the above" option value for multi-select steps.
    pub const NONE_OPTION: &str = "none";
    /// `propertyType` value that selects business rebates.
    pub const BUSINESS_PROPERTY: &str = "business";
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("catalog has no steps")]
    Empty,

    #[error("duplicate step id '{0}'")]
    DuplicateId(String),

    #[error("step '{0}' sets multi_select but is not a checkbox")]
    MultiSelectOnNonCheckbox(String),
}

/// Immutable, validated list of [`StepDefinition`]s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepCatalog {
    steps: Vec<StepDefinition>,
}

impl StepCatalog {
    pub fn new(steps: Vec<StepDefinition>) -> Result<Self, CatalogError> {
        if steps.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut seen = HashSet::new();
        for step in &steps {
            if !seen.insert(step.id.as_str()) {
                return Err(CatalogError::DuplicateId(step.id.clone()));
            }
            if step.multi_select && step.kind != StepKind::Checkbox {
                return Err(CatalogError::MultiSelectOnNonCheckbox(step.id.clone()));
            }
        }

        Ok(Self { steps })
    }

    pub fn steps(&self) -> &[StepDefinition] {
        &self.steps
    }

    pub fn get(
        &self,
        index: usize,
    ) -> Option<&StepDefinition> {
        self.steps.get(index)
    }

    pub fn by_id(
        &self,
        id: &str,
    ) -> Option<&StepDefinition> {
        self.steps.iter().find(|s| s.id == id)
    }

    pub fn position(
        &self,
        id: &str,
    ) -> Option<usize> {
        self.steps.iter().position(|s| s.id == id)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Number of markers in the progress indicator: the index of the first
    /// `lead` step, or the catalog length when there is none.
    pub fn visible_step_count(&self) -> usize {
        self.steps
            .iter()
            .position(|s| s.kind == StepKind::Lead)
            .unwrap_or(self.steps.len())
    }

    /// The residential solar quote questionnaire.
    pub fn solar_quote() -> Self {
        let steps = vec![
            StepDefinition::new("intro", StepKind::Intro)
                .title("Calculate Your Solar Potential in 60 Seconds")
                .question(
                    "Find out how much you could save with solar. It's quick, personalised, \
                     and completely free with no obligation.",
                ),
            StepDefinition::new(fields::POSTCODE, StepKind::Address(AddressMode::Postcode))
                .title("Step 1: Location")
                .question("What's your postcode?")
                .hint("We use this to find your location for accurate solar and rebate calculations."),
            StepDefinition::new(fields::OWNERSHIP, StepKind::Radio)
                .title("Step 2: Ownership")
                .question("Do you own this property?")
                .options([("Yes", "yes"), ("No", "no"), ("Not sure", "not_sure")])
                .hint("Most solar systems are installed on owner-occupied buildings."),
            StepDefinition::new(fields::PROPERTY_TYPE, StepKind::Radio)
                .title("Step 3: Property Type")
                .question("What kind of property is it?")
                .options([
                    ("House", "house"),
                    ("Apartment", "apartment"),
                    ("Business / Commercial", fields::BUSINESS_PROPERTY),
                    ("Farm / Other", "farm_other"),
                ])
                .hint("Business properties may qualify for different rebates."),
            StepDefinition::new(fields::ENERGY_USAGE, StepKind::CustomEnergyInput)
                .title("Step 4: Electricity Bill")
                .question("How much is your electricity bill, and how often do you pay it?")
                .options([
                    ("Monthly", "monthly"),
                    ("Every two months", "bimonthly"),
                    ("Quarterly", "quarterly"),
                ])
                .hint("Add your price per kWh if you know it. Otherwise we use your state's average."),
            StepDefinition::new(fields::BATTERY_INTEREST, StepKind::Radio)
                .title("Step 5: Battery Interest")
                .question("Are you interested in battery storage?")
                .options([("Yes", "yes"), ("Maybe", "maybe"), ("No", "no")])
                .hint("Battery systems can increase savings and protect against blackouts."),
            StepDefinition::new(fields::FUTURE_USAGE, StepKind::Checkbox)
                .title("Step 6: Future Usage")
                .question("Are you planning to install any of the following?")
                .options([
                    ("EV charger", "ev_charger"),
                    ("Pool heating", "pool_heating"),
                    ("Air conditioning", "air_conditioning"),
                    ("Heat pump", "heat_pump"),
                    ("None of the above", fields::NONE_OPTION),
                ])
                .multi_select(),
            StepDefinition::new(fields::ROOF_ORIENTATION, StepKind::Radio)
                .title("Step 7: Roof Direction")
                .question("Which direction does your roof mainly face?")
                .options([
                    ("North", "north"),
                    ("East", "east"),
                    ("West", "west"),
                    ("South", "south"),
                    ("Mixed / Not sure", "mixed_not_sure"),
                ]),
            StepDefinition::new(fields::ROOF_PITCH, StepKind::Radio)
                .title("Step 8: Roof Pitch")
                .question("What's your roof angle?")
                .options([
                    ("Flat", "flat"),
                    ("Slight (0-15°)", "slight_0_15"),
                    ("Standard (15-30°)", "standard_15_30"),
                    ("Steep (30°+)", "steep_30_plus"),
                    ("Not sure", "not_sure"),
                ])
                .optional(),
            StepDefinition::new(fields::LEAD, StepKind::Lead)
                .title("Your Results Are Ready!")
                .question("Enter your details to unlock your full report."),
            StepDefinition::new(fields::RESULTS, StepKind::Results)
                .title("Your Custom Solar Report")
                .question("Based on your property and energy profile, here is your estimated system."),
            StepDefinition::new(fields::THANK_YOU, StepKind::ThankYou)
                .title("Thank You. Your Quote Is on Its Way!")
                .question("One of our solar experts will send you a personalised quote within 24-48 hours."),
        ];

        Self { steps }
    }

    /// Switches the location step between postcode entry and free-text
    /// address entry. The step id follows the mode (`postcode` or `address`).
    pub fn with_address_mode(
        mut self,
        mode: AddressMode,
    ) -> Self {
        if let Some(step) = self
            .steps
            .iter_mut()
            .find(|s| matches!(s.kind, StepKind::Address(_)))
        {
            step.kind = StepKind::Address(mode);
            match mode {
                AddressMode::Postcode => {
                    step.id = fields::POSTCODE.to_string();
                    step.question = "What's your postcode?".to_string();
                }
                AddressMode::FreeText => {
                    step.id = fields::ADDRESS.to_string();
                    step.question = "What's your street address?".to_string();
                }
            }
        }
        self
    }
}
