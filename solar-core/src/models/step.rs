use serde::{Deserialize, Serialize};

/// How an `address` step collects its location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AddressMode {
    /// Exactly four digits.
    Postcode,
    /// Free-text street address, geocoded to a postcode.
    FreeText,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepKind {
    Intro,
    Text,
    Address(AddressMode),
    Radio,
    Select,
    Checkbox,
    CustomEnergyInput,
    Lead,
    Results,
    ThankYou,
}

impl StepKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Intro => "intro",
            Self::Text => "text",
            Self::Address(_) => "address",
            Self::Radio => "radio",
            Self::Select => "select",
            Self::Checkbox => "checkbox",
            Self::CustomEnergyInput => "customEnergyInput",
            Self::Lead => "lead",
            Self::Results => "results",
            Self::ThankYou => "thankyou",
        }
    }

    /// Steps that count toward the progress indicator.
    pub fn is_question(&self) -> bool {
        !matches!(
            self,
            Self::Intro | Self::Lead | Self::Results | Self::ThankYou
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepOption {
    pub label: String,
    pub value: String,
}

impl StepOption {
    pub fn new(
        label: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// One question in the questionnaire.
///
/// `id` is the key under which the answer is stored in the form state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepDefinition {
    pub id: String,
    pub kind: StepKind,
    pub title: String,
    pub question: String,
    pub hint: Option<String>,
    pub options: Vec<StepOption>,
    pub optional: bool,
    pub multi_select: bool,
}

impl StepDefinition {
    pub fn new(
        id: impl Into<String>,
        kind: StepKind,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            title: String::new(),
            question: String::new(),
            hint: None,
            options: Vec::new(),
            optional: false,
            multi_select: false,
        }
    }

    pub fn title(
        mut self,
        title: impl Into<String>,
    ) -> Self {
        self.title = title.into();
        self
    }

    pub fn question(
        mut self,
        question: impl Into<String>,
    ) -> Self {
        self.question = question.into();
        self
    }

    pub fn hint(
        mut self,
        hint: impl Into<String>,
    ) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn options<I, L, V>(
        mut self,
        options: I,
    ) -> Self
    where
        I: IntoIterator<Item = (L, V)>,
        L: Into<String>,
        V: Into<String>,
    {
        self.options = options
            .into_iter()
            .map(|(label, value)| StepOption::new(label, value))
            .collect();
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn multi_select(mut self) -> Self {
        self.multi_select = true;
        self
    }

    /// Maps a stored value back to its option label, falling back to the
    /// raw value for free-form answers.
    pub fn label_for<'a>(
        &'a self,
        value: &'a str,
    ) -> &'a str {
        self.options
            .iter()
            .find(|o| o.value == value)
            .map(|o| o.label.as_str())
            .unwrap_or(value)
    }

    pub fn has_option(
        &self,
        value: &str,
    ) -> bool {
        self.options.iter().any(|o| o.value == value)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn label_for_maps_known_values() {
        let step = StepDefinition::new("roofOrientation", StepKind::Radio)
            .options([("North", "north"), ("East", "east")]);

        assert_eq!(step.label_for("north"), "North");
        assert_eq!(step.label_for("sideways"), "sideways");
        assert!(step.has_option("east"));
    }

    #[test]
    fn question_kinds_exclude_bookends() {
        assert!(StepKind::Radio.is_question());
        assert!(StepKind::Address(AddressMode::Postcode).is_question());
        assert!(!StepKind::Intro.is_question());
        assert!(!StepKind::Lead.is_question());
        assert!(!StepKind::ThankYou.is_question());
    }
}
