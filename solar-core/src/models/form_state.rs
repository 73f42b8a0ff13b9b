//! Collected answers and the reducer that updates them.

use std::collections::BTreeMap;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ResolvedLocation;
use super::catalog::fields::NONE_OPTION;

/// A single answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormValue {
    Text(String),
    List(Vec<String>),
    Flag(bool),
    Number(Decimal),
}

impl FormValue {
    /// `true` for blank text and empty lists. Flags and numbers always
    /// count as entered.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(s) => s.trim().is_empty(),
            Self::List(items) => items.is_empty(),
            Self::Flag(_) | Self::Number(_) => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Self::Flag(b) => Some(*b),
            _ => None,
        }
    }

    /// Numeric view. Text is accepted when it parses after trimming and
    /// removing `$` and thousands separators.
    pub fn as_number(&self) -> Option<Decimal> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => parse_amount(s).ok().flatten(),
            _ => None,
        }
    }
}

/// Parses an amount as typed: `"$1,234.56"`, `" 300 "`. Blank input (or
/// just `$`) is `Ok(None)`.
pub fn parse_amount(s: &str) -> Result<Option<Decimal>, rust_decimal::Error> {
    let normalized: String = s
        .trim()
        .chars()
        .filter(|c| *c != ',' && *c != '$')
        .collect();
    if normalized.is_empty() {
        return Ok(None);
    }
    Decimal::from_str(&normalized).map(Some)
}

/// Bill period for the energy usage step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BillingFrequency {
    Monthly,
    Bimonthly,
    Quarterly,
}

impl BillingFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::Bimonthly => "bimonthly",
            Self::Quarterly => "quarterly",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "monthly" => Some(Self::Monthly),
            "bimonthly" => Some(Self::Bimonthly),
            "quarterly" => Some(Self::Quarterly),
            _ => None,
        }
    }

    pub fn periods_per_year(&self) -> Decimal {
        match self {
            Self::Monthly => Decimal::from(12),
            Self::Bimonthly => Decimal::from(6),
            Self::Quarterly => Decimal::from(4),
        }
    }
}

/// A user edit, applied through [`FormState::apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEvent {
    SetText { field: String, value: String },
    SetNumber { field: String, value: Decimal },
    SetFlag { field: String, value: bool },
    /// Checks or unchecks one option of a multi-select step.
    Toggle {
        field: String,
        option: String,
        selected: bool,
    },
    Clear { field: String },
}

impl FormEvent {
    pub fn text(
        field: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::SetText {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn number(
        field: impl Into<String>,
        value: Decimal,
    ) -> Self {
        Self::SetNumber {
            field: field.into(),
            value,
        }
    }

    pub fn flag(
        field: impl Into<String>,
        value: bool,
    ) -> Self {
        Self::SetFlag {
            field: field.into(),
            value,
        }
    }

    pub fn toggle(
        field: impl Into<String>,
        option: impl Into<String>,
        selected: bool,
    ) -> Self {
        Self::Toggle {
            field: field.into(),
            option: option.into(),
            selected,
        }
    }

    pub fn field(&self) -> &str {
        match self {
            Self::SetText { field, .. }
            | Self::SetNumber { field, .. }
            | Self::SetFlag { field, .. }
            | Self::Toggle { field, .. }
            | Self::Clear { field } => field,
        }
    }
}

/// Applies a toggle to a multi-select set.
///
/// Selecting [`NONE_OPTION`] clears every other choice; selecting anything
/// else drops `none`. The result keeps first-selection order without
/// duplicates.
pub fn normalize_selection(
    current: &[String],
    option: &str,
    selected: bool,
) -> Vec<String> {
    if !selected {
        return current.iter().filter(|v| *v != option).cloned().collect();
    }
    if option == NONE_OPTION {
        return vec![NONE_OPTION.to_string()];
    }

    let mut next: Vec<String> = Vec::with_capacity(current.len() + 1);
    for value in current {
        if value != NONE_OPTION && !next.contains(value) {
            next.push(value.clone());
        }
    }
    if !next.iter().any(|v| v == option) {
        next.push(option.to_string());
    }
    next
}

/// Answers collected during one questionnaire session, plus the location
/// derived from them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormState {
    answers: BTreeMap<String, FormValue>,
    location: Option<ResolvedLocation>,
}

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reducer: returns the state with `event` applied.
    pub fn apply(
        mut self,
        event: FormEvent,
    ) -> Self {
        match event {
            FormEvent::SetText { field, value } => {
                self.answers.insert(field, FormValue::Text(value));
            }
            FormEvent::SetNumber { field, value } => {
                self.answers.insert(field, FormValue::Number(value));
            }
            FormEvent::SetFlag { field, value } => {
                self.answers.insert(field, FormValue::Flag(value));
            }
            FormEvent::Toggle {
                field,
                option,
                selected,
            } => {
                let current = self.list(&field).unwrap_or(&[]);
                let next = normalize_selection(current, &option, selected);
                self.answers.insert(field, FormValue::List(next));
            }
            FormEvent::Clear { field } => {
                self.answers.remove(&field);
            }
        }
        self
    }

    pub fn get(
        &self,
        field: &str,
    ) -> Option<&FormValue> {
        self.answers.get(field)
    }

    /// `true` when the field holds a non-empty answer.
    pub fn has(
        &self,
        field: &str,
    ) -> bool {
        self.get(field).is_some_and(|v| !v.is_empty())
    }

    pub fn text(
        &self,
        field: &str,
    ) -> Option<&str> {
        self.get(field).and_then(FormValue::as_text)
    }

    pub fn list(
        &self,
        field: &str,
    ) -> Option<&[String]> {
        self.get(field).and_then(FormValue::as_list)
    }

    pub fn flag(
        &self,
        field: &str,
    ) -> Option<bool> {
        self.get(field).and_then(FormValue::as_flag)
    }

    pub fn number(
        &self,
        field: &str,
    ) -> Option<Decimal> {
        self.get(field).and_then(FormValue::as_number)
    }

    pub fn answers(&self) -> impl Iterator<Item = (&str, &FormValue)> {
        self.answers.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn location(&self) -> Option<&ResolvedLocation> {
        self.location.as_ref()
    }

    pub fn set_location(
        &mut self,
        location: ResolvedLocation,
    ) {
        self.location = Some(location);
    }

    pub fn clear_location(&mut self) {
        self.location = None;
    }
}
