//! Text views of the wizard.
//!
//! The view functions are pure and return strings; [`Renderer`] is the seam
//! a different frontend replaces. [`PlainRenderer`] writes the views to any
//! `io::Write`.

use std::io::{self, Write};

use solar_core::services::GeocodeCandidate;
use solar_core::wizard::Progress;
use solar_core::{FormState, FormValue, ResultReport, StepCatalog, StepKind, Wizard, fields};

pub trait Renderer {
    /// Shows the current step with its answer, any error and progress.
    fn step(
        &mut self,
        wizard: &Wizard,
    ) -> io::Result<()>;

    fn suggestions(
        &mut self,
        candidates: &[GeocodeCandidate],
    ) -> io::Result<()>;

    fn summary(
        &mut self,
        wizard: &Wizard,
    ) -> io::Result<()>;

    /// A one-line message outside the step view.
    fn notice(
        &mut self,
        message: &str,
    ) -> io::Result<()>;

    fn prompt(
        &mut self,
        label: &str,
    ) -> io::Result<()>;
}

pub struct PlainRenderer<W> {
    out: W,
}

impl<W: Write> PlainRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Renderer for PlainRenderer<W> {
    fn step(
        &mut self,
        wizard: &Wizard,
    ) -> io::Result<()> {
        writeln!(self.out)?;
        write!(self.out, "{}", step_view(wizard))?;
        self.out.flush()
    }

    fn suggestions(
        &mut self,
        candidates: &[GeocodeCandidate],
    ) -> io::Result<()> {
        write!(self.out, "{}", suggestions_view(candidates))?;
        self.out.flush()
    }

    fn summary(
        &mut self,
        wizard: &Wizard,
    ) -> io::Result<()> {
        for (question, answer) in answer_summary(wizard.catalog(), wizard.state()) {
            writeln!(self.out, "  {question}: {answer}")?;
        }
        self.out.flush()
    }

    fn notice(
        &mut self,
        message: &str,
    ) -> io::Result<()> {
        writeln!(self.out, "{message}")?;
        self.out.flush()
    }

    fn prompt(
        &mut self,
        label: &str,
    ) -> io::Result<()> {
        write!(self.out, "{label}> ")?;
        self.out.flush()
    }
}

/// `[###......] 3/9`
pub fn progress_bar(progress: Progress) -> String {
    let done = progress.current.min(progress.total);
    format!(
        "[{}{}] {}/{}",
        "#".repeat(done),
        ".".repeat(progress.total - done),
        done,
        progress.total
    )
}

pub fn step_view(wizard: &Wizard) -> String {
    let Some(step) = wizard.current_step() else {
        return String::new();
    };
    let mut view = String::new();

    if let Some(progress) = wizard.progress() {
        view.push_str(&progress_bar(progress));
        view.push('\n');
    }
    view.push_str(&format!("== {} ==\n{}\n", step.title, step.question));
    if let Some(hint) = &step.hint {
        view.push_str(&format!("({hint})\n"));
    }

    let list = wizard.state().list(&step.id).unwrap_or(&[]);
    let chosen = wizard.state().text(&step.id);
    let show_options = matches!(
        step.kind,
        StepKind::Radio | StepKind::Select | StepKind::Checkbox | StepKind::CustomEnergyInput
    );
    if show_options {
        for (i, option) in step.options.iter().enumerate() {
            let marked = list.contains(&option.value) || chosen == Some(option.value.as_str());
            let mark = if marked { "x" } else { " " };
            view.push_str(&format!("  {}. [{mark}] {}\n", i + 1, option.label));
        }
    }

    if step.kind == StepKind::Results {
        if let Some(report) = wizard.report() {
            view.push_str(&report_view(report));
        }
    }

    if let Some(error) = wizard.error() {
        view.push_str(&format!("! {error}\n"));
    }
    view
}

fn field_label(key: &str) -> &str {
    match key {
        "recommendedSystemSize" => "Recommended system size",
        "estimatedAnnualProduction" => "Estimated annual production",
        "requiredRoofArea" => "Required roof area",
        "systemType" => "System type",
        "estimatedSystemCost" => "Estimated system cost",
        "eligibleGovernmentRebates" => "Government rebates",
        "stcValue" => "STC value",
        "totalIncentives" => "Total incentives",
        "netCostAfterRebates" => "Net cost after rebates",
        "estimatedAnnualSavings" => "Estimated annual savings",
        "feedInIncome" => "Feed-in income",
        "totalAnnualBenefit" => "Total annual benefit",
        "paybackTime" => "Payback time",
        "co2Reduction" => "CO2 reduction",
        "equivalentTrees" => "Equivalent trees",
        "assumedEnergyPrice" => "Energy price used",
        "assumedFeedInRate" => "Feed-in rate used",
        "location" => "Location",
        "estimatedAnnualConsumption" => "Estimated annual consumption",
        "batteryRebate" => "Battery rebate",
        other => other,
    }
}

pub fn report_view(report: &ResultReport) -> String {
    let fields = report.display_fields();
    let width = fields
        .iter()
        .map(|(key, _)| field_label(key).chars().count())
        .max()
        .unwrap_or(0);

    fields
        .iter()
        .map(|(key, value)| format!("  {:<width$}  {value}\n", field_label(key)))
        .collect()
}

pub fn suggestions_view(candidates: &[GeocodeCandidate]) -> String {
    if candidates.is_empty() {
        return "  (no matching addresses)\n".to_string();
    }
    candidates
        .iter()
        .enumerate()
        .map(|(i, c)| format!("  #{} {}\n", i + 1, c.display_name))
        .collect()
}

/// Question and answer pairs for every answered question, in catalog order.
/// Option values are shown by their labels.
pub fn answer_summary(
    catalog: &StepCatalog,
    state: &FormState,
) -> Vec<(String, String)> {
    catalog
        .steps()
        .iter()
        .filter(|step| step.kind.is_question())
        .filter_map(|step| {
            if step.kind == StepKind::CustomEnergyInput {
                let amount = state.number(fields::BILL_AMOUNT)?;
                let frequency = state.text(fields::BILL_FREQUENCY).unwrap_or_default();
                let answer = format!("${} {}", amount.normalize(), step.label_for(frequency));
                return Some((step.question.clone(), answer.trim_end().to_string()));
            }
            let answer = match state.get(&step.id)? {
                FormValue::Text(text) => step.label_for(text).to_string(),
                FormValue::List(values) => values
                    .iter()
                    .map(|v| step.label_for(v))
                    .collect::<Vec<_>>()
                    .join(", "),
                FormValue::Flag(flag) => (if *flag { "Yes" } else { "No" }).to_string(),
                FormValue::Number(number) => number.normalize().to_string(),
            };
            Some((step.question.clone(), answer))
        })
        .collect()
}
