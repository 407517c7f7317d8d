use anyhow::{anyhow, Context, Result};
use chrono::Local;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::models::{Abbreviation, Medication, Problem};
use crate::note::{DATE_KEY, SIGIL};
use crate::reports::{FieldKind, ReportKind};

/// Render one "Label: value" form row with the shared active/placeholder
/// styling every modal in the app uses.
fn input_line(name: &str, value: &str, active: bool, placeholder: &str) -> Line<'static> {
    let display = if value.is_empty() {
        placeholder.to_string()
    } else {
        value.to_string()
    };

    let style = if active {
        Style::default().fg(Color::Yellow)
    } else if value.is_empty() {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default()
    };

    Line::from(vec![
        Span::raw(format!("{name}: ")),
        Span::styled(display, style),
    ])
}

/// Internal representation of the abbreviation form fields.
#[derive(Default, Clone)]
pub(crate) struct AbbrevForm {
    pub(crate) short: String,
    pub(crate) expansion: String,
    pub(crate) active: AbbrevField,
    pub(crate) error: Option<String>,
}

#[derive(Copy, Clone, PartialEq, Eq, Default)]
pub(crate) enum AbbrevField {
    #[default]
    Short,
    Expansion,
}

impl AbbrevForm {
    /// Populate the form from an existing row when editing.
    pub(crate) fn from_entry(entry: &Abbreviation) -> Self {
        Self {
            short: entry.short.clone(),
            expansion: entry.expansion.clone(),
            active: AbbrevField::Short,
            error: None,
        }
    }

    pub(crate) fn toggle_field(&mut self) {
        self.active = match self.active {
            AbbrevField::Short => AbbrevField::Expansion,
            AbbrevField::Expansion => AbbrevField::Short,
        };
    }

    /// Append a character to the active field. The short form refuses
    /// whitespace and the sigil; it has to survive inside a typed token.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        match self.active {
            AbbrevField::Short => {
                if ch.is_whitespace() || ch == SIGIL {
                    false
                } else {
                    self.short.push(ch);
                    true
                }
            }
            AbbrevField::Expansion => {
                self.expansion.push(ch);
                true
            }
        }
    }

    pub(crate) fn backspace(&mut self) {
        match self.active {
            AbbrevField::Short => {
                self.short.pop();
            }
            AbbrevField::Expansion => {
                self.expansion.pop();
            }
        }
    }

    /// Validate the inputs and return typed values ready for persistence.
    pub(crate) fn parse_inputs(&self) -> Result<(String, String)> {
        let short = self.short.trim();
        if short.is_empty() {
            return Err(anyhow!("Short form is required."));
        }
        if short.eq_ignore_ascii_case(DATE_KEY) {
            return Err(anyhow!(
                "'{}{}' is reserved for today's date.",
                SIGIL,
                DATE_KEY
            ));
        }
        let expansion = self.expansion.trim();
        if expansion.is_empty() {
            return Err(anyhow!("Expansion is required."));
        }
        Ok((short.to_string(), expansion.to_string()))
    }

    pub(crate) fn build_line(&self, name: &str, field: AbbrevField) -> Line<'static> {
        let (value, placeholder) = match field {
            AbbrevField::Short => (&self.short, "<required>"),
            AbbrevField::Expansion => (&self.expansion, "<required>"),
        };
        input_line(name, value, self.active == field, placeholder)
    }

    pub(crate) fn value_len(&self, field: AbbrevField) -> usize {
        match field {
            AbbrevField::Short => self.short.chars().count(),
            AbbrevField::Expansion => self.expansion.chars().count(),
        }
    }
}

/// Form state for problem list entries. The code can be typed freehand or
/// filled in by the disease-code picker.
#[derive(Default, Clone)]
pub(crate) struct ProblemForm {
    pub(crate) label: String,
    pub(crate) code: String,
    pub(crate) active: ProblemField,
    pub(crate) error: Option<String>,
}

#[derive(Copy, Clone, PartialEq, Eq, Default)]
pub(crate) enum ProblemField {
    #[default]
    Label,
    Code,
}

impl ProblemForm {
    pub(crate) fn from_problem(problem: &Problem) -> Self {
        Self {
            label: problem.label.clone(),
            code: problem.code.clone().unwrap_or_default(),
            active: ProblemField::Label,
            error: None,
        }
    }

    /// Seed both fields from a catalog hit picked in the code search.
    pub(crate) fn from_code(code: &str, label: &str) -> Self {
        Self {
            label: label.to_string(),
            code: code.to_string(),
            active: ProblemField::Label,
            error: None,
        }
    }

    pub(crate) fn toggle_field(&mut self) {
        self.active = match self.active {
            ProblemField::Label => ProblemField::Code,
            ProblemField::Code => ProblemField::Label,
        };
    }

    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        match self.active {
            ProblemField::Label => self.label.push(ch),
            ProblemField::Code => self.code.push(ch),
        }
        true
    }

    pub(crate) fn backspace(&mut self) {
        match self.active {
            ProblemField::Label => {
                self.label.pop();
            }
            ProblemField::Code => {
                self.code.pop();
            }
        }
    }

    /// Validate and normalize; an empty code becomes `None` so the row never
    /// stores a blank string.
    pub(crate) fn parse_inputs(&self) -> Result<(Option<String>, String)> {
        let label = self.label.trim();
        if label.is_empty() {
            return Err(anyhow!("Problem label is required."));
        }
        let code = self.code.trim();
        let code = if code.is_empty() {
            None
        } else {
            Some(code.to_string())
        };
        Ok((code, label.to_string()))
    }

    pub(crate) fn build_line(&self, name: &str, field: ProblemField) -> Line<'static> {
        let (value, placeholder) = match field {
            ProblemField::Label => (&self.label, "<required>"),
            ProblemField::Code => (&self.code, "<optional>"),
        };
        input_line(name, value, self.active == field, placeholder)
    }

    pub(crate) fn value_len(&self, field: ProblemField) -> usize {
        match field {
            ProblemField::Label => self.label.chars().count(),
            ProblemField::Code => self.code.chars().count(),
        }
    }
}

/// Form state for adding a medication to the catalog.
#[derive(Default, Clone)]
pub(crate) struct MedicationForm {
    pub(crate) name: String,
    pub(crate) strength: String,
    pub(crate) route: String,
    pub(crate) active: MedicationField,
    pub(crate) error: Option<String>,
}

#[derive(Copy, Clone, PartialEq, Eq, Default)]
pub(crate) enum MedicationField {
    #[default]
    Name,
    Strength,
    Route,
}

impl MedicationForm {
    pub(crate) fn toggle_field(&mut self) {
        self.active = match self.active {
            MedicationField::Name => MedicationField::Strength,
            MedicationField::Strength => MedicationField::Route,
            MedicationField::Route => MedicationField::Name,
        };
    }

    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        match self.active {
            MedicationField::Name => self.name.push(ch),
            MedicationField::Strength => self.strength.push(ch),
            MedicationField::Route => self.route.push(ch),
        }
        true
    }

    pub(crate) fn backspace(&mut self) {
        match self.active {
            MedicationField::Name => {
                self.name.pop();
            }
            MedicationField::Strength => {
                self.strength.pop();
            }
            MedicationField::Route => {
                self.route.pop();
            }
        }
    }

    pub(crate) fn parse_inputs(&self) -> Result<(String, String, String)> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(anyhow!("Medication name is required."));
        }
        let strength = self.strength.trim();
        if strength.is_empty() {
            return Err(anyhow!("Strength is required."));
        }
        Ok((
            name.to_string(),
            strength.to_string(),
            self.route.trim().to_string(),
        ))
    }

    pub(crate) fn build_line(&self, name: &str, field: MedicationField) -> Line<'static> {
        let (value, placeholder) = match field {
            MedicationField::Name => (&self.name, "<required>"),
            MedicationField::Strength => (&self.strength, "<required>"),
            MedicationField::Route => (&self.route, "<optional>"),
        };
        input_line(name, value, self.active == field, placeholder)
    }

    pub(crate) fn value_len(&self, field: MedicationField) -> usize {
        match field {
            MedicationField::Name => self.name.chars().count(),
            MedicationField::Strength => self.strength.chars().count(),
            MedicationField::Route => self.route.chars().count(),
        }
    }
}

/// Sig entry for a medication order: dose, frequency, and duration for a
/// catalog entry that was already picked.
#[derive(Clone)]
pub(crate) struct SigForm {
    pub(crate) medication: Medication,
    pub(crate) dose: String,
    pub(crate) frequency: String,
    pub(crate) days: String,
    pub(crate) active: SigField,
    pub(crate) error: Option<String>,
}

#[derive(Copy, Clone, PartialEq, Eq, Default)]
pub(crate) enum SigField {
    #[default]
    Dose,
    Frequency,
    Days,
}

impl SigForm {
    pub(crate) fn for_medication(medication: Medication) -> Self {
        Self {
            medication,
            dose: String::new(),
            frequency: String::new(),
            days: String::new(),
            active: SigField::Dose,
            error: None,
        }
    }

    pub(crate) fn toggle_field(&mut self) {
        self.active = match self.active {
            SigField::Dose => SigField::Frequency,
            SigField::Frequency => SigField::Days,
            SigField::Days => SigField::Dose,
        };
    }

    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        match self.active {
            SigField::Days => {
                if ch.is_ascii_digit() {
                    self.days.push(ch);
                    true
                } else {
                    false
                }
            }
            SigField::Dose => {
                if ch.is_control() {
                    return false;
                }
                self.dose.push(ch);
                true
            }
            SigField::Frequency => {
                if ch.is_control() {
                    return false;
                }
                self.frequency.push(ch);
                true
            }
        }
    }

    pub(crate) fn backspace(&mut self) {
        match self.active {
            SigField::Dose => {
                self.dose.pop();
            }
            SigField::Frequency => {
                self.frequency.pop();
            }
            SigField::Days => {
                self.days.pop();
            }
        }
    }

    pub(crate) fn parse_inputs(&self) -> Result<(String, String, u32)> {
        let dose = self.dose.trim();
        if dose.is_empty() {
            return Err(anyhow!("Dose is required."));
        }
        let frequency = self.frequency.trim();
        if frequency.is_empty() {
            return Err(anyhow!("Frequency is required."));
        }
        let days_raw = self.days.trim();
        if days_raw.is_empty() {
            return Err(anyhow!("Days is required."));
        }
        let days = days_raw
            .parse::<u32>()
            .context("Days must be a whole number.")?;
        if !(1..=365).contains(&days) {
            return Err(anyhow!("Days must be between 1 and 365."));
        }
        Ok((dose.to_string(), frequency.to_string(), days))
    }

    pub(crate) fn build_line(&self, name: &str, field: SigField) -> Line<'static> {
        let value = match field {
            SigField::Dose => &self.dose,
            SigField::Frequency => &self.frequency,
            SigField::Days => &self.days,
        };
        input_line(name, value, self.active == field, "<required>")
    }

    pub(crate) fn value_len(&self, field: SigField) -> usize {
        match field {
            SigField::Dose => self.dose.chars().count(),
            SigField::Frequency => self.frequency.chars().count(),
            SigField::Days => self.days.chars().count(),
        }
    }
}

/// Name entry when saving the current note as a template.
#[derive(Default, Clone)]
pub(crate) struct TemplateSaveForm {
    pub(crate) name: String,
    pub(crate) error: Option<String>,
}

impl TemplateSaveForm {
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        self.name.push(ch);
        true
    }

    pub(crate) fn backspace(&mut self) {
        self.name.pop();
    }

    pub(crate) fn parse_inputs(&self) -> Result<String> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(anyhow!("Template name is required."));
        }
        Ok(name.to_string())
    }

    pub(crate) fn build_line(&self) -> Line<'static> {
        input_line("Name", &self.name, true, "<required>")
    }

    pub(crate) fn value_len(&self) -> usize {
        self.name.chars().count()
    }
}

/// Field-table-driven form for the structured reports. The report kind says
/// which rows exist and how each one edits; this struct only tracks the
/// values and focus.
#[derive(Clone)]
pub(crate) struct ReportForm {
    pub(crate) kind: ReportKind,
    pub(crate) values: Vec<String>,
    pub(crate) active: usize,
    pub(crate) error: Option<String>,
}

impl ReportForm {
    /// Start a form for `kind` with dates pre-filled to today and choices on
    /// their first option, so a report can be accepted with minimal typing.
    pub(crate) fn new(kind: ReportKind) -> Self {
        let values = kind
            .fields()
            .iter()
            .map(|spec| match spec.kind {
                FieldKind::Date => Local::now().format("%Y-%m-%d").to_string(),
                FieldKind::Choice(options) => options.first().copied().unwrap_or("").to_string(),
                FieldKind::Text => String::new(),
            })
            .collect();

        Self {
            kind,
            values,
            active: 0,
            error: None,
        }
    }

    fn active_kind(&self) -> FieldKind {
        self.kind.fields()[self.active].kind
    }

    pub(crate) fn next_field(&mut self) {
        self.active = (self.active + 1) % self.values.len();
    }

    pub(crate) fn previous_field(&mut self) {
        let len = self.values.len();
        self.active = (self.active + len - 1) % len;
    }

    /// Type into the active field. Choice fields ignore typing; they cycle.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        match self.active_kind() {
            FieldKind::Choice(_) => false,
            FieldKind::Text | FieldKind::Date => {
                self.values[self.active].push(ch);
                true
            }
        }
    }

    pub(crate) fn backspace(&mut self) {
        if !matches!(self.active_kind(), FieldKind::Choice(_)) {
            self.values[self.active].pop();
        }
    }

    /// Step a choice field through its options, wrapping at either end.
    /// Returns false when the active field is not a choice.
    pub(crate) fn cycle(&mut self, step: isize) -> bool {
        let FieldKind::Choice(options) = self.active_kind() else {
            return false;
        };
        if options.is_empty() {
            return false;
        }

        let len = options.len() as isize;
        let current = options
            .iter()
            .position(|option| *option == self.values[self.active])
            .unwrap_or(0) as isize;
        let next = (current + step).rem_euclid(len) as usize;
        self.values[self.active] = options[next].to_string();
        true
    }

    pub(crate) fn build_line(&self, index: usize) -> Line<'static> {
        let spec = self.kind.fields()[index];
        let value = &self.values[index];
        let active = self.active == index;

        if let FieldKind::Choice(_) = spec.kind {
            let display = if active {
                format!("< {value} >")
            } else {
                value.clone()
            };
            let style = if active {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default()
            };
            return Line::from(vec![
                Span::raw(format!("{}: ", spec.label)),
                Span::styled(display, style),
            ]);
        }

        let placeholder = if spec.required {
            "<required>"
        } else {
            "<optional>"
        };
        input_line(spec.label, value, active, placeholder)
    }

    /// Cursor column/row for the active field, or `None` when the active
    /// field is a choice and the cursor should stay hidden.
    pub(crate) fn cursor(&self) -> Option<(u16, u16)> {
        if matches!(self.active_kind(), FieldKind::Choice(_)) {
            return None;
        }
        let spec = self.kind.fields()[self.active];
        let x = spec.label.chars().count() + 2 + self.values[self.active].chars().count();
        Some((x as u16, self.active as u16))
    }
}

/// Which kind of stored entry a delete confirmation is about.
#[derive(Copy, Clone, PartialEq, Eq)]
pub(crate) enum EntryKind {
    Abbreviation,
    Template,
    Problem,
    Medication,
}

impl EntryKind {
    pub(crate) fn noun(self) -> &'static str {
        match self {
            EntryKind::Abbreviation => "abbreviation",
            EntryKind::Template => "template",
            EntryKind::Problem => "problem",
            EntryKind::Medication => "medication",
        }
    }
}

/// State for confirming deletion of a stored entry.
#[derive(Clone)]
pub(crate) struct ConfirmEntryDelete {
    pub(crate) kind: EntryKind,
    pub(crate) id: i64,
    pub(crate) label: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abbrev_short_form_rejects_whitespace_and_sigil() {
        let mut form = AbbrevForm::default();
        assert!(form.push_char('b'));
        assert!(!form.push_char(' '));
        assert!(!form.push_char(SIGIL));
        assert!(form.push_char('p'));
        assert_eq!(form.short, "bp");
    }

    #[test]
    fn abbrev_short_form_cannot_shadow_the_date_key() {
        let form = AbbrevForm {
            short: "Date".into(),
            expansion: "anything".into(),
            ..AbbrevForm::default()
        };
        let err = form.parse_inputs().expect_err("reserved");
        assert!(err.to_string().contains("reserved"));
    }

    #[test]
    fn sig_days_only_accept_digits_within_range() {
        let mut form = SigForm::for_medication(Medication {
            id: 1,
            name: "Amlodipine".into(),
            strength: "5 mg".into(),
            route: "PO".into(),
        });
        form.dose = "1 tab".into();
        form.frequency = "qd".into();
        form.active = SigField::Days;
        assert!(!form.push_char('x'));
        assert!(form.push_char('4'));
        assert!(form.push_char('0'));
        assert!(form.push_char('0'));

        let err = form.parse_inputs().expect_err("over a year");
        assert!(err.to_string().contains("between 1 and 365"));

        form.days = "30".into();
        let (dose, frequency, days) = form.parse_inputs().expect("valid");
        assert_eq!((dose.as_str(), frequency.as_str(), days), ("1 tab", "qd", 30));
    }

    #[test]
    fn report_form_prefills_dates_and_choices() {
        let form = ReportForm::new(ReportKind::Ekg);
        assert_eq!(form.values.len(), ReportKind::Ekg.fields().len());
        // Date field carries today, rhythm carries the first option.
        assert!(!form.values[0].is_empty());
        assert_eq!(form.values[2], "sinus rhythm");
    }

    #[test]
    fn choice_fields_cycle_and_refuse_typing() {
        let mut form = ReportForm::new(ReportKind::Ekg);
        form.active = 2;
        assert!(!form.push_char('z'));
        assert!(form.cycle(1));
        assert_eq!(form.values[2], "sinus bradycardia");
        assert!(form.cycle(-1));
        assert_eq!(form.values[2], "sinus rhythm");
        assert!(form.cycle(-1));
        assert_eq!(form.values[2], "other");
    }
}
